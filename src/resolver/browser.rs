//! ヘッドレスブラウザでアルバムを開いて画像URLを集める方式
//!
//! 遅延読み込みのアルバムは画面に入った写真しか `img` にならないので、
//! 一定間隔で少しずつスクロールし、ページの高さが伸びなくなるか上限距離に達するまで続ける。
//! ブラウザはどの経路で終わっても必ず閉じる。

use super::events::{BrowserEvent, BrowserEventSink};
use super::{dedup_images, AlbumResolver, ResolvedImage};
use crate::config::BrowserSettings;
use crate::error::ResolveError;
use crate::normalizer::is_cdn_host;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const IMAGE_POLL_INTERVAL: Duration = Duration::from_millis(250);

const IMAGE_SOURCES_SCRIPT: &str =
    "Array.from(document.querySelectorAll('img')).map(img => img.currentSrc || img.src)";

fn scroll_script(step: u32) -> String {
    format!(
        "(() => {{ window.scrollBy(0, {step}); \
         const root = document.scrollingElement || document.body; \
         return [root.scrollHeight, window.scrollY + window.innerHeight]; }})()"
    )
}

pub struct BrowserResolver {
    settings: BrowserSettings,
    events: Arc<dyn BrowserEventSink>,
}

impl BrowserResolver {
    pub fn new(settings: BrowserSettings, events: Arc<dyn BrowserEventSink>) -> Self {
        Self { settings, events }
    }

    async fn scrape(&self, session: &BrowserSession, album_url: &str) -> Result<Vec<ResolvedImage>, ResolveError> {
        let navigation = Duration::from_secs(self.settings.navigation_timeout_secs);
        let page = tokio::time::timeout(navigation, open_page(&session.browser, album_url))
            .await
            .map_err(|_| {
                ResolveError::Timeout(format!("ページ読み込みが{}秒以内に完了しませんでした", navigation.as_secs()))
            })?
            .map_err(browser_error)?;
        self.events.emit(BrowserEvent::Navigated {
            url: album_url.to_string(),
        });

        let result = self.collect(&page).await;

        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close page: {e}");
        }
        result
    }

    async fn collect(&self, page: &Page) -> Result<Vec<ResolvedImage>, ResolveError> {
        let image_wait = Duration::from_secs(self.settings.image_wait_secs);
        tokio::time::timeout(image_wait, wait_for_image(page))
            .await
            .map_err(|_| {
                ResolveError::Timeout(format!("{}秒待っても画像が表示されませんでした", image_wait.as_secs()))
            })?;
        self.events.emit(BrowserEvent::ImagesVisible);

        self.auto_scroll(page).await.map_err(browser_error)?;

        tokio::time::sleep(Duration::from_millis(self.settings.settle_ms)).await;
        self.events.emit(BrowserEvent::Settled);

        let sources: Vec<String> = page
            .evaluate(IMAGE_SOURCES_SCRIPT)
            .await
            .context("Failed to read image sources")
            .map_err(browser_error)?
            .into_value()
            .map_err(|e| ResolveError::Parse(e.to_string()))?;

        let found = sources.len();
        let images = filter_cdn_sources(sources);
        self.events.emit(BrowserEvent::Extracted {
            found,
            kept: images.len(),
        });
        Ok(images)
    }

    async fn auto_scroll(&self, page: &Page) -> Result<()> {
        let script = scroll_script(self.settings.scroll_step);
        let interval = Duration::from_millis(self.settings.scroll_interval_ms);
        let mut scroll = AutoScroll::new(self.settings.scroll_step, self.settings.max_scroll_distance);

        loop {
            let (scroll_height, viewport_bottom): (f64, f64) = page
                .evaluate(script.as_str())
                .await
                .context("Failed to scroll")?
                .into_value()
                .context("Unexpected scroll result")?;

            let keep_going = scroll.observe(ScrollSample {
                scroll_height,
                viewport_bottom,
            });
            self.events.emit(BrowserEvent::Scrolled {
                distance: scroll.distance(),
                scroll_height,
            });

            if !keep_going {
                return Ok(());
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[async_trait]
impl AlbumResolver for BrowserResolver {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn resolve(&self, album_url: &str) -> Result<Vec<ResolvedImage>, ResolveError> {
        url::Url::parse(album_url)
            .map_err(|e| ResolveError::InvalidUrl(format!("{}: {}", album_url, e)))?;

        let session = BrowserSession::launch(&self.settings)
            .await
            .map_err(browser_error)?;
        self.events.emit(BrowserEvent::Launched);

        let result = self.scrape(&session, album_url).await;

        session.close().await;
        self.events.emit(BrowserEvent::Closed);
        result
    }
}

/// ブラウザプロセスとイベントハンドラのタスク
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(Duration::from_secs(settings.navigation_timeout_secs))
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--mute-audio");

        if let Some(path) = settings.chrome_path.clone().or_else(find_chrome) {
            tracing::debug!(path = %path.display(), "Using Chrome");
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {e}");
                }
            }
        });

        Ok(Self { browser, handler })
    }

    /// 失敗してもログだけ出す（Drop でハンドラも止まる）
    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Failed to wait for browser exit: {e}");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn open_page(browser: &Browser, url: &str) -> Result<Page> {
    let page = browser.new_page(url).await.context("Failed to open page")?;
    page.wait_for_navigation().await.context("Navigation failed")?;
    Ok(page)
}

async fn wait_for_image(page: &Page) {
    while page.find_element("img").await.is_err() {
        tokio::time::sleep(IMAGE_POLL_INTERVAL).await;
    }
}

fn browser_error(e: anyhow::Error) -> ResolveError {
    ResolveError::Browser(format!("{:#}", e))
}

/// CHROME 環境変数 → Playwright のキャッシュの順で探す。見つからなければ自動検出に任せる
fn find_chrome() -> Option<PathBuf> {
    if let Ok(chrome_path) = std::env::var("CHROME") {
        let path = PathBuf::from(chrome_path);
        if path.exists() {
            return Some(path);
        }
    }

    let cache = dirs::home_dir()?.join(".cache").join("ms-playwright");
    let mut chrome_dirs: Vec<_> = std::fs::read_dir(cache)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("chromium-"))
        .collect();
    // 新しいバージョンから
    chrome_dirs.sort_by_key(|e| std::cmp::Reverse(e.file_name()));

    chrome_dirs.iter().find_map(|dir| {
        ["chrome-linux64/chrome", "chrome-linux/chrome"]
            .iter()
            .map(|sub| dir.path().join(sub))
            .find(|p| p.exists())
    })
}

/// `img` のsrc一覧から画像CDNのものだけを残す（順序維持・重複除去）
pub fn filter_cdn_sources(sources: Vec<String>) -> Vec<ResolvedImage> {
    dedup_images(
        sources
            .into_iter()
            .filter(|src| {
                url::Url::parse(src)
                    .ok()
                    .and_then(|u| u.host_str().map(is_cdn_host))
                    .unwrap_or(false)
            })
            .map(ResolvedImage::new),
    )
}

/// スクロール1回後のページの状態
#[derive(Debug, Clone, Copy)]
pub struct ScrollSample {
    pub scroll_height: f64,
    pub viewport_bottom: f64,
}

/// 自動スクロールの停止判定
///
/// 最下部に達していてページの高さが前回から伸びていなければ終了。
/// 伸び続けていても累計距離が上限に達したら終了。
#[derive(Debug, Clone)]
pub struct AutoScroll {
    step: u32,
    max_distance: u32,
    distance: u32,
    last_height: Option<f64>,
}

impl AutoScroll {
    pub fn new(step: u32, max_distance: u32) -> Self {
        Self {
            step: step.max(1),
            max_distance,
            distance: 0,
            last_height: None,
        }
    }

    pub fn distance(&self) -> u32 {
        self.distance
    }

    /// 1回分スクロールした結果を記録し、続けるなら true
    pub fn observe(&mut self, sample: ScrollSample) -> bool {
        self.distance = self.distance.saturating_add(self.step);

        let grew = self
            .last_height
            .map_or(true, |last| sample.scroll_height > last);
        self.last_height = Some(sample.scroll_height);

        if self.distance >= self.max_distance {
            return false;
        }

        let at_bottom = sample.viewport_bottom >= sample.scroll_height;
        !(at_bottom && !grew)
    }
}
