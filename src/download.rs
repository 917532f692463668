//! 画像ダウンロードモジュール
//!
//! リダイレクトは自前で追跡する（回数上限を `DownloadError::TooManyRedirects` で返すため）。
//! タイムアウトはリクエスト1回ごとに開始時刻から測り、ヘッダ受信と本文の書き込みの両方に効く。

use crate::config::DownloadSettings;
use crate::error::DownloadError;
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use url::Url;

type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// 画像を1枚保存する能力（テストでは差し替える）
#[async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> DownloadResult<()>;
}

pub struct Downloader {
    client: Client,
    timeout: Duration,
    max_redirects: u32,
}

impl Downloader {
    pub fn new(settings: &DownloadSettings) -> DownloadResult<Self> {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            timeout: settings.timeout(),
            max_redirects: settings.max_redirects,
        })
    }

    /// `url` を `dest` に保存する
    ///
    /// - リクエストは最大 `max_redirects` 回（3xx + Location の追跡は `max_redirects - 1` 回まで）
    /// - 2xx 以外で終わったら `UnexpectedStatus`
    /// - ファイル作成後に失敗したら途中のファイルを削除する
    pub async fn download_with_redirects(
        &self,
        url: &str,
        dest: &Path,
        max_redirects: u32,
    ) -> DownloadResult<()> {
        let mut current = parse_http_url(url)?;
        let mut remaining = max_redirects;

        loop {
            // 残り回数は各リクエストの前に確認する（上限5なら追跡できるのは4回まで）
            if remaining == 0 {
                return Err(DownloadError::TooManyRedirects {
                    url: url.to_string(),
                    max: max_redirects,
                });
            }

            let deadline = Instant::now() + self.timeout;
            let response = self.send(&current, deadline).await?;
            let status = response.status();

            if status.is_redirection() {
                if let Some(location) = response.headers().get(LOCATION) {
                    remaining -= 1;

                    let location = location
                        .to_str()
                        .map_err(|_| DownloadError::InvalidUrl(format!("{:?}", location)))?;
                    let next = current
                        .join(location)
                        .map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", location, e)))?;
                    ensure_http_scheme(&next)?;

                    tracing::debug!(from = %current, to = %next, remaining, "following redirect");
                    current = next;
                    continue;
                }
            }

            if !status.is_success() {
                return Err(DownloadError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }

            return self.save_body(response, dest, deadline, &current).await;
        }
    }

    async fn send(&self, url: &Url, deadline: Instant) -> DownloadResult<Response> {
        // 期限切れで future を破棄するとリクエストも中断される
        match timeout_at(deadline, self.client.get(url.clone()).send()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(self.timeout_error(url)),
        }
    }

    async fn save_body(
        &self,
        response: Response,
        dest: &Path,
        deadline: Instant,
        url: &Url,
    ) -> DownloadResult<()> {
        let file = tokio::fs::File::create(dest).await?;

        match write_or_remove(response, file, dest, deadline).await {
            Ok(bytes) => {
                tracing::debug!(url = %url, bytes, dest = %dest.display(), "saved");
                Ok(())
            }
            Err(CopyError::Timeout) => Err(self.timeout_error(url)),
            Err(CopyError::Failed(e)) => Err(e),
        }
    }

    fn timeout_error(&self, url: &Url) -> DownloadError {
        DownloadError::Timeout {
            url: url.to_string(),
            secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl ImageDownloader for Downloader {
    async fn download(&self, url: &str, dest: &Path) -> DownloadResult<()> {
        self.download_with_redirects(url, dest, self.max_redirects).await
    }
}

enum CopyError {
    Timeout,
    Failed(DownloadError),
}

/// 本文を書き込み、失敗したら途中まで書いた `dest` を削除する（削除の失敗は無視）
async fn write_or_remove<W>(
    response: Response,
    mut writer: W,
    dest: &Path,
    deadline: Instant,
) -> Result<u64, CopyError>
where
    W: AsyncWrite + Unpin,
{
    let result = match copy_body(response, &mut writer, deadline).await {
        Ok(bytes) => writer
            .flush()
            .await
            .map(|_| bytes)
            .map_err(|e| CopyError::Failed(e.into())),
        Err(e) => Err(e),
    };
    drop(writer);

    if result.is_err() {
        let _ = tokio::fs::remove_file(dest).await;
    }
    result
}

/// レスポンス本文を書き込み先へ流し込む
async fn copy_body<W>(mut response: Response, writer: &mut W, deadline: Instant) -> Result<u64, CopyError>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;

    loop {
        let chunk = match timeout_at(deadline, response.chunk()).await {
            Ok(Ok(Some(chunk))) => chunk,
            Ok(Ok(None)) => break,
            Ok(Err(e)) => return Err(CopyError::Failed(e.into())),
            Err(_) => return Err(CopyError::Timeout),
        };

        match timeout_at(deadline, writer.write_all(&chunk)).await {
            Ok(Ok(())) => written += chunk.len() as u64,
            Ok(Err(e)) => return Err(CopyError::Failed(e.into())),
            Err(_) => return Err(CopyError::Timeout),
        }
    }

    Ok(written)
}

fn parse_http_url(url: &str) -> DownloadResult<Url> {
    let parsed = Url::parse(url).map_err(|e| DownloadError::InvalidUrl(format!("{}: {}", url, e)))?;
    ensure_http_scheme(&parsed)?;
    Ok(parsed)
}

fn ensure_http_scheme(url: &Url) -> DownloadResult<()> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(DownloadError::UnsupportedScheme(other.to_string())),
    }
}
