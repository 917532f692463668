//! アルバム解決モジュール
//!
//! 共有アルバムのURLから画像URLの一覧を得る。方式は3つあり、
//! どれも `AlbumResolver` を実装する:
//! - page: アルバムページを取得し、埋め込みデータから抽出
//! - command: 外部ヘルパーコマンドの JSON 出力を取り込む
//! - browser: ヘッドレスブラウザでスクロールして `img` から抽出

pub mod browser;
pub mod command;
pub mod events;
pub mod page;

pub use browser::BrowserResolver;
pub use command::CommandResolver;
pub use events::{BrowserEvent, BrowserEventSink, TracingEvents};
pub use page::PageResolver;

use crate::config::Config;
use crate::error::{ResolveError, Result};
use crate::strategy::ResolverStrategy;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

/// 解決された画像1件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
}

impl ResolvedImage {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// アルバムURL → 画像URL一覧
///
/// 返した一覧は処理側が一度だけ消費する。失敗はその場で `ResolveError` として返し、
/// 実行全体を止めるかどうかは呼び出し側が決める。
#[async_trait]
pub trait AlbumResolver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, album_url: &str) -> std::result::Result<Vec<ResolvedImage>, ResolveError>;
}

/// 外部ツールが返す要素（文字列か `{ "url": ... }` のどちらか）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawAlbumItem {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

impl RawAlbumItem {
    /// URLを持たない要素は `None`
    pub fn into_resolved(self) -> Option<ResolvedImage> {
        let url = match self {
            RawAlbumItem::Url(url) => url,
            RawAlbumItem::Object { url } => url?,
        };
        let url = url.trim();
        if url.is_empty() {
            None
        } else {
            Some(ResolvedImage::new(url))
        }
    }
}

/// 出現順を保ったまま重複URLを除く
pub fn dedup_images(images: impl IntoIterator<Item = ResolvedImage>) -> Vec<ResolvedImage> {
    let mut seen = HashSet::new();
    images
        .into_iter()
        .filter(|img| seen.insert(img.url.clone()))
        .collect()
}

/// 設定の方式に応じて解決器を作る
pub fn build_resolver(
    strategy: ResolverStrategy,
    config: &Config,
    events: Arc<dyn BrowserEventSink>,
) -> Result<Box<dyn AlbumResolver>> {
    let resolver: Box<dyn AlbumResolver> = match strategy {
        ResolverStrategy::Page => Box::new(PageResolver::new(&config.download)?),
        ResolverStrategy::Command => Box::new(CommandResolver::new(config.command.clone())),
        ResolverStrategy::Browser => Box::new(BrowserResolver::new(config.browser.clone(), events)),
    };
    Ok(resolver)
}
