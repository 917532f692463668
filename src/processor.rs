//! ロケーション単位の処理
//!
//! ## 処理フロー
//! 1. 保存先ディレクトリを用意し、既存写真があればそれを結果としてそのまま返す
//! 2. アルバムURLがなければ空の結果
//! 3. アルバム解決 → URL正規化 → 1枚ずつ順番にダウンロード（間に待機を入れる）
//!
//! どの段階の失敗も、ここでログに出して空または一部の結果に変える。

use crate::download::ImageDownloader;
use crate::normalizer::normalize_image_url;
use crate::resolver::AlbumResolver;
use crate::scanner;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use travel_photos_common::{photo_file_name, Location};

#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub photos_dir: PathBuf,
    pub max_dimension: u32,
    pub download_delay: Duration,
    pub show_progress: bool,
}

/// 1ロケーションの処理がどう終わったか
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationOutcome {
    /// 既存写真を使用（ネットワークアクセスなし）
    Existing,
    /// アルバムURL未設定
    NoAlbum,
    Downloaded { attempted: usize, failed: usize },
    ResolveFailed(String),
    DirectoryUnavailable(String),
}

#[derive(Debug, Clone)]
pub struct LocationReport {
    pub photos: Vec<String>,
    pub outcome: LocationOutcome,
}

impl LocationReport {
    fn empty(outcome: LocationOutcome) -> Self {
        Self {
            photos: Vec::new(),
            outcome,
        }
    }
}

pub struct LocationProcessor<'a> {
    resolver: &'a dyn AlbumResolver,
    downloader: &'a dyn ImageDownloader,
    options: ProcessorOptions,
}

impl<'a> LocationProcessor<'a> {
    pub fn new(
        resolver: &'a dyn AlbumResolver,
        downloader: &'a dyn ImageDownloader,
        options: ProcessorOptions,
    ) -> Self {
        Self {
            resolver,
            downloader,
            options,
        }
    }

    pub fn location_dir(&self, location: &Location) -> PathBuf {
        self.options.photos_dir.join(&location.id)
    }

    pub async fn process(&self, location: &Location) -> LocationReport {
        let dir = self.location_dir(location);

        let existing = match scanner::scan_location_dir(&dir) {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(location = %location.id, dir = %dir.display(), "写真ディレクトリを用意できません: {}", e);
                return LocationReport::empty(LocationOutcome::DirectoryUnavailable(e.to_string()));
            }
        };

        if !existing.is_empty() {
            println!("  既存の写真 {}枚を使用（ダウンロードをスキップ）", existing.len());
            return LocationReport {
                photos: existing.into_iter().map(|p| p.file_name).collect(),
                outcome: LocationOutcome::Existing,
            };
        }

        let Some(album_url) = location.album_url() else {
            println!("  アルバムURLが設定されていません");
            return LocationReport::empty(LocationOutcome::NoAlbum);
        };

        println!("  アルバムを取得中... ({})", self.resolver.name());
        let images = match self.resolver.resolve(album_url).await {
            Ok(images) => images,
            Err(e) => {
                tracing::warn!(location = %location.id, album = %album_url, "アルバムの取得に失敗: {}", e);
                return LocationReport::empty(LocationOutcome::ResolveFailed(e.to_string()));
            }
        };

        if images.is_empty() {
            println!("  アルバムに画像が見つかりません");
            return LocationReport::empty(LocationOutcome::Downloaded {
                attempted: 0,
                failed: 0,
            });
        }
        println!("  {}枚の画像を検出", images.len());

        let total = images.len();
        let progress = self.progress_bar(total);
        let mut photos = Vec::with_capacity(total);
        let mut failed = 0;

        for (i, image) in images.into_iter().enumerate() {
            let file_name = photo_file_name(i + 1);
            let dest = dir.join(&file_name);
            let url = normalize_image_url(&image.url, self.options.max_dimension);

            progress.set_message(file_name.clone());
            tracing::debug!(location = %location.id, index = i + 1, total, url = %url, "downloading");

            match self.downloader.download(&url, &dest).await {
                Ok(()) => photos.push(file_name),
                Err(e) => {
                    failed += 1;
                    progress.suspend(|| {
                        tracing::warn!(location = %location.id, file = %file_name, "ダウンロード失敗: {}", e);
                    });
                }
            }
            progress.inc(1);

            // レート制限対策
            if !self.options.download_delay.is_zero() {
                tokio::time::sleep(self.options.download_delay).await;
            }
        }
        progress.finish_and_clear();

        println!("  ✔ {}/{}枚を保存", photos.len(), total);

        LocationReport {
            photos,
            outcome: LocationOutcome::Downloaded {
                attempted: total,
                failed,
            },
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("  [{bar:30}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
        bar.set_style(style);
        bar
    }
}
