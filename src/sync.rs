//! 全ロケーションの一括処理
//!
//! ロケーションは1件ずつ順番に処理する（写真ホストへの同時アクセスを避けるため）。
//! マニフェストを更新するのはこのループだけで、最後に1回だけ書き出す。

use crate::error::Result;
use crate::manifest::write_manifest;
use crate::processor::{LocationOutcome, LocationProcessor};
use std::path::Path;
use travel_photos_common::{Location, Manifest, ManifestEntry};

#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub manifest: Manifest,
    pub outcomes: Vec<(String, LocationOutcome)>,
}

impl SyncSummary {
    pub fn failed_locations(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| {
                matches!(
                    o,
                    LocationOutcome::ResolveFailed(_) | LocationOutcome::DirectoryUnavailable(_)
                )
            })
            .count()
    }
}

/// 全ロケーションを処理してマニフェストを組み立てる（書き出しはしない）
pub async fn collect_manifest(
    locations: &[Location],
    processor: &LocationProcessor<'_>,
) -> SyncSummary {
    let mut manifest = Manifest::new();
    let mut outcomes = Vec::with_capacity(locations.len());

    for location in locations {
        println!("\n処理中: {} ({})", location.name, location.id);
        let report = processor.process(location).await;

        manifest.insert(
            location.id.clone(),
            ManifestEntry {
                name: location.name.clone(),
                photos: report.photos,
            },
        );
        outcomes.push((location.id.clone(), report.outcome));
    }

    SyncSummary { manifest, outcomes }
}

/// 全ロケーションを処理し、マニフェストを `manifest_path` に書き出す
///
/// 個別の失敗は空の結果として記録されるだけなので、書き出しに失敗しない限り `Ok`。
pub async fn run_sync(
    locations: &[Location],
    processor: &LocationProcessor<'_>,
    manifest_path: &Path,
) -> Result<SyncSummary> {
    let summary = collect_manifest(locations, processor).await;

    write_manifest(manifest_path, &summary.manifest)?;
    println!("\nマニフェストを書き出しました: {}", manifest_path.display());
    tracing::info!(
        locations = summary.manifest.len(),
        photos = summary.manifest.total_photos(),
        failed = summary.failed_locations(),
        "sync finished"
    );

    Ok(summary)
}
