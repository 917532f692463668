use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use travel_photos::{cli, config, download, error, logging, manifest, normalizer, processor, resolver, sync};
use travel_photos_common::validate_locations;
use cli::{Cli, Commands};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync { strategy, photos_dir, manifest: manifest_path, only } => {
            println!("📸 travel-photos - 写真取得\n");

            let locations = config.select_locations(&only)?;
            validate_locations(&locations)?;

            let strategy = strategy.unwrap_or(config.strategy);
            let photos_dir = photos_dir.unwrap_or_else(|| config.photos_dir.clone());
            let manifest_path = manifest_path.unwrap_or_else(|| config.manifest_path.clone());

            println!("- 方式: {}", strategy);
            println!("- 保存先: {}", photos_dir.display());
            println!("- ロケーション: {}件", locations.len());
            std::fs::create_dir_all(&photos_dir)?;

            let album_resolver = resolver::build_resolver(strategy, &config, Arc::new(resolver::TracingEvents))?;
            let downloader = download::Downloader::new(&config.download)?;
            let processor = processor::LocationProcessor::new(
                album_resolver.as_ref(),
                &downloader,
                processor::ProcessorOptions {
                    photos_dir,
                    max_dimension: config.max_dimension,
                    download_delay: config.download_delay(),
                    show_progress: std::io::stdout().is_terminal(),
                },
            );

            let summary = sync::run_sync(&locations, &processor, &manifest_path).await?;

            println!(
                "\n✅ 完了: {}ロケーション / {}枚",
                summary.manifest.len(),
                summary.manifest.total_photos()
            );
            if summary.failed_locations() > 0 {
                println!("⚠ {}件のロケーションで取得に失敗しました（空の結果として記録）", summary.failed_locations());
            }
        }

        Commands::Resolve { album_url, strategy } => {
            let strategy = strategy.unwrap_or(config.strategy);
            println!("🔍 travel-photos - アルバム解決 ({})\n", strategy);

            let album_resolver = resolver::build_resolver(strategy, &config, Arc::new(resolver::TracingEvents))?;
            let images = album_resolver.resolve(&album_url).await?;

            for image in &images {
                println!("{}", normalizer::normalize_image_url(&image.url, config.max_dimension));
            }
            println!("\n✔ {}枚の画像を検出", images.len());
        }

        Commands::Verify { photos_dir, manifest: manifest_path } => {
            let photos_dir = photos_dir.unwrap_or_else(|| config.photos_dir.clone());
            let manifest_path = manifest_path.unwrap_or_else(|| config.manifest_path.clone());

            let manifest = manifest::read_manifest(&manifest_path)?;
            let issues = manifest::verify_manifest(&manifest, &photos_dir);

            println!("マニフェスト: {} ({}ロケーション / {}枚)", manifest_path.display(), manifest.len(), manifest.total_photos());
            if manifest.is_empty() {
                println!("⚠ マニフェストにロケーションがありません");
            }
            if issues.is_empty() {
                println!("✔ 問題はありません");
            } else {
                for issue in &issues {
                    println!("  ✗ {}", issue);
                }
                return Err(error::PhotoSyncError::Verification(issues.len()));
            }
        }

        Commands::Locations => {
            validate_locations(&config.locations)?;

            // マニフェストがまだなければ全て0枚として表示
            let manifest = manifest::read_manifest(&config.manifest_path).unwrap_or_default();

            println!("登録ロケーション ({}件):", config.locations.len());
            for location in &config.locations {
                println!(
                    "  {:<16} {:<20} {:>4}枚  {}",
                    location.id,
                    location.name,
                    manifest.photos(&location.id).len(),
                    location.album_url().unwrap_or("(アルバム未設定)")
                );
            }
        }

        Commands::Config { show, init } => {
            if init {
                let path = PathBuf::from(config::LOCAL_CONFIG_FILE);
                if path.exists() {
                    println!("既に存在します: {}", path.display());
                } else {
                    Config::default().save(&path)?;
                    println!("✔ 設定ファイルを作成しました: {}", path.display());
                }
            }

            if show || !init {
                println!("設定:");
                println!("  方式: {}", config.strategy);
                println!("  保存先: {}", config.photos_dir.display());
                println!("  マニフェスト: {}", config.manifest_path.display());
                println!("  最大辺: {}px", config.max_dimension);
                println!("  ダウンロード間隔: {}ms", config.download_delay_ms);
                println!("  タイムアウト: {}秒", config.download.timeout_secs);
                println!("  リダイレクト上限: {}回", config.download.max_redirects);
                println!("  ロケーション: {}件", config.locations.len());
            }
        }
    }

    Ok(())
}
