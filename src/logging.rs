use tracing_subscriber::EnvFilter;

/// tracing の購読者を設定する
///
/// `RUST_LOG` があればそれを使い、なければ `--verbose` で debug、通常は info。
/// 既に設定済みなら何もしない。
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "travel_photos=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .compact()
        .with_writer(std::io::stderr)
        .try_init();
}
