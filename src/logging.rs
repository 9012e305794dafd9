use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// ログフィルタを指定する環境変数
pub const LOG_ENV: &str = "IMAGE_BATCH_LOG";

/// ログ初期化（標準エラー出力へ）
///
/// `--verbose` の場合は `IMAGE_BATCH_LOG` より優先して debug にする。
pub fn init_logger(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string())
    };
    let filter_layer = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .try_init();
}
