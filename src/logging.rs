//! 日誌初始化

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全域日誌（`RUST_LOG` 未設定時為 info）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// 測試用：輸出導到測試擷取器，重複呼叫不會失敗
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
