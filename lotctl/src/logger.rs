//! Logging Infrastructure
//!
//! Console logging on stderr, or daily-rolling files when a log directory
//! exists. `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger(log_level: &str, json: bool, log_dir: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    // 目录不存在时退回到控制台
    let log_dir = log_dir.filter(|dir| dir.is_dir());
    match (log_dir, json) {
        (Some(dir), true) => {
            let file_appender = tracing_appender::rolling::daily(dir, "lotctl");
            builder.json().with_writer(file_appender).init();
        }
        (Some(dir), false) => {
            let file_appender = tracing_appender::rolling::daily(dir, "lotctl");
            builder.with_ansi(false).with_writer(file_appender).init();
        }
        (None, true) => builder.json().with_writer(std::io::stderr).init(),
        (None, false) => builder.with_writer(std::io::stderr).init(),
    }
}
