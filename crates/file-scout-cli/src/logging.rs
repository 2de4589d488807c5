use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/file-scout.log";

/// Human-readable events go to stderr so stdout only carries command output.
/// The file layer records worker thread names, which tell the per-operation
/// pools apart.
pub fn init_logger() -> WorkerGuard {
    let filter_layer =
        EnvFilter::try_from_env("TRACING_LEVEL").unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path =
        PathBuf::from(env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()));
    let log_dir = log_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let log_name = log_path
        .file_name()
        .unwrap_or_else(|| OsStr::new("file-scout.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .pretty()
                .with_file(false)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_thread_names(true)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    info!(log_file = %log_path.display(), "Logging to stderr and file");

    guard
}
