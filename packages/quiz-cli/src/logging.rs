//! stderr diagnostics for the quiz driver, plus an optional rolling file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Used when `RUST_LOG` is unset: quiz prompts share the terminal with logs
pub const DEFAULT_LOG_LEVEL: &str = "warn";

pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// Each `-v` lifts the configured filter one step: debug, then trace.
pub fn filter_directive(log_level: &str, verbosity: u8) -> String {
    match verbosity {
        0 => log_level.to_string(),
        1 => "danci_quiz=debug,warn".to_string(),
        _ => "trace".to_string(),
    }
}

pub fn init_tracing(log_level: &str, verbosity: u8) -> Option<FileLogGuard> {
    let directive = filter_directive(log_level, verbosity);
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    // 终端上只保留级别和消息, 完整格式写入日志文件
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(verbosity > 0)
        .compact();

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => {
                let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "danci-quiz.log");
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stderr_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
            Err(err) => eprintln!("failed to create log directory {log_dir}: {err}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    None
}
