use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::{Config, LogFormat};
use crate::utils::timing::TIMING_TARGET;

pub struct LoggingGuards {
    _file_guards: Vec<WorkerGuard>,
}

pub fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn general_targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("hyper_util::client::legacy::pool", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
}

/// Stdout always receives everything, timing records included, since that is
/// what the function platform collects. `LOG_DIR` adds daily-rolled files.
pub fn init_logging(config: &Config) -> LoggingGuards {
    let general_level = parse_log_level(&config.log_level);
    let stdout_filter = general_targets(general_level).with_target(TIMING_TARGET, LevelFilter::INFO);

    let (text_stdout, json_stdout) = match config.log_format {
        LogFormat::Text => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_filter(stdout_filter),
            ),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stdout)
                    .with_filter(stdout_filter),
            ),
        ),
    };

    let mut guards = Vec::new();
    let mut file_layer = None;
    let mut timing_layer = None;
    if let Some(logs_dir) = config.log_dir.as_deref() {
        match fs::create_dir_all(logs_dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(logs_dir, "critique.log");
                let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
                let timing_appender = tracing_appender::rolling::daily(logs_dir, "timing.log");
                let (timing_writer, timing_guard) =
                    tracing_appender::non_blocking(timing_appender);
                guards.push(file_guard);
                guards.push(timing_guard);

                let timing_filter = Targets::new()
                    .with_default(LevelFilter::OFF)
                    .with_target(TIMING_TARGET, LevelFilter::INFO);
                file_layer = Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(file_writer)
                        .with_ansi(false)
                        .with_filter(
                            general_targets(general_level)
                                .with_target(TIMING_TARGET, LevelFilter::OFF),
                        ),
                );
                timing_layer = Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(timing_writer)
                        .with_ansi(false)
                        .with_filter(timing_filter),
                );
            }
            Err(err) => {
                eprintln!("Failed to create logs directory {}: {err}", logs_dir.display());
            }
        }
    }

    tracing_subscriber::registry()
        .with(text_stdout)
        .with(json_stdout)
        .with(file_layer)
        .with(timing_layer)
        .init();

    LoggingGuards {
        _file_guards: guards,
    }
}
