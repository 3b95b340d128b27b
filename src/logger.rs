use std::sync::Arc;
use std::time::Duration;

use spdlog::sink::{RotatingFileSink, RotationPolicy, Sink, StdStream, StdStreamSink};
use spdlog::{Level, LevelFilter, Logger};

use crate::config::{Config, LogLevel};

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Critical => Level::Critical,
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

/// Everything below warn goes to stdout, the rest to stderr.
fn console_sinks() -> spdlog::Result<Vec<Arc<dyn Sink>>> {
    let stdout = StdStreamSink::builder()
        .std_stream(StdStream::Stdout)
        .level_filter(LevelFilter::MoreVerbose(Level::Warn))
        .build()?;

    let stderr = StdStreamSink::builder()
        .std_stream(StdStream::Stderr)
        .level_filter(LevelFilter::MoreSevereEqual(Level::Warn))
        .build()?;

    Ok(vec![Arc::new(stdout), Arc::new(stderr)])
}

/// Installs the default logger described by the `[log]` section.
///
/// Without a `[log]` section messages go to the console at info level.
/// `level_override` wins over the configured level.
pub fn configure_logger(config: &Config, level_override: Option<LogLevel>) -> spdlog::Result<()> {
    let mut sinks: Vec<Arc<dyn Sink>> = vec![];
    let mut level = Level::Info;

    match config.log {
        Some(ref log) => {
            level = log.level.into();
            if let Some(ref location) = log.location {
                let file_sink = RotatingFileSink::builder()
                    .base_path(location)
                    .rotation_policy(RotationPolicy::Daily { hour: 0, minute: 0 })
                    .max_files(30)
                    .rotate_on_open(false)
                    .build()?;
                sinks.push(Arc::new(file_sink));
            }
            if log.log_to_console || sinks.is_empty() {
                sinks.extend(console_sinks()?);
            }
        }
        None => sinks.extend(console_sinks()?),
    }

    if let Some(level_override) = level_override {
        level = level_override.into();
    }

    let logger = Arc::new(Logger::builder().sinks(sinks).build()?);
    logger.set_flush_level_filter(LevelFilter::MoreSevereEqual(Level::Warn));
    logger.set_flush_period(Some(Duration::from_secs(2)));
    logger.set_level_filter(LevelFilter::MoreSevereEqual(level));

    spdlog::set_default_logger(logger);
    Ok(())
}
