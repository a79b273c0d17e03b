use std::{
    io::Write,
    sync::OnceLock,
};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::LOG_LEVEL_VAR;

/// Stderr logger behind the `log` facade.
///
/// Stdout is reserved for binary result and count streams, so every
/// diagnostic line goes to stderr.
struct StderrLogger {
    max_level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let mut err = std::io::stderr().lock();
        let _ = writeln!(
            err,
            "{stamp} {:5} [{}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

fn level_from_env() -> LevelFilter {
    std::env::var(LOG_LEVEL_VAR)
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn)
}

/// Install the stderr logger with the level from `MSCAN_LOG_LEVEL`.
pub fn init() -> Result<(), SetLoggerError> {
    init_with_level(level_from_env())
}

/// Install with an explicit level. Later calls keep the first level;
/// `log::set_logger` refuses a second logger anyway.
pub fn init_with_level(max_level: LevelFilter) -> Result<(), SetLoggerError> {
    static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

    let first_call = LOGGER.get().is_none();
    let logger = LOGGER.get_or_init(|| StderrLogger { max_level });

    if first_call {
        log::set_logger(logger)?;
        log::set_max_level(max_level);
    }
    Ok(())
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
