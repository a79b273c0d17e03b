use log::{Level, LevelFilter, Metadata, Record};
use serial_test::serial;

use super::*;

#[test]
#[serial]
fn level_from_env_parses_filters_and_defaults_to_warn() {
    let cases: &[(Option<&str>, LevelFilter)] = &[
        (None, LevelFilter::Warn),
        (Some("trace"), LevelFilter::Trace),
        (Some("DEBUG"), LevelFilter::Debug),
        (Some("info"), LevelFilter::Info),
        (Some("warn"), LevelFilter::Warn),
        (Some("ERROR"), LevelFilter::Error),
        (Some("off"), LevelFilter::Off),
        (Some("garbage"), LevelFilter::Warn),
        (Some(""), LevelFilter::Warn),
    ];

    for (value, expected) in cases {
        match value {
            Some(v) => unsafe { std::env::set_var(LOG_LEVEL_VAR, v) },
            None => unsafe { std::env::remove_var(LOG_LEVEL_VAR) },
        }
        assert_eq!(level_from_env(), *expected, "env {value:?}");
    }

    unsafe { std::env::remove_var(LOG_LEVEL_VAR) };
}

#[test]
fn enabled_respects_the_level_threshold() {
    let logger = StderrLogger { max_level: LevelFilter::Info };

    let meta = |level: Level| Metadata::builder().level(level).target("t").build();
    assert!(logger.enabled(&meta(Level::Error)));
    assert!(logger.enabled(&meta(Level::Info)));
    assert!(!logger.enabled(&meta(Level::Debug)));
    assert!(!logger.enabled(&meta(Level::Trace)));
}

#[test]
fn logging_below_and_above_the_threshold_does_not_panic() {
    let logger = StderrLogger { max_level: LevelFilter::Info };

    for level in [Level::Error, Level::Info, Level::Debug] {
        let args = format_args!("probe");
        let record = Record::builder().level(level).target("t").args(args).build();
        logger.log(&record);
    }
    logger.flush();
}

#[test]
#[serial]
fn init_is_idempotent() {
    init_with_level(LevelFilter::Warn).ok();
    // A second install must not panic or change behaviour.
    init_with_level(LevelFilter::Trace).ok();
}
