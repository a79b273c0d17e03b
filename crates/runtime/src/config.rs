use std::path::PathBuf;

pub const PROGRAM_NAME: &str = "mscan";
/// Environment variable naming the stderr log level.
pub const LOG_LEVEL_VAR: &str = "MSCAN_LOG_LEVEL";
pub const INDEX_FILE_NAME: &str = "features.idx";

/// Resolve an XDG base directory with a `$HOME`-relative fallback.
pub fn xdg_or_home(xdg_var: &str, home_suffix: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os(xdg_var) {
        PathBuf::from(dir)
    } else {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(home_suffix)
    }
}

/// Data directory for index files and validation reports.
///
/// The engine itself never reads this: every entry point takes explicit
/// paths. Only the CLI falls back here.
pub fn mscan_dir() -> PathBuf {
    xdg_or_home("XDG_DATA_HOME", ".local/share").join(PROGRAM_NAME)
}

pub fn default_index_path() -> PathBuf {
    mscan_dir().join(INDEX_FILE_NAME)
}
