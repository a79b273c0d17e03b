pub mod config;
pub mod logging;

pub use config::{PROGRAM_NAME, default_index_path, mscan_dir};
pub use logging::init;
