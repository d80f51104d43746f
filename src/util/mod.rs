//! Utility modules

pub mod fs;
pub mod paths;
pub mod tools;

pub use fs::{recreate_dir, rmdir};
pub use paths::{absolutize, default_config_path, resolve, CONFIG_FILENAME};
pub use tools::{detect_program, ToolStatus};
