pub mod config;
pub mod format;
pub mod relay_error;
