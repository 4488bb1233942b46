//! Shared utilities

pub mod config;
pub mod errors;
pub mod fs;
pub mod process;
pub mod properties;

pub use config::NarConfig;
pub use errors::NarError;
pub use properties::Properties;
