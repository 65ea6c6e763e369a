//! Configuration loading and management for the payroll engine.
//!
//! This module loads engine settings (leave limits, worker pool sizing,
//! back-dating warnings) from a YAML file.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Parallel processing: {}", config.config().parallel_processing);
//! ```

mod loader;
mod types;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader};
pub use types::EngineConfig;
