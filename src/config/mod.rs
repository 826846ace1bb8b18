//! Configuration loading and management.
//!
//! - [`types`]: config struct definitions and TOML loading
//! - [`validation`]: startup checks

mod types;
mod validation;

pub use types::{BansConfig, Config, ConfigError, LogConfig, PunishConfig};
pub use validation::{ValidationError, validate};
