//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::ban::PUNISH_CEILING_SECS;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("bans.sweep_interval_secs must be at least 1")]
    ZeroSweepInterval,
    #[error("punish.escalation_ban_minutes must cover the 5 minute punishment ceiling, got {0}")]
    EscalationTooShort(u64),
    #[error("bans.file is required")]
    EmptyBanFile,
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroSweepInterval => "zero_sweep_interval",
            Self::EscalationTooShort(_) => "escalation_too_short",
            Self::EmptyBanFile => "empty_ban_file",
        }
    }
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bans.sweep_interval_secs == 0 {
        errors.push(ValidationError::ZeroSweepInterval);
    }
    if config.bans.file.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyBanFile);
    }

    let minutes = config.punish.escalation_ban_minutes;
    if minutes.saturating_mul(60) < PUNISH_CEILING_SECS as u64 {
        errors.push(ValidationError::EscalationTooShort(minutes));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
