//! Unified error handling for netban.
//!
//! Ban engine failures are reported outcomes, never process-fatal. Each error
//! carries a static code used for metrics labeling.

use thiserror::Error;

// ============================================================================
// Ban Errors (pool and façade operations)
// ============================================================================

/// Errors returned by ban, punish and unban operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BanError {
    /// The target pool already holds its maximum number of entries.
    #[error("ban failed (full banlist)")]
    PoolFull,

    /// Loopback addresses are never punished.
    #[error("ban failed (localhost)")]
    Localhost,

    /// Range bounds differ in family or are not strictly ascending.
    #[error("invalid range")]
    InvalidRange,

    #[error("unban failed (not found)")]
    NotFound,
}

impl BanError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PoolFull => "pool_full",
            Self::Localhost => "localhost",
            Self::InvalidRange => "invalid_range",
            Self::NotFound => "not_found",
        }
    }
}

// ============================================================================
// Console Errors (administrative command processing)
// ============================================================================

/// Errors that can occur while parsing or executing a console command.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0}: not enough parameters")]
    NeedMoreParams(&'static str),

    #[error("{command}: invalid argument '{value}'")]
    InvalidArgument { command: &'static str, value: String },

    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error(transparent)]
    Ban(#[from] BanError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCommand(_) => "unknown_command",
            Self::NeedMoreParams(_) => "need_more_params",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UnterminatedQuote => "unterminated_quote",
            Self::Ban(e) => e.error_code(),
            Self::Io(_) => "io_error",
        }
    }
}
