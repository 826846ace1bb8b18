//! netban - connection access control for game servers.
//!
//! Maintains address bans, range bans and short-lived punishments in
//! fixed-capacity pools, answers "is this peer banned?" at accept time, and
//! persists bans as replayable console commands.

pub mod ban;
pub mod config;
pub mod console;
pub mod error;
pub mod metrics;
pub mod net;
pub mod telemetry;

pub use ban::{BanMessage, BanOutcome, Clock, ManualClock, NetBan, PunishOutcome, SystemClock};
pub use config::Config;
pub use console::Console;
pub use error::{BanError, ConsoleError};
pub use net::{Family, NetAddr, NetRange};
