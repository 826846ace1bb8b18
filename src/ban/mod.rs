//! Ban storage and lookup.
//!
//! - [`pool`]: fixed-capacity arena with hash chains and an expiry-sorted list
//! - [`hash`]: multi-resolution hash keys for addresses and ranges
//! - [`info`]: expiry and reason metadata
//! - [`clock`]: injectable time source
//! - [`netban`]: the façade used by the transport, console and host layers

pub mod clock;
pub mod hash;
pub mod info;
pub mod netban;
pub mod pool;

pub use clock::{Clock, ManualClock, SystemClock};
pub use hash::{DIMENSIONS, NetHash};
pub use info::{BanInfo, BanReason, Expiry, REASON_MAX_LEN};
pub use netban::{
    BanAddrPool, BanMessage, BanOutcome, BanRangePool, NetBan, PUNISH_CEILING_SECS, PoolKind,
    PunishOutcome,
};
pub use pool::{Ban, BanData, BanId, BanPool, MAX_BANS};
