//! Integration test common infrastructure.
//!
//! Provides a manually clocked engine fixture and a helper for driving the
//! `netband` binary over stdin.

pub mod daemon;

#[allow(unused_imports)]
pub use daemon::TestDaemon;

use netban::{ManualClock, NetAddr, NetBan, NetRange};

/// Fixed start time for deterministic expiry arithmetic.
pub const NOW: i64 = 1_700_000_000;

/// Engine with a shared manual clock.
#[allow(dead_code)]
pub fn manual_netban() -> (NetBan<ManualClock>, ManualClock) {
    let clock = ManualClock::new(NOW);
    (NetBan::new(clock.clone()), clock)
}

#[allow(dead_code)]
pub fn addr(s: &str) -> NetAddr {
    s.parse().expect("valid address")
}

#[allow(dead_code)]
pub fn range(lb: &str, ub: &str) -> NetRange {
    NetRange::new(addr(lb), addr(ub)).expect("valid range")
}
