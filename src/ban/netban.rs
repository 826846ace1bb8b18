//! Ban, punish, unban and query façade.
//!
//! [`NetBan`] owns three pools (address bans, address punishments, range
//! bans) and is the only entry point used by collaborators:
//!
//! - the transport layer calls [`NetBan::is_banned`] at accept time
//! - the console layer calls the ban/unban operations
//! - the host process calls [`NetBan::update`] on a steady cadence
//!
//! Addresses are stored and probed with their port cleared, so a ban on a
//! host matches connections from any source port.

use super::clock::{Clock, SystemClock};
use super::hash::{DIMENSIONS, NetHash};
use super::info::{BanInfo, Expiry};
use super::pool::{Ban, BanData, BanId, BanPool};
use crate::error::BanError;
use crate::metrics;
use crate::net::{NetAddr, NetRange};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pool of exact-address entries.
pub type BanAddrPool = BanPool<NetAddr, 1>;

/// Pool of range entries, indexed by common-prefix length.
pub type BanRangePool = BanPool<NetRange, DIMENSIONS>;

/// Punishments whose cumulative expiry reaches past `now` plus this many
/// seconds are due for escalation to a real ban.
pub const PUNISH_CEILING_SECS: i64 = 300;

/// Result of a successful ban.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanOutcome {
    /// A new entry was stored.
    Created(BanId),
    /// An entry for the same payload existed; its metadata was replaced.
    Updated(BanId),
}

impl BanOutcome {
    pub fn id(&self) -> BanId {
        match *self {
            Self::Created(id) | Self::Updated(id) => id,
        }
    }
}

/// Result of a successful punishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunishOutcome {
    Created(BanId),
    Updated(BanId),
    /// The extended punishment would exceed the ceiling. The entry is left
    /// unchanged; the caller decides whether to ban.
    EscalationDue,
}

/// Message flavour produced by [`NetBan::describe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BanMessage {
    /// Shown to the rejected connection.
    Player,
    /// Listing entry.
    List,
    Added,
    Removed,
}

/// Which of the façade's pools an operation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    BanAddr,
    PunishAddr,
    BanRange,
}

impl PoolKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BanAddr => "ban_addr",
            Self::PunishAddr => "punish_addr",
            Self::BanRange => "ban_range",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Connection access-control engine.
pub struct NetBan<C = SystemClock> {
    ban_addr_pool: BanAddrPool,
    punish_addr_pool: BanAddrPool,
    ban_range_pool: BanRangePool,
    localhost_v4: NetAddr,
    localhost_v6: NetAddr,
    clock: C,
}

impl Default for NetBan<SystemClock> {
    fn default() -> Self {
        Self::new(SystemClock)
    }
}

impl<C: Clock> NetBan<C> {
    pub fn new(clock: C) -> Self {
        Self {
            ban_addr_pool: BanAddrPool::new(),
            punish_addr_pool: BanAddrPool::new(),
            ban_range_pool: BanRangePool::new(),
            localhost_v4: NetAddr::localhost_v4(),
            localhost_v6: NetAddr::localhost_v6(),
            clock,
        }
    }

    /// Current time according to the injected clock.
    #[inline]
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    pub fn addr_bans(&self) -> &BanAddrPool {
        &self.ban_addr_pool
    }

    pub fn range_bans(&self) -> &BanRangePool {
        &self.ban_range_pool
    }

    pub fn punishments(&self) -> &BanAddrPool {
        &self.punish_addr_pool
    }

    // ========================================================================
    // Ban
    // ========================================================================

    /// Ban an address for `duration` (`None` = permanent).
    pub fn ban_addr(
        &mut self,
        addr: &NetAddr,
        duration: Option<Duration>,
        reason: &str,
    ) -> Result<BanOutcome, BanError> {
        let now = self.now();
        let info = BanInfo::new(Expiry::after(now, duration), reason);
        let outcome = ban(&mut self.ban_addr_pool, addr.host(), info, PoolKind::BanAddr, now);
        metrics::set_active_bans(PoolKind::BanAddr.label(), self.ban_addr_pool.len());
        outcome
    }

    /// Ban an address range for `duration` (`None` = permanent).
    pub fn ban_range(
        &mut self,
        range: &NetRange,
        duration: Option<Duration>,
        reason: &str,
    ) -> Result<BanOutcome, BanError> {
        let now = self.now();
        let info = BanInfo::new(Expiry::after(now, duration), reason);
        let outcome = ban(&mut self.ban_range_pool, *range, info, PoolKind::BanRange, now);
        metrics::set_active_bans(PoolKind::BanRange.label(), self.ban_range_pool.len());
        outcome
    }

    /// Punish an address for `seconds`.
    ///
    /// Loopback addresses are never punished. Repeated punishments extend the
    /// existing expiry cumulatively; once the total would pass
    /// [`PUNISH_CEILING_SECS`] from now, [`PunishOutcome::EscalationDue`] is
    /// returned and the entry is left as is.
    pub fn punish_addr(
        &mut self,
        addr: &NetAddr,
        seconds: u64,
        reason: &str,
    ) -> Result<PunishOutcome, BanError> {
        let addr = addr.host();
        if addr == self.localhost_v4 || addr == self.localhost_v6 {
            warn!(target: "net_ban", addr = %addr, "ban failed (localhost)");
            return Err(BanError::Localhost);
        }

        let now = self.now();
        let secs = i64::try_from(seconds).unwrap_or(i64::MAX);
        let hash = addr.net_hash();
        let pool = &mut self.punish_addr_pool;

        if let Some(id) = pool.find(&addr, hash) {
            let base = match pool.get(id).map(|ban| ban.info().expires) {
                Some(Expiry::At(t)) => t.max(now),
                _ => i64::MAX,
            };
            let expires = base.saturating_add(secs);
            if expires > now.saturating_add(PUNISH_CEILING_SECS) {
                info!(target: "net_ban", addr = %addr, expires, "punishment escalation due");
                return Ok(PunishOutcome::EscalationDue);
            }
            pool.update(id, BanInfo::new(Expiry::At(expires), reason));
            if let Some(ban) = pool.get(id) {
                info!(target: "net_ban", pool = %PoolKind::PunishAddr, "{}", describe(ban, BanMessage::List, now));
            }
            return Ok(PunishOutcome::Updated(id));
        }

        let info = BanInfo::new(Expiry::At(now.saturating_add(secs)), reason);
        match pool.add(addr, info, hash) {
            Ok(id) => {
                if let Some(ban) = pool.get(id) {
                    info!(target: "net_ban", pool = %PoolKind::PunishAddr, "{}", describe(ban, BanMessage::Added, now));
                }
                metrics::record_ban_added(PoolKind::PunishAddr.label());
                metrics::set_active_bans(PoolKind::PunishAddr.label(), pool.len());
                Ok(PunishOutcome::Created(id))
            }
            Err(e) => {
                warn!(target: "net_ban", pool = %PoolKind::PunishAddr, error = %e, "punish failed");
                Err(e)
            }
        }
    }

    // ========================================================================
    // Unban
    // ========================================================================

    /// Remove the ban on exactly `addr`. Returns the removal message.
    pub fn unban_addr(&mut self, addr: &NetAddr) -> Result<String, BanError> {
        let now = self.now();
        let result = unban(&mut self.ban_addr_pool, &addr.host(), now);
        metrics::set_active_bans(PoolKind::BanAddr.label(), self.ban_addr_pool.len());
        result
    }

    /// Remove the ban on exactly `range`. Returns the removal message.
    pub fn unban_range(&mut self, range: &NetRange) -> Result<String, BanError> {
        let now = self.now();
        let result = unban(&mut self.ban_range_pool, range, now);
        metrics::set_active_bans(PoolKind::BanRange.label(), self.ban_range_pool.len());
        result
    }

    /// Remove the ban at listing position `ordinal`.
    ///
    /// Positions run through the address bans first, then the range bans,
    /// each in expiry order.
    pub fn unban_index(&mut self, ordinal: usize) -> Result<String, BanError> {
        let now = self.now();
        let addr_count = self.ban_addr_pool.len();
        let removed = if ordinal < addr_count {
            let pool = &mut self.ban_addr_pool;
            pool.nth(ordinal)
                .and_then(|id| pool.remove(id))
                .map(|ban| describe(&ban, BanMessage::Removed, now))
        } else {
            let pool = &mut self.ban_range_pool;
            pool.nth(ordinal - addr_count)
                .and_then(|id| pool.remove(id))
                .map(|ban| describe(&ban, BanMessage::Removed, now))
        };
        self.refresh_gauges();

        match removed {
            Some(msg) => {
                info!(target: "net_ban", ordinal, "{}", msg);
                Ok(msg)
            }
            None => {
                warn!(target: "net_ban", ordinal, "unban failed (invalid index)");
                Err(BanError::NotFound)
            }
        }
    }

    /// Drop every address and range ban. Punishments are kept.
    pub fn unban_all(&mut self) {
        let count = self.ban_addr_pool.len() + self.ban_range_pool.len();
        self.ban_addr_pool.reset();
        self.ban_range_pool.reset();
        self.refresh_gauges();
        info!(target: "net_ban", count, "unbanned all entries");
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// **HOT PATH**: Check whether a connection from `addr` is denied.
    ///
    /// Checks exact address bans first, then range bans through the
    /// multi-resolution index. Returns the message for the rejected player,
    /// or `None` when the address is allowed. Punishments are not consulted.
    pub fn is_banned(&self, addr: &NetAddr) -> Option<String> {
        let addr = addr.host();
        let now = self.now();

        let hit = self
            .ban_addr_pool
            .bucket(addr.net_hash())
            .find(|(_, ban)| *ban.data() == addr && !ban.info().expires.has_passed(now))
            .map(|(_, ban)| describe(ban, BanMessage::Player, now))
            .or_else(|| {
                NetHash::candidates(&addr).find_map(|key| {
                    self.ban_range_pool
                        .bucket(key)
                        .find(|(_, ban)| {
                            ban.data().contains(&addr) && !ban.info().expires.has_passed(now)
                        })
                        .map(|(_, ban)| describe(ban, BanMessage::Player, now))
                })
            });

        metrics::record_check(hit.is_some());
        if hit.is_some() {
            debug!(target: "net_ban", addr = %addr, "connection denied");
        }
        hit
    }

    /// Format a stored entry as a console or player message.
    pub fn describe<T: BanData>(&self, ban: &Ban<T>, kind: BanMessage) -> String {
        describe(ban, kind, self.now())
    }

    // ========================================================================
    // Sweep
    // ========================================================================

    /// Remove lapsed entries from all three pools.
    ///
    /// Each pool is walked from its earliest expiry and the walk stops at the
    /// first live entry. Returns the number of entries removed.
    pub fn update(&mut self) -> usize {
        let now = self.now();
        let mut total = 0;

        for (kind, pool) in [
            (PoolKind::BanAddr, &mut self.ban_addr_pool),
            (PoolKind::PunishAddr, &mut self.punish_addr_pool),
        ] {
            let removed = pool.remove_expired(now, |ban| log_expired(kind, ban));
            total += record_sweep(kind, removed, pool.len());
        }
        let removed = self
            .ban_range_pool
            .remove_expired(now, |ban| log_expired(PoolKind::BanRange, ban));
        total += record_sweep(PoolKind::BanRange, removed, self.ban_range_pool.len());

        total
    }

    fn refresh_gauges(&self) {
        metrics::set_active_bans(PoolKind::BanAddr.label(), self.ban_addr_pool.len());
        metrics::set_active_bans(PoolKind::PunishAddr.label(), self.punish_addr_pool.len());
        metrics::set_active_bans(PoolKind::BanRange.label(), self.ban_range_pool.len());
    }
}

impl<C> fmt::Debug for NetBan<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetBan")
            .field("addr_bans", &self.ban_addr_pool.len())
            .field("punishments", &self.punish_addr_pool.len())
            .field("range_bans", &self.ban_range_pool.len())
            .finish()
    }
}

/// Insert or refresh `data` in `pool`; never stores a duplicate payload.
fn ban<T: BanData, const D: usize>(
    pool: &mut BanPool<T, D>,
    data: T,
    info: BanInfo,
    kind: PoolKind,
    now: i64,
) -> Result<BanOutcome, BanError> {
    let hash = data.net_hash();

    if let Some(id) = pool.find(&data, hash) {
        pool.update(id, info);
        if let Some(ban) = pool.get(id) {
            info!(target: "net_ban", pool = %kind, "{}", describe(ban, BanMessage::List, now));
        }
        return Ok(BanOutcome::Updated(id));
    }

    match pool.add(data, info, hash) {
        Ok(id) => {
            if let Some(ban) = pool.get(id) {
                info!(target: "net_ban", pool = %kind, "{}", describe(ban, BanMessage::Added, now));
            }
            metrics::record_ban_added(kind.label());
            Ok(BanOutcome::Created(id))
        }
        Err(e) => {
            warn!(target: "net_ban", pool = %kind, error = %e, "ban failed");
            Err(e)
        }
    }
}

fn unban<T: BanData, const D: usize>(
    pool: &mut BanPool<T, D>,
    data: &T,
    now: i64,
) -> Result<String, BanError> {
    let removed = pool
        .find(data, data.net_hash())
        .and_then(|id| pool.remove(id))
        .map(|ban| describe(&ban, BanMessage::Removed, now));

    match removed {
        Some(msg) => {
            info!(target: "net_ban", "{}", msg);
            Ok(msg)
        }
        None => {
            warn!(target: "net_ban", entry = %data.quoted(), "unban failed (not found)");
            Err(BanError::NotFound)
        }
    }
}

fn describe<T: BanData>(ban: &Ban<T>, kind: BanMessage, now: i64) -> String {
    let head = match kind {
        BanMessage::Player => "You have been banned".to_string(),
        BanMessage::List => format!("{} banned", ban.data().quoted()),
        BanMessage::Added => format!("banned {}", ban.data().quoted()),
        BanMessage::Removed => format!("unbanned {}", ban.data().quoted()),
    };
    let reason = &ban.info().reason;
    match ban.info().expires.remaining_minutes(now) {
        Some(mins) if mins > 1 => format!("{head} for {mins} minutes ({reason})"),
        Some(_) => format!("{head} for 1 minute ({reason})"),
        None => format!("{head} for life ({reason})"),
    }
}

fn log_expired<T: BanData>(kind: PoolKind, ban: &Ban<T>) {
    info!(target: "net_ban", pool = %kind, "ban {} expired", ban.data().quoted());
}

fn record_sweep(kind: PoolKind, removed: usize, remaining: usize) -> usize {
    if removed > 0 {
        metrics::record_bans_expired(kind.label(), removed);
        metrics::set_active_bans(kind.label(), remaining);
        debug!(target: "net_ban", pool = %kind, count = removed, "Pruned expired entries");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ban::clock::ManualClock;

    const NOW: i64 = 1_700_000_000;

    fn netban() -> (NetBan<ManualClock>, ManualClock) {
        let clock = ManualClock::new(NOW);
        (NetBan::new(clock.clone()), clock)
    }

    fn addr(s: &str) -> NetAddr {
        s.parse().unwrap()
    }

    fn range(lb: &str, ub: &str) -> NetRange {
        NetRange::new(addr(lb), addr(ub)).unwrap()
    }

    fn mins(m: u64) -> Option<Duration> {
        Some(Duration::from_secs(m * 60))
    }

    #[test]
    fn test_ban_twice_updates_in_place() {
        let (mut nb, _) = netban();
        let a = addr("10.0.0.1");
        let first = nb.ban_addr(&a, Some(Duration::from_secs(60)), "x").unwrap();
        let second = nb.ban_addr(&a, Some(Duration::from_secs(120)), "y").unwrap();

        assert!(matches!(first, BanOutcome::Created(_)));
        assert_eq!(second, BanOutcome::Updated(first.id()));
        assert_eq!(nb.addr_bans().len(), 1);
        let ban = nb.addr_bans().get(second.id()).unwrap();
        assert_eq!(ban.info().expires, Expiry::At(NOW + 120));
        assert_eq!(ban.info().reason.as_str(), "y");
    }

    #[test]
    fn test_port_ignored_for_address_bans() {
        let (mut nb, _) = netban();
        nb.ban_addr(&addr("10.0.0.1:8303"), None, "cheater").unwrap();
        assert!(nb.is_banned(&addr("10.0.0.1:41234")).is_some());
        assert!(nb.is_banned(&addr("10.0.0.1")).is_some());
        assert!(nb.unban_addr(&addr("10.0.0.1:1")).is_ok());
    }

    #[test]
    fn test_permanent_ban_message_and_unban() {
        let (mut nb, _) = netban();
        let a = addr("10.0.0.1");
        nb.ban_addr(&a, None, "cheater").unwrap();

        let msg = nb.is_banned(&a).unwrap();
        assert_eq!(msg, "You have been banned for life (cheater)");

        let removed = nb.unban_addr(&a).unwrap();
        assert_eq!(removed, "unbanned '10.0.0.1' for life (cheater)");
        assert!(nb.is_banned(&a).is_none());
        assert_eq!(nb.unban_addr(&a), Err(BanError::NotFound));
    }

    #[test]
    fn test_range_ban_containment() {
        let (mut nb, _) = netban();
        nb.ban_range(&range("1.2.3.0", "1.2.3.255"), Some(Duration::from_secs(3600)), "spam")
            .unwrap();

        let msg = nb.is_banned(&addr("1.2.3.42")).unwrap();
        assert!(msg.contains("60 minutes"), "{msg}");
        assert!(msg.contains("spam"), "{msg}");
        assert!(nb.is_banned(&addr("1.2.4.1")).is_none());
        assert!(nb.is_banned(&addr("::1.2.3.42")).is_none());
    }

    #[test]
    fn test_range_bans_of_every_specificity() {
        let (mut nb, _) = netban();
        nb.ban_range(&range("0.0.0.0", "0.255.255.255"), None, "d0").unwrap();
        nb.ban_range(&range("20.0.0.0", "20.255.255.255"), None, "d1").unwrap();
        nb.ban_range(&range("30.1.0.0", "30.1.255.255"), None, "d2").unwrap();
        nb.ban_range(&range("40.1.2.10", "40.1.2.20"), None, "d3").unwrap();
        nb.ban_range(&range("2001:db8::", "2001:db8::ffff:ffff"), None, "v6").unwrap();

        assert!(nb.is_banned(&addr("0.1.2.3")).unwrap().contains("d0"));
        assert!(nb.is_banned(&addr("20.9.9.9")).unwrap().contains("d1"));
        assert!(nb.is_banned(&addr("30.1.77.1")).unwrap().contains("d2"));
        assert!(nb.is_banned(&addr("40.1.2.15")).unwrap().contains("d3"));
        assert!(nb.is_banned(&addr("2001:db8::1:2")).unwrap().contains("v6"));

        assert!(nb.is_banned(&addr("30.2.0.1")).is_none());
        assert!(nb.is_banned(&addr("40.1.2.21")).is_none());
        assert!(nb.is_banned(&addr("2001:db9::1")).is_none());
    }

    #[test]
    fn test_address_ban_checked_before_range() {
        let (mut nb, _) = netban();
        nb.ban_range(&range("1.2.3.0", "1.2.3.255"), None, "range").unwrap();
        nb.ban_addr(&addr("1.2.3.4"), mins(5), "exact").unwrap();
        let msg = nb.is_banned(&addr("1.2.3.4")).unwrap();
        assert_eq!(msg, "You have been banned for 5 minutes (exact)");
    }

    #[test]
    fn test_punish_localhost_always_rejected() {
        let (mut nb, _) = netban();
        for seconds in [0, 1, 60, u64::MAX] {
            assert_eq!(
                nb.punish_addr(&addr("127.0.0.1"), seconds, "flood"),
                Err(BanError::Localhost)
            );
            assert_eq!(
                nb.punish_addr(&addr("::1"), seconds, ""),
                Err(BanError::Localhost)
            );
        }
        assert_eq!(
            nb.punish_addr(&addr("127.0.0.1:8303"), 10, "flood"),
            Err(BanError::Localhost)
        );
        assert!(nb.punishments().is_empty());
    }

    #[test]
    fn test_punish_accumulates_then_escalates() {
        let (mut nb, _) = netban();
        let a = addr("10.0.0.9");

        let created = nb.punish_addr(&a, 100, "flood").unwrap();
        assert!(matches!(created, PunishOutcome::Created(_)));

        let updated = nb.punish_addr(&a, 100, "flood").unwrap();
        assert!(matches!(updated, PunishOutcome::Updated(_)));
        let id = nb.punishments().first().unwrap();
        assert_eq!(
            nb.punishments().get(id).unwrap().info().expires,
            Expiry::At(NOW + 200)
        );

        nb.punish_addr(&a, 100, "flood").unwrap();
        assert_eq!(
            nb.punishments().get(id).unwrap().info().expires,
            Expiry::At(NOW + 300)
        );

        // 400 > 300: the entry stays as is and the caller is told to ban
        assert_eq!(
            nb.punish_addr(&a, 100, "flood").unwrap(),
            PunishOutcome::EscalationDue
        );
        assert_eq!(
            nb.punishments().get(id).unwrap().info().expires,
            Expiry::At(NOW + 300)
        );
        assert_eq!(nb.punishments().len(), 1);
    }

    #[test]
    fn test_punishment_does_not_block_connection() {
        let (mut nb, _) = netban();
        let a = addr("10.0.0.9");
        nb.punish_addr(&a, 60, "flood").unwrap();
        assert!(nb.is_banned(&a).is_none());
    }

    #[test]
    fn test_unban_index_spans_address_then_range_pools() {
        let (mut nb, _) = netban();
        nb.ban_addr(&addr("10.0.0.1"), mins(10), "a1").unwrap();
        nb.ban_addr(&addr("10.0.0.2"), mins(5), "a2").unwrap();
        nb.ban_range(&range("1.2.3.0", "1.2.3.255"), None, "r1").unwrap();

        // listing order: 10.0.0.2 (5m), 10.0.0.1 (10m), range
        let msg = nb.unban_index(2).unwrap();
        assert!(msg.starts_with("unbanned '1.2.3.0' - '1.2.3.255'"), "{msg}");
        let msg = nb.unban_index(0).unwrap();
        assert!(msg.contains("10.0.0.2"), "{msg}");
        assert_eq!(nb.unban_index(1), Err(BanError::NotFound));
        assert_eq!(nb.unban_index(usize::MAX), Err(BanError::NotFound));
        assert_eq!(nb.addr_bans().len(), 1);
    }

    #[test]
    fn test_unban_all_keeps_punishments() {
        let (mut nb, _) = netban();
        nb.ban_addr(&addr("10.0.0.1"), None, "a").unwrap();
        nb.ban_range(&range("1.2.3.0", "1.2.3.255"), None, "r").unwrap();
        nb.punish_addr(&addr("10.0.0.2"), 60, "p").unwrap();

        nb.unban_all();
        assert!(nb.addr_bans().is_empty());
        assert!(nb.range_bans().is_empty());
        assert_eq!(nb.punishments().len(), 1);
        assert!(nb.is_banned(&addr("1.2.3.4")).is_none());
    }

    #[test]
    fn test_pool_full() {
        let (mut nb, _) = netban();
        for i in 0..1024u32 {
            let a = NetAddr::from(std::net::Ipv4Addr::from(0x0b00_0000 + i));
            assert!(nb.ban_addr(&a, None, "fill").is_ok());
        }
        assert_eq!(
            nb.ban_addr(&addr("12.0.0.1"), None, "overflow"),
            Err(BanError::PoolFull)
        );
        assert_eq!(nb.addr_bans().len(), 1024);
        // refreshing an existing entry still works when full
        assert!(matches!(
            nb.ban_addr(&addr("11.0.0.0"), mins(1), "refresh"),
            Ok(BanOutcome::Updated(_))
        ));
    }

    #[test]
    fn test_sweep_removes_only_lapsed_numeric_entries() {
        let (mut nb, clock) = netban();
        nb.ban_addr(&addr("10.0.0.1"), mins(1), "t1").unwrap();
        nb.ban_addr(&addr("10.0.0.2"), None, "never").unwrap();
        nb.ban_addr(&addr("10.0.0.3"), mins(2), "t2").unwrap();
        nb.ban_addr(&addr("10.0.0.4"), mins(60), "future").unwrap();
        nb.ban_range(&range("1.2.3.0", "1.2.3.255"), mins(2), "r").unwrap();
        nb.punish_addr(&addr("10.0.0.5"), 30, "p").unwrap();

        clock.advance(120);
        assert_eq!(nb.update(), 4);

        let left: Vec<String> = nb
            .addr_bans()
            .iter()
            .map(|(_, ban)| ban.data().to_string())
            .collect();
        assert_eq!(left, vec!["10.0.0.4", "10.0.0.2"]);
        assert!(nb.range_bans().is_empty());
        assert!(nb.punishments().is_empty());
        assert_eq!(nb.update(), 0);
    }

    #[test]
    fn test_lapsed_entry_not_reported_before_sweep() {
        let (mut nb, clock) = netban();
        let a = addr("10.0.0.1");
        nb.ban_addr(&a, mins(1), "short").unwrap();
        clock.advance(59);
        assert_eq!(
            nb.is_banned(&a).unwrap(),
            "You have been banned for 1 minute (short)"
        );
        clock.advance(1);
        assert!(nb.is_banned(&a).is_none());
    }

    #[test]
    fn test_ban_expiry_reads_clock_once() {
        let (mut nb, clock) = netban();
        let outcome = nb.ban_addr(&addr("10.0.0.1"), mins(3), "x").unwrap();
        let range_outcome = nb
            .ban_range(&range("1.2.3.0", "1.2.3.255"), mins(3), "y")
            .unwrap();
        assert_eq!(
            nb.addr_bans().get(outcome.id()).unwrap().info().expires,
            Expiry::At(NOW + 180)
        );
        assert_eq!(
            nb.range_bans().get(range_outcome.id()).unwrap().info().expires,
            Expiry::At(NOW + 180)
        );
        clock.advance(179);
        assert!(nb.is_banned(&addr("10.0.0.1")).is_some());
        clock.advance(1);
        assert!(nb.is_banned(&addr("10.0.0.1")).is_none());
    }

    #[test]
    fn test_describe_flavours() {
        let (mut nb, _) = netban();
        let outcome = nb.ban_addr(&addr("10.0.0.1"), mins(30), "reason").unwrap();
        let ban = nb.addr_bans().get(outcome.id()).unwrap();
        assert_eq!(
            nb.describe(ban, BanMessage::List),
            "'10.0.0.1' banned for 30 minutes (reason)"
        );
        assert_eq!(
            nb.describe(ban, BanMessage::Added),
            "banned '10.0.0.1' for 30 minutes (reason)"
        );
    }
}
