//! Prometheus metrics collection for netban.
//!
//! - `netban_checks_total{result}` - connection checks by verdict
//! - `netban_bans_added_total{pool}` - entries created per pool
//! - `netban_bans_expired_total{pool}` - entries removed by the sweep
//! - `netban_active_bans{pool}` - current entries per pool (gauge)

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Connection checks by result (allowed/denied).
pub static CHECKS: OnceLock<IntCounterVec> = OnceLock::new();

/// Entries created, by pool.
pub static BANS_ADDED: OnceLock<IntCounterVec> = OnceLock::new();

/// Entries removed by the expiry sweep, by pool.
pub static BANS_EXPIRED: OnceLock<IntCounterVec> = OnceLock::new();

/// Current entries, by pool.
pub static ACTIVE_BANS: OnceLock<IntGaugeVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Recording before `init` is a no-op. Calling it twice leaves the first
/// registration in place.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(CHECKS, IntCounterVec::new(Opts::new("netban_checks_total", "Connection ban checks by result"), &["result"]));
    register!(BANS_ADDED, IntCounterVec::new(Opts::new("netban_bans_added_total", "Ban entries created"), &["pool"]));
    register!(BANS_EXPIRED, IntCounterVec::new(Opts::new("netban_bans_expired_total", "Ban entries expired by the sweep"), &["pool"]));
    register!(ACTIVE_BANS, IntGaugeVec::new(Opts::new("netban_active_bans", "Current ban entries"), &["pool"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for ban metric updates
// ============================================================================

/// Record the verdict of a connection check.
#[inline]
pub fn record_check(denied: bool) {
    if let Some(c) = CHECKS.get() {
        c.with_label_values(&[if denied { "denied" } else { "allowed" }])
            .inc();
    }
}

#[inline]
pub fn record_ban_added(pool: &str) {
    if let Some(c) = BANS_ADDED.get() {
        c.with_label_values(&[pool]).inc();
    }
}

#[inline]
pub fn record_bans_expired(pool: &str, count: usize) {
    if let Some(c) = BANS_EXPIRED.get() {
        c.with_label_values(&[pool]).inc_by(count as u64);
    }
}

#[inline]
pub fn set_active_bans(pool: &str, count: usize) {
    if let Some(g) = ACTIVE_BANS.get() {
        g.with_label_values(&[pool]).set(count as i64);
    }
}
