//! Ban metadata: expiry and bounded reason text.

use std::fmt;
use std::time::Duration;

/// Maximum stored reason length in bytes.
pub const REASON_MAX_LEN: usize = 63;

/// When a ban lapses.
///
/// Ordering places every timestamp before [`Expiry::Never`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expiry {
    /// Unix timestamp (seconds).
    At(i64),
    /// Permanent ban.
    Never,
}

impl Expiry {
    /// Expiry for a ban of `duration` starting at `now`; `None` is permanent.
    pub fn after(now: i64, duration: Option<Duration>) -> Self {
        match duration {
            Some(d) => {
                let secs = i64::try_from(d.as_secs()).unwrap_or(i64::MAX);
                Expiry::At(now.saturating_add(secs))
            }
            None => Expiry::Never,
        }
    }

    #[inline]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Expiry::Never)
    }

    /// Whether the expiry is numeric and no later than `now`.
    #[inline]
    pub fn has_passed(&self, now: i64) -> bool {
        matches!(*self, Expiry::At(t) if t <= now)
    }

    /// Remaining time rounded up to whole minutes, `None` when permanent.
    pub fn remaining_minutes(&self, now: i64) -> Option<i64> {
        match *self {
            Expiry::At(t) => Some(t.saturating_sub(now).saturating_add(59).div_euclid(60)),
            Expiry::Never => None,
        }
    }
}

/// Ban reason text stored inline, at most [`REASON_MAX_LEN`] bytes.
///
/// Longer input is silently truncated at the last character boundary that
/// fits; construction never fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BanReason {
    buf: [u8; REASON_MAX_LEN],
    len: u8,
}

impl BanReason {
    pub fn new(text: &str) -> Self {
        let mut end = text.len().min(REASON_MAX_LEN);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; REASON_MAX_LEN];
        buf[..end].copy_from_slice(&text.as_bytes()[..end]);
        Self {
            buf,
            len: end as u8,
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.buf[..usize::from(self.len)]).unwrap_or_default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for BanReason {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for BanReason {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl fmt::Display for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for BanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// Expiry and reason attached to every pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanInfo {
    pub expires: Expiry,
    pub reason: BanReason,
}

impl BanInfo {
    pub fn new(expires: Expiry, reason: &str) -> Self {
        Self {
            expires,
            reason: BanReason::new(reason),
        }
    }
}
