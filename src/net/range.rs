//! Inclusive address ranges and containment predicates.

use super::{Family, NetAddr};
use crate::error::BanError;
use ipnet::IpNet;
use std::cmp::Ordering;
use std::fmt;

/// An inclusive address range `[lb, ub]`.
///
/// Both bounds share a family and `lb < ub` under byte-wise comparison of
/// the address bytes. A single address is not a valid range. Bound ports are
/// cleared on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetRange {
    lb: NetAddr,
    ub: NetAddr,
}

impl NetRange {
    /// Create a range, rejecting mismatched families and non-ascending bounds.
    pub fn new(lb: NetAddr, ub: NetAddr) -> Result<Self, BanError> {
        let range = Self {
            lb: lb.host(),
            ub: ub.host(),
        };
        if range.is_valid() {
            Ok(range)
        } else {
            Err(BanError::InvalidRange)
        }
    }

    /// Range covering a CIDR network from its network to its broadcast address.
    ///
    /// A /32 (or /128) network is a single address and is rejected.
    pub fn from_cidr(net: IpNet) -> Result<Self, BanError> {
        Self::new(net.network().into(), net.broadcast().into())
    }

    #[inline]
    pub fn lb(&self) -> &NetAddr {
        &self.lb
    }

    #[inline]
    pub fn ub(&self) -> &NetAddr {
        &self.ub
    }

    #[inline]
    pub fn family(&self) -> Family {
        self.lb.family()
    }

    pub fn is_valid(&self) -> bool {
        self.lb.family() == self.ub.family() && self.lb.cmp_octets(&self.ub) == Ordering::Less
    }

    /// Number of leading address bytes shared by both bounds.
    pub fn common_prefix_len(&self) -> usize {
        self.lb
            .octets()
            .iter()
            .zip(self.ub.octets())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Partial containment test over `addr` bytes `[start, len)`.
    ///
    /// Bytes before `start` must equal the lower bound; the slice
    /// `[start, len)` must lie within the bounds' slices.
    pub fn contains_from(&self, addr: &NetAddr, start: usize, len: usize) -> bool {
        if self.lb.family() != addr.family() {
            return false;
        }
        let (lb, ub, ip) = (self.lb.octets(), self.ub.octets(), addr.octets());
        if start > len || len > ip.len() {
            return false;
        }
        (start == 0 || lb[..start] == ip[..start])
            && lb[start..len] <= ip[start..len]
            && ub[start..len] >= ip[start..len]
    }

    /// Whether `addr` lies inside this range (port ignored).
    #[inline]
    pub fn contains(&self, addr: &NetAddr) -> bool {
        self.contains_from(addr, 0, self.family().octet_len())
    }
}

impl fmt::Display for NetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.lb, self.ub)
    }
}
