//! Multi-resolution hash index keys.
//!
//! Range bans differ in specificity, so a single whole-address hash cannot
//! find them. Ranges are partitioned into [`DIMENSIONS`] dimensions, one per
//! length of the leading-byte prefix shared by both bounds, each holding
//! [`BUCKETS`] buckets keyed by a hash of that prefix. A lookup probes one
//! bucket per possible prefix length of the incoming address.
//!
//! Plain addresses use dimension 0 with a hash over every address byte.

use crate::net::{NetAddr, NetRange};

/// Number of hash dimensions used by range pools.
pub const DIMENSIONS: usize = 16;

/// Buckets per dimension.
pub const BUCKETS: usize = 256;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Bucket key of a stored entry: which dimension, which bucket within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetHash {
    pub bucket: u8,
    pub dimension: u8,
}

impl NetHash {
    /// Key for a plain address: whole-address hash in dimension 0.
    pub fn of_addr(addr: &NetAddr) -> Self {
        Self {
            bucket: fold(fnv1a(FNV_OFFSET, addr.octets())),
            dimension: 0,
        }
    }

    /// Key for a range: its common-prefix length selects the dimension.
    pub fn of_range(range: &NetRange) -> Self {
        let shared = range.common_prefix_len();
        Self {
            bucket: fold(fnv1a(FNV_OFFSET, &range.lb().octets()[..shared])),
            dimension: shared as u8,
        }
    }

    /// Candidate range keys for `addr`, one per prefix length `0..len`.
    ///
    /// The hash is extended one byte at a time, so no buffer is allocated.
    pub fn candidates(addr: &NetAddr) -> impl Iterator<Item = NetHash> + '_ {
        addr.octets()
            .iter()
            .enumerate()
            .scan(FNV_OFFSET, |state, (prefix, &byte)| {
                let key = NetHash {
                    bucket: fold(*state),
                    dimension: prefix as u8,
                };
                *state = fnv1a(*state, &[byte]);
                Some(key)
            })
    }
}

#[inline]
fn fnv1a(mut hash: u32, bytes: &[u8]) -> u32 {
    for &b in bytes {
        hash ^= u32::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Xor-fold a 32-bit hash down to a bucket index.
#[inline]
fn fold(hash: u32) -> u8 {
    (hash ^ (hash >> 8) ^ (hash >> 16) ^ (hash >> 24)) as u8
}
