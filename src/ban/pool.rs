//! Fixed-capacity ban entry pool.
//!
//! # Architecture
//!
//! Entries live in an arena of [`MAX_BANS`] slots allocated once. Each slot
//! carries three intrusive links expressed as slot indices:
//!
//! - **hash chain**: doubly linked, one chain per [`NetHash`] bucket
//! - **used list**: doubly linked, sorted ascending by expiry, `Never` last,
//!   most recently inserted/updated first among equal expiries
//! - **free list**: singly linked through the used-list `next` field
//!
//! Occupied slots are in exactly one hash chain and the used list; free
//! slots are in the free list only. Handles ([`BanId`]) carry the slot
//! generation, so a handle to a removed entry never aliases a later
//! occupant of the same slot.

use super::hash::{BUCKETS, NetHash};
use super::info::{BanInfo, Expiry};
use crate::error::BanError;
use crate::net::{NetAddr, NetRange};
use std::fmt;

/// Slot count of every pool.
pub const MAX_BANS: usize = 1024;

type SlotIndex = u16;

/// Payload stored in a pool: an address or a range.
pub trait BanData: Clone + PartialEq + fmt::Debug {
    /// Bucket key this payload is stored under.
    fn net_hash(&self) -> NetHash;

    /// Single-quoted rendering used in ban messages.
    fn quoted(&self) -> String;
}

impl BanData for NetAddr {
    fn net_hash(&self) -> NetHash {
        NetHash::of_addr(self)
    }

    fn quoted(&self) -> String {
        format!("'{}'", self)
    }
}

impl BanData for NetRange {
    fn net_hash(&self) -> NetHash {
        NetHash::of_range(self)
    }

    fn quoted(&self) -> String {
        format!("'{}' - '{}'", self.lb(), self.ub())
    }
}

/// Validated handle to an occupied pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BanId {
    index: SlotIndex,
    generation: u32,
}

/// A stored ban: payload, metadata and its precomputed bucket key.
#[derive(Debug, Clone, PartialEq)]
pub struct Ban<T> {
    data: T,
    info: BanInfo,
    hash: NetHash,
}

impl<T> Ban<T> {
    #[inline]
    pub fn data(&self) -> &T {
        &self.data
    }

    #[inline]
    pub fn info(&self) -> &BanInfo {
        &self.info
    }

    #[inline]
    pub fn hash(&self) -> NetHash {
        self.hash
    }
}

#[derive(Debug)]
struct Slot<T> {
    ban: Option<Ban<T>>,
    generation: u32,
    hash_prev: Option<SlotIndex>,
    hash_next: Option<SlotIndex>,
    prev: Option<SlotIndex>,
    next: Option<SlotIndex>,
}

/// Arena of ban entries with `D` hash dimensions of [`BUCKETS`] buckets.
pub struct BanPool<T, const D: usize> {
    slots: Vec<Slot<T>>,
    buckets: Box<[[Option<SlotIndex>; BUCKETS]; D]>,
    first_free: Option<SlotIndex>,
    first_used: Option<SlotIndex>,
    len: usize,
}

impl<T: BanData, const D: usize> BanPool<T, D> {
    /// Create an empty pool with every slot on the free list.
    pub fn new() -> Self {
        let slots = (0..MAX_BANS)
            .map(|_| Slot {
                ban: None,
                generation: 0,
                hash_prev: None,
                hash_next: None,
                prev: None,
                next: None,
            })
            .collect();
        let mut pool = Self {
            slots,
            buckets: Box::new([[None; BUCKETS]; D]),
            first_free: None,
            first_used: None,
            len: 0,
        };
        pool.reset();
        pool
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Store a new entry, linking it into its hash chain and the used list.
    pub fn add(&mut self, data: T, info: BanInfo, hash: NetHash) -> Result<BanId, BanError> {
        let index = self.first_free.ok_or(BanError::PoolFull)?;
        let i = usize::from(index);
        self.first_free = self.slots[i].next;

        let head = *self.head(hash);
        let slot = &mut self.slots[i];
        slot.ban = Some(Ban { data, info, hash });
        slot.hash_prev = None;
        slot.hash_next = head;
        if let Some(h) = head {
            self.slots[usize::from(h)].hash_prev = Some(index);
        }
        *self.head_mut(hash) = Some(index);

        self.link_sorted(index, info.expires);
        self.len += 1;
        Ok(self.id_of(index))
    }

    /// Remove an entry and return its slot to the free list.
    ///
    /// Returns `None` for a stale handle.
    pub fn remove(&mut self, id: BanId) -> Option<Ban<T>> {
        let index = self.resolve(id)?;
        self.unlink_hash(index);
        self.unlink_used(index);

        let slot = &mut self.slots[usize::from(index)];
        let ban = slot.ban.take();
        slot.generation = slot.generation.wrapping_add(1);
        slot.hash_prev = None;
        slot.hash_next = None;
        slot.prev = None;
        slot.next = self.first_free;
        self.first_free = Some(index);
        self.len -= 1;
        ban
    }

    /// Replace an entry's metadata and restore the used-list order.
    ///
    /// The payload and hash chain are untouched. Returns `false` for a
    /// stale handle.
    pub fn update(&mut self, id: BanId, info: BanInfo) -> bool {
        let Some(index) = self.resolve(id) else {
            return false;
        };
        if let Some(ban) = self.slots[usize::from(index)].ban.as_mut() {
            ban.info = info;
        }
        self.unlink_used(index);
        self.link_sorted(index, info.expires);
        true
    }

    /// Drop every entry and rebuild the free list over the full capacity.
    ///
    /// Outstanding handles become stale.
    pub fn reset(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.ban.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.hash_prev = None;
            slot.hash_next = None;
            slot.prev = None;
            slot.next = (i + 1 < MAX_BANS).then(|| (i + 1) as SlotIndex);
        }
        for dimension in self.buckets.iter_mut() {
            dimension.fill(None);
        }
        self.first_free = Some(0);
        self.first_used = None;
        self.len = 0;
    }

    /// Remove every entry at the head of the used list whose expiry is
    /// numeric and no later than `now`, stopping at the first live entry.
    ///
    /// `on_expired` sees each removed entry. Returns the removal count.
    pub fn remove_expired(&mut self, now: i64, mut on_expired: impl FnMut(&Ban<T>)) -> usize {
        let mut removed = 0;
        while let Some(index) = self.first_used {
            let expired = self.slots[usize::from(index)]
                .ban
                .as_ref()
                .is_some_and(|ban| ban.info.expires.has_passed(now));
            if !expired {
                break;
            }
            match self.remove(self.id_of(index)) {
                Some(ban) => {
                    on_expired(&ban);
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }

    // ========================================================================
    // Read-only access
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == MAX_BANS
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        MAX_BANS
    }

    pub fn get(&self, id: BanId) -> Option<&Ban<T>> {
        let index = self.resolve(id)?;
        self.slots[usize::from(index)].ban.as_ref()
    }

    /// Entry with the earliest expiry.
    pub fn first(&self) -> Option<BanId> {
        self.first_used.map(|index| self.id_of(index))
    }

    /// Entry following `id` in expiry order.
    pub fn next(&self, id: BanId) -> Option<BanId> {
        let index = self.resolve(id)?;
        self.slots[usize::from(index)]
            .next
            .map(|next| self.id_of(next))
    }

    /// Entry at position `ordinal` of the expiry-ordered list.
    ///
    /// Positions follow the current sort order and shift as entries are
    /// added, updated or removed. Out of range yields `None`.
    pub fn nth(&self, ordinal: usize) -> Option<BanId> {
        if ordinal >= self.len {
            return None;
        }
        self.iter().nth(ordinal).map(|(id, _)| id)
    }

    /// Entry holding `data`, searching only the chain for `hash`.
    pub fn find(&self, data: &T, hash: NetHash) -> Option<BanId> {
        self.bucket(hash)
            .find(|(_, ban)| ban.data == *data)
            .map(|(id, _)| id)
    }

    /// Entries in expiry order.
    pub fn iter(&self) -> Iter<'_, T, D> {
        Iter {
            pool: self,
            cursor: self.first_used,
        }
    }

    /// Entries chained under `hash`, most recently added first.
    pub fn bucket(&self, hash: NetHash) -> Bucket<'_, T, D> {
        Bucket {
            pool: self,
            cursor: *self.head(hash),
        }
    }

    // ========================================================================
    // Link maintenance
    // ========================================================================

    fn id_of(&self, index: SlotIndex) -> BanId {
        BanId {
            index,
            generation: self.slots[usize::from(index)].generation,
        }
    }

    fn resolve(&self, id: BanId) -> Option<SlotIndex> {
        let slot = self.slots.get(usize::from(id.index))?;
        (slot.generation == id.generation && slot.ban.is_some()).then_some(id.index)
    }

    fn head(&self, hash: NetHash) -> &Option<SlotIndex> {
        let dimension = usize::from(hash.dimension).min(D - 1);
        &self.buckets[dimension][usize::from(hash.bucket)]
    }

    fn head_mut(&mut self, hash: NetHash) -> &mut Option<SlotIndex> {
        let dimension = usize::from(hash.dimension).min(D - 1);
        &mut self.buckets[dimension][usize::from(hash.bucket)]
    }

    fn expires_at(&self, index: SlotIndex) -> Expiry {
        self.slots[usize::from(index)]
            .ban
            .as_ref()
            .map_or(Expiry::Never, |ban| ban.info.expires)
    }

    /// Insert before the first entry whose expiry is not earlier.
    fn link_sorted(&mut self, index: SlotIndex, expires: Expiry) {
        let mut prev = None;
        let mut cursor = self.first_used;
        while let Some(c) = cursor {
            if expires <= self.expires_at(c) {
                break;
            }
            prev = cursor;
            cursor = self.slots[usize::from(c)].next;
        }

        let slot = &mut self.slots[usize::from(index)];
        slot.prev = prev;
        slot.next = cursor;
        match prev {
            Some(p) => self.slots[usize::from(p)].next = Some(index),
            None => self.first_used = Some(index),
        }
        if let Some(c) = cursor {
            self.slots[usize::from(c)].prev = Some(index);
        }
    }

    fn unlink_used(&mut self, index: SlotIndex) {
        let slot = &self.slots[usize::from(index)];
        let (prev, next) = (slot.prev, slot.next);
        match prev {
            Some(p) => self.slots[usize::from(p)].next = next,
            None => self.first_used = next,
        }
        if let Some(n) = next {
            self.slots[usize::from(n)].prev = prev;
        }
    }

    fn unlink_hash(&mut self, index: SlotIndex) {
        let slot = &self.slots[usize::from(index)];
        let (prev, next) = (slot.hash_prev, slot.hash_next);
        let Some(hash) = slot.ban.as_ref().map(|ban| ban.hash) else {
            return;
        };
        match prev {
            Some(p) => self.slots[usize::from(p)].hash_next = next,
            None => *self.head_mut(hash) = next,
        }
        if let Some(n) = next {
            self.slots[usize::from(n)].hash_prev = prev;
        }
    }
}

impl<T: BanData, const D: usize> Default for BanPool<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const D: usize> fmt::Debug for BanPool<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BanPool")
            .field("len", &self.len)
            .field("capacity", &MAX_BANS)
            .field("dimensions", &D)
            .finish()
    }
}

/// Iterator over a pool in expiry order.
pub struct Iter<'a, T, const D: usize> {
    pool: &'a BanPool<T, D>,
    cursor: Option<SlotIndex>,
}

impl<'a, T: BanData, const D: usize> Iterator for Iter<'a, T, D> {
    type Item = (BanId, &'a Ban<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.pool.slots[usize::from(index)];
        self.cursor = slot.next;
        let id = BanId {
            index,
            generation: slot.generation,
        };
        slot.ban.as_ref().map(|ban| (id, ban))
    }
}

/// Iterator over one hash chain.
pub struct Bucket<'a, T, const D: usize> {
    pool: &'a BanPool<T, D>,
    cursor: Option<SlotIndex>,
}

impl<'a, T: BanData, const D: usize> Iterator for Bucket<'a, T, D> {
    type Item = (BanId, &'a Ban<T>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = &self.pool.slots[usize::from(index)];
        self.cursor = slot.hash_next;
        let id = BanId {
            index,
            generation: slot.generation,
        };
        slot.ban.as_ref().map(|ban| (id, ban))
    }
}
