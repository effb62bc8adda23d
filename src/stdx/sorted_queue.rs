//! Index-stable ordered queue keyed by sector address.
//!
//! Entries are ordered by sector in the direction chosen by the `D` tag type, with
//! ties broken by insertion order. Each insertion returns a [`Slot`] that stays valid
//! until the entry leaves the queue, so callers can remove an entry or look up its
//! neighbours without scanning.
//!
//! # Design
//!
//! A linked list gives O(1) unlink but O(n) sorted insertion and needs pinned nodes.
//! Keying a `BTreeMap` by `(sector, arrival)` gives O(log n) for insertion, removal
//! and neighbour lookup while values stay plain owned data.
//!
//! # Example
//!
//! ```
//! use sstf::stdx::sorted_queue::{Ascending, Descending, SortedQueue};
//!
//! let mut up: SortedQueue<&str, Ascending> = SortedQueue::init();
//! let mut down: SortedQueue<&str, Descending> = SortedQueue::init();
//!
//! up.insert(30, "c");
//! up.insert(10, "a");
//! down.insert(10, "a");
//! down.insert(30, "c");
//!
//! assert_eq!(up.peek_front().map(|(_, v)| *v), Some("a"));
//! assert_eq!(down.peek_front().map(|(_, v)| *v), Some("c"));
//! ```

use crate::constants::{QUEUED_MAX, Sector};
use core::cmp::Reverse;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Bound::{Excluded, Unbounded};
use std::collections::BTreeMap;

/// Sort direction of a [`SortedQueue`].
pub trait Direction {
    type Key: Ord + Copy + fmt::Debug;

    const NAME: &'static str;

    fn key(sector: Sector) -> Self::Key;

    fn sector(key: Self::Key) -> Sector;

    /// True if `a` sorts strictly before `b` in this direction.
    #[inline]
    fn precedes(a: Sector, b: Sector) -> bool {
        Self::key(a) < Self::key(b)
    }
}

/// Nearest entry is the lowest sector.
#[derive(Debug)]
pub enum Ascending {}

/// Nearest entry is the highest sector.
#[derive(Debug)]
pub enum Descending {}

impl Direction for Ascending {
    type Key = Sector;

    const NAME: &'static str = "ascending";

    #[inline]
    fn key(sector: Sector) -> Sector {
        sector
    }

    #[inline]
    fn sector(key: Sector) -> Sector {
        key
    }
}

impl Direction for Descending {
    type Key = Reverse<Sector>;

    const NAME: &'static str = "descending";

    #[inline]
    fn key(sector: Sector) -> Reverse<Sector> {
        Reverse(sector)
    }

    #[inline]
    fn sector(key: Reverse<Sector>) -> Sector {
        key.0
    }
}

/// Stable handle to an entry of a [`SortedQueue`].
///
/// Sector and arrival number together are unique within one queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    sector: Sector,
    arrival: u64,
}

impl Slot {
    #[inline]
    pub fn sector(&self) -> Sector {
        self.sector
    }

    #[inline]
    pub fn arrival(&self) -> u64 {
        self.arrival
    }
}

/// Ordered queue of `T` keyed by sector, nearest entry first.
///
/// Uses `u32` length for cross-platform consistency.
pub struct SortedQueue<T, D: Direction> {
    entries: BTreeMap<(D::Key, u64), T>,
    // Next arrival number. Monotonic for the lifetime of the queue.
    arrivals: u64,
    _direction: PhantomData<D>,
}

impl<T: fmt::Debug, D: Direction> fmt::Debug for SortedQueue<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedQueue")
            .field("direction", &D::NAME)
            .field("len", &self.entries.len())
            .field("arrivals", &self.arrivals)
            .finish()
    }
}

impl<T, D: Direction> Default for SortedQueue<T, D> {
    fn default() -> Self {
        Self::init()
    }
}

impl<T, D: Direction> SortedQueue<T, D> {
    pub const fn init() -> Self {
        Self {
            entries: BTreeMap::new(),
            arrivals: 0,
            _direction: PhantomData,
        }
    }

    #[inline]
    fn entry_key(slot: Slot) -> (D::Key, u64) {
        (D::key(slot.sector), slot.arrival)
    }

    #[inline]
    fn slot_of(key: &(D::Key, u64)) -> Slot {
        Slot {
            sector: D::sector(key.0),
            arrival: key.1,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> u32 {
        let len = self.entries.len();
        assert!(len <= QUEUED_MAX as usize);
        len as u32
    }

    /// Sector of the nearest entry.
    #[inline]
    pub fn front_sector(&self) -> Option<Sector> {
        self.entries.first_key_value().map(|(key, _)| D::sector(key.0))
    }

    #[inline]
    pub fn peek_front(&self) -> Option<(Slot, &T)> {
        self.entries
            .first_key_value()
            .map(|(key, value)| (Self::slot_of(key), value))
    }

    #[inline]
    pub fn peek_back(&self) -> Option<(Slot, &T)> {
        self.entries
            .last_key_value()
            .map(|(key, value)| (Self::slot_of(key), value))
    }

    /// Inserts `value` at `sector`, after every entry with an equal sector.
    ///
    /// # Panics
    /// If the queue is full.
    pub fn insert(&mut self, sector: Sector, value: T) -> Slot {
        let old_len = self.len();

        assert!(old_len < QUEUED_MAX, "sorted queue length overflow");
        assert!(self.arrivals < u64::MAX, "sorted queue arrival overflow");

        let slot = Slot {
            sector,
            arrival: self.arrivals,
        };
        self.arrivals += 1;

        let displaced = self.entries.insert(Self::entry_key(slot), value);
        assert!(displaced.is_none(), "insert: slot already occupied");

        assert!(self.len() == old_len + 1);
        assert!(self.contains(slot));

        slot
    }

    pub fn pop_front(&mut self) -> Option<(Slot, T)> {
        let old_len = self.len();

        let (key, value) = self.entries.pop_first()?;
        let slot = Self::slot_of(&key);

        assert!(old_len > 0, "underflow in pop_front");
        assert!(self.len() == old_len - 1);
        assert!(!self.contains(slot));

        Some((slot, value))
    }

    /// # Panics
    /// If `slot` is not in the queue.
    pub fn remove(&mut self, slot: Slot) -> T {
        let old_len = self.len();

        assert!(old_len > 0, "remove from empty queue");

        let Some(value) = self.entries.remove(&Self::entry_key(slot)) else {
            panic!("remove: slot not queued");
        };

        assert!(self.len() == old_len - 1);
        assert!(!self.contains(slot));

        value
    }

    #[inline]
    pub fn contains(&self, slot: Slot) -> bool {
        self.entries.contains_key(&Self::entry_key(slot))
    }

    #[inline]
    pub fn get(&self, slot: Slot) -> Option<&T> {
        self.entries.get(&Self::entry_key(slot))
    }

    /// Entry immediately before `slot` in queue order, or `None` at the front.
    ///
    /// # Panics
    /// If `slot` is not in the queue.
    pub fn prev(&self, slot: Slot) -> Option<&T> {
        let key = Self::entry_key(slot);
        assert!(self.entries.contains_key(&key), "prev: slot not queued");

        self.entries.range(..key).next_back().map(|(_, value)| value)
    }

    /// Entry immediately after `slot` in queue order, or `None` at the back.
    ///
    /// # Panics
    /// If `slot` is not in the queue.
    pub fn next(&self, slot: Slot) -> Option<&T> {
        let key = Self::entry_key(slot);
        assert!(self.entries.contains_key(&key), "next: slot not queued");

        self.entries
            .range((Excluded(key), Unbounded))
            .next()
            .map(|(_, value)| value)
    }

    /// Entries in queue order, nearest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.values()
    }

    /// Slots in queue order, nearest first.
    pub fn slots(&self) -> impl DoubleEndedIterator<Item = Slot> + ExactSizeIterator {
        self.entries.keys().map(Self::slot_of)
    }

    /// Verifies ordering and arrival bookkeeping. O(n).
    pub fn check_invariants(&self) {
        assert!(self.entries.len() <= QUEUED_MAX as usize);
        assert!(
            self.entries.len() as u64 <= self.arrivals,
            "more entries than arrivals"
        );

        let mut last: Option<Slot> = None;
        for slot in self.slots() {
            assert!(slot.arrival < self.arrivals, "arrival from the future");

            if let Some(prev) = last {
                assert!(
                    !D::precedes(slot.sector, prev.sector),
                    "entries out of {} order",
                    D::NAME
                );
                if prev.sector == slot.sector {
                    assert!(prev.arrival < slot.arrival, "equal sectors out of arrival order");
                }
            }
            last = Some(slot);
        }
    }
}
