//! Shortest-seek-time-first request ordering.
//!
//! Pending requests are split into two sorted sets around the head:
//!
//! ```text
//!            behind (descending)        ahead (ascending)
//!   0 ... [b2] [b1] [b0]      head      [a0] [a1] [a2] ... max
//!                     ^                  ^
//!                     nearest            nearest
//! ```
//!
//! Dispatch only has to compare the two nearest members (`b0`, `a0`) against the
//! head, so each decision is two comparisons plus a set removal.
//!
//! # Admission pivot
//!
//! Admission classifies a request against the *front of the ahead set* (or of the
//! behind set when ahead is empty), not against the head position. While both sets
//! are non-empty the behind front is never consulted. This can place a request in a
//! set that does not match its side of the head, in which case it is served later
//! than a true cursor-relative split would serve it. The rule is kept as is because
//! hosts tune against the resulting dispatch order.
//!
//! # Concurrency
//!
//! One [`Sstf`] per device. The host serializes every call, typically under its
//! device queue lock; no operation blocks or allocates beyond the set nodes.

use super::request::{HeadPosition, Membership, Request, RequestId, Side};
use crate::constants::{HEAD_POSITION_INITIAL, QUEUED_MAX, Sector, seek_distance};
use crate::stdx::sorted_queue::{Ascending, Descending, Slot, SortedQueue};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Construction options for one scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Sector seeks are measured from until the first dispatch.
    pub initial_head: Sector,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial_head: HEAD_POSITION_INITIAL,
        }
    }
}

/// Lifetime totals. `admitted - dispatched - withdrawn` is always the queue length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub admitted: u64,
    pub dispatched: u64,
    pub withdrawn: u64,
    /// Sum of sectors travelled between consecutive dispatches, saturating.
    pub seek_distance: u64,
}

impl Counters {
    #[inline]
    pub fn queued(&self) -> u64 {
        self.admitted - self.dispatched - self.withdrawn
    }
}

#[derive(Debug)]
pub struct Sstf {
    ahead: SortedQueue<Request, Ascending>,
    behind: SortedQueue<Request, Descending>,
    // Locates a queued request in its set for withdrawal and neighbour queries.
    index: HashMap<RequestId, (Side, Slot)>,
    head: HeadPosition,
    options: Options,
    counters: Counters,
}

impl Default for Sstf {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Sstf {
    pub fn new(options: Options) -> Self {
        let sched = Self {
            ahead: SortedQueue::init(),
            behind: SortedQueue::init(),
            index: HashMap::new(),
            head: HeadPosition::Unknown,
            options,
            counters: Counters::default(),
        };

        assert!(sched.is_empty());
        assert!(sched.head == HeadPosition::Unknown);

        sched
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn len(&self) -> u32 {
        let len = self.ahead.len() + self.behind.len();
        assert!(len as usize == self.index.len());
        len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        let empty = self.ahead.is_empty() && self.behind.is_empty();
        assert!(empty == self.index.is_empty());
        empty
    }

    #[inline]
    pub fn ahead_len(&self) -> u32 {
        self.ahead.len()
    }

    #[inline]
    pub fn behind_len(&self) -> u32 {
        self.behind.len()
    }

    #[inline]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    #[inline]
    pub fn head_position(&self) -> HeadPosition {
        self.head
    }

    /// Sector the next seek is measured from.
    #[inline]
    pub fn seek_origin(&self) -> Sector {
        self.head.or(self.options.initial_head)
    }

    #[inline]
    pub fn contains(&self, id: RequestId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn membership(&self, id: RequestId) -> Membership {
        match self.index.get(&id) {
            Some(&(side, _)) => Membership::Queued(side),
            None => Membership::Unqueued,
        }
    }

    /// Ahead set, nearest first (ascending start).
    pub fn ahead(&self) -> impl DoubleEndedIterator<Item = &Request> + ExactSizeIterator {
        self.ahead.iter()
    }

    /// Behind set, nearest first (descending start).
    pub fn behind(&self) -> impl DoubleEndedIterator<Item = &Request> + ExactSizeIterator {
        self.behind.iter()
    }

    /// Set a request starting at `start` would be admitted to.
    ///
    /// The pivot is the front of the ahead set whenever ahead is non-empty, and the
    /// front of the behind set otherwise; see the module docs.
    pub fn classify(&self, start: Sector) -> Side {
        match (self.ahead.front_sector(), self.behind.front_sector()) {
            (None, None) => Side::Ahead,
            (Some(pivot), _) => {
                if start > pivot {
                    Side::Ahead
                } else {
                    Side::Behind
                }
            }
            (None, Some(pivot)) => {
                if start < pivot {
                    Side::Behind
                } else {
                    Side::Ahead
                }
            }
        }
    }

    /// Queues `request` in sorted position. Requests with equal starts keep
    /// admission order.
    ///
    /// # Panics
    /// If a request with the same id is already queued, or the scheduler is full.
    pub fn admit(&mut self, request: Request) {
        let old_len = self.len();
        let id = request.id();

        assert!(
            !self.index.contains_key(&id),
            "admit: request already queued"
        );
        assert!(old_len < QUEUED_MAX, "admit: queue full");

        let side = self.classify(request.start());
        let slot = match side {
            Side::Ahead => self.ahead.insert(request.start(), request),
            Side::Behind => self.behind.insert(request.start(), request),
        };
        self.index.insert(id, (side, slot));
        self.counters.admitted += 1;

        debug!(
            target: "sstf",
            op = "add",
            sector = request.start(),
            %side,
            queued = old_len + 1,
            "request admitted"
        );

        assert!(self.len() == old_len + 1);
        assert!(self.membership(id) == Membership::Queued(side));
        assert!(self.counters.queued() == u64::from(self.len()));
    }

    /// Set the next dispatch would take from, without mutating.
    ///
    /// With both sets non-empty the nearer front wins, measured from the end
    /// sectors; a tie goes to the behind set.
    pub fn select(&self) -> Option<Side> {
        match (self.ahead.peek_front(), self.behind.peek_front()) {
            (None, None) => None,
            (Some(_), None) => Some(Side::Ahead),
            (None, Some(_)) => Some(Side::Behind),
            (Some((_, ahead)), Some((_, behind))) => {
                let origin = self.seek_origin();
                let delta_ahead = seek_distance(origin, ahead.end());
                let delta_behind = seek_distance(origin, behind.end());

                if delta_ahead < delta_behind {
                    Some(Side::Ahead)
                } else {
                    Some(Side::Behind)
                }
            }
        }
    }

    /// Request the next dispatch would return.
    pub fn peek(&self) -> Option<&Request> {
        match self.select()? {
            Side::Ahead => self.ahead.peek_front().map(|(_, rq)| rq),
            Side::Behind => self.behind.peek_front().map(|(_, rq)| rq),
        }
    }

    /// Removes and returns the queued request nearest the head, moving the head
    /// to its end sector. `None` when nothing is queued.
    ///
    /// `force` is the host's signal that the device is idle. The policy never
    /// idles with work queued, so it does not change the outcome.
    pub fn dispatch(&mut self, force: bool) -> Option<Request> {
        let old_len = self.len();

        let Some(side) = self.select() else {
            trace!(target: "sstf", force, "nothing to dispatch");
            return None;
        };

        let (slot, request) = match side {
            Side::Ahead => self.ahead.pop_front(),
            Side::Behind => self.behind.pop_front(),
        }?;

        let indexed = self.index.remove(&request.id());
        assert!(
            indexed == Some((side, slot)),
            "dispatch: index out of sync with {side} set"
        );

        let origin = self.seek_origin();
        self.counters.seek_distance = self
            .counters
            .seek_distance
            .saturating_add(seek_distance(origin, request.end()));
        self.counters.dispatched += 1;
        self.head = HeadPosition::At(request.end());

        debug!(
            target: "sstf",
            op = "dsp",
            sector = request.start(),
            %side,
            head = request.end(),
            force,
            "request dispatched"
        );

        assert!(self.len() == old_len - 1);
        assert!(!self.contains(request.id()));
        assert!(self.head == HeadPosition::At(request.end()));
        assert!(self.counters.queued() == u64::from(self.len()));

        Some(request)
    }

    /// Drops `merged` without dispatching it, after the host coalesced its range
    /// into `kept`. `kept` is not touched; it already carries the combined range.
    ///
    /// # Panics
    /// If `merged` is not queued, or both ids are the same.
    pub fn withdraw(&mut self, kept: RequestId, merged: RequestId) -> Request {
        let old_len = self.len();

        assert!(kept != merged, "withdraw: request merged into itself");

        let Some((side, slot)) = self.index.remove(&merged) else {
            panic!("withdraw: request not queued");
        };
        let request = match side {
            Side::Ahead => self.ahead.remove(slot),
            Side::Behind => self.behind.remove(slot),
        };
        assert!(request.id() == merged);

        self.counters.withdrawn += 1;

        trace!(
            target: "sstf",
            op = "merge",
            sector = request.start(),
            %side,
            %kept,
            %merged,
            "request withdrawn"
        );

        assert!(self.len() == old_len - 1);
        assert!(!self.contains(merged));
        assert!(self.counters.queued() == u64::from(self.len()));

        request
    }

    /// Request queued immediately before `id` in its set, or `None` at the front.
    ///
    /// # Panics
    /// If `id` is not queued.
    pub fn former(&self, id: RequestId) -> Option<Request> {
        let Some(&(side, slot)) = self.index.get(&id) else {
            panic!("former: request not queued");
        };

        match side {
            Side::Ahead => self.ahead.prev(slot).copied(),
            Side::Behind => self.behind.prev(slot).copied(),
        }
    }

    /// Request queued immediately after `id` in its set, or `None` at the back.
    ///
    /// # Panics
    /// If `id` is not queued.
    pub fn latter(&self, id: RequestId) -> Option<Request> {
        let Some(&(side, slot)) = self.index.get(&id) else {
            panic!("latter: request not queued");
        };

        match side {
            Side::Ahead => self.ahead.next(slot).copied(),
            Side::Behind => self.behind.next(slot).copied(),
        }
    }

    /// Full structural check: set order, partition, index, conservation. O(n).
    pub fn check_invariants(&self) {
        self.ahead.check_invariants();
        self.behind.check_invariants();

        let len = self.ahead.len() as usize + self.behind.len() as usize;
        assert!(len == self.index.len(), "index size differs from set sizes");
        assert!(
            self.counters.queued() == len as u64,
            "admitted - dispatched - withdrawn != queued"
        );

        for (slot, request) in self.ahead.slots().zip(self.ahead.iter()) {
            assert!(slot.sector() == request.start());
            assert!(
                self.index.get(&request.id()) == Some(&(Side::Ahead, slot)),
                "ahead member missing from index"
            );
        }
        for (slot, request) in self.behind.slots().zip(self.behind.iter()) {
            assert!(slot.sector() == request.start());
            assert!(
                self.index.get(&request.id()) == Some(&(Side::Behind, slot)),
                "behind member missing from index"
            );
        }
    }
}
