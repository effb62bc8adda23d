//! Request descriptors handed between the host and the scheduler.
//!
//! The host owns the I/O itself (buffers, completion state). The scheduler only
//! keeps these small `Copy` descriptors, keyed by [`RequestId`], while a request
//! waits for dispatch.

use crate::constants::Sector;
use core::fmt;

/// Host-assigned request handle. Unique among the requests queued in one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rq#{}", self.0)
    }
}

/// Sector range of one pending I/O. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Request {
    id: RequestId,
    start: Sector,
    end: Sector,
}

impl Request {
    /// # Panics
    /// If `start > end`.
    pub fn new(id: RequestId, start: Sector, end: Sector) -> Self {
        assert!(start <= end, "request: start {start} past end {end}");

        Self { id, start, end }
    }

    /// Request covering `sectors` sectors from `start`. The end address is the
    /// first sector after the transfer, where the head rests once it completes.
    ///
    /// # Panics
    /// On sector address overflow.
    pub fn from_len(id: RequestId, start: Sector, sectors: u64) -> Self {
        let Some(end) = start.checked_add(sectors) else {
            panic!("request: sector range overflow");
        };

        Self::new(id, start, end)
    }

    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    #[inline]
    pub fn start(&self) -> Sector {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Sector {
        self.end
    }

    #[inline]
    pub fn sectors(&self) -> u64 {
        self.end - self.start
    }
}

/// Which ordered set holds a queued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Beyond the head, served in ascending sector order.
    Ahead,
    /// At or behind the head, served in descending sector order.
    Behind,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Ahead => "ahead",
            Side::Behind => "behind",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Unqueued,
    Queued(Side),
}

impl Membership {
    #[inline]
    pub fn is_queued(&self) -> bool {
        matches!(self, Membership::Queued(_))
    }
}

/// Estimated position of the device head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeadPosition {
    /// Nothing dispatched yet.
    #[default]
    Unknown,
    /// End sector of the last dispatched request.
    At(Sector),
}

impl HeadPosition {
    /// Sector seeks are measured from; `initial` while the position is unknown.
    #[inline]
    pub fn or(self, initial: Sector) -> Sector {
        match self {
            HeadPosition::Unknown => initial,
            HeadPosition::At(sector) => sector,
        }
    }
}
