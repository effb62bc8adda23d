//! Device geometry and scheduler constants.
//!
//! # Design Decisions
//!
//! Queue depths use `u32` instead of `usize` for portability, matching the
//! length convention of the containers in [`crate::stdx`].
//!
//! All invariants verified at compile time via `const` assertions.

// =============================================================================
// Platform verification
// =============================================================================

// Compile-time proof that u32 -> usize is safe on this platform.
const _: () = assert!(
    size_of::<usize>() >= size_of::<u32>(),
    "Platform must have at least 32-bit addressing"
);

// =============================================================================
// Geometry
// =============================================================================

/// Sector address. One-dimensional coordinate used for every seek comparison.
pub type Sector = u64;

/// Bytes per sector as counted by the host block layer, independent of the
/// device's physical block size.
pub const SECTOR_SIZE: u32 = 512;

/// Head position assumed before the first dispatch. The device reports no
/// position at attach time, so seeks are measured from the start of the disk.
pub const HEAD_POSITION_INITIAL: Sector = 0;

// =============================================================================
// Scheduler limits
// =============================================================================

/// Maximum number of requests queued in one scheduler (ahead + behind).
pub const QUEUED_MAX: u32 = u32::MAX;

/// Name under which the SSTF policy registers with the host.
pub const ELEVATOR_NAME: &str = "sstf";

/// Maximum length of a policy name accepted by the registry.
pub const ELEVATOR_NAME_MAX: usize = 16;

// =============================================================================
// Compile-time design integrity assertions
// =============================================================================

const _: () = assert!(SECTOR_SIZE > 0);
const _: () = assert!(
    SECTOR_SIZE.is_power_of_two(),
    "Sector size must be power of two for alignment arithmetic"
);
const _: () = assert!(SECTOR_SIZE >= 512, "Block layer sectors are at least 512 bytes");

const _: () = assert!(QUEUED_MAX > 0);
const _: () = assert!(QUEUED_MAX as u64 <= usize::MAX as u64);

const _: () = assert!(!ELEVATOR_NAME.is_empty());
const _: () = assert!(
    ELEVATOR_NAME.len() <= ELEVATOR_NAME_MAX,
    "Builtin policy name must fit the registry limit"
);

// =============================================================================
// Helper functions
// =============================================================================

/// Converts a byte offset to the sector containing it.
///
/// # Examples
/// ```
/// # use sstf::constants::*;
/// assert_eq!(sector_of(0), 0);
/// assert_eq!(sector_of(511), 0);
/// assert_eq!(sector_of(512), 1);
/// ```
#[inline]
pub const fn sector_of(offset: u64) -> Sector {
    offset / SECTOR_SIZE as u64
}

/// Number of sectors spanned by `len` bytes, rounded up.
///
/// # Panics
/// Panics on overflow.
///
/// # Examples
/// ```
/// # use sstf::constants::*;
/// assert_eq!(sectors_ceil(0), 0);
/// assert_eq!(sectors_ceil(1), 1);
/// assert_eq!(sectors_ceil(SECTOR_SIZE as u64), 1);
/// assert_eq!(sectors_ceil(SECTOR_SIZE as u64 + 1), 2);
/// ```
#[inline]
pub const fn sectors_ceil(len: u64) -> u64 {
    let mask = SECTOR_SIZE as u64 - 1;

    assert!(len <= u64::MAX - mask, "sectors_ceil overflow");

    (len + mask) / SECTOR_SIZE as u64
}

/// Absolute seek distance between two sector addresses.
#[inline]
pub const fn seek_distance(from: Sector, to: Sector) -> u64 {
    from.abs_diff(to)
}
