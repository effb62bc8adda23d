pub mod constants;
pub mod elevator;
pub mod sched;
pub mod stdx;

#[cfg(test)]
pub(crate) mod test_utils;

pub use elevator::{Elevator, ElevatorType, Registry, RegistryError, SstfElevator};
pub use sched::{Options, Request, RequestId, Side, Sstf};
