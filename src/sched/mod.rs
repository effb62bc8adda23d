pub mod request;
pub mod sstf;

pub use request::{HeadPosition, Membership, Request, RequestId, Side};
pub use sstf::{Counters, Options, Sstf};
