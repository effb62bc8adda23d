pub mod sorted_queue;

pub use sorted_queue::{Ascending, Descending, Direction, Slot, SortedQueue};
