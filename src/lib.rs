//! Lock-free single-producer single-consumer queue of `i16` values.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

extern crate crossbeam_epoch;
extern crate crossbeam_utils;

#[macro_use]
mod utils;
pub mod channel;
mod msqueue;
pub mod reclaim;


/// Queue trait shared by every reclamation strategy of [`MSQueue`].
pub trait Queue<T> {
    /// Create a new, empty queue.
    fn new() -> Self;

    /// Adds `t` to the back of the queue.
    fn push(&self, t: T);

    /// Attempts to dequeue from the front.
    /// Returns `None` if the queue is observed to be empty.
    fn pop(&self) -> Option<T>;

    /// Check queue is empty or not.
    fn is_empty(&self) -> bool;
}

pub use channel::{channel, Consumer, Producer, TryPopError};
pub use msqueue::MSQueue;
pub use reclaim::{Epoch, Reclaim, Retain};
