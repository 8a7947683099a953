//! Producer and consumer handles over a shared [`MSQueue`].
//!
//! Each handle is [`Send`] but neither [`Sync`] nor [`Clone`], so a queue
//! split into a `(Producer, Consumer)` pair has exactly one pushing thread
//! and one popping thread.
//!
//! # Example
//!
//! ```
//! use msq_spsc::{channel, TryPopError};
//!
//! let (tx, rx) = channel();
//!
//! tx.push(7);
//! assert_eq!(rx.try_pop(), Ok(7));
//! assert_eq!(rx.try_pop(), Err(TryPopError::Empty));
//!
//! drop(tx);
//! assert_eq!(rx.try_pop(), Err(TryPopError::Disconnected));
//! ```

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::msqueue::MSQueue;
use crate::reclaim::{Epoch, Reclaim};

/// Reason [`Consumer::try_pop`] returned no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryPopError {
    /// Nothing is queued, but the producer may still push.
    #[error("queue is empty")]
    Empty,
    /// The producer is gone and every value it pushed has been popped.
    #[error("queue is empty and the producer has disconnected")]
    Disconnected,
}

/// Marker type to opt-out of `Sync` while remaining `Send`.
type PhantomUnsync = PhantomData<Cell<&'static ()>>;

#[derive(Debug)]
struct Inner<R: Reclaim> {
    queue: MSQueue<R>,
    producer_alive: AtomicBool,
    consumer_alive: AtomicBool,
}

/// Write end of a split queue.
#[derive(Debug)]
pub struct Producer<R: Reclaim = Epoch> {
    inner: Arc<Inner<R>>,
    _unsync: PhantomUnsync,
}

/// Read end of a split queue.
#[derive(Debug)]
pub struct Consumer<R: Reclaim = Epoch> {
    inner: Arc<Inner<R>>,
    _unsync: PhantomUnsync,
}

/// Creates an empty epoch-reclaimed queue and splits it.
#[must_use]
pub fn channel() -> (Producer, Consumer) {
    MSQueue::new().split()
}

impl<R: Reclaim> MSQueue<R> {
    /// Splits the queue into its producer and consumer ends.
    ///
    /// Values already queued stay queued and are seen by the consumer.
    #[must_use]
    pub fn split(self) -> (Producer<R>, Consumer<R>) {
        let inner = Arc::new(Inner {
            queue: self,
            producer_alive: AtomicBool::new(true),
            consumer_alive: AtomicBool::new(true),
        });

        let producer = Producer {
            inner: Arc::clone(&inner),
            _unsync: PhantomData,
        };
        let consumer = Consumer {
            inner,
            _unsync: PhantomData,
        };

        (producer, consumer)
    }
}

impl<R: Reclaim> Producer<R> {
    /// Adds `value` to the back of the queue. Never fails.
    #[inline]
    pub fn push(&self, value: i16) {
        self.inner.queue.push(value)
    }

    /// Returns `true` once the consumer has been dropped.
    ///
    /// Pushing still succeeds; the values are freed with the queue.
    pub fn is_disconnected(&self) -> bool {
        !self.inner.consumer_alive.load(Ordering::Acquire)
    }
}

impl<R: Reclaim> Consumer<R> {
    /// Attempts to dequeue from the front.
    /// Returns `None` if the queue is observed to be empty.
    #[inline]
    #[must_use]
    pub fn pop(&self) -> Option<i16> {
        self.inner.queue.pop()
    }

    /// Like [`pop`](Consumer::pop), but tells an idle producer apart from a
    /// dropped one.
    ///
    /// # Errors
    ///
    /// [`TryPopError::Empty`] if nothing is queued right now, and
    /// [`TryPopError::Disconnected`] if nothing is queued and the producer
    /// has been dropped.
    pub fn try_pop(&self) -> Result<i16, TryPopError> {
        // Checked first: the producer's pushes happen before its release
        // store, so if it is gone the pop below sees all of them.
        let closed = !self.inner.producer_alive.load(Ordering::Acquire);
        match self.inner.queue.pop() {
            Some(value) => Ok(value),
            None if closed => Err(TryPopError::Disconnected),
            None => Err(TryPopError::Empty),
        }
    }

    /// Check whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.queue.is_empty()
    }

    /// Returns `true` once the producer has been dropped.
    ///
    /// Values it pushed before that may still be queued.
    pub fn is_disconnected(&self) -> bool {
        !self.inner.producer_alive.load(Ordering::Acquire)
    }
}

impl<R: Reclaim> Drop for Producer<R> {
    fn drop(&mut self) {
        self.inner.producer_alive.store(false, Ordering::Release);
        debug!("producer disconnected");
    }
}

impl<R: Reclaim> Drop for Consumer<R> {
    fn drop(&mut self) {
        self.inner.consumer_alive.store(false, Ordering::Release);
        debug!("consumer disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reclaim::Retain;
    use crossbeam_utils::thread::scope;

    #[test]
    fn test_basic_push_pop() {
        let (producer, consumer) = channel();

        producer.push(42);
        assert_eq!(consumer.pop(), Some(42));
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn test_split_keeps_queued_values() {
        let q = MSQueue::new();
        q.push(1);
        q.push(2);

        let (producer, consumer) = q.split();
        producer.push(3);
        assert_eq!(consumer.pop(), Some(1));
        assert_eq!(consumer.pop(), Some(2));
        assert_eq!(consumer.pop(), Some(3));
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_try_pop_empty_then_disconnected() {
        let (producer, consumer) = MSQueue::with_reclaim(Retain::default()).split();

        assert_eq!(consumer.try_pop(), Err(TryPopError::Empty));
        producer.push(-5);
        producer.push(0);
        drop(producer);

        assert!(consumer.is_disconnected());
        assert_eq!(consumer.try_pop(), Ok(-5));
        assert_eq!(consumer.try_pop(), Ok(0));
        assert_eq!(consumer.try_pop(), Err(TryPopError::Disconnected));
        assert_eq!(consumer.try_pop(), Err(TryPopError::Disconnected));
    }

    #[test]
    fn test_producer_sees_dropped_consumer() {
        let (producer, consumer) = channel();

        assert!(!producer.is_disconnected());
        drop(consumer);
        assert!(producer.is_disconnected());
        producer.push(1);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(TryPopError::Empty.to_string(), "queue is empty");
        assert_eq!(
            TryPopError::Disconnected.to_string(),
            "queue is empty and the producer has disconnected"
        );
    }

    #[test]
    fn test_send_to_thread() {
        let (producer, consumer) = channel();

        let handle = std::thread::spawn(move || {
            for i in 0..10 {
                producer.push(i);
            }
        });
        handle.join().unwrap();

        for i in 0..10 {
            assert_eq!(consumer.try_pop(), Ok(i));
        }
        assert_eq!(consumer.try_pop(), Err(TryPopError::Disconnected));
    }

    #[test]
    fn test_drain_until_disconnected() {
        const COUNT: i16 = 10_000;
        let (producer, consumer) = channel();

        scope(|scope| {
            scope.spawn(move |_| {
                for i in 0..COUNT {
                    producer.push(i);
                }
            });

            let mut received = Vec::with_capacity(COUNT as usize);
            loop {
                match consumer.try_pop() {
                    Ok(value) => received.push(value),
                    Err(TryPopError::Empty) => std::hint::spin_loop(),
                    Err(TryPopError::Disconnected) => break,
                }
            }
            assert_eq!(received, (0..COUNT).collect::<Vec<_>>());
        })
        .unwrap();
    }
}
