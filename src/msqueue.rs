//! Michael-Scott queue for one producer and one consumer.

use core::sync::atomic::Ordering;

use crossbeam_epoch::{unprotected, Atomic, Owned, Shared};
use crossbeam_utils::CachePadded;
use tracing::{debug, trace};

use crate::reclaim::{Epoch, Reclaim};

/// A link in the queue's chain.
#[derive(Debug)]
pub struct Node {
    value: i16,
    pub(crate) next: Atomic<Node>,
}

impl Node {
    pub(crate) fn new(value: i16) -> Self {
        Node {
            value,
            next: Atomic::null(),
        }
    }
}

/// Unbounded lock-free queue of `i16` values.
///
/// At most one thread may call [`push`](MSQueue::push) and at most one
/// (possibly different) thread may call [`pop`](MSQueue::pop); the two may
/// run concurrently. Use [`split`](MSQueue::split) to have the type system
/// enforce this.
#[derive(Debug)]
pub struct MSQueue<R: Reclaim = Epoch> {
    pub(crate) head: CachePadded<Atomic<Node>>,
    pub(crate) tail: CachePadded<Atomic<Node>>,
    reclaim: R,
}

impl MSQueue {
    /// Create a new, empty queue using epoch-based reclamation.
    pub fn new() -> MSQueue {
        Self::with_reclaim(Epoch)
    }
}

impl Default for MSQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Reclaim> MSQueue<R> {
    /// Create a new, empty queue with the given reclamation strategy.
    pub fn with_reclaim(reclaim: R) -> MSQueue<R> {
        let q = MSQueue {
            head: CachePadded::new(Atomic::null()),
            tail: CachePadded::new(Atomic::null()),
            reclaim,
        };
        // The sentinel's value is never read.
        let sentinel = Owned::new(Node::new(0));
        unsafe {
            let sentinel = sentinel.into_shared(unprotected());
            q.head.store(sentinel, Ordering::Relaxed);
            q.tail.store(sentinel, Ordering::Relaxed);
            q.reclaim.adopt(sentinel);
        }
        q
    }

    /// Adds `value` to the back of the queue.
    ///
    /// Must only be called from the producer thread.
    pub fn push(&self, value: i16) {
        self.reclaim.protect(|guard| {
            let node = Owned::new(Node::new(value)).into_shared(guard);
            loop {
                let tail = self.tail.load(Ordering::Acquire, guard);
                // SAFETY: tail is never null and the guard keeps it allocated.
                let tail_ref = unsafe { tail.deref() };
                let next = tail_ref.next.load(Ordering::Acquire, guard);
                if tail != self.tail.load(Ordering::Acquire, guard) {
                    continue;
                }

                if !next.is_null() {
                    trace!("push: tail lagging, advancing it");
                    let _ = self.tail.compare_exchange(
                        tail,
                        next,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    );
                    continue;
                }

                if tail_ref
                    .next
                    .compare_exchange(
                        Shared::null(),
                        node,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    )
                    .is_ok()
                {
                    // Best effort; whoever sees the lag next will fix it.
                    let _ = self.tail.compare_exchange(
                        tail,
                        node,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    );
                    return;
                }
            }
        })
    }

    /// Attempts to dequeue from the front.
    /// Returns `None` if the queue is observed to be empty.
    ///
    /// Must only be called from the consumer thread.
    pub fn pop(&self) -> Option<i16> {
        self.reclaim.protect(|guard| loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            // SAFETY: head is never null and the guard keeps it allocated.
            let next = unsafe { head.deref() }.next.load(Ordering::Acquire, guard);
            if head != self.head.load(Ordering::Acquire, guard) {
                continue;
            }

            if head == tail {
                if next.is_null() {
                    return None;
                }
                trace!("pop: tail lagging, advancing it");
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
                continue;
            }

            let next_ref = some_or!(unsafe { next.as_ref() }, continue);
            // Read before the CAS: afterwards `next` becomes the sentinel.
            let value = next_ref.value;
            if self
                .head
                .compare_exchange(head, next, Ordering::Release, Ordering::Relaxed, guard)
                .is_ok()
            {
                // SAFETY: head now points past the old sentinel and tail is
                // at or beyond `next`, so nothing references it any more.
                unsafe { self.reclaim.retire(head, guard) };
                return Some(value);
            }
        })
    }

    /// Check whether the queue is empty, as seen from the consumer side.
    pub fn is_empty(&self) -> bool {
        self.reclaim.protect(|guard| {
            let head = self.head.load(Ordering::Acquire, guard);
            // SAFETY: head is never null and the guard keeps it allocated.
            unsafe { head.deref() }
                .next
                .load(Ordering::Acquire, guard)
                .is_null()
        })
    }
}

impl<R: Reclaim> Drop for MSQueue<R> {
    fn drop(&mut self) {
        unsafe {
            let guard = unprotected();
            let head = self.head.load(Ordering::Relaxed, guard);
            let mut node = self.reclaim.first_owned(head, guard);
            let mut freed = 0usize;
            while let Some(node_ref) = node.as_ref() {
                let next = node_ref.next.load(Ordering::Relaxed, guard);
                drop(node.into_owned());
                node = next;
                freed += 1;
            }
            debug!(freed, "released queue nodes");
        }
    }
}

impl<R: Reclaim + Default> crate::Queue<i16> for MSQueue<R> {
    fn new() -> Self {
        MSQueue::with_reclaim(R::default())
    }

    fn push(&self, value: i16) {
        MSQueue::push(self, value)
    }

    fn pop(&self) -> Option<i16> {
        MSQueue::pop(self)
    }

    fn is_empty(&self) -> bool {
        MSQueue::is_empty(self)
    }
}
