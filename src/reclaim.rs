//! Node reclamation strategies for [`MSQueue`](crate::MSQueue).
//!
//! The CAS protocol is the same under every strategy; only the lifetime of
//! nodes that `head` has moved past differs.

use core::fmt;
use core::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Guard, Shared};

use crate::msqueue::Node;

mod private {
    pub trait Sealed {}
}

/// How dequeued nodes are freed.
///
/// This trait is sealed: the queue relies on the exact guarantees of
/// [`Epoch`] and [`Retain`].
pub trait Reclaim: private::Sealed + fmt::Debug + Send + Sync {
    /// Runs `f` with a guard under which every node it loads stays allocated.
    fn protect<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Guard) -> T;

    /// Records the sentinel the queue was created with.
    fn adopt(&self, sentinel: Shared<'_, Node>);

    /// Takes a node that `head` has just moved past.
    ///
    /// # Safety
    ///
    /// `node` must be unreachable from `head` and `tail`, and must be
    /// retired exactly once.
    unsafe fn retire(&self, node: Shared<'_, Node>, guard: &Guard);

    /// First node of the chain still owned by the strategy at teardown.
    fn first_owned<'g>(&self, head: Shared<'g, Node>, guard: &'g Guard) -> Shared<'g, Node>;
}

/// Epoch-based reclamation: retired nodes are destroyed once no pinned
/// thread can still observe them.
#[derive(Debug, Default, Clone, Copy)]
pub struct Epoch;

impl private::Sealed for Epoch {}

impl Reclaim for Epoch {
    #[inline]
    fn protect<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Guard) -> T,
    {
        f(&epoch::pin())
    }

    #[inline]
    fn adopt(&self, _sentinel: Shared<'_, Node>) {}

    #[inline]
    unsafe fn retire(&self, node: Shared<'_, Node>, guard: &Guard) {
        guard.defer_destroy(node);
    }

    #[inline]
    fn first_owned<'g>(&self, head: Shared<'g, Node>, _guard: &'g Guard) -> Shared<'g, Node> {
        head
    }
}

/// Keeps every node alive until the queue is dropped.
///
/// Nothing is freed while the queue lives, so node addresses are never
/// reused and no pinning is needed. Memory grows with the total number of
/// values ever pushed.
#[derive(Debug, Default)]
pub struct Retain {
    origin: Atomic<Node>,
}

impl private::Sealed for Retain {}

impl Reclaim for Retain {
    #[inline]
    fn protect<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Guard) -> T,
    {
        // SAFETY: nodes are only freed by the queue's `Drop`, which has
        // exclusive access.
        f(unsafe { epoch::unprotected() })
    }

    fn adopt(&self, sentinel: Shared<'_, Node>) {
        self.origin.store(sentinel, Ordering::Relaxed);
    }

    #[inline]
    unsafe fn retire(&self, _node: Shared<'_, Node>, _guard: &Guard) {}

    fn first_owned<'g>(&self, _head: Shared<'g, Node>, guard: &'g Guard) -> Shared<'g, Node> {
        // Retired nodes keep their `next` links, so the chain from the first
        // sentinel still reaches every node.
        self.origin.load(Ordering::Relaxed, guard)
    }
}
