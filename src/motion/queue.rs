//! Per-stepper FIFO of pending move descriptors.

use super::pool::{MoveHandle, MovePool};

/// Singly linked FIFO of pool handles.
///
/// The queue only stores head and tail; the links live in the pool slots.
/// Callers must hold the critical section for every mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveQueue {
    head: Option<MoveHandle>,
    tail: Option<MoveHandle>,
}

impl MoveQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    /// Whether the queue holds no descriptors.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append a freshly allocated handle at the tail.
    pub fn push_back<const N: usize>(&mut self, pool: &mut MovePool<N>, handle: MoveHandle) {
        pool.set_next(handle, None);
        match self.tail {
            Some(tail) => pool.set_next(tail, Some(handle)),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
    }

    /// Unlink and return the head. Ownership of the slot passes to the caller.
    pub fn pop_front<const N: usize>(&mut self, pool: &mut MovePool<N>) -> Option<MoveHandle> {
        let head = self.head?;
        self.head = pool.next(head);
        if self.head.is_none() {
            self.tail = None;
        }
        pool.set_next(head, None);
        Some(head)
    }

    /// Number of queued descriptors. Walks the list; not for timer context.
    pub fn len<const N: usize>(&self, pool: &MovePool<N>) -> usize {
        let mut n = 0;
        let mut cur = self.head;
        while let Some(h) = cur {
            n += 1;
            cur = pool.next(h);
        }
        n
    }

    /// Release every queued descriptor back to the pool.
    pub fn clear<const N: usize>(&mut self, pool: &mut MovePool<N>) {
        while let Some(h) = self.pop_front(pool) {
            pool.release(h);
        }
    }
}
