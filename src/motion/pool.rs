//! Fixed-capacity move descriptor pool.
//!
//! Slots are addressed by [`MoveHandle`]. Free slots form an intrusive singly
//! linked list through the same `next` field that queued slots use, so both
//! `allocate` and `release` are O(1) and never touch a global allocator. Safe to
//! call from timer context.

use super::descriptor::Move;

/// Index of a slot in a [`MovePool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveHandle(u16);

impl MoveHandle {
    /// Slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    mv: Move,
    next: Option<MoveHandle>,
}

impl Slot {
    const EMPTY: Slot = Slot {
        mv: Move::EMPTY,
        next: None,
    };
}

/// Arena of `N` move descriptors with an explicit free list.
#[derive(Debug)]
pub struct MovePool<const N: usize> {
    slots: [Slot; N],
    free: Option<MoveHandle>,
    in_use: u16,
}

impl<const N: usize> Default for MovePool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovePool<N> {
    /// Create a pool with every slot free.
    pub const fn new() -> Self {
        assert!(N <= u16::MAX as usize, "move pool too large");
        let mut slots = [Slot::EMPTY; N];
        let mut i = 0;
        while i + 1 < N {
            slots[i].next = Some(MoveHandle((i + 1) as u16));
            i += 1;
        }
        Self {
            slots,
            free: if N > 0 { Some(MoveHandle(0)) } else { None },
            in_use: 0,
        }
    }

    /// Number of slots currently handed out.
    #[inline]
    pub fn in_use(&self) -> usize {
        self.in_use as usize
    }

    /// Number of slots available for allocation.
    #[inline]
    pub fn available(&self) -> usize {
        N - self.in_use as usize
    }

    /// Take a free slot and fill it with `mv`.
    ///
    /// Returns `None` when the pool is exhausted.
    pub fn allocate(&mut self, mv: Move) -> Option<MoveHandle> {
        let handle = self.free?;
        let slot = &mut self.slots[handle.index()];
        self.free = slot.next;
        slot.mv = mv;
        slot.next = None;
        self.in_use += 1;
        Some(handle)
    }

    /// Return a slot to the free list.
    ///
    /// The handle must have come from `allocate` on this pool and must not be
    /// released twice.
    pub fn release(&mut self, handle: MoveHandle) {
        debug_assert!(self.in_use > 0, "release on empty pool");
        let slot = &mut self.slots[handle.index()];
        slot.mv = Move::EMPTY;
        slot.next = self.free;
        self.free = Some(handle);
        self.in_use -= 1;
    }

    /// Descriptor stored in an allocated slot.
    #[inline]
    pub fn get(&self, handle: MoveHandle) -> &Move {
        &self.slots[handle.index()].mv
    }

    #[inline]
    pub(crate) fn next(&self, handle: MoveHandle) -> Option<MoveHandle> {
        self.slots[handle.index()].next
    }

    #[inline]
    pub(crate) fn set_next(&mut self, handle: MoveHandle, next: Option<MoveHandle>) {
        self.slots[handle.index()].next = next;
    }
}
