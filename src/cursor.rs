//! Private position in the chain, owned by exactly one sender or receiver.

use crate::node::{BLOCK_CAP, Block, Inner, Slot, SlotState};
use crate::shim::sync::Arc;

pub(crate) struct Cursor<T> {
    block: Arc<Block<T>>,
    index: usize,
}

impl<T> Clone for Cursor<T> {
    fn clone(&self) -> Self {
        Self {
            block: self.block.clone(),
            index: self.index,
        }
    }
}

impl<T> Cursor<T> {
    /// Cursor at sequence number 0 of a brand new chain
    pub(crate) fn start(inner: Arc<Inner>) -> Self {
        Self {
            block: Block::new(0, inner),
            index: 0,
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &Arc<Inner> {
        &self.block.inner
    }

    #[inline]
    pub(crate) fn slot(&self) -> &Slot<T> {
        self.block.slot(self.index)
    }

    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        self.slot().state()
    }

    /// Absolute sequence number of the node under the cursor
    #[inline]
    pub(crate) fn seq(&self) -> u64 {
        self.block.base() + self.index as u64
    }

    /// Fire the node under the cursor, then step onto its successor
    ///
    /// # Safety
    ///
    /// Caller is the only writer of the frontier and the cursor sits on it.
    pub(crate) unsafe fn fire(&mut self, value: T) {
        unsafe {
            self.block.fire(self.index, value);
            self.advance();
        }
    }

    /// # Safety
    ///
    /// Same contract as [`Cursor::fire`].
    pub(crate) unsafe fn close(&self) {
        unsafe { self.block.close(self.index) };
    }

    /// Hand out the node under the cursor and step onto its successor
    ///
    /// Returns `None` while the node is open or closed.
    pub(crate) fn take(&mut self) -> Option<(Arc<Block<T>>, usize)> {
        if self.state() != SlotState::Fired {
            return None;
        }
        let taken = (self.block.clone(), self.index);
        // SAFETY: the node was just observed fired.
        unsafe { self.advance() };
        Some(taken)
    }

    /// # Safety
    ///
    /// The node under the cursor must have been observed fired.
    unsafe fn advance(&mut self) {
        if self.index + 1 < BLOCK_CAP {
            self.index += 1;
        } else {
            self.block = unsafe { self.block.next() };
            self.index = 0;
        }
    }
}
