//! Signal nodes and the blocks that store them.
//!
//! The chain is an append-only log of one-shot nodes ("slots"). Slots are allocated
//! `BLOCK_CAP` at a time; blocks are linked through `next` and reference counted, so a block
//! is freed as soon as every cursor and outstanding [`Payload`](crate::Payload) has moved
//! past it.
//!
//! 信号节点以及存储它们的块。
//!
//! 链是一次性节点（"槽"）的只追加日志。槽每次分配 `BLOCK_CAP` 个；块通过 `next`
//! 链接并使用引用计数，因此当所有游标和未释放的 `Payload` 都越过某个块时，
//! 该块立即被释放。

use std::mem::MaybeUninit;

use crate::shim::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use crate::shim::cell::UnsafeCell;
use crate::shim::sync::Arc;
use crate::waiters::Waiters;

/// Number of slots per block
#[cfg(not(feature = "loom"))]
pub(crate) const BLOCK_CAP: usize = 32;

// Small enough that loom models cross a block boundary.
#[cfg(feature = "loom")]
pub(crate) const BLOCK_CAP: usize = 2;

// Slot states
const OPEN: u8 = 0; // Not fired yet
const FIRED: u8 = 1; // Value and successor published
const CLOSED: u8 = 2; // Sender dropped while this slot was the frontier

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotState {
    Open,
    Fired,
    Closed,
}

/// One signal node: a one-shot state plus a write-once value
///
/// 一个信号节点：一次性状态加上只写一次的值
pub(crate) struct Slot<T> {
    state: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(OPEN),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// SeqCst so it pairs with the waiter registration in [`Waiters::register`].
    #[inline]
    pub(crate) fn state(&self) -> SlotState {
        match self.state.load(Ordering::SeqCst) {
            OPEN => SlotState::Open,
            FIRED => SlotState::Fired,
            _ => SlotState::Closed,
        }
    }

    /// # Safety
    ///
    /// The slot must have been observed [`SlotState::Fired`].
    #[inline]
    pub(crate) unsafe fn get(&self) -> &T {
        self.value.with(|v| unsafe { (*v).assume_init_ref() })
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        if self.state.load(Ordering::Acquire) == FIRED {
            self.value.with_mut(|v| unsafe { (*v).assume_init_drop() });
        }
    }
}

/// Channel-wide bookkeeping shared by all endpoints and blocks
///
/// 所有端点和块共享的通道级簿记信息
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) waiters: Waiters,
    /// Number of values sent so far
    pub(crate) published: AtomicU64,
    /// Sequence number of the first slot still held in memory
    pub(crate) reclaimed: AtomicU64,
    /// Live receivers
    pub(crate) receivers: AtomicUsize,
}

impl Inner {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            waiters: Waiters::new(),
            published: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
            receivers: AtomicUsize::new(0),
        })
    }
}

/// A run of `BLOCK_CAP` consecutive slots starting at sequence number `base`
///
/// 从序列号 `base` 开始的 `BLOCK_CAP` 个连续槽
pub(crate) struct Block<T> {
    base: u64,
    slots: Box<[Slot<T>]>,
    // Written once, by the writer of the last slot, before that slot is fired.
    next: UnsafeCell<Option<Arc<Block<T>>>>,
    pub(crate) inner: Arc<Inner>,
}

// SAFETY: every slot value and `next` is written by the single writer before the
// slot's state is published, and only read after the state is observed. Readers on
// several threads share `&T`, hence `T: Sync`.
unsafe impl<T: Send + Sync> Send for Block<T> {}
unsafe impl<T: Send + Sync> Sync for Block<T> {}

impl<T> Block<T> {
    pub(crate) fn new(base: u64, inner: Arc<Inner>) -> Arc<Self> {
        tracing::trace!(base, "broadcast block allocated");
        Arc::new(Self {
            base,
            slots: (0..BLOCK_CAP).map(|_| Slot::new()).collect(),
            next: UnsafeCell::new(None),
            inner,
        })
    }

    #[inline]
    pub(crate) fn base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub(crate) fn slot(&self, index: usize) -> &Slot<T> {
        &self.slots[index]
    }

    /// Publish `value` in slot `index`
    ///
    /// Writes the value, links a fresh block when `index` is the last slot, then
    /// sets the signal and wakes every waiter.
    ///
    /// 在槽 `index` 中发布 `value`
    ///
    /// 写入值，若 `index` 是最后一个槽则链接新块，然后设置信号并唤醒所有等待者。
    ///
    /// # Safety
    ///
    /// Single writer per slot: the caller must hold exclusive write access to the
    /// frontier, and slot `index` must be open.
    pub(crate) unsafe fn fire(&self, index: usize, value: T) {
        let slot = &self.slots[index];
        debug_assert_eq!(slot.state(), SlotState::Open);

        slot.value.with_mut(|v| unsafe { (*v).write(value) });
        if index + 1 == BLOCK_CAP {
            let next = Block::new(self.base + BLOCK_CAP as u64, self.inner.clone());
            self.next.with_mut(|n| unsafe { *n = Some(next) });
        }
        slot.state.store(FIRED, Ordering::SeqCst);

        self.inner.waiters.wake_all();
    }

    /// Mark slot `index` closed and wake every waiter
    ///
    /// # Safety
    ///
    /// Same contract as [`Block::fire`].
    pub(crate) unsafe fn close(&self, index: usize) {
        self.slots[index].state.store(CLOSED, Ordering::SeqCst);
        self.inner.waiters.wake_all();
    }

    /// Successor block
    ///
    /// # Safety
    ///
    /// The last slot of this block must have been observed [`SlotState::Fired`].
    #[inline]
    pub(crate) unsafe fn next(&self) -> Arc<Block<T>> {
        self.next.with(|n| match unsafe { &*n } {
            Some(next) => next.clone(),
            None => unreachable!("successor block linked before the last slot fires"),
        })
    }

    fn take_next(&self) -> Option<Arc<Block<T>>> {
        self.next.with_mut(|n| unsafe { (*n).take() })
    }
}

impl<T> Drop for Block<T> {
    fn drop(&mut self) {
        let end = self.base + BLOCK_CAP as u64;
        self.inner.reclaimed.store(end, Ordering::Release);
        tracing::trace!(base = self.base, "broadcast block reclaimed");

        // Unlink iteratively; a long unconsumed tail would otherwise recurse once per block.
        let mut next = self.take_next();
        while let Some(block) = next {
            match Arc::try_unwrap(block) {
                Ok(block) => next = block.take_next(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;

    #[test]
    fn test_fire_publishes_value() {
        let block = Block::<String>::new(0, Inner::new());
        assert_eq!(block.slot(0).state(), SlotState::Open);

        unsafe { block.fire(0, "hello".to_string()) };

        assert_eq!(block.slot(0).state(), SlotState::Fired);
        assert_eq!(unsafe { block.slot(0).get() }, "hello");
        assert_eq!(block.slot(1).state(), SlotState::Open);
    }

    #[test]
    fn test_last_slot_links_successor() {
        let block = Block::<usize>::new(0, Inner::new());
        for i in 0..BLOCK_CAP {
            unsafe { block.fire(i, i) };
        }

        let next = unsafe { block.next() };
        assert_eq!(next.base(), BLOCK_CAP as u64);
        assert_eq!(next.slot(0).state(), SlotState::Open);
    }

    #[test]
    fn test_close_is_terminal_state() {
        let block = Block::<u8>::new(0, Inner::new());
        unsafe { block.close(0) };
        assert_eq!(block.slot(0).state(), SlotState::Closed);
    }

    #[test]
    fn test_drop_releases_fired_values() {
        let value = std::sync::Arc::new(());
        {
            let block = Block::new(0, Inner::new());
            unsafe { block.fire(0, value.clone()) };
            assert_eq!(std::sync::Arc::strong_count(&value), 2);
        }
        assert_eq!(std::sync::Arc::strong_count(&value), 1);
    }

    #[test]
    fn test_long_chain_drop_does_not_overflow() {
        let inner = Inner::new();
        let head = Block::<u32>::new(0, inner.clone());
        let mut block = head.clone();
        for _ in 0..50_000 {
            for i in 0..BLOCK_CAP {
                unsafe { block.fire(i, i as u32) };
            }
            block = unsafe { block.next() };
        }
        drop(block);
        drop(head);

        assert_eq!(
            inner.reclaimed.load(Ordering::Acquire),
            50_001 * BLOCK_CAP as u64
        );
    }
}
