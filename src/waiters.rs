//! Multicast waker registry shared by every endpoint of one channel
//!
//! Every receiver that finds its node open registers a waker here, whether it is a
//! parked thread (`Receiver::recv`) or a task polling a `WaitHandle`. Each fire or close
//! drains the whole set and wakes every entry. Any receiver still waiting is by
//! construction positioned at the frontier, so one set for the whole channel is enough.
//!
//! Entries are keyed; a waiter that gives up removes its own entry, so the set never
//! holds more than one entry per waiting handle.
//!
//! 单个通道所有端点共享的多播 waker 注册表
//!
//! 每个发现节点尚未触发的接收器都会在此注册 waker，无论是阻塞的线程
//! （`Receiver::recv`）还是轮询 `WaitHandle` 的任务。每次触发或关闭都会清空
//! 整个集合并唤醒所有条目。仍在等待的接收器必然位于前沿节点，因此整个通道
//! 只需要一个集合。
//!
//! 条目带有键；放弃等待的等待者会移除自己的条目，因此每个等待句柄最多只占一个条目。
use std::sync::Arc as StdArc;
use std::task::{Wake, Waker};

use crate::shim::atomic::{AtomicBool, AtomicUsize, Ordering};
use crate::shim::sync::{Mutex, lock};
use crate::shim::thread::{self, Thread};

pub(crate) struct Waiters {
    // Mirrors `list.entries.len()`; lets the sender skip the lock when nobody waits.
    pending: AtomicUsize,
    list: Mutex<WaitList>,
}

struct WaitList {
    next_key: u64,
    entries: Vec<(u64, Waker)>,
}

impl Waiters {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            pending: AtomicUsize::new(0),
            list: Mutex::new(WaitList {
                next_key: 0,
                entries: Vec::new(),
            }),
        }
    }

    /// Register a waker for the next fire or close, returning its key
    ///
    /// Passing the key from an earlier call updates that entry in place instead of adding
    /// a new one. Callers must re-check the node state after this returns. The store to
    /// `pending` and the sender's load of it are both SeqCst, paired with SeqCst accesses
    /// of the node state, so either the caller sees the node fired or the sender sees the
    /// waker.
    ///
    /// 注册一个 waker，等待下一次触发或关闭，并返回其键
    ///
    /// 传入先前返回的键会原地更新该条目而不是新增条目。调用者必须在返回后重新检查节点状态。
    pub(crate) fn register(&self, key: Option<u64>, waker: &Waker) -> u64 {
        let mut list = lock(&self.list);

        if let Some(key) = key {
            if let Some((_, existing)) = list.entries.iter_mut().find(|(k, _)| *k == key) {
                if !existing.will_wake(waker) {
                    *existing = waker.clone();
                }
                self.pending.store(list.entries.len(), Ordering::SeqCst);
                return key;
            }
        }

        // Drained by a wake since the last call, or first registration
        let key = match key {
            Some(key) => key,
            None => {
                let key = list.next_key;
                list.next_key += 1;
                key
            }
        };
        list.entries.push((key, waker.clone()));
        self.pending.store(list.entries.len(), Ordering::SeqCst);
        key
    }

    /// Remove the entry for `key`, if a wake has not drained it already
    ///
    /// 移除 `key` 对应的条目（如果尚未被唤醒清空）
    pub(crate) fn remove(&self, key: u64) {
        if self.pending.load(Ordering::SeqCst) == 0 {
            return;
        }

        let mut list = lock(&self.list);
        if let Some(pos) = list.entries.iter().position(|(k, _)| *k == key) {
            list.entries.swap_remove(pos);
            self.pending.store(list.entries.len(), Ordering::SeqCst);
        }
    }

    /// Wake every registered waker
    ///
    /// 唤醒所有已注册的 waker
    pub(crate) fn wake_all(&self) {
        if self.pending.load(Ordering::SeqCst) == 0 {
            return;
        }

        let drained = {
            let mut list = lock(&self.list);
            self.pending.store(0, Ordering::SeqCst);
            std::mem::take(&mut list.entries)
        };

        for (_, waker) in drained {
            waker.wake();
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Waiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiters")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .finish()
    }
}

/// Waker that unparks a blocked thread
///
/// Lets blocking receivers share the waiter set with async ones.
///
/// 唤醒阻塞线程的 waker
pub(crate) struct ThreadParker {
    thread: Thread,
    notified: AtomicBool,
}

impl ThreadParker {
    pub(crate) fn current() -> StdArc<Self> {
        StdArc::new(Self {
            thread: thread::current(),
            notified: AtomicBool::new(false),
        })
    }

    /// Park until woken at least once since the last call
    ///
    /// Spurious unparks are absorbed by the `notified` flag.
    pub(crate) fn park(&self) {
        while !self.notified.swap(false, Ordering::Acquire) {
            thread::park();
        }
    }
}

impl Wake for ThreadParker {
    fn wake(self: StdArc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &StdArc<Self>) {
        self.notified.store(true, Ordering::Release);
        self.thread.unpark();
    }
}
