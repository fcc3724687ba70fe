//! Single-writer end of the channel.
//!
//! 通道的单写者端。

use std::fmt;

use crate::cursor::Cursor;
use crate::node::Inner;
use crate::receiver::Receiver;
use crate::shared::SharedSender;
use crate::shim::atomic::Ordering;

/// Snapshot of a channel's retention counters
///
/// `retained` counts published values whose storage is still alive. It is an upper
/// bound (at block granularity) on how far the slowest receiver, or the oldest
/// [`Payload`](crate::Payload) still held, lags behind the sender. A value that keeps
/// growing means some receiver stopped calling `recv`.
///
/// 通道保留计数器的快照
///
/// `retained` 统计存储仍然存活的已发布值数量。它是最慢接收器（或仍被持有的最早
/// `Payload`）落后于发送器距离的上界（以块为粒度）。若该值持续增长，说明某个
/// 接收器已停止调用 `recv`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    /// Values sent so far
    pub published: u64,
    /// Published values still held in memory
    pub retained: u64,
    /// Live receivers
    pub receivers: usize,
}

impl Stats {
    pub(crate) fn read(inner: &Inner) -> Self {
        let published = inner.published.load(Ordering::Acquire);
        let reclaimed = inner.reclaimed.load(Ordering::Acquire);
        Self {
            published,
            retained: published.saturating_sub(reclaimed),
            receivers: inner.receivers.load(Ordering::Acquire),
        }
    }
}

/// Publishes values to every receiver created from it
///
/// A bare `Sender` is single-writer: `send` takes `&mut self`. Wrap it in a
/// [`SharedSender`] when several threads need to publish.
///
/// Dropping the sender ends the stream: receivers drain what was published and then
/// get [`RecvError`](crate::RecvError).
///
/// 向由它创建的所有接收器发布值
///
/// 裸 `Sender` 是单写者的：`send` 需要 `&mut self`。当多个线程需要发布时，
/// 请将其包装为 [`SharedSender`]。
///
/// 丢弃发送器即结束流：接收器会先取完已发布的值，然后得到 `RecvError`。
///
/// # Examples
///
/// ```
/// use lite_broadcast::Sender;
///
/// let mut sender = Sender::new();
/// let mut early = sender.receiver();
///
/// sender.send("first");
/// let mut late = sender.receiver();
/// sender.send("second");
///
/// assert_eq!(*early.recv().unwrap(), "first");
/// assert_eq!(*early.recv().unwrap(), "second");
/// assert_eq!(*late.recv().unwrap(), "second");
/// ```
pub struct Sender<T> {
    cursor: Cursor<T>,
}

impl<T> Sender<T> {
    /// Create a sender with an empty chain
    ///
    /// 创建一个链为空的发送器
    pub fn new() -> Self {
        Self {
            cursor: Cursor::start(Inner::new()),
        }
    }

    /// Publish `value` to every current and future receiver positioned at the frontier
    ///
    /// Never waits for receivers. The value is moved into the chain once and shared by
    /// reference with every receiver that reaches it.
    ///
    /// 向当前及将来位于前沿的所有接收器发布 `value`
    ///
    /// 从不等待接收器。值只会被移入链中一次，并以引用方式与所有到达它的接收器共享。
    pub fn send(&mut self, value: T) {
        // SAFETY: `&mut self` makes this the only writer of the frontier.
        unsafe { self.cursor.fire(value) };
        self.cursor
            .inner()
            .published
            .store(self.cursor.seq(), Ordering::Release);
    }

    /// Create a receiver that observes every value sent from now on
    ///
    /// 创建一个接收器，它将观察到从现在起发送的每一个值
    pub fn receiver(&self) -> Receiver<T> {
        Receiver::new(self.cursor.clone())
    }

    /// Retention counters for this channel
    ///
    /// 该通道的保留计数器
    pub fn stats(&self) -> Stats {
        Stats::read(self.cursor.inner())
    }

    /// Turn this sender into a lock-guarded handle usable from many threads
    ///
    /// 将此发送器转换为可在多线程中使用的加锁句柄
    pub fn into_shared(self) -> SharedSender<T> {
        SharedSender::from(self)
    }
}

impl<T> Default for Sender<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        tracing::debug!(published = self.cursor.seq(), "broadcast sender closed");
        // SAFETY: still the only writer; nothing fires this node afterwards.
        unsafe { self.cursor.close() };
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("seq", &self.cursor.seq())
            .finish_non_exhaustive()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use crate::node::BLOCK_CAP;
    use crate::{RecvError, TryRecvError};

    #[test]
    fn test_receiver_sees_only_later_values() {
        let mut sender = Sender::new();
        sender.send(1);
        let mut rx = sender.receiver();
        sender.send(2);
        sender.send(3);

        assert_eq!(*rx.recv().unwrap(), 2);
        assert_eq!(*rx.recv().unwrap(), 3);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[test]
    fn test_send_without_receivers() {
        let mut sender = Sender::new();
        for i in 0..1000 {
            sender.send(i);
        }
        let stats = sender.stats();
        assert_eq!(stats.published, 1000);
        assert_eq!(stats.receivers, 0);
        // Only the frontier block is kept alive
        assert!(stats.retained < BLOCK_CAP as u64);
    }

    #[test]
    fn test_drop_closes_after_drain() {
        let mut sender = Sender::new();
        let mut rx = sender.receiver();
        sender.send("a");
        drop(sender);

        assert_eq!(*rx.recv().unwrap(), "a");
        assert_eq!(rx.recv().unwrap_err(), RecvError);
        assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Closed);
    }

    #[test]
    fn test_stalled_receiver_retains_chain() {
        let mut sender = Sender::new();
        let stalled = sender.receiver();
        for i in 0..(BLOCK_CAP * 10) {
            sender.send(i);
        }

        let stats = sender.stats();
        assert_eq!(stats.receivers, 1);
        assert_eq!(stats.retained, (BLOCK_CAP * 10) as u64);
        assert_eq!(stalled.lag(), (BLOCK_CAP * 10) as u64);

        drop(stalled);
        let stats = sender.stats();
        assert_eq!(stats.receivers, 0);
        assert!(stats.retained < BLOCK_CAP as u64);
    }

    #[test]
    fn test_debug_format() {
        let mut sender = Sender::new();
        sender.send(());
        assert!(format!("{sender:?}").contains("seq: 1"));
    }
}
