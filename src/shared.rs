//! Lock-guarded sender for many publishing threads.
//!
//! 供多个发布线程使用的加锁发送器。

use std::fmt;

use crate::receiver::Receiver;
use crate::sender::{Sender, Stats};
use crate::shim::sync::{Arc, Mutex, lock};

/// A [`Sender`] safe for concurrent use by many threads
///
/// One mutex guards both `send` and `receiver`, so concurrent sends are linearized
/// into a single order that every receiver agrees on, and a new receiver is never
/// positioned in the middle of an in-flight send.
///
/// Handles are cheap to clone and all publish into the same chain. The stream is closed
/// when the last handle is dropped. Threads that both publish and listen should call
/// `receiver()` before their first `send` if they want to see their own values.
///
/// 可被多个线程并发使用的 [`Sender`]
///
/// 一把互斥锁同时保护 `send` 与 `receiver`，因此并发发送会被线性化为所有接收器
/// 一致认同的单一顺序，且新接收器绝不会位于进行中的发送之间。
///
/// 句柄克隆代价很低，且都发布到同一条链。最后一个句柄被丢弃时流关闭。
///
/// # Examples
///
/// ```
/// use lite_broadcast::SharedSender;
///
/// let shared = SharedSender::new();
/// let mut rx = shared.receiver();
///
/// let handles: Vec<_> = (0..4)
///     .map(|i| {
///         let shared = shared.clone();
///         std::thread::spawn(move || shared.send(i))
///     })
///     .collect();
/// for handle in handles {
///     handle.join().unwrap();
/// }
///
/// let mut seen: Vec<i32> = (0..4).map(|_| *rx.recv().unwrap()).collect();
/// seen.sort();
/// assert_eq!(seen, vec![0, 1, 2, 3]);
/// ```
pub struct SharedSender<T> {
    sender: Arc<Mutex<Sender<T>>>,
}

impl<T> SharedSender<T> {
    /// Create a shared sender with an empty chain
    ///
    /// 创建一个链为空的共享发送器
    pub fn new() -> Self {
        Self::from(Sender::new())
    }

    /// Publish `value`; serialized with every other `send` on any handle
    ///
    /// 发布 `value`；与任何句柄上的其他 `send` 串行化
    pub fn send(&self, value: T) {
        lock(&self.sender).send(value);
    }

    /// Create a receiver that observes every value sent after this call returns
    ///
    /// 创建一个接收器，它将观察到此调用返回后发送的每一个值
    pub fn receiver(&self) -> Receiver<T> {
        lock(&self.sender).receiver()
    }

    /// Retention counters for this channel
    ///
    /// 该通道的保留计数器
    pub fn stats(&self) -> Stats {
        lock(&self.sender).stats()
    }
}

impl<T> From<Sender<T>> for SharedSender<T> {
    fn from(sender: Sender<T>) -> Self {
        Self {
            sender: Arc::new(Mutex::new(sender)),
        }
    }
}

impl<T> Clone for SharedSender<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> Default for SharedSender<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SharedSender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSender").finish_non_exhaustive()
    }
}
