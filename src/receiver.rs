//! Receiving end of the channel.
//!
//! 通道的接收端。

use std::fmt;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::cursor::Cursor;
use crate::error::{RecvError, TryRecvError};
use crate::node::{Block, SlotState};
use crate::shim::atomic::Ordering;
use crate::shim::sync::Arc;
use crate::waiters::ThreadParker;

/// Receives every value published after its creation, in order
///
/// Each receiver owns a private cursor. Receivers never block each other and never
/// block the sender; a receiver that stops receiving keeps everything after its
/// position alive (see [`Receiver::lag`]).
///
/// Cloning a receiver yields a second, independent cursor at the same position.
///
/// 按顺序接收创建之后发布的每一个值
///
/// 每个接收器拥有私有游标。接收器之间互不阻塞，也不会阻塞发送器；
/// 停止接收的接收器会使其位置之后的所有内容保持存活（见 [`Receiver::lag`]）。
///
/// 克隆接收器会得到位于相同位置的第二个独立游标。
pub struct Receiver<T> {
    cursor: Cursor<T>,
}

impl<T> Receiver<T> {
    pub(crate) fn new(cursor: Cursor<T>) -> Self {
        cursor.inner().receivers.fetch_add(1, Ordering::AcqRel);
        Self { cursor }
    }

    /// Try to receive the next value without blocking
    ///
    /// Returns `Err(TryRecvError::Empty)` if nothing was published at this position yet,
    /// or `Err(TryRecvError::Closed)` if the sender is gone and everything was consumed.
    ///
    /// 尝试在不阻塞的情况下接收下一个值
    ///
    /// 如果此位置尚未发布任何值返回 `Err(TryRecvError::Empty)`，
    /// 如果发送器已消失且所有值都已消费返回 `Err(TryRecvError::Closed)`
    pub fn try_recv(&mut self) -> Result<Payload<T>, TryRecvError> {
        match self.cursor.take() {
            Some((block, index)) => Ok(Payload { block, index }),
            None => match self.cursor.state() {
                SlotState::Closed => Err(TryRecvError::Closed),
                // A fire between `take` and here is picked up by the next call.
                _ => Err(TryRecvError::Empty),
            },
        }
    }

    /// Blocking receive
    ///
    /// Parks the current thread until the value at this receiver's position is published,
    /// then returns it and advances. Do not call this from inside an async runtime; use
    /// [`Receiver::recv_async`] there.
    ///
    /// 阻塞接收
    ///
    /// 阻塞当前线程，直到此接收器位置上的值被发布，然后返回该值并前进。
    /// 不要在异步运行时中调用此方法；请改用 [`Receiver::recv_async`]。
    pub fn recv(&mut self) -> Result<Payload<T>, RecvError> {
        // Fast path: value already published
        match self.try_recv() {
            Ok(payload) => return Ok(payload),
            Err(TryRecvError::Closed) => return Err(RecvError),
            Err(TryRecvError::Empty) => {}
        }

        let parker = ThreadParker::current();
        let waker = Waker::from(parker.clone());
        let mut key = None;

        let result = loop {
            key = Some(self.cursor.inner().waiters.register(key, &waker));

            // Check again after registering waker
            match self.try_recv() {
                Ok(payload) => break Ok(payload),
                Err(TryRecvError::Closed) => break Err(RecvError),
                Err(TryRecvError::Empty) => {}
            }

            parker.park();
        };

        if let Some(key) = key {
            self.cursor.inner().waiters.remove(key);
        }
        result
    }

    /// Receive asynchronously
    ///
    /// Cancel safe: nothing is consumed unless the future completes.
    ///
    /// 异步接收
    ///
    /// 取消安全：除非 future 完成，否则不会消费任何值。
    ///
    /// # Examples
    ///
    /// ```
    /// use lite_broadcast::Sender;
    ///
    /// # tokio_test::block_on(async {
    /// let mut sender = Sender::new();
    /// let mut rx = sender.receiver();
    ///
    /// tokio::spawn(async move {
    ///     sender.send(7u32);
    /// });
    ///
    /// assert_eq!(*rx.recv_async().await.unwrap(), 7);
    /// # });
    /// ```
    pub async fn recv_async(&mut self) -> Result<Payload<T>, RecvError> {
        loop {
            self.wait_handle().await;
            match self.try_recv() {
                Ok(payload) => return Ok(payload),
                Err(TryRecvError::Closed) => return Err(RecvError),
                Err(TryRecvError::Empty) => {}
            }
        }
    }

    /// Future that resolves once the value at this receiver's position is published
    ///
    /// Meant for multiplexing with other event sources (`tokio::select!`, timers).
    /// Readiness consumes nothing: call [`Receiver::try_recv`] afterwards to take the
    /// value and advance. Also resolves when the stream is closed.
    ///
    /// 当此接收器位置上的值被发布时完成的 future
    ///
    /// 用于与其他事件源（`tokio::select!`、定时器）多路复用。就绪并不消费任何值：
    /// 之后需调用 [`Receiver::try_recv`] 取值并前进。流关闭时同样会完成。
    ///
    /// # Examples
    ///
    /// ```
    /// use lite_broadcast::Sender;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let sender = Sender::<u8>::new();
    /// let mut rx = sender.receiver();
    ///
    /// // Bounded wait built at the call site
    /// let waited = tokio::time::timeout(Duration::from_millis(10), rx.wait_handle()).await;
    /// assert!(waited.is_err());
    /// assert!(rx.try_recv().is_err());
    /// # });
    /// ```
    pub fn wait_handle(&self) -> WaitHandle<'_, T> {
        WaitHandle {
            receiver: self,
            key: None,
            waker: None,
        }
    }

    /// Whether the next `try_recv` would return without `Empty`
    ///
    /// 下一次 `try_recv` 是否不会返回 `Empty`
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.cursor.state() != SlotState::Open
    }

    /// Number of published values this receiver has not consumed yet
    ///
    /// 此接收器尚未消费的已发布值数量
    pub fn lag(&self) -> u64 {
        self.cursor
            .inner()
            .published
            .load(Ordering::Acquire)
            .saturating_sub(self.cursor.seq())
    }
}

impl<T> Clone for Receiver<T> {
    fn clone(&self) -> Self {
        Receiver::new(self.cursor.clone())
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        self.cursor.inner().receivers.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("seq", &self.cursor.seq())
            .finish_non_exhaustive()
    }
}

/// Future returned by [`Receiver::wait_handle`]
///
/// A handle holds at most one entry in the channel's waiter set, and dropping it
/// removes that entry, so racing it against a timer in a loop does not accumulate
/// wakers.
///
/// [`Receiver::wait_handle`] 返回的 Future
///
/// 每个句柄在通道的等待者集合中最多占一个条目，丢弃句柄即移除该条目，
/// 因此在循环中与定时器竞争不会累积 waker。
pub struct WaitHandle<'a, T> {
    receiver: &'a Receiver<T>,
    key: Option<u64>,
    waker: Option<Waker>,
}

impl<T> Future for WaitHandle<'_, T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        // Fast path: check if value ready or closed
        if this.receiver.is_ready() {
            return Poll::Ready(());
        }

        // Register only on first poll or when the task's waker changed
        let stale = match &this.waker {
            Some(waker) => !waker.will_wake(cx.waker()),
            None => true,
        };
        if stale {
            let waiters = &this.receiver.cursor.inner().waiters;
            this.key = Some(waiters.register(this.key, cx.waker()));
            this.waker = Some(cx.waker().clone());
        }

        // Check again after registering waker
        if this.receiver.is_ready() {
            return Poll::Ready(());
        }

        // Registration stays valid until the next fire, which also makes us ready
        Poll::Pending
    }
}

impl<T> Unpin for WaitHandle<'_, T> {}

impl<T> Drop for WaitHandle<'_, T> {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.receiver.cursor.inner().waiters.remove(key);
        }
    }
}

/// A received value, shared with every other receiver that reached the same node
///
/// Dereferences to the published `T`; nothing is cloned. Holding a `Payload` keeps the
/// block it lives in (and everything after it) in memory, like an unconsumed receiver.
///
/// 接收到的值，与到达同一节点的所有其他接收器共享
///
/// 解引用为已发布的 `T`，不会进行任何克隆。持有 `Payload` 会使其所在的块
/// （及其后的所有内容）保留在内存中，就像未消费的接收器一样。
pub struct Payload<T> {
    block: Arc<Block<T>>,
    index: usize,
}

impl<T> Payload<T> {
    /// Sequence number of this value in the publication order
    ///
    /// 此值在发布顺序中的序列号
    #[inline]
    pub fn seq(&self) -> u64 {
        self.block.base() + self.index as u64
    }

    /// Clone the value out, releasing the hold on the chain
    ///
    /// 克隆出值，释放对链的持有
    pub fn cloned(self) -> T
    where
        T: Clone,
    {
        (*self).clone()
    }
}

impl<T> Deref for Payload<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: a `Payload` is only built from a node observed fired.
        unsafe { self.block.slot(self.index).get() }
    }
}

impl<T> AsRef<T> for Payload<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> Clone for Payload<T> {
    fn clone(&self) -> Self {
        Self {
            block: self.block.clone(),
            index: self.index,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Payload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

impl<T: fmt::Display> fmt::Display for Payload<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&**self, f)
    }
}
