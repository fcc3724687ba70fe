//! Broadcast error types.
//!
//! 广播错误类型。

use std::fmt;

/// Error returned by `recv` once the sender is gone and every published value was consumed
///
/// 当发送器已被丢弃且所有已发布的值都已被消费时，`recv` 返回的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecvError;

impl fmt::Display for RecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel closed")
    }
}

impl std::error::Error for RecvError {}

/// Error returned from `try_recv`
///
/// `try_recv` 返回的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// Nothing published at the receiver's position yet
    ///
    /// 接收器当前位置尚未发布任何值
    Empty,
    /// The sender was dropped and everything published has been consumed
    ///
    /// 发送器已被丢弃，且所有已发布的值都已被消费
    Closed,
}

impl fmt::Display for TryRecvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryRecvError::Empty => write!(f, "channel empty"),
            TryRecvError::Closed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TryRecvError {}

impl From<RecvError> for TryRecvError {
    fn from(_: RecvError) -> Self {
        TryRecvError::Closed
    }
}
