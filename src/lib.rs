//! # lite-broadcast
//!
//! Unbounded multicast broadcast channel for Rust.
//!
//! 无界多播广播通道。
//!
//! ## Overview / 概述
//!
//! One writer publishes a sequence of values. Any number of receivers, created at any
//! time, each observe every value published after their creation, in order, exactly once.
//! There is no capacity limit and no receiver ever blocks another receiver or the sender.
//!
//! 一个写者发布一系列值。任意数量、在任意时刻创建的接收器，都会按顺序、恰好一次地
//! 观察到其创建之后发布的每一个值。没有容量限制，接收器之间互不阻塞，也不会阻塞发送器。
//!
//! ## Key Features / 主要特性
//!
//! - **Zero-copy fan-out**: values are stored once and handed out as [`Payload`] references
//! - **Lock-free single writer**: [`Sender::send`] is a write plus one atomic store
//! - **Block allocation**: nodes are allocated 32 at a time and reclaimed as soon as the
//!   slowest receiver moves past them
//! - **Blocking and async**: [`Receiver::recv`] parks the thread, [`Receiver::wait_handle`]
//!   plugs into `tokio::select!`
//!
//! - **零拷贝扇出**：值只存储一次，以 [`Payload`] 引用的形式分发
//! - **无锁单写者**：[`Sender::send`] 只需一次写入加一次原子存储
//! - **块分配**：节点每次分配 32 个，最慢的接收器越过后立即回收
//! - **阻塞与异步**：[`Receiver::recv`] 阻塞线程，[`Receiver::wait_handle`] 可用于 `tokio::select!`
//!
//! ## Examples / 示例
//!
//! ### Fan-out to many threads
//!
//! ```
//! use lite_broadcast::Sender;
//!
//! let mut sender = Sender::new();
//! let handles: Vec<_> = (0..8)
//!     .map(|_| {
//!         let mut rx = sender.receiver();
//!         std::thread::spawn(move || {
//!             (0..10).map(|_| *rx.recv().unwrap()).collect::<Vec<u32>>()
//!         })
//!     })
//!     .collect();
//!
//! for i in 0..10 {
//!     sender.send(i);
//! }
//!
//! for handle in handles {
//!     assert_eq!(handle.join().unwrap(), (0..10).collect::<Vec<_>>());
//! }
//! ```
//!
//! ### Many publishers
//!
//! ```
//! use lite_broadcast::SharedSender;
//!
//! # tokio_test::block_on(async {
//! let shared = SharedSender::new();
//! let mut rx = shared.receiver();
//!
//! let publisher = shared.clone();
//! tokio::spawn(async move {
//!     publisher.send("hello".to_string());
//! });
//!
//! assert_eq!(*rx.recv_async().await.unwrap(), "hello");
//! # });
//! ```
//!
//! ## Caveats / 注意事项
//!
//! - **Retention**: a receiver that stops receiving keeps every later value in memory.
//!   Drop receivers you no longer poll; watch [`Stats::retained`] and [`Receiver::lag`].
//! - **Sentinels**: every value is a legitimate payload, including `None` or an empty
//!   string. Dropping the sender is the built-in end-of-stream signal.
//! - **Sharing**: receivers get `&T`, never a copy. Values with interior mutability are
//!   observed by every receiver after mutation.
//!
//! - **保留**：停止接收的接收器会使其后的所有值留在内存中。
//!   不再轮询的接收器请及时丢弃；可观察 [`Stats::retained`] 与 [`Receiver::lag`]。
//! - **哨兵值**：每个值都是合法载荷，包括 `None` 或空字符串。丢弃发送器才是内建的流结束信号。
//! - **共享**：接收器得到的是 `&T`，而非副本。具有内部可变性的值被修改后，所有接收器都会看到。

mod cursor;
mod node;
mod receiver;
mod sender;
mod shared;
mod shim;
mod waiters;

pub mod error;

pub use error::{RecvError, TryRecvError};
pub use receiver::{Payload, Receiver, WaitHandle};
pub use sender::{Sender, Stats};
pub use shared::SharedSender;
