//! Line-oriented TCP chat relay built on a process-wide `SharedSender`.
//!
//! Every line a client types is broadcast to every other connected client.
//!
//! ```text
//! cargo run --example relay -- 127.0.0.1:6666
//! nc 127.0.0.1 6666
//! ```
//!
//! The listen address comes from the first argument, then `RELAY_ADDR`, then defaults to
//! `127.0.0.1:6666`. Log level follows `RUST_LOG` (default `info`).

use std::fmt;
use std::net::SocketAddr;

use anyhow::Context;
use lite_broadcast::{Receiver, SharedSender, TryRecvError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:6666";

/// One broadcast line, tagged with the connection it came from
#[derive(Debug)]
struct Line {
    from: SocketAddr,
    text: String,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("RELAY_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "relay listening");

    let lines = SharedSender::<Line>::new();

    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        // Subscribe before announcing so the connection sees everything after its join.
        let rx = lines.receiver();
        let lines = lines.clone();

        tokio::spawn(async move {
            if let Err(err) = serve(stream, peer, &lines, rx).await {
                tracing::warn!(%peer, error = %err, "connection ended with error");
            }
            lines.send(Line {
                from: peer,
                text: format!("Lost connection from: {peer}"),
            });
            tracing::info!(%peer, stats = ?lines.stats(), "connection closed");
        });
    }
}

async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    lines: &SharedSender<Line>,
    mut rx: Receiver<Line>,
) -> anyhow::Result<()> {
    tracing::info!(%peer, "connection opened");
    lines.send(Line {
        from: peer,
        text: format!("New connection from: {peer}"),
    });

    let (read_half, mut write_half) = stream.into_split();
    let mut incoming = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            _ = rx.wait_handle() => {
                let line = match rx.try_recv() {
                    Ok(line) => line,
                    Err(TryRecvError::Empty) => continue,
                    Err(TryRecvError::Closed) => return Ok(()),
                };
                if line.from == peer {
                    continue;
                }
                write_half.write_all(format!("{line}\r\n").as_bytes()).await?;
            }
            read = incoming.next_line() => {
                match read? {
                    Some(text) => lines.send(Line {
                        from: peer,
                        text: format!("{peer} sez: {text}"),
                    }),
                    None => return Ok(()),
                }
            }
        }
    }
}
