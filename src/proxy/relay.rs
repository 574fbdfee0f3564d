//! Tunnel relay
//!
//! Copies bytes between the two ends of a CONNECT tunnel. Each direction is
//! its own task owning the read half of one stream and the write half of the
//! other. Whichever direction finishes first, for any reason, closes the
//! tunnel signal so the opposite direction stops too and every half is
//! dropped.

use log::debug;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Closure signal shared by the two directions of one tunnel
#[derive(Debug, Clone)]
pub struct TunnelSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl TunnelSignal {
    /// Create an open signal
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Mark the tunnel as closed, waking the other direction
    pub fn close(&self) {
        self.sender.send_replace(true);
    }

    /// Whether either direction has finished
    pub fn is_closed(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the tunnel is closed
    pub async fn closed(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so this cannot observe a dropped channel
        let _ = receiver.wait_for(|closed| *closed).await;
    }
}

impl Default for TunnelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the signal on every exit path, unwinding included
struct CloseOnDrop<'a>(&'a TunnelSignal);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Copy bytes from `source` into `destination` until `source` ends, either
/// side fails, or the tunnel is closed by the opposite direction
///
/// Both halves are owned and released when this returns.
///
/// # Returns
///
/// The number of bytes written to `destination`, or the I/O error that
/// ended the copy.
pub async fn relay<R, W>(
    mut source: R,
    mut destination: W,
    signal: TunnelSignal,
    buffer_size: usize,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let _close = CloseOnDrop(&signal);
    let mut total_bytes = 0u64;

    let copy = async {
        let mut buffer = vec![0u8; buffer_size];
        loop {
            let n = source.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            destination.write_all(&buffer[..n]).await?;
            total_bytes += n as u64;
        }
        destination.shutdown().await
    };

    let result = tokio::select! {
        result = copy => result,
        _ = signal.closed() => Ok(()),
    };

    match result {
        Ok(()) => {
            debug!("Relay finished after {} bytes", total_bytes);
            Ok(total_bytes)
        }
        Err(e) => {
            debug!("Relay stopped after {} bytes: {}", total_bytes, e);
            Err(e)
        }
    }
}

/// Decrements the active tunnel gauge once both directions are gone
struct ActiveTunnel;

impl ActiveTunnel {
    fn open() -> Arc<Self> {
        metrics::gauge!("proxy.tunnels.active").increment(1.0);
        Arc::new(Self)
    }
}

impl Drop for ActiveTunnel {
    fn drop(&mut self) {
        metrics::gauge!("proxy.tunnels.active").decrement(1.0);
    }
}

/// Handles to the two relay tasks of one tunnel
#[derive(Debug)]
pub struct TunnelHandle {
    /// Client to destination
    pub upstream: JoinHandle<io::Result<u64>>,
    /// Destination to client
    pub downstream: JoinHandle<io::Result<u64>>,
    signal: TunnelSignal,
}

impl TunnelHandle {
    /// Whether the tunnel has started shutting down
    pub fn is_closed(&self) -> bool {
        self.signal.is_closed()
    }

    /// Wait for both directions to terminate
    pub async fn join(self) -> (io::Result<u64>, io::Result<u64>) {
        let upstream = flatten(self.upstream.await);
        let downstream = flatten(self.downstream.await);
        (upstream, downstream)
    }
}

fn flatten(result: Result<io::Result<u64>, tokio::task::JoinError>) -> io::Result<u64> {
    result.unwrap_or_else(|e| Err(io::Error::new(io::ErrorKind::Other, e)))
}

/// Start relaying between `client` and `destination` in both directions
///
/// Returns immediately; dropping the handle leaves the tunnel running.
pub fn spawn_tunnel<C, D>(client: C, destination: D, buffer_size: usize) -> TunnelHandle
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    D: AsyncRead + AsyncWrite + Send + 'static,
{
    let (client_reader, client_writer) = tokio::io::split(client);
    let (dest_reader, dest_writer) = tokio::io::split(destination);
    let signal = TunnelSignal::new();
    let active = ActiveTunnel::open();

    let upstream = {
        let active = Arc::clone(&active);
        let signal = signal.clone();
        tokio::spawn(async move {
            let _active = active;
            relay(client_reader, dest_writer, signal, buffer_size).await
        })
    };

    let downstream = {
        let signal = signal.clone();
        tokio::spawn(async move {
            let _active = active;
            relay(dest_reader, client_writer, signal, buffer_size).await
        })
    };

    TunnelHandle {
        upstream,
        downstream,
        signal,
    }
}
