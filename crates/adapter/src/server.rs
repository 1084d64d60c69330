//! TCP server for remote control
//!
//! Serves one client at a time. Each connection gets a writer task, a dispatcher
//! task and the reader loop below; the next client is accepted only after the
//! previous one is gone.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};

use crate::core::SharedSession;
use crate::protocol::{normalize_line, BANNER};
use crate::runtime::{run_dispatcher, stop_requested, QueuedCommand};

/// Default control port
pub const DEFAULT_PORT: u16 = 12345;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let host = env::var("TETRIS_REMOTE_HOST")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = env::var("TETRIS_REMOTE_PORT")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Self { host, port }
    }

    /// Check if remote control is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("TETRIS_REMOTE_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Fail fast when `host:port` cannot be bound (for example, already in use)
pub fn check_tcp_listen_available(host: &str, port: u16) -> std::io::Result<()> {
    let listener = std::net::TcpListener::bind((host, port))?;
    drop(listener);
    Ok(())
}

/// Accept clients one at a time until shutdown is signalled.
///
/// `ready_tx` receives the bound address once listening (port 0 picks a free port).
pub async fn run_server(
    config: ServerConfig,
    session: SharedSession,
    mut shutdown: watch::Receiver<bool>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind remote control on {addr}"))?;
    let bound = listener.local_addr()?;
    tracing::info!(%bound, "remote control listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    loop {
        let (socket, peer) = tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break,
            accepted = listener.accept() => accepted?,
        };

        tracing::info!(%peer, "remote client connected");
        match serve_client(socket, session.clone(), shutdown.clone()).await {
            Ok(()) => tracing::info!(%peer, "remote client disconnected"),
            Err(e) => tracing::warn!(%peer, error = %e, "remote client error"),
        }
    }

    tracing::info!("remote control stopped");
    Ok(())
}

/// Serve a single connection until EOF, an I/O error, or shutdown
async fn serve_client(
    socket: TcpStream,
    session: SharedSession,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    // Channel to send reply lines to this client
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

    let write_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if writer.write_all(msg.as_bytes()).await.is_err() {
                break;
            }
            if writer.write_all(b"\n").await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
        let _ = writer.shutdown().await;
    });

    for line in BANNER {
        let _ = out_tx.send(line.to_string());
    }

    let (queue_tx, queue_rx) = mpsc::unbounded_channel::<QueuedCommand>();
    let dispatcher = tokio::spawn(run_dispatcher(
        session.clone(),
        queue_rx,
        out_tx,
        shutdown.clone(),
    ));

    // Raw bytes: a line that is not UTF-8 still gets an error reply
    let mut line = Vec::new();
    let result = loop {
        line.clear();
        let bytes_read = tokio::select! {
            biased;
            _ = stop_requested(&mut shutdown) => break Ok(()),
            read = reader.read_until(b'\n', &mut line) => match read {
                Ok(n) => n,
                Err(e) => break Err(e),
            },
        };

        if bytes_read == 0 {
            // Client disconnected
            break Ok(());
        }

        let command = normalize_line(&String::from_utf8_lossy(&line));
        if command.is_empty() {
            continue;
        }

        let queued = QueuedCommand {
            episode_id: session.episode_id(),
            line: command,
        };
        if queue_tx.send(queued).is_err() {
            break Ok(());
        }
    };

    // Closing the queue lets the dispatcher finish what is already queued.
    drop(queue_tx);
    match dispatcher.await {
        Ok(stats) => tracing::debug!(
            executed = stats.executed,
            stale = stats.stale,
            "remote dispatcher finished"
        ),
        Err(e) => tracing::warn!(error = %e, "remote dispatcher panicked"),
    }
    let _ = write_task.await;

    result.context("remote client read failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 12345);
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:12345".parse().unwrap()
        );
    }

    #[test]
    fn test_invalid_host_is_an_error() {
        let config = ServerConfig {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(config.socket_addr().is_err());
    }
}
