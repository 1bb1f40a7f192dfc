//! The panel's network service.
//!
//! Each instance reads the listener settings from the store when it starts,
//! binds `listen:port`, and answers connections on a background task until
//! stopped. Requests under the base path get a plain status reply; anything
//! else gets a 404.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use xray_ui_core::{FileStore, PANEL_NAME, PANEL_VERSION, PanelStore};

use crate::error::{ServerError, ServerResult};
use crate::service::Service;

/// Store handle shared between the supervisor and service instances.
pub type SharedStore = Arc<RwLock<FileStore>>;

/// Largest request head read before answering.
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// Time allowed for a client to send its request head.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Panel service instance.
pub struct PanelServer {
    store: SharedStore,
    running: Option<Running>,
}

struct Running {
    addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PanelServer {
    /// Creates a stopped instance backed by `store`.
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            running: None,
        }
    }

    /// Returns the bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.addr)
    }
}

impl Service for PanelServer {
    async fn start(&mut self) -> ServerResult<()> {
        if self.running.is_some() {
            return Ok(());
        }

        let settings = {
            let mut store = self.store.write().await;
            store.refresh()?;
            store.settings()?
        };

        let addr = bind_address(&settings.web_listen, settings.web_port);
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let base_path: Arc<str> = Arc::from(settings.web_base_path.as_str());
        let task = tokio::spawn(accept_loop(listener, base_path, shutdown_rx));

        info!(
            addr = %local,
            base_path = %settings.web_base_path,
            "Panel listening"
        );

        self.running = Some(Running {
            addr: local,
            shutdown_tx,
            task,
        });
        Ok(())
    }

    async fn stop(&mut self) -> ServerResult<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        let _ = running.shutdown_tx.send(true);
        running
            .task
            .await
            .map_err(|e| ServerError::service(format!("accept loop failed: {e}")))?;

        info!(addr = %running.addr, "Panel listener closed");
        Ok(())
    }
}

/// Formats the socket address to bind. An empty listen means all interfaces.
fn bind_address(listen: &str, port: u16) -> String {
    if listen.is_empty() {
        format!("0.0.0.0:{port}")
    } else if listen.contains(':') && !listen.starts_with('[') {
        format!("[{listen}]:{port}")
    } else {
        format!("{listen}:{port}")
    }
}

async fn accept_loop(
    listener: TcpListener,
    base_path: Arc<str>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let base_path = base_path.clone();
                    tokio::spawn(async move {
                        if let Err(e) = respond(stream, &base_path).await {
                            debug!(peer = %peer, error = %e, "Connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            },
            _ = shutdown.changed() => break,
        }
    }

    debug!("Accept loop stopped");
}

async fn respond(mut stream: TcpStream, base_path: &str) -> std::io::Result<()> {
    let head = match tokio::time::timeout(READ_TIMEOUT, read_head(&mut stream)).await {
        Ok(head) => head?,
        Err(_) => return Ok(()),
    };

    let (status, body) = match request_path(&head) {
        Some(path) if under_base_path(path, base_path) => {
            ("200 OK", format!("{PANEL_NAME} {PANEL_VERSION}\n"))
        }
        Some(_) => ("404 Not Found", "not found\n".to_string()),
        None => ("400 Bad Request", "bad request\n".to_string()),
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

async fn read_head(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_HEAD {
            break;
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Extracts the path from the request line, without its query string.
fn request_path(head: &str) -> Option<&str> {
    let line = head.lines().next()?;
    let mut parts = line.split_whitespace();
    let _method = parts.next()?;
    let target = parts.next()?;
    parts.next().filter(|v| v.starts_with("HTTP/"))?;
    Some(target.split('?').next().unwrap_or(target))
}

fn under_base_path(path: &str, base_path: &str) -> bool {
    path.starts_with(base_path) || path == base_path.trim_end_matches('/')
}
