//! # Session Manager
//!
//! TCP listener, per-connection session tasks, the shared registry and the
//! KeepAlive broadcast.
//!
//! ## Tasks
//! - One accept loop
//! - One reader and one writer task per connection
//! - One periodic KeepAlive task
//!
//! Every task observes a child of the server's `CancellationToken`; shutdown cancels
//! the root and waits up to `shutdown_timeout` for sessions to drain.

pub mod context;
pub mod keepalive;
pub mod registry;
pub mod session;

pub use context::ServerContext;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ServerSettings;
use crate::error::Result;

/// Poll interval while waiting for sessions to close at shutdown.
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct Server {
    ctx: Arc<ServerContext>,
}

impl Server {
    pub fn new(settings: ServerSettings) -> Self {
        Self::with_context(Arc::new(ServerContext::new(settings)))
    }

    pub fn with_context(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> Arc<ServerContext> {
        self.ctx.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let address = &self.ctx.settings().server.address;
        let listener = TcpListener::bind(address).await?;
        info!(address = %listener.local_addr()?, "Listening");
        Ok(listener)
    }

    /// Run until Ctrl-C.
    #[instrument(skip(self), fields(address = %self.ctx.settings().server.address))]
    pub async fn start(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        self.start_with_shutdown(shutdown_rx).await
    }

    /// Bind and run until a message arrives on `shutdown_rx`.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.ctx.settings().server.address))]
    pub async fn start_with_shutdown(self, shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_rx).await
    }

    /// Accept on an already bound listener until a message arrives on `shutdown_rx`.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<()> {
        let ctx = self.ctx;
        let config = &ctx.settings().server;
        let root = CancellationToken::new();

        tokio::spawn(keepalive::run_keepalive(
            ctx.clone(),
            config.keepalive_interval,
            root.child_token(),
        ));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server. Waiting for connections to close...");
                    root.cancel();
                    drain_sessions(&ctx, config.shutdown_timeout).await;
                    ctx.metrics().log_metrics();
                    return Ok(());
                }

                accepted = listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                            continue;
                        }
                    };

                    let active = ctx.metrics().connections_active.load(Ordering::Relaxed);
                    if active >= config.max_connections as u64 {
                        warn!(peer = %addr, active, "Connection limit reached, rejecting");
                        ctx.metrics().connection_rejected();
                        drop(stream);
                        continue;
                    }

                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(peer = %addr, error = %e, "Failed to set TCP_NODELAY");
                    }

                    debug!(peer = %addr, "Accepted connection");
                    ctx.metrics().connection_established();

                    let session_ctx = ctx.clone();
                    let token = root.child_token();
                    tokio::spawn(async move {
                        session::run_session(stream, addr, session_ctx.clone(), token).await;
                        session_ctx.metrics().connection_closed();
                    });
                }
            }
        }
    }
}

async fn drain_sessions(ctx: &ServerContext, timeout: Duration) {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        let active = ctx.metrics().connections_active.load(Ordering::Relaxed);
        if active == 0 {
            info!("All connections closed, shutting down");
            return;
        }

        tokio::select! {
            _ = &mut deadline => {
                warn!(active, "Shutdown timeout reached, forcing exit");
                return;
            }
            _ = tokio::time::sleep(DRAIN_POLL_INTERVAL) => {
                debug!(active, "Waiting for connections to close");
            }
        }
    }
}
