use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::proxy::connect::ConnectGate;
use crate::proxy::router::Resolve;
use crate::proxy::session::Session;

/// Handle to a running proxy service.
///
/// The accept loop runs on its own task; each accepted connection gets a
/// [`Session`] task of its own, so a stalled connection never delays the
/// others.
pub struct Server {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Server {
    /// Binds the listen socket and starts the accept loop on the runtime.
    pub async fn bind(config: &Config, resolver: Arc<dyn Resolve>) -> Result<Server> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", config.listen_addr))?;
        let local_addr = listener
            .local_addr()
            .context("listener has no local address")?;
        let gate = ConnectGate::new(config.max_connects, config.connect_timeout());
        let (shutdown, shutdown_rx) = watch::channel(false);

        info!(addr = %local_addr, "listening");
        let handle = tokio::spawn(accept_loop(listener, resolver, gate, shutdown_rx));

        Ok(Server {
            local_addr,
            shutdown,
            handle,
        })
    }

    /// Address the listener actually bound, useful with a `:0` port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting, tears down remaining sessions, and waits for the
    /// accept loop to fully exit before returning.
    pub async fn stop(self) -> Result<()> {
        let _ = self.shutdown.send(true);
        self.handle.await.context("accept loop panicked")
    }
}

async fn accept_loop(
    listener: TcpListener,
    resolver: Arc<dyn Resolve>,
    gate: ConnectGate,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut sessions: JoinSet<()> = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "accepted connection");
                        let session =
                            Session::new(stream, peer, Arc::clone(&resolver), gate.clone());
                        sessions.spawn(async move {
                            if let Err(e) = session.run().await {
                                error!(peer = %peer, error = %e, "session failed");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                }
            }
            Some(finished) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = finished {
                    error!(error = %e, "session task aborted");
                }
            }
        }
    }

    debug!(open_sessions = sessions.len(), "shutting down");
    sessions.shutdown().await;
}
