use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::warn;

use crate::http::fault::ProtocolFault;
use crate::proxy::router::Target;

/// Bounds concurrent outbound connects and applies the connect timeout.
///
/// Sessions run one task per connection, so per-connection ordering needs
/// no further machinery; the gate only caps how many origin connects can
/// be in flight across the whole proxy. Cloning shares the permit pool.
#[derive(Debug, Clone)]
pub struct ConnectGate {
    permits: Arc<Semaphore>,
    timeout: Duration,
}

impl ConnectGate {
    pub fn new(limit: usize, connect_timeout: Duration) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.max(1))),
            timeout: connect_timeout,
        }
    }

    /// Opens a TCP connection to `target`.
    ///
    /// The timeout covers both waiting for a permit and the connect
    /// itself; elapsing yields GATEWAY_TIMEOUT, while a refused or
    /// unreachable target yields BAD_GATEWAY. The permit is released as
    /// soon as the attempt resolves.
    pub async fn connect(&self, target: &Target) -> Result<TcpStream, ProtocolFault> {
        let attempt = async {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| io::Error::other("connect gate closed"))?;
            TcpStream::connect(target.addr()).await
        };

        match timeout(self.timeout, attempt).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => {
                warn!(target = %target, error = %e, "origin connect failed");
                Err(ProtocolFault::bad_gateway("origin connect failed"))
            }
            Err(_) => {
                warn!(
                    target = %target,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "origin connect timed out"
                );
                Err(ProtocolFault::gateway_timeout("origin connect timed out"))
            }
        }
    }
}
