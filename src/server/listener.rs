use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{Instrument, info, info_span, warn};

use crate::config::Config;
use crate::error::{ConnectionError, ServerError, ServerResult};
use crate::http::connection::{Connection, ConnectionSettings};

/// A bound listening endpoint.
pub struct Server {
    listener: TcpListener,
    settings: Arc<ConnectionSettings>,
    limit: Option<Arc<Semaphore>>,
}

impl Server {
    pub async fn bind(cfg: &Config) -> ServerResult<Self> {
        if cfg.server.max_connections == Some(0) {
            return Err(ServerError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        let addr = cfg.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(Self {
            listener,
            settings: Arc::new(ConnectionSettings::from_config(cfg)),
            limit: cfg
                .server
                .max_connections
                .map(|n| Arc::new(Semaphore::new(n))),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until `accept` fails irrecoverably.
    ///
    /// Every connection runs in its own task; the loop never waits for one,
    /// except for a free slot when `max_connections` is configured.
    pub async fn serve(self) -> ServerResult<()> {
        loop {
            let permit = match &self.limit {
                Some(limit) => match limit.clone().acquire_owned().await {
                    Ok(permit) => Some(permit),
                    // The semaphore is never closed
                    Err(_) => None,
                },
                None => None,
            };

            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) if is_transient(&e) => {
                    warn!(error = %e, "Dropped connection during accept");
                    continue;
                }
                Err(e) => return Err(ServerError::Accept(e)),
            };
            info!("Connection from {}", peer);

            let settings = self.settings.clone();
            let span = info_span!("conn", %peer);
            tokio::spawn(
                async move {
                    let mut conn = Connection::new(socket, settings);
                    match conn.run().await {
                        Ok(()) => {}
                        Err(ConnectionError::Malformed) => {
                            warn!("Malformed request line, closing without response")
                        }
                        Err(e) => warn!(error = %e, "Connection aborted"),
                    }
                    drop(conn);
                    drop(permit);
                    info!("Connection closed");
                }
                .instrument(span),
            );
        }
    }
}

fn is_transient(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::ConnectionAborted | ErrorKind::ConnectionReset | ErrorKind::Interrupted
    )
}

/// Binds the configured address and serves until the listener fails.
///
/// Fatal errors are returned unlogged; the caller reports them.
pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let server = Server::bind(cfg).await?;
    let port = server.local_addr()?.port();
    info!("Listening on port {}", port);

    server.serve().await?;
    Ok(())
}
