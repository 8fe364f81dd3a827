//! TCP listener and accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use slidesync_config::SlideSyncConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;

use crate::autoplay::AutoPlayPolicy;
use crate::connection::{handle_connection, ConnectionSettings};
use crate::error::ServerError;
use crate::hub::{Hub, HubHandle};
use crate::store::PresentationStore;

/// A bound sync server with its hub already running.
pub struct Server {
    listener: TcpListener,
    hub: HubHandle,
    hub_task: JoinHandle<()>,
    settings: ConnectionSettings,
}

impl Server {
    /// Bind the listener described by `config.server` and start the hub.
    ///
    /// Port `0` picks a free port; use [`Server::local_addr`] to find it.
    pub async fn bind(config: &SlideSyncConfig) -> Result<Self, ServerError> {
        let policy = AutoPlayPolicy::from_config(&config.presentation)?;

        let addr = config.server.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.clone(), e))?;

        let (hub, hub_task) = Hub::spawn(PresentationStore::new(policy));
        let settings = ConnectionSettings {
            idle_timeout: Duration::from_secs(config.server.idle_timeout_secs),
            outbound_buffer: config.server.outbound_buffer,
        };

        Ok(Self {
            listener,
            hub,
            hub_task,
            settings,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Handle to the running hub, for inspecting state from outside.
    pub fn hub(&self) -> HubHandle {
        self.hub.clone()
    }

    /// Accept connections until `shutdown` resolves, then stop the hub and
    /// wait for it to finish. Open connections close once the hub is gone.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            listener,
            hub,
            hub_task,
            settings,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "slidesync-server listening");
        }

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let hub = hub.clone();
                        tokio::spawn(async move {
                            match accept_async(stream).await {
                                Ok(ws) => handle_connection(ws, addr, hub, settings).await,
                                Err(e) => {
                                    tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                                }
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "TCP accept error");
                    }
                },
            }
        }

        drop(listener);
        hub.shutdown().await;
        if let Err(e) = hub_task.await {
            tracing::warn!(error = %e, "Hub task ended abnormally");
        }
        Ok(())
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<(), ServerError> {
        self.serve_with_shutdown(std::future::pending()).await
    }
}
