//! TCP listener and hub bootstrap

use crate::client_manager::ConnectionId;
use crate::config::ServerConfig;
use crate::connection::serve_connection;
use crate::hub::{Hub, HubMessage};
use log::{error, info};
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Accepts connections and runs the hub that serves them
pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until Ctrl+C.
    pub async fn run(self) -> ServerResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await
    }

    /// Serves until `shutdown` completes, then stops the hub, which closes
    /// every open connection.
    pub async fn run_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()>,
    {
        let Server { listener, config } = self;
        let (hub_tx, hub_rx) = mpsc::channel(config.hub_queue);
        let hub_handle = tokio::spawn(Hub::new(&config).run(hub_rx));

        let mut next_conn: ConnectionId = 1;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let conn = next_conn;
                        next_conn += 1;
                        tokio::spawn(serve_connection(
                            stream,
                            addr,
                            conn,
                            hub_tx.clone(),
                            config.clone(),
                        ));
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping listener");
                    break;
                }
            }
        }

        if hub_tx.send(HubMessage::Shutdown).await.is_err() {
            error!("Hub already stopped");
        }
        hub_handle.await?;
        Ok(())
    }
}
