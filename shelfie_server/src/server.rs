use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::connection::{drive_connection, wait_until_set};
use crate::{local_link, tcp_link, ConnectionId, Link, LocalClient, Lobby, ServerConfig};

/// Accepts connections over any transport and hands them to the lobby.
#[derive(Clone)]
pub struct Server {
    lobby: Lobby,
    shutdown: watch::Receiver<bool>,
    next_conn: Arc<AtomicU64>,
}

impl Server {
    /// Also returns the switch that shuts the server down: send `true` to stop
    /// accepting and close every connection.
    pub fn new(config: ServerConfig) -> (Self, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = Self {
            lobby: Lobby::new(config),
            shutdown: shutdown_rx,
            next_conn: Arc::new(AtomicU64::new(0)),
        };
        (server, shutdown_tx)
    }

    pub fn connect(&self, link: Link) -> JoinHandle<()> {
        let conn = ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed));
        tokio::spawn(drive_connection(
            conn,
            link,
            self.lobby.clone(),
            self.shutdown.clone(),
        ))
    }

    /// Connects a client living in the same process.
    pub fn connect_local(&self, nickname: &str, session_id: &str) -> LocalClient {
        let (link, client) = local_link(nickname, session_id);
        self.connect(link);
        client
    }

    /// Accepts TCP clients until the server is shut down.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        info!(address = %listener.local_addr()?, "Listening");
        let mut shutdown = self.shutdown.clone();
        loop {
            tokio::select! {
                _ = wait_until_set(&mut shutdown) => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "Accepted connection");
                        self.connect(tcp_link(stream));
                    }
                    Err(err) => warn!(%err, "Could not accept connection"),
                },
            }
        }
        info!("Stopped listening");
        Ok(())
    }
}
