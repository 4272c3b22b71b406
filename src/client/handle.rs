//! Handle to a started client.

use std::net::SocketAddr;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::listener::{ListenerError, ListenerHandle};

/// Owns everything [`Client::start`](super::Client::start) spawned.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) leaves
/// the listener and the stats loop running in the background.
#[derive(Debug)]
pub struct ClientHandle {
    listener: Option<ListenerHandle>,
    stats: Option<JoinHandle<()>>,
    token: CancellationToken,
}

impl ClientHandle {
    pub(crate) const fn new(
        listener: Option<ListenerHandle>,
        stats: Option<JoinHandle<()>>,
        token: CancellationToken,
    ) -> Self {
        Self {
            listener,
            stats,
            token,
        }
    }

    /// Address of the running listener, if one was configured.
    #[must_use]
    pub fn listener_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().map(ListenerHandle::local_addr)
    }

    /// Returns true if the stats loop was started.
    #[must_use]
    pub const fn is_reporting_stats(&self) -> bool {
        self.stats.is_some()
    }

    /// Token that stops the client when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancels the stats loop, shuts the listener down and waits for both.
    ///
    /// # Errors
    ///
    /// Returns the listener's error if it did not stop cleanly.
    pub async fn shutdown(self) -> Result<(), ListenerError> {
        self.token.cancel();

        if let Some(stats) = self.stats {
            if let Err(e) = stats.await {
                tracing::warn!("Stats loop ended abnormally: {e}");
            }
        }

        if let Some(listener) = self.listener {
            listener.shutdown().await?;
        }

        tracing::info!("Diffcord client stopped");
        Ok(())
    }
}
