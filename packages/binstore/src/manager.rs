use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use binstore_core::{ClientConfig, Connector, Error, Result, StoreClient};
use tracing::info;

/// Owns the store handle operations run against.
///
/// Cheap to clone; every clone shares one handle and one closed flag. Once
/// [`close`](Self::close) has been called, every run that reaches the store
/// fails with `Error::Connection`.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    client: Arc<dyn StoreClient>,
    config: ClientConfig,
    closed: AtomicBool,
}

impl ConnectionManager {
    /// Open a handle through `connector` at the configured host and port.
    pub async fn connect<C: Connector>(connector: &C, config: ClientConfig) -> Result<Self> {
        info!(host = %config.host, port = config.port, "connecting");
        let client = connector.connect(&config.host, config.port).await?;
        Ok(Self::with_config(client, config))
    }

    /// Wrap an already-open handle, with default configuration.
    pub fn from_client(client: impl StoreClient + 'static) -> Self {
        Self::with_config(client, ClientConfig::default())
    }

    pub fn with_config(client: impl StoreClient + 'static, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                client: Arc::new(client),
                config,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Release the handle. Closing twice is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(host = %self.inner.config.host, "closing connection");
        self.inner.client.close().await
    }

    pub(crate) fn client(&self) -> Result<Arc<dyn StoreClient>> {
        if self.is_closed() {
            return Err(Error::connection("connection manager is closed"));
        }
        Ok(Arc::clone(&self.inner.client))
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use binstore_memory::MemoryStore;

    use super::*;
    use crate::{ops, Key};

    #[tokio::test]
    async fn connect_uses_the_configured_address() {
        let store = MemoryStore::new();
        let config = ClientConfig::new("10.0.0.7", 3100);
        let manager = ConnectionManager::connect(&store.connector(), config)
            .await
            .unwrap();
        assert_eq!(manager.config().port, 3100);
        assert!(!manager.is_closed());
    }

    #[tokio::test]
    async fn closed_manager_refuses_runs() {
        let store = MemoryStore::new();
        let manager = ConnectionManager::from_client(store.client());
        let key = Key::new("test", "m", "k").unwrap();

        manager.close().await.unwrap();
        manager.close().await.unwrap();
        assert!(manager.is_closed());

        let err = ops::exists(&key).run(&manager).await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn clones_share_the_closed_flag() {
        let manager = ConnectionManager::from_client(MemoryStore::new().client());
        let other = manager.clone();
        manager.close().await.unwrap();
        assert!(other.is_closed());
    }
}
