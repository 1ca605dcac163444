//! Clients and connector over a [`MemoryStore`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use binstore_core::{Connector, Error, Request, Response, Result, StoreClient};
use bytes::Bytes;
use tracing::debug;

use crate::MemoryStore;

/// One handle onto a [`MemoryStore`].
///
/// Closing a client does not touch the data; other clients on the same
/// store keep working.
pub struct MemoryClient {
    store: MemoryStore,
    closed: AtomicBool,
}

impl MemoryClient {
    pub(crate) fn new(store: MemoryStore) -> Self {
        Self {
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// The store this client talks to.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::connection("client is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.ensure_open()?;
        self.store.handle(request)
    }

    async fn upload_script(&self, source: Bytes, name: &str) -> Result<()> {
        self.ensure_open()?;
        self.store.upload(source, name)
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("memory client closed");
        }
        Ok(())
    }
}

/// Hands out [`MemoryClient`]s for one store, whatever the address.
///
/// [`MemoryConnector::unreachable`] refuses every connection, for exercising
/// connection failures.
#[derive(Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    reachable: bool,
}

impl MemoryConnector {
    pub(crate) fn new(store: MemoryStore) -> Self {
        Self {
            store,
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            store: MemoryStore::new(),
            reachable: false,
        }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    type Client = MemoryClient;

    async fn connect(&self, host: &str, port: u16) -> Result<MemoryClient> {
        if !self.reachable {
            return Err(Error::connection(format!(
                "cannot reach {}:{}",
                host, port
            )));
        }
        debug!(host, port, "connected to memory store");
        Ok(self.store.client())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binstore_core::{Key, Value};
    use collection_literals::btree;

    #[tokio::test]
    async fn clients_share_data() {
        let store = MemoryStore::new();
        let connector = store.connector();
        let first = connector.connect("localhost", 3000).await.unwrap();
        let second = connector.connect("localhost", 3000).await.unwrap();
        let key = Key::new("test", "s", "k").unwrap();

        first
            .execute(Request::Put {
                key: key.clone(),
                bins: btree! { "a".to_string() => Value::from(1i64) },
                policy: Default::default(),
            })
            .await
            .unwrap();
        first.close().await.unwrap();

        let response = second.execute(Request::Exists { key: key.clone() }).await.unwrap();
        assert_eq!(response, Response::Exists(true));
        assert!(matches!(
            first.execute(Request::Exists { key }).await,
            Err(Error::Connection { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_connector_fails() {
        let result = MemoryConnector::unreachable().connect("db", 3000).await;
        assert!(matches!(result, Err(Error::Connection { .. })));
    }

    #[tokio::test]
    async fn upload_after_close_fails() {
        let client = MemoryStore::new().client();
        client.close().await.unwrap();
        let result = client
            .upload_script(Bytes::from_static(b"x"), "x.lua")
            .await;
        assert!(matches!(result, Err(Error::Connection { .. })));
        assert!(!client.store().has_script("x.lua"));
    }
}
