//! The boundary to the store collaborator.
//!
//! The wire protocol, pooling and cluster discovery all live behind these
//! traits. The algebra only needs to send a [`Request`], upload a script and
//! close the handle.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{Request, Response, Result};

/// A live handle to the store.
///
/// Methods take `&self`: one handle is shared by every operation running
/// against it, and the implementation owns whatever synchronisation it
/// needs.
///
/// # Object Safety
///
/// This trait is object-safe: the algebra holds an `Arc<dyn StoreClient>`.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Execute one request.
    async fn execute(&self, request: Request) -> Result<Response>;

    /// Upload script source under `name` (e.g. `sum_example.lua`),
    /// replacing any previous upload with that name.
    async fn upload_script(&self, source: Bytes, name: &str) -> Result<()>;

    /// Release the handle. Requests after close fail with
    /// `Error::Connection`.
    async fn close(&self) -> Result<()>;
}

/// Opens [`StoreClient`] handles.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: StoreClient + 'static;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Client>;
}

// Blanket implementations for shared and boxed clients

#[async_trait]
impl<T: StoreClient + ?Sized> StoreClient for Arc<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.as_ref().execute(request).await
    }

    async fn upload_script(&self, source: Bytes, name: &str) -> Result<()> {
        self.as_ref().upload_script(source, name).await
    }

    async fn close(&self) -> Result<()> {
        self.as_ref().close().await
    }
}

#[async_trait]
impl<T: StoreClient + ?Sized> StoreClient for Box<T> {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.as_ref().execute(request).await
    }

    async fn upload_script(&self, source: Bytes, name: &str) -> Result<()> {
        self.as_ref().upload_script(source, name).await
    }

    async fn close(&self) -> Result<()> {
        self.as_ref().close().await
    }
}
