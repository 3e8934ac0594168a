//! Async wrapper around [`CatalogClient`] for use in async runtimes (Tokio, etc.).
//!
//! Validation and serialization are pure and fast, so they run inline. The
//! blocking HTTP send runs on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the event loop free.
//!
//! # Example
//!
//! ```no_run
//! use jewelry_catalog_sdk::models::ProductCategory;
//! use jewelry_catalog_sdk::AsyncCatalogClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = AsyncCatalogClient::builder().build().await.unwrap();
//!     let draft = client.new_draft(ProductCategory::NaturalDiamond);
//!     let result = client.submit(&draft).await;
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{CatalogError, Result};
use crate::models::{ProductCategory, ProductDraft};
use crate::transport::{SubmitReceipt, Transport};
use crate::{CatalogClient, CatalogClientBuilder, ValidationErrors};

// ---------------------------------------------------------------------------
// AsyncCatalogClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncCatalogClient`].
#[derive(Default)]
pub struct AsyncCatalogClientBuilder {
    inner: CatalogClientBuilder,
}

impl AsyncCatalogClientBuilder {
    /// Set the API base URL.
    pub fn base_url(mut self, url: &str) -> Self {
        self.inner = self.inner.base_url(url);
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    /// Bearer token sent with every submit.
    pub fn auth_token(mut self, token: &str) -> Self {
        self.inner = self.inner.auth_token(token);
        self
    }

    /// Largest attachment a draft from this client accepts, in bytes.
    pub fn max_attachment_bytes(mut self, limit: u64) -> Self {
        self.inner = self.inner.max_attachment_bytes(limit);
        self
    }

    /// Replace the accepted attachment MIME types.
    pub fn allowed_mime_types(mut self, types: &[&str]) -> Self {
        self.inner = self.inner.allowed_mime_types(types);
        self
    }

    /// Use a custom transport instead of the HTTP one.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.inner = self.inner.transport(transport);
        self
    }

    /// Build the client. The blocking HTTP client is constructed on the
    /// blocking thread pool.
    pub async fn build(self) -> Result<AsyncCatalogClient> {
        tokio::task::spawn_blocking(move || {
            let client = self.inner.build()?;
            Ok(AsyncCatalogClient {
                inner: Arc::new(client),
            })
        })
        .await
        .map_err(|e| CatalogError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncCatalogClient
// ---------------------------------------------------------------------------

/// Async wrapper around [`CatalogClient`].
pub struct AsyncCatalogClient {
    inner: Arc<CatalogClient>,
}

impl AsyncCatalogClient {
    pub fn builder() -> AsyncCatalogClientBuilder {
        AsyncCatalogClientBuilder::default()
    }

    /// Wrap an already configured client (e.g. one with a custom transport).
    pub fn from_client(client: CatalogClient) -> Self {
        Self {
            inner: Arc::new(client),
        }
    }

    pub fn new_draft(&self, category: ProductCategory) -> ProductDraft {
        self.inner.new_draft(category)
    }

    pub fn validate(&self, draft: &ProductDraft) -> ValidationErrors {
        self.inner.validate(draft)
    }

    /// Validate, serialize and send one draft.
    ///
    /// The draft's busy flag is held until the response arrives, so a second
    /// call for the same draft fails with [`CatalogError::SubmitInFlight`].
    pub async fn submit(&self, draft: &ProductDraft) -> Result<SubmitReceipt> {
        let _guard = draft.begin_submit()?;
        let payload = self.inner.prepare(draft)?;
        let client = Arc::clone(&self.inner);
        let result = tokio::task::spawn_blocking(move || client.send(&payload))
            .await
            .map_err(|e| CatalogError::InvalidArgument(format!("Task join error: {e}")))?;
        match &result {
            Ok(r) => info!(category = %draft.category(), id = ?r.id, "Product submitted"),
            Err(e) => warn!(category = %draft.category(), error = %e, "Product submit failed"),
        }
        result
    }
}
