//! Product draft SDK for the jewelry catalog admin API.
//!
//! Keeps product media and variant collections consistent while they are
//! edited, validates drafts per product category, and serializes them into
//! a multipart payload the API can reassemble without relying on part order.
//!
//! # Quick start
//!
//! ```no_run
//! use jewelry_catalog_sdk::models::{BinaryHandle, MediaTarget, MetalVariant, ProductCategory};
//! use jewelry_catalog_sdk::CatalogClient;
//!
//! let client = CatalogClient::builder()
//!     .base_url("https://api.example.com/api")
//!     .build()
//!     .unwrap();
//!
//! let mut draft = client.new_draft(ProductCategory::Jewelry);
//! draft.set_field("name", "Eternity Band").unwrap();
//! draft.attach(MediaTarget::Gallery, BinaryHandle::from_path("band.jpg").unwrap()).unwrap();
//! draft.add_metal_variant(MetalVariant::new("18K", "Rose")).unwrap();
//!
//! let errors = client.validate(&draft);
//! if errors.is_empty() {
//!     let receipt = client.submit(&draft).unwrap();
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod transport;
pub mod validate;
pub mod wire;

#[cfg(feature = "async")]
pub use async_client::AsyncCatalogClient;
pub use error::{CatalogError, Result};
pub use models::{MediaCollection, MediaSlot, ProductCategory, ProductDraft, VariantAxis};
pub use transport::{HttpTransport, SubmitReceipt, Transport};
pub use validate::{ItemFailure, ValidationErrors, Validator};
pub use wire::{Serializer, WirePayload};

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use models::{AttachmentPolicy, ProductRecord};

// ---------------------------------------------------------------------------
// CatalogClientBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`CatalogClient`].
///
/// Use [`CatalogClient::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](CatalogClientBuilder::build).
pub struct CatalogClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    auth_token: Option<String>,
    policy: AttachmentPolicy,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for CatalogClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: config::DEFAULT_TIMEOUT,
            auth_token: None,
            policy: AttachmentPolicy::default(),
            transport: None,
        }
    }
}

impl CatalogClientBuilder {
    /// Set the API base URL.
    ///
    /// If not set, `CATALOG_API_URL` is read from the environment, falling
    /// back to `http://localhost:5000/api`.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Set the HTTP request timeout. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bearer token sent with every submit. Storing it is the caller's job.
    pub fn auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Per-attachment size limit in bytes. Defaults to 5 MB.
    pub fn max_attachment_bytes(mut self, limit: u64) -> Self {
        self.policy.max_bytes = limit;
        self
    }

    /// Replace the accepted attachment MIME types.
    pub fn allowed_mime_types(mut self, types: &[&str]) -> Self {
        self.policy.allowed_mime_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Use a custom transport instead of the HTTP one.
    pub fn transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Result<CatalogClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => {
                let base = self.base_url.unwrap_or_else(config::default_api_url);
                Arc::new(HttpTransport::new(&base, self.timeout, self.auth_token)?)
            }
        };
        Ok(CatalogClient {
            transport,
            policy: self.policy,
        })
    }
}

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

/// Entry point: creates drafts, validates, serializes and submits them.
pub struct CatalogClient {
    transport: Arc<dyn Transport>,
    policy: AttachmentPolicy,
}

impl CatalogClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::default()
    }

    /// Empty draft for a new product, using this client's attachment policy.
    pub fn new_draft(&self, category: ProductCategory) -> ProductDraft {
        ProductDraft::new(category).with_policy(self.policy.clone())
    }

    /// Draft populated from an existing product for editing.
    pub fn edit_draft(&self, category: ProductCategory, record: &ProductRecord) -> Result<ProductDraft> {
        Ok(ProductDraft::from_record(category, record)?.with_policy(self.policy.clone()))
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Run the category's checks against the draft.
    pub fn validate(&self, draft: &ProductDraft) -> ValidationErrors {
        Validator::new(draft).validate()
    }

    /// Serialize without validating.
    pub fn serialize(&self, draft: &ProductDraft) -> Result<WirePayload> {
        Serializer::new(draft).build()
    }

    /// Validate, then serialize. Fails with [`CatalogError::Validation`]
    /// while the error map is non-empty.
    pub fn prepare(&self, draft: &ProductDraft) -> Result<WirePayload> {
        let errors = self.validate(draft);
        if !errors.is_empty() {
            warn!(category = %draft.category(), fields = errors.len(), "Draft failed validation");
            return Err(CatalogError::Validation(errors));
        }
        self.serialize(draft)
    }

    /// Send an already prepared payload.
    pub fn send(&self, payload: &WirePayload) -> Result<SubmitReceipt> {
        let receipt = self.transport.send(payload)?;
        transport::ensure_success(receipt)
    }

    /// Validate, serialize and send one draft.
    ///
    /// At most one submit per draft may be in flight. On failure the draft is
    /// left exactly as it was; there is no retry.
    pub fn submit(&self, draft: &ProductDraft) -> Result<SubmitReceipt> {
        let _guard = draft.begin_submit()?;
        let payload = self.prepare(draft)?;
        let result = self.send(&payload);
        match &result {
            Ok(r) => info!(category = %draft.category(), id = ?r.id, "Product submitted"),
            Err(e) => warn!(category = %draft.category(), error = %e, "Product submit failed"),
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for CatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CatalogClient(max_attachment_bytes={}, mime_types=[{}])",
            self.policy.max_bytes,
            self.policy.allowed_mime_types.join(", ")
        )
    }
}
