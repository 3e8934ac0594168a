use crate::validate::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    // -- Structural ---------------------------------------------------------
    #[error("Capacity exceeded: {collection} holds at most {capacity}")]
    CapacityExceeded { collection: String, capacity: usize },

    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Duplicate origin: {0} is already used by another variant")]
    DuplicateOrigin(String),

    #[error("Part name collision: {0}")]
    CollectionNameCollision(String),

    #[error("Slot {collection}[{index}] is reserved but has no file attached")]
    UnattachedSlot { collection: String, index: usize },

    // -- Policy -------------------------------------------------------------
    #[error("Attachment {file_name} is {size} bytes (limit {limit})")]
    OversizedAttachment {
        file_name: String,
        size: u64,
        limit: u64,
    },

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("{collection} must keep at least {min} image(s)")]
    MinimumSlots { collection: String, min: usize },

    #[error("Axis not available for this category: {0}")]
    AxisUnavailable(String),

    // -- Validation ---------------------------------------------------------
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    // -- Transport ----------------------------------------------------------
    #[error("A submit is already in flight for this draft")]
    SubmitInFlight,

    #[error("Submit failed: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl CatalogError {
    /// True for errors the end user can fix by picking another file or
    /// editing a field.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            CatalogError::OversizedAttachment { .. }
                | CatalogError::UnsupportedMimeType(_)
                | CatalogError::MinimumSlots { .. }
                | CatalogError::Validation(_)
                | CatalogError::SubmitInFlight
                | CatalogError::Transport(_)
                | CatalogError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
