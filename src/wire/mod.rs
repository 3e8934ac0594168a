//! Multipart wire payload: text fields, a JSON metadata blob, and binary
//! parts whose names encode `(collection, index)`.
//!
//! Part names look like `images[2]` or `metalVariations[3].images[2]`.
//! When a collection mixes persisted URLs and pending files, the metadata
//! carries `mediaPositions[<collection>]`, a list of `{ index, part }`
//! entries, because multipart transport does not preserve slot positions.

pub mod reassemble;
pub mod serializer;

pub use reassemble::{reassemble, ReceivedSlot};
pub use serializer::Serializer;

use crate::config;
use crate::error::Result;
use crate::models::{BinaryHandle, MediaTarget, ProductCategory};

/// Metadata key holding the position maps.
pub const POSITIONS_KEY: &str = "mediaPositions";

/// Metadata keys written by the serializer itself. Specification fields
/// never use these names.
pub const STRUCTURAL_KEYS: &[&str] = &[
    "category",
    "imageLink",
    "mainImage",
    "images",
    POSITIONS_KEY,
    "metalVariations",
    "originVariations",
    "sizeVariations",
    "defaultMetalIndex",
    "defaultOriginIndex",
    "defaultSizeIndex",
];

pub fn is_structural_key(key: &str) -> bool {
    STRUCTURAL_KEYS.contains(&key)
}

/// Wire identity of a media collection.
pub fn collection_id(target: MediaTarget) -> String {
    match target {
        MediaTarget::MainImage => "mainImage".to_string(),
        MediaTarget::Gallery => "images".to_string(),
        MediaTarget::MetalMainImage(v) => format!("metalVariations[{v}].mainImage"),
        MediaTarget::MetalGallery(v) => format!("metalVariations[{v}].images"),
    }
}

/// Name of the binary part carrying slot `index` of `collection`.
pub fn part_name(collection: &str, index: usize) -> String {
    format!("{collection}[{index}]")
}

// ---------------------------------------------------------------------------
// WirePart / WirePayload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WirePart {
    pub name: String,
    pub handle: BinaryHandle,
}

impl WirePart {
    pub fn file_name(&self) -> &str {
        self.handle.file_name()
    }

    pub fn mime(&self) -> &str {
        self.handle.mime()
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        self.handle.read_bytes()
    }
}

/// Everything one submit sends.
#[derive(Debug, Clone)]
pub struct WirePayload {
    pub category: ProductCategory,
    pub existing_id: Option<String>,
    /// Top-level text parts (`name`, `price`, `description`, `category`).
    pub fields: Vec<(String, String)>,
    pub metadata: serde_json::Value,
    pub parts: Vec<WirePart>,
}

impl WirePayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.parts.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn part(&self, name: &str) -> Option<&WirePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Text of the `specifications` part.
    pub fn metadata_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.metadata)?)
    }

    pub fn metadata_part_name(&self) -> &'static str {
        config::METADATA_PART
    }

    /// Relative REST path: the category collection, plus the id when editing.
    pub fn endpoint(&self) -> String {
        let base = config::endpoint_path(self.category);
        match &self.existing_id {
            Some(id) => format!("{base}/{id}"),
            None => base.to_string(),
        }
    }

    pub fn is_update(&self) -> bool {
        self.existing_id.is_some()
    }
}
