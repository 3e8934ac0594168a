use std::collections::HashMap;
use std::time::Duration;

use crate::models::ProductCategory;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const API_URL_ENV: &str = "CATALOG_API_URL";

/// Name of the multipart text part carrying the JSON metadata blob.
pub const METADATA_PART: &str = "specifications";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-image upload limit (5 MB).
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

pub const MAIN_IMAGE_CAPACITY: usize = 1;
pub const JEWELRY_GALLERY_CAPACITY: usize = 5;
pub const DIAMOND_GALLERY_CAPACITY: usize = 10;
pub const VARIANT_GALLERY_CAPACITY: usize = 5;
pub const ORIGIN_AXIS_CAPACITY: usize = 2;

pub fn allowed_mime_types() -> Vec<&'static str> {
    vec!["image/jpeg", "image/png", "image/webp", "image/gif"]
}

pub fn mime_by_extension() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("png", "image/png"),
        ("webp", "image/webp"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("pdf", "application/pdf"),
    ])
}

/// REST collection path for each product category, relative to the API base.
pub fn endpoint_path(category: ProductCategory) -> &'static str {
    match category {
        ProductCategory::LabGrownDiamond => "products/lab-grown-diamonds",
        ProductCategory::NaturalDiamond => "products/natural-diamonds",
        ProductCategory::Jewelry => "products/jewelry",
    }
}

pub fn default_api_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}
