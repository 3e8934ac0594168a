use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProductRecord - an existing product as returned by the API
// ---------------------------------------------------------------------------

/// Inbound product used to populate an edit-mode draft.
///
/// Category-specific fields that are not modeled explicitly are collected
/// into `specifications`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<serde_json::Value>,
    pub image_link: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub metal_variations: Vec<MetalVariationRecord>,
    #[serde(default)]
    pub origin_variations: Vec<OriginVariationRecord>,
    #[serde(default)]
    pub size_variations: Vec<SizeVariationRecord>,
    pub default_metal_index: Option<usize>,
    pub default_origin_index: Option<usize>,
    pub default_size_index: Option<usize>,
    #[serde(flatten)]
    pub specifications: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalVariationRecord {
    pub metal: Option<String>,
    pub display_name: Option<String>,
    pub carat: Option<String>,
    pub color: Option<String>,
    pub price_adjustment: Option<f64>,
    pub stock_count: Option<u32>,
    pub available: Option<bool>,
    pub image_link: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginVariationRecord {
    pub origin: String,
    pub display_name: Option<String>,
    pub price_adjustment: Option<f64>,
    pub available: Option<bool>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeVariationRecord {
    pub size: String,
    pub display_name: Option<String>,
    pub price_adjustment: Option<f64>,
    pub stock_count: Option<u32>,
    pub available: Option<bool>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

/// Render an inbound JSON scalar the way a form input would hold it.
///
/// Arrays, objects and nulls have no form representation and yield `None`.
pub fn scalar_to_input(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
