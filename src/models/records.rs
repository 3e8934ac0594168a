use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{CatalogError, Result};

use super::media::{MediaCollection, MediaSlot};
use super::variant::{VariantAxis, VariantRecord};

// ---------------------------------------------------------------------------
// MetalVariant - karat/color option with its own images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MetalVariant {
    pub metal: String,
    pub display_name: String,
    pub carat: String,
    pub color: String,
    pub price_adjustment: Option<f64>,
    pub stock_count: Option<u32>,
    pub available: bool,
    pub main_image: MediaCollection,
    pub gallery: MediaCollection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetalField {
    Carat(String),
    Color(String),
    PriceAdjustment(Option<f64>),
    StockCount(Option<u32>),
    Available(bool),
}

impl MetalVariant {
    pub fn new(carat: &str, color: &str) -> Self {
        Self {
            metal: String::new(),
            display_name: String::new(),
            carat: carat.to_string(),
            color: color.to_string(),
            price_adjustment: None,
            stock_count: None,
            available: true,
            main_image: MediaCollection::bounded("metal main image", config::MAIN_IMAGE_CAPACITY),
            gallery: MediaCollection::bounded("metal gallery", config::VARIANT_GALLERY_CAPACITY),
        }
        .derive_fields()
    }

    pub fn with_price_adjustment(mut self, amount: f64) -> Self {
        self.price_adjustment = Some(amount);
        self
    }

    pub fn with_stock_count(mut self, count: u32) -> Self {
        self.stock_count = Some(count);
        self
    }
}

/// Metals that are not sold as "<color> Gold".
const NON_GOLD_METALS: &[&str] = &["platinum", "silver", "palladium", "titanium"];

/// `(metal, display_name)` for a karat/color pair.
pub fn metal_labels(carat: &str, color: &str) -> (String, String) {
    let carat = carat.trim();
    let color = color.trim();
    if carat.is_empty() && color.is_empty() {
        return (String::new(), String::new());
    }
    let base = if color.is_empty() {
        "Gold".to_string()
    } else if NON_GOLD_METALS.contains(&color.to_ascii_lowercase().as_str()) {
        color.to_string()
    } else {
        format!("{color} Gold")
    };
    if carat.is_empty() {
        (base.clone(), base)
    } else {
        (format!("{carat} {base}"), format!("{base} ({carat})"))
    }
}

impl VariantRecord for MetalVariant {
    type Field = MetalField;
    const AXIS: &'static str = "metal";

    fn apply(&mut self, field: MetalField) {
        match field {
            MetalField::Carat(v) => self.carat = v,
            MetalField::Color(v) => self.color = v,
            MetalField::PriceAdjustment(v) => self.price_adjustment = v,
            MetalField::StockCount(v) => self.stock_count = v,
            MetalField::Available(v) => self.available = v,
        }
    }

    fn derive_fields(mut self) -> Self {
        let (metal, display_name) = metal_labels(&self.carat, &self.color);
        self.metal = metal;
        self.display_name = display_name;
        self
    }

    fn media_slots(&self) -> Vec<&MediaSlot> {
        self.main_image.iter().chain(self.gallery.iter()).collect()
    }
}

// ---------------------------------------------------------------------------
// OriginVariant - lab-grown vs natural stone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiamondOrigin {
    LabGrown,
    Natural,
}

impl DiamondOrigin {
    pub const ALL: [DiamondOrigin; 2] = [DiamondOrigin::LabGrown, DiamondOrigin::Natural];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiamondOrigin::LabGrown => "lab-grown",
            DiamondOrigin::Natural => "natural",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DiamondOrigin::LabGrown => "Lab Grown Diamond",
            DiamondOrigin::Natural => "Natural Diamond",
        }
    }
}

impl std::fmt::Display for DiamondOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiamondOrigin {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "lab-grown" | "labgrown" | "lab" => Ok(DiamondOrigin::LabGrown),
            "natural" => Ok(DiamondOrigin::Natural),
            other => Err(CatalogError::InvalidArgument(format!(
                "unknown diamond origin: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OriginVariant {
    pub origin: DiamondOrigin,
    pub display_name: String,
    pub price_adjustment: Option<f64>,
    pub available: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OriginField {
    Origin(DiamondOrigin),
    PriceAdjustment(Option<f64>),
    Available(bool),
    Description(String),
}

impl OriginVariant {
    pub fn new(origin: DiamondOrigin) -> Self {
        Self {
            origin,
            display_name: String::new(),
            price_adjustment: None,
            available: true,
            description: String::new(),
        }
        .derive_fields()
    }

    pub fn with_price_adjustment(mut self, amount: f64) -> Self {
        self.price_adjustment = Some(amount);
        self
    }
}

impl VariantRecord for OriginVariant {
    type Field = OriginField;
    const AXIS: &'static str = "origin";
    const CAPACITY: Option<usize> = Some(config::ORIGIN_AXIS_CAPACITY);

    fn apply(&mut self, field: OriginField) {
        match field {
            OriginField::Origin(v) => self.origin = v,
            OriginField::PriceAdjustment(v) => self.price_adjustment = v,
            OriginField::Available(v) => self.available = v,
            OriginField::Description(v) => self.description = v,
        }
    }

    fn derive_fields(mut self) -> Self {
        self.display_name = self.origin.display_name().to_string();
        self
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.origin.as_str().to_string())
    }

    fn duplicate_error(key: String) -> CatalogError {
        CatalogError::DuplicateOrigin(key)
    }
}

impl VariantAxis<OriginVariant> {
    /// Origins still selectable for the record at `editing` (or for a new
    /// record when `None`). Every other origin is disabled in the picker.
    pub fn available_origins(&self, editing: Option<usize>) -> Vec<DiamondOrigin> {
        let used = self.used_keys(editing);
        DiamondOrigin::ALL
            .into_iter()
            .filter(|o| !used.iter().any(|u| u == o.as_str()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SizeVariant - ring / chain sizes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SizeVariant {
    pub size: String,
    pub display_name: String,
    pub price_adjustment: Option<f64>,
    pub stock_count: Option<u32>,
    pub available: bool,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SizeField {
    Size(String),
    DisplayName(String),
    PriceAdjustment(Option<f64>),
    StockCount(Option<u32>),
    Available(bool),
    Description(String),
}

impl SizeVariant {
    pub fn new(size: &str) -> Self {
        Self {
            size: size.to_string(),
            display_name: String::new(),
            price_adjustment: None,
            stock_count: None,
            available: true,
            description: String::new(),
        }
        .derive_fields()
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }
}

impl VariantRecord for SizeVariant {
    type Field = SizeField;
    const AXIS: &'static str = "size";

    fn apply(&mut self, field: SizeField) {
        match field {
            SizeField::Size(v) => self.size = v,
            SizeField::DisplayName(v) => self.display_name = v,
            SizeField::PriceAdjustment(v) => self.price_adjustment = v,
            SizeField::StockCount(v) => self.stock_count = v,
            SizeField::Available(v) => self.available = v,
            SizeField::Description(v) => self.description = v,
        }
    }

    fn derive_fields(mut self) -> Self {
        self.size = self.size.trim().to_string();
        self
    }
}
