//! Per-category field declarations and validation rules.
//!
//! A schema says how each specification field is typed on the wire and
//! which checks must pass before a draft of that category may be submitted.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::models::ProductCategory;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
    Date,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Field must be non-empty.
    Required(&'static str),
    /// Field must be present and parse to a number greater than zero.
    Positive(&'static str),
    /// Exactly one of the two fields must be present.
    ExactlyOne(&'static str, &'static str),
    /// A persisted `imageLink` or a pending main-image attachment.
    MainImage,
    /// A main image or at least one gallery image.
    AnyImage,
    /// `metalType` or at least one metal variant.
    MetalPresent,
}

#[derive(Debug, Clone)]
pub struct CategorySchema {
    pub category: ProductCategory,
    pub fields: &'static [(&'static str, FieldKind)],
    pub rules: Vec<Rule>,
}

impl CategorySchema {
    /// Declared kind of a field; undeclared fields are text.
    pub fn kind_of(&self, field: &str) -> FieldKind {
        if field == "price" {
            return FieldKind::Numeric;
        }
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
            .unwrap_or(FieldKind::Text)
    }
}

const DIAMOND_FIELDS: &[(&str, FieldKind)] = &[
    ("stockNumber", FieldKind::Text),
    ("shape", FieldKind::Text),
    ("weight", FieldKind::Numeric),
    ("clarity", FieldKind::Text),
    ("color", FieldKind::Text),
    ("fancyColor", FieldKind::Text),
    ("fancyIntensity", FieldKind::Text),
    ("cut", FieldKind::Text),
    ("polish", FieldKind::Text),
    ("symmetry", FieldKind::Text),
    ("fluorescence", FieldKind::Text),
    ("lab", FieldKind::Text),
    ("certificateNumber", FieldKind::Text),
    ("certificateDate", FieldKind::Date),
    ("measurements", FieldKind::Text),
    ("depthPercent", FieldKind::Numeric),
    ("tablePercent", FieldKind::Numeric),
    ("ratio", FieldKind::Numeric),
    ("growthMethod", FieldKind::Text),
    ("pricePerCarat", FieldKind::Numeric),
    ("videoLink", FieldKind::Text),
    ("isFeatured", FieldKind::Bool),
];

const JEWELRY_FIELDS: &[(&str, FieldKind)] = &[
    ("stockNumber", FieldKind::Text),
    ("jewelryType", FieldKind::Text),
    ("metalType", FieldKind::Text),
    ("metalWeight", FieldKind::Numeric),
    ("gemstone", FieldKind::Text),
    ("totalCaratWeight", FieldKind::Numeric),
    ("gender", FieldKind::Text),
    ("collection", FieldKind::Text),
    ("releaseDate", FieldKind::Date),
    ("videoLink", FieldKind::Text),
    ("isFeatured", FieldKind::Bool),
];

fn base_rules() -> Vec<Rule> {
    vec![
        Rule::Required("name"),
        Rule::Required("description"),
        Rule::Positive("price"),
        Rule::Required("stockNumber"),
    ]
}

fn diamond_rules() -> Vec<Rule> {
    let mut rules = base_rules();
    rules.extend([
        Rule::Required("shape"),
        Rule::Positive("weight"),
        Rule::Required("clarity"),
        Rule::ExactlyOne("color", "fancyColor"),
        Rule::MainImage,
    ]);
    rules
}

pub fn schema_for(category: ProductCategory) -> CategorySchema {
    match category {
        ProductCategory::LabGrownDiamond => CategorySchema {
            category,
            fields: DIAMOND_FIELDS,
            rules: diamond_rules(),
        },
        ProductCategory::NaturalDiamond => {
            let mut rules = diamond_rules();
            rules.extend([Rule::Required("lab"), Rule::Required("certificateNumber")]);
            CategorySchema {
                category,
                fields: DIAMOND_FIELDS,
                rules,
            }
        }
        ProductCategory::Jewelry => {
            let mut rules = base_rules();
            rules.extend([Rule::Required("jewelryType"), Rule::MetalPresent, Rule::AnyImage]);
            CategorySchema {
                category,
                fields: JEWELRY_FIELDS,
                rules,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Parse a form number. Rejects NaN and infinities.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Normalize a form date to `YYYY-MM-DD`. Accepts RFC 3339 timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// JSON number for `n`, integral when it has no fractional part.
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}

/// Coerce a raw form value by kind, then drop it if empty.
///
/// `"0"` survives as `0`; `""` and whitespace are dropped. Values that do
/// not parse for their kind are passed through as trimmed text.
pub fn coerce(kind: FieldKind, raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = match kind {
        FieldKind::Text => None,
        FieldKind::Numeric => parse_number(trimmed).map(number_value),
        FieldKind::Date => parse_date(trimmed).map(|d| Value::from(d.format(DATE_FORMAT).to_string())),
        FieldKind::Bool => parse_bool(trimmed).map(Value::from),
    };
    Some(value.unwrap_or_else(|| Value::from(trimmed)))
}
