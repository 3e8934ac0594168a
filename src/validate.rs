//! Pre-submit validation.
//!
//! Validation is pure: it reads the draft and returns a field-keyed error
//! map. Callers re-run it after every change so fixed fields drop out.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{MediaCollection, MediaTarget, ProductDraft};
use crate::schema::{self, CategorySchema, FieldKind, Rule};

// ---------------------------------------------------------------------------
// ItemFailure - `{identifier, error}` pair shared with bulk-upload reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub identifier: String,
    pub error: String,
}

// ---------------------------------------------------------------------------
// ValidationErrors
// ---------------------------------------------------------------------------

/// Field-keyed validation messages, ordered by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Same shape as the bulk-upload failure list.
    pub fn to_failures(&self) -> Vec<ItemFailure> {
        self.0
            .iter()
            .map(|(k, v)| ItemFailure {
                identifier: k.clone(),
                error: v.clone(),
            })
            .collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) invalid: {}", self.0.len(), self.fields().join(", "))
    }
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

pub struct Validator<'a> {
    draft: &'a ProductDraft,
    schema: CategorySchema,
}

impl<'a> Validator<'a> {
    pub fn new(draft: &'a ProductDraft) -> Self {
        Self {
            draft,
            schema: schema::schema_for(draft.category()),
        }
    }

    /// Run every check and collect the failures.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for rule in &self.schema.rules {
            self.check_rule(*rule, &mut errors);
        }
        self.check_kinds(&mut errors);
        self.check_reserved_slots(&mut errors);
        self.check_variants(&mut errors);
        errors
    }

    fn value(&self, field: &str) -> &str {
        self.draft.field(field).map(str::trim).unwrap_or("")
    }

    fn check_rule(&self, rule: Rule, errors: &mut ValidationErrors) {
        match rule {
            Rule::Required(field) => {
                if self.value(field).is_empty() {
                    errors.insert(field, &format!("{} is required", label(field)));
                }
            }
            Rule::Positive(field) => {
                let raw = self.value(field);
                if raw.is_empty() {
                    errors.insert(field, &format!("{} is required", label(field)));
                } else if !schema::parse_number(raw).is_some_and(|n| n > 0.0) {
                    errors.insert(field, &format!("{} must be greater than 0", label(field)));
                }
            }
            Rule::ExactlyOne(a, b) => {
                let has_a = !self.value(a).is_empty();
                let has_b = !self.value(b).is_empty();
                if !has_a && !has_b {
                    let msg = format!("Provide either {} or {}", label(a), label(b));
                    errors.insert(a, &msg);
                    errors.insert(b, &msg);
                } else if has_a && has_b {
                    let msg = format!("Provide only one of {} or {}", label(a), label(b));
                    errors.insert(a, &msg);
                    errors.insert(b, &msg);
                }
            }
            Rule::MainImage => {
                if !has_usable_slot(self.draft.main_image()) {
                    errors.insert("imageLink", "A main image link or upload is required");
                }
            }
            Rule::AnyImage => {
                if !has_usable_slot(self.draft.main_image())
                    && !has_usable_slot(self.draft.gallery())
                {
                    errors.insert("images", "At least one product image is required");
                }
            }
            Rule::MetalPresent => {
                let has_variants = self.draft.metal_axis().is_some_and(|a| !a.is_empty());
                if self.value("metalType").is_empty() && !has_variants {
                    errors.insert("metalType", "Metal type or at least one metal variation is required");
                }
            }
        }
    }

    fn check_kinds(&self, errors: &mut ValidationErrors) {
        let fields = std::iter::once(("price", self.draft.price()))
            .chain(self.draft.specifications().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        for (field, raw) in fields {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match self.schema.kind_of(field) {
                FieldKind::Numeric if schema::parse_number(raw).is_none() => {
                    errors.insert(field, &format!("{} must be a number", label(field)));
                }
                FieldKind::Date if schema::parse_date(raw).is_none() => {
                    errors.insert(field, &format!("{} must be a date (YYYY-MM-DD)", label(field)));
                }
                FieldKind::Bool if schema::parse_bool(raw).is_none() => {
                    errors.insert(field, &format!("{} must be yes or no", label(field)));
                }
                _ => {}
            }
        }
    }

    fn check_reserved_slots(&self, errors: &mut ValidationErrors) {
        let mut targets = vec![MediaTarget::MainImage, MediaTarget::Gallery];
        if let Some(axis) = self.draft.metal_axis() {
            for v in 0..axis.len() {
                targets.push(MediaTarget::MetalMainImage(v));
                targets.push(MediaTarget::MetalGallery(v));
            }
        }
        for target in targets {
            if let Ok(coll) = self.draft.collection(target) {
                if let Some(i) = coll.first_reserved() {
                    errors.insert(
                        &format!("{}[{}]", crate::wire::collection_id(target), i),
                        "Image slot has no file attached",
                    );
                }
            }
        }
    }

    fn check_variants(&self, errors: &mut ValidationErrors) {
        if let Some(axis) = self.draft.metal_axis() {
            for (i, v) in axis.iter().enumerate() {
                if v.carat.trim().is_empty() {
                    errors.insert(&format!("metalVariations[{i}].carat"), "Carat is required");
                }
                if v.color.trim().is_empty() {
                    errors.insert(&format!("metalVariations[{i}].color"), "Color is required");
                }
            }
        }
        if let Some(axis) = self.draft.size_axis() {
            for (i, v) in axis.iter().enumerate() {
                if v.size.trim().is_empty() {
                    errors.insert(&format!("sizeVariations[{i}].size"), "Size is required");
                }
            }
        }
    }
}

fn has_usable_slot(coll: &MediaCollection) -> bool {
    coll.iter().any(|s| s.is_pending() || s.is_persisted())
}

/// `"fancyColor"` -> `"Fancy color"`.
fn label(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + 4);
    for (i, ch) in field.chars().enumerate() {
        if i == 0 {
            out.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            out.push(' ');
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_splits_camel_case() {
        assert_eq!(label("fancyColor"), "Fancy color");
        assert_eq!(label("name"), "Name");
        assert_eq!(label("stockNumber"), "Stock number");
    }

    #[test]
    fn insert_keeps_first_message() {
        let mut e = ValidationErrors::new();
        e.insert("price", "first");
        e.insert("price", "second");
        assert_eq!(e.get("price"), Some("first"));
    }
}
