//! Category validation tests: required fields, either/or pairs, kinds,
//! reserved slots and variant fields.

mod common;

use common::{png, valid_jewelry, valid_lab_diamond, valid_natural_diamond};
use jewelry_catalog_sdk::models::{MediaTarget, MetalVariant, ProductCategory, ProductDraft, SizeVariant};
use jewelry_catalog_sdk::{ItemFailure, Validator};
use serde_json::json;

// ---------------------------------------------------------------------------
// Baselines
// ---------------------------------------------------------------------------

#[test]
fn complete_drafts_pass() {
    for draft in [valid_jewelry(), valid_lab_diamond(), valid_natural_diamond()] {
        let errors = Validator::new(&draft).validate();
        assert!(errors.is_empty(), "{}: {errors}", draft.category());
    }
}

#[test]
fn empty_jewelry_lists_every_required_field() {
    let d = ProductDraft::new(ProductCategory::Jewelry);
    let errors = Validator::new(&d).validate();
    assert_eq!(
        errors.fields(),
        vec!["description", "images", "jewelryType", "metalType", "name", "price", "stockNumber"]
    );
    assert_eq!(errors.get("name"), Some("Name is required"));
    assert_eq!(errors.get("stockNumber"), Some("Stock number is required"));
}

#[test]
fn natural_diamonds_need_lab_and_certificate() {
    let mut d = valid_natural_diamond();
    d.set_field("lab", "").unwrap();
    d.set_field("certificateNumber", "  ").unwrap();
    let errors = Validator::new(&d).validate();
    assert_eq!(errors.fields(), vec!["certificateNumber", "lab"]);

    // Lab-grown stones do not.
    let d = valid_lab_diamond();
    assert!(!Validator::new(&d).validate().contains("lab"));
}

#[test]
fn validation_does_not_touch_the_draft() {
    let d = ProductDraft::new(ProductCategory::LabGrownDiamond);
    let before = d.revision();
    let first = Validator::new(&d).validate();
    let second = Validator::new(&d).validate();
    assert_eq!(first, second);
    assert_eq!(d.revision(), before);
}

// ---------------------------------------------------------------------------
// Either/or pair
// ---------------------------------------------------------------------------

#[test]
fn missing_color_pair_flags_both_fields() {
    let mut d = valid_lab_diamond();
    d.set_field("color", "").unwrap();
    let errors = Validator::new(&d).validate();
    assert!(errors.contains("color"));
    assert!(errors.contains("fancyColor"));
    assert_eq!(errors.get("color"), errors.get("fancyColor"));

    d.set_field("fancyColor", "Pink").unwrap();
    let errors = Validator::new(&d).validate();
    assert!(!errors.contains("color"));
    assert!(!errors.contains("fancyColor"));
}

#[test]
fn setting_color_clears_both_errors() {
    let mut d = valid_lab_diamond();
    d.set_field("color", "").unwrap();
    assert_eq!(Validator::new(&d).validate().len(), 2);
    d.set_field("color", "G").unwrap();
    assert!(Validator::new(&d).validate().is_empty());
}

#[test]
fn both_colors_present_is_also_an_error() {
    let mut d = valid_lab_diamond();
    d.set_field("fancyColor", "Blue").unwrap();
    let errors = Validator::new(&d).validate();
    let message = errors.get("color").unwrap();
    assert!(message.starts_with("Provide only one of"));
    assert_eq!(errors.get("fancyColor"), Some(message));
}

#[test]
fn whitespace_only_color_counts_as_missing() {
    let mut d = valid_lab_diamond();
    d.set_field("color", "   ").unwrap();
    let errors = Validator::new(&d).validate();
    assert!(errors.get("color").unwrap().starts_with("Provide either"));
}

// ---------------------------------------------------------------------------
// Numbers, dates, flags
// ---------------------------------------------------------------------------

#[test]
fn price_must_be_positive() {
    let mut d = valid_jewelry();
    for bad in ["0", "-5", "abc"] {
        d.set_field("price", bad).unwrap();
        let errors = Validator::new(&d).validate();
        assert_eq!(errors.get("price"), Some("Price must be greater than 0"), "{bad}");
    }
    d.set_field("price", "").unwrap();
    assert_eq!(
        Validator::new(&d).validate().get("price"),
        Some("Price is required")
    );
    d.set_field("price", " 12.50 ").unwrap();
    assert!(Validator::new(&d).validate().is_empty());
}

#[test]
fn typed_fields_report_parse_failures() {
    let mut d = valid_lab_diamond();
    d.set_field("depthPercent", "deep").unwrap();
    d.set_field("certificateDate", "31/12/2024").unwrap();
    d.set_field("isFeatured", "maybe").unwrap();
    let errors = Validator::new(&d).validate();
    assert_eq!(errors.get("depthPercent"), Some("Depth percent must be a number"));
    assert_eq!(
        errors.get("certificateDate"),
        Some("Certificate date must be a date (YYYY-MM-DD)")
    );
    assert_eq!(errors.get("isFeatured"), Some("Is featured must be yes or no"));
    assert_eq!(errors.len(), 3);
}

#[test]
fn typed_fields_accept_valid_input() {
    let mut d = valid_jewelry();
    d.set_field("metalWeight", "4.2").unwrap();
    d.set_field("releaseDate", "2025-03-01T09:30:00Z").unwrap();
    d.set_field("isFeatured", "yes").unwrap();
    assert!(Validator::new(&d).validate().is_empty());
}

#[test]
fn weight_must_be_positive() {
    let mut d = valid_lab_diamond();
    d.set_field("weight", "0").unwrap();
    assert_eq!(
        Validator::new(&d).validate().get("weight"),
        Some("Weight must be greater than 0")
    );
}

// ---------------------------------------------------------------------------
// Images and metal
// ---------------------------------------------------------------------------

#[test]
fn diamonds_require_a_main_image() {
    let mut d = valid_lab_diamond();
    d.remove(MediaTarget::MainImage, 0).unwrap();
    let errors = Validator::new(&d).validate();
    assert_eq!(errors.fields(), vec!["imageLink"]);

    d.attach(MediaTarget::MainImage, png("upload.png")).unwrap();
    assert!(Validator::new(&d).validate().is_empty());
}

#[test]
fn jewelry_main_image_alone_satisfies_image_rule() {
    let mut d = ProductDraft::new(ProductCategory::Jewelry);
    d.attach(MediaTarget::MainImage, png("main.png")).unwrap();
    assert!(!Validator::new(&d).validate().contains("images"));
}

#[test]
fn metal_type_stands_in_for_variants() {
    let mut d = ProductDraft::new(ProductCategory::Jewelry);
    assert!(Validator::new(&d).validate().contains("metalType"));
    d.set_field("metalType", "Sterling Silver").unwrap();
    assert!(!Validator::new(&d).validate().contains("metalType"));
}

#[test]
fn reserved_slots_are_reported_by_wire_key() {
    let mut d = valid_jewelry();
    let gallery_slot = d.reserve(MediaTarget::Gallery).unwrap();
    d.reserve(MediaTarget::MetalGallery(0)).unwrap();
    let errors = Validator::new(&d).validate();

    assert_eq!(gallery_slot, 1);
    assert_eq!(errors.get("images[1]"), Some("Image slot has no file attached"));
    assert!(errors.contains("metalVariations[0].images[0]"));

    d.replace(MediaTarget::Gallery, 1, png("late.png")).unwrap();
    d.replace(MediaTarget::MetalGallery(0), 0, png("late-v.png")).unwrap();
    assert!(Validator::new(&d).validate().is_empty());
}

#[test]
fn reserved_slot_is_not_a_usable_image() {
    let mut d = valid_lab_diamond();
    d.remove(MediaTarget::MainImage, 0).unwrap();
    d.reserve(MediaTarget::MainImage).unwrap();
    let errors = Validator::new(&d).validate();
    assert!(errors.contains("imageLink"));
    assert!(errors.contains("mainImage[0]"));
}

// ---------------------------------------------------------------------------
// Variant fields
// ---------------------------------------------------------------------------

#[test]
fn variant_fields_are_keyed_by_position() {
    let mut d = valid_jewelry();
    d.add_metal_variant(MetalVariant::new("", "Rose")).unwrap();
    d.add_metal_variant(MetalVariant::new("18K", "")).unwrap();
    d.add_size_variant(SizeVariant::new("  ")).unwrap();
    let errors = Validator::new(&d).validate();
    assert_eq!(
        errors.fields(),
        vec![
            "metalVariations[1].carat",
            "metalVariations[2].color",
            "sizeVariations[0].size",
        ]
    );
}

// ---------------------------------------------------------------------------
// Error map shape
// ---------------------------------------------------------------------------

#[test]
fn errors_convert_to_failure_list() {
    let mut d = valid_jewelry();
    d.set_field("name", "").unwrap();
    d.set_field("jewelryType", "").unwrap();
    let errors = Validator::new(&d).validate();

    assert_eq!(
        errors.to_failures(),
        vec![
            ItemFailure {
                identifier: "jewelryType".to_string(),
                error: "Jewelry type is required".to_string(),
            },
            ItemFailure {
                identifier: "name".to_string(),
                error: "Name is required".to_string(),
            },
        ]
    );
    assert_eq!(errors.to_string(), "2 field(s) invalid: jewelryType, name");
    assert_eq!(
        serde_json::to_value(&errors).unwrap(),
        json!({
            "jewelryType": "Jewelry type is required",
            "name": "Name is required"
        })
    );
}
