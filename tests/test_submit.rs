//! Submit flow tests against a recording transport.

mod common;

use std::time::Duration;

use common::{client_with, png, valid_jewelry, valid_lab_diamond, RecordingTransport};
use jewelry_catalog_sdk::models::{MediaTarget, MetalVariant, ProductCategory, ProductRecord};
use jewelry_catalog_sdk::wire::{reassemble, ReceivedSlot};
use jewelry_catalog_sdk::{CatalogClient, CatalogError, HttpTransport, SubmitReceipt};
use serde_json::json;

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[test]
fn jewelry_draft_submits_surviving_upload_at_index_zero() {
    let transport = RecordingTransport::ok();
    let client = client_with(&transport);

    let mut d = client.new_draft(ProductCategory::Jewelry);
    d.set_field("name", "Rose Solitaire").unwrap();
    d.set_field("description", "Four prong setting").unwrap();
    d.set_field("price", "980").unwrap();
    d.set_field("stockNumber", "JW-2002").unwrap();
    d.set_field("jewelryType", "Ring").unwrap();

    let first = png("first.png");
    let second = png("second.png");
    d.attach(MediaTarget::Gallery, first).unwrap();
    d.attach(MediaTarget::Gallery, second.clone()).unwrap();
    d.add_metal_variant(MetalVariant::new("18K", "Rose")).unwrap();
    assert_eq!(
        d.metal_axis().unwrap().get(0).unwrap().display_name,
        "Rose Gold (18K)"
    );

    d.remove(MediaTarget::Gallery, 0).unwrap();
    assert_eq!(d.gallery().len(), 1);

    let receipt = client.submit(&d).unwrap();
    assert_eq!(receipt.id.as_deref(), Some("new-id"));
    assert_eq!(transport.sent_count(), 1);

    let payload = transport.last();
    assert_eq!(payload.part_names(), vec!["images[0]"]);
    assert_eq!(payload.part("images[0]").unwrap().handle, second);
    assert!(payload.metadata.get("images").is_none());
    assert!(payload.metadata.get("mediaPositions").is_none());

    let variant = &payload.metadata["metalVariations"][0];
    assert_eq!(variant["displayName"], json!("Rose Gold (18K)"));
    assert!(variant.get("imageLink").is_none());
    assert!(variant.get("images").is_none());

    let slots = reassemble(&payload.metadata, "images", &payload.part_names()).unwrap();
    assert_eq!(slots, vec![ReceivedSlot::Part("images[0]".to_string())]);
    assert!(!d.is_submitting());
}

#[test]
fn edited_product_submits_as_update() {
    let transport = RecordingTransport::ok();
    let client = client_with(&transport);
    let record: ProductRecord = serde_json::from_value(json!({
        "_id": "64f1c0",
        "name": "Oval 1.50ct",
        "description": "Excellent polish",
        "price": 2100,
        "stockNumber": "LG-2001",
        "shape": "Oval",
        "weight": 1.5,
        "clarity": "VS1",
        "color": "F",
        "imageLink": "https://cdn.example.com/lg-2001.jpg",
        "originVariations": [
            { "origin": "natural", "isDefault": false },
            { "origin": "lab-grown", "isDefault": true }
        ]
    }))
    .unwrap();

    let mut d = client
        .edit_draft(ProductCategory::LabGrownDiamond, &record)
        .unwrap();
    assert_eq!(d.origin_axis().unwrap().default_index(), Some(1));
    d.set_field("price", "1990").unwrap();

    client.submit(&d).unwrap();
    let payload = transport.last();
    assert!(payload.is_update());
    assert_eq!(payload.endpoint(), "products/lab-grown-diamonds/64f1c0");
    assert_eq!(payload.field("price"), Some("1990"));
    assert_eq!(payload.metadata["weight"], json!(1.5));
    assert_eq!(payload.metadata["defaultOriginIndex"], json!(1));
    assert!(payload.parts.is_empty());
}

// ---------------------------------------------------------------------------
// Gating
// ---------------------------------------------------------------------------

#[test]
fn invalid_draft_is_never_sent() {
    let transport = RecordingTransport::ok();
    let client = client_with(&transport);
    let mut d = valid_jewelry();
    d.set_field("name", "").unwrap();

    match client.submit(&d) {
        Err(CatalogError::Validation(errors)) => {
            assert_eq!(errors.fields(), vec!["name"]);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
    assert_eq!(transport.sent_count(), 0);
    assert!(!d.is_submitting());
}

#[test]
fn second_submit_is_rejected_while_in_flight() {
    let transport = RecordingTransport::ok();
    let client = client_with(&transport);
    let d = valid_lab_diamond();

    let guard = d.begin_submit().unwrap();
    assert!(d.is_submitting());
    assert!(matches!(client.submit(&d), Err(CatalogError::SubmitInFlight)));
    assert_eq!(transport.sent_count(), 0);

    drop(guard);
    assert!(!d.is_submitting());
    client.submit(&d).unwrap();
    assert_eq!(transport.sent_count(), 1);
}

#[test]
fn failed_submit_leaves_draft_editable_and_retryable() {
    let failing = RecordingTransport::failing(422, "Stock number already exists");
    let client = client_with(&failing);
    let mut d = valid_jewelry();
    let revision = d.revision();
    let gallery = d.gallery().slots();

    match client.submit(&d) {
        Err(CatalogError::Transport(message)) => {
            assert_eq!(message, "Stock number already exists")
        }
        other => panic!("expected Transport, got {other:?}"),
    }
    assert_eq!(failing.sent_count(), 1);
    assert!(!d.is_submitting());
    assert_eq!(d.revision(), revision);
    assert_eq!(d.gallery().slots(), gallery);

    d.set_field("stockNumber", "JW-1002").unwrap();
    let ok = RecordingTransport::ok();
    client_with(&ok).submit(&d).unwrap();
    assert_eq!(ok.last().metadata["stockNumber"], json!("JW-1002"));
}

#[test]
fn failure_without_message_reports_status() {
    let err = jewelry_catalog_sdk::transport::ensure_success(SubmitReceipt {
        status: 503,
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(err.to_string(), "Submit failed: server responded with status 503");
    assert!(err.is_user_facing());
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

#[test]
fn builder_policy_flows_into_drafts() {
    let client = CatalogClient::builder()
        .transport(RecordingTransport::ok())
        .max_attachment_bytes(16)
        .allowed_mime_types(&["image/png"])
        .build()
        .unwrap();

    let mut d = client.new_draft(ProductCategory::Jewelry);
    assert!(matches!(
        d.attach(MediaTarget::Gallery, common::jpeg("big.jpg", 8)),
        Err(CatalogError::UnsupportedMimeType(_))
    ));
    assert!(matches!(
        d.attach(MediaTarget::Gallery, common::png("ok.png")),
        Ok((0, _))
    ));
    assert_eq!(client.policy().max_bytes, 16);
}

#[test]
fn http_transport_routes_creates_and_updates() {
    let http = HttpTransport::new("https://api.example.com/api/", Duration::from_secs(5), None)
        .unwrap();
    assert_eq!(http.base_url(), "https://api.example.com/api");

    let client = client_with(&RecordingTransport::ok());
    let mut payload = client.serialize(&valid_jewelry()).unwrap();
    assert_eq!(http.url_for(&payload), "https://api.example.com/api/products/jewelry");

    payload.existing_id = Some("abc".to_string());
    assert_eq!(
        http.url_for(&payload),
        "https://api.example.com/api/products/jewelry/abc"
    );
}

// ---------------------------------------------------------------------------
// Async
// ---------------------------------------------------------------------------

#[cfg(feature = "async")]
#[tokio::test]
async fn async_submit_holds_busy_flag_until_sent() {
    use jewelry_catalog_sdk::AsyncCatalogClient;

    let transport = RecordingTransport::ok();
    let client = AsyncCatalogClient::from_client(client_with(&transport));
    let d = valid_lab_diamond();

    let receipt = client.submit(&d).await.unwrap();
    assert!(receipt.success);
    assert_eq!(transport.sent_count(), 1);
    assert!(!d.is_submitting());

    let _guard = d.begin_submit().unwrap();
    assert!(matches!(
        client.submit(&d).await,
        Err(CatalogError::SubmitInFlight)
    ));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn async_builder_carries_policy_and_transport() {
    use jewelry_catalog_sdk::AsyncCatalogClient;

    let transport = RecordingTransport::ok();
    let client = AsyncCatalogClient::builder()
        .transport(transport.clone())
        .max_attachment_bytes(16)
        .allowed_mime_types(&["image/png"])
        .build()
        .await
        .unwrap();

    let mut d = client.new_draft(ProductCategory::LabGrownDiamond);
    assert!(matches!(
        d.attach(MediaTarget::MainImage, common::jpeg("big.jpg", 8)),
        Err(CatalogError::UnsupportedMimeType(_))
    ));

    let d = valid_lab_diamond();
    client.submit(&d).await.unwrap();
    assert_eq!(transport.sent_count(), 1);
}
