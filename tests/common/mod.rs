//! Shared test fixtures for the catalog SDK integration tests.
//!
//! Provides in-memory attachments, drafts that pass validation for each
//! category, and a recording transport.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use jewelry_catalog_sdk::models::{
    BinaryHandle, DiamondOrigin, MediaTarget, MetalVariant, OriginVariant, ProductCategory,
    ProductDraft,
};
use jewelry_catalog_sdk::{CatalogClient, Result, SubmitReceipt, Transport, WirePayload};

pub fn png(name: &str) -> BinaryHandle {
    BinaryHandle::from_bytes(name, "image/png", vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4])
}

pub fn jpeg(name: &str, size: usize) -> BinaryHandle {
    BinaryHandle::from_bytes(name, "image/jpeg", vec![0xFF; size])
}

/// Jewelry draft with every required field filled in and one gallery upload.
pub fn valid_jewelry() -> ProductDraft {
    let mut d = ProductDraft::new(ProductCategory::Jewelry);
    d.set_field("name", "Eternity Band").unwrap();
    d.set_field("description", "Pavé set band").unwrap();
    d.set_field("price", "1450").unwrap();
    d.set_field("stockNumber", "JW-1001").unwrap();
    d.set_field("jewelryType", "Ring").unwrap();
    d.attach(MediaTarget::Gallery, png("band-1.png")).unwrap();
    d.add_metal_variant(MetalVariant::new("14K", "Yellow")).unwrap();
    d
}

/// Lab-grown diamond draft that passes validation.
pub fn valid_lab_diamond() -> ProductDraft {
    let mut d = ProductDraft::new(ProductCategory::LabGrownDiamond);
    d.set_field("name", "Oval 1.50ct").unwrap();
    d.set_field("description", "Excellent polish").unwrap();
    d.set_field("price", "2100").unwrap();
    d.set_field("stockNumber", "LG-2001").unwrap();
    d.set_field("shape", "Oval").unwrap();
    d.set_field("weight", "1.5").unwrap();
    d.set_field("clarity", "VS1").unwrap();
    d.set_field("color", "F").unwrap();
    d.attach_url(MediaTarget::MainImage, "https://cdn.example.com/lg-2001.jpg")
        .unwrap();
    d.add_origin_variant(OriginVariant::new(DiamondOrigin::LabGrown))
        .unwrap();
    d
}

/// Natural diamond draft that passes validation.
pub fn valid_natural_diamond() -> ProductDraft {
    let mut d = ProductDraft::new(ProductCategory::NaturalDiamond);
    d.set_field("name", "Round 0.90ct").unwrap();
    d.set_field("description", "GIA graded").unwrap();
    d.set_field("price", "3900").unwrap();
    d.set_field("stockNumber", "ND-3001").unwrap();
    d.set_field("shape", "Round").unwrap();
    d.set_field("weight", "0.9").unwrap();
    d.set_field("clarity", "VVS2").unwrap();
    d.set_field("fancyColor", "Yellow").unwrap();
    d.set_field("lab", "GIA").unwrap();
    d.set_field("certificateNumber", "2141234567").unwrap();
    d.attach(MediaTarget::MainImage, jpeg("nd-3001.jpg", 64)).unwrap();
    d
}

// ---------------------------------------------------------------------------
// RecordingTransport
// ---------------------------------------------------------------------------

/// Transport that stores every payload and answers with a fixed receipt.
#[derive(Clone)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<WirePayload>>>,
    receipt: SubmitReceipt,
}

impl RecordingTransport {
    pub fn ok() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            receipt: SubmitReceipt {
                success: true,
                status: 201,
                id: Some("new-id".to_string()),
                ..Default::default()
            },
        }
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            receipt: SubmitReceipt {
                success: false,
                status,
                message: Some(message.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last(&self) -> WirePayload {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, payload: &WirePayload) -> Result<SubmitReceipt> {
        self.sent.lock().unwrap().push(payload.clone());
        Ok(self.receipt.clone())
    }
}

pub fn client_with(transport: &RecordingTransport) -> CatalogClient {
    CatalogClient::builder()
        .transport(transport.clone())
        .build()
        .unwrap()
}
