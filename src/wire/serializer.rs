use std::collections::HashSet;

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::models::{
    MediaCollection, MediaSlot, MediaTarget, MetalVariant, OriginVariant, ProductDraft,
    SizeVariant, VariantAxis, VariantRecord,
};
use crate::schema::{self, CategorySchema};

use super::{collection_id, part_name, WirePart, WirePayload, POSITIONS_KEY};

/// Turns one draft into a [`WirePayload`].
///
/// Does not validate; run the validator first.
pub struct Serializer<'a> {
    draft: &'a ProductDraft,
    schema: CategorySchema,
    parts: Vec<WirePart>,
    names: HashSet<String>,
    positions: Map<String, Value>,
}

impl<'a> Serializer<'a> {
    pub fn new(draft: &'a ProductDraft) -> Self {
        Self {
            draft,
            schema: schema::schema_for(draft.category()),
            parts: Vec::new(),
            names: HashSet::new(),
            positions: Map::new(),
        }
    }

    pub fn build(mut self) -> Result<WirePayload> {
        let draft = self.draft;
        let mut meta = Map::new();

        // Category-specific scalars
        for (key, raw) in draft.specifications() {
            if super::is_structural_key(key) {
                warn!(field = %key, "Dropping specification field that shadows a structural key");
                continue;
            }
            if let Some(v) = schema::coerce(self.schema.kind_of(key), raw) {
                meta.insert(key.clone(), v);
            }
        }

        // Top-level media
        self.encode_main_image(MediaTarget::MainImage, draft.main_image(), &mut meta)?;
        if let Some(images) = self.encode_collection(MediaTarget::Gallery, draft.gallery())? {
            meta.insert("images".to_string(), images);
        }

        // Variant axes
        if let Some(axis) = draft.metal_axis() {
            let mut records = Vec::with_capacity(axis.len());
            for (i, v) in axis.iter().enumerate() {
                records.push(self.encode_metal(i, v, axis.default_index())?);
            }
            put_axis(&mut meta, "metalVariations", "defaultMetalIndex", records, axis);
        }
        if let Some(axis) = draft.origin_axis() {
            let records = axis
                .iter()
                .enumerate()
                .map(|(i, v)| encode_origin(v, axis.default_index() == Some(i)))
                .collect();
            put_axis(&mut meta, "originVariations", "defaultOriginIndex", records, axis);
        }
        if let Some(axis) = draft.size_axis() {
            let records = axis
                .iter()
                .enumerate()
                .map(|(i, v)| encode_size(v, axis.default_index() == Some(i)))
                .collect();
            put_axis(&mut meta, "sizeVariations", "defaultSizeIndex", records, axis);
        }

        if !self.positions.is_empty() {
            meta.insert(
                POSITIONS_KEY.to_string(),
                Value::Object(std::mem::take(&mut self.positions)),
            );
        }

        let mut fields = Vec::new();
        for (key, raw) in [
            ("name", draft.name()),
            ("description", draft.description()),
            ("price", draft.price()),
        ] {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                fields.push((key.to_string(), trimmed.to_string()));
            }
        }
        fields.push(("category".to_string(), draft.category().as_str().to_string()));

        debug!(
            category = %draft.category(),
            parts = self.parts.len(),
            update = draft.existing_id().is_some(),
            "Payload serialized"
        );

        Ok(WirePayload {
            category: draft.category(),
            existing_id: draft.existing_id().map(String::from),
            fields,
            metadata: Value::Object(meta),
            parts: self.parts,
        })
    }

    // -- Media -------------------------------------------------------------

    /// Encode an ordered collection.
    ///
    /// Returns the URL array when at least one slot is persisted (pending
    /// positions hold `null`), or `None` when the collection is empty or
    /// entirely pending and arrival order is enough.
    fn encode_collection(
        &mut self,
        target: MediaTarget,
        coll: &MediaCollection,
    ) -> Result<Option<Value>> {
        if coll.is_empty() {
            return Ok(None);
        }
        let id = collection_id(target);
        if let Some(index) = coll.first_reserved() {
            warn!(collection = %id, index, "Reserved slot reached the serializer");
            return Err(CatalogError::UnattachedSlot {
                collection: id,
                index,
            });
        }

        let mut urls = Vec::with_capacity(coll.len());
        let mut positions = Vec::new();
        for (index, slot) in coll.iter().enumerate() {
            match slot {
                MediaSlot::Persisted { url } => urls.push(Value::from(url.as_str())),
                MediaSlot::Pending { handle } => {
                    let name = part_name(&id, index);
                    self.push_part(name.clone(), handle.clone())?;
                    positions.push(json!({ "index": index, "part": name }));
                    urls.push(Value::Null);
                }
                MediaSlot::Empty => {}
            }
        }

        if !coll.has_persisted() {
            return Ok(None);
        }
        if !positions.is_empty() {
            self.positions.insert(id, Value::Array(positions));
        }
        Ok(Some(Value::Array(urls)))
    }

    /// A single-image collection: persisted URL becomes `imageLink`, a
    /// pending file becomes the `<collection>[0]` part.
    fn encode_main_image(
        &mut self,
        target: MediaTarget,
        coll: &MediaCollection,
        obj: &mut Map<String, Value>,
    ) -> Result<()> {
        match coll.get(0) {
            None => Ok(()),
            Some(MediaSlot::Persisted { url }) => {
                obj.insert("imageLink".to_string(), Value::from(url.as_str()));
                Ok(())
            }
            Some(MediaSlot::Pending { handle }) => {
                self.push_part(part_name(&collection_id(target), 0), handle.clone())
            }
            Some(MediaSlot::Empty) => Err(CatalogError::UnattachedSlot {
                collection: collection_id(target),
                index: 0,
            }),
        }
    }

    fn push_part(&mut self, name: String, handle: crate::models::BinaryHandle) -> Result<()> {
        if !self.names.insert(name.clone()) {
            return Err(CatalogError::CollectionNameCollision(name));
        }
        self.parts.push(WirePart { name, handle });
        Ok(())
    }

    // -- Variants ----------------------------------------------------------

    fn encode_metal(
        &mut self,
        index: usize,
        v: &MetalVariant,
        default: Option<usize>,
    ) -> Result<Value> {
        let mut obj = Map::new();
        put_text(&mut obj, "metal", &v.metal);
        put_text(&mut obj, "displayName", &v.display_name);
        put_text(&mut obj, "carat", &v.carat);
        put_text(&mut obj, "color", &v.color);
        put_number(&mut obj, "priceAdjustment", v.price_adjustment);
        put_number(&mut obj, "stockCount", v.stock_count.map(f64::from));
        obj.insert("available".to_string(), Value::from(v.available));
        obj.insert("isDefault".to_string(), Value::from(default == Some(index)));
        self.encode_main_image(MediaTarget::MetalMainImage(index), &v.main_image, &mut obj)?;
        if let Some(images) = self.encode_collection(MediaTarget::MetalGallery(index), &v.gallery)? {
            obj.insert("images".to_string(), images);
        }
        Ok(Value::Object(obj))
    }
}

fn encode_origin(v: &OriginVariant, is_default: bool) -> Value {
    let mut obj = Map::new();
    obj.insert("origin".to_string(), Value::from(v.origin.as_str()));
    put_text(&mut obj, "displayName", &v.display_name);
    put_number(&mut obj, "priceAdjustment", v.price_adjustment);
    obj.insert("available".to_string(), Value::from(v.available));
    put_text(&mut obj, "description", &v.description);
    obj.insert("isDefault".to_string(), Value::from(is_default));
    Value::Object(obj)
}

fn encode_size(v: &SizeVariant, is_default: bool) -> Value {
    let mut obj = Map::new();
    put_text(&mut obj, "size", &v.size);
    put_text(&mut obj, "displayName", &v.display_name);
    put_number(&mut obj, "priceAdjustment", v.price_adjustment);
    put_number(&mut obj, "stockCount", v.stock_count.map(f64::from));
    obj.insert("available".to_string(), Value::from(v.available));
    put_text(&mut obj, "description", &v.description);
    obj.insert("isDefault".to_string(), Value::from(is_default));
    Value::Object(obj)
}

fn put_axis<R: VariantRecord>(
    meta: &mut Map<String, Value>,
    key: &str,
    default_key: &str,
    records: Vec<Value>,
    axis: &VariantAxis<R>,
) {
    if records.is_empty() {
        return;
    }
    meta.insert(key.to_string(), Value::Array(records));
    if let Some(d) = axis.default_index() {
        meta.insert(default_key.to_string(), Value::from(d));
    }
}

fn put_text(obj: &mut Map<String, Value>, key: &str, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        obj.insert(key.to_string(), Value::from(trimmed));
    }
}

fn put_number(obj: &mut Map<String, Value>, key: &str, value: Option<f64>) {
    if let Some(n) = value.filter(|n| n.is_finite()) {
        obj.insert(key.to_string(), schema::number_value(n));
    }
}
