use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config;
use crate::error::{CatalogError, Result};
use crate::wire;

use super::media::{AttachmentPolicy, BinaryHandle, MediaCollection, MediaSlot};
use super::preview::PreviewRegistry;
use super::record::{scalar_to_input, ProductRecord};
use super::records::{
    DiamondOrigin, MetalField, MetalVariant, OriginField, OriginVariant, SizeField, SizeVariant,
};
use super::variant::{VariantAxis, VariantRecord};

// ---------------------------------------------------------------------------
// ProductCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProductCategory {
    LabGrownDiamond,
    NaturalDiamond,
    Jewelry,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::LabGrownDiamond => "lab-grown-diamond",
            ProductCategory::NaturalDiamond => "natural-diamond",
            ProductCategory::Jewelry => "jewelry",
        }
    }

    pub fn gallery_capacity(&self) -> usize {
        match self {
            ProductCategory::Jewelry => config::JEWELRY_GALLERY_CAPACITY,
            _ => config::DIAMOND_GALLERY_CAPACITY,
        }
    }

    pub fn has_metal_axis(&self) -> bool {
        matches!(self, ProductCategory::Jewelry)
    }

    pub fn has_size_axis(&self) -> bool {
        matches!(self, ProductCategory::Jewelry)
    }

    pub fn has_origin_axis(&self) -> bool {
        matches!(self, ProductCategory::LabGrownDiamond)
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MediaTarget - addresses one media collection inside a draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTarget {
    MainImage,
    Gallery,
    MetalMainImage(usize),
    MetalGallery(usize),
}

// ---------------------------------------------------------------------------
// SubmitGuard - at most one submit in flight per draft
// ---------------------------------------------------------------------------

/// Held for the duration of a submit; clears the draft's busy flag on drop.
#[derive(Debug)]
pub struct SubmitGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// ---------------------------------------------------------------------------
// ProductDraft
// ---------------------------------------------------------------------------

const BASE_FIELDS: &[&str] = &["name", "description", "price"];

/// A product being created or edited.
///
/// All media and variant changes go through the methods below so that
/// previews are released and derived fields stay current.
#[derive(Debug)]
pub struct ProductDraft {
    category: ProductCategory,
    existing_id: Option<String>,
    name: String,
    description: String,
    price: String,
    specifications: BTreeMap<String, String>,
    main_image: MediaCollection,
    gallery: MediaCollection,
    metal: Option<VariantAxis<MetalVariant>>,
    origin: Option<VariantAxis<OriginVariant>>,
    size: Option<VariantAxis<SizeVariant>>,
    previews: PreviewRegistry,
    policy: AttachmentPolicy,
    revision: u64,
    busy: Arc<AtomicBool>,
}

impl ProductDraft {
    /// Empty draft for a new product.
    pub fn new(category: ProductCategory) -> Self {
        Self {
            category,
            existing_id: None,
            name: String::new(),
            description: String::new(),
            price: String::new(),
            specifications: BTreeMap::new(),
            main_image: MediaCollection::bounded("main image", config::MAIN_IMAGE_CAPACITY),
            gallery: MediaCollection::bounded("gallery", category.gallery_capacity()),
            metal: category.has_metal_axis().then(VariantAxis::new),
            origin: category.has_origin_axis().then(VariantAxis::new),
            size: category.has_size_axis().then(VariantAxis::new),
            previews: PreviewRegistry::new(),
            policy: AttachmentPolicy::default(),
            revision: 0,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Draft populated from an existing product for editing.
    pub fn from_record(category: ProductCategory, record: &ProductRecord) -> Result<Self> {
        let mut draft = Self::new(category);
        draft.existing_id = record.id.clone();
        draft.name = record.name.clone().unwrap_or_default();
        draft.description = record.description.clone().unwrap_or_default();
        draft.price = record
            .price
            .as_ref()
            .and_then(scalar_to_input)
            .unwrap_or_default();

        for (key, value) in &record.specifications {
            if wire::is_structural_key(key) {
                debug!(field = %key, "Skipping structural inbound field");
                continue;
            }
            match scalar_to_input(value) {
                Some(v) => {
                    draft.specifications.insert(key.clone(), v);
                }
                None => debug!(field = %key, "Skipping non-scalar inbound field"),
            }
        }

        if let Some(link) = record.image_link.as_deref().filter(|l| !l.trim().is_empty()) {
            draft.main_image.insert(MediaSlot::from_url(link))?;
        }
        draft.gallery = MediaCollection::from_urls(
            "gallery",
            Some(category.gallery_capacity()),
            &record.images,
        )?;

        if let Some(axis) = draft.metal.as_mut() {
            for (i, v) in record.metal_variations.iter().enumerate() {
                let mut variant = MetalVariant::new(
                    v.carat.as_deref().unwrap_or_default(),
                    v.color.as_deref().unwrap_or_default(),
                );
                variant.price_adjustment = v.price_adjustment;
                variant.stock_count = v.stock_count;
                variant.available = v.available.unwrap_or(true);
                if let Some(link) = v.image_link.as_deref().filter(|l| !l.trim().is_empty()) {
                    variant.main_image.insert(MediaSlot::from_url(link))?;
                }
                variant.gallery = MediaCollection::from_urls(
                    "metal gallery",
                    Some(config::VARIANT_GALLERY_CAPACITY),
                    &v.images,
                )?;
                axis.add(variant)?;
                if v.is_default == Some(true) {
                    axis.set_default(i)?;
                }
            }
            if let Some(d) = record.default_metal_index.filter(|d| *d < axis.len()) {
                axis.set_default(d)?;
            }
        }

        if let Some(axis) = draft.origin.as_mut() {
            for (i, v) in record.origin_variations.iter().enumerate() {
                let mut variant = OriginVariant::new(v.origin.parse::<DiamondOrigin>()?);
                variant.price_adjustment = v.price_adjustment;
                variant.available = v.available.unwrap_or(true);
                variant.description = v.description.clone().unwrap_or_default();
                axis.add(variant)?;
                if v.is_default == Some(true) {
                    axis.set_default(i)?;
                }
            }
            if let Some(d) = record.default_origin_index.filter(|d| *d < axis.len()) {
                axis.set_default(d)?;
            }
        }

        if let Some(axis) = draft.size.as_mut() {
            for (i, v) in record.size_variations.iter().enumerate() {
                let mut variant = SizeVariant::new(&v.size);
                variant.display_name = v.display_name.clone().unwrap_or_default();
                variant.price_adjustment = v.price_adjustment;
                variant.stock_count = v.stock_count;
                variant.available = v.available.unwrap_or(true);
                variant.description = v.description.clone().unwrap_or_default();
                axis.add(variant)?;
                if v.is_default == Some(true) {
                    axis.set_default(i)?;
                }
            }
            if let Some(d) = record.default_size_index.filter(|d| *d < axis.len()) {
                axis.set_default(d)?;
            }
        }

        Ok(draft)
    }

    /// Replace the attachment policy (size limit, accepted MIME types).
    pub fn with_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    // -- Accessors ---------------------------------------------------------

    pub fn category(&self) -> ProductCategory {
        self.category
    }

    pub fn existing_id(&self) -> Option<&str> {
        self.existing_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn specifications(&self) -> &BTreeMap<String, String> {
        &self.specifications
    }

    pub fn main_image(&self) -> &MediaCollection {
        &self.main_image
    }

    pub fn gallery(&self) -> &MediaCollection {
        &self.gallery
    }

    pub fn metal_axis(&self) -> Option<&VariantAxis<MetalVariant>> {
        self.metal.as_ref()
    }

    pub fn origin_axis(&self) -> Option<&VariantAxis<OriginVariant>> {
        self.origin.as_ref()
    }

    pub fn size_axis(&self) -> Option<&VariantAxis<SizeVariant>> {
        self.size.as_ref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Bumped on every successful mutation; callers re-validate when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Look up any scalar field, base or category-specific.
    pub fn field(&self, key: &str) -> Option<&str> {
        match key {
            "name" => Some(self.name.as_str()),
            "description" => Some(self.description.as_str()),
            "price" => Some(self.price.as_str()),
            _ => self.specifications.get(key).map(String::as_str),
        }
    }

    /// The main image's persisted URL, if any.
    pub fn image_link(&self) -> Option<&str> {
        self.main_image.get(0).and_then(MediaSlot::url)
    }

    // -- Scalars -----------------------------------------------------------

    /// Set a scalar form field. An empty value clears a specification field.
    ///
    /// `imageLink` sets (or, when empty, clears) a persisted main image.
    /// Other keys the wire format uses for structure are rejected.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "name" => self.name = value.to_string(),
            "description" => self.description = value.to_string(),
            "price" => self.price = value.to_string(),
            "imageLink" => return self.set_image_link(value),
            _ if wire::is_structural_key(key) => {
                warn!(field = %key, "Rejected write to structural field");
                return Err(CatalogError::InvalidArgument(format!(
                    "{key} is managed by the draft and cannot be set as a field"
                )));
            }
            _ if value.is_empty() => {
                self.specifications.remove(key);
            }
            _ => {
                self.specifications.insert(key.to_string(), value.to_string());
            }
        }
        self.touch();
        Ok(())
    }

    fn set_image_link(&mut self, url: &str) -> Result<()> {
        if !url.trim().is_empty() {
            self.attach_url(MediaTarget::MainImage, url)?;
        } else if self.main_image.get(0).is_some_and(MediaSlot::is_persisted) {
            self.remove(MediaTarget::MainImage, 0)?;
        }
        Ok(())
    }

    pub fn is_base_field(key: &str) -> bool {
        BASE_FIELDS.contains(&key)
    }

    // -- Media -------------------------------------------------------------

    /// Attach a local file.
    ///
    /// For single-image targets an existing image is replaced; otherwise
    /// the file is appended. Returns the slot index and its preview URL.
    pub fn attach(&mut self, target: MediaTarget, handle: BinaryHandle) -> Result<(usize, String)> {
        self.policy.check(&handle)?;
        let slot = MediaSlot::pending(handle.clone());
        let (index, displaced) = self.with_collection(target, |c| {
            if c.capacity() == Some(1) && c.len() == 1 {
                Ok((0, Some(c.replace_at(0, slot)?)))
            } else {
                c.insert(slot)?;
                Ok((c.len() - 1, None))
            }
        })?;
        if let Some(old) = displaced {
            self.previews.revoke(&old);
        }
        let preview = self.previews.create(&handle);
        Ok((index, preview))
    }

    /// Append (or, for single-image targets, set) a persisted URL.
    pub fn attach_url(&mut self, target: MediaTarget, url: &str) -> Result<usize> {
        let slot = MediaSlot::from_url(url);
        let (index, displaced) = self.with_collection(target, |c| {
            if c.capacity() == Some(1) && c.len() == 1 {
                Ok((0, Some(c.replace_at(0, slot)?)))
            } else {
                c.insert(slot)?;
                Ok((c.len() - 1, None))
            }
        })?;
        if let Some(old) = displaced {
            self.previews.revoke(&old);
        }
        Ok(index)
    }

    /// Reserve a position that a file will be attached to later.
    pub fn reserve(&mut self, target: MediaTarget) -> Result<usize> {
        self.with_collection(target, |c| c.reserve())
    }

    /// Swap the image at `index` for a local file.
    ///
    /// A policy failure is recorded against that slot and returned.
    pub fn replace(&mut self, target: MediaTarget, index: usize, handle: BinaryHandle) -> Result<String> {
        if let Err(e) = self.policy.check(&handle) {
            let message = e.to_string();
            if let Err(slot_err) = self.with_collection(target, |c| c.set_error(index, &message)) {
                warn!(error = %slot_err, "Could not record attachment error");
            }
            return Err(e);
        }
        let slot = MediaSlot::pending(handle.clone());
        let old = self.with_collection(target, |c| c.replace_at(index, slot))?;
        self.previews.revoke(&old);
        Ok(self.previews.create(&handle))
    }

    /// Remove the image at `index`.
    ///
    /// The top-level gallery must keep at least one image.
    pub fn remove(&mut self, target: MediaTarget, index: usize) -> Result<MediaSlot> {
        if target == MediaTarget::Gallery && self.gallery.len() <= 1 && index < self.gallery.len() {
            return Err(CatalogError::MinimumSlots {
                collection: self.gallery.label().to_string(),
                min: 1,
            });
        }
        let old = self.with_collection(target, |c| c.remove_at(index))?;
        self.previews.revoke(&old);
        Ok(old)
    }

    /// Replace every image of the target with fresh local files.
    pub fn replace_all(&mut self, target: MediaTarget, handles: Vec<BinaryHandle>) -> Result<()> {
        for h in &handles {
            self.policy.check(h)?;
        }
        let slots = handles.iter().cloned().map(MediaSlot::pending).collect();
        let displaced = self.with_collection(target, |c| c.replace_all(slots))?;
        self.previews.revoke_all(&displaced);
        for h in &handles {
            self.previews.create(h);
        }
        Ok(())
    }

    /// Record a user-facing message against a slot.
    pub fn set_slot_error(&mut self, target: MediaTarget, index: usize, message: &str) -> Result<()> {
        self.with_collection(target, |c| c.set_error(index, message))
    }

    pub fn collection(&self, target: MediaTarget) -> Result<&MediaCollection> {
        match target {
            MediaTarget::MainImage => Ok(&self.main_image),
            MediaTarget::Gallery => Ok(&self.gallery),
            MediaTarget::MetalMainImage(v) => Ok(&self.metal_record(v)?.main_image),
            MediaTarget::MetalGallery(v) => Ok(&self.metal_record(v)?.gallery),
        }
    }

    fn metal_record(&self, index: usize) -> Result<&MetalVariant> {
        let axis = self
            .metal
            .as_ref()
            .ok_or_else(|| CatalogError::AxisUnavailable(MetalVariant::AXIS.to_string()))?;
        axis.get(index).ok_or(CatalogError::IndexOutOfRange {
            index,
            len: axis.len(),
        })
    }

    fn with_collection<T, F>(&mut self, target: MediaTarget, f: F) -> Result<T>
    where
        F: FnOnce(&mut MediaCollection) -> Result<T>,
    {
        let out = match target {
            MediaTarget::MainImage => f(&mut self.main_image),
            MediaTarget::Gallery => f(&mut self.gallery),
            MediaTarget::MetalMainImage(v) => {
                axis_mut(&mut self.metal)?.modify(v, |r| f(&mut r.main_image))
            }
            MediaTarget::MetalGallery(v) => {
                axis_mut(&mut self.metal)?.modify(v, |r| f(&mut r.gallery))
            }
        }?;
        self.touch();
        Ok(out)
    }

    // -- Variant axes ------------------------------------------------------

    pub fn add_metal_variant(&mut self, variant: MetalVariant) -> Result<usize> {
        let index = axis_mut(&mut self.metal)?.add(variant)?;
        self.touch();
        Ok(index)
    }

    pub fn update_metal_variant(&mut self, index: usize, field: MetalField) -> Result<&MetalVariant> {
        axis_mut(&mut self.metal)?.update(index, field)?;
        self.touch();
        self.metal_record(index)
    }

    pub fn remove_metal_variant(&mut self, index: usize) -> Result<MetalVariant> {
        let removed = axis_mut(&mut self.metal)?.remove(index)?;
        self.previews.revoke_all(removed.media_slots());
        self.touch();
        Ok(removed)
    }

    pub fn set_default_metal(&mut self, index: usize) -> Result<()> {
        axis_mut(&mut self.metal)?.set_default(index)?;
        self.touch();
        Ok(())
    }

    pub fn add_origin_variant(&mut self, variant: OriginVariant) -> Result<usize> {
        let index = axis_mut(&mut self.origin)?.add(variant)?;
        self.touch();
        Ok(index)
    }

    pub fn update_origin_variant(&mut self, index: usize, field: OriginField) -> Result<&OriginVariant> {
        axis_mut(&mut self.origin)?.update(index, field)?;
        self.touch();
        self.origin
            .as_ref()
            .and_then(|a| a.get(index))
            .ok_or(CatalogError::IndexOutOfRange { index, len: 0 })
    }

    pub fn remove_origin_variant(&mut self, index: usize) -> Result<OriginVariant> {
        let removed = axis_mut(&mut self.origin)?.remove(index)?;
        self.touch();
        Ok(removed)
    }

    pub fn set_default_origin(&mut self, index: usize) -> Result<()> {
        axis_mut(&mut self.origin)?.set_default(index)?;
        self.touch();
        Ok(())
    }

    pub fn add_size_variant(&mut self, variant: SizeVariant) -> Result<usize> {
        let index = axis_mut(&mut self.size)?.add(variant)?;
        self.touch();
        Ok(index)
    }

    pub fn update_size_variant(&mut self, index: usize, field: SizeField) -> Result<&SizeVariant> {
        axis_mut(&mut self.size)?.update(index, field)?;
        self.touch();
        self.size
            .as_ref()
            .and_then(|a| a.get(index))
            .ok_or(CatalogError::IndexOutOfRange { index, len: 0 })
    }

    pub fn remove_size_variant(&mut self, index: usize) -> Result<SizeVariant> {
        let removed = axis_mut(&mut self.size)?.remove(index)?;
        self.touch();
        Ok(removed)
    }

    pub fn set_default_size(&mut self, index: usize) -> Result<()> {
        axis_mut(&mut self.size)?.set_default(index)?;
        self.touch();
        Ok(())
    }

    // -- Submit state ------------------------------------------------------

    /// Mark the draft busy. Fails while another submit holds the guard.
    pub fn begin_submit(&self) -> Result<SubmitGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(category = %self.category, "Submit rejected, already in flight");
            return Err(CatalogError::SubmitInFlight);
        }
        Ok(SubmitGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Release every live preview. Called when the draft is discarded.
    pub fn discard(mut self) -> usize {
        let mut slots: Vec<MediaSlot> = self.main_image.clear();
        slots.extend(self.gallery.clear());
        if let Some(axis) = self.metal.as_ref() {
            for v in axis.iter() {
                slots.extend(v.media_slots().into_iter().cloned());
            }
        }
        self.previews.revoke_all(&slots)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn axis_mut<R: VariantRecord>(axis: &mut Option<VariantAxis<R>>) -> Result<&mut VariantAxis<R>> {
    axis.as_mut()
        .ok_or_else(|| CatalogError::AxisUnavailable(R::AXIS.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_selects_axes() {
        let jewelry = ProductDraft::new(ProductCategory::Jewelry);
        assert!(jewelry.metal_axis().is_some());
        assert!(jewelry.size_axis().is_some());
        assert!(jewelry.origin_axis().is_none());

        let lab = ProductDraft::new(ProductCategory::LabGrownDiamond);
        assert!(lab.origin_axis().is_some());
        assert!(lab.metal_axis().is_none());
    }

    #[test]
    fn set_field_routes_base_and_specifications() {
        let mut d = ProductDraft::new(ProductCategory::NaturalDiamond);
        d.set_field("name", "Oval 1.5").unwrap();
        d.set_field("shape", "Oval").unwrap();
        assert_eq!(d.name(), "Oval 1.5");
        assert_eq!(d.field("shape"), Some("Oval"));
        d.set_field("shape", "").unwrap();
        assert_eq!(d.field("shape"), None);
        assert_eq!(d.revision(), 3);
        assert!(ProductDraft::is_base_field("price"));
        assert!(!ProductDraft::is_base_field("shape"));
    }

    #[test]
    fn submit_guard_releases_on_drop() {
        let d = ProductDraft::new(ProductCategory::Jewelry);
        {
            let _g = d.begin_submit().unwrap();
            assert!(d.is_submitting());
            assert!(matches!(d.begin_submit(), Err(CatalogError::SubmitInFlight)));
        }
        assert!(!d.is_submitting());
        assert!(d.begin_submit().is_ok());
    }
}
