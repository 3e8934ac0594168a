//! Generic variant axis: an ordered list of typed records with one default.

use tracing::{debug, warn};

use crate::error::{CatalogError, Result};

use super::media::MediaSlot;

// ---------------------------------------------------------------------------
// VariantRecord
// ---------------------------------------------------------------------------

/// One option within an axis (a metal, an origin, a size).
pub trait VariantRecord: Clone + std::fmt::Debug {
    /// Typed field change accepted by [`VariantAxis::update`].
    type Field;

    /// Axis name used in logs and error messages.
    const AXIS: &'static str;

    /// Maximum number of records the axis accepts.
    const CAPACITY: Option<usize> = None;

    fn apply(&mut self, field: Self::Field);

    /// Recompute derived fields from the current field state.
    fn derive_fields(self) -> Self;

    /// Value that must be unique across the axis, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }

    fn duplicate_error(key: String) -> CatalogError {
        CatalogError::InvalidArgument(format!("duplicate {} value: {}", Self::AXIS, key))
    }

    /// Every media slot owned by the record.
    fn media_slots(&self) -> Vec<&MediaSlot> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// VariantAxis
// ---------------------------------------------------------------------------

/// Ordered records plus the index of the default one.
///
/// `default_index` is `Some(i)` with `i < len` whenever the axis is
/// non-empty, and `None` when it is empty.
#[derive(Debug, Clone)]
pub struct VariantAxis<R: VariantRecord> {
    records: Vec<R>,
    default_index: Option<usize>,
}

impl<R: VariantRecord> Default for VariantAxis<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            default_index: None,
        }
    }
}

impl<R: VariantRecord> VariantAxis<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn default_index(&self) -> Option<usize> {
        self.default_index
    }

    pub fn default_record(&self) -> Option<&R> {
        self.default_index.and_then(|i| self.records.get(i))
    }

    /// Append a record. The first record added becomes the default.
    pub fn add(&mut self, record: R) -> Result<usize> {
        if let Some(cap) = R::CAPACITY {
            if self.records.len() >= cap {
                warn!(axis = R::AXIS, capacity = cap, "Variant add rejected, axis full");
                return Err(CatalogError::CapacityExceeded {
                    collection: R::AXIS.to_string(),
                    capacity: cap,
                });
            }
        }
        let record = record.derive_fields();
        self.check_unique(&record, None)?;
        self.records.push(record);
        if self.default_index.is_none() {
            self.default_index = Some(0);
        }
        debug!(axis = R::AXIS, len = self.records.len(), "Variant added");
        Ok(self.records.len() - 1)
    }

    /// Remove the record at `index` and repair the default index.
    pub fn remove(&mut self, index: usize) -> Result<R> {
        self.check_index(index)?;
        let removed = self.records.remove(index);
        self.default_index = if self.records.is_empty() {
            None
        } else {
            match self.default_index {
                Some(d) if d == index => Some(0),
                Some(d) if index < d => Some(d - 1),
                other => other,
            }
        };
        debug!(axis = R::AXIS, index, default = ?self.default_index, "Variant removed");
        Ok(removed)
    }

    /// Apply one field change and re-derive.
    pub fn update(&mut self, index: usize, field: R::Field) -> Result<&R> {
        self.modify(index, |r| {
            r.apply(field);
            Ok(())
        })?;
        Ok(&self.records[index])
    }

    /// Run `f` against a copy of the record at `index`, re-derive, and commit
    /// only if the result still satisfies the axis constraints.
    pub fn modify<T, F>(&mut self, index: usize, f: F) -> Result<T>
    where
        F: FnOnce(&mut R) -> Result<T>,
    {
        self.check_index(index)?;
        let mut draft = self.records[index].clone();
        let out = f(&mut draft)?;
        let draft = draft.derive_fields();
        self.check_unique(&draft, Some(index))?;
        self.records[index] = draft;
        Ok(out)
    }

    pub fn set_default(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.default_index = Some(index);
        Ok(())
    }

    /// Unique keys already taken, optionally ignoring one record.
    pub fn used_keys(&self, except: Option<usize>) -> Vec<String> {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != except)
            .filter_map(|(_, r)| r.unique_key())
            .collect()
    }

    fn check_unique(&self, record: &R, except: Option<usize>) -> Result<()> {
        if let Some(key) = record.unique_key() {
            if self.used_keys(except).contains(&key) {
                warn!(axis = R::AXIS, key = %key, "Duplicate variant rejected");
                return Err(R::duplicate_error(key));
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.records.len() {
            return Err(CatalogError::IndexOutOfRange {
                index,
                len: self.records.len(),
            });
        }
        Ok(())
    }
}
