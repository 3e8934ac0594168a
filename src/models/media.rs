use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config;
use crate::error::{CatalogError, Result};

static NEXT_ATTACHMENT_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SLOT_KEY: AtomicU64 = AtomicU64::new(1);

// ---------------------------------------------------------------------------
// BinaryHandle - a local file that has not been uploaded yet
// ---------------------------------------------------------------------------

/// Process-unique identity of an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentId(u64);

impl AttachmentId {
    fn next() -> Self {
        Self(NEXT_ATTACHMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Where the attachment bytes live until submit.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    Path(PathBuf),
    Memory(Arc<Vec<u8>>),
}

/// A pending attachment held by reference.
///
/// Nothing is read into memory until [`read_bytes`](Self::read_bytes) is
/// called by a transport. Two handles are equal only if they come from the
/// same attach call.
#[derive(Debug, Clone)]
pub struct BinaryHandle {
    id: AttachmentId,
    file_name: String,
    mime: String,
    size: u64,
    source: AttachmentSource,
}

impl BinaryHandle {
    /// Wrap in-memory bytes (used by tests and by callers that already
    /// buffered an upload).
    pub fn from_bytes(file_name: &str, mime: &str, bytes: Vec<u8>) -> Self {
        Self {
            id: AttachmentId::next(),
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            size: bytes.len() as u64,
            source: AttachmentSource::Memory(Arc::new(bytes)),
        }
    }

    /// Reference a file on disk. The size comes from filesystem metadata and
    /// the MIME type is guessed from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let meta = fs::metadata(path)?;
        if !meta.is_file() {
            return Err(CatalogError::InvalidArgument(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        Ok(Self {
            id: AttachmentId::next(),
            mime: guess_mime(path),
            file_name,
            size: meta.len(),
            source: AttachmentSource::Path(path.to_path_buf()),
        })
    }

    pub fn id(&self) -> AttachmentId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &AttachmentSource {
        &self.source
    }

    /// Load the attachment bytes. Only transports call this.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.source {
            AttachmentSource::Path(p) => Ok(fs::read(p)?),
            AttachmentSource::Memory(b) => Ok(b.as_ref().clone()),
        }
    }
}

impl PartialEq for BinaryHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BinaryHandle {}

fn guess_mime(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    config::mime_by_extension()
        .get(ext.as_str())
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

// ---------------------------------------------------------------------------
// AttachmentPolicy - size / MIME checks run at attach time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    pub max_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_bytes: config::MAX_ATTACHMENT_BYTES,
            allowed_mime_types: config::allowed_mime_types()
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl AttachmentPolicy {
    pub fn check(&self, handle: &BinaryHandle) -> Result<()> {
        if !self
            .allowed_mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(handle.mime()))
        {
            warn!(file = handle.file_name(), mime = handle.mime(), "Rejected attachment type");
            return Err(CatalogError::UnsupportedMimeType(handle.mime().to_string()));
        }
        if handle.size() > self.max_bytes {
            warn!(file = handle.file_name(), size = handle.size(), "Rejected oversized attachment");
            return Err(CatalogError::OversizedAttachment {
                file_name: handle.file_name().to_string(),
                size: handle.size(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MediaSlot
// ---------------------------------------------------------------------------

/// One logical position in a media collection.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSlot {
    /// Position reserved, no file chosen yet.
    Empty,
    /// Already stored server-side.
    Persisted { url: String },
    /// Local file waiting for upload.
    Pending { handle: BinaryHandle },
}

impl MediaSlot {
    pub fn persisted(url: &str) -> Self {
        MediaSlot::Persisted {
            url: url.to_string(),
        }
    }

    pub fn pending(handle: BinaryHandle) -> Self {
        MediaSlot::Pending { handle }
    }

    /// Convert an inbound URL. A blank URL becomes [`MediaSlot::Empty`],
    /// never a persisted reference to `""`.
    pub fn from_url(url: &str) -> Self {
        let url = url.trim();
        if url.is_empty() {
            MediaSlot::Empty
        } else {
            MediaSlot::persisted(url)
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MediaSlot::Pending { .. })
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, MediaSlot::Persisted { .. })
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, MediaSlot::Empty)
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            MediaSlot::Persisted { url } => Some(url),
            _ => None,
        }
    }

    pub fn handle(&self) -> Option<&BinaryHandle> {
        match self {
            MediaSlot::Pending { handle } => Some(handle),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// MediaCollection
// ---------------------------------------------------------------------------

/// Identity of a slot inside its collection. Survives shifts caused by
/// removals; a replaced slot gets a fresh key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(u64);

impl SlotKey {
    fn next() -> Self {
        Self(NEXT_SLOT_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    key: SlotKey,
    slot: MediaSlot,
}

impl Entry {
    fn new(slot: MediaSlot) -> Self {
        Self {
            key: SlotKey::next(),
            slot,
        }
    }
}

/// What the UI renders for one position.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplaySource {
    Reserved,
    Url(String),
    Local { file_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayEntry {
    pub key: SlotKey,
    pub source: DisplaySource,
    pub error: Option<String>,
}

impl DisplayEntry {
    pub fn is_pending(&self) -> bool {
        matches!(self.source, DisplaySource::Local { .. })
    }
}

/// Ordered, optionally capacity-bounded sequence of media slots.
///
/// The displayed list and the upload list are both views over the same
/// entries, so they always have the same length and index alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaCollection {
    label: String,
    capacity: Option<usize>,
    entries: Vec<Entry>,
    errors: HashMap<SlotKey, String>,
}

impl MediaCollection {
    pub fn new(label: &str, capacity: Option<usize>) -> Self {
        Self {
            label: label.to_string(),
            capacity,
            entries: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn bounded(label: &str, capacity: usize) -> Self {
        Self::new(label, Some(capacity))
    }

    /// Build a collection from inbound URLs, dropping blank entries.
    ///
    /// URLs beyond `capacity` are dropped with a warning so a product saved
    /// before a limit was lowered can still be opened for editing.
    pub fn from_urls(label: &str, capacity: Option<usize>, urls: &[String]) -> Result<Self> {
        let mut coll = Self::new(label, capacity);
        let usable: Vec<&String> = urls.iter().filter(|u| !u.trim().is_empty()).collect();
        let keep = capacity.map_or(usable.len(), |cap| cap.min(usable.len()));
        if keep < usable.len() {
            warn!(
                collection = %label,
                capacity = keep,
                dropped = usable.len() - keep,
                "Inbound media exceeds capacity, dropping trailing URLs"
            );
        }
        for url in &usable[..keep] {
            coll.insert(MediaSlot::from_url(url))?;
        }
        Ok(coll)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.is_some_and(|c| self.entries.len() >= c)
    }

    pub fn get(&self, index: usize) -> Option<&MediaSlot> {
        self.entries.get(index).map(|e| &e.slot)
    }

    pub fn key_at(&self, index: usize) -> Option<SlotKey> {
        self.entries.get(index).map(|e| e.key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaSlot> {
        self.entries.iter().map(|e| &e.slot)
    }

    pub fn slots(&self) -> Vec<MediaSlot> {
        self.iter().cloned().collect()
    }

    // -- Mutations ---------------------------------------------------------

    /// Append a slot.
    pub fn insert(&mut self, slot: MediaSlot) -> Result<()> {
        if let Some(cap) = self.capacity {
            if self.entries.len() >= cap {
                warn!(collection = %self.label, capacity = cap, "Insert rejected, collection full");
                return Err(CatalogError::CapacityExceeded {
                    collection: self.label.clone(),
                    capacity: cap,
                });
            }
        }
        self.entries.push(Entry::new(slot));
        debug!(collection = %self.label, len = self.entries.len(), "Slot inserted");
        Ok(())
    }

    /// Append an [`MediaSlot::Empty`] placeholder and return its index.
    pub fn reserve(&mut self) -> Result<usize> {
        self.insert(MediaSlot::Empty)?;
        Ok(self.entries.len() - 1)
    }

    /// Replace the slot at `index` in place, returning the displaced slot.
    pub fn replace_at(&mut self, index: usize, slot: MediaSlot) -> Result<MediaSlot> {
        self.check_index(index)?;
        let old = std::mem::replace(&mut self.entries[index], Entry::new(slot));
        self.errors.remove(&old.key);
        debug!(collection = %self.label, index, "Slot replaced");
        Ok(old.slot)
    }

    /// Remove the slot at `index`; later slots shift down by one.
    ///
    /// Errors recorded against other slots keep following those slots.
    pub fn remove_at(&mut self, index: usize) -> Result<MediaSlot> {
        self.check_index(index)?;
        let old = self.entries.remove(index);
        self.errors.remove(&old.key);
        debug!(collection = %self.label, index, len = self.entries.len(), "Slot removed");
        Ok(old.slot)
    }

    /// Replace every slot at once, returning the displaced slots.
    pub fn replace_all(&mut self, slots: Vec<MediaSlot>) -> Result<Vec<MediaSlot>> {
        if let Some(cap) = self.capacity {
            if slots.len() > cap {
                warn!(collection = %self.label, capacity = cap, requested = slots.len(), "Replace-all rejected");
                return Err(CatalogError::CapacityExceeded {
                    collection: self.label.clone(),
                    capacity: cap,
                });
            }
        }
        let new_entries = slots.into_iter().map(Entry::new).collect();
        let old = std::mem::replace(&mut self.entries, new_entries);
        self.errors.clear();
        debug!(collection = %self.label, len = self.entries.len(), "All slots replaced");
        Ok(old.into_iter().map(|e| e.slot).collect())
    }

    /// Remove every slot, returning them.
    pub fn clear(&mut self) -> Vec<MediaSlot> {
        self.errors.clear();
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|e| e.slot)
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            warn!(collection = %self.label, index, len = self.entries.len(), "Slot index out of range");
            return Err(CatalogError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    // -- Per-slot errors ---------------------------------------------------

    /// Attach a user-facing message to the slot currently at `index`.
    pub fn set_error(&mut self, index: usize, message: &str) -> Result<()> {
        self.check_index(index)?;
        self.errors
            .insert(self.entries[index].key, message.to_string());
        Ok(())
    }

    pub fn clear_error(&mut self, index: usize) {
        if let Some(e) = self.entries.get(index) {
            self.errors.remove(&e.key);
        }
    }

    pub fn error_at(&self, index: usize) -> Option<&str> {
        self.entries
            .get(index)
            .and_then(|e| self.errors.get(&e.key))
            .map(String::as_str)
    }

    /// `(index, message)` pairs for every slot with an error, in slot order.
    pub fn errors(&self) -> Vec<(usize, String)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| self.errors.get(&e.key).map(|m| (i, m.clone())))
            .collect()
    }

    // -- Views -------------------------------------------------------------

    /// What the UI shows, one entry per slot.
    pub fn display_list(&self) -> Vec<DisplayEntry> {
        self.entries
            .iter()
            .map(|e| DisplayEntry {
                key: e.key,
                source: match &e.slot {
                    MediaSlot::Empty => DisplaySource::Reserved,
                    MediaSlot::Persisted { url } => DisplaySource::Url(url.clone()),
                    MediaSlot::Pending { handle } => DisplaySource::Local {
                        file_name: handle.file_name().to_string(),
                    },
                },
                error: self.errors.get(&e.key).cloned(),
            })
            .collect()
    }

    /// What will upload, aligned index-for-index with [`display_list`](Self::display_list).
    pub fn pending_attachments(&self) -> Vec<Option<&BinaryHandle>> {
        self.entries.iter().map(|e| e.slot.handle()).collect()
    }

    pub fn has_pending(&self) -> bool {
        self.entries.iter().any(|e| e.slot.is_pending())
    }

    pub fn has_persisted(&self) -> bool {
        self.entries.iter().any(|e| e.slot.is_persisted())
    }

    /// Index of the first reserved slot with nothing attached.
    pub fn first_reserved(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.slot.is_reserved())
    }
}
