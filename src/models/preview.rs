//! Local preview bookkeeping.
//!
//! A preview is created when a pending file is attached and must be revoked
//! once the slot holding it is replaced or removed.

use std::collections::HashMap;

use tracing::debug;

use super::media::{AttachmentId, BinaryHandle, MediaSlot};

#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: HashMap<AttachmentId, String>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or return the existing) preview URL for a pending attachment.
    pub fn create(&mut self, handle: &BinaryHandle) -> String {
        self.live
            .entry(handle.id())
            .or_insert_with(|| format!("preview://{}/{}", handle.id().as_u64(), handle.file_name()))
            .clone()
    }

    pub fn url_for(&self, handle: &BinaryHandle) -> Option<&str> {
        self.live.get(&handle.id()).map(String::as_str)
    }

    /// Release the preview held by a displaced slot, if any.
    pub fn revoke(&mut self, slot: &MediaSlot) -> bool {
        match slot.handle() {
            Some(handle) => {
                let removed = self.live.remove(&handle.id()).is_some();
                if removed {
                    debug!(attachment = handle.id().as_u64(), "Preview revoked");
                }
                removed
            }
            None => false,
        }
    }

    pub fn revoke_all<'a, I>(&mut self, slots: I) -> usize
    where
        I: IntoIterator<Item = &'a MediaSlot>,
    {
        slots.into_iter().filter(|s| self.revoke(s)).count()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
