use async_trait::async_trait;

use super::domain::{MediaId, MediaItem, MediaKind, RoomKind};

/// Rejected-mutation results raised by the media set manager.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("a lead video is required before photos can be added")]
    LeadVideoRequired,
    #[error("removing the last video would leave the gallery without its lead video")]
    LeadVideoRemoval,
    #[error("media item not found")]
    NotFound,
    #[error("mute flags apply only to video items")]
    NotAVideo,
}

/// Target shapes for the media-processing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// 9:16 portrait crop applied to gallery photos.
    Portrait,
    /// 1:1 crop applied to the cover image.
    Square,
}

/// External media-processing collaborator, invoked before `append`.
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    async fn crop_to_aspect(&self, source_uri: &str, ratio: AspectRatio)
        -> Result<String, MediaProcessingError>;
    async fn duration_seconds(&self, source_uri: &str) -> Result<f32, MediaProcessingError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaProcessingError {
    #[error("media processing failed: {0}")]
    Processing(String),
}

/// Ordered set of gallery assets upholding the lead-video invariant: once any
/// video has been contributed, a non-empty set keeps its earliest video at
/// index 0 and never becomes video-less.
#[derive(Debug, Default, Clone)]
pub struct MediaSet {
    items: Vec<MediaItem>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated set for editing an existing listing. No invariant check:
    /// legacy listings may predate the lead-video rule, and validation flags
    /// a missing video separately.
    pub fn from_items(items: Vec<MediaItem>) -> Self {
        let mut set = Self { items };
        set.promote_lead_video();
        set
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_video(&self) -> bool {
        self.items.iter().any(MediaItem::is_video)
    }

    pub fn get(&self, id: &MediaId) -> Option<&MediaItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Append an asset, rejecting a photo into an empty set (the caller must
    /// contribute the lead video first).
    pub fn append(&mut self, item: MediaItem) -> Result<(), MediaError> {
        if item.kind == MediaKind::Photo && self.items.is_empty() {
            return Err(MediaError::LeadVideoRequired);
        }

        self.items.push(item);
        self.promote_lead_video();
        self.check_lead_video()
    }

    /// Remove an item, rejecting the removal when it would strand a
    /// non-empty, video-less set that previously had a video.
    pub fn remove(&mut self, id: &MediaId) -> Result<MediaItem, MediaError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or(MediaError::NotFound)?;

        let removes_only_video = self.items[index].is_video()
            && self.items.iter().filter(|item| item.is_video()).count() == 1;
        if removes_only_video && self.items.len() > 1 {
            return Err(MediaError::LeadVideoRemoval);
        }

        let removed = self.items.remove(index);
        self.promote_lead_video();
        self.check_lead_video()?;
        Ok(removed)
    }

    /// Toggle a room tag: assigning the currently held room clears it.
    pub fn toggle_room(&mut self, id: &MediaId, room: RoomKind) -> Result<(), MediaError> {
        let item = self.item_mut(id)?;
        item.assigned_room = match item.assigned_room {
            Some(current) if current == room => None,
            _ => Some(room),
        };
        Ok(())
    }

    pub fn set_muted(&mut self, id: &MediaId, muted: bool) -> Result<(), MediaError> {
        let item = self.item_mut(id)?;
        if !item.is_video() {
            return Err(MediaError::NotAVideo);
        }
        item.muted = muted;
        Ok(())
    }

    fn item_mut(&mut self, id: &MediaId) -> Result<&mut MediaItem, MediaError> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or(MediaError::NotFound)
    }

    /// Move the earliest video to index 0, preserving the relative order of
    /// every other item. A no-op when no video exists or one already leads.
    fn promote_lead_video(&mut self) {
        if let Some(index) = self.items.iter().position(MediaItem::is_video) {
            if index > 0 {
                let video = self.items.remove(index);
                self.items.insert(0, video);
            }
        }
    }

    /// Invariant check run after every structural mutation.
    fn check_lead_video(&self) -> Result<(), MediaError> {
        if self.has_video() && !self.items[0].is_video() {
            return Err(MediaError::LeadVideoRequired);
        }
        Ok(())
    }
}
