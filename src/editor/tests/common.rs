use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::editor::domain::{Draft, ListingId, MediaId, MediaItem, MediaKind, MediaOrigin, RoomKind};
use crate::editor::media::MediaSet;
use crate::editor::repository::{ListingPayload, ListingRepository, RepositoryError};

pub(super) fn video(id: &str) -> MediaItem {
    MediaItem {
        id: MediaId(id.to_string()),
        kind: MediaKind::Video,
        source_uri: format!("file:///{id}.mp4"),
        assigned_room: None,
        muted: false,
        duration_seconds: 32.0,
        origin: MediaOrigin::Camera,
    }
}

pub(super) fn photo(id: &str) -> MediaItem {
    MediaItem {
        id: MediaId(id.to_string()),
        kind: MediaKind::Photo,
        source_uri: format!("file:///{id}.jpg"),
        assigned_room: None,
        muted: false,
        duration_seconds: 0.0,
        origin: MediaOrigin::Library,
    }
}

/// Four items with a lead video: the smallest gallery that validates.
pub(super) fn gallery() -> MediaSet {
    MediaSet::from_items(vec![
        video("vid-1"),
        photo("pic-1"),
        photo("pic-2"),
        photo("pic-3"),
    ])
}

/// A draft that passes every field rule without a resolved place.
pub(super) fn valid_draft() -> Draft {
    let mut draft = Draft::new();
    draft.title = "Studio meublé à Bonapriso".to_string();
    draft.price_input = "25,000".to_string();
    draft.property_type = "Studio".to_string();
    draft.address_input = "Bonapriso, Douala".to_string();
    draft.city_input = "Douala".to_string();
    draft.description = "Studio entièrement meublé au coeur de Bonapriso, à deux minutes du \
                         boulevard. Cuisine équipée, eau chaude, groupe électrogène et parking \
                         sécurisé."
        .to_string();
    draft.room_counts.insert(RoomKind::Salon, 1);
    draft.room_counts.insert(RoomKind::Chambre, 1);
    draft.amenities.insert("wifi".to_string());
    draft.cover_uri = Some("file:///cover.jpg#crop=1x1".to_string());
    draft
}

/// Listing store double with switchable failure modes and call counters.
#[derive(Default)]
pub(super) struct MemoryListings {
    pub(super) listings: Mutex<HashMap<ListingId, ListingPayload>>,
    pub(super) outstanding: AtomicBool,
    pub(super) fail_guard: AtomicBool,
    pub(super) fail_submission: AtomicBool,
    pub(super) delete_calls: AtomicUsize,
    next_id: AtomicU64,
}

impl MemoryListings {
    pub(super) fn stored(&self, id: &ListingId) -> Option<ListingPayload> {
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl ListingRepository for MemoryListings {
    async fn create(&self, payload: ListingPayload) -> Result<ListingId, RepositoryError> {
        if self.fail_submission.load(Ordering::Relaxed) {
            return Err(RepositoryError::Unavailable("backend offline".to_string()));
        }
        let id = ListingId(format!(
            "listing-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed) + 1
        ));
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .insert(id.clone(), payload);
        Ok(id)
    }

    async fn update(&self, id: &ListingId, payload: ListingPayload) -> Result<(), RepositoryError> {
        if self.fail_submission.load(Ordering::Relaxed) {
            return Err(RepositoryError::Unavailable("backend offline".to_string()));
        }
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .insert(id.clone(), payload);
        Ok(())
    }

    async fn delete(&self, id: &ListingId) -> Result<(), RepositoryError> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn has_outstanding_payments(&self, _id: &ListingId) -> Result<bool, RepositoryError> {
        if self.fail_guard.load(Ordering::Relaxed) {
            return Err(RepositoryError::Unavailable("ledger offline".to_string()));
        }
        Ok(self.outstanding.load(Ordering::Relaxed))
    }
}

/// Repository whose `create` parks until the test releases it, so a second
/// submission can be raced against the first.
pub(super) struct BlockingListings {
    pub(super) entered: Arc<tokio::sync::Semaphore>,
    gate: tokio::sync::Semaphore,
}

impl BlockingListings {
    pub(super) fn new() -> Self {
        Self {
            entered: Arc::new(tokio::sync::Semaphore::new(0)),
            gate: tokio::sync::Semaphore::new(0),
        }
    }

    pub(super) fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl ListingRepository for BlockingListings {
    async fn create(&self, _payload: ListingPayload) -> Result<ListingId, RepositoryError> {
        self.entered.add_permits(1);
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        Ok(ListingId("listing-blocked".to_string()))
    }

    async fn update(&self, _id: &ListingId, _payload: ListingPayload) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn delete(&self, _id: &ListingId) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn has_outstanding_payments(&self, _id: &ListingId) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}
