use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::AvailabilityCalendar;
use super::domain::{DiscountRule, Draft, ListingId, MediaKind, MediaItem, RoomKind};
use super::media::MediaSet;

/// Gallery entry as persisted by the listing repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayloadItem {
    pub uri: String,
    pub kind: MediaKind,
    pub room: Option<RoomKind>,
    pub muted: bool,
}

impl From<&MediaItem> for MediaPayloadItem {
    fn from(item: &MediaItem) -> Self {
        Self {
            uri: item.source_uri.clone(),
            kind: item.kind,
            room: item.assigned_room,
            muted: item.muted,
        }
    }
}

/// Everything the external listing repository needs to persist one save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPayload {
    pub title: String,
    pub price: f64,
    pub property_type: String,
    pub address: String,
    pub place_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: String,
    pub city_place_id: Option<String>,
    pub district: Option<String>,
    pub description: String,
    pub rooms: Vec<(RoomKind, u8)>,
    pub amenities: Vec<String>,
    pub media: Vec<MediaPayloadItem>,
    pub cover_uri: Option<String>,
    pub blocked_dates: BTreeSet<NaiveDate>,
    pub music_track_id: Option<String>,
    pub discount: Option<DiscountRule>,
    /// Distinguishes publish from save-as-draft.
    pub publish: bool,
}

/// Assemble the repository payload from the validated draft state. Price
/// falls back to zero only on the pre-validation paths that never submit.
pub fn build_payload(
    draft: &Draft,
    media: &MediaSet,
    calendar: &AvailabilityCalendar,
    publish: bool,
) -> ListingPayload {
    let place = draft.resolved_place.as_ref();
    ListingPayload {
        title: draft.title.trim().to_string(),
        price: draft.parsed_price().unwrap_or(0.0),
        property_type: draft.property_type.clone(),
        address: draft.address_input.trim().to_string(),
        place_id: place.map(|p| p.place_id.clone()),
        latitude: place.map(|p| p.latitude),
        longitude: place.map(|p| p.longitude),
        city: draft.city_input.trim().to_string(),
        city_place_id: draft.city_place_id.clone(),
        district: place.and_then(|p| p.district.clone()),
        description: draft.description.trim().to_string(),
        rooms: draft
            .room_counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(room, count)| (*room, *count))
            .collect(),
        amenities: draft.amenities.iter().cloned().collect(),
        media: media.items().iter().map(MediaPayloadItem::from).collect(),
        cover_uri: draft.cover_uri.clone(),
        blocked_dates: calendar.blocked().clone(),
        music_track_id: draft.music_track.as_ref().map(|track| track.id.clone()),
        discount: draft.discount,
        publish,
    }
}

/// External persistence collaborator for listings.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, payload: ListingPayload) -> Result<ListingId, RepositoryError>;
    async fn update(&self, id: &ListingId, payload: ListingPayload) -> Result<(), RepositoryError>;
    async fn delete(&self, id: &ListingId) -> Result<(), RepositoryError>;
    async fn has_outstanding_payments(&self, id: &ListingId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("listing not found")]
    NotFound,
    #[error("listing repository unavailable: {0}")]
    Unavailable(String),
}
