use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for media items inside a draft.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
}

/// Where an asset entered the draft from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaOrigin {
    Camera,
    Library,
}

/// Room tags assignable to gallery items and countable on the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Salon,
    Chambre,
    Cuisine,
    SalleDeBain,
    Balcon,
}

impl RoomKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Salon,
            Self::Chambre,
            Self::Cuisine,
            Self::SalleDeBain,
            Self::Balcon,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Salon => "Salon",
            Self::Chambre => "Chambre",
            Self::Cuisine => "Cuisine",
            Self::SalleDeBain => "Salle de bain",
            Self::Balcon => "Balcon",
        }
    }
}

/// One visual asset in the draft gallery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub kind: MediaKind,
    pub source_uri: String,
    pub assigned_room: Option<RoomKind>,
    pub muted: bool,
    pub duration_seconds: f32,
    pub origin: MediaOrigin,
}

impl MediaItem {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Volume presets for the preview player, reapplied live on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumePreset {
    Muted,
    Low,
    Medium,
    Full,
}

impl VolumePreset {
    pub const fn gain(self) -> f32 {
        match self {
            Self::Muted => 0.0,
            Self::Low => 0.3,
            Self::Medium => 0.6,
            Self::Full => 1.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Muted => "Muted",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::Full => "Full",
        }
    }
}

/// Background track preference attached to the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicTrack {
    pub id: String,
    pub title: String,
}

/// Promotional rule: stays of at least `min_nights` get `percent` off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub min_nights: u8,
    pub percent: u8,
}

/// Location details resolved through the place-lookup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlace {
    pub place_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub city: Option<String>,
    pub district: Option<String>,
}

/// The in-progress listing being composed or edited.
///
/// Mutated exclusively through the editor session; discarded on navigation
/// away without save, persisted through the listing repository on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub listing_id: Option<ListingId>,
    pub title: String,
    pub price_input: String,
    pub property_type: String,
    pub address_input: String,
    pub resolved_place: Option<ResolvedPlace>,
    pub city_input: String,
    pub city_place_id: Option<String>,
    pub description: String,
    pub room_counts: BTreeMap<RoomKind, u8>,
    pub amenities: BTreeSet<String>,
    pub cover_uri: Option<String>,
    pub music_track: Option<MusicTrack>,
    pub discount: Option<DiscountRule>,
}

impl Draft {
    /// Empty draft for a brand-new listing.
    pub fn new() -> Self {
        Self {
            listing_id: None,
            title: String::new(),
            price_input: String::new(),
            property_type: String::new(),
            address_input: String::new(),
            resolved_place: None,
            city_input: String::new(),
            city_place_id: None,
            description: String::new(),
            room_counts: BTreeMap::new(),
            amenities: BTreeSet::new(),
            cover_uri: None,
            music_track: None,
            discount: None,
        }
    }

    pub fn total_rooms(&self) -> u32 {
        self.room_counts.values().map(|count| u32::from(*count)).sum()
    }

    /// Price parsed after stripping digit-group separators; `None` when the
    /// input is empty or not a positive number.
    pub fn parsed_price(&self) -> Option<f64> {
        let cleaned: String = self
            .price_input
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let value: f64 = cleaned.parse().ok()?;
        (value > 0.0).then_some(value)
    }
}

impl Default for Draft {
    fn default() -> Self {
        Self::new()
    }
}
