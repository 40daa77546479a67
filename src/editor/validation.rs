use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::Draft;
use super::media::MediaSet;

/// The required fields of a draft, in the fixed check order used for
/// first-error navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Media,
    Cover,
    Title,
    Price,
    Address,
    City,
    PropertyType,
    Rooms,
    Description,
    Amenities,
}

impl FieldKey {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Media,
            Self::Cover,
            Self::Title,
            Self::Price,
            Self::Address,
            Self::City,
            Self::PropertyType,
            Self::Rooms,
            Self::Description,
            Self::Amenities,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Media => "media",
            Self::Cover => "cover image",
            Self::Title => "title",
            Self::Price => "price",
            Self::Address => "address",
            Self::City => "city",
            Self::PropertyType => "property type",
            Self::Rooms => "rooms",
            Self::Description => "description",
            Self::Amenities => "amenities",
        }
    }
}

/// Per-field error messages; a field absent from the map is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrorMap(BTreeMap<FieldKey, String>);

impl FieldErrorMap {
    pub fn error(&self, key: FieldKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The first invalid field in the fixed check order.
    pub fn first_in_order(&self) -> Option<FieldKey> {
        FieldKey::ordered()
            .into_iter()
            .find(|key| self.0.contains_key(key))
    }

    fn set(&mut self, key: FieldKey, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }
}

/// Thresholds backing the field rules.
#[derive(Debug, Clone, Copy)]
pub struct ValidationConfig {
    pub min_media_items: usize,
    pub min_description_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_media_items: 4,
            min_description_chars: 100,
        }
    }
}

/// Evaluate every rule against the current draft. Pure; rules are
/// independent and can all fail simultaneously.
pub fn check_draft(draft: &Draft, media: &MediaSet, config: &ValidationConfig) -> FieldErrorMap {
    let mut errors = FieldErrorMap::default();

    if media.len() < config.min_media_items || !media.has_video() {
        errors.set(
            FieldKey::Media,
            format!(
                "add at least {} items including one video",
                config.min_media_items
            ),
        );
    }

    if draft.cover_uri.is_none() {
        errors.set(FieldKey::Cover, "choose a cover image");
    }

    if draft.title.trim().is_empty() {
        errors.set(FieldKey::Title, "enter a title");
    }

    if draft.parsed_price().is_none() {
        errors.set(FieldKey::Price, "enter a valid price");
    }

    if !address_is_plausible(draft) {
        errors.set(FieldKey::Address, "enter the address as district, city");
    }

    if draft.city_input.trim().is_empty() {
        errors.set(FieldKey::City, "choose a city");
    }

    if draft.property_type.trim().is_empty() {
        errors.set(FieldKey::PropertyType, "choose a property type");
    }

    if draft.total_rooms() == 0 {
        errors.set(FieldKey::Rooms, "set at least one room");
    }

    if draft.description.trim().chars().count() < config.min_description_chars {
        errors.set(
            FieldKey::Description,
            format!(
                "describe the listing in at least {} characters",
                config.min_description_chars
            ),
        );
    }

    if draft.amenities.is_empty() {
        errors.set(FieldKey::Amenities, "select at least one amenity");
    }

    errors
}

/// A resolved place is always plausible; free text falls back to the
/// "district, city" shape heuristic (at least two comma-separated parts).
fn address_is_plausible(draft: &Draft) -> bool {
    let trimmed = draft.address_input.trim();
    if trimmed.is_empty() {
        return false;
    }
    if draft.resolved_place.is_some() {
        return true;
    }
    trimmed
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .count()
        >= 2
}

/// Sticky error state: errors are *set* only by an explicit [`validate`]
/// call (no flashing while the user types) and *cleared* reactively by
/// [`refresh`] the instant a field's condition becomes satisfied.
///
/// [`validate`]: ValidationState::validate
/// [`refresh`]: ValidationState::refresh
#[derive(Debug, Clone, Default)]
pub struct ValidationState {
    shown: FieldErrorMap,
    config: ValidationConfig,
}

impl ValidationState {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            shown: FieldErrorMap::default(),
            config,
        }
    }

    pub fn shown(&self) -> &FieldErrorMap {
        &self.shown
    }

    pub fn first_invalid(&self) -> Option<FieldKey> {
        self.shown.first_in_order()
    }

    /// Full re-check; surfaces every current error and reports the first
    /// field for scroll-to-error navigation.
    pub fn validate(&mut self, draft: &Draft, media: &MediaSet) -> (FieldErrorMap, Option<FieldKey>) {
        self.shown = check_draft(draft, media, &self.config);
        (self.shown.clone(), self.shown.first_in_order())
    }

    /// Recompute after a draft mutation: keeps only the shown errors whose
    /// condition still fails, never introduces new ones.
    pub fn refresh(&mut self, draft: &Draft, media: &MediaSet) {
        if self.shown.is_empty() {
            return;
        }
        let current = check_draft(draft, media, &self.config);
        let mut retained = FieldErrorMap::default();
        for key in FieldKey::ordered() {
            if self.shown.error(key).is_some() {
                if let Some(message) = current.error(key) {
                    retained.set(key, message);
                }
            }
        }
        self.shown = retained;
    }
}
