use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use listing_studio::editor::{
    AspectRatio, Editor, EditorConfig, ListingId, ListingPayload, ListingRepository, LookupError,
    MediaProcessingError, MediaProcessor, PlaceDetails, PlaceDirectory, PlaceFilter,
    PlaceSuggestion, RepositoryError, SessionToken, ValidationConfig,
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub fn editor_config() -> EditorConfig {
    EditorConfig {
        debounce: Duration::from_millis(350),
        blur_close_delay: Duration::from_millis(150),
        validation: ValidationConfig::default(),
    }
}

pub fn build_editor() -> (
    Arc<Editor<MemoryListings, RecordingPlaces, StubProcessor>>,
    Arc<MemoryListings>,
    Arc<RecordingPlaces>,
) {
    let repository = Arc::new(MemoryListings::default());
    let places = Arc::new(RecordingPlaces::default());
    let editor = Editor::new(
        repository.clone(),
        places.clone(),
        Arc::new(StubProcessor),
        editor_config(),
        today(),
    );
    (editor, repository, places)
}

/// Drive the editor to a state that passes every validation rule.
pub async fn compose_valid_listing(
    editor: &Editor<MemoryListings, RecordingPlaces, StubProcessor>,
) {
    editor
        .add_media(
            "file:///tour.mp4",
            listing_studio::editor::MediaKind::Video,
            listing_studio::editor::MediaOrigin::Camera,
        )
        .await
        .expect("video import");
    for index in 1..=3 {
        editor
            .add_media(
                &format!("file:///photo-{index}.jpg"),
                listing_studio::editor::MediaKind::Photo,
                listing_studio::editor::MediaOrigin::Library,
            )
            .await
            .expect("photo import");
    }
    editor.set_cover("file:///photo-1.jpg").await.expect("cover");
    editor.set_title("Studio meublé à Bonapriso").await;
    editor.set_price_input("25,000").await;
    editor.set_property_type("Studio").await;
    editor
        .set_description(
            "Studio entièrement meublé au coeur de Bonapriso, à deux minutes du boulevard. \
             Cuisine équipée, eau chaude, groupe électrogène et parking sécurisé.",
        )
        .await;
    editor
        .set_room_count(listing_studio::editor::RoomKind::Salon, 1)
        .await;
    editor
        .set_room_count(listing_studio::editor::RoomKind::Chambre, 1)
        .await;
    editor.toggle_amenity("wifi").await;
    editor.on_address_input("Bonapriso, Douala").await;
    editor.on_city_input("Douala").await;
}

#[derive(Default)]
pub struct MemoryListings {
    pub listings: Mutex<HashMap<ListingId, ListingPayload>>,
    next_id: AtomicU64,
}

impl MemoryListings {
    pub fn stored(&self, id: &ListingId) -> Option<ListingPayload> {
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
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .insert(id.clone(), payload);
        Ok(())
    }

    async fn delete(&self, id: &ListingId) -> Result<(), RepositoryError> {
        self.listings
            .lock()
            .expect("listings mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn has_outstanding_payments(&self, _id: &ListingId) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

/// Place directory double that records every suggestion query it serves.
#[derive(Default)]
pub struct RecordingPlaces {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl PlaceDirectory for RecordingPlaces {
    async fn fetch_suggestions(
        &self,
        query: &str,
        _session: &SessionToken,
        filter: Option<PlaceFilter>,
    ) -> Result<Vec<PlaceSuggestion>, LookupError> {
        self.queries
            .lock()
            .expect("query mutex poisoned")
            .push(query.to_string());
        let suggestions = match filter {
            Some(PlaceFilter::Cities) => vec![PlaceSuggestion {
                id: "pl-douala".to_string(),
                primary_label: "Douala".to_string(),
                secondary_label: "Douala, Cameroun".to_string(),
            }],
            None => vec![
                PlaceSuggestion {
                    id: "pl-bonapriso".to_string(),
                    primary_label: "Bonapriso".to_string(),
                    secondary_label: "Rue Njo-Njo, Bonapriso, Douala".to_string(),
                },
                PlaceSuggestion {
                    id: "pl-bonamoussadi".to_string(),
                    primary_label: "Bonamoussadi".to_string(),
                    secondary_label: "Carrefour Kotto, Bonamoussadi, Douala".to_string(),
                },
            ],
        };
        Ok(suggestions)
    }

    async fn fetch_details(&self, suggestion_id: &str) -> Result<PlaceDetails, LookupError> {
        match suggestion_id {
            "pl-bonapriso" => Ok(PlaceDetails {
                place_id: "pl-bonapriso".to_string(),
                latitude: 4.0244,
                longitude: 9.6921,
                formatted_address: "Rue Njo-Njo, Bonapriso, Douala".to_string(),
                city: Some("Douala".to_string()),
                district: Some("Bonapriso".to_string()),
            }),
            "pl-douala" => Ok(PlaceDetails {
                place_id: "pl-douala".to_string(),
                latitude: 4.0511,
                longitude: 9.7679,
                formatted_address: "Douala, Cameroun".to_string(),
                city: Some("Douala".to_string()),
                district: None,
            }),
            other => Err(LookupError::Transport(format!("unknown place '{other}'"))),
        }
    }
}

pub struct StubProcessor;

#[async_trait]
impl MediaProcessor for StubProcessor {
    async fn crop_to_aspect(
        &self,
        source_uri: &str,
        ratio: AspectRatio,
    ) -> Result<String, MediaProcessingError> {
        let suffix = match ratio {
            AspectRatio::Portrait => "9x16",
            AspectRatio::Square => "1x1",
        };
        Ok(format!("{source_uri}#crop={suffix}"))
    }

    async fn duration_seconds(&self, _source_uri: &str) -> Result<f32, MediaProcessingError> {
        Ok(27.5)
    }
}
