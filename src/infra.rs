use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::editor::{
    AspectRatio, ListingId, ListingPayload, ListingRepository, LookupError, MediaProcessingError,
    MediaProcessor, PlaceDetails, PlaceDirectory, PlaceFilter, PlaceSuggestion, RepositoryError,
    SessionToken,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Listing store backed by a process-local map. Stands in for the remote
/// marketplace backend during demos and tests.
#[derive(Default)]
pub(crate) struct InMemoryListingRepository {
    listings: Mutex<HashMap<ListingId, ListingPayload>>,
    next_id: AtomicU64,
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn create(&self, payload: ListingPayload) -> Result<ListingId, RepositoryError> {
        let id = ListingId(format!(
            "listing-{:06}",
            self.next_id
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
                + 1
        ));
        let mut guard = self.listings.lock().expect("listing mutex poisoned");
        guard.insert(id.clone(), payload);
        Ok(id)
    }

    async fn update(&self, id: &ListingId, payload: ListingPayload) -> Result<(), RepositoryError> {
        let mut guard = self.listings.lock().expect("listing mutex poisoned");
        if guard.contains_key(id) {
            guard.insert(id.clone(), payload);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    async fn delete(&self, id: &ListingId) -> Result<(), RepositoryError> {
        let mut guard = self.listings.lock().expect("listing mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn has_outstanding_payments(&self, _id: &ListingId) -> Result<bool, RepositoryError> {
        Ok(false)
    }
}

/// Place directory serving a canned Douala data set, filtered by prefix.
/// Keeps the address flow demonstrable without a geocoding account.
pub(crate) struct StaticPlaceDirectory {
    places: Vec<PlaceDetails>,
}

impl Default for StaticPlaceDirectory {
    fn default() -> Self {
        let places = vec![
            PlaceDetails {
                place_id: "pl-bonapriso".to_string(),
                latitude: 4.0244,
                longitude: 9.6921,
                formatted_address: "Rue Njo-Njo, Bonapriso, Douala".to_string(),
                city: Some("Douala".to_string()),
                district: Some("Bonapriso".to_string()),
            },
            PlaceDetails {
                place_id: "pl-bonamoussadi".to_string(),
                latitude: 4.0862,
                longitude: 9.7404,
                formatted_address: "Carrefour Kotto, Bonamoussadi, Douala".to_string(),
                city: Some("Douala".to_string()),
                district: Some("Bonamoussadi".to_string()),
            },
            PlaceDetails {
                place_id: "pl-akwa".to_string(),
                latitude: 4.0483,
                longitude: 9.6944,
                formatted_address: "Boulevard de la Liberté, Akwa, Douala".to_string(),
                city: Some("Douala".to_string()),
                district: Some("Akwa".to_string()),
            },
            PlaceDetails {
                place_id: "pl-douala".to_string(),
                latitude: 4.0511,
                longitude: 9.7679,
                formatted_address: "Douala, Cameroun".to_string(),
                city: Some("Douala".to_string()),
                district: None,
            },
            PlaceDetails {
                place_id: "pl-yaounde".to_string(),
                latitude: 3.8480,
                longitude: 11.5021,
                formatted_address: "Yaoundé, Cameroun".to_string(),
                city: Some("Yaoundé".to_string()),
                district: None,
            },
        ];
        Self { places }
    }
}

#[async_trait]
impl PlaceDirectory for StaticPlaceDirectory {
    async fn fetch_suggestions(
        &self,
        query: &str,
        _session: &SessionToken,
        filter: Option<PlaceFilter>,
    ) -> Result<Vec<PlaceSuggestion>, LookupError> {
        let needle = query.trim().to_lowercase();
        let cities_only = matches!(filter, Some(PlaceFilter::Cities));
        Ok(self
            .places
            .iter()
            .filter(|place| !cities_only || place.district.is_none())
            .filter(|place| place.formatted_address.to_lowercase().contains(&needle))
            .map(|place| PlaceSuggestion {
                id: place.place_id.clone(),
                primary_label: place
                    .district
                    .clone()
                    .or_else(|| place.city.clone())
                    .unwrap_or_else(|| place.formatted_address.clone()),
                secondary_label: place.formatted_address.clone(),
            })
            .collect())
    }

    async fn fetch_details(&self, suggestion_id: &str) -> Result<PlaceDetails, LookupError> {
        self.places
            .iter()
            .find(|place| place.place_id == suggestion_id)
            .cloned()
            .ok_or_else(|| LookupError::Transport(format!("unknown place '{suggestion_id}'")))
    }
}

/// Media processor that records the requested transform in the returned URI
/// instead of invoking an actual pipeline.
#[derive(Default)]
pub(crate) struct PassthroughMediaProcessor;

#[async_trait]
impl MediaProcessor for PassthroughMediaProcessor {
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
        Ok(30.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn repository_round_trips_listing_lifecycle() {
        let repo = InMemoryListingRepository::default();
        let payload = ListingPayload {
            title: "Studio lumineux".to_string(),
            price: 25000.0,
            property_type: "Studio".to_string(),
            address: "Akwa, Douala".to_string(),
            place_id: None,
            latitude: None,
            longitude: None,
            city: "Douala".to_string(),
            city_place_id: None,
            district: None,
            description: "Meublé, proche du boulevard.".to_string(),
            rooms: Vec::new(),
            amenities: Vec::new(),
            media: Vec::new(),
            cover_uri: None,
            blocked_dates: Default::default(),
            music_track_id: None,
            discount: None,
            publish: false,
        };

        let id = repo.create(payload.clone()).await.expect("create succeeds");
        repo.update(&id, payload).await.expect("update succeeds");
        repo.delete(&id).await.expect("delete succeeds");
        assert!(matches!(
            repo.delete(&id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn city_filter_excludes_districts() {
        let directory = StaticPlaceDirectory::default();
        let session = SessionToken("sess-test".to_string());
        let cities = directory
            .fetch_suggestions("douala", &session, Some(PlaceFilter::Cities))
            .await
            .expect("lookup succeeds");
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, "pl-douala");

        let all = directory
            .fetch_suggestions("douala", &session, None)
            .await
            .expect("lookup succeeds");
        assert!(all.len() > 1);
    }
}
