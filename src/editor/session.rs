use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::calendar::{AvailabilityCalendar, CalendarDay, CalendarMode, CommitAction, DayStatus};
use super::domain::{
    DiscountRule, Draft, MediaId, MediaItem, MediaKind, MediaOrigin, MusicTrack, ResolvedPlace,
    RoomKind, VolumePreset,
};
use super::media::{AspectRatio, MediaError, MediaProcessingError, MediaProcessor, MediaSet};
use super::places::{
    InputDirective, PlaceDetails, PlaceDirectory, PlaceScope, PlaceSuggestion,
    SuggestionCoordinator,
};
use super::preview::{ActivePreview, PreviewCommand, PreviewController, PreviewSource};
use super::repository::ListingRepository;
use super::save::{
    DestructiveAction, DestructiveOutcome, SaveError, SaveIntent, SaveOrchestrator, SaveOutcome,
    SavePhase,
};
use super::validation::{FieldErrorMap, FieldKey, ValidationConfig, ValidationState};

/// Tunables for the editor session.
#[derive(Debug, Clone, Copy)]
pub struct EditorConfig {
    pub debounce: Duration,
    /// Delay before a blurred input closes its suggestion list, long enough
    /// for a tap on a suggestion to land first.
    pub blur_close_delay: Duration,
    pub validation: ValidationConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(350),
            blur_close_delay: Duration::from_millis(150),
            validation: ValidationConfig::default(),
        }
    }
}

/// Import failures surface either collaborator or invariant rejections.
#[derive(Debug, thiserror::Error)]
pub enum MediaImportError {
    #[error(transparent)]
    Processing(#[from] MediaProcessingError),
    #[error(transparent)]
    Set(#[from] MediaError),
}

/// Suggestion state as rendered by the hosting layer.
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionView {
    pub query: String,
    pub suggestions: Vec<PlaceSuggestion>,
    pub loading: bool,
    pub list_open: bool,
}

/// One observable frame of the whole editor, pushed through a watch channel
/// after every mutation so the presentation layer re-renders without polling.
#[derive(Debug, Clone, Serialize)]
pub struct EditorSnapshot {
    pub draft: Draft,
    pub media: Vec<MediaItem>,
    pub errors: FieldErrorMap,
    pub first_invalid: Option<FieldKey>,
    pub address: SuggestionView,
    pub city: SuggestionView,
    pub calendar_mode: CalendarMode,
    pub calendar_selection: Vec<NaiveDate>,
    pub month_offset: u32,
    pub playing_preview: Option<ActivePreview>,
    pub save_phase: SavePhase,
    pub pending_action: Option<DestructiveAction>,
}

struct EditorState {
    draft: Draft,
    media: MediaSet,
    calendar: AvailabilityCalendar,
    validation: ValidationState,
    address: SuggestionCoordinator,
    city: SuggestionCoordinator,
    preview: PreviewController,
    media_seq: u64,
}

#[derive(Default)]
struct TimerSlots {
    address_lookup: Option<JoinHandle<()>>,
    city_lookup: Option<JoinHandle<()>>,
    address_close: Option<JoinHandle<()>>,
    city_close: Option<JoinHandle<()>>,
}

/// The editor session: exclusive owner of the draft, media set, calendar,
/// and coordinators, wired to the three external collaborators. One instance
/// per open editor screen.
pub struct Editor<R, P, M> {
    state: tokio::sync::Mutex<EditorState>,
    orchestrator: SaveOrchestrator<R>,
    places: Arc<P>,
    processor: Arc<M>,
    config: EditorConfig,
    snapshot_tx: watch::Sender<EditorSnapshot>,
    timers: std::sync::Mutex<TimerSlots>,
    // Handle to self for timer tasks; set once in `build`.
    weak: Weak<Self>,
}

impl<R, P, M> Editor<R, P, M>
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    /// Fresh session for composing a new listing.
    pub fn new(
        repository: Arc<R>,
        places: Arc<P>,
        processor: Arc<M>,
        config: EditorConfig,
        today: NaiveDate,
    ) -> Arc<Self> {
        Self::build(
            repository,
            places,
            processor,
            config,
            Draft::new(),
            MediaSet::new(),
            AvailabilityCalendar::new(today, BTreeSet::new(), BTreeSet::new()),
        )
    }

    /// Session pre-populated for editing an existing listing.
    #[allow(clippy::too_many_arguments)]
    pub fn for_listing(
        repository: Arc<R>,
        places: Arc<P>,
        processor: Arc<M>,
        config: EditorConfig,
        today: NaiveDate,
        draft: Draft,
        media: Vec<MediaItem>,
        blocked: BTreeSet<NaiveDate>,
        reserved: BTreeSet<NaiveDate>,
    ) -> Arc<Self> {
        Self::build(
            repository,
            places,
            processor,
            config,
            draft,
            MediaSet::from_items(media),
            AvailabilityCalendar::new(today, blocked, reserved),
        )
    }

    fn build(
        repository: Arc<R>,
        places: Arc<P>,
        processor: Arc<M>,
        config: EditorConfig,
        draft: Draft,
        media: MediaSet,
        calendar: AvailabilityCalendar,
    ) -> Arc<Self> {
        let state = EditorState {
            draft,
            media,
            calendar,
            validation: ValidationState::new(config.validation),
            address: SuggestionCoordinator::new(PlaceScope::Address, config.debounce),
            city: SuggestionCoordinator::new(PlaceScope::City, config.debounce),
            preview: PreviewController::new(VolumePreset::Medium),
            media_seq: 0,
        };
        let orchestrator = SaveOrchestrator::new(repository);
        let initial = snapshot_of(&state, &orchestrator);
        let (snapshot_tx, _) = watch::channel(initial);

        Arc::new_cyclic(|weak| Self {
            state: tokio::sync::Mutex::new(state),
            orchestrator,
            places,
            processor,
            config,
            snapshot_tx,
            timers: std::sync::Mutex::new(TimerSlots::default()),
            weak: weak.clone(),
        })
    }

    /// Latest observable frame.
    pub fn snapshot(&self) -> EditorSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Reactive subscription for the hosting layer.
    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.snapshot_tx.subscribe()
    }

    fn publish(&self, state: &EditorState) {
        self.snapshot_tx
            .send_replace(snapshot_of(state, &self.orchestrator));
    }

    // ---- simple draft fields -------------------------------------------

    pub async fn set_title(&self, title: &str) {
        self.mutate_draft(|draft| draft.title = title.to_string())
            .await;
    }

    pub async fn set_price_input(&self, price: &str) {
        self.mutate_draft(|draft| draft.price_input = price.to_string())
            .await;
    }

    pub async fn set_property_type(&self, property_type: &str) {
        self.mutate_draft(|draft| draft.property_type = property_type.to_string())
            .await;
    }

    pub async fn set_description(&self, description: &str) {
        self.mutate_draft(|draft| draft.description = description.to_string())
            .await;
    }

    pub async fn set_room_count(&self, room: RoomKind, count: u8) {
        self.mutate_draft(|draft| {
            if count == 0 {
                draft.room_counts.remove(&room);
            } else {
                draft.room_counts.insert(room, count);
            }
        })
        .await;
    }

    pub async fn toggle_amenity(&self, amenity: &str) {
        self.mutate_draft(|draft| {
            if !draft.amenities.remove(amenity) {
                draft.amenities.insert(amenity.to_string());
            }
        })
        .await;
    }

    pub async fn set_discount(&self, discount: Option<DiscountRule>) {
        self.mutate_draft(|draft| draft.discount = discount).await;
    }

    pub async fn set_music_track(&self, track: Option<MusicTrack>) {
        self.mutate_draft(|draft| draft.music_track = track).await;
    }

    async fn mutate_draft(&self, apply: impl FnOnce(&mut Draft)) {
        let mut state = self.state.lock().await;
        apply(&mut state.draft);
        let (draft, media) = (state.draft.clone(), state.media.clone());
        state.validation.refresh(&draft, &media);
        self.publish(&state);
    }

    // ---- media ----------------------------------------------------------

    /// Import an asset through the media-processing collaborator: photos are
    /// cropped to 9:16, videos probe their duration. The lead-video rule is
    /// pre-checked so a doomed photo import skips the processing round trip.
    pub async fn add_media(
        &self,
        source_uri: &str,
        kind: MediaKind,
        origin: MediaOrigin,
    ) -> Result<MediaId, MediaImportError> {
        if kind == MediaKind::Photo {
            let state = self.state.lock().await;
            if state.media.is_empty() {
                return Err(MediaError::LeadVideoRequired.into());
            }
        }

        let (uri, duration) = match kind {
            MediaKind::Photo => (
                self.processor
                    .crop_to_aspect(source_uri, AspectRatio::Portrait)
                    .await?,
                0.0,
            ),
            MediaKind::Video => (
                source_uri.to_string(),
                self.processor.duration_seconds(source_uri).await?,
            ),
        };

        let mut state = self.state.lock().await;
        state.media_seq += 1;
        let id = MediaId(format!("media-{:04}", state.media_seq));
        state.media.append(MediaItem {
            id: id.clone(),
            kind,
            source_uri: uri,
            assigned_room: None,
            muted: false,
            duration_seconds: duration,
            origin,
        })?;
        self.refresh_and_publish(&mut state);
        Ok(id)
    }

    /// Crop the chosen asset to 1:1 and install it as the cover image.
    pub async fn set_cover(&self, source_uri: &str) -> Result<(), MediaImportError> {
        let uri = self
            .processor
            .crop_to_aspect(source_uri, AspectRatio::Square)
            .await?;
        let mut state = self.state.lock().await;
        state.draft.cover_uri = Some(uri);
        self.refresh_and_publish(&mut state);
        Ok(())
    }

    pub async fn remove_media(&self, id: &MediaId) -> Result<(), MediaError> {
        let mut state = self.state.lock().await;
        state.media.remove(id)?;
        self.refresh_and_publish(&mut state);
        Ok(())
    }

    pub async fn toggle_media_room(&self, id: &MediaId, room: RoomKind) -> Result<(), MediaError> {
        let mut state = self.state.lock().await;
        state.media.toggle_room(id, room)?;
        self.publish(&state);
        Ok(())
    }

    pub async fn set_media_muted(&self, id: &MediaId, muted: bool) -> Result<(), MediaError> {
        let mut state = self.state.lock().await;
        state.media.set_muted(id, muted)?;
        self.publish(&state);
        Ok(())
    }

    fn refresh_and_publish(&self, state: &mut EditorState) {
        let (draft, media) = (state.draft.clone(), state.media.clone());
        state.validation.refresh(&draft, &media);
        self.publish(state);
    }

    // ---- validation ------------------------------------------------------

    /// Explicit full validation; returns the map and the first invalid field
    /// for scroll-to-error navigation.
    pub async fn validate(&self) -> (FieldErrorMap, Option<FieldKey>) {
        let mut state = self.state.lock().await;
        let (draft, media) = (state.draft.clone(), state.media.clone());
        let result = state.validation.validate(&draft, &media);
        self.publish(&state);
        result
    }

    // ---- availability calendar ------------------------------------------

    pub async fn set_calendar_mode(&self, mode: CalendarMode) {
        let mut state = self.state.lock().await;
        state.calendar.set_mode(mode);
        self.publish(&state);
    }

    pub async fn toggle_calendar_day(&self, date: NaiveDate) -> bool {
        let mut state = self.state.lock().await;
        let selected = state.calendar.toggle(date);
        self.publish(&state);
        selected
    }

    pub async fn commit_availability(&self) -> CommitAction {
        let mut state = self.state.lock().await;
        let action = state.calendar.commit();
        self.publish(&state);
        action
    }

    pub async fn calendar_next_month(&self) {
        let mut state = self.state.lock().await;
        state.calendar.next_month();
        self.publish(&state);
    }

    pub async fn calendar_previous_month(&self) {
        let mut state = self.state.lock().await;
        state.calendar.previous_month();
        self.publish(&state);
    }

    pub async fn month_days(&self) -> Vec<CalendarDay> {
        self.state.lock().await.calendar.month_days()
    }

    pub async fn day_status(&self, date: NaiveDate) -> DayStatus {
        self.state.lock().await.calendar.status(date)
    }

    // ---- place suggestions ----------------------------------------------

    pub async fn on_address_input(&self, text: &str) {
        self.handle_place_input(PlaceScope::Address, text).await;
    }

    pub async fn on_city_input(&self, text: &str) {
        self.handle_place_input(PlaceScope::City, text).await;
    }

    async fn handle_place_input(&self, scope: PlaceScope, text: &str) {
        self.abort_lookup_timer(scope);

        let directive = {
            let mut state = self.state.lock().await;
            match scope {
                PlaceScope::Address => {
                    // Typing invalidates any previously resolved place.
                    state.draft.address_input = text.to_string();
                    state.draft.resolved_place = None;
                }
                PlaceScope::City => {
                    state.draft.city_input = text.to_string();
                    state.draft.city_place_id = None;
                }
            }
            let directive = coordinator_mut(&mut state, scope).on_input(text);
            let (draft, media) = (state.draft.clone(), state.media.clone());
            state.validation.refresh(&draft, &media);
            self.publish(&state);
            directive
        };

        if let InputDirective::DebounceLookup { delay } = directive {
            let Some(editor) = self.weak.upgrade() else {
                return;
            };
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                editor.fire_lookup(scope).await;
            });
            self.store_lookup_timer(scope, handle);
        }
    }

    async fn fire_lookup(&self, scope: PlaceScope) {
        let ticket = {
            let mut state = self.state.lock().await;
            let ticket = coordinator_mut(&mut state, scope).begin_lookup();
            self.publish(&state);
            ticket
        };

        let result = self
            .places
            .fetch_suggestions(&ticket.query, &ticket.session, ticket.filter)
            .await;

        let mut state = self.state.lock().await;
        coordinator_mut(&mut state, scope).apply_suggestions(ticket.request_id, result);
        self.publish(&state);
    }

    pub async fn select_address_suggestion(&self, suggestion_id: &str) {
        self.select_suggestion(PlaceScope::Address, suggestion_id)
            .await;
    }

    pub async fn select_city_suggestion(&self, suggestion_id: &str) {
        self.select_suggestion(PlaceScope::City, suggestion_id).await;
    }

    async fn select_suggestion(&self, scope: PlaceScope, suggestion_id: &str) {
        // A tap on a suggestion pre-empts the delayed blur close.
        self.abort_close_timer(scope);

        let ticket = {
            let mut state = self.state.lock().await;
            let ticket = coordinator_mut(&mut state, scope).select(suggestion_id);
            self.publish(&state);
            ticket
        };
        let Some(ticket) = ticket else {
            return;
        };

        let result = self.places.fetch_details(&ticket.suggestion_id).await;

        let mut state = self.state.lock().await;
        if let Some(details) = coordinator_mut(&mut state, scope).apply_details(ticket.detail_id, result)
        {
            apply_place_details(&mut state.draft, scope, details);
            let (draft, media) = (state.draft.clone(), state.media.clone());
            state.validation.refresh(&draft, &media);
        }
        self.publish(&state);
    }

    pub fn on_address_blur(&self) {
        self.schedule_close(PlaceScope::Address);
    }

    pub fn on_city_blur(&self) {
        self.schedule_close(PlaceScope::City);
    }

    pub async fn on_address_focus(&self) {
        self.handle_focus(PlaceScope::Address).await;
    }

    pub async fn on_city_focus(&self) {
        self.handle_focus(PlaceScope::City).await;
    }

    fn schedule_close(&self, scope: PlaceScope) {
        let delay = self.config.blur_close_delay;
        let Some(editor) = self.weak.upgrade() else {
            return;
        };
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = editor.state.lock().await;
            coordinator_mut(&mut state, scope).close_list();
            editor.publish(&state);
        });
        self.store_close_timer(scope, handle);
    }

    async fn handle_focus(&self, scope: PlaceScope) {
        self.abort_close_timer(scope);
        let mut state = self.state.lock().await;
        coordinator_mut(&mut state, scope).on_focus();
        self.publish(&state);
    }

    // ---- previews --------------------------------------------------------

    /// Toggle a preview; the returned commands drive the external player.
    pub async fn toggle_preview(&self, id: &str, source: PreviewSource) -> Vec<PreviewCommand> {
        let mut state = self.state.lock().await;
        let commands = state.preview.toggle(id, source);
        self.publish(&state);
        commands
    }

    pub async fn set_preview_volume(&self, volume: VolumePreset) -> Vec<PreviewCommand> {
        let mut state = self.state.lock().await;
        let commands = state.preview.set_volume(volume);
        self.publish(&state);
        commands
    }

    /// Navigation-away / backgrounding: stop previews and cancel all timers.
    pub async fn suspend(&self) -> Vec<PreviewCommand> {
        self.abort_all_timers();
        let mut state = self.state.lock().await;
        let commands = state.preview.stop_all();
        self.publish(&state);
        commands
    }

    // ---- save orchestration ---------------------------------------------

    pub async fn save(&self, intent: SaveIntent) -> Result<SaveOutcome, SaveError> {
        let (mut draft, media, calendar, mut validation) = {
            let state = self.state.lock().await;
            (
                state.draft.clone(),
                state.media.clone(),
                state.calendar.clone(),
                state.validation.clone(),
            )
        };

        let outcome = self
            .orchestrator
            .save(&mut draft, &media, &calendar, &mut validation, intent)
            .await;

        let mut state = self.state.lock().await;
        state.validation = validation;
        if let Ok(SaveOutcome::Stored { listing_id, .. }) = &outcome {
            state.draft.listing_id = Some(listing_id.clone());
        }
        self.publish(&state);
        outcome
    }

    /// Guard-checked first half of delete / revert-to-draft.
    pub async fn request_destructive(
        &self,
        action: DestructiveAction,
    ) -> Result<DestructiveOutcome, SaveError> {
        let listing_id = self.state.lock().await.draft.listing_id.clone();
        let Some(listing_id) = listing_id else {
            // Nothing persisted yet; there is nothing to destroy.
            return Ok(DestructiveOutcome::NotRequested);
        };

        let outcome = self
            .orchestrator
            .request_destructive(action, &listing_id)
            .await;
        let state = self.state.lock().await;
        self.publish(&state);
        outcome
    }

    pub async fn confirm_destructive(&self) -> Result<DestructiveOutcome, SaveError> {
        let action = self.orchestrator.pending_action();
        let (draft, media, calendar) = {
            let state = self.state.lock().await;
            (
                state.draft.clone(),
                state.media.clone(),
                state.calendar.clone(),
            )
        };

        let outcome = self
            .orchestrator
            .confirm_destructive(&draft, &media, &calendar)
            .await;

        let mut state = self.state.lock().await;
        if matches!(outcome, Ok(DestructiveOutcome::Completed))
            && action == Some(DestructiveAction::Delete)
        {
            state.draft.listing_id = None;
        }
        self.publish(&state);
        outcome
    }

    pub async fn cancel_destructive(&self) {
        self.orchestrator.cancel_destructive();
        let state = self.state.lock().await;
        self.publish(&state);
    }

    pub fn save_phase(&self) -> SavePhase {
        self.orchestrator.phase()
    }

    // ---- timers ----------------------------------------------------------

    fn store_lookup_timer(&self, scope: PlaceScope, handle: JoinHandle<()>) {
        let mut timers = self.timers.lock().expect("timer mutex poisoned");
        let slot = match scope {
            PlaceScope::Address => &mut timers.address_lookup,
            PlaceScope::City => &mut timers.city_lookup,
        };
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn abort_lookup_timer(&self, scope: PlaceScope) {
        let mut timers = self.timers.lock().expect("timer mutex poisoned");
        let slot = match scope {
            PlaceScope::Address => &mut timers.address_lookup,
            PlaceScope::City => &mut timers.city_lookup,
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn store_close_timer(&self, scope: PlaceScope, handle: JoinHandle<()>) {
        let mut timers = self.timers.lock().expect("timer mutex poisoned");
        let slot = match scope {
            PlaceScope::Address => &mut timers.address_close,
            PlaceScope::City => &mut timers.city_close,
        };
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }

    fn abort_close_timer(&self, scope: PlaceScope) {
        let mut timers = self.timers.lock().expect("timer mutex poisoned");
        let slot = match scope {
            PlaceScope::Address => &mut timers.address_close,
            PlaceScope::City => &mut timers.city_close,
        };
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    fn abort_all_timers(&self) {
        let mut timers = self.timers.lock().expect("timer mutex poisoned");
        let timers = &mut *timers;
        for slot in [
            &mut timers.address_lookup,
            &mut timers.city_lookup,
            &mut timers.address_close,
            &mut timers.city_close,
        ] {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

fn coordinator_mut(state: &mut EditorState, scope: PlaceScope) -> &mut SuggestionCoordinator {
    match scope {
        PlaceScope::Address => &mut state.address,
        PlaceScope::City => &mut state.city,
    }
}

fn apply_place_details(draft: &mut Draft, scope: PlaceScope, details: PlaceDetails) {
    match scope {
        PlaceScope::Address => {
            draft.address_input = details.formatted_address.clone();
            if draft.city_input.trim().is_empty() {
                if let Some(city) = &details.city {
                    draft.city_input = city.clone();
                }
            }
            draft.resolved_place = Some(ResolvedPlace {
                place_id: details.place_id,
                latitude: details.latitude,
                longitude: details.longitude,
                formatted_address: details.formatted_address,
                city: details.city,
                district: details.district,
            });
        }
        PlaceScope::City => {
            draft.city_input = details
                .city
                .clone()
                .unwrap_or(details.formatted_address);
            draft.city_place_id = Some(details.place_id);
        }
    }
}

fn suggestion_view(coordinator: &SuggestionCoordinator) -> SuggestionView {
    SuggestionView {
        query: coordinator.query().to_string(),
        suggestions: coordinator.suggestions().to_vec(),
        loading: coordinator.is_loading(),
        list_open: coordinator.is_list_open(),
    }
}

fn snapshot_of<R>(state: &EditorState, orchestrator: &SaveOrchestrator<R>) -> EditorSnapshot
where
    R: ListingRepository + 'static,
{
    EditorSnapshot {
        draft: state.draft.clone(),
        media: state.media.items().to_vec(),
        errors: state.validation.shown().clone(),
        first_invalid: state.validation.first_invalid(),
        address: suggestion_view(&state.address),
        city: suggestion_view(&state.city),
        calendar_mode: state.calendar.mode(),
        calendar_selection: state.calendar.selection().iter().copied().collect(),
        month_offset: state.calendar.month_offset(),
        playing_preview: state.preview.playing().cloned(),
        save_phase: orchestrator.phase(),
        pending_action: orchestrator.pending_action(),
    }
}
