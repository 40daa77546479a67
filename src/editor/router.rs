use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::calendar::{CalendarMode, CommitAction};
use super::domain::{MediaId, MediaKind, MediaOrigin, RoomKind};
use super::media::{MediaError, MediaProcessor};
use super::places::PlaceDirectory;
use super::repository::ListingRepository;
use super::save::{DestructiveAction, DestructiveOutcome, SaveError, SaveIntent, SaveOutcome};
use super::session::{Editor, MediaImportError};

/// Router builder exposing the editor session to the hosting layer.
pub fn editor_router<R, P, M>(editor: Arc<Editor<R, P, M>>) -> Router
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    Router::new()
        .route("/api/v1/editor", get(snapshot_handler::<R, P, M>))
        .route("/api/v1/editor/fields", put(fields_handler::<R, P, M>))
        .route("/api/v1/editor/rooms", post(rooms_handler::<R, P, M>))
        .route(
            "/api/v1/editor/amenities/toggle",
            post(amenity_handler::<R, P, M>),
        )
        .route("/api/v1/editor/media", post(add_media_handler::<R, P, M>))
        .route(
            "/api/v1/editor/media/:media_id",
            delete(remove_media_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/media/:media_id/room",
            post(media_room_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/media/:media_id/muted",
            post(media_muted_handler::<R, P, M>),
        )
        .route("/api/v1/editor/cover", post(cover_handler::<R, P, M>))
        .route("/api/v1/editor/address", post(address_handler::<R, P, M>))
        .route(
            "/api/v1/editor/address/select",
            post(address_select_handler::<R, P, M>),
        )
        .route("/api/v1/editor/city", post(city_handler::<R, P, M>))
        .route(
            "/api/v1/editor/city/select",
            post(city_select_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/calendar/mode",
            post(calendar_mode_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/calendar/toggle",
            post(calendar_toggle_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/calendar/commit",
            post(calendar_commit_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/calendar/days",
            get(calendar_days_handler::<R, P, M>),
        )
        .route("/api/v1/editor/validate", post(validate_handler::<R, P, M>))
        .route("/api/v1/editor/save", post(save_handler::<R, P, M>))
        .route(
            "/api/v1/editor/destructive",
            post(destructive_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/destructive/confirm",
            post(destructive_confirm_handler::<R, P, M>),
        )
        .route(
            "/api/v1/editor/destructive/cancel",
            post(destructive_cancel_handler::<R, P, M>),
        )
        .with_state(editor)
}

type EditorState<R, P, M> = State<Arc<Editor<R, P, M>>>;

#[derive(Debug, Deserialize, Default)]
pub struct DraftFieldsUpdate {
    pub title: Option<String>,
    pub price: Option<String>,
    pub property_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomCountUpdate {
    pub room: RoomKind,
    pub count: u8,
}

#[derive(Debug, Deserialize)]
pub struct AmenityToggle {
    pub amenity: String,
}

#[derive(Debug, Deserialize)]
pub struct MediaImport {
    pub source_uri: String,
    pub kind: MediaKind,
    pub origin: MediaOrigin,
}

#[derive(Debug, Deserialize)]
pub struct MediaRoomUpdate {
    pub room: RoomKind,
}

#[derive(Debug, Deserialize)]
pub struct MediaMuteUpdate {
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
pub struct CoverUpdate {
    pub source_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionChoice {
    pub suggestion_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CalendarModeUpdate {
    pub mode: CalendarMode,
}

#[derive(Debug, Deserialize)]
pub struct CalendarDayToggle {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub publish: bool,
}

#[derive(Debug, Deserialize)]
pub struct DestructiveRequest {
    pub action: DestructiveAction,
}

async fn snapshot_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn fields_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(update): Json<DraftFieldsUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    if let Some(title) = &update.title {
        editor.set_title(title).await;
    }
    if let Some(price) = &update.price {
        editor.set_price_input(price).await;
    }
    if let Some(property_type) = &update.property_type {
        editor.set_property_type(property_type).await;
    }
    if let Some(description) = &update.description {
        editor.set_description(description).await;
    }
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn rooms_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(update): Json<RoomCountUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.set_room_count(update.room, update.count).await;
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn amenity_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(update): Json<AmenityToggle>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.toggle_amenity(&update.amenity).await;
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn add_media_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(import): Json<MediaImport>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor
        .add_media(&import.source_uri, import.kind, import.origin)
        .await
    {
        Ok(media_id) => (StatusCode::CREATED, Json(json!({ "media_id": media_id }))).into_response(),
        Err(error) => media_import_error_response(error),
    }
}

async fn remove_media_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Path(media_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.remove_media(&MediaId(media_id)).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => media_error_response(error),
    }
}

async fn media_room_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Path(media_id): Path<String>,
    Json(update): Json<MediaRoomUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.toggle_media_room(&MediaId(media_id), update.room).await {
        Ok(()) => (StatusCode::OK, Json(editor.snapshot())).into_response(),
        Err(error) => media_error_response(error),
    }
}

async fn media_muted_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Path(media_id): Path<String>,
    Json(update): Json<MediaMuteUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.set_media_muted(&MediaId(media_id), update.muted).await {
        Ok(()) => (StatusCode::OK, Json(editor.snapshot())).into_response(),
        Err(error) => media_error_response(error),
    }
}

async fn cover_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(update): Json<CoverUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.set_cover(&update.source_uri).await {
        Ok(()) => (StatusCode::OK, Json(editor.snapshot())).into_response(),
        Err(error) => media_import_error_response(error),
    }
}

async fn address_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(input): Json<TextInput>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.on_address_input(&input.text).await;
    (StatusCode::ACCEPTED, Json(editor.snapshot())).into_response()
}

async fn address_select_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(choice): Json<SuggestionChoice>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.select_address_suggestion(&choice.suggestion_id).await;
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn city_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(input): Json<TextInput>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.on_city_input(&input.text).await;
    (StatusCode::ACCEPTED, Json(editor.snapshot())).into_response()
}

async fn city_select_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(choice): Json<SuggestionChoice>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.select_city_suggestion(&choice.suggestion_id).await;
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn calendar_mode_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(update): Json<CalendarModeUpdate>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.set_calendar_mode(update.mode).await;
    (StatusCode::OK, Json(editor.snapshot())).into_response()
}

async fn calendar_toggle_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(toggle): Json<CalendarDayToggle>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    let selected = editor.toggle_calendar_day(toggle.date).await;
    (StatusCode::OK, Json(json!({ "selected": selected }))).into_response()
}

async fn calendar_commit_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    let body = match editor.commit_availability().await {
        CommitAction::Applied { changed } => json!({ "applied": true, "changed": changed }),
        CommitAction::OpenReservations => json!({ "applied": false, "navigate": "reservations" }),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn calendar_days_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    (StatusCode::OK, Json(editor.month_days().await)).into_response()
}

async fn validate_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    let (errors, first_invalid) = editor.validate().await;
    (
        StatusCode::OK,
        Json(json!({ "errors": errors, "first_invalid": first_invalid })),
    )
        .into_response()
}

async fn save_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(request): Json<SaveRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    let intent = if request.publish {
        SaveIntent::Publish
    } else {
        SaveIntent::Draft
    };
    match editor.save(intent).await {
        Ok(SaveOutcome::Stored {
            listing_id,
            published,
        }) => (
            StatusCode::OK,
            Json(json!({ "listing_id": listing_id, "published": published })),
        )
            .into_response(),
        Ok(SaveOutcome::Rejected {
            first_invalid,
            errors,
        }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "first_invalid": first_invalid, "errors": errors })),
        )
            .into_response(),
        Ok(SaveOutcome::Busy) => busy_response(),
        Err(error) => save_error_response(error),
    }
}

async fn destructive_handler<R, P, M>(
    State(editor): EditorState<R, P, M>,
    Json(request): Json<DestructiveRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.request_destructive(request.action).await {
        Ok(outcome) => destructive_outcome_response(outcome),
        Err(error) => save_error_response(error),
    }
}

async fn destructive_confirm_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    match editor.confirm_destructive().await {
        Ok(outcome) => destructive_outcome_response(outcome),
        Err(error) => save_error_response(error),
    }
}

async fn destructive_cancel_handler<R, P, M>(State(editor): EditorState<R, P, M>) -> Response
where
    R: ListingRepository + 'static,
    P: PlaceDirectory + 'static,
    M: MediaProcessor + 'static,
{
    editor.cancel_destructive().await;
    StatusCode::NO_CONTENT.into_response()
}

fn destructive_outcome_response(outcome: DestructiveOutcome) -> Response {
    match outcome {
        DestructiveOutcome::ConfirmationRequired => (
            StatusCode::OK,
            Json(json!({ "outcome": "confirmation_required" })),
        )
            .into_response(),
        DestructiveOutcome::Completed => {
            (StatusCode::OK, Json(json!({ "outcome": "completed" }))).into_response()
        }
        DestructiveOutcome::Blocked { reason } => (
            StatusCode::CONFLICT,
            Json(json!({ "outcome": "blocked", "error": reason })),
        )
            .into_response(),
        DestructiveOutcome::NotRequested => (
            StatusCode::OK,
            Json(json!({ "outcome": "not_requested" })),
        )
            .into_response(),
        DestructiveOutcome::Busy => busy_response(),
    }
}

fn busy_response() -> Response {
    (
        StatusCode::CONFLICT,
        Json(json!({ "error": "another submission is in flight" })),
    )
        .into_response()
}

fn save_error_response(error: SaveError) -> Response {
    let status = match &error {
        SaveError::GuardCheck(_) => StatusCode::SERVICE_UNAVAILABLE,
        SaveError::Submission(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn media_error_response(error: MediaError) -> Response {
    let status = match &error {
        MediaError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

fn media_import_error_response(error: MediaImportError) -> Response {
    let status = match &error {
        MediaImportError::Set(MediaError::NotFound) => StatusCode::NOT_FOUND,
        MediaImportError::Set(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MediaImportError::Processing(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
