//! The listing composition engine: draft state, media invariants, field
//! validation, availability calendar, place-suggestion coordination, preview
//! arbitration, and the guarded save orchestration on top.

pub mod calendar;
pub mod domain;
pub mod media;
pub mod places;
pub mod preview;
pub mod repository;
pub mod router;
pub mod save;
pub mod session;
pub mod validation;

#[cfg(test)]
mod tests;

pub use calendar::{AvailabilityCalendar, CalendarDay, CalendarMode, CommitAction, DayStatus};
pub use domain::{
    DiscountRule, Draft, ListingId, MediaId, MediaItem, MediaKind, MediaOrigin, MusicTrack,
    ResolvedPlace, RoomKind, VolumePreset,
};
pub use media::{
    AspectRatio, MediaError, MediaProcessingError, MediaProcessor, MediaSet,
};
pub use places::{
    LookupError, PlaceDetails, PlaceDirectory, PlaceFilter, PlaceSuggestion, SessionToken,
};
pub use preview::{ActivePreview, PreviewCommand, PreviewController, PreviewSource};
pub use repository::{build_payload, ListingPayload, ListingRepository, RepositoryError};
pub use router::editor_router;
pub use save::{
    DestructiveAction, DestructiveOutcome, SaveError, SaveIntent, SaveOrchestrator, SaveOutcome,
    SavePhase,
};
pub use session::{Editor, EditorConfig, EditorSnapshot, MediaImportError};
pub use validation::{FieldErrorMap, FieldKey, ValidationConfig, ValidationState};
