use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::calendar::AvailabilityCalendar;
use super::domain::{Draft, ListingId};
use super::media::MediaSet;
use super::repository::{build_payload, ListingRepository, RepositoryError};
use super::validation::{FieldErrorMap, FieldKey, ValidationState};

/// Orchestrator phase, observable by the hosting layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SavePhase {
    Idle,
    Validating,
    Guarding,
    Submitting,
    Success,
    Failed,
}

impl SavePhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Guarding => "guarding",
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Save as draft or publish; both share the submit path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveIntent {
    Draft,
    Publish,
}

impl SaveIntent {
    pub const fn publishes(self) -> bool {
        matches!(self, Self::Publish)
    }
}

/// Result of a save attempt that did not fail at the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Stored {
        listing_id: ListingId,
        published: bool,
    },
    /// Validation failed; no network call was made. Carries the first field
    /// in check order for scroll-to-error navigation.
    Rejected {
        first_invalid: FieldKey,
        errors: FieldErrorMap,
    },
    /// Another submission is in flight; this request is ignored.
    Busy,
}

/// Guarded, status-changing actions sharing the confirmation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestructiveAction {
    Delete,
    RevertToDraft,
}

impl DestructiveAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::RevertToDraft => "revert_to_draft",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DestructiveOutcome {
    /// Guard passed; an explicit confirmation is still required.
    ConfirmationRequired,
    Completed,
    /// Outstanding payments reported; the action is blocked.
    Blocked { reason: String },
    /// Confirm arrived with no pending request (stale tap).
    NotRequested,
    Busy,
}

/// Errors leaving the orchestrator. Guard checks fail closed; submission
/// failures leave the draft untouched for retry.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("payment check failed, action blocked: {0}")]
    GuardCheck(#[source] RepositoryError),
    #[error("submission failed: {0}")]
    Submission(#[source] RepositoryError),
}

#[derive(Debug)]
struct PendingDestructive {
    action: DestructiveAction,
    listing_id: ListingId,
}

#[derive(Debug)]
struct OrchestratorState {
    phase: SavePhase,
    in_flight: bool,
    pending: Option<PendingDestructive>,
}

/// Top-level controller for save/publish/delete: validates, applies the
/// payment-safety guard, and dispatches to the listing repository with a
/// single-flight guarantee. The internal lock is never held across an await.
pub struct SaveOrchestrator<R> {
    repository: Arc<R>,
    state: Mutex<OrchestratorState>,
}

impl<R> SaveOrchestrator<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            state: Mutex::new(OrchestratorState {
                phase: SavePhase::Idle,
                in_flight: false,
                pending: None,
            }),
        }
    }

    pub fn phase(&self) -> SavePhase {
        self.lock().phase
    }

    pub fn pending_action(&self) -> Option<DestructiveAction> {
        self.lock().pending.as_ref().map(|pending| pending.action)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OrchestratorState> {
        self.state.lock().expect("orchestrator mutex poisoned")
    }

    /// Validate and submit. Dispatches create or update depending on whether
    /// the draft is already persisted; on create the new id is written back
    /// into the draft.
    pub async fn save(
        &self,
        draft: &mut Draft,
        media: &MediaSet,
        calendar: &AvailabilityCalendar,
        validation: &mut ValidationState,
        intent: SaveIntent,
    ) -> Result<SaveOutcome, SaveError> {
        {
            let mut state = self.lock();
            if state.in_flight {
                return Ok(SaveOutcome::Busy);
            }
            state.in_flight = true;
            state.phase = SavePhase::Validating;
        }

        let (errors, first_invalid) = validation.validate(draft, media);
        if let Some(first_invalid) = first_invalid {
            let mut state = self.lock();
            state.in_flight = false;
            state.phase = SavePhase::Idle;
            return Ok(SaveOutcome::Rejected {
                first_invalid,
                errors,
            });
        }

        self.lock().phase = SavePhase::Submitting;
        let payload = build_payload(draft, media, calendar, intent.publishes());

        let result = match &draft.listing_id {
            Some(id) => self
                .repository
                .update(id, payload)
                .await
                .map(|_| id.clone()),
            None => self.repository.create(payload).await,
        };

        self.lock().in_flight = false;
        match result {
            Ok(listing_id) => {
                draft.listing_id = Some(listing_id.clone());
                self.lock().phase = SavePhase::Success;
                info!(listing_id = %listing_id.0, publish = intent.publishes(), "listing stored");
                Ok(SaveOutcome::Stored {
                    listing_id,
                    published: intent.publishes(),
                })
            }
            Err(error) => {
                self.lock().phase = SavePhase::Failed;
                warn!(%error, "listing submission failed");
                Err(SaveError::Submission(error))
            }
        }
    }

    /// First half of a guarded action: ask the repository about outstanding
    /// payments before anything mutates. A failed check blocks the action
    /// (fail closed, never open).
    pub async fn request_destructive(
        &self,
        action: DestructiveAction,
        listing_id: &ListingId,
    ) -> Result<DestructiveOutcome, SaveError> {
        {
            let mut state = self.lock();
            if state.in_flight {
                return Ok(DestructiveOutcome::Busy);
            }
            state.in_flight = true;
            state.phase = SavePhase::Guarding;
            state.pending = None;
        }

        let check = self.repository.has_outstanding_payments(listing_id).await;

        let mut state = self.lock();
        state.in_flight = false;
        match check {
            Err(error) => {
                state.phase = SavePhase::Failed;
                drop(state);
                warn!(action = action.label(), %error, "payment guard check failed");
                Err(SaveError::GuardCheck(error))
            }
            Ok(true) => {
                state.phase = SavePhase::Idle;
                info!(action = action.label(), "guard blocked action: outstanding payments");
                Ok(DestructiveOutcome::Blocked {
                    reason: "outstanding payments must settle first; confirmed bookings are kept"
                        .to_string(),
                })
            }
            Ok(false) => {
                state.phase = SavePhase::Idle;
                state.pending = Some(PendingDestructive {
                    action,
                    listing_id: listing_id.clone(),
                });
                Ok(DestructiveOutcome::ConfirmationRequired)
            }
        }
    }

    /// Second half: perform the pending action after the user confirmed.
    pub async fn confirm_destructive(
        &self,
        draft: &Draft,
        media: &MediaSet,
        calendar: &AvailabilityCalendar,
    ) -> Result<DestructiveOutcome, SaveError> {
        let pending = {
            let mut state = self.lock();
            if state.in_flight {
                return Ok(DestructiveOutcome::Busy);
            }
            let Some(pending) = state.pending.take() else {
                return Ok(DestructiveOutcome::NotRequested);
            };
            state.in_flight = true;
            state.phase = SavePhase::Submitting;
            pending
        };

        let result = match pending.action {
            DestructiveAction::Delete => self.repository.delete(&pending.listing_id).await,
            DestructiveAction::RevertToDraft => {
                let payload = build_payload(draft, media, calendar, false);
                self.repository.update(&pending.listing_id, payload).await
            }
        };

        let mut state = self.lock();
        state.in_flight = false;
        match result {
            Ok(()) => {
                state.phase = SavePhase::Success;
                drop(state);
                info!(
                    action = pending.action.label(),
                    listing_id = %pending.listing_id.0,
                    "destructive action completed"
                );
                Ok(DestructiveOutcome::Completed)
            }
            Err(error) => {
                state.phase = SavePhase::Failed;
                drop(state);
                warn!(action = pending.action.label(), %error, "destructive action failed");
                Err(SaveError::Submission(error))
            }
        }
    }

    pub fn cancel_destructive(&self) {
        let mut state = self.lock();
        state.pending = None;
        if !state.in_flight {
            state.phase = SavePhase::Idle;
        }
    }
}
