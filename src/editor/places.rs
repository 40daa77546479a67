use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Ephemeral incremental-search result from the place-lookup collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub id: String,
    pub primary_label: String,
    pub secondary_label: String,
}

/// Full location details resolved for a selected suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub city: Option<String>,
    pub district: Option<String>,
}

/// Opaque token grouping the incremental-search requests of one search
/// session for billing continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(pub String);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_token() -> SessionToken {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionToken(format!("sess-{id:08x}"))
}

/// Restricts what kinds of places a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceFilter {
    Cities,
}

/// External place-lookup collaborator.
#[async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn fetch_suggestions(
        &self,
        query: &str,
        session: &SessionToken,
        filter: Option<PlaceFilter>,
    ) -> Result<Vec<PlaceSuggestion>, LookupError>;

    async fn fetch_details(&self, suggestion_id: &str) -> Result<PlaceDetails, LookupError>;
}

/// Lookup failures are logged and clear the list; never a blocking alert.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("place lookup failed: {0}")]
    Transport(String),
}

/// Which field a coordinator instance serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceScope {
    Address,
    City,
}

impl PlaceScope {
    pub const fn filter(self) -> Option<PlaceFilter> {
        match self {
            Self::Address => None,
            Self::City => Some(PlaceFilter::Cities),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::City => "city",
        }
    }
}

/// What the timer driver must do after a text change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDirective {
    /// Query emptied: pending timer cancelled, nothing to schedule.
    ClearAndStop,
    /// Schedule a debounced lookup after cancelling any pending timer.
    DebounceLookup { delay: Duration },
}

/// Descriptor for one suggestion request; `request_id` is compared on
/// response so out-of-order completions never regress the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    pub query: String,
    pub session: SessionToken,
    pub filter: Option<PlaceFilter>,
    pub request_id: u64,
}

/// Descriptor for one resolve-details request, identity-checked the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    pub suggestion_id: String,
    pub detail_id: u64,
}

/// Debounced, session-grouped suggestion state machine for one input field.
///
/// Timers live in the driver (the editor session); this machine owns the
/// query, session token, suggestion list, and the request-identity counters
/// that gate response application.
#[derive(Debug)]
pub struct SuggestionCoordinator {
    scope: PlaceScope,
    debounce: Duration,
    query: String,
    session: Option<SessionToken>,
    suggestions: Vec<PlaceSuggestion>,
    loading: bool,
    list_open: bool,
    request_seq: u64,
    active_request: Option<u64>,
    detail_seq: u64,
    active_detail: Option<u64>,
}

impl SuggestionCoordinator {
    pub fn new(scope: PlaceScope, debounce: Duration) -> Self {
        Self {
            scope,
            debounce,
            query: String::new(),
            session: None,
            suggestions: Vec::new(),
            loading: false,
            list_open: false,
            request_seq: 0,
            active_request: None,
            detail_seq: 0,
            active_detail: None,
        }
    }

    pub fn scope(&self) -> PlaceScope {
        self.scope
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[PlaceSuggestion] {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_list_open(&self) -> bool {
        self.list_open
    }

    pub fn session(&self) -> Option<&SessionToken> {
        self.session.as_ref()
    }

    /// Record a keystroke. The driver must cancel any pending debounce timer
    /// first, then act on the returned directive.
    pub fn on_input(&mut self, text: &str) -> InputDirective {
        self.query = text.to_string();
        if text.trim().is_empty() {
            self.suggestions.clear();
            self.session = None;
            self.active_request = None;
            self.loading = false;
            self.list_open = false;
            return InputDirective::ClearAndStop;
        }
        InputDirective::DebounceLookup {
            delay: self.debounce,
        }
    }

    /// Called when the debounce timer fires: reuses the session token of the
    /// current search session (creating one if needed) and marks this request
    /// as the only one whose response may be applied.
    pub fn begin_lookup(&mut self) -> LookupTicket {
        let session = self
            .session
            .get_or_insert_with(next_session_token)
            .clone();
        self.request_seq += 1;
        self.active_request = Some(self.request_seq);
        self.loading = true;
        LookupTicket {
            query: self.query.clone(),
            session,
            filter: self.scope.filter(),
            request_id: self.request_seq,
        }
    }

    /// Apply a suggestion response; stale responses (a newer keystroke issued
    /// a newer request) are discarded without touching state.
    pub fn apply_suggestions(
        &mut self,
        request_id: u64,
        result: Result<Vec<PlaceSuggestion>, LookupError>,
    ) -> bool {
        if self.active_request != Some(request_id) {
            debug!(
                scope = self.scope.name(),
                request_id, "discarding stale suggestion response"
            );
            return false;
        }
        self.active_request = None;
        self.loading = false;
        match result {
            Ok(suggestions) => {
                self.suggestions = suggestions;
                self.list_open = true;
            }
            Err(error) => {
                warn!(scope = self.scope.name(), %error, "suggestion lookup failed");
                self.suggestions.clear();
                self.list_open = false;
            }
        }
        true
    }

    /// Select a suggestion: closes the list, ends the search session, and
    /// issues an identity-checked resolve-details request.
    pub fn select(&mut self, suggestion_id: &str) -> Option<DetailTicket> {
        let suggestion = self
            .suggestions
            .iter()
            .find(|candidate| candidate.id == suggestion_id)?
            .clone();

        self.list_open = false;
        self.suggestions.clear();
        self.session = None;
        self.active_request = None;
        self.loading = false;

        self.detail_seq += 1;
        self.active_detail = Some(self.detail_seq);
        Some(DetailTicket {
            suggestion_id: suggestion.id,
            detail_id: self.detail_seq,
        })
    }

    /// Apply a resolve-details response; superseded requests (a second
    /// suggestion was selected meanwhile) are discarded silently.
    pub fn apply_details(
        &mut self,
        detail_id: u64,
        result: Result<PlaceDetails, LookupError>,
    ) -> Option<PlaceDetails> {
        if self.active_detail != Some(detail_id) {
            debug!(
                scope = self.scope.name(),
                detail_id, "discarding superseded detail response"
            );
            return None;
        }
        self.active_detail = None;
        match result {
            Ok(details) => Some(details),
            Err(error) => {
                warn!(scope = self.scope.name(), %error, "detail lookup failed");
                None
            }
        }
    }

    /// Close the suggestion list; invoked by the driver's delayed blur timer.
    pub fn close_list(&mut self) {
        self.list_open = false;
    }

    /// Regaining focus reopens the list when results are still at hand.
    pub fn on_focus(&mut self) {
        if !self.suggestions.is_empty() {
            self.list_open = true;
        }
    }
}
