use serde::{Deserialize, Serialize};

use crate::capabilities::auth::{AuthResult, FederatedProvider};
use crate::capabilities::geo::GeoResult;
use crate::capabilities::location::LocationError;
use crate::model::{AuthUser, Coordinate, PlaceId, Redacted, SuggestionId};

/// Everything that can happen to the core: user actions from the shell and
/// capability responses. Fat payloads are boxed to keep the enum small.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    AppStarted,

    // Authentication
    FlowSwitched,
    EmailChanged(String),
    PasswordChanged(Redacted),
    ConfirmPasswordChanged(Redacted),
    SignInSubmitted,
    FederatedSignInRequested {
        provider: FederatedProvider,
    },
    AssertionReceived {
        provider: FederatedProvider,
        result: Box<AuthResult>,
    },
    AuthCompleted(Box<AuthResult>),
    SessionChanged {
        user: Option<AuthUser>,
    },
    SignOutRequested,
    SignOutCompleted(Box<AuthResult>),
    DeleteAccountRequested,
    DeleteAccountCompleted(Box<AuthResult>),
    ErrorDismissed,

    // Place search
    SearchQueryChanged(String),
    SuggestionsReceived {
        seq: u64,
        result: Box<GeoResult>,
    },
    SearchSubmitted,
    SearchCompleted(Box<GeoResult>),
    SuggestionSelected(SuggestionId),
    SuggestionResolved(Box<GeoResult>),
    ResultSelected(PlaceId),
    SelectionCleared,

    // Map & location
    MapMoved {
        center: Coordinate,
        span_deg: f64,
    },
    LocationPermissionResult {
        granted: bool,
    },
    LocationReceived {
        lat: f64,
        lng: f64,
        accuracy_m: f64,
    },
    LocationFailed(LocationError),
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::FlowSwitched => "flow_switched",
            Self::EmailChanged(_) => "email_changed",
            Self::PasswordChanged(_) => "password_changed",
            Self::ConfirmPasswordChanged(_) => "confirm_password_changed",
            Self::SignInSubmitted => "sign_in_submitted",
            Self::FederatedSignInRequested { .. } => "federated_sign_in_requested",
            Self::AssertionReceived { .. } => "assertion_received",
            Self::AuthCompleted(_) => "auth_completed",
            Self::SessionChanged { .. } => "session_changed",
            Self::SignOutRequested => "sign_out_requested",
            Self::SignOutCompleted(_) => "sign_out_completed",
            Self::DeleteAccountRequested => "delete_account_requested",
            Self::DeleteAccountCompleted(_) => "delete_account_completed",
            Self::ErrorDismissed => "error_dismissed",
            Self::SearchQueryChanged(_) => "search_query_changed",
            Self::SuggestionsReceived { .. } => "suggestions_received",
            Self::SearchSubmitted => "search_submitted",
            Self::SearchCompleted(_) => "search_completed",
            Self::SuggestionSelected(_) => "suggestion_selected",
            Self::SuggestionResolved(_) => "suggestion_resolved",
            Self::ResultSelected(_) => "result_selected",
            Self::SelectionCleared => "selection_cleared",
            Self::MapMoved { .. } => "map_moved",
            Self::LocationPermissionResult { .. } => "location_permission_result",
            Self::LocationReceived { .. } => "location_received",
            Self::LocationFailed(_) => "location_failed",
        }
    }

    /// True for events originating from a user gesture, as opposed to
    /// capability responses.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::FlowSwitched
                | Self::EmailChanged(_)
                | Self::PasswordChanged(_)
                | Self::ConfirmPasswordChanged(_)
                | Self::SignInSubmitted
                | Self::FederatedSignInRequested { .. }
                | Self::SignOutRequested
                | Self::DeleteAccountRequested
                | Self::ErrorDismissed
                | Self::SearchQueryChanged(_)
                | Self::SearchSubmitted
                | Self::SuggestionSelected(_)
                | Self::ResultSelected(_)
                | Self::SelectionCleared
                | Self::MapMoved { .. }
        )
    }
}
