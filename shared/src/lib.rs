#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod event;
pub mod model;
pub mod nonce;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use event::Event;
pub use model::{
    AuthFlow, AuthState, AuthUser, Coordinate, Credentials, PermissionState, Place, PlaceId,
    Redacted, Region, Suggestion, SuggestionId, UserId,
};
pub use validation::PasswordStrength;

// Default camera: Taipei city centre until a device fix arrives.
pub const DEFAULT_CENTER_LAT: f64 = 25.0330;
pub const DEFAULT_CENTER_LON: f64 = 121.5654;
pub const DEFAULT_SPAN_DEG: f64 = 0.1;
pub const FOCUS_SPAN_DEG: f64 = 0.05;

pub const MAX_SUGGESTIONS: usize = 15;
pub const MAX_RESULTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Authentication,
    Network,
    Validation,
    Search,
    Location,
    InvalidState,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Authentication => "AUTH_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Search => "SEARCH_ERROR",
            Self::Location => "LOCATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Search | Self::Location => ErrorSeverity::Transient,
            Self::Authentication | Self::Validation | Self::InvalidState | Self::Unknown => {
                ErrorSeverity::Permanent
            }
        }
    }
}

/// Boundary error surfaced to the shell. Provider errors are mapped into
/// this before they reach a view; nothing in the core is fatal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Authentication | ErrorKind::Validation | ErrorKind::Search => {
                self.message.clone()
            }
            ErrorKind::Location => "Unable to determine your location.".into(),
            ErrorKind::InvalidState | ErrorKind::Unknown => {
                "Something went wrong. Please try again.".into()
            }
        }
    }
}

#[derive(Debug)]
pub struct Model {
    // Authentication
    pub auth_state: AuthState,
    pub flow: AuthFlow,
    pub credentials: Credentials,
    pub user: Option<AuthUser>,
    pub display_name: Option<String>,
    pub pending_nonce: Option<nonce::Nonce>,
    pub auth_listener_registered: bool,

    // Place search
    pub query: String,
    pub completion_seq: u64,
    pub suggestions: Vec<Suggestion>,
    pub results: Vec<Place>,
    pub selection: Option<PlaceId>,
    pub is_searching: bool,
    pub search_sheet_open: bool,

    // Map & location
    pub map_region: Region,
    pub visible_region: Option<Region>,
    pub device_location: Option<Coordinate>,
    pub location_permission: PermissionState,

    // UI
    pub active_error: Option<AppError>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            auth_state: AuthState::Unauthenticated,
            flow: AuthFlow::Login,
            credentials: Credentials::default(),
            user: None,
            display_name: None,
            pending_nonce: None,
            auth_listener_registered: false,
            query: String::new(),
            completion_seq: 0,
            suggestions: Vec::new(),
            results: Vec::new(),
            selection: None,
            is_searching: false,
            // The search sheet is presented as soon as the map tab shows.
            search_sheet_open: true,
            map_region: Region::default(),
            visible_region: None,
            device_location: None,
            location_permission: PermissionState::Unknown,
            active_error: None,
        }
    }
}

impl Model {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Derived, never stored: recomputed from the current flow and fields.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        validation::credentials_valid(
            self.flow,
            &self.credentials.email,
            self.credentials.password.expose(),
            self.credentials.confirm_password.expose(),
        )
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn selected_place(&self) -> Option<&Place> {
        let id = self.selection?;
        self.results.iter().find(|p| p.id == id)
    }

    /// A selection must refer to an element of the current result set; drop
    /// it when a replacement set no longer contains it.
    pub fn reconcile_selection(&mut self) {
        if let Some(id) = self.selection {
            if !self.results.iter().any(|p| p.id == id) {
                self.selection = None;
            }
        }
    }

    pub fn reset_auth_form(&mut self) {
        self.flow = AuthFlow::Login;
        self.credentials.clear();
    }

    pub fn clear_search(&mut self) {
        self.query.clear();
        self.completion_seq += 1;
        self.suggestions.clear();
        self.results.clear();
        self.selection = None;
        self.is_searching = false;
        self.search_sheet_open = true;
    }

    /// Region used to bound one-shot searches: the visible camera region
    /// when the map has reported one, otherwise the device fix.
    #[must_use]
    pub fn search_region(&self) -> Option<Region> {
        self.visible_region.or_else(|| {
            self.device_location
                .map(|center| Region::new(center, FOCUS_SPAN_DEG))
        })
    }
}

// --- View model ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthFormView {
    pub flow: AuthFlow,
    pub email: String,
    pub is_valid: bool,
    pub can_submit: bool,
    pub password_strength: Option<PasswordStrength>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionView {
    pub id: SuggestionId,
    pub title: String,
    pub subtitle: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaceListItem {
    pub id: PlaceId,
    pub name: String,
    pub address: Option<String>,
    pub is_selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaceDetailView {
    pub id: PlaceId,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Unauthenticated {
        form: AuthFormView,
    },
    Authenticating {
        form: AuthFormView,
    },
    Ready {
        display_name: String,
        map_center_lat: f64,
        map_center_lon: f64,
        map_span_deg: f64,
        query: String,
        suggestions: Vec<SuggestionView>,
        results: Vec<PlaceListItem>,
        selected_detail: Option<PlaceDetailView>,
        is_searching: bool,
        search_sheet_open: bool,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_transient: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_transient: e.severity == ErrorSeverity::Transient,
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: ViewState,
    pub error: Option<UserFacingError>,
    pub is_authenticated: bool,
}

pub mod app {
    use super::{
        AppError, AuthFlow, AuthFormView, AuthState, Coordinate, ErrorKind, Model, PlaceDetailView,
        PlaceId, PlaceListItem, Region, Suggestion, SuggestionView, UserFacingError, ViewModel,
        ViewState, FOCUS_SPAN_DEG, MAX_RESULTS, MAX_SUGGESTIONS,
    };
    use crate::capabilities::auth::{AuthError, AuthOutput, FederatedProvider};
    use crate::capabilities::geo::{GeoOutput, PlaceRecord, SearchError, MAX_QUERY_LENGTH};
    use crate::capabilities::location::{LocationError, LocationOutput};
    use crate::capabilities::Capabilities;
    use crate::event::Event;
    use crate::model::{PermissionState, Place};
    use crate::nonce::{Nonce, OsRng};
    use crate::validation;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn auth_error(error: &AuthError) -> AppError {
            match error {
                AuthError::InvalidCredential => {
                    AppError::new(ErrorKind::Authentication, "Invalid email or password.")
                }
                AuthError::Network { .. } => {
                    AppError::new(ErrorKind::Network, "Network failure during sign-in.")
                }
                AuthError::WeakPassword => AppError::new(
                    ErrorKind::Authentication,
                    "Password is too weak. Use at least 8 characters mixing letters, numbers and symbols.",
                ),
                AuthError::AccountExists => AppError::new(
                    ErrorKind::Authentication,
                    "An account already exists for this email.",
                ),
                AuthError::Revoked => AppError::new(
                    ErrorKind::Authentication,
                    "Your credential was revoked. Please sign in again.",
                ),
                AuthError::Unknown { message } => {
                    AppError::new(ErrorKind::Authentication, message.clone())
                }
            }
        }

        fn search_error(error: &SearchError) -> AppError {
            match error {
                SearchError::Network { .. } => {
                    AppError::new(ErrorKind::Network, "Network failure during search.")
                }
                SearchError::NoResults => AppError::new(
                    ErrorKind::Search,
                    "No results found. Try a different location.",
                ),
                SearchError::MalformedQuery => AppError::new(
                    ErrorKind::Validation,
                    "Enter a location name, address, or place.",
                ),
            }
        }

        fn fail_auth(model: &mut Model, caps: &Capabilities, error: &AuthError) {
            model.pending_nonce = None;
            model.auth_state = AuthState::Unauthenticated;
            model.set_error(Self::auth_error(error));
            caps.telemetry.error("auth_failed", &error.to_string());
        }

        fn ingest_places(records: Vec<PlaceRecord>, caps: &Capabilities) -> Vec<Place> {
            let total = records.len();
            let mut places: Vec<Place> =
                records.into_iter().filter_map(Place::from_record).collect();
            if places.len() < total {
                caps.telemetry
                    .counter("places_dropped_invalid", (total - places.len()) as u64);
            }
            places.truncate(MAX_RESULTS);
            places
        }

        fn select_place(model: &mut Model, id: PlaceId) -> bool {
            let Some(coordinate) = model
                .results
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.coordinate)
            else {
                return false;
            };
            model.selection = Some(id);
            model.search_sheet_open = false;
            model.map_region = Region::new(coordinate, FOCUS_SPAN_DEG);
            true
        }

        fn build_auth_form(model: &Model) -> AuthFormView {
            let password = model.credentials.password.expose();
            AuthFormView {
                flow: model.flow,
                email: model.credentials.email.clone(),
                is_valid: model.is_valid(),
                can_submit: model.is_valid() && model.auth_state != AuthState::Authenticating,
                password_strength: (model.flow == AuthFlow::SignUp && !password.is_empty())
                    .then(|| validation::password_strength(password)),
            }
        }

        fn build_detail(place: &Place) -> PlaceDetailView {
            PlaceDetailView {
                id: place.id,
                name: place.name.clone(),
                address: place.address.clone(),
                phone: place.phone.clone(),
                url: place.url.as_ref().map(url::Url::to_string),
                lat: place.coordinate.lat(),
                lon: place.coordinate.lng(),
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            caps.telemetry
                .counter(&format!("event.{}", event.name()), 1);
            if event.is_user_initiated() {
                caps.telemetry.event("user_action", &[("event", event.name())]);
            }

            match event {
                Event::AppStarted => {
                    // The session stream outlives every view; a rebuilt shell
                    // replaying AppStarted must not register a second one.
                    if !model.auth_listener_registered {
                        model.auth_listener_registered = true;
                        caps.auth.listen(|user| Event::SessionChanged { user });
                    }

                    if model.location_permission.needs_request() {
                        model.location_permission = PermissionState::Requesting;
                        caps.location
                            .request_permission(|granted| Event::LocationPermissionResult {
                                granted,
                            });
                    }

                    caps.render.render();
                }

                // --- Authentication ---
                Event::FlowSwitched => {
                    model.flow = model.flow.toggled();
                    model.clear_error();
                    caps.render.render();
                }

                Event::EmailChanged(email) => {
                    model.credentials.email = email;
                    model.clear_error();
                    caps.render.render();
                }

                Event::PasswordChanged(password) => {
                    model.credentials.password = password;
                    model.clear_error();
                    caps.render.render();
                }

                Event::ConfirmPasswordChanged(confirm) => {
                    model.credentials.confirm_password = confirm;
                    model.clear_error();
                    caps.render.render();
                }

                Event::SignInSubmitted => {
                    if model.auth_state == AuthState::Authenticating {
                        caps.telemetry.counter("auth_duplicate_submit", 1);
                        return;
                    }
                    if !model.is_valid() {
                        model.set_error(AppError::new(
                            ErrorKind::Validation,
                            match model.flow {
                                AuthFlow::Login => "Enter your email and password.",
                                AuthFlow::SignUp => {
                                    "Check your email, password strength and confirmation."
                                }
                            },
                        ));
                        caps.render.render();
                        return;
                    }

                    model.clear_error();
                    model.auth_state = AuthState::Authenticating;

                    let email = model.credentials.email.clone();
                    let password = model.credentials.password.expose().to_string();
                    match model.flow {
                        AuthFlow::Login => caps.auth.sign_in(email, password, |result| {
                            Event::AuthCompleted(Box::new(result))
                        }),
                        AuthFlow::SignUp => caps.auth.create_user(email, password, |result| {
                            Event::AuthCompleted(Box::new(result))
                        }),
                    }

                    caps.telemetry
                        .event("auth_submitted", &[("flow", model.flow.as_str())]);
                    caps.render.render();
                }

                Event::FederatedSignInRequested { provider } => {
                    if model.auth_state == AuthState::Authenticating {
                        caps.telemetry.counter("auth_duplicate_submit", 1);
                        return;
                    }

                    model.clear_error();

                    // One nonce per attempt, generated fresh and consumed on
                    // the assertion. Only Apple's flow carries one.
                    let nonce_sha256 = match provider {
                        FederatedProvider::Apple => match Nonce::generate(&OsRng) {
                            Ok(nonce) => {
                                let digest = nonce.sha256_hex();
                                model.pending_nonce = Some(nonce);
                                Some(digest)
                            }
                            Err(e) => {
                                model.set_error(AppError::new(
                                    ErrorKind::InvalidState,
                                    "Secure sign-in is unavailable right now.",
                                ));
                                caps.telemetry.error("nonce_unavailable", &e.to_string());
                                caps.render.render();
                                return;
                            }
                        },
                        FederatedProvider::Google => None,
                    };

                    model.auth_state = AuthState::Authenticating;
                    caps.auth
                        .federated_authorize(provider, nonce_sha256, move |result| {
                            Event::AssertionReceived {
                                provider,
                                result: Box::new(result),
                            }
                        });

                    caps.telemetry
                        .event("federated_requested", &[("provider", provider.as_str())]);
                    caps.render.render();
                }

                Event::AssertionReceived { provider, result } => match *result {
                    Ok(AuthOutput::Assertion { id_token }) => {
                        let raw_nonce = model.pending_nonce.take().map(Nonce::into_raw);
                        caps.auth
                            .federated_sign_in(provider, id_token, raw_nonce, |result| {
                                Event::AuthCompleted(Box::new(result))
                            });
                    }
                    Ok(_) => {
                        model.pending_nonce = None;
                        model.auth_state = AuthState::Unauthenticated;
                        model.set_error(AppError::new(
                            ErrorKind::InvalidState,
                            "Sign-in could not be completed.",
                        ));
                        caps.telemetry
                            .error("assertion_unexpected", provider.as_str());
                        caps.render.render();
                    }
                    Err(e) => {
                        Self::fail_auth(model, caps, &e);
                        caps.render.render();
                    }
                },

                Event::AuthCompleted(result) => {
                    model.pending_nonce = None;
                    match *result {
                        // The session stream is authoritative; stay in
                        // Authenticating until it confirms.
                        Ok(_) => caps.telemetry.event("auth_confirmed", &[]),
                        Err(e) => {
                            Self::fail_auth(model, caps, &e);
                            caps.render.render();
                        }
                    }
                }

                Event::SessionChanged { user } => {
                    match user {
                        Some(user) => {
                            model.display_name = Some(user.display_label());
                            model.user = Some(user);
                            model.auth_state = AuthState::Authenticated;
                            model.clear_error();
                            caps.telemetry.event("session_started", &[]);
                        }
                        None => {
                            let had_session = model.user.is_some();
                            model.user = None;
                            model.display_name = None;
                            model.auth_state = AuthState::Unauthenticated;
                            model.reset_auth_form();
                            model.clear_search();
                            if had_session {
                                caps.telemetry.event("session_ended", &[]);
                            }
                        }
                    }
                    caps.render.render();
                }

                Event::SignOutRequested => {
                    // State flips when the session stream reports the signed
                    // out user, keeping remote revocation and local sign-out
                    // on the same path.
                    caps.auth
                        .sign_out(|result| Event::SignOutCompleted(Box::new(result)));
                }

                Event::SignOutCompleted(result) => {
                    if let Err(e) = *result {
                        model.set_error(Self::auth_error(&e));
                        caps.telemetry.error("sign_out_failed", &e.to_string());
                        caps.render.render();
                    }
                }

                Event::DeleteAccountRequested => {
                    if model.auth_state != AuthState::Authenticated {
                        caps.telemetry.counter("delete_without_session", 1);
                        return;
                    }
                    caps.auth
                        .delete_account(|result| Event::DeleteAccountCompleted(Box::new(result)));
                }

                Event::DeleteAccountCompleted(result) => {
                    if let Err(e) = *result {
                        // Deletion failure leaves the auth state untouched.
                        model.set_error(Self::auth_error(&e));
                        caps.telemetry.error("delete_failed", &e.to_string());
                        caps.render.render();
                    } else {
                        caps.telemetry.event("account_deleted", &[]);
                    }
                }

                Event::ErrorDismissed => {
                    model.clear_error();
                    caps.render.render();
                }

                // --- Place search ---
                Event::SearchQueryChanged(fragment) => {
                    model.query = fragment;
                    // Bumping the sequence invalidates every in-flight
                    // completion, including when the query becomes empty.
                    model.completion_seq += 1;

                    if model.query.is_empty() {
                        model.suggestions.clear();
                    } else if model.query.chars().count() > MAX_QUERY_LENGTH {
                        caps.telemetry.counter("completion_query_too_long", 1);
                    } else {
                        let seq = model.completion_seq;
                        caps.geo.complete(model.query.clone(), move |result| {
                            Event::SuggestionsReceived {
                                seq,
                                result: Box::new(result),
                            }
                        });
                    }
                    caps.render.render();
                }

                Event::SuggestionsReceived { seq, result } => {
                    if seq != model.completion_seq {
                        caps.telemetry.counter("completions_stale_dropped", 1);
                        return;
                    }
                    match *result {
                        Ok(GeoOutput::Completions(records)) => {
                            model.suggestions = records
                                .into_iter()
                                .map(Suggestion::from_record)
                                .take(MAX_SUGGESTIONS)
                                .collect();
                            caps.render.render();
                        }
                        Ok(GeoOutput::Places(_)) => {
                            caps.telemetry
                                .warn("completions_unexpected_output", "places");
                        }
                        Err(e) => {
                            // Keep whatever was on screen; a failed
                            // completion is not worth a banner.
                            caps.telemetry.warn("completions_failed", &e.to_string());
                        }
                    }
                }

                Event::SearchSubmitted => {
                    let query = model.query.trim().to_string();
                    if query.is_empty() || query.chars().count() > MAX_QUERY_LENGTH {
                        model.set_error(Self::search_error(&SearchError::MalformedQuery));
                        caps.render.render();
                        return;
                    }

                    model.is_searching = true;
                    model.clear_error();
                    caps.geo.search(query, model.search_region(), |result| {
                        Event::SearchCompleted(Box::new(result))
                    });

                    caps.telemetry.event("search_submitted", &[]);
                    caps.render.render();
                }

                Event::SearchCompleted(result) => {
                    model.is_searching = false;
                    match *result {
                        Ok(GeoOutput::Places(records)) => {
                            let places = Self::ingest_places(records, caps);
                            if places.is_empty() {
                                // A failed query never clears a valid set.
                                model.set_error(Self::search_error(&SearchError::NoResults));
                                caps.telemetry.event("search_empty", &[]);
                            } else {
                                let count = places.len();
                                model.results = places;
                                model.suggestions.clear();
                                model.reconcile_selection();
                                if count == 1 {
                                    let only = model.results[0].id;
                                    Self::select_place(model, only);
                                }
                                caps.telemetry
                                    .event("search_success", &[("count", &count.to_string())]);
                            }
                        }
                        Ok(GeoOutput::Completions(_)) => {
                            caps.telemetry
                                .warn("search_unexpected_output", "completions");
                        }
                        Err(e) => {
                            model.set_error(Self::search_error(&e));
                            caps.telemetry.error("search_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::SuggestionSelected(id) => {
                    let Some((title, subtitle)) = model
                        .suggestions
                        .iter()
                        .find(|s| s.id == id)
                        .map(|s| (s.title.clone(), s.subtitle.clone()))
                    else {
                        caps.telemetry.counter("suggestion_unknown", 1);
                        return;
                    };

                    // Resolve through a follow-up search on the candidate's
                    // own title and subtitle; the completion payload carries
                    // no documented place handle.
                    let resolve_query = if subtitle.is_empty() {
                        title.clone()
                    } else {
                        format!("{title} {subtitle}")
                    };
                    model.query = title;
                    model.completion_seq += 1;
                    model.is_searching = true;

                    caps.geo
                        .search(resolve_query, model.search_region(), |result| {
                            Event::SuggestionResolved(Box::new(result))
                        });
                    caps.render.render();
                }

                Event::SuggestionResolved(result) => {
                    model.is_searching = false;
                    match *result {
                        Ok(GeoOutput::Places(records)) => {
                            match Self::ingest_places(records, caps).into_iter().next() {
                                Some(place) => {
                                    let id = place.id;
                                    model.results = vec![place];
                                    model.suggestions.clear();
                                    Self::select_place(model, id);
                                    caps.telemetry.event("suggestion_resolved", &[]);
                                }
                                None => {
                                    model.set_error(Self::search_error(&SearchError::NoResults));
                                    caps.telemetry.event("suggestion_resolve_empty", &[]);
                                }
                            }
                        }
                        Ok(GeoOutput::Completions(_)) => {
                            caps.telemetry
                                .warn("search_unexpected_output", "completions");
                        }
                        Err(e) => {
                            model.set_error(Self::search_error(&e));
                            caps.telemetry.error("suggestion_resolve_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::ResultSelected(id) => {
                    if Self::select_place(model, id) {
                        caps.render.render();
                    } else {
                        caps.telemetry.counter("selection_unknown", 1);
                    }
                }

                Event::SelectionCleared => {
                    model.selection = None;
                    model.search_sheet_open = true;
                    caps.render.render();
                }

                // --- Map & location ---
                Event::MapMoved { center, span_deg } => {
                    let region = Region::new(center, span_deg);
                    model.map_region = region;
                    model.visible_region = Some(region);
                    caps.render.render();
                }

                Event::LocationPermissionResult { granted } => {
                    model.location_permission = if granted {
                        PermissionState::Granted
                    } else {
                        PermissionState::Denied
                    };

                    if granted {
                        caps.location.get_current(|result| match result {
                            Ok(LocationOutput::Position {
                                lat,
                                lng,
                                accuracy_m,
                            }) => Event::LocationReceived {
                                lat,
                                lng,
                                accuracy_m,
                            },
                            Ok(LocationOutput::Permission { .. }) => {
                                Event::LocationFailed(LocationError::Failed)
                            }
                            Err(e) => Event::LocationFailed(e),
                        });
                    }

                    caps.telemetry
                        .event("location_permission", &[("granted", &granted.to_string())]);
                    caps.render.render();
                }

                Event::LocationReceived {
                    lat,
                    lng,
                    accuracy_m: _,
                } => {
                    match Coordinate::new(lat, lng) {
                        Ok(coordinate) => {
                            model.device_location = Some(coordinate);
                            model.map_region = Region::new(coordinate, FOCUS_SPAN_DEG);
                            caps.telemetry.event("location_fix", &[]);
                        }
                        Err(e) => {
                            caps.telemetry.error("location_invalid", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::LocationFailed(error) => {
                    model.set_error(AppError::new(ErrorKind::Location, error.to_string()));
                    caps.telemetry.warn("location_failed", &error.to_string());
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let state = match model.auth_state {
                AuthState::Unauthenticated => ViewState::Unauthenticated {
                    form: Self::build_auth_form(model),
                },
                AuthState::Authenticating => ViewState::Authenticating {
                    form: Self::build_auth_form(model),
                },
                AuthState::Authenticated => ViewState::Ready {
                    display_name: model
                        .display_name
                        .clone()
                        .unwrap_or_else(|| "(unknown)".to_string()),
                    map_center_lat: model.map_region.center.lat(),
                    map_center_lon: model.map_region.center.lng(),
                    map_span_deg: model.map_region.span_deg,
                    query: model.query.clone(),
                    suggestions: model
                        .suggestions
                        .iter()
                        .map(|s| SuggestionView {
                            id: s.id,
                            title: s.title.clone(),
                            subtitle: s.subtitle.clone(),
                        })
                        .collect(),
                    results: model
                        .results
                        .iter()
                        .map(|p| PlaceListItem {
                            id: p.id,
                            name: p.name.clone(),
                            address: p.address.clone(),
                            is_selected: model.selection == Some(p.id),
                        })
                        .collect(),
                    selected_detail: model.selected_place().map(Self::build_detail),
                    is_searching: model.is_searching,
                    search_sheet_open: model.search_sheet_open,
                },
            };

            ViewModel {
                state,
                error: model.active_error.as_ref().map(UserFacingError::from),
                is_authenticated: model.is_authenticated(),
            }
        }
    }
}
