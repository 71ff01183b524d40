use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Redacted string: safe to put in events and models, never in logs ---

/// Wrapper for user-entered secrets (passwords). Serializes transparently so
/// the shell can deliver the raw value in an event, but `Debug` is redacted.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Redacted(String);

impl Redacted {
    #[must_use]
    pub fn new(s: String) -> Self {
        Self(s)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(UserId);

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(PlaceId);
uuid_id!(SuggestionId);

// --- Coordinate: validated, NaN-safe ---

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number")]
    NonFinite,
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    #[must_use]
    pub fn lat(&self) -> f64 {
        self.lat
    }

    #[must_use]
    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.lat.to_bits() == other.lat.to_bits() && self.lng.to_bits() == other.lng.to_bits()
    }
}

impl Eq for Coordinate {}

// --- Camera region ---

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Region {
    pub center: Coordinate,
    pub span_deg: f64,
}

impl Region {
    #[must_use]
    pub fn new(center: Coordinate, span_deg: f64) -> Self {
        Self { center, span_deg }
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.center == other.center && self.span_deg.to_bits() == other.span_deg.to_bits()
    }
}

impl Eq for Region {}

impl Default for Region {
    fn default() -> Self {
        Self {
            center: Coordinate {
                lat: crate::DEFAULT_CENTER_LAT,
                lng: crate::DEFAULT_CENTER_LON,
            },
            span_deg: crate::DEFAULT_SPAN_DEG,
        }
    }
}

// --- Authentication domain ---

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthFlow {
    #[default]
    Login,
    SignUp,
}

impl AuthFlow {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Login => Self::SignUp,
            Self::SignUp => Self::Login,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::SignUp => "sign_up",
        }
    }
}

/// Identity reported by the provider's state-changed stream.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: UserId,
    pub email: Option<String>,
}

impl AuthUser {
    /// Display identity shown in the UI; the provider may not know an email.
    #[must_use]
    pub fn display_label(&self) -> String {
        self.email.clone().unwrap_or_else(|| "(unknown)".to_string())
    }
}

/// Form fields for both flows. Validity is derived, never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: Redacted,
    pub confirm_password: Redacted,
}

impl Credentials {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionState {
    #[default]
    Unknown,
    Requesting,
    Granted,
    Denied,
}

impl PermissionState {
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    #[must_use]
    pub const fn needs_request(self) -> bool {
        matches!(self, Self::Unknown)
    }
}

// --- Search domain ---

/// Autocomplete candidate shown while typing. Replaced wholesale on every
/// completer emission; ids are minted core-side on ingest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub title: String,
    pub subtitle: String,
    pub url: Option<url::Url>,
}

impl Suggestion {
    #[must_use]
    pub fn from_record(record: crate::capabilities::geo::SuggestionRecord) -> Self {
        Self {
            id: SuggestionId::generate(),
            title: record.title,
            subtitle: record.subtitle,
            url: record.url.and_then(|raw| url::Url::parse(&raw).ok()),
        }
    }
}

/// Fully resolved point-of-interest with coordinates and contact metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub id: PlaceId,
    pub name: String,
    pub coordinate: Coordinate,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub url: Option<url::Url>,
}

impl Place {
    /// Validates the record's coordinates; a record with an out-of-range or
    /// non-finite position is unusable and yields `None`.
    #[must_use]
    pub fn from_record(record: crate::capabilities::geo::PlaceRecord) -> Option<Self> {
        let coordinate = Coordinate::new(record.lat, record.lon).ok()?;
        Some(Self {
            id: PlaceId::generate(),
            name: record.name,
            coordinate,
            address: record.address,
            phone: record.phone,
            url: record.url.and_then(|raw| url::Url::parse(&raw).ok()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::geo::{PlaceRecord, SuggestionRecord};

    #[test]
    fn coordinate_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn coordinate_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, 181.0),
            Err(CoordinateError::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn coordinate_accepts_valid() {
        assert!(Coordinate::new(25.033649, 121.564824).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn region_equality_is_bitwise() {
        let a = Region::default();
        let b = Region::default();
        assert_eq!(a, b);
        let c = Region {
            span_deg: 0.2,
            ..Region::default()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn redacted_debug_is_redacted() {
        let secret = Redacted::new("hunter2".into());
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
    }

    #[test]
    fn credentials_debug_never_prints_passwords() {
        let credentials = Credentials {
            email: "user@example.com".into(),
            password: Redacted::new("hunter2".into()),
            confirm_password: Redacted::new("hunter2".into()),
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("user@example.com"));
    }

    #[test]
    fn display_label_falls_back_when_email_unknown() {
        let user = AuthUser {
            uid: UserId::new("abc"),
            email: None,
        };
        assert_eq!(user.display_label(), "(unknown)");

        let user = AuthUser {
            uid: UserId::new("abc"),
            email: Some("user@example.com".into()),
        };
        assert_eq!(user.display_label(), "user@example.com");
    }

    #[test]
    fn place_record_with_invalid_coordinates_is_dropped() {
        let record = PlaceRecord {
            name: "Nowhere".into(),
            lat: 91.0,
            lon: 0.0,
            address: None,
            phone: None,
            url: None,
        };
        assert!(Place::from_record(record).is_none());
    }

    #[test]
    fn place_record_with_bad_url_keeps_the_place() {
        let record = PlaceRecord {
            name: "Taipei 101".into(),
            lat: 25.033649,
            lon: 121.564824,
            address: Some("No. 7, Section 5, Xinyi Rd".into()),
            phone: Some("+886 2 8101 8800".into()),
            url: Some("not a url".into()),
        };
        let place = Place::from_record(record).expect("valid coordinates");
        assert!(place.url.is_none());
        assert_eq!(place.name, "Taipei 101");
    }

    #[test]
    fn suggestion_ids_are_unique_per_ingest() {
        let record = SuggestionRecord {
            title: "Taipei 101".into(),
            subtitle: "Xinyi District".into(),
            url: None,
        };
        let a = Suggestion::from_record(record.clone());
        let b = Suggestion::from_record(record);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn flow_toggles_between_login_and_sign_up() {
        assert_eq!(AuthFlow::Login.toggled(), AuthFlow::SignUp);
        assert_eq!(AuthFlow::SignUp.toggled(), AuthFlow::Login);
    }
}
