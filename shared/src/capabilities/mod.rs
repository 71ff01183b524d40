//! Capability boundary between the core and the native shells.
//!
//! Every operation and output here is serde-serializable; the shells own the
//! platform SDKs and resolve requests asynchronously.

pub mod auth;
pub mod geo;
pub mod location;
pub mod telemetry;

pub use self::auth::{Auth, AuthError, AuthOperation, AuthOutput, AuthResult, FederatedProvider};
pub use self::geo::{
    Geo, GeoOperation, GeoOutput, GeoResult, PlaceRecord, SearchError, SuggestionRecord,
};
pub use self::location::{
    Location, LocationError, LocationOperation, LocationOutput, LocationResult,
};
pub use self::telemetry::{Telemetry, TelemetryOperation};

// We use Crux's built-in Render capability directly because it provides
// all necessary functionality for triggering view updates.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppAuth = Auth<Event>;
pub type AppGeo = Geo<Event>;
pub type AppLocation = Location<Event>;
pub type AppTelemetry = Telemetry<Event>;
pub type AppRender = Render<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub auth: Auth<Event>,
    pub geo: Geo<Event>,
    pub location: Location<Event>,
    pub telemetry: Telemetry<Event>,
    pub render: Render<Event>,
}
