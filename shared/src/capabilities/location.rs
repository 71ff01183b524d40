//! Device-location capability: permission prompt plus a one-shot fix.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op")]
pub enum LocationOperation {
    RequestPermission,
    GetCurrent,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationError {
    #[error("location access denied")]
    PermissionDenied,

    #[error("location authorization restricted")]
    Restricted,

    #[error("unknown location")]
    UnknownLocation,

    #[error("access denied")]
    AccessDenied,

    #[error("network failed")]
    Network,

    #[error("operation failed")]
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum LocationOutput {
    Permission {
        granted: bool,
    },
    Position {
        lat: f64,
        lng: f64,
        accuracy_m: f64,
    },
}

pub type LocationResult = Result<LocationOutput, LocationError>;

impl Operation for LocationOperation {
    type Output = LocationResult;
}

pub struct Location<Ev> {
    context: CapabilityContext<LocationOperation, Ev>,
}

impl<Ev> Capability<Ev> for Location<Ev> {
    type Operation = LocationOperation;
    type MappedSelf<MappedEv> = Location<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Location::new(self.context.map_event(f))
    }
}

impl<Ev> Location<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<LocationOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn request_permission<F>(&self, callback: F)
    where
        F: Fn(bool) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(LocationOperation::RequestPermission)
                .await;
            let granted = matches!(result, Ok(LocationOutput::Permission { granted: true }));
            ctx.update_app(callback(granted));
        });
    }

    pub fn get_current<F>(&self, callback: F)
    where
        F: Fn(LocationResult) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(LocationOperation::GetCurrent).await;
            ctx.update_app(callback(result));
        });
    }
}
