//! Geo-search capability: one-shot geocoded search and incremental
//! autocomplete, backed shell-side by the platform's local-search SDK.
//!
//! Completion responses arrive asynchronously and possibly out of submission
//! order; the core tags each request with a sequence number in its callback
//! and drops responses that are no longer the latest.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Region;

pub const MAX_QUERY_LENGTH: usize = 512;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data")]
pub enum GeoOperation {
    /// Natural-language search, optionally bounded by a camera region.
    Search {
        query: String,
        region: Option<Region>,
    },
    /// Incremental completion for a partially typed query.
    Complete { fragment: String },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SearchError {
    #[error("network failure: {message}")]
    Network { message: String },

    #[error("no results")]
    NoResults,

    #[error("malformed query")]
    MalformedQuery,
}

/// Raw place payload from the shell. Coordinates are unvalidated here; the
/// core validates on ingest and drops unusable records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuggestionRecord {
    pub title: String,
    pub subtitle: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum GeoOutput {
    Places(Vec<PlaceRecord>),
    Completions(Vec<SuggestionRecord>),
}

pub type GeoResult = Result<GeoOutput, SearchError>;

impl Operation for GeoOperation {
    type Output = GeoResult;
}

pub struct Geo<Ev> {
    context: CapabilityContext<GeoOperation, Ev>,
}

impl<Ev> Capability<Ev> for Geo<Ev> {
    type Operation = GeoOperation;
    type MappedSelf<MappedEv> = Geo<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Geo::new(self.context.map_event(f))
    }
}

impl<Ev> Geo<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<GeoOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn search<F>(&self, query: String, region: Option<Region>, callback: F)
    where
        F: Fn(GeoResult) -> Ev + Send + Sync + 'static,
    {
        self.request(GeoOperation::Search { query, region }, callback);
    }

    pub fn complete<F>(&self, fragment: String, callback: F)
    where
        F: Fn(GeoResult) -> Ev + Send + Sync + 'static,
    {
        self.request(GeoOperation::Complete { fragment }, callback);
    }

    fn request<F>(&self, operation: GeoOperation, callback: F)
    where
        F: Fn(GeoResult) -> Ev + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(result));
        });
    }
}
