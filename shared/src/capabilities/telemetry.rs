//! Fire-and-forget telemetry. Operations are notifications: the shell never
//! resolves them and the core never blocks on them.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum TelemetryOperation {
    Event {
        name: String,
        params: Vec<(String, String)>,
    },
    Warn {
        name: String,
        detail: String,
    },
    Error {
        name: String,
        detail: String,
    },
    Counter {
        name: String,
        value: u64,
    },
}

impl Operation for TelemetryOperation {
    type Output = ();
}

pub struct Telemetry<Ev> {
    context: CapabilityContext<TelemetryOperation, Ev>,
}

impl<Ev> Capability<Ev> for Telemetry<Ev> {
    type Operation = TelemetryOperation;
    type MappedSelf<MappedEv> = Telemetry<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Telemetry::new(self.context.map_event(f))
    }
}

impl<Ev> Telemetry<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<TelemetryOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn event(&self, name: &str, params: &[(&str, &str)]) {
        self.notify(TelemetryOperation::Event {
            name: name.to_string(),
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
    }

    pub fn warn(&self, name: &str, detail: &str) {
        self.notify(TelemetryOperation::Warn {
            name: name.to_string(),
            detail: detail.to_string(),
        });
    }

    pub fn error(&self, name: &str, detail: &str) {
        self.notify(TelemetryOperation::Error {
            name: name.to_string(),
            detail: detail.to_string(),
        });
    }

    pub fn counter(&self, name: &str, value: u64) {
        self.notify(TelemetryOperation::Counter {
            name: name.to_string(),
            value,
        });
    }

    fn notify(&self, operation: TelemetryOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serialization_round_trips() {
        let op = TelemetryOperation::Event {
            name: "search_submitted".into(),
            params: vec![("count".into(), "3".into())],
        };
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: TelemetryOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }
}
