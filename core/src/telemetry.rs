//! Narrow contract to the external telemetry transport.

use std::{cell::RefCell, rc::Rc};

use serde::Serialize;

/// Receives named telemetry events with a JSON payload.
pub trait TelemetryClient {
    /// Records a single event.
    fn track(&mut self, event: &str, payload: serde_json::Value);
}

/// A telemetry event captured by [`TelemetryRecorder`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetryRecord {
    /// Event name.
    pub event: String,
    /// Event payload.
    pub payload: serde_json::Value,
}

/// In-memory client whose clones share one log, so a caller can keep a handle
/// after moving the client into the engine.
#[derive(Clone, Debug, Default)]
pub struct TelemetryRecorder {
    records: Rc<RefCell<Vec<TelemetryRecord>>>,
}

impl TelemetryRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out every captured record.
    #[must_use]
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.borrow().clone()
    }

    /// Counts records with the given event name.
    #[must_use]
    pub fn count(&self, event: &str) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|record| record.event == event)
            .count()
    }
}

impl TelemetryClient for TelemetryRecorder {
    fn track(&mut self, event: &str, payload: serde_json::Value) {
        self.records.borrow_mut().push(TelemetryRecord {
            event: event.to_owned(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{TelemetryClient, TelemetryRecorder};

    #[test]
    fn clones_share_records() {
        let recorder = TelemetryRecorder::new();
        let mut client = recorder.clone();
        client.track("gold", serde_json::json!({ "delta": 5 }));
        assert_eq!(recorder.count("gold"), 1);
        assert_eq!(recorder.records()[0].payload["delta"], 5);
    }
}
