use serde::Serialize;

/// Structured trace events emitted across the cadence crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ExpressionClassified {
        expression: String,
        kind: &'static str,
    },
    DurationEvaluated {
        duration: String,
        anchored: bool,
        /// Rough magnitude in seconds (30-day months, 365-day years).
        approx_seconds: i64,
    },
    OccurrenceSearched {
        schedule: String,
        direction: &'static str,
        from: String,
        found: Option<String>,
        iterations: u32,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::debug!(trace_event = %json, "cd_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let event = TraceEvent::ExpressionClassified {
            expression: "E0W".into(),
            kind: "duration",
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ExpressionClassified");
        assert_eq!(json["kind"], "duration");
    }

    #[test]
    fn missing_occurrence_serializes_as_null() {
        let event = TraceEvent::OccurrenceSearched {
            schedule: "0 0 0 31 2 *".into(),
            direction: "next",
            from: "2024-01-01T00:00:00Z".into(),
            found: None,
            iterations: 12,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json["found"].is_null());
        assert_eq!(json["iterations"], 12);
    }

    #[test]
    fn duration_event_carries_approximate_length() {
        let event = TraceEvent::DurationEvaluated {
            duration: "E8H".into(),
            anchored: false,
            approx_seconds: 8 * 3600,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["approx_seconds"], 28_800);
    }
}
