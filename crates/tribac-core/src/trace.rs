use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    DetectLanguage,
    Normalize,
    ResolveMaterial,
    KeywordScore,
    Adjustment,
    SemanticMatch,
    Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    pub message: String,
}

/// Ordered record of the steps one classification took.
///
/// A disabled trace drops every step without building its message.
#[derive(Debug, Default)]
pub struct Trace {
    enabled: bool,
    steps: Vec<TraceStep>,
}

impl Trace {
    pub fn enabled() -> Self {
        Trace {
            enabled: true,
            steps: Vec::new(),
        }
    }

    pub fn disabled() -> Self {
        Trace::default()
    }

    /// Record a step; `message` is only built when the trace is enabled.
    pub fn push(&mut self, step_type: TraceStepType, message: impl FnOnce() -> String) {
        if self.enabled {
            self.steps.push(TraceStep {
                step_type,
                message: message(),
            });
        }
    }

    pub fn into_steps(self) -> Vec<TraceStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_trace_records_nothing() {
        let mut trace = Trace::disabled();
        trace.push(TraceStepType::Decision, || unreachable!());
        assert!(trace.into_steps().is_empty());
    }

    #[test]
    fn test_enabled_trace_keeps_order() {
        let mut trace = Trace::enabled();
        trace.push(TraceStepType::DetectLanguage, || "fr".into());
        trace.push(TraceStepType::Decision, || "glass".into());
        let steps = trace.into_steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].step_type, TraceStepType::DetectLanguage);
        assert_eq!(steps[1].message, "glass");
    }

    #[test]
    fn test_step_serializes_snake_case() {
        let step = TraceStep {
            step_type: TraceStepType::SemanticMatch,
            message: "x".into(),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["step_type"], "semantic_match");
    }
}
