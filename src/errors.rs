use thiserror::Error;

use crate::workflows::{WorkflowEvent, WorkflowStatus};

/// Errors returned by the compliance core.
///
/// Every variant is returned synchronously to the immediate caller. A failed
/// operation never leaves a workflow partially mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComplianceError {
    #[error("Unknown control component: {0}")]
    UnknownComponent(String),

    #[error("Unknown workflow status: {0}")]
    UnknownStatus(String),

    #[error("Unknown step status: {0}")]
    UnknownStepStatus(String),

    #[error("Unknown framework mode: {0}")]
    UnknownFrameworkMode(String),

    #[error("Invalid transition: {event:?} not allowed from {from}")]
    InvalidTransition {
        from: WorkflowStatus,
        event: WorkflowEvent,
    },

    #[error("Inconsistent step sequence: expected position {expected}, found {found}")]
    InconsistentStepSequence { expected: u32, found: u32 },

    #[error("Workflow has no step at position {sequence}")]
    UnknownStep { sequence: u32 },

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Workflow {workflow_id} already has steps or a review state")]
    StepsAlreadyAttached { workflow_id: String },

    #[error("Status {status} is inconsistent with step state: {reason}")]
    InconsistentStatus {
        status: WorkflowStatus,
        reason: String,
    },
}

impl ComplianceError {
    /// Stable machine-readable kind, for callers that map errors to UI state.
    pub fn kind(&self) -> &'static str {
        match self {
            ComplianceError::UnknownComponent(_) => "unknown_component",
            ComplianceError::UnknownStatus(_) => "unknown_status",
            ComplianceError::UnknownStepStatus(_) => "unknown_step_status",
            ComplianceError::UnknownFrameworkMode(_) => "unknown_framework_mode",
            ComplianceError::InvalidTransition { .. } => "invalid_transition",
            ComplianceError::InconsistentStepSequence { .. } => "inconsistent_step_sequence",
            ComplianceError::UnknownStep { .. } => "unknown_step",
            ComplianceError::MissingField { .. } => "missing_field",
            ComplianceError::StepsAlreadyAttached { .. } => "steps_already_attached",
            ComplianceError::InconsistentStatus { .. } => "inconsistent_status",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_names_state_and_event() {
        let err = ComplianceError::InvalidTransition {
            from: WorkflowStatus::Completed,
            event: WorkflowEvent::Approve,
        };
        let message = err.to_string();
        assert!(message.contains("Approve"));
        assert!(message.contains("completed"));
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn test_sequence_error_message() {
        let err = ComplianceError::InconsistentStepSequence { expected: 3, found: 5 };
        assert_eq!(
            err.to_string(),
            "Inconsistent step sequence: expected position 3, found 5"
        );
    }
}
