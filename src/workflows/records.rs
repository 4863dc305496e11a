// Persisted workflow/step records exchanged with the storage collaborator

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::ControlComponent;
use crate::errors::ComplianceError;
use crate::workflows::state_machine::TransitionRecord;
use crate::workflows::types::{
    all_completed, ordered_steps, StatusFlag, StepStatus, Workflow, WorkflowStatus, WorkflowStep,
};

/// Workflow as stored by the persistence API.
///
/// `progress` is carried for consumers that read records directly; it is
/// recomputed from `steps` on load and never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub component_type: String,
    pub status: String,
    #[serde(default, deserialize_with = "untrusted_progress")]
    pub progress: Option<u8>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    pub institution_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation_note: Option<String>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<TransitionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub workflow_id: String,
    pub sequence: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Stored progress is never trusted, so a malformed value is dropped instead of
/// failing the record.
fn untrusted_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_u64)
        .and_then(|n| u8::try_from(n).ok())
        .filter(|n| *n <= 100))
}

impl TryFrom<StepRecord> for WorkflowStep {
    type Error = ComplianceError;

    fn try_from(record: StepRecord) -> Result<Self, Self::Error> {
        Ok(WorkflowStep {
            id: record.id,
            workflow_id: record.workflow_id,
            sequence: record.sequence,
            name: record.name,
            description: record.description,
            status: record.status.parse::<StepStatus>()?,
            due_date: record.due_date,
        })
    }
}

impl From<&WorkflowStep> for StepRecord {
    fn from(step: &WorkflowStep) -> Self {
        StepRecord {
            id: step.id.clone(),
            workflow_id: step.workflow_id.clone(),
            sequence: step.sequence,
            name: step.name.clone(),
            description: step.description.clone(),
            status: step.status.as_str().to_string(),
            due_date: step.due_date,
        }
    }
}

impl TryFrom<WorkflowRecord> for Workflow {
    type Error = ComplianceError;

    /// Validate a persisted record and rebuild the workflow.
    ///
    /// The declared status must be reachable from the step state; a record
    /// whose status disagrees with its steps is rejected, not repaired.
    fn try_from(record: WorkflowRecord) -> Result<Self, Self::Error> {
        let component = record.component_type.parse::<ControlComponent>()?;
        let status = record.status.parse::<WorkflowStatus>()?;

        let steps = record
            .steps
            .into_iter()
            .map(WorkflowStep::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let mut steps = ordered_steps(steps)?;
        for step in &mut steps {
            if step.id.is_empty() {
                step.id = format!("{}-step-{}", record.id, step.sequence);
            }
            step.workflow_id = record.id.clone();
        }

        let touched = steps.iter().any(|step| step.status != StepStatus::NotStarted);
        let done = all_completed(&steps);
        let inconsistent = |reason: &str| ComplianceError::InconsistentStatus {
            status,
            reason: reason.to_string(),
        };

        let flag = match status {
            WorkflowStatus::NotStarted if touched => {
                return Err(inconsistent("steps have been started"));
            }
            WorkflowStatus::NotStarted => None,
            WorkflowStatus::InProgress if !touched => {
                return Err(inconsistent("no step has been started"));
            }
            WorkflowStatus::InProgress if done => {
                return Err(inconsistent("all steps are completed"));
            }
            WorkflowStatus::InProgress => None,
            WorkflowStatus::UnderReview | WorkflowStatus::Completed if !done => {
                return Err(inconsistent("not all steps are completed"));
            }
            WorkflowStatus::UnderReview => Some(StatusFlag::UnderReview),
            WorkflowStatus::Completed => Some(StatusFlag::Approved),
            WorkflowStatus::Observed if !touched => {
                return Err(inconsistent("no step has been started"));
            }
            WorkflowStatus::Observed => Some(StatusFlag::Observed {
                note: record.observation_note.unwrap_or_default(),
            }),
        };

        let mut workflow = Workflow::new(record.id, record.name, component, record.institution_id)?
            .with_description(record.description)
            .with_created_at(record.created_at);
        workflow.due_date = record.due_date;
        workflow.steps = steps;
        workflow.flag = flag;
        workflow.history = record.history;
        Ok(workflow)
    }
}

impl Workflow {
    /// Record to write back through the persistence collaborator.
    pub fn to_record(&self) -> WorkflowRecord {
        WorkflowRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            component_type: self.component.as_str().to_string(),
            status: self.status().as_str().to_string(),
            progress: Some(self.progress()),
            due_date: self.due_date,
            created_at: self.created_at,
            institution_id: self.institution_id.clone(),
            observation_note: self.observation_note().map(str::to_string),
            steps: self.steps.iter().map(StepRecord::from).collect(),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(sequence: u32, status: &str) -> StepRecord {
        StepRecord {
            id: String::new(),
            workflow_id: String::new(),
            sequence,
            name: format!("Step {sequence}"),
            description: String::new(),
            status: status.to_string(),
            due_date: None,
        }
    }

    fn record(status: &str, steps: Vec<StepRecord>) -> WorkflowRecord {
        WorkflowRecord {
            id: "wf-1".to_string(),
            name: "Risk register".to_string(),
            description: String::new(),
            component_type: "risk_assessment".to_string(),
            status: status.to_string(),
            progress: Some(12),
            due_date: None,
            created_at: Utc::now(),
            institution_id: "inst-1".to_string(),
            observation_note: None,
            steps,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_stored_progress_is_recomputed() {
        let workflow = Workflow::try_from(record(
            "in_progress",
            vec![step(1, "completed"), step(2, "in_progress"), step(3, "not_started"), step(4, "completed")],
        ))
        .unwrap();
        assert_eq!(workflow.progress(), 50);
        assert_eq!(workflow.steps()[0].id, "wf-1-step-1");
    }

    #[test]
    fn test_unknown_values_are_rejected() {
        let mut bad_component = record("not_started", vec![]);
        bad_component.component_type = "ethics".to_string();
        assert_eq!(
            Workflow::try_from(bad_component).unwrap_err(),
            ComplianceError::UnknownComponent("ethics".to_string())
        );

        assert_eq!(
            Workflow::try_from(record("archived", vec![])).unwrap_err(),
            ComplianceError::UnknownStatus("archived".to_string())
        );

        assert_eq!(
            Workflow::try_from(record("in_progress", vec![step(1, "started")])).unwrap_err(),
            ComplianceError::UnknownStepStatus("started".to_string())
        );
    }

    #[test]
    fn test_inconsistent_status_is_rejected() {
        let cases = vec![
            record("completed", vec![step(1, "completed"), step(2, "in_progress")]),
            record("not_started", vec![step(1, "in_progress")]),
            record("in_progress", vec![step(1, "completed")]),
            record("in_progress", vec![step(1, "not_started")]),
            record("under_review", vec![]),
            record("observed", vec![step(1, "not_started"), step(2, "not_started")]),
            record("observed", vec![]),
        ];
        for case in cases {
            let status = case.status.clone();
            assert!(
                matches!(Workflow::try_from(case), Err(ComplianceError::InconsistentStatus { .. })),
                "{status}"
            );
        }
    }

    #[test]
    fn test_observed_record_keeps_note() {
        let mut observed = record("observed", vec![step(1, "completed"), step(2, "not_started")]);
        observed.observation_note = Some("Unsigned minutes".to_string());

        let workflow = Workflow::try_from(observed).unwrap();
        assert_eq!(workflow.status(), WorkflowStatus::Observed);
        assert_eq!(workflow.observation_note(), Some("Unsigned minutes"));

        let written = workflow.to_record();
        assert_eq!(written.status, "observed");
        assert_eq!(written.progress, Some(50));
        assert_eq!(written.observation_note.as_deref(), Some("Unsigned minutes"));
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let json = r#"{
            "id": "wf-7",
            "name": "Code of ethics",
            "componentType": "control_environment",
            "status": "in_progress",
            "progress": 99,
            "dueDate": "2024-12-31",
            "createdAt": "2024-01-15T09:00:00Z",
            "institutionId": "inst-3",
            "steps": [
                { "sequence": 1, "name": "Draft", "status": "completed" },
                { "sequence": 2, "name": "Publish", "status": "not_started" }
            ]
        }"#;
        let record: WorkflowRecord = serde_json::from_str(json).unwrap();
        let workflow = Workflow::try_from(record).unwrap();

        assert_eq!(workflow.component, ControlComponent::ControlEnvironment);
        assert_eq!(workflow.progress(), 50);
        assert_eq!(workflow.due_date, NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(workflow.institution_id, "inst-3");
    }
}
