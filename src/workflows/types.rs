// Core types for workflows and their ordered steps

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::ControlComponent;
use crate::errors::ComplianceError;
use crate::workflows::progress::{compute_progress, StepTemplates};
use crate::workflows::state_machine::TransitionRecord;

/// Workflow status values.
///
/// `not_started → in_progress → under_review → completed`, with the lateral
/// exception branch `in_progress ⇄ observed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    NotStarted,
    InProgress,
    UnderReview,
    Observed,
    Completed,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 5] = [
        WorkflowStatus::NotStarted,
        WorkflowStatus::InProgress,
        WorkflowStatus::UnderReview,
        WorkflowStatus::Observed,
        WorkflowStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::NotStarted => "not_started",
            WorkflowStatus::InProgress => "in_progress",
            WorkflowStatus::UnderReview => "under_review",
            WorkflowStatus::Observed => "observed",
            WorkflowStatus::Completed => "completed",
        }
    }

    /// Terminal for normal flow.
    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::Completed
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowStatus {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ComplianceError::UnknownStatus(s.to_string()))
    }
}

/// Status of a single step. Steps do not constrain each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(StepStatus::NotStarted),
            "in_progress" => Ok(StepStatus::InProgress),
            "completed" => Ok(StepStatus::Completed),
            other => Err(ComplianceError::UnknownStepStatus(other.to_string())),
        }
    }
}

/// An ordered sub-task of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub workflow_id: String,
    /// 1-based position, contiguous within the owning workflow
    pub sequence: u32,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub due_date: Option<NaiveDate>,
}

impl WorkflowStep {
    pub fn new(workflow_id: &str, sequence: u32, name: impl Into<String>) -> Self {
        Self {
            id: format!("{workflow_id}-step-{sequence}"),
            workflow_id: workflow_id.to_string(),
            sequence,
            name: name.into(),
            description: String::new(),
            status: StepStatus::NotStarted,
            due_date: None,
        }
    }

    pub fn with_status(mut self, status: StepStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == StepStatus::Completed
    }

    /// Past due and still open.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_completed() && self.due_date.is_some_and(|due| due < today)
    }
}

/// Explicit status that cannot be derived from step completion alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusFlag {
    UnderReview,
    Observed { note: String },
    Approved,
}

/// One compliance initiative for one control component within one institution.
///
/// Status and progress are not stored: both are derived from the steps plus
/// the explicit review/observation flag, so they can never be read out of sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub component: ControlComponent,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub institution_id: String,
    pub(crate) steps: Vec<WorkflowStep>,
    pub(crate) flag: Option<StatusFlag>,
    pub(crate) history: Vec<TransitionRecord>,
}

impl Workflow {
    /// Create an empty workflow in `not_started` with progress 0.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        component: ControlComponent,
        institution_id: impl Into<String>,
    ) -> Result<Self, ComplianceError> {
        let id = id.into();
        let institution_id = institution_id.into();

        if id.trim().is_empty() {
            return Err(ComplianceError::MissingField { field: "id" });
        }
        if institution_id.trim().is_empty() {
            return Err(ComplianceError::MissingField { field: "institution_id" });
        }

        Ok(Self {
            id,
            name: name.into(),
            description: String::new(),
            component,
            due_date: None,
            created_at: Utc::now(),
            institution_id,
            steps: Vec::new(),
            flag: None,
            history: Vec::new(),
        })
    }

    /// Create a workflow with the configured step template for its component.
    pub fn from_template(
        id: impl Into<String>,
        name: impl Into<String>,
        component: ControlComponent,
        institution_id: impl Into<String>,
        templates: &StepTemplates,
    ) -> Result<Self, ComplianceError> {
        let mut workflow = Self::new(id, name, component, institution_id)?;
        workflow.steps = templates.instantiate(component, &workflow.id);
        Ok(workflow)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Attach steps to a workflow that has none yet.
    ///
    /// Steps are ordered by position and must number 1..=n without gaps or
    /// duplicates. If every attached step is already completed the workflow
    /// settles into `under_review`, as it would through step updates.
    /// Fails once steps are attached or a review state is set; later changes
    /// go through `handle_event`.
    pub fn with_steps(mut self, steps: Vec<WorkflowStep>) -> Result<Self, ComplianceError> {
        if !self.steps.is_empty() || self.flag.is_some() {
            return Err(ComplianceError::StepsAlreadyAttached {
                workflow_id: self.id.clone(),
            });
        }
        let steps = ordered_steps(steps)?;
        self.steps = steps
            .into_iter()
            .map(|mut step| {
                step.workflow_id = self.id.clone();
                step
            })
            .collect();
        if self.flag.is_none() && all_completed(&self.steps) {
            self.flag = Some(StatusFlag::UnderReview);
        }
        Ok(self)
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, sequence: u32) -> Option<&WorkflowStep> {
        self.steps.iter().find(|step| step.sequence == sequence)
    }

    /// Status transitions applied so far, oldest first.
    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn status(&self) -> WorkflowStatus {
        derive_status(&self.steps, self.flag.as_ref())
    }

    pub fn progress(&self) -> u8 {
        compute_progress(&self.steps)
    }

    /// Auditor note attached while the workflow is observed.
    pub fn observation_note(&self) -> Option<&str> {
        match &self.flag {
            Some(StatusFlag::Observed { note }) => Some(note.as_str()),
            _ => None,
        }
    }

    pub fn completed_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.is_completed()).count()
    }

    /// Past its due date without being completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status() != WorkflowStatus::Completed
            && self.due_date.is_some_and(|due| due < today)
    }
}

/// Status as a function of the steps and the explicit flag.
pub(crate) fn derive_status(steps: &[WorkflowStep], flag: Option<&StatusFlag>) -> WorkflowStatus {
    match flag {
        Some(StatusFlag::Approved) => WorkflowStatus::Completed,
        Some(StatusFlag::UnderReview) => WorkflowStatus::UnderReview,
        Some(StatusFlag::Observed { .. }) => WorkflowStatus::Observed,
        None => {
            let touched = steps.iter().any(|step| step.status != StepStatus::NotStarted);
            if touched {
                WorkflowStatus::InProgress
            } else {
                WorkflowStatus::NotStarted
            }
        }
    }
}

pub(crate) fn all_completed(steps: &[WorkflowStep]) -> bool {
    !steps.is_empty() && steps.iter().all(WorkflowStep::is_completed)
}

/// Sort steps by position and check the positions run 1..=n.
pub(crate) fn ordered_steps(mut steps: Vec<WorkflowStep>) -> Result<Vec<WorkflowStep>, ComplianceError> {
    steps.sort_by_key(|step| step.sequence);
    for (index, step) in steps.iter().enumerate() {
        let expected = index as u32 + 1;
        if step.sequence != expected {
            return Err(ComplianceError::InconsistentStepSequence {
                expected,
                found: step.sequence,
            });
        }
    }
    Ok(steps)
}
