// Workflow status transitions
//
// Every mutation is applied to a copy of the step list and status flag, the
// resulting status change is checked against the transition table, and only
// then committed. A rejected event leaves the workflow untouched.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ComplianceError;
use crate::workflows::types::{
    all_completed, derive_status, StatusFlag, StepStatus, Workflow, WorkflowStatus, WorkflowStep,
};

/// Events that mutate a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A user marks progress on one step.
    SetStepStatus { sequence: u32, status: StepStatus },
    /// Append a new `not_started` step after the last one.
    AppendStep {
        name: String,
        description: String,
        due_date: Option<NaiveDate>,
    },
    /// Sign-off of a workflow under review.
    Approve,
    /// Send a workflow under review back for rework, reopening the given steps.
    Reject { reopen: Vec<u32> },
    /// An auditor flags non-compliance.
    FlagObservation { note: String },
    /// Remediation of an observation has been acknowledged.
    AcknowledgeRemediation,
}

/// One status change in a workflow's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub event: WorkflowEvent,
    pub at: DateTime<Utc>,
}

/// Result of a successfully applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub previous_status: WorkflowStatus,
    pub status: WorkflowStatus,
    pub progress: u8,
}

impl TransitionResult {
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.status
    }
}

impl WorkflowStatus {
    /// Direct edges of the transition table.
    pub fn can_transition_to(self, next: WorkflowStatus) -> bool {
        use WorkflowStatus::*;
        matches!(
            (self, next),
            (NotStarted, InProgress)
                | (InProgress, UnderReview)
                | (UnderReview, Completed)
                | (UnderReview, InProgress)
                | (InProgress, Observed)
                | (Observed, InProgress)
        )
    }
}

/// Legal path of status hops from `from` to `to`, excluding `from`.
///
/// A single event may cross two edges, e.g. completing the only step of a
/// fresh workflow moves it through `in_progress` into `under_review`.
fn transition_path(from: WorkflowStatus, to: WorkflowStatus) -> Option<Vec<WorkflowStatus>> {
    if from == to {
        return Some(Vec::new());
    }
    if from.can_transition_to(to) {
        return Some(vec![to]);
    }
    WorkflowStatus::ALL
        .into_iter()
        .find(|mid| from.can_transition_to(*mid) && mid.can_transition_to(to))
        .map(|mid| vec![mid, to])
}

impl Workflow {
    /// Apply one event atomically.
    ///
    /// Progress is recomputed from the steps before the new status is
    /// derived, so callers always observe a consistent pair.
    pub fn handle_event(&mut self, event: WorkflowEvent) -> Result<TransitionResult, ComplianceError> {
        let previous_status = self.status();
        let invalid = || ComplianceError::InvalidTransition {
            from: previous_status,
            event: event.clone(),
        };

        let mut steps = self.steps.clone();
        let mut flag = self.flag.clone();
        let steps_locked = matches!(flag, Some(StatusFlag::UnderReview) | Some(StatusFlag::Approved));

        match &event {
            WorkflowEvent::SetStepStatus { sequence, status } => {
                if steps_locked {
                    return Err(invalid());
                }
                let step = find_step(&mut steps, *sequence)?;
                step.status = *status;
            }
            WorkflowEvent::AppendStep { name, description, due_date } => {
                if steps_locked {
                    return Err(invalid());
                }
                let mut step = WorkflowStep::new(&self.id, steps.len() as u32 + 1, name.clone())
                    .with_description(description.clone());
                step.due_date = *due_date;
                steps.push(step);
            }
            WorkflowEvent::Approve => {
                if flag != Some(StatusFlag::UnderReview) || !all_completed(&steps) {
                    return Err(invalid());
                }
                flag = Some(StatusFlag::Approved);
            }
            WorkflowEvent::Reject { reopen } => {
                if flag != Some(StatusFlag::UnderReview) || reopen.is_empty() {
                    return Err(invalid());
                }
                for sequence in reopen {
                    find_step(&mut steps, *sequence)?.status = StepStatus::InProgress;
                }
                flag = None;
            }
            WorkflowEvent::FlagObservation { note } => {
                if previous_status != WorkflowStatus::InProgress {
                    return Err(invalid());
                }
                flag = Some(StatusFlag::Observed { note: note.clone() });
            }
            WorkflowEvent::AcknowledgeRemediation => {
                if !matches!(flag, Some(StatusFlag::Observed { .. })) {
                    return Err(invalid());
                }
                flag = None;
            }
        }

        // All steps done: hold for sign-off
        if flag.is_none() && all_completed(&steps) {
            flag = Some(StatusFlag::UnderReview);
        }

        let status = derive_status(&steps, flag.as_ref());
        let path = transition_path(previous_status, status).ok_or_else(invalid)?;

        self.steps = steps;
        self.flag = flag;

        let now = Utc::now();
        let mut from = previous_status;
        for to in path {
            self.history.push(TransitionRecord {
                from,
                to,
                event: event.clone(),
                at: now,
            });
            from = to;
        }

        Ok(TransitionResult {
            previous_status,
            status,
            progress: self.progress(),
        })
    }
}

fn find_step(steps: &mut [WorkflowStep], sequence: u32) -> Result<&mut WorkflowStep, ComplianceError> {
    steps
        .iter_mut()
        .find(|step| step.sequence == sequence)
        .ok_or(ComplianceError::UnknownStep { sequence })
}
