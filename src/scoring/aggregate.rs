// Roll-up of workflow progress into component and institution scores

use serde::Serialize;
use std::fmt;

use crate::catalog::ControlComponent;
use crate::workflows::{classify, TrafficLight, Workflow, WorkflowStatus};

/// What a score summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScope {
    Component(ControlComponent),
    Overall,
}

impl fmt::Display for ScoreScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreScope::Component(component) => write!(f, "{component}"),
            ScoreScope::Overall => f.write_str("overall"),
        }
    }
}

/// Derived, read-only aggregate. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceScore {
    pub scope: ScoreScope,
    /// 0..=100
    pub score: u8,
    pub classification: TrafficLight,
    pub contributing_workflows: usize,
}

/// Score for one component: the equally weighted mean of the progress of the
/// workflows belonging to `component`. Workflows of other components are
/// ignored, so a whole institution's list can be passed in.
pub fn aggregate_component_score(component: ControlComponent, workflows: &[Workflow]) -> ComplianceScore {
    let contributing: Vec<&Workflow> = workflows
        .iter()
        .filter(|workflow| workflow.component == component)
        .collect();

    let score = rounded_mean(contributing.iter().map(|workflow| workflow.progress()));
    let status = synthesize_status(contributing.iter().map(|workflow| workflow.status()));

    ComplianceScore {
        scope: ScoreScope::Component(component),
        score,
        classification: classify_aggregate(status, score),
        contributing_workflows: contributing.len(),
    }
}

/// Unweighted mean across component scores, classified the same way.
pub fn aggregate_overall_score(component_scores: &[ComplianceScore]) -> ComplianceScore {
    let score = rounded_mean(component_scores.iter().map(|s| s.score));
    let status = synthesize_status(component_scores.iter().map(|s| match s.classification {
        TrafficLight::Completed => WorkflowStatus::Completed,
        TrafficLight::AtRisk => WorkflowStatus::Observed,
        TrafficLight::NotStarted => WorkflowStatus::NotStarted,
        TrafficLight::InProgress => WorkflowStatus::InProgress,
    }));

    ComplianceScore {
        scope: ScoreScope::Overall,
        score,
        classification: classify_aggregate(status, score),
        contributing_workflows: component_scores.iter().map(|s| s.contributing_workflows).sum(),
    }
}

/// Aggregate status of a group: any observed member forces `observed`;
/// `completed` only when every member is; `not_started` only when every
/// member is; `in_progress` otherwise. An empty group is `not_started`.
fn synthesize_status(statuses: impl Iterator<Item = WorkflowStatus>) -> WorkflowStatus {
    let mut count = 0usize;
    let mut completed = 0usize;
    let mut not_started = 0usize;

    for status in statuses {
        count += 1;
        match status {
            WorkflowStatus::Observed => return WorkflowStatus::Observed,
            WorkflowStatus::Completed => completed += 1,
            WorkflowStatus::NotStarted => not_started += 1,
            WorkflowStatus::InProgress | WorkflowStatus::UnderReview => {}
        }
    }

    if not_started == count {
        WorkflowStatus::NotStarted
    } else if completed == count {
        WorkflowStatus::Completed
    } else {
        WorkflowStatus::InProgress
    }
}

fn classify_aggregate(status: WorkflowStatus, score: u8) -> TrafficLight {
    if status == WorkflowStatus::NotStarted {
        return TrafficLight::NotStarted;
    }
    classify(status, score)
}

/// Mean rounded half up; 0 for an empty sequence.
fn rounded_mean(values: impl Iterator<Item = u8>) -> u8 {
    let (sum, count) = values.fold((0u64, 0u64), |(sum, count), value| (sum + u64::from(value), count + 1));
    if count == 0 {
        return 0;
    }
    ((2 * sum + count) / (2 * count)).min(100) as u8
}
