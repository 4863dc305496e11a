// Traffic-light classification of (status, progress)

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::types::{Workflow, WorkflowStatus};

/// Progress at or above which an `in_progress` workflow is drawn as stalled.
pub const DEFAULT_STALLED_THRESHOLD: u8 = 75;

/// Classification used for aggregation and dashboard colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLight {
    Completed,
    InProgress,
    AtRisk,
    NotStarted,
}

impl TrafficLight {
    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLight::Completed => "completed",
            TrafficLight::InProgress => "in_progress",
            TrafficLight::AtRisk => "at_risk",
            TrafficLight::NotStarted => "not_started",
        }
    }
}

impl fmt::Display for TrafficLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual sub-state. `Stalled` is an `in_progress` workflow close to done
/// that has not been submitted for review; it still aggregates as in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualTier {
    Completed,
    InProgress,
    Stalled,
    AtRisk,
    NotStarted,
}

impl VisualTier {
    pub fn traffic_light(self) -> TrafficLight {
        match self {
            VisualTier::Completed => TrafficLight::Completed,
            VisualTier::InProgress | VisualTier::Stalled => TrafficLight::InProgress,
            VisualTier::AtRisk => TrafficLight::AtRisk,
            VisualTier::NotStarted => TrafficLight::NotStarted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VisualTier::Completed => "completed",
            VisualTier::InProgress => "in_progress",
            VisualTier::Stalled => "stalled",
            VisualTier::AtRisk => "at_risk",
            VisualTier::NotStarted => "not_started",
        }
    }
}

impl fmt::Display for VisualTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Traffic light for a status/progress pair; `observed` is always at risk.
pub fn classify(status: WorkflowStatus, progress: u8) -> TrafficLight {
    match status {
        WorkflowStatus::Completed => TrafficLight::Completed,
        WorkflowStatus::Observed => TrafficLight::AtRisk,
        WorkflowStatus::NotStarted if progress == 0 => TrafficLight::NotStarted,
        _ => TrafficLight::InProgress,
    }
}

/// Dashboard tier: the traffic light, with near-complete `in_progress` work drawn as stalled.
pub fn visual_tier(status: WorkflowStatus, progress: u8, stalled_threshold: u8) -> VisualTier {
    match classify(status, progress) {
        TrafficLight::Completed => VisualTier::Completed,
        TrafficLight::AtRisk => VisualTier::AtRisk,
        TrafficLight::NotStarted => VisualTier::NotStarted,
        TrafficLight::InProgress => {
            if status == WorkflowStatus::InProgress && progress >= stalled_threshold {
                VisualTier::Stalled
            } else {
                VisualTier::InProgress
            }
        }
    }
}

impl Workflow {
    pub fn classification(&self) -> TrafficLight {
        classify(self.status(), self.progress())
    }

    pub fn visual_tier(&self, stalled_threshold: u8) -> VisualTier {
        visual_tier(self.status(), self.progress(), stalled_threshold)
    }
}
