// Institution scorecard and the "needs attention" list for executive views

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::{ComponentDisplay, ControlComponent};
use crate::framework::FrameworkResolver;
use crate::scoring::aggregate::{aggregate_component_score, aggregate_overall_score, ComplianceScore};
use crate::workflows::{VisualTier, Workflow, WorkflowStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentScoreView {
    pub component: ControlComponent,
    pub display_name: String,
    pub labels: Vec<ComponentDisplay>,
    pub score: ComplianceScore,
}

/// Per-component and overall scores for one institution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionScorecard {
    pub institution_id: String,
    pub heading: String,
    pub components: Vec<ComponentScoreView>,
    pub overall: ComplianceScore,
}

/// Score one institution under the resolver's active component set.
///
/// Workflows owned by other institutions are skipped. Active components with
/// no workflows still count toward the overall mean with a score of 0.
pub fn score_institution(
    institution_id: &str,
    workflows: &[Workflow],
    resolver: &FrameworkResolver,
) -> InstitutionScorecard {
    let owned: Vec<Workflow> = workflows
        .iter()
        .filter(|workflow| workflow.institution_id == institution_id)
        .cloned()
        .collect();

    let components: Vec<ComponentScoreView> = resolver
        .active_components()
        .iter()
        .map(|component| ComponentScoreView {
            component: *component,
            display_name: resolver.display_name(*component),
            labels: resolver.labels(*component),
            score: aggregate_component_score(*component, &owned),
        })
        .collect();

    let scores: Vec<ComplianceScore> = components.iter().map(|view| view.score.clone()).collect();

    InstitutionScorecard {
        institution_id: institution_id.to_string(),
        heading: resolver.score_heading(),
        overall: aggregate_overall_score(&scores),
        components,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AttentionReason {
    /// Flagged by an auditor.
    AtRisk { note: Option<String> },
    /// In progress near completion but not submitted for review.
    StalledNearCompletion { progress: u8 },
    Overdue { due_date: NaiveDate },
    StepOverdue { sequence: u32, due_date: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttentionItem {
    pub workflow_id: String,
    pub name: String,
    pub component: ControlComponent,
    pub status: WorkflowStatus,
    pub progress: u8,
    pub reasons: Vec<AttentionReason>,
}

/// Workflows that need attention, in input order.
pub fn attention_items(workflows: &[Workflow], today: NaiveDate, stalled_threshold: u8) -> Vec<AttentionItem> {
    workflows
        .iter()
        .filter_map(|workflow| {
            let status = workflow.status();
            let progress = workflow.progress();
            let mut reasons = Vec::new();

            match workflow.visual_tier(stalled_threshold) {
                VisualTier::AtRisk => reasons.push(AttentionReason::AtRisk {
                    note: workflow.observation_note().map(str::to_string),
                }),
                VisualTier::Stalled => reasons.push(AttentionReason::StalledNearCompletion { progress }),
                _ => {}
            }

            if workflow.is_overdue(today) {
                if let Some(due_date) = workflow.due_date {
                    reasons.push(AttentionReason::Overdue { due_date });
                }
            }

            if status != WorkflowStatus::Completed {
                for step in workflow.steps().iter().filter(|step| step.is_overdue(today)) {
                    if let Some(due_date) = step.due_date {
                        reasons.push(AttentionReason::StepOverdue {
                            sequence: step.sequence,
                            due_date,
                        });
                    }
                }
            }

            (!reasons.is_empty()).then(|| AttentionItem {
                workflow_id: workflow.id.clone(),
                name: workflow.name.clone(),
                component: workflow.component,
                status,
                progress,
                reasons,
            })
        })
        .collect()
}
