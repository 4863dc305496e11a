// Compliance aggregation for dashboards and executive views

pub mod aggregate;
pub mod dashboard;

pub use aggregate::{aggregate_component_score, aggregate_overall_score, ComplianceScore, ScoreScope};
pub use dashboard::{
    attention_items, score_institution, AttentionItem, AttentionReason, ComponentScoreView,
    InstitutionScorecard,
};
