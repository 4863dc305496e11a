// Compliance Tracker Library - internal-control workflow state and scoring
// This exposes the core components for the CLI, tests and integration

pub mod catalog;
pub mod config;
pub mod errors;
pub mod framework;
pub mod scoring;
pub mod snapshot;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use catalog::{resolve_component_display, ComponentDisplay, ControlComponent, Standard};
pub use config::TrackerConfig;
pub use errors::ComplianceError;
pub use framework::{FrameworkMode, FrameworkResolver, PreferenceStore};
pub use scoring::{
    aggregate_component_score, aggregate_overall_score, attention_items, score_institution,
    AttentionItem, AttentionReason, ComplianceScore, InstitutionScorecard, ScoreScope,
};
pub use snapshot::{LoadReport, WorkflowSnapshot};
pub use telemetry::{create_command_span, generate_correlation_id, init_telemetry};
pub use workflows::{
    classify, compute_progress, visual_tier, StepStatus, StepTemplates, TrafficLight, TransitionResult,
    VisualTier, Workflow, WorkflowEvent, WorkflowRecord, WorkflowStatus, WorkflowStep,
};
