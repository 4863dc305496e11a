// Workflow & step entities and the status/progress rules engine

pub mod classification;
pub mod progress;
pub mod records;
pub mod state_machine;
pub mod types;

pub use classification::{classify, visual_tier, TrafficLight, VisualTier, DEFAULT_STALLED_THRESHOLD};
pub use progress::{compute_progress, StepCountMismatch, StepTemplates};
pub use records::{StepRecord, WorkflowRecord};
pub use state_machine::{TransitionRecord, TransitionResult, WorkflowEvent};
pub use types::{StepStatus, Workflow, WorkflowStatus, WorkflowStep};
