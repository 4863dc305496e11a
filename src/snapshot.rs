// Loading persisted workflow records handed over by the storage collaborator

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::ComplianceError;
use crate::workflows::{StepCountMismatch, StepTemplates, Workflow, WorkflowRecord};

/// Point-in-time export of workflow records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    #[serde(default)]
    pub workflows: Vec<WorkflowRecord>,
}

impl WorkflowSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse workflow snapshot")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = Self::from_json(&content)
            .with_context(|| format!("Invalid snapshot {}", path.display()))?;
        debug!(path = %path.display(), records = snapshot.workflows.len(), "Snapshot loaded");
        Ok(snapshot)
    }

    pub fn from_workflows(workflows: &[Workflow]) -> Self {
        Self {
            workflows: workflows.iter().map(Workflow::to_record).collect(),
        }
    }

    /// Validate every record. Valid records become workflows; invalid ones are
    /// collected with their error rather than aborting the whole load.
    pub fn materialize(self, templates: &StepTemplates) -> LoadReport {
        let mut report = LoadReport::default();

        for record in self.workflows {
            let id = record.id.clone();
            match Workflow::try_from(record) {
                Ok(workflow) => {
                    if let Some(mismatch) = workflow.template_mismatch(templates) {
                        warn!(
                            workflow_id = %mismatch.workflow_id,
                            component = %mismatch.component,
                            expected = mismatch.expected,
                            actual = mismatch.actual,
                            "Workflow step count differs from its template"
                        );
                        report.mismatches.push(mismatch);
                    }
                    report.workflows.push(workflow);
                }
                Err(error) => {
                    warn!(workflow_id = %id, kind = error.kind(), error = %error, "Rejected workflow record");
                    report.rejected.push(RejectedRecord { workflow_id: id, error });
                }
            }
        }

        report
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub workflow_id: String,
    pub error: ComplianceError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub workflows: Vec<Workflow>,
    pub rejected: Vec<RejectedRecord>,
    pub mismatches: Vec<StepCountMismatch>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
