// Step completion → progress percentage, and the per-component step templates

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::ControlComponent;
use crate::errors::ComplianceError;
use crate::workflows::types::{Workflow, WorkflowStep};

/// Percentage of completed steps, rounded half up, in `0..=100`.
///
/// A workflow without steps has nothing done, so progress is 0.
pub fn compute_progress(steps: &[WorkflowStep]) -> u8 {
    let total = steps.len() as u64;
    if total == 0 {
        return 0;
    }
    let completed = steps.iter().filter(|step| step.is_completed()).count() as u64;

    // round(100 * completed / total) in integer arithmetic
    let percent = (200 * completed + total) / (2 * total);
    percent.min(100) as u8
}

/// Step template table keyed by component type.
///
/// Components missing from the table fall back to the built-in template, so a
/// configuration file only needs to list the components it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct StepTemplates {
    templates: BTreeMap<ControlComponent, Vec<String>>,
}

impl TryFrom<BTreeMap<String, Vec<String>>> for StepTemplates {
    type Error = ComplianceError;

    fn try_from(table: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        let templates = table
            .into_iter()
            .map(|(key, names)| Ok((key.parse::<ControlComponent>()?, names)))
            .collect::<Result<_, ComplianceError>>()?;
        Ok(Self { templates })
    }
}

impl From<StepTemplates> for BTreeMap<String, Vec<String>> {
    fn from(templates: StepTemplates) -> Self {
        templates
            .templates
            .into_iter()
            .map(|(component, names)| (component.as_str().to_string(), names))
            .collect()
    }
}

impl Default for StepTemplates {
    fn default() -> Self {
        let templates = ControlComponent::ALL
            .into_iter()
            .map(|component| {
                let names = default_step_names(component)
                    .iter()
                    .map(|name| name.to_string())
                    .collect();
                (component, names)
            })
            .collect();
        Self { templates }
    }
}

impl StepTemplates {
    /// An empty table; every component uses the built-in template.
    pub fn builtin() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    pub fn with_template(mut self, component: ControlComponent, names: Vec<String>) -> Self {
        self.templates.insert(component, names);
        self
    }

    /// Step names for a component, in order.
    pub fn step_names(&self, component: ControlComponent) -> Vec<String> {
        match self.templates.get(&component) {
            Some(names) => names.clone(),
            None => default_step_names(component)
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// Number of steps a workflow of this component is expected to carry.
    pub fn expected_count(&self, component: ControlComponent) -> usize {
        self.templates
            .get(&component)
            .map(Vec::len)
            .unwrap_or_else(|| default_step_names(component).len())
    }

    /// Fresh `not_started` steps for a new workflow.
    pub fn instantiate(&self, component: ControlComponent, workflow_id: &str) -> Vec<WorkflowStep> {
        self.step_names(component)
            .into_iter()
            .enumerate()
            .map(|(index, name)| WorkflowStep::new(workflow_id, index as u32 + 1, name))
            .collect()
    }
}

/// A workflow whose step count differs from its component template.
///
/// Progress is always computed from the actual steps; this is only reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepCountMismatch {
    pub workflow_id: String,
    pub component: ControlComponent,
    pub expected: usize,
    pub actual: usize,
}

impl Workflow {
    pub fn template_mismatch(&self, templates: &StepTemplates) -> Option<StepCountMismatch> {
        let expected = templates.expected_count(self.component);
        let actual = self.steps.len();
        (expected != actual).then(|| StepCountMismatch {
            workflow_id: self.id.clone(),
            component: self.component,
            expected,
            actual,
        })
    }
}

fn default_step_names(component: ControlComponent) -> &'static [&'static str] {
    match component {
        ControlComponent::ControlEnvironment => &[
            "Adopt code of ethics and integrity",
            "Establish oversight body",
            "Define structure, authority and responsibility",
            "Commit to staff competence",
            "Enforce accountability",
        ],
        ControlComponent::RiskAssessment => &[
            "Define institutional objectives",
            "Identify risks",
            "Analyze likelihood and impact",
            "Assess fraud risk",
            "Identify significant changes",
            "Define risk responses",
            "Document risk matrix",
            "Approve risk register",
        ],
        ControlComponent::ControlActivities => &[
            "Select control activities",
            "Establish general IT controls",
            "Document policies and procedures",
            "Segregate incompatible duties",
            "Test control design",
        ],
        ControlComponent::InformationCommunication => &[
            "Identify information requirements",
            "Establish internal communication channels",
            "Establish external communication channels",
            "Define reporting lines",
            "Review information quality",
        ],
        ControlComponent::Monitoring => &[
            "Plan ongoing evaluations",
            "Perform separate evaluations",
            "Evaluate deficiencies",
            "Communicate deficiencies",
            "Track remediation",
        ],
    }
}
