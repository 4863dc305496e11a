use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[cfg(test)]
use mockall::automock;

use crate::catalog::{ComponentDisplay, ControlComponent, Standard};
use crate::errors::ComplianceError;

/// Which standard's vocabulary labels the component structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkMode {
    #[default]
    Coso,
    Intosai,
    Dual,
}

impl FrameworkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameworkMode::Coso => "coso",
            FrameworkMode::Intosai => "intosai",
            FrameworkMode::Dual => "dual",
        }
    }

    /// Standards whose labels are exposed, primary first.
    pub fn standards(self) -> &'static [Standard] {
        match self {
            FrameworkMode::Coso => &[Standard::Coso],
            FrameworkMode::Intosai => &[Standard::Intosai],
            FrameworkMode::Dual => &[Standard::Coso, Standard::Intosai],
        }
    }
}

impl fmt::Display for FrameworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameworkMode {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coso" => Ok(FrameworkMode::Coso),
            "intosai" => Ok(FrameworkMode::Intosai),
            "dual" => Ok(FrameworkMode::Dual),
            _ => Err(ComplianceError::UnknownFrameworkMode(s.to_string())),
        }
    }
}

/// Source of the user's persisted framework preference.
///
/// Storage itself belongs to the caller; the resolver only reads the value.
#[cfg_attr(test, automock)]
pub trait PreferenceStore {
    /// Stored mode string, if the user has chosen one.
    fn framework_mode(&self) -> Option<String>;
}

/// Presentation-layer selector for labels and surfaced components.
///
/// Never touches workflow data; switching modes only changes how scores are
/// labeled and which components are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkResolver {
    mode: FrameworkMode,
    active: Vec<ControlComponent>,
}

impl FrameworkResolver {
    pub fn new(mode: FrameworkMode) -> Self {
        Self {
            mode,
            active: ControlComponent::ALL.to_vec(),
        }
    }

    /// Resolve from the preference store, falling back when nothing is stored.
    ///
    /// A stored value that is not a known mode is an error, never a silent
    /// default.
    pub fn from_store(
        store: &dyn PreferenceStore,
        fallback: FrameworkMode,
    ) -> Result<Self, ComplianceError> {
        let mode = match store.framework_mode() {
            Some(stored) => stored.parse()?,
            None => fallback,
        };
        Ok(Self::new(mode))
    }

    /// Restrict the surfaced components. Catalog order is kept; an empty list
    /// leaves all five active.
    pub fn with_components(mut self, components: &[ControlComponent]) -> Self {
        if !components.is_empty() {
            self.active = ControlComponent::ALL
                .into_iter()
                .filter(|component| components.contains(component))
                .collect();
        }
        self
    }

    pub fn mode(&self) -> FrameworkMode {
        self.mode
    }

    pub fn active_components(&self) -> &[ControlComponent] {
        &self.active
    }

    pub fn is_active(&self, component: ControlComponent) -> bool {
        self.active.contains(&component)
    }

    /// Labels for a component, one per exposed standard.
    pub fn labels(&self, component: ControlComponent) -> Vec<ComponentDisplay> {
        self.mode
            .standards()
            .iter()
            .map(|standard| component.display(*standard))
            .collect()
    }

    /// Single display name; dual mode joins both vocabularies when they differ.
    pub fn display_name(&self, component: ControlComponent) -> String {
        let mut names: Vec<&str> = Vec::new();
        for display in self.labels(component) {
            if !names.contains(&display.name) {
                names.push(display.name);
            }
        }
        names.join(" / ")
    }

    /// Heading for institution-wide scores.
    pub fn score_heading(&self) -> String {
        let standards: Vec<&str> = self.mode.standards().iter().map(|s| s.label()).collect();
        format!("{} Compliance", standards.join(" / "))
    }
}

impl Default for FrameworkResolver {
    fn default() -> Self {
        Self::new(FrameworkMode::default())
    }
}
