use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ComplianceError;

/// The five structural components of an internal-control framework.
///
/// The structure is shared by COSO and INTOSAI; only the vocabulary differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlComponent {
    ControlEnvironment,
    RiskAssessment,
    ControlActivities,
    InformationCommunication,
    Monitoring,
}

impl ControlComponent {
    /// Canonical catalog order.
    pub const ALL: [ControlComponent; 5] = [
        ControlComponent::ControlEnvironment,
        ControlComponent::RiskAssessment,
        ControlComponent::ControlActivities,
        ControlComponent::InformationCommunication,
        ControlComponent::Monitoring,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ControlComponent::ControlEnvironment => "control_environment",
            ControlComponent::RiskAssessment => "risk_assessment",
            ControlComponent::ControlActivities => "control_activities",
            ControlComponent::InformationCommunication => "information_communication",
            ControlComponent::Monitoring => "monitoring",
        }
    }

    /// Display metadata for this component under one standard's vocabulary.
    pub fn display(self, standard: Standard) -> ComponentDisplay {
        let (name, description) = match (standard, self) {
            (Standard::Coso, ControlComponent::ControlEnvironment) => (
                "Control Environment",
                "Standards, processes and structures that set the tone for internal control across the organization.",
            ),
            (Standard::Coso, ControlComponent::RiskAssessment) => (
                "Risk Assessment",
                "Dynamic process for identifying and assessing risks to the achievement of objectives.",
            ),
            (Standard::Coso, ControlComponent::ControlActivities) => (
                "Control Activities",
                "Actions established through policies and procedures that mitigate risks to objectives.",
            ),
            (Standard::Coso, ControlComponent::InformationCommunication) => (
                "Information & Communication",
                "Relevant, quality information obtained and communicated to support internal control.",
            ),
            (Standard::Coso, ControlComponent::Monitoring) => (
                "Monitoring Activities",
                "Ongoing and separate evaluations that confirm each component is present and functioning.",
            ),
            (Standard::Intosai, ControlComponent::ControlEnvironment) => (
                "Control Environment",
                "The attitude of management and staff towards internal control and the public-sector ethics it rests on.",
            ),
            (Standard::Intosai, ControlComponent::RiskAssessment) => (
                "Risk Assessment",
                "Identification and analysis of risks relevant to the entity's mission, and the responses to them.",
            ),
            (Standard::Intosai, ControlComponent::ControlActivities) => (
                "Control Activities",
                "Policies and procedures, such as authorizations, reconciliations and reviews, that address risk.",
            ),
            (Standard::Intosai, ControlComponent::InformationCommunication) => (
                "Information and Communication",
                "Recording and communicating information so that staff can carry out their responsibilities.",
            ),
            (Standard::Intosai, ControlComponent::Monitoring) => (
                "Monitoring",
                "Assessment of the quality of internal control performance over time, including audits.",
            ),
        };

        ComponentDisplay {
            component: self,
            standard,
            name,
            description,
        }
    }
}

impl fmt::Display for ControlComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlComponent {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlComponent::ALL
            .into_iter()
            .find(|component| component.as_str() == s)
            .ok_or_else(|| ComplianceError::UnknownComponent(s.to_string()))
    }
}

/// An external standard whose vocabulary labels the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Standard {
    Coso,
    Intosai,
}

impl Standard {
    pub fn as_str(self) -> &'static str {
        match self {
            Standard::Coso => "coso",
            Standard::Intosai => "intosai",
        }
    }

    /// Short label used in headings, e.g. "COSO".
    pub fn label(self) -> &'static str {
        match self {
            Standard::Coso => "COSO",
            Standard::Intosai => "INTOSAI",
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Catalog entry rendered for one standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentDisplay {
    pub component: ControlComponent,
    pub standard: Standard,
    pub name: &'static str,
    pub description: &'static str,
}

/// Look up display metadata for a component identifier.
///
/// Fails with `UnknownComponent` when the identifier is not one of the five
/// canonical components.
pub fn resolve_component_display(
    component_type: &str,
    standard: Standard,
) -> Result<ComponentDisplay, ComplianceError> {
    let component = component_type.parse::<ControlComponent>()?;
    Ok(component.display(standard))
}
