use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::ControlComponent;
use crate::errors::ComplianceError;
use crate::framework::{FrameworkMode, FrameworkResolver, PreferenceStore};
use crate::workflows::{StepTemplates, DEFAULT_STALLED_THRESHOLD};

const DEFAULT_CONFIG_NAME: &str = "compliance-tracker";
const ENV_PREFIX: &str = "COMPLIANCE_TRACKER";

/// Main configuration structure for the compliance tracker
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Framework vocabulary and surfaced components
    pub framework: FrameworkConfig,
    /// Traffic-light thresholds
    pub classification: ClassificationConfig,
    /// Step templates keyed by component type
    pub templates: StepTemplates,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Stored mode preference: coso, intosai or dual
    pub mode: String,
    /// Restrict surfaced components by identifier (empty = all five)
    pub components: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Progress at which an in-progress workflow is flagged as stalled
    pub stalled_threshold: u8,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            mode: FrameworkMode::default().as_str().to_string(),
            components: Vec::new(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            stalled_threshold: DEFAULT_STALLED_THRESHOLD,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl PreferenceStore for FrameworkConfig {
    fn framework_mode(&self) -> Option<String> {
        let mode = self.mode.trim();
        (!mode.is_empty()).then(|| mode.to_string())
    }
}

impl TrackerConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. `path` if given, otherwise compliance-tracker.toml when present
    /// 3. Environment variables (COMPLIANCE_TRACKER_ prefix, `__` between sections)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).required(true));
            }
            None => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to read configuration sources")?;
        let tracker_config: TrackerConfig = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(tracker_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    /// Resolver for the configured mode, or `mode_override` when given.
    pub fn resolver(&self, mode_override: Option<FrameworkMode>) -> Result<FrameworkResolver, ComplianceError> {
        let resolver = match mode_override {
            Some(mode) => FrameworkResolver::new(mode),
            None => FrameworkResolver::from_store(&self.framework, FrameworkMode::default())?,
        };
        let components = self
            .framework
            .components
            .iter()
            .map(|id| id.parse::<ControlComponent>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(resolver.with_components(&components))
    }
}
