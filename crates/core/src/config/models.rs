//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings and the agent profile of every stage into a single
//! configuration object.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::loader::parse_profile;
use crate::init::templates::get_template;
use sf_protocol::agent_models::AgentProfile;
use sf_protocol::config_models::GlobalConfig;
use sf_protocol::project_models::Stage;
use std::path::{Path, PathBuf};

/// Name of the configuration directory under a project root.
pub const FACTORY_DIR: &str = ".sdlc-factory";

const HISTORY_FILE: &str = "history.json";

/// One agent profile per stage. Always complete.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentProfiles {
    naming: AgentProfile,
    requirement: AgentProfile,
    design: AgentProfile,
    development: AgentProfile,
    testing: AgentProfile,
    modification: AgentProfile,
}

impl AgentProfiles {
    /// The profiles compiled into the binary.
    pub fn builtin() -> ConfigResult<Self> {
        let load = |stage: Stage| -> ConfigResult<AgentProfile> {
            let name = format!("agents/{}.md", stage.as_str().to_lowercase());
            let origin = PathBuf::from(format!("<builtin>/{name}"));
            let content = get_template(&name).ok_or_else(|| ConfigError::InvalidConfig {
                path: origin.clone(),
                reason: "built-in template is missing".to_string(),
            })?;
            let profile = parse_profile(&content, &origin)?;
            if profile.stage != stage {
                return Err(ConfigError::InvalidConfig {
                    path: origin,
                    reason: format!("expected stage {stage}, found {}", profile.stage),
                });
            }
            Ok(profile)
        };

        Ok(Self {
            naming: load(Stage::Naming)?,
            requirement: load(Stage::Requirement)?,
            design: load(Stage::Design)?,
            development: load(Stage::Development)?,
            testing: load(Stage::Testing)?,
            modification: load(Stage::Modification)?,
        })
    }

    pub fn get(&self, stage: Stage) -> &AgentProfile {
        match stage {
            Stage::Naming => &self.naming,
            Stage::Requirement => &self.requirement,
            Stage::Design => &self.design,
            Stage::Development => &self.development,
            Stage::Testing => &self.testing,
            Stage::Modification => &self.modification,
        }
    }

    /// Replace the profile for `profile.stage`.
    pub fn set(&mut self, profile: AgentProfile) {
        let slot = match profile.stage {
            Stage::Naming => &mut self.naming,
            Stage::Requirement => &mut self.requirement,
            Stage::Design => &mut self.design,
            Stage::Development => &mut self.development,
            Stage::Testing => &mut self.testing,
            Stage::Modification => &mut self.modification,
        };
        *slot = profile;
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentProfile> {
        Stage::ALL.into_iter().map(move |stage| self.get(stage))
    }
}

/// Unified application configuration loaded from `.sdlc-factory/`.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Global settings
/// - `agents/*.md`: Stage agent profiles (built-ins fill the gaps)
/// - `LLM_*` environment variables: provider overrides
///
/// # Example
///
/// ```rust,no_run
/// use sf_core::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Using provider {}", config.global.provider);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    pub profiles: AgentProfiles,

    /// Project root the configuration was loaded from.
    pub root: PathBuf,
}

impl AppConfig {
    /// Default settings and built-in profiles, rooted at `root`.
    pub fn builtin(root: impl AsRef<Path>) -> ConfigResult<Self> {
        Ok(Self {
            global: GlobalConfig::default(),
            profiles: AgentProfiles::builtin()?,
            root: root.as_ref().to_path_buf(),
        })
    }

    pub fn factory_dir(&self) -> PathBuf {
        self.root.join(FACTORY_DIR)
    }

    /// Where project history snapshots are kept.
    pub fn history_path(&self) -> PathBuf {
        self.factory_dir().join(HISTORY_FILE)
    }
}
