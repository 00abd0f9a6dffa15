//! Stage agent profiles.
//!
//! Each stage's agent is described by a Markdown file with YAML front
//! matter. The front matter selects the stage and tunes the model call; the
//! Markdown body is the system instruction.

use crate::project_models::Stage;
use serde::{Deserialize, Serialize};

/// Temperature used by the Naming stage when its profile sets none.
pub const NAMING_TEMPERATURE: f32 = 0.7;

/// Temperature used by every other stage when its profile sets none.
pub const STAGE_TEMPERATURE: f32 = 0.1;

/// Represents a stage agent defined in `.sdlc-factory/agents/*.md`.
///
/// # Example
///
/// ```markdown
/// ---
/// stage: Requirement
/// description: Turns a prompt into user stories
/// temperature: 0.1
/// ---
///
/// You are a Senior Requirements Analyst...
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AgentProfile {
    pub stage: Stage,

    #[serde(default)]
    pub description: String,

    /// Model override for this stage only.
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// The Markdown body. `{{theme}}` and `{{theme_guidelines}}` are
    /// substituted before the call.
    #[serde(skip)]
    pub system_prompt: String,
}

impl AgentProfile {
    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(match self.stage {
            Stage::Naming => NAMING_TEMPERATURE,
            _ => STAGE_TEMPERATURE,
        })
    }
}
