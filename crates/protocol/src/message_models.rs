//! Chat transcript models.
//!
//! Every stage narrates its progress as agent messages. The UI renders them
//! as a chat feed; the persistence collaborator stores them per project.

use crate::project_models::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Who authored a transcript message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
pub enum AgentRole {
    User,
    Orchestrator,
    Requirement,
    Design,
    Development,
    Testing,
}

impl AgentRole {
    /// The agent that speaks for a stage.
    ///
    /// Naming is narrated by the orchestrator and modifications by the
    /// development agent.
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Naming => AgentRole::Orchestrator,
            Stage::Requirement => AgentRole::Requirement,
            Stage::Design => AgentRole::Design,
            Stage::Development | Stage::Modification => AgentRole::Development,
            Stage::Testing => AgentRole::Testing,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Thinking,
    Done,
    Error,
}

/// A single transcript entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct AgentMessage {
    #[ts(type = "string")]
    pub id: Uuid,
    pub role: AgentRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: MessageStatus,
}

impl AgentMessage {
    pub fn new(role: AgentRole, content: impl Into<String>, status: MessageStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            status,
        }
    }
}
