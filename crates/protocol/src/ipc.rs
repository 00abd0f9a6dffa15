//! Inter-process communication protocol.
//!
//! This module defines the message types for asynchronous communication
//! between a front end (the UI, or the CLI driver) and the Core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the front end to Core
//! - `Event`: Status updates sent from Core to the front end
//!
//! Communication is channel-based so the front end stays responsive while a
//! stage is waiting on the model.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::message_models::AgentMessage;
use crate::project_models::{Stage, Theme};

/// Operations sent from the front end to the Core logic.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "startProject",
///   "payload": {
///     "prompt": "A todo app",
///     "theme": "ocean"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a new project from a user prompt.
    ///
    /// Rejected while another project is processing.
    StartProject {
        prompt: String,
        #[serde(default)]
        theme: Theme,
    },

    /// Apply a change request to a completed project's code.
    ModifyProject { project_id: Uuid, request: String },

    /// Request the current state of a project.
    GetProject { project_id: Uuid },

    /// Shut down the application gracefully.
    Shutdown,
}

/// Events sent from the Core logic to the front end.
///
/// Uses tagged enum serialization:
/// ```json
/// {
///   "type": "stageChunk",
///   "payload": {
///     "project_id": "uuid-here",
///     "stage": "Requirement",
///     "content": "{\"userStories\": ["
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A new project has been created.
    ProjectStarted { project_id: Uuid, prompt: String },

    /// The Naming stage produced the project's display name.
    ProjectRenamed { project_id: Uuid, name: String },

    /// A stage has started; `step_index` is the project's new step.
    StageStarted {
        project_id: Uuid,
        stage: Stage,
        step_index: usize,
    },

    /// A fragment of streamed model output, in arrival order.
    StageChunk {
        project_id: Uuid,
        stage: Stage,
        content: String,
    },

    /// A stage result was committed to the project.
    ///
    /// `degraded` is true when the decoder substituted a placeholder.
    StageCompleted {
        project_id: Uuid,
        stage: Stage,
        degraded: bool,
    },

    /// A transcript entry for the chat feed.
    AgentMessage {
        project_id: Uuid,
        message: AgentMessage,
    },

    /// The main sequence (or a modification) finished.
    ProjectCompleted { project_id: Uuid },

    /// A stage failed and the run stopped.
    ProjectError {
        project_id: Uuid,
        stage: Stage,
        error: String,
    },
}

impl Event {
    /// The project this event belongs to.
    pub fn project_id(&self) -> Uuid {
        match self {
            Event::ProjectStarted { project_id, .. }
            | Event::ProjectRenamed { project_id, .. }
            | Event::StageStarted { project_id, .. }
            | Event::StageChunk { project_id, .. }
            | Event::StageCompleted { project_id, .. }
            | Event::AgentMessage { project_id, .. }
            | Event::ProjectCompleted { project_id }
            | Event::ProjectError { project_id, .. } => *project_id,
        }
    }
}
