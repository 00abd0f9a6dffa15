//! Error types for pipeline execution.

use crate::gateway::GatewayError;
use sf_protocol::project_models::{ProjectStatus, Stage};
use thiserror::Error;
use uuid::Uuid;

/// Errors that stop a pipeline run or reject an operation.
///
/// Decode problems never appear here: the decoder always yields a value.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A stage's gateway call failed; the run stopped at `stage`.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: GatewayError,
    },

    /// Another project is still processing.
    #[error("A project is already being processed")]
    Busy,

    /// Only completed projects accept modification requests.
    #[error("Project {id} cannot be modified while {status:?}")]
    NotModifiable { id: Uuid, status: ProjectStatus },

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Prompt must not be empty")]
    EmptyPrompt,
}

impl EngineError {
    pub fn stage(stage: Stage, source: GatewayError) -> Self {
        Self::Stage { stage, source }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
