//! Project history snapshots.

use crate::project_models::Project;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Maximum number of characters of the requirements scope kept as preview.
pub const PREVIEW_CHARS: usize = 150;

const NO_PREVIEW: &str = "No preview available";

/// A saved snapshot of a project, as listed in the history sidebar.
///
/// Snapshots are keyed by project id: saving a newer snapshot of the same
/// project replaces the older one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[ts(type = "string")]
    pub id: Uuid,
    pub prompt: String,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub project: Project,
    pub preview: String,
}

impl HistoryItem {
    /// Snapshot the current state of a project.
    pub fn snapshot(project: &Project) -> Self {
        let preview = project
            .requirements
            .as_ref()
            .map(|r| r.scope.chars().take(PREVIEW_CHARS).collect::<String>())
            .filter(|scope| !scope.is_empty())
            .unwrap_or_else(|| NO_PREVIEW.to_string());

        Self {
            id: project.id,
            prompt: project.prompt.clone(),
            name: project.name.clone(),
            timestamp: Utc::now(),
            project: project.clone(),
            preview,
        }
    }
}
