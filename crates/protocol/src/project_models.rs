//! Project and stage result models.
//!
//! A `Project` is one run of the software factory: a user prompt carried
//! through Requirements, Design, Development and Testing. Each stage produces
//! a `StageResult` that is stored on the project and becomes read-only context
//! for the stages after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Path of the single generated source file every code result must carry.
pub const MAIN_FILE: &str = "src/App.tsx";

/// Step index of a project whose Testing stage has finished.
pub const COMPLETE_STEP: usize = 5;

/// One agent call in the factory.
///
/// `Requirement`, `Design`, `Development` and `Testing` form the main
/// sequence. `Naming` runs before it and `Modification` runs after a project
/// has completed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TS)]
pub enum Stage {
    #[serde(alias = "naming")]
    Naming,
    #[serde(alias = "requirement", alias = "requirements")]
    Requirement,
    #[serde(alias = "design")]
    Design,
    #[serde(alias = "development")]
    Development,
    #[serde(alias = "testing")]
    Testing,
    #[serde(alias = "modification")]
    Modification,
}

impl Stage {
    /// The main four-stage sequence, in execution order.
    pub const SEQUENCE: [Stage; 4] = [
        Stage::Requirement,
        Stage::Design,
        Stage::Development,
        Stage::Testing,
    ];

    /// Every stage, including the auxiliary ones.
    pub const ALL: [Stage; 6] = [
        Stage::Naming,
        Stage::Requirement,
        Stage::Design,
        Stage::Development,
        Stage::Testing,
        Stage::Modification,
    ];

    /// The project step index shown while this stage runs.
    ///
    /// Modification reuses the Development slot.
    pub fn step_index(self) -> usize {
        match self {
            Stage::Naming => 0,
            Stage::Requirement => 1,
            Stage::Design => 2,
            Stage::Development | Stage::Modification => 3,
            Stage::Testing => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Naming => "Naming",
            Stage::Requirement => "Requirement",
            Stage::Design => "Design",
            Stage::Development => "Development",
            Stage::Testing => "Testing",
            Stage::Modification => "Modification",
        }
    }

    /// Parse a stage name, case-insensitively. Plural forms are accepted.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "naming" | "name" => Some(Stage::Naming),
            "requirement" | "requirements" => Some(Stage::Requirement),
            "design" => Some(Stage::Design),
            "development" | "develop" => Some(Stage::Development),
            "testing" | "tests" | "test" => Some(Stage::Testing),
            "modification" | "modify" => Some(Stage::Modification),
            _ => None,
        }
    }

    /// Whether the stage asks the model for a JSON object.
    ///
    /// Development and Modification request fenced source code instead.
    pub fn expects_json(self) -> bool {
        matches!(self, Stage::Requirement | Stage::Design | Stage::Testing)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visual theme the generated application is asked to follow.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Ocean,
    Sunset,
    Forest,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Ocean => "ocean",
            Theme::Sunset => "sunset",
            Theme::Forest => "forest",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ocean" => Ok(Theme::Ocean),
            "sunset" => Ok(Theme::Sunset),
            "forest" => Ok(Theme::Forest),
            other => Err(format!("unknown theme '{other}' (expected ocean, sunset or forest)")),
        }
    }
}

/// Output of the Requirements stage.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub user_stories: Vec<String>,
    pub scope: String,
    pub assumptions: Vec<String>,
}

/// Output of the Design stage. All three fields are Markdown.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Design {
    pub architecture: String,
    pub wireframes: String,
    pub api_contracts: String,
}

/// Output of the Development and Modification stages.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Code {
    /// Source files keyed by path. Always contains [`MAIN_FILE`].
    pub files: BTreeMap<String, String>,

    /// npm package name to version range.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Code {
    /// The entry file, or the first file when the entry file is missing.
    pub fn main_file(&self) -> Option<&str> {
        self.files
            .get(MAIN_FILE)
            .or_else(|| self.files.values().next())
            .map(String::as_str)
    }
}

/// Output of the Testing stage.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Tests {
    pub test_cases: Vec<String>,
    pub results: String,
    pub bug_reports: String,
}

/// A structured stage output, discriminated by stage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum StageResult {
    Requirements(Requirements),
    Design(Design),
    Code(Code),
    Tests(Tests),
}

impl StageResult {
    /// The main-sequence stage that produces this kind of result.
    pub fn stage(&self) -> Stage {
        match self {
            StageResult::Requirements(_) => Stage::Requirement,
            StageResult::Design(_) => Stage::Design,
            StageResult::Code(_) => Stage::Development,
            StageResult::Tests(_) => Stage::Testing,
        }
    }
}

/// Lifecycle status of a project.
///
/// Normal flow: Idle -> Running -> Completed. A completed project may go
/// Completed -> Modifying -> Completed. Any fatal stage failure ends in Failed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Created, no stage has started yet.
    #[default]
    Idle,

    /// The main stage sequence is executing.
    Running,

    /// A modification request is being applied to a completed project.
    Modifying,

    /// Testing finished (or the last modification succeeded).
    Completed,

    /// A stage failed at the transport level and the run stopped.
    Failed,
}

/// One software-factory run and everything it has produced so far.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[ts(type = "string")]
    pub id: Uuid,

    /// The user's original request.
    pub prompt: String,

    /// Display name, produced by the Naming stage.
    pub name: String,

    /// 0 Naming, 1 Requirements, 2 Design, 3 Development, 4 Testing,
    /// [`COMPLETE_STEP`] once everything has finished.
    pub current_step: usize,

    pub is_processing: bool,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Requirements>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<Design>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Code>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<Tests>,

    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub theme: Theme,
}

impl Project {
    /// True once the main sequence has finished and nothing is running.
    pub fn is_complete(&self) -> bool {
        !self.is_processing && self.completed_at.is_some()
    }
}
