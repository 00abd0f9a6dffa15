//! Test fixtures for creating sample configurations and test data.

use sf_core::config::AppConfig;
use sf_core::engine::PipelineEngine;
use sf_core::gateway::MockGateway;
use sf_core::state::project::create_project;
use sf_protocol::project_models::{Code, Design, Project, ProjectStatus, Requirements, Tests, Theme};
use std::collections::BTreeMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Create a temporary project directory with `.sdlc-factory` configuration.
///
/// The config selects the mock provider and overrides the design profile.
/// Returns a TempDir that must be kept alive for the test duration.
pub fn create_test_project() -> std::io::Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    let root = temp_dir.path();

    std::fs::create_dir_all(root.join(".sdlc-factory/agents"))?;
    std::fs::write(
        root.join(".sdlc-factory/config.toml"),
        "provider = \"mock\"\nhistory_limit = 5\n\n[limits]\ntesting_code_chars = 64\n",
    )?;

    let design_md = r#"---
stage: design
description: Test design agent
temperature: 0.3
---
You are a terse test architect."#;
    std::fs::write(root.join(".sdlc-factory/agents/design.md"), design_md)?;

    Ok(temp_dir)
}

/// Built-in configuration rooted at the current directory.
pub fn test_config() -> AppConfig {
    AppConfig::builtin(".").expect("built-in config must load")
}

/// An engine backed by `gateway` with built-in profiles.
pub fn test_engine(gateway: &MockGateway) -> PipelineEngine {
    PipelineEngine::new(Arc::new(gateway.clone()), &test_config())
}

pub fn sample_requirements() -> Requirements {
    Requirements {
        user_stories: vec!["Add item".to_string(), "Remove item".to_string()],
        scope: "A single-page todo list".to_string(),
        assumptions: vec!["No login".to_string()],
    }
}

pub fn sample_design() -> Design {
    Design {
        architecture: "## App\n- TodoList".to_string(),
        wireframes: "[ input ][Add]".to_string(),
        api_contracts: "none".to_string(),
    }
}

pub fn sample_code() -> Code {
    let mut files = BTreeMap::new();
    files.insert(
        "src/App.tsx".to_string(),
        "export default function App(){return <ul/>}".to_string(),
    );
    let mut dependencies = BTreeMap::new();
    dependencies.insert("react".to_string(), "^18.2.0".to_string());
    Code {
        files,
        dependencies,
    }
}

pub fn sample_tests() -> Tests {
    Tests {
        test_cases: vec!["Adding an item shows it".to_string()],
        results: "1/1 pass".to_string(),
        bug_reports: "None".to_string(),
    }
}

/// A project that has been through the whole pipeline.
pub fn create_completed_project(prompt: &str) -> Project {
    let mut project = create_project(prompt, Theme::Sunset);
    project.name = "Task Forge".to_string();
    project.status = ProjectStatus::Completed;
    project.current_step = sf_protocol::project_models::COMPLETE_STEP;
    project.requirements = Some(sample_requirements());
    project.design = Some(sample_design());
    project.code = Some(sample_code());
    project.tests = Some(sample_tests());
    project.completed_at = Some(chrono::Utc::now());
    project
}
