//! Project state machine implementation.
//!
//! This module provides functions for managing the lifecycle of a Project,
//! including state transitions, stage result commits and event emission.
//! The pipeline engine is the only caller; it owns the `Project` while a run
//! is in progress.

use crate::decoder::Decoded;
use crate::gateway::GatewayError;
use chrono::Utc;
use sf_protocol::ipc::Event;
use sf_protocol::message_models::{AgentMessage, AgentRole, MessageStatus};
use sf_protocol::project_models::{
    Code, Design, Project, ProjectStatus, Requirements, Stage, Tests, Theme, COMPLETE_STEP,
};
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

/// Name used until the Naming stage has produced one.
pub const PENDING_NAME: &str = "Initializing...";

/// Create a new Project in Idle status.
pub fn create_project(prompt: impl Into<String>, theme: Theme) -> Project {
    Project {
        id: Uuid::new_v4(),
        prompt: prompt.into(),
        name: PENDING_NAME.to_string(),
        current_step: Stage::Naming.step_index(),
        is_processing: false,
        status: ProjectStatus::Idle,
        requirements: None,
        design: None,
        code: None,
        tests: None,
        created_at: Utc::now(),
        completed_at: None,
        theme,
    }
}

/// Append a transcript message and emit it.
pub async fn post_message(
    project: &Project,
    events_tx: &Sender<Event>,
    role: AgentRole,
    content: impl Into<String>,
    status: MessageStatus,
) {
    let _ = events_tx
        .send(Event::AgentMessage {
            project_id: project.id,
            message: AgentMessage::new(role, content, status),
        })
        .await;
}

/// Put a project into the Running state without announcing it.
pub fn mark_running(project: &mut Project) {
    project.status = ProjectStatus::Running;
    project.is_processing = true;
    project.current_step = Stage::Naming.step_index();
}

/// Transition to Running and announce the project.
pub async fn start_project(project: &mut Project, events_tx: &Sender<Event>) {
    mark_running(project);
    let _ = events_tx
        .send(Event::ProjectStarted {
            project_id: project.id,
            prompt: project.prompt.clone(),
        })
        .await;
    post_message(
        project,
        events_tx,
        AgentRole::User,
        project.prompt.clone(),
        MessageStatus::Done,
    )
    .await;
}

/// Set the display name produced by the Naming stage.
pub async fn rename_project(project: &mut Project, events_tx: &Sender<Event>, name: String) {
    project.name = name;
    let _ = events_tx
        .send(Event::ProjectRenamed {
            project_id: project.id,
            name: project.name.clone(),
        })
        .await;
    post_message(
        project,
        events_tx,
        AgentRole::Orchestrator,
        format!("Initializing automated SDLC for: \"{}\"", project.name),
        MessageStatus::Done,
    )
    .await;
}

fn stage_narration(stage: Stage) -> &'static str {
    match stage {
        Stage::Naming => "Choosing a project name...",
        Stage::Requirement => "Analyzing request and extracting user stories...",
        Stage::Design => "Designing the architecture and wireframes...",
        Stage::Development => "Writing the application code...",
        Stage::Testing => "Reviewing the code and running test scenarios...",
        Stage::Modification => "Applying the requested changes...",
    }
}

/// Move the project to a stage and emit `StageStarted`.
pub async fn enter_stage(project: &mut Project, events_tx: &Sender<Event>, stage: Stage) {
    project.current_step = stage.step_index();
    let _ = events_tx
        .send(Event::StageStarted {
            project_id: project.id,
            stage,
            step_index: project.current_step,
        })
        .await;
    post_message(
        project,
        events_tx,
        AgentRole::for_stage(stage),
        stage_narration(stage),
        MessageStatus::Thinking,
    )
    .await;
}

async fn stage_committed(
    project: &Project,
    events_tx: &Sender<Event>,
    stage: Stage,
    degraded: bool,
    summary: String,
) {
    let _ = events_tx
        .send(Event::StageCompleted {
            project_id: project.id,
            stage,
            degraded,
        })
        .await;
    let (summary, status) = if degraded {
        (
            format!("{summary} (the reply could not be decoded; a placeholder was used)"),
            MessageStatus::Error,
        )
    } else {
        (summary, MessageStatus::Done)
    };
    post_message(project, events_tx, AgentRole::for_stage(stage), summary, status).await;
}

pub async fn commit_requirements(
    project: &mut Project,
    events_tx: &Sender<Event>,
    decoded: Decoded<Requirements>,
) {
    let degraded = decoded.is_degraded();
    let summary = format!(
        "Extracted {} user stories. Scope defined.",
        decoded.value.user_stories.len()
    );
    project.requirements = Some(decoded.value);
    stage_committed(project, events_tx, Stage::Requirement, degraded, summary).await;
}

pub async fn commit_design(project: &mut Project, events_tx: &Sender<Event>, decoded: Decoded<Design>) {
    let degraded = decoded.is_degraded();
    project.design = Some(decoded.value);
    let summary = "Architecture and wireframes drafted.".to_string();
    stage_committed(project, events_tx, Stage::Design, degraded, summary).await;
}

pub async fn commit_code(project: &mut Project, events_tx: &Sender<Event>, decoded: Decoded<Code>) {
    let degraded = decoded.is_degraded();
    let summary = format!(
        "Generated {} file(s) with {} dependencies.",
        decoded.value.files.len(),
        decoded.value.dependencies.len()
    );
    project.code = Some(decoded.value);
    stage_committed(project, events_tx, Stage::Development, degraded, summary).await;
}

pub async fn commit_tests(project: &mut Project, events_tx: &Sender<Event>, decoded: Decoded<Tests>) {
    let degraded = decoded.is_degraded();
    let summary = format!(
        "Ran {} test cases. {}",
        decoded.value.test_cases.len(),
        decoded.value.results
    );
    project.tests = Some(decoded.value);
    stage_committed(project, events_tx, Stage::Testing, degraded, summary).await;
}

/// Mark the main sequence (or a modification) finished.
pub async fn complete_project(project: &mut Project, events_tx: &Sender<Event>) {
    project.status = ProjectStatus::Completed;
    project.is_processing = false;
    project.current_step = COMPLETE_STEP;
    if project.completed_at.is_none() {
        project.completed_at = Some(Utc::now());
    }
    let _ = events_tx
        .send(Event::ProjectCompleted {
            project_id: project.id,
        })
        .await;
    post_message(
        project,
        events_tx,
        AgentRole::Orchestrator,
        "All stages complete. The application is ready.",
        MessageStatus::Done,
    )
    .await;
}

/// Stop the run after a fatal stage failure.
///
/// Stage results committed before the failure are kept and `current_step`
/// stays at the failed stage.
pub async fn fail_project(
    project: &mut Project,
    events_tx: &Sender<Event>,
    stage: Stage,
    error: &GatewayError,
) {
    project.status = ProjectStatus::Failed;
    project.is_processing = false;
    let _ = events_tx
        .send(Event::ProjectError {
            project_id: project.id,
            stage,
            error: error.to_string(),
        })
        .await;
    post_message(
        project,
        events_tx,
        AgentRole::Orchestrator,
        format!("The {stage} stage failed: {error}"),
        MessageStatus::Error,
    )
    .await;
}

/// Start applying a change request to a completed project.
pub async fn begin_modification(project: &mut Project, events_tx: &Sender<Event>, request: &str) {
    project.status = ProjectStatus::Modifying;
    project.is_processing = true;
    post_message(project, events_tx, AgentRole::User, request, MessageStatus::Done).await;
    enter_stage(project, events_tx, Stage::Modification).await;
}

/// Replace the project's code with the modified code and finish.
pub async fn commit_modification(
    project: &mut Project,
    events_tx: &Sender<Event>,
    decoded: Decoded<Code>,
) {
    let degraded = decoded.is_degraded();
    project.code = Some(decoded.value);
    stage_committed(
        project,
        events_tx,
        Stage::Modification,
        degraded,
        "Changes applied to src/App.tsx.".to_string(),
    )
    .await;
    complete_project(project, events_tx).await;
}
