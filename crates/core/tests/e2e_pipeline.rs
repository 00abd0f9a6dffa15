//! E2E tests for pipeline execution against the scripted gateway.
//!
//! These tests verify:
//! - The full stage sequence and its event feed
//! - Naming fallback, degraded decoding and fatal stage failures
//! - Modification replacing only the code
//! - History snapshots

mod common;

use common::*;
use sf_core::engine::{EngineError, FALLBACK_NAME};
use sf_core::gateway::MockGateway;
use sf_core::state::project::create_project;
use sf_core::storage::{HistoryStore, MemoryHistoryStore};
use sf_protocol::ipc::Event;
use sf_protocol::project_models::{ProjectStatus, Stage, Theme, COMPLETE_STEP, MAIN_FILE};
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::test]
async fn test_full_pipeline_completes() {
    let gateway = MockGateway::demo();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Forest);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    assert_eq!(project.name, "Pocket Planner");
    assert_eq!(project.status, ProjectStatus::Completed);
    assert_eq!(project.current_step, COMPLETE_STEP);
    assert!(!project.is_processing);
    assert!(project.completed_at.is_some());
    assert_eq!(project.requirements.as_ref().unwrap().user_stories.len(), 3);
    assert!(project.design.as_ref().unwrap().architecture.contains("TaskList"));
    let code = project.code.as_ref().unwrap();
    assert!(code.files[MAIN_FILE].starts_with("import React"));
    assert!(code.dependencies.contains_key("lucide-react"));
    assert_eq!(project.tests.as_ref().unwrap().test_cases.len(), 4);

    assert!(matches!(events[0], Event::ProjectStarted { .. }));
    assert_eq!(
        started_stages(&events),
        vec![
            Stage::Naming,
            Stage::Requirement,
            Stage::Design,
            Stage::Development,
            Stage::Testing
        ]
    );
    assert_steps_monotonic(&events);
    assert!(has_project_completed(&events));
    for stage in Stage::SEQUENCE {
        assert_eq!(stage_degraded(&events, stage), Some(false), "{stage}");
    }
}

#[tokio::test]
async fn test_stages_are_called_in_order_with_prior_context() {
    let gateway = MockGateway::demo();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Sunset);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    collector.await.unwrap();

    let stages: Vec<Stage> = gateway.requests().iter().map(|r| r.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Naming,
            Stage::Requirement,
            Stage::Design,
            Stage::Development,
            Stage::Testing
        ]
    );

    let naming = &gateway.requests_for(Stage::Naming)[0];
    assert!(!naming.stream);
    assert_eq!(naming.temperature, 0.7);

    let design = &gateway.requests_for(Stage::Design)[0];
    assert!(design.prompt.contains("add a task with a title"));
    assert!(design.schema.is_some());

    let development = &gateway.requests_for(Stage::Development)[0];
    assert!(development.schema.is_none());
    assert!(development.prompt.contains("Target Theme: sunset"));
    assert_contains_ci(&development.system_instruction, "sunset");
    assert_eq!(development.temperature, 0.1);

    let testing = &gateway.requests_for(Stage::Testing)[0];
    assert!(testing.prompt.contains("export default function App()"));
    // The demo code fits the default excerpt budget.
    assert!(!testing.prompt.contains("(truncated)"));
}

#[tokio::test]
async fn test_streamed_chunks_reassemble_the_reply() {
    let gateway = MockGateway::demo().with_chunk_chars(7);
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    let streamed = streamed_text(&events, Stage::Testing);
    assert!(streamed.starts_with("{\n  \"testCases\""));
    assert!(streamed.ends_with('}'));

    // Chunks of a stage arrive before the stage is committed.
    let last_chunk = events
        .iter()
        .rposition(|e| matches!(e, Event::StageChunk { stage: Stage::Design, .. }))
        .unwrap();
    let committed = events
        .iter()
        .position(|e| matches!(e, Event::StageCompleted { stage: Stage::Design, .. }))
        .unwrap();
    assert!(last_chunk < committed);
}

#[tokio::test]
async fn test_streaming_disabled_emits_no_chunks() {
    let gateway = MockGateway::demo();
    let engine = test_engine(&gateway).with_streaming(false);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    assert!(!events.iter().any(|e| matches!(e, Event::StageChunk { .. })));
    assert!(gateway.requests().iter().all(|r| !r.stream));
    assert_eq!(project.status, ProjectStatus::Completed);
}

#[tokio::test]
async fn test_naming_failure_uses_fallback_name() {
    let gateway = failing_naming_gateway();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    assert_eq!(project.name, FALLBACK_NAME);
    assert_eq!(gateway.requests_for(Stage::Requirement).len(), 1);
    assert!(project.requirements.is_some());
    assert!(events.iter().any(|e| matches!(
        e,
        Event::ProjectRenamed { name, .. } if name == FALLBACK_NAME
    )));
}

#[tokio::test]
async fn test_development_reply_in_prose_yields_exact_code() {
    let gateway = prose_development_gateway();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    let code = project.code.as_ref().unwrap();
    assert_eq!(
        code.files[MAIN_FILE],
        "export default function App(){return null}"
    );
    assert_eq!(code.files.len(), 1);
    assert!(code.dependencies.contains_key("framer-motion"));
    assert_eq!(stage_degraded(&events, Stage::Development), Some(false));
}

#[tokio::test]
async fn test_truncated_requirements_degrade_and_continue() {
    let gateway = truncated_requirements_gateway();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    let requirements = project.requirements.as_ref().unwrap();
    assert!(requirements.user_stories.is_empty());
    assert_eq!(requirements.scope, "Failed to parse requirements");
    assert!(requirements.assumptions.is_empty());

    assert_eq!(stage_degraded(&events, Stage::Requirement), Some(true));
    let design = &gateway.requests_for(Stage::Design)[0];
    assert!(design.prompt.contains("Failed to parse requirements"));
    assert_eq!(project.status, ProjectStatus::Completed);
}

#[tokio::test]
async fn test_gateway_failure_stops_the_run() {
    let gateway = failing_design_gateway();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    let err = engine.run(&mut project, &events_tx).await.unwrap_err();
    drop(events_tx);
    let events = collector.await.unwrap();

    assert!(matches!(
        err,
        EngineError::Stage {
            stage: Stage::Design,
            ..
        }
    ));
    assert_eq!(project.status, ProjectStatus::Failed);
    assert!(!project.is_processing);
    assert_eq!(project.current_step, Stage::Design.step_index());
    assert!(project.requirements.is_some());
    assert!(project.design.is_none());
    assert!(project.completed_at.is_none());
    assert!(gateway.requests_for(Stage::Development).is_empty());

    assert_eq!(project_error_stage(&events), Some(Stage::Design));
    assert!(!has_project_completed(&events));
}

#[tokio::test]
async fn test_interrupted_stream_is_fatal_without_commit() {
    let gateway = MockGateway::demo().with_interruption(
        Stage::Testing,
        "{\"testCases\": [\"Adds",
        sf_core::gateway::GatewayError::Transport("connection reset".to_string()),
    );
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    assert!(engine.run(&mut project, &events_tx).await.is_err());
    drop(events_tx);
    let events = collector.await.unwrap();

    assert!(project.tests.is_none());
    assert!(project.code.is_some());
    assert_eq!(project.current_step, Stage::Testing.step_index());
    assert!(streamed_text(&events, Stage::Testing).starts_with("{\"testCases\""));
}

#[tokio::test]
async fn test_modification_replaces_only_code() {
    let gateway = MockGateway::demo();
    let engine = test_engine(&gateway);
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_completed_project("A todo app");
    let before = project.clone();
    engine
        .modify(&mut project, "add a dark mode toggle", &events_tx)
        .await
        .unwrap();
    drop(events_tx);
    let events = collector.await.unwrap();

    assert_eq!(project.requirements, before.requirements);
    assert_eq!(project.design, before.design);
    assert_eq!(project.tests, before.tests);
    assert_eq!(project.name, before.name);
    assert_ne!(project.code, before.code);
    assert!(project.code.as_ref().unwrap().files[MAIN_FILE].contains("tasks.length"));
    assert_eq!(project.status, ProjectStatus::Completed);
    assert_eq!(project.current_step, COMPLETE_STEP);

    let request = &gateway.requests_for(Stage::Modification)[0];
    assert!(request.prompt.contains("Request: add a dark mode toggle"));
    assert!(request.prompt.contains("return <ul/>"));
    assert_eq!(stage_degraded(&events, Stage::Modification), Some(false));
    assert!(has_project_completed(&events));
}

#[tokio::test]
async fn test_failed_modification_marks_project_failed() {
    let gateway = MockGateway::demo().with_failure(
        Stage::Modification,
        sf_core::gateway::GatewayError::Status {
            status: 500,
            body: "boom".to_string(),
        },
    );
    let engine = test_engine(&gateway);
    let (events_tx, _events_rx) = mpsc::channel(64);

    let mut project = create_completed_project("A todo app");
    let before = project.code.clone();
    let err = engine
        .modify(&mut project, "make it red", &events_tx)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Stage {
            stage: Stage::Modification,
            ..
        }
    ));
    assert_eq!(project.status, ProjectStatus::Failed);
    assert!(!project.is_processing);
    assert_eq!(project.code, before);
}

#[tokio::test]
async fn test_history_snapshots_follow_the_run() {
    let gateway = MockGateway::demo();
    let store = Arc::new(MemoryHistoryStore::default());
    let engine = test_engine(&gateway).with_history(store.clone());
    let (events_tx, events_rx) = mpsc::channel(16);
    let collector = spawn_collector(events_rx);

    let mut project = create_project("A todo app", Theme::Ocean);
    engine.run(&mut project, &events_tx).await.unwrap();
    drop(events_tx);
    collector.await.unwrap();

    let items = store.list().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, project.id);
    assert_eq!(items[0].name, "Pocket Planner");
    assert_eq!(items[0].project, project);
    assert!(items[0].preview.starts_with("A single-page task planner"));
}
