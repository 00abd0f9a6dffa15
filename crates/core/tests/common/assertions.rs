//! Custom assertion helpers for E2E tests.

use sf_protocol::ipc::Event;
use sf_protocol::project_models::Stage;
use std::time::Duration;
use tokio::sync::mpsc;

/// Collect events until the project completes or fails, or until timeout.
pub async fn collect_events_until_terminal(
    rx: &mut mpsc::Receiver<Event>,
    timeout: Duration,
) -> Vec<Event> {
    let mut events = Vec::new();
    let start = tokio::time::Instant::now();

    while start.elapsed() < timeout {
        match tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
            Ok(Some(event)) => {
                let is_terminal = matches!(
                    &event,
                    Event::ProjectCompleted { .. } | Event::ProjectError { .. }
                );
                events.push(event);
                if is_terminal {
                    // Transcript messages follow the terminal event.
                    while let Ok(Some(event)) =
                        tokio::time::timeout(Duration::from_millis(20), rx.recv()).await
                    {
                        events.push(event);
                    }
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => continue,
        }
    }

    events
}

/// Spawn a task that drains the channel until it closes.
pub fn spawn_collector(mut rx: mpsc::Receiver<Event>) -> tokio::task::JoinHandle<Vec<Event>> {
    tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    })
}

pub fn has_project_completed(events: &[Event]) -> bool {
    events
        .iter()
        .any(|e| matches!(e, Event::ProjectCompleted { .. }))
}

pub fn project_error_stage(events: &[Event]) -> Option<Stage> {
    events.iter().find_map(|e| match e {
        Event::ProjectError { stage, .. } => Some(*stage),
        _ => None,
    })
}

/// Stages in the order their `StageStarted` events were emitted.
pub fn started_stages(events: &[Event]) -> Vec<Stage> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageStarted { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect()
}

/// Whether the stage was committed, and whether it was degraded.
pub fn stage_degraded(events: &[Event], stage: Stage) -> Option<bool> {
    events.iter().find_map(|e| match e {
        Event::StageCompleted {
            stage: s, degraded, ..
        } if *s == stage => Some(*degraded),
        _ => None,
    })
}

/// Concatenate every streamed fragment of one stage.
pub fn streamed_text(events: &[Event], stage: Stage) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            Event::StageChunk {
                stage: s, content, ..
            } if *s == stage => Some(content.as_str()),
            _ => None,
        })
        .collect()
}

/// Assert that step indices announced by `StageStarted` never decrease.
pub fn assert_steps_monotonic(events: &[Event]) {
    let steps: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            Event::StageStarted { step_index, .. } => Some(*step_index),
            _ => None,
        })
        .collect();
    assert!(
        steps.windows(2).all(|pair| pair[0] <= pair[1]),
        "step indices went backwards: {steps:?}"
    );
}

/// Assert that a string contains a substring (case-insensitive).
pub fn assert_contains_ci(haystack: &str, needle: &str) {
    let haystack_lower = haystack.to_lowercase();
    let needle_lower = needle.to_lowercase();
    assert!(
        haystack_lower.contains(&needle_lower),
        "Expected '{}' to contain '{}' (case-insensitive)",
        haystack,
        needle
    );
}
