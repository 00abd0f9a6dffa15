//! Terminal rendering of the event feed.

use colored::{ColoredString, Colorize};
use sf_protocol::ipc::Event;
use sf_protocol::message_models::{AgentMessage, AgentRole, MessageStatus};
use sf_protocol::project_models::Stage;
use std::io::Write;
use tokio::sync::mpsc;

/// Number of steps shown in stage headers (Naming is step 0).
const LAST_STEP: usize = 4;

fn role_label(role: AgentRole) -> ColoredString {
    let label = format!("[{role:?}]");
    match role {
        AgentRole::User => label.bold(),
        AgentRole::Orchestrator => label.magenta(),
        AgentRole::Requirement => label.blue(),
        AgentRole::Design => label.cyan(),
        AgentRole::Development => label.green(),
        AgentRole::Testing => label.yellow(),
    }
}

fn format_message(message: &AgentMessage) -> String {
    let content = match message.status {
        MessageStatus::Thinking => message.content.dimmed(),
        MessageStatus::Done => message.content.normal(),
        MessageStatus::Error => message.content.red(),
    };
    format!("{} {}", role_label(message.role), content)
}

fn stage_header(stage: Stage, step_index: usize) -> String {
    format!("\n== {stage} ({step_index}/{LAST_STEP}) ==")
        .bold()
        .to_string()
}

/// Render a non-chunk event as one or more lines.
pub fn format_event(event: &Event) -> Option<String> {
    let line = match event {
        Event::ProjectStarted { project_id, .. } => {
            format!("Starting project {project_id}").bold().to_string()
        }
        Event::ProjectRenamed { name, .. } => format!("Project: {}", name.cyan().bold()),
        Event::StageStarted {
            stage, step_index, ..
        } => stage_header(*stage, *step_index),
        Event::StageChunk { .. } => return None,
        Event::StageCompleted {
            stage, degraded, ..
        } => {
            if *degraded {
                format!("{stage} finished with placeholder output")
                    .yellow()
                    .to_string()
            } else {
                format!("{stage} finished").green().to_string()
            }
        }
        Event::AgentMessage { message, .. } => format_message(message),
        Event::ProjectCompleted { .. } => "Project completed.".green().bold().to_string(),
        Event::ProjectError { stage, error, .. } => {
            format!("Pipeline stopped at {stage}: {error}").red().bold().to_string()
        }
    };
    Some(line)
}

/// Print events until the channel closes.
///
/// Streamed fragments are echoed in place when `show_chunks` is set.
pub async fn render_events(mut rx: mpsc::Receiver<Event>, show_chunks: bool) {
    let mut stdout = std::io::stdout();
    let mut mid_line = false;

    while let Some(event) = rx.recv().await {
        if let Event::StageChunk { content, .. } = &event {
            if show_chunks {
                let _ = write!(stdout, "{}", content.dimmed());
                let _ = stdout.flush();
                mid_line = !content.ends_with('\n');
            }
            continue;
        }

        if mid_line {
            let _ = writeln!(stdout);
            mid_line = false;
        }
        if let Some(line) = format_event(&event) {
            let _ = writeln!(stdout, "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::state::project::create_project;
    use sf_protocol::project_models::Theme;

    #[test]
    fn test_format_stage_events() {
        colored::control::set_override(false);
        let project_id = create_project("A todo app", Theme::Ocean).id;

        let started = Event::StageStarted {
            project_id,
            stage: Stage::Design,
            step_index: 2,
        };
        assert_eq!(format_event(&started).unwrap(), "\n== Design (2/4) ==");

        let degraded = Event::StageCompleted {
            project_id,
            stage: Stage::Requirement,
            degraded: true,
        };
        assert!(format_event(&degraded).unwrap().contains("placeholder"));

        let chunk = Event::StageChunk {
            project_id,
            stage: Stage::Design,
            content: "{".to_string(),
        };
        assert!(format_event(&chunk).is_none());
    }

    #[test]
    fn test_format_agent_message() {
        colored::control::set_override(false);
        let project_id = create_project("A todo app", Theme::Ocean).id;

        let event = Event::AgentMessage {
            project_id,
            message: AgentMessage::new(
                AgentRole::Testing,
                "Ran 4 test cases.",
                MessageStatus::Done,
            ),
        };
        assert_eq!(format_event(&event).unwrap(), "[Testing] Ran 4 test cases.");
    }
}
