//! Per-stage request construction.
//!
//! Turns a stage's agent profile plus the prior-stage context into a
//! `GenerateRequest`. Context from earlier stages is embedded as compact JSON
//! and truncated to the configured character budgets.

use crate::gateway::GenerateRequest;
use serde::Serialize;
use serde_json::{json, Value};
use sf_protocol::agent_models::AgentProfile;
use sf_protocol::config_models::ContextLimits;
use sf_protocol::project_models::{Design, Requirements, Stage, Theme};

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Palette and mood given to the code-writing stages.
pub fn theme_guidelines(theme: Theme) -> &'static str {
    match theme {
        Theme::Ocean => "- Primary: Indigo/Cyan, Neutrals: Slate. Vibe: Professional, Tech, Deep Space.",
        Theme::Sunset => "- Primary: Orange/Rose, Neutrals: Zinc. Vibe: Energetic, Warm, Modern.",
        Theme::Forest => "- Primary: Emerald/Teal, Neutrals: Stone. Vibe: Natural, Growth, Clean.",
    }
}

/// The profile's system instruction with theme placeholders filled in.
pub fn render_instruction(profile: &AgentProfile, theme: Theme) -> String {
    profile
        .system_prompt
        .replace("{{theme_guidelines}}", theme_guidelines(theme))
        .replace("{{theme}}", theme.as_str())
}

/// The longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

fn compact<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

pub fn requirements_schema() -> Value {
    json!({
        "userStories": ["story 1", "story 2"],
        "scope": "project scope description",
        "assumptions": ["assumption 1"]
    })
}

pub fn design_schema() -> Value {
    json!({
        "architecture": "markdown...",
        "wireframes": "markdown...",
        "apiContracts": "markdown..."
    })
}

pub fn tests_schema() -> Value {
    json!({
        "testCases": ["test 1"],
        "results": "summary",
        "bugReports": "none"
    })
}

fn base_request(profile: &AgentProfile, stage: Stage, theme: Theme, prompt: String) -> GenerateRequest {
    GenerateRequest::new(stage, render_instruction(profile, theme), prompt)
        .with_model(profile.model.clone())
        .with_temperature(profile.effective_temperature())
}

pub fn naming_request(profile: &AgentProfile, prompt: &str) -> GenerateRequest {
    base_request(
        profile,
        Stage::Naming,
        Theme::default(),
        format!("Project idea: {prompt}"),
    )
}

pub fn requirement_request(profile: &AgentProfile, prompt: &str) -> GenerateRequest {
    base_request(
        profile,
        Stage::Requirement,
        Theme::default(),
        format!("User request: {prompt}"),
    )
    .with_schema(requirements_schema())
}

pub fn design_request(profile: &AgentProfile, requirements: &Requirements) -> GenerateRequest {
    base_request(
        profile,
        Stage::Design,
        Theme::default(),
        format!("Requirements: {}", compact(requirements)),
    )
    .with_schema(design_schema())
}

pub fn development_request(
    profile: &AgentProfile,
    design: &Design,
    requirements: &Requirements,
    theme: Theme,
    limits: &ContextLimits,
) -> GenerateRequest {
    let requirements = compact(requirements);
    let design = compact(design);
    let prompt = format!(
        "Requirements: {}\nDesign Context: {}\nTarget Theme: {}",
        truncate_chars(&requirements, limits.development_context_chars),
        truncate_chars(&design, limits.development_context_chars),
        theme
    );
    base_request(profile, Stage::Development, theme, prompt)
}

pub fn testing_request(
    profile: &AgentProfile,
    code: &str,
    requirements: &Requirements,
    limits: &ContextLimits,
) -> GenerateRequest {
    let excerpt = truncate_chars(code, limits.testing_code_chars);
    let marker = if excerpt.len() < code.len() {
        TRUNCATION_MARKER
    } else {
        ""
    };
    let prompt = format!(
        "Code: {excerpt}{marker}\nRequirements: {}",
        compact(requirements)
    );
    base_request(profile, Stage::Testing, Theme::default(), prompt).with_schema(tests_schema())
}

pub fn modification_request(
    profile: &AgentProfile,
    existing_code: &str,
    request: &str,
    requirements: &Requirements,
    theme: Theme,
    limits: &ContextLimits,
) -> GenerateRequest {
    let requirements = compact(requirements);
    let prompt = format!(
        "Existing Code: {}\nRequest: {}\nRequirements: {}\nTheme: {}",
        truncate_chars(existing_code, limits.modification_code_chars),
        request,
        truncate_chars(&requirements, limits.development_context_chars),
        theme
    );
    base_request(profile, Stage::Modification, theme, prompt)
}
