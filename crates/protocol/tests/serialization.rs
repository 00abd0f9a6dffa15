use sf_protocol::*;
use std::collections::BTreeMap;
use uuid::Uuid;

fn sample_project() -> Project {
    Project {
        id: Uuid::new_v4(),
        prompt: "A todo app".to_string(),
        name: "Task Forge".to_string(),
        current_step: 2,
        is_processing: true,
        status: ProjectStatus::Running,
        requirements: Some(Requirements {
            user_stories: vec!["Add item".to_string(), "Remove item".to_string()],
            scope: "A single-page todo list".to_string(),
            assumptions: vec!["No login".to_string()],
        }),
        design: None,
        code: None,
        tests: None,
        created_at: chrono::Utc::now(),
        completed_at: None,
        theme: Theme::Sunset,
    }
}

#[test]
fn test_global_config_deserialization_from_toml() {
    let toml_str = r#"
provider = "ollama"
base_url = "http://gpu-box:11434"
model = "qwen2.5-coder"

[limits]
testing_code_chars = 4000
"#;

    let config: GlobalConfig = toml::from_str(toml_str).expect("Failed to deserialize GlobalConfig");

    assert_eq!(config.provider, ProviderKind::Ollama);
    assert_eq!(config.base_url.as_deref(), Some("http://gpu-box:11434"));
    assert_eq!(config.model.as_deref(), Some("qwen2.5-coder"));
    assert_eq!(config.limits.testing_code_chars, 4000);
    // Unspecified limits keep their defaults
    assert_eq!(config.limits.development_context_chars, 1000);
    assert_eq!(config.limits.modification_code_chars, 5000);
    assert_eq!(config.history_limit, 100);
}

#[test]
fn test_global_config_empty_toml_is_default() {
    let config: GlobalConfig = toml::from_str("").expect("Failed to deserialize empty config");
    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.effective_base_url(), "http://localhost:8000");
    assert_eq!(config.effective_model(), None);
}

#[test]
fn test_provider_compatible_alias() {
    let config: GlobalConfig =
        toml::from_str("provider = \"compatible\"").expect("Failed to deserialize alias");
    assert_eq!(config.provider, ProviderKind::OpenAi);
    assert_eq!(config.effective_model().as_deref(), Some("gpt-3.5-turbo"));
}

#[test]
fn test_requirements_use_camel_case_keys() {
    let json = serde_json::json!({
        "userStories": ["story 1", "story 2"],
        "scope": "project scope description",
        "assumptions": ["assumption 1"]
    });

    let requirements: Requirements =
        serde_json::from_value(json).expect("Failed to deserialize Requirements");
    assert_eq!(requirements.user_stories.len(), 2);
    assert_eq!(requirements.scope, "project scope description");

    let value = serde_json::to_value(&requirements).expect("Failed to serialize Requirements");
    assert!(value.get("userStories").is_some());
    assert!(value.get("user_stories").is_none());
}

#[test]
fn test_code_dependencies_default_to_empty() {
    let code: Code = serde_json::from_str(r#"{"files": {"src/App.tsx": "export default 1"}}"#)
        .expect("Failed to deserialize Code");

    assert!(code.dependencies.is_empty());
    assert_eq!(code.main_file(), Some("export default 1"));
}

#[test]
fn test_code_main_file_falls_back_to_first_file() {
    let mut files = BTreeMap::new();
    files.insert("src/Main.jsx".to_string(), "main".to_string());
    let code = Code {
        files,
        dependencies: BTreeMap::new(),
    };
    assert_eq!(code.main_file(), Some("main"));
    assert_eq!(Code::default().main_file(), None);
}

#[test]
fn test_stage_result_tagging() {
    let result = StageResult::Design(Design {
        architecture: "## Layers".to_string(),
        wireframes: "Header / List".to_string(),
        api_contracts: "none".to_string(),
    });

    let json = serde_json::to_value(&result).expect("Failed to serialize StageResult");
    assert_eq!(json["kind"], "design");
    assert_eq!(json["result"]["apiContracts"], "none");
    assert_eq!(result.stage(), Stage::Design);
}

#[test]
fn test_project_serialization() {
    let project = sample_project();

    let json = serde_json::to_string(&project).expect("Failed to serialize Project");
    let deserialized: Project = serde_json::from_str(&json).expect("Failed to deserialize Project");

    assert_eq!(deserialized, project);
    // Missing stage results are omitted rather than written as null
    assert!(!json.contains("\"design\""));
    assert!(json.contains("\"currentStep\":2"));
}

#[test]
fn test_project_status_serialization() {
    let status = ProjectStatus::Modifying;
    let json = serde_json::to_value(status).expect("Failed to serialize ProjectStatus");

    assert_eq!(json, "MODIFYING");

    let deserialized: ProjectStatus =
        serde_json::from_value(json).expect("Failed to deserialize ProjectStatus");
    assert_eq!(deserialized, ProjectStatus::Modifying);
}

#[test]
fn test_stage_step_indices() {
    assert_eq!(Stage::Naming.step_index(), 0);
    assert_eq!(Stage::Requirement.step_index(), 1);
    assert_eq!(Stage::Testing.step_index(), 4);
    assert_eq!(
        Stage::Modification.step_index(),
        Stage::Development.step_index()
    );
    assert!(Stage::SEQUENCE
        .windows(2)
        .all(|pair| pair[0].step_index() < pair[1].step_index()));
    assert!(Stage::Testing.step_index() < COMPLETE_STEP);
}

#[test]
fn test_stage_from_name() {
    assert_eq!(Stage::from_name("requirements"), Some(Stage::Requirement));
    assert_eq!(Stage::from_name("  Testing "), Some(Stage::Testing));
    assert_eq!(Stage::from_name("deploy"), None);
}

#[test]
fn test_theme_parsing() {
    assert_eq!("Forest".parse::<Theme>(), Ok(Theme::Forest));
    assert!("neon".parse::<Theme>().is_err());
    assert_eq!(Theme::default(), Theme::Ocean);
}

#[test]
fn test_history_snapshot_preview() {
    let mut project = sample_project();
    project.requirements = Some(Requirements {
        scope: "x".repeat(400),
        ..Requirements::default()
    });

    let item = HistoryItem::snapshot(&project);
    assert_eq!(item.id, project.id);
    assert_eq!(item.preview.chars().count(), PREVIEW_CHARS);

    project.requirements = None;
    let item = HistoryItem::snapshot(&project);
    assert_eq!(item.preview, "No preview available");
}

#[test]
fn test_op_enum_serialization() {
    let op = Op::StartProject {
        prompt: "A todo app".to_string(),
        theme: Theme::Forest,
    };

    let json = serde_json::to_value(&op).expect("Failed to serialize Op");
    assert_eq!(json["type"], "startProject");
    assert!(json["payload"].is_object());

    let deserialized: Op = serde_json::from_value(json).expect("Failed to deserialize Op");
    match deserialized {
        Op::StartProject { prompt, theme } => {
            assert_eq!(prompt, "A todo app");
            assert_eq!(theme, Theme::Forest);
        }
        _ => panic!("Wrong variant"),
    }

    // Theme is optional on the wire
    let json = serde_json::json!({"type": "startProject", "payload": {"prompt": "p"}});
    let deserialized: Op = serde_json::from_value(json).expect("Failed to deserialize Op");
    assert!(matches!(deserialized, Op::StartProject { theme: Theme::Ocean, .. }));
}

#[test]
fn test_event_enum_serialization() {
    let project_id = Uuid::new_v4();
    let event = Event::StageChunk {
        project_id,
        stage: Stage::Requirement,
        content: "{\"userStories\"".to_string(),
    };

    let json = serde_json::to_value(&event).expect("Failed to serialize Event");
    assert_eq!(json["type"], "stageChunk");
    assert_eq!(json["payload"]["stage"], "Requirement");
    assert_eq!(event.project_id(), project_id);

    let message = Event::AgentMessage {
        project_id,
        message: AgentMessage::new(AgentRole::Orchestrator, "hello", MessageStatus::Thinking),
    };
    let json = serde_json::to_value(&message).expect("Failed to serialize Event");
    assert_eq!(json["type"], "agentMessage");
    assert_eq!(json["payload"]["message"]["status"], "thinking");
    assert_eq!(json["payload"]["message"]["role"], "Orchestrator");
}

#[test]
fn test_agent_role_for_stage() {
    assert_eq!(AgentRole::for_stage(Stage::Naming), AgentRole::Orchestrator);
    assert_eq!(AgentRole::for_stage(Stage::Modification), AgentRole::Development);
    assert_eq!(AgentRole::for_stage(Stage::Testing), AgentRole::Testing);
}

#[test]
fn test_agent_profile_temperature_defaults() {
    let naming: AgentProfile =
        serde_json::from_value(serde_json::json!({"stage": "naming"})).expect("Failed to deserialize");
    assert_eq!(naming.stage, Stage::Naming);
    assert_eq!(naming.effective_temperature(), NAMING_TEMPERATURE);
    assert!(naming.system_prompt.is_empty());

    let design: AgentProfile = serde_json::from_value(
        serde_json::json!({"stage": "Design", "temperature": 0.4, "model": "qwen2.5-coder"}),
    )
    .expect("Failed to deserialize");
    assert_eq!(design.effective_temperature(), 0.4);
    assert_eq!(design.model.as_deref(), Some("qwen2.5-coder"));
}
