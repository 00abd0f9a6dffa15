//! Pipeline execution engine.
//!
//! The PipelineEngine runs the generation sequence for one project
//! (Naming, Requirements, Design, Development, Testing) and the
//! Modification stage for completed projects. Each stage builds a request
//! from the prior stages' results, sends it through the gateway, decodes the
//! reply and commits it to the project. Stages never run in parallel.

pub mod error;
pub mod prompts;

pub use error::{EngineError, EngineResult};

use crate::config::{AgentProfiles, AppConfig};
use crate::decoder::{decode_code, decode_design, decode_requirements, decode_tests, Decoded};
use crate::gateway::{generate, GatewayError, LlmGateway};
use crate::state::project::{
    begin_modification, commit_code, commit_design, commit_modification, commit_requirements,
    commit_tests, complete_project, enter_stage, fail_project, rename_project, start_project,
};
use crate::storage::HistoryStore;
use sf_protocol::config_models::ContextLimits;
use sf_protocol::history_models::HistoryItem;
use sf_protocol::ipc::Event;
use sf_protocol::project_models::{
    Code, Design, Project, ProjectStatus, Requirements, Stage, Tests, Theme,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, Sender};
use uuid::Uuid;

/// Name given to a project when the Naming stage fails or returns nothing.
pub const FALLBACK_NAME: &str = "Agent Project v1";

const CHUNK_BUFFER: usize = 64;

/// Clean up a naming reply: no quotes, first non-empty line, trimmed.
pub fn sanitize_name(reply: &str) -> Option<String> {
    reply
        .replace('"', "")
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

fn main_code(project: &Project) -> String {
    project
        .code
        .as_ref()
        .and_then(Code::main_file)
        .unwrap_or_default()
        .to_string()
}

/// The main pipeline execution engine.
pub struct PipelineEngine {
    gateway: Arc<dyn LlmGateway>,
    profiles: AgentProfiles,
    limits: ContextLimits,
    history: Option<Arc<dyn HistoryStore>>,
    streaming: bool,
}

impl PipelineEngine {
    /// Create an engine that uses `gateway` with the profiles and context
    /// limits from `config`.
    pub fn new(gateway: Arc<dyn LlmGateway>, config: &AppConfig) -> Self {
        Self {
            gateway,
            profiles: config.profiles.clone(),
            limits: config.global.limits,
            history: None,
            streaming: true,
        }
    }

    /// Save a history snapshot after naming, after every stage and at the end.
    pub fn with_history(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    /// Disable streaming; stages then emit no `StageChunk` events.
    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn limits(&self) -> &ContextLimits {
        &self.limits
    }

    /// Ask for a short project name.
    ///
    /// Never fails: any gateway error or an empty reply yields
    /// [`FALLBACK_NAME`].
    pub async fn run_naming_agent(&self, prompt: &str) -> String {
        let request = prompts::naming_request(self.profiles.get(Stage::Naming), prompt);
        match generate(self.gateway.as_ref(), &request, None).await {
            Ok(reply) => sanitize_name(&reply).unwrap_or_else(|| {
                tracing::warn!("naming reply was empty, using fallback name");
                FALLBACK_NAME.to_string()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "naming failed, using fallback name");
                FALLBACK_NAME.to_string()
            }
        }
    }

    pub async fn run_requirement_agent(
        &self,
        prompt: &str,
        on_chunk: Option<&Sender<String>>,
    ) -> Result<Decoded<Requirements>, GatewayError> {
        let request = prompts::requirement_request(self.profiles.get(Stage::Requirement), prompt);
        let raw = generate(self.gateway.as_ref(), &request, on_chunk).await?;
        Ok(decode_requirements(&raw))
    }

    pub async fn run_design_agent(
        &self,
        requirements: &Requirements,
        on_chunk: Option<&Sender<String>>,
    ) -> Result<Decoded<Design>, GatewayError> {
        let request = prompts::design_request(self.profiles.get(Stage::Design), requirements);
        let raw = generate(self.gateway.as_ref(), &request, on_chunk).await?;
        Ok(decode_design(&raw))
    }

    /// Generate the application source. The reply is expected as a fenced
    /// code block rather than JSON.
    pub async fn run_development_agent(
        &self,
        design: &Design,
        requirements: &Requirements,
        theme: Theme,
        on_chunk: Option<&Sender<String>>,
    ) -> Result<Decoded<Code>, GatewayError> {
        let request = prompts::development_request(
            self.profiles.get(Stage::Development),
            design,
            requirements,
            theme,
            &self.limits,
        );
        let raw = generate(self.gateway.as_ref(), &request, on_chunk).await?;
        Ok(decode_code(&raw, self.limits.diagnostic_chars))
    }

    pub async fn run_testing_agent(
        &self,
        code: &str,
        requirements: &Requirements,
        on_chunk: Option<&Sender<String>>,
    ) -> Result<Decoded<Tests>, GatewayError> {
        let request = prompts::testing_request(
            self.profiles.get(Stage::Testing),
            code,
            requirements,
            &self.limits,
        );
        let raw = generate(self.gateway.as_ref(), &request, on_chunk).await?;
        Ok(decode_tests(&raw))
    }

    pub async fn run_modification_agent(
        &self,
        existing_code: &str,
        request: &str,
        requirements: &Requirements,
        theme: Theme,
        on_chunk: Option<&Sender<String>>,
    ) -> Result<Decoded<Code>, GatewayError> {
        let request = prompts::modification_request(
            self.profiles.get(Stage::Modification),
            existing_code,
            request,
            requirements,
            theme,
            &self.limits,
        );
        let raw = generate(self.gateway.as_ref(), &request, on_chunk).await?;
        Ok(decode_code(&raw, self.limits.diagnostic_chars))
    }

    /// Execute the full stage sequence on `project`.
    ///
    /// On a gateway failure the run stops: the project is marked Failed,
    /// keeps the results of the stages that finished and stays at the failed
    /// stage's step.
    pub async fn run(&self, project: &mut Project, events_tx: &Sender<Event>) -> EngineResult<()> {
        start_project(project, events_tx).await;
        tracing::info!(project_id = %project.id, "pipeline started");

        enter_stage(project, events_tx, Stage::Naming).await;
        let name = self.run_naming_agent(&project.prompt).await;
        rename_project(project, events_tx, name).await;
        self.save_snapshot(project).await;

        self.log_stage(project, Stage::Requirement);
        enter_stage(project, events_tx, Stage::Requirement).await;
        let prompt = project.prompt.clone();
        let result = self
            .feed_chunks(project.id, Stage::Requirement, events_tx, move |tx| async move {
                self.run_requirement_agent(&prompt, tx.as_ref()).await
            })
            .await;
        let requirements = self
            .settle(project, events_tx, Stage::Requirement, result)
            .await?;
        commit_requirements(project, events_tx, requirements).await;
        self.save_snapshot(project).await;

        self.log_stage(project, Stage::Design);
        enter_stage(project, events_tx, Stage::Design).await;
        let requirements = project.requirements.clone().unwrap_or_default();
        let result = self
            .feed_chunks(project.id, Stage::Design, events_tx, move |tx| async move {
                self.run_design_agent(&requirements, tx.as_ref()).await
            })
            .await;
        let design = self.settle(project, events_tx, Stage::Design, result).await?;
        commit_design(project, events_tx, design).await;
        self.save_snapshot(project).await;

        self.log_stage(project, Stage::Development);
        enter_stage(project, events_tx, Stage::Development).await;
        let requirements = project.requirements.clone().unwrap_or_default();
        let design = project.design.clone().unwrap_or_default();
        let theme = project.theme;
        let result = self
            .feed_chunks(project.id, Stage::Development, events_tx, move |tx| async move {
                self.run_development_agent(&design, &requirements, theme, tx.as_ref())
                    .await
            })
            .await;
        let code = self
            .settle(project, events_tx, Stage::Development, result)
            .await?;
        commit_code(project, events_tx, code).await;
        self.save_snapshot(project).await;

        self.log_stage(project, Stage::Testing);
        enter_stage(project, events_tx, Stage::Testing).await;
        let requirements = project.requirements.clone().unwrap_or_default();
        let code = main_code(project);
        let result = self
            .feed_chunks(project.id, Stage::Testing, events_tx, move |tx| async move {
                self.run_testing_agent(&code, &requirements, tx.as_ref()).await
            })
            .await;
        let tests = self.settle(project, events_tx, Stage::Testing, result).await?;
        commit_tests(project, events_tx, tests).await;

        complete_project(project, events_tx).await;
        self.save_snapshot(project).await;
        tracing::info!(project_id = %project.id, name = %project.name, "pipeline completed");
        Ok(())
    }

    /// Apply a change request to a completed project.
    ///
    /// Only `project.code` is replaced; the other stage results are left
    /// untouched.
    pub async fn modify(
        &self,
        project: &mut Project,
        request: &str,
        events_tx: &Sender<Event>,
    ) -> EngineResult<()> {
        if project.is_processing {
            return Err(EngineError::Busy);
        }
        if project.status != ProjectStatus::Completed {
            return Err(EngineError::NotModifiable {
                id: project.id,
                status: project.status,
            });
        }

        self.log_stage(project, Stage::Modification);
        begin_modification(project, events_tx, request).await;
        let existing = main_code(project);
        let requirements = project.requirements.clone().unwrap_or_default();
        let theme = project.theme;
        let request = request.to_string();
        let result = self
            .feed_chunks(project.id, Stage::Modification, events_tx, move |tx| async move {
                self.run_modification_agent(
                    &existing,
                    &request,
                    &requirements,
                    theme,
                    tx.as_ref(),
                )
                .await
            })
            .await;
        let code = self
            .settle(project, events_tx, Stage::Modification, result)
            .await?;
        commit_modification(project, events_tx, code).await;
        self.save_snapshot(project).await;
        Ok(())
    }

    fn log_stage(&self, project: &Project, stage: Stage) {
        tracing::info!(
            project_id = %project.id,
            %stage,
            gateway = self.gateway.name(),
            "stage started"
        );
    }

    /// Run one stage call, forwarding its streamed fragments as
    /// `StageChunk` events. All fragments are delivered before this returns.
    async fn feed_chunks<T, F, Fut>(
        &self,
        project_id: Uuid,
        stage: Stage,
        events_tx: &Sender<Event>,
        call: F,
    ) -> Result<T, GatewayError>
    where
        F: FnOnce(Option<Sender<String>>) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        if !self.streaming {
            return call(None).await;
        }

        let (chunk_tx, mut chunk_rx) = mpsc::channel::<String>(CHUNK_BUFFER);
        let forward_tx = events_tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(content) = chunk_rx.recv().await {
                let _ = forward_tx
                    .send(Event::StageChunk {
                        project_id,
                        stage,
                        content,
                    })
                    .await;
            }
        });

        // The call owns the only sender, so the forwarder ends with it.
        let result = call(Some(chunk_tx)).await;
        let _ = forwarder.await;
        result
    }

    /// Turn a stage failure into a failed project.
    async fn settle<T>(
        &self,
        project: &mut Project,
        events_tx: &Sender<Event>,
        stage: Stage,
        result: Result<T, GatewayError>,
    ) -> EngineResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(source) => {
                tracing::error!(project_id = %project.id, %stage, error = %source, "stage failed");
                fail_project(project, events_tx, stage, &source).await;
                Err(EngineError::stage(stage, source))
            }
        }
    }

    async fn save_snapshot(&self, project: &Project) {
        let Some(store) = &self.history else {
            return;
        };
        if let Err(e) = store.save(HistoryItem::snapshot(project)).await {
            tracing::warn!(project_id = %project.id, error = %e, "failed to save history snapshot");
        }
    }
}
