//! Project manager: the entry point for starting and modifying projects.
//!
//! The ProjectManager keeps a registry of projects and makes sure only one
//! of them is processing at a time. New prompts and change requests issued
//! while a project is running are rejected rather than queued; an in-flight
//! run is never cancelled.

use crate::engine::{EngineError, EngineResult, PipelineEngine};
use crate::state::project::{create_project, mark_running};
use sf_protocol::ipc::{Event, Op};
use sf_protocol::project_models::{Project, ProjectStatus, Theme};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

/// Holds the busy flag for as long as a run is in progress.
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> EngineResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| EngineError::Busy)?;
        Ok(Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Manages all projects of one session.
#[derive(Clone)]
pub struct ProjectManager {
    /// Registry of projects, indexed by their UUID.
    projects: Arc<Mutex<HashMap<Uuid, Project>>>,

    engine: Arc<PipelineEngine>,

    busy: Arc<AtomicBool>,

    /// Channel for sending events to the front end.
    events_tx: mpsc::Sender<Event>,
}

impl ProjectManager {
    pub fn new(engine: PipelineEngine, events_tx: mpsc::Sender<Event>) -> Self {
        Self {
            projects: Arc::new(Mutex::new(HashMap::new())),
            engine: Arc::new(engine),
            busy: Arc::new(AtomicBool::new(false)),
            events_tx,
        }
    }

    /// True while a run or a modification is in progress.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Add an existing project (e.g. one loaded from disk) to the registry.
    pub async fn register(&self, project: Project) -> Uuid {
        let id = project.id;
        self.projects.lock().await.insert(id, project);
        id
    }

    pub async fn get_project(&self, id: Uuid) -> Option<Project> {
        self.projects.lock().await.get(&id).cloned()
    }

    /// Create a project and run the full pipeline on it, waiting for the
    /// result.
    ///
    /// Whether it succeeds or fails, the final project stays in the registry.
    ///
    /// # Errors
    ///
    /// - [`EngineError::EmptyPrompt`] for a blank prompt
    /// - [`EngineError::Busy`] while another project is processing
    /// - [`EngineError::Stage`] when a stage's gateway call fails
    pub async fn run_project(&self, prompt: &str, theme: Theme) -> EngineResult<Project> {
        let (guard, project) = self.prepare_run(prompt, theme).await?;
        self.execute_run(guard, project).await
    }

    /// Like [`run_project`](Self::run_project) but runs in the background.
    ///
    /// The project id is returned immediately; progress arrives as events.
    pub async fn start_project(&self, prompt: &str, theme: Theme) -> EngineResult<Uuid> {
        let (guard, project) = self.prepare_run(prompt, theme).await?;
        let id = project.id;
        let manager = self.clone();
        tokio::spawn(async move {
            if let Err(e) = manager.execute_run(guard, project).await {
                tracing::error!(project_id = %id, error = %e, "project run failed");
            }
        });
        Ok(id)
    }

    /// Apply a change request to a completed project and wait for the result.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ProjectNotFound`] for an unknown id
    /// - [`EngineError::Busy`] while another project is processing
    /// - [`EngineError::NotModifiable`] unless the project has completed
    /// - [`EngineError::Stage`] when the Modification call fails
    pub async fn modify_project(&self, id: Uuid, request: &str) -> EngineResult<Project> {
        let (guard, project) = self.prepare_modification(id).await?;
        self.execute_modification(guard, project, request).await
    }

    /// Like [`modify_project`](Self::modify_project) but runs in the
    /// background.
    ///
    /// The same rejections are returned before anything is spawned.
    pub async fn start_modification(&self, id: Uuid, request: &str) -> EngineResult<()> {
        let (guard, project) = self.prepare_modification(id).await?;
        let manager = self.clone();
        let request = request.to_string();
        tokio::spawn(async move {
            if let Err(e) = manager.execute_modification(guard, project, &request).await {
                tracing::error!(project_id = %id, error = %e, "modification failed");
            }
        });
        Ok(())
    }

    /// Dispatch an operation from the front end.
    ///
    /// Runs are started in the background; only `GetProject` returns a
    /// project.
    pub async fn handle_op(&self, op: Op) -> EngineResult<Option<Project>> {
        match op {
            Op::StartProject { prompt, theme } => {
                self.start_project(&prompt, theme).await?;
                Ok(None)
            }
            Op::ModifyProject {
                project_id,
                request,
            } => {
                self.start_modification(project_id, &request).await?;
                Ok(None)
            }
            Op::GetProject { project_id } => self
                .get_project(project_id)
                .await
                .map(Some)
                .ok_or(EngineError::ProjectNotFound(project_id)),
            Op::Shutdown => Ok(None),
        }
    }

    async fn prepare_run(&self, prompt: &str, theme: Theme) -> EngineResult<(BusyGuard, Project)> {
        if prompt.trim().is_empty() {
            return Err(EngineError::EmptyPrompt);
        }
        let guard = BusyGuard::acquire(&self.busy)?;
        let mut project = create_project(prompt.trim(), theme);
        // Readers see a processing project from the moment the id is handed out.
        mark_running(&mut project);
        self.register(project.clone()).await;
        Ok((guard, project))
    }

    async fn prepare_modification(&self, id: Uuid) -> EngineResult<(BusyGuard, Project)> {
        let project = self
            .get_project(id)
            .await
            .ok_or(EngineError::ProjectNotFound(id))?;
        if project.status != ProjectStatus::Completed {
            return Err(EngineError::NotModifiable {
                id,
                status: project.status,
            });
        }
        let guard = BusyGuard::acquire(&self.busy)?;
        Ok((guard, project))
    }

    async fn execute_run(&self, guard: BusyGuard, mut project: Project) -> EngineResult<Project> {
        let result = self.engine.run(&mut project, &self.events_tx).await;
        self.register(project.clone()).await;
        drop(guard);
        result.map(|()| project)
    }

    async fn execute_modification(
        &self,
        guard: BusyGuard,
        mut project: Project,
        request: &str,
    ) -> EngineResult<Project> {
        let result = self
            .engine
            .modify(&mut project, request, &self.events_tx)
            .await;
        self.register(project.clone()).await;
        drop(guard);
        result.map(|()| project)
    }
}
