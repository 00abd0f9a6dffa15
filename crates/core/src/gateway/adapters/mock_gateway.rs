//! Scripted gateway for tests and offline demos.

use crate::gateway::base::{GatewayError, GenerateRequest, LlmGateway, TextStream};
use async_trait::async_trait;
use sf_protocol::project_models::Stage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const DEFAULT_CHUNK_CHARS: usize = 24;

/// What the mock answers for a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Reply text. Streaming requests receive it in fixed-size fragments.
    Text(String),
    /// Fail before any output is produced.
    Fail(GatewayError),
    /// Emit the text, then fail mid-stream.
    Interrupted(String, GatewayError),
}

/// Gateway that answers each stage from a script and records every request.
#[derive(Clone)]
pub struct MockGateway {
    replies: HashMap<Stage, MockReply>,
    chunk_chars: usize,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// A mock with no scripted replies.
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            chunk_chars: DEFAULT_CHUNK_CHARS,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_reply(mut self, stage: Stage, text: impl Into<String>) -> Self {
        self.replies.insert(stage, MockReply::Text(text.into()));
        self
    }

    pub fn with_failure(mut self, stage: Stage, error: GatewayError) -> Self {
        self.replies.insert(stage, MockReply::Fail(error));
        self
    }

    pub fn with_interruption(
        mut self,
        stage: Stage,
        partial: impl Into<String>,
        error: GatewayError,
    ) -> Self {
        self.replies
            .insert(stage, MockReply::Interrupted(partial.into(), error));
        self
    }

    /// Fragment size for streaming replies, in characters.
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// A complete, well-formed script for every stage.
    ///
    /// Backs the `mock` provider so the whole pipeline can run offline.
    pub fn demo() -> Self {
        Self::new()
            .with_reply(Stage::Naming, "\"Pocket Planner\"")
            .with_reply(Stage::Requirement, DEMO_REQUIREMENTS)
            .with_reply(Stage::Design, DEMO_DESIGN)
            .with_reply(Stage::Development, DEMO_DEVELOPMENT)
            .with_reply(Stage::Testing, DEMO_TESTING)
            .with_reply(Stage::Modification, DEMO_MODIFICATION)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for one stage.
    pub fn requests_for(&self, stage: Stage) -> Vec<GenerateRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.stage == stage)
            .collect()
    }

    fn fragments(&self, text: &str, stream: bool) -> Vec<String> {
        if !stream {
            return vec![text.to_string()];
        }
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.chunk_chars)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }
}

#[async_trait]
impl LlmGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn execute(&self, request: &GenerateRequest) -> Result<TextStream, GatewayError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let reply = self.replies.get(&request.stage).cloned().ok_or_else(|| {
            GatewayError::Config(format!("no scripted reply for stage {}", request.stage))
        })?;

        let items: Vec<Result<String, GatewayError>> = match reply {
            MockReply::Text(text) => self
                .fragments(&text, request.stream)
                .into_iter()
                .map(Ok)
                .collect(),
            MockReply::Fail(error) => return Err(error),
            MockReply::Interrupted(partial, error) => self
                .fragments(&partial, true)
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(error)))
                .collect(),
        };
        Ok(Box::pin(tokio_stream::iter(items)))
    }
}

const DEMO_REQUIREMENTS: &str = r###"{
  "userStories": [
    "As a user, I want to add a task with a title so that I can track it.",
    "As a user, I want to mark a task as done so that I can see my progress.",
    "As a user, I want to delete a task so that my list stays relevant."
  ],
  "scope": "A single-page task planner with add, complete and delete actions. Tasks live in component state; no backend.",
  "assumptions": ["No authentication", "Data is not persisted between reloads"]
}"###;

const DEMO_DESIGN: &str = r###"{
  "architecture": "## Components\n- `App` owns the task list state\n- `TaskInput` adds tasks\n- `TaskList` renders `TaskItem` rows",
  "wireframes": "## Main view\n```\n[ Pocket Planner          ]\n[ new task...     ] [Add]\n[x] Buy milk          [del]\n[ ] Write report      [del]\n```",
  "apiContracts": "## Local state\n- `addTask(title: string)`\n- `toggleTask(id: string)`\n- `removeTask(id: string)`"
}"###;

const DEMO_DEVELOPMENT: &str = r###"Here is the implementation:
```tsx
import React, { useState } from 'react';
import { Plus, Trash2 } from 'lucide-react';

export default function App() {
  const [tasks, setTasks] = useState<{ id: number; title: string; done: boolean }[]>([]);
  const [title, setTitle] = useState('');

  const addTask = () => {
    if (!title.trim()) return;
    setTasks([...tasks, { id: Date.now(), title: title.trim(), done: false }]);
    setTitle('');
  };

  return (
    <div className="min-h-screen bg-slate-950 text-slate-100 p-8">
      <h1 className="text-3xl font-bold text-cyan-400">Pocket Planner</h1>
      <div className="mt-6 flex gap-2">
        <input className="flex-1 rounded bg-slate-800 px-3 py-2" value={title} onChange={(e) => setTitle(e.target.value)} />
        <button className="rounded bg-indigo-600 px-3" onClick={addTask}><Plus size={16} /></button>
      </div>
      <ul className="mt-4 space-y-2">
        {tasks.map((task) => (
          <li key={task.id} className="flex items-center gap-2">
            <input type="checkbox" checked={task.done} onChange={() => setTasks(tasks.map((t) => (t.id === task.id ? { ...t, done: !t.done } : t)))} />
            <span className={task.done ? 'line-through text-slate-500' : ''}>{task.title}</span>
            <button onClick={() => setTasks(tasks.filter((t) => t.id !== task.id))}><Trash2 size={14} /></button>
          </li>
        ))}
      </ul>
    </div>
  );
}
```"###;

const DEMO_TESTING: &str = r###"{
  "testCases": [
    "Adding a task with a title appends it to the list",
    "Adding an empty title does nothing",
    "Toggling a task strikes it through",
    "Deleting a task removes it"
  ],
  "results": "4/4 simulated cases pass.",
  "bugReports": "None found. Consider persisting tasks to localStorage."
}"###;

const DEMO_MODIFICATION: &str = r###"```tsx
import React, { useState } from 'react';

export default function App() {
  const [tasks, setTasks] = useState<string[]>([]);
  return (
    <div className="min-h-screen bg-slate-950 text-slate-100 p-8">
      <h1 className="text-3xl font-bold text-cyan-400">Pocket Planner</h1>
      <p className="text-slate-400">{tasks.length} tasks</p>
    </div>
  );
}
```"###;
