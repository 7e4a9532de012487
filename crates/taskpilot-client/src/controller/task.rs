//! Task operations.

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use taskpilot_auth::SessionAuthorizer;
use taskpilot_core::error::AppError;
use taskpilot_core::result::AppResult;
use taskpilot_core::types::{
    AssignRequest, NewTask, Task, TaskProgress, TaskQuery, TaskStatus, TaskUpdate,
};

use super::{ControllerCore, ResourceState, upsert};
use crate::dispatcher::RequestDispatcher;

/// Keeps the task list and drives the `/tasks/` endpoints.
#[derive(Debug)]
pub struct TaskController {
    core: ControllerCore<Task>,
}

impl TaskController {
    /// Creates a controller with an empty task list.
    pub fn new(
        dispatcher: RequestDispatcher,
        authorizer: SessionAuthorizer,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            core: ControllerCore::new(dispatcher, authorizer, login_route),
        }
    }

    /// Current tasks, last error and pending redirect.
    pub fn state(&self) -> ResourceState<Task> {
        self.core.snapshot()
    }

    /// Observes state changes.
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<Task>> {
        self.core.subscribe()
    }

    /// Loads one page of tasks and replaces the local list with it.
    pub async fn fetch_all(&self, query: &TaskQuery) -> AppResult<Vec<Task>> {
        self.core.authorize("listing tasks").await?;
        let result = self
            .core
            .dispatcher
            .get_with_query::<Vec<Task>>("tasks/", &query.to_pairs())
            .await;
        let tasks = self.core.settle("fetch_all", result)?;

        debug!(count = tasks.len(), "Fetched tasks");
        let items = tasks.clone();
        self.core.update(|s| s.items = items);
        Ok(tasks)
    }

    /// Loads one task and refreshes its local copy.
    pub async fn get(&self, id: i64) -> AppResult<Task> {
        self.core.authorize("reading a task").await?;
        let result = self.core.dispatcher.get::<Task>(&format!("tasks/{id}")).await;
        let task = self.core.settle("get", result)?;
        self.store_task(&task);
        Ok(task)
    }

    /// Creates a task and appends the server's copy.
    pub async fn create(&self, task: &NewTask) -> AppResult<Task> {
        task.validate().map_err(|e| self.core.reject(e))?;
        self.core.authorize("creating a task").await?;
        let result = self.core.dispatcher.post::<_, Task>("tasks/", task).await;
        let created = self.core.settle("create", result)?;
        self.store_task(&created);
        Ok(created)
    }

    /// Applies a partial update and replaces the local copy with the result.
    pub async fn update(&self, id: i64, update: &TaskUpdate) -> AppResult<Task> {
        if update.is_empty() {
            return Err(self.core.reject(AppError::validation("Nothing to update")));
        }
        self.core.authorize("updating a task").await?;
        let result = self
            .core
            .dispatcher
            .patch::<_, Task>(&format!("tasks/{id}"), update)
            .await;
        let updated = self.core.settle("update", result)?;
        self.store_task(&updated);
        Ok(updated)
    }

    /// Deletes a task. The local copy goes only once the backend confirms.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.core.authorize("deleting a task").await?;
        let result = self
            .core
            .dispatcher
            .delete::<Value>(&format!("tasks/{id}"))
            .await;
        self.core.settle("delete", result)?;
        self.core.update(|s| s.items.retain(|t| t.id != id));
        Ok(())
    }

    /// Assigns a task to another user by email.
    pub async fn assign(&self, id: i64, assignee_email: &str) -> AppResult<Task> {
        if assignee_email.trim().is_empty() {
            return Err(self
                .core
                .reject(AppError::validation("Assignee email must not be empty")));
        }
        self.core.authorize("assigning a task").await?;
        let request = AssignRequest {
            assignee_email: assignee_email.to_string(),
        };
        let result = self
            .core
            .dispatcher
            .post::<_, Task>(&format!("tasks/assign/{id}"), &request)
            .await;
        let assigned = self.core.settle("assign", result)?;
        self.store_task(&assigned);
        Ok(assigned)
    }

    /// Starts work on a task.
    pub async fn start(&self, id: i64) -> AppResult<Value> {
        self.transition(id, "start", TaskStatus::InProgress).await
    }

    /// Pauses work on a task.
    pub async fn stop(&self, id: i64) -> AppResult<Value> {
        self.transition(id, "stop", TaskStatus::Stopped).await
    }

    /// Progress samples of a task, oldest first as the backend orders them.
    pub async fn progress(&self, id: i64, skip: u32, limit: u32) -> AppResult<Vec<TaskProgress>> {
        self.core.authorize("reading task progress").await?;
        let query = [("skip", skip.to_string()), ("limit", limit.to_string())];
        let result = self
            .core
            .dispatcher
            .get_with_query(&format!("tasks/progress/{id}"), &query)
            .await;
        self.core.settle("progress", result)
    }

    /// Aggregated analytics for a task, passed through as returned.
    pub async fn analytics(&self, id: i64) -> AppResult<Value> {
        self.core.authorize("reading task analytics").await?;
        let result = self
            .core
            .dispatcher
            .get(&format!("tasks/analytics/{id}"))
            .await;
        self.core.settle("analytics", result)
    }

    /// Start and stop apply the new status locally before the call and put
    /// the previous copy back when the backend refuses.
    async fn transition(&self, id: i64, action: &'static str, status: TaskStatus) -> AppResult<Value> {
        self.core.authorize(action).await?;

        let previous = self.core.snapshot().items.into_iter().find(|t| t.id == id);
        if previous.is_some() {
            self.core.update(|s| {
                if let Some(task) = s.items.iter_mut().find(|t| t.id == id) {
                    task.status = status;
                    task.is_stopped = status == TaskStatus::Stopped;
                }
            });
        }

        let result = self
            .core
            .dispatcher
            .post_empty::<Value>(&format!("tasks/{action}/{id}"))
            .await;

        match self.core.settle(action, result) {
            Ok(body) => {
                if let Ok(task) = serde_json::from_value::<Task>(body.clone()) {
                    self.store_task(&task);
                }
                Ok(body)
            }
            Err(e) => {
                if let Some(previous) = previous {
                    debug!(task_id = id, action, "Rolling back optimistic status change");
                    self.core.update(|s| upsert(&mut s.items, previous, |t| t.id == id));
                }
                Err(e)
            }
        }
    }

    fn store_task(&self, task: &Task) {
        let task = task.clone();
        let id = task.id;
        self.core.update(|s| upsert(&mut s.items, task, |t| t.id == id));
    }
}
