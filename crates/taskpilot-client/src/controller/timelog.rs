//! Time log operations within one day plan.

use std::sync::Mutex;

use chrono::NaiveDate;
use tokio::sync::watch;

use taskpilot_auth::SessionAuthorizer;
use taskpilot_core::result::AppResult;
use taskpilot_core::types::{DayPlan, DayPlanRequest, NewTimeLog, TimeLog};

use super::{ControllerCore, ResourceState, upsert};
use crate::dispatcher::RequestDispatcher;

/// Keeps the time logs of the currently loaded day.
#[derive(Debug)]
pub struct TimeLogController {
    core: ControllerCore<TimeLog>,
    /// Plan whose time logs are held in the state.
    current: Mutex<Option<(i64, NaiveDate)>>,
}

impl TimeLogController {
    pub fn new(
        dispatcher: RequestDispatcher,
        authorizer: SessionAuthorizer,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            core: ControllerCore::new(dispatcher, authorizer, login_route),
            current: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ResourceState<TimeLog> {
        self.core.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<TimeLog>> {
        self.core.subscribe()
    }

    /// Identifier and date of the loaded plan, if any.
    pub fn current_plan(&self) -> Option<(i64, NaiveDate)> {
        self.current.lock().ok().and_then(|current| *current)
    }

    /// Switches to the plan of `date` and replaces the held time logs.
    pub async fn load_day(&self, date: NaiveDate) -> AppResult<DayPlan> {
        self.core.authorize("loading time logs").await?;
        let result = self
            .core
            .dispatcher
            .post::<_, DayPlan>("plans/", &DayPlanRequest { date })
            .await;
        let plan = self.core.settle("load_day", result)?;

        if let Ok(mut current) = self.current.lock() {
            *current = Some((plan.id, plan.date));
        }
        let times = plan.times.clone();
        self.core.update(|s| s.items = times);
        Ok(plan)
    }

    /// Schedules a block of time for a task.
    pub async fn create(&self, log: &NewTimeLog) -> AppResult<TimeLog> {
        log.validate().map_err(|e| self.core.reject(e))?;
        self.core.authorize("adding a time log").await?;
        let result = self
            .core
            .dispatcher
            .post::<_, TimeLog>("plans/timelog", log)
            .await;
        let created = self.core.settle("create_timelog", result)?;

        if self.holds_plan(created.plan_id) {
            let stored = created.clone();
            let id = created.id;
            self.core
                .update(|s| upsert(&mut s.items, stored, |t| t.id == id));
        }
        Ok(created)
    }

    /// Removes a time log once the backend confirms.
    pub async fn delete(&self, id: i64) -> AppResult<TimeLog> {
        self.core.authorize("deleting a time log").await?;
        let result = self
            .core
            .dispatcher
            .delete::<TimeLog>(&format!("plans/timelog/{id}"))
            .await;
        let deleted = self.core.settle("delete_timelog", result)?;
        self.core.update(|s| s.items.retain(|t| t.id != id));
        Ok(deleted)
    }

    fn holds_plan(&self, plan_id: i64) -> bool {
        self.current_plan()
            .is_some_and(|(current, _)| current == plan_id)
    }
}
