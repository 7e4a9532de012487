//! Day plan operations.

use chrono::NaiveDate;
use tokio::sync::watch;

use taskpilot_auth::SessionAuthorizer;
use taskpilot_core::result::AppResult;
use taskpilot_core::types::{DayPlan, DayPlanRequest};

use super::{ControllerCore, ResourceState, upsert};
use crate::dispatcher::RequestDispatcher;

/// Keeps the day plans loaded so far, one per date.
#[derive(Debug)]
pub struct PlanController {
    core: ControllerCore<DayPlan>,
}

impl PlanController {
    pub fn new(
        dispatcher: RequestDispatcher,
        authorizer: SessionAuthorizer,
        login_route: impl Into<String>,
    ) -> Self {
        Self {
            core: ControllerCore::new(dispatcher, authorizer, login_route),
        }
    }

    pub fn state(&self) -> ResourceState<DayPlan> {
        self.core.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<DayPlan>> {
        self.core.subscribe()
    }

    /// Returns the plan for `date`, creating an empty one server-side if the
    /// day has none yet.
    pub async fn load(&self, date: NaiveDate) -> AppResult<DayPlan> {
        self.core.authorize("loading a day plan").await?;
        let result = self
            .core
            .dispatcher
            .post::<_, DayPlan>("plans/", &DayPlanRequest { date })
            .await;
        let plan = self.core.settle("load_plan", result)?;

        let stored = plan.clone();
        self.core
            .update(|s| upsert(&mut s.items, stored, |p| p.date == date));
        Ok(plan)
    }

    /// Deletes the plan for `date` together with its time logs.
    pub async fn delete(&self, date: NaiveDate) -> AppResult<DayPlan> {
        self.core.authorize("deleting a day plan").await?;
        let result = self
            .core
            .dispatcher
            .delete_with_body::<_, DayPlan>("plans/", &DayPlanRequest { date })
            .await;
        let deleted = self.core.settle("delete_plan", result)?;
        self.core.update(|s| s.items.retain(|p| p.date != date));
        Ok(deleted)
    }
}
