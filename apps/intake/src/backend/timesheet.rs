use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use super::{BackendError, HttpBackend};
use crate::models::timesheet::{LoginLog, Task, TaskStatus, WriteReceipt};

/// Timesheet backend: organization tasks and the login calendar log.
#[async_trait]
pub trait TimesheetSource: Send + Sync {
    /// All tasks; callers scope them to an organization.
    async fn tasks(&self) -> Result<Vec<Task>, BackendError>;
    /// Creates a task and returns the id the backend assigned, if it said.
    async fn add_task(&self, task: &Task) -> Result<Option<i64>, BackendError>;
    async fn update_status(&self, task_id: i64, status: TaskStatus) -> Result<(), BackendError>;

    /// The most recent login log of an organization, if any.
    async fn latest_login(&self, org_id: i64) -> Result<Option<LoginLog>, BackendError>;
    /// Opens a calendar log entry for a login; returns its `calendar_id`.
    async fn log_login(&self, org_id: i64) -> Result<Option<i64>, BackendError>;
    /// Stamps the logout time on an open calendar log entry.
    async fn log_logout(&self, calendar_id: i64) -> Result<(), BackendError>;
}

pub struct HttpTimesheetSource {
    backend: HttpBackend,
}

impl HttpTimesheetSource {
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl TimesheetSource for HttpTimesheetSource {
    async fn tasks(&self) -> Result<Vec<Task>, BackendError> {
        let tasks: Option<Vec<Task>> = self.backend.get_json("tasks", &[]).await?;
        Ok(tasks.unwrap_or_default())
    }

    async fn add_task(&self, task: &Task) -> Result<Option<i64>, BackendError> {
        let body: Value = self.backend.send_json(Method::POST, "tasks", task).await?;
        Ok(WriteReceipt::from_body(body).id)
    }

    async fn update_status(&self, task_id: i64, status: TaskStatus) -> Result<(), BackendError> {
        let _: Value = self
            .backend
            .send_json(Method::PUT, &format!("tasks/{task_id}"), &json!({ "status": status }))
            .await?;
        Ok(())
    }

    async fn latest_login(&self, org_id: i64) -> Result<Option<LoginLog>, BackendError> {
        let value: Value = self
            .backend
            .get_json(&format!("timesheet/orgLogins/{org_id}"), &[])
            .await?;

        match value {
            Value::Null => Ok(None),
            Value::Object(ref map) if map.is_empty() => Ok(None),
            other => Ok(Some(serde_json::from_value(other)?)),
        }
    }

    async fn log_login(&self, org_id: i64) -> Result<Option<i64>, BackendError> {
        let body: Value = self
            .backend
            .send_json(Method::POST, "calendar-log/store", &json!({ "org_id": org_id }))
            .await?;
        Ok(WriteReceipt::from_body(body).calendar_id)
    }

    async fn log_logout(&self, calendar_id: i64) -> Result<(), BackendError> {
        let _: Value = self
            .backend
            .send_json(
                Method::PUT,
                &format!("calendar-log/logout/{calendar_id}"),
                &json!({}),
            )
            .await?;
        Ok(())
    }
}
