use serde::{Deserialize, Serialize};

use super::{de_id, de_opt_id};

/// A login/logout entry from the organization calendar log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginLog {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub calendar_id: Option<i64>,
    #[serde(deserialize_with = "de_id")]
    pub org_id: i64,
    pub login_time: String,
    #[serde(default)]
    pub logout_time: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Complete,
    Overdue,
    #[serde(other)]
    Other,
}

impl TaskStatus {
    pub const TRACKED: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::Complete, TaskStatus::Overdue];

    pub fn is_tracked(self) -> bool {
        Self::TRACKED.contains(&self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(
        default,
        deserialize_with = "de_opt_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    #[serde(deserialize_with = "de_id")]
    pub org_id: i64,
    pub task_name: String,
    pub assign_date: String,
    pub end_date: String,
    pub status: TaskStatus,
}

/// Ids the backend hands back from task creation and calendar-log login.
/// Either may be missing; bodies of another shape read as empty.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WriteReceipt {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub calendar_id: Option<i64>,
}

impl WriteReceipt {
    pub fn from_body(body: serde_json::Value) -> Self {
        serde_json::from_value(body).unwrap_or_default()
    }
}
