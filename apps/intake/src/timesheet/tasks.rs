use std::str::FromStr;

use serde::Serialize;

use crate::models::timesheet::{Task, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(TaskStatus),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Only(TaskStatus::Pending)),
            "complete" => Ok(StatusFilter::Only(TaskStatus::Complete)),
            "overdue" => Ok(StatusFilter::Only(TaskStatus::Overdue)),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub status: TaskStatus,
    pub count: usize,
    /// Rounded share of all of the organization's tasks.
    pub percent: u32,
}

pub fn tasks_for_org(tasks: Vec<Task>, org_id: i64) -> Vec<Task> {
    tasks.into_iter().filter(|t| t.org_id == org_id).collect()
}

pub fn filter_tasks(tasks: &[Task], filter: StatusFilter) -> Vec<Task> {
    match filter {
        StatusFilter::All => tasks.to_vec(),
        StatusFilter::Only(status) => tasks.iter().filter(|t| t.status == status).cloned().collect(),
    }
}

/// Count and percentage for each tracked status. Empty input gives zeros.
pub fn tally(tasks: &[Task]) -> Vec<StatusTally> {
    TaskStatus::TRACKED
        .iter()
        .map(|&status| {
            let count = tasks.iter().filter(|t| t.status == status).count();
            let percent = if tasks.is_empty() {
                0
            } else {
                (count as f64 * 100.0 / tasks.len() as f64).round() as u32
            };
            StatusTally {
                status,
                count,
                percent,
            }
        })
        .collect()
}
