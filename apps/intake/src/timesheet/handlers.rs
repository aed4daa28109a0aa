use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::timesheet::{LoginLog, Task, TaskStatus};
use crate::state::AppState;
use crate::timesheet::calendar::{can_hover, is_today, log_for_day, MonthCursor, WEEKDAYS};
use crate::timesheet::tasks::{filter_tasks, tally, tasks_for_org, StatusFilter, StatusTally};

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// One of `prev_month`, `next_month`, `prev_year`, `next_year`.
    pub nav: Option<String>,
}

#[derive(Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub can_hover: bool,
}

#[derive(Serialize)]
pub struct CalendarResponse {
    pub cursor: MonthCursor,
    pub month_name: &'static str,
    pub weekdays: [&'static str; 7],
    /// `null` cells pad the first week.
    pub cells: Vec<Option<DayCell>>,
}

#[derive(Serialize)]
pub struct DayLogResponse {
    pub date: NaiveDate,
    pub log: Option<LoginLog>,
}

#[derive(Deserialize)]
pub struct TaskQuery {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct TaskSummaryResponse {
    pub org_id: i64,
    pub total: usize,
    pub tasks: Vec<Task>,
    pub tallies: Vec<StatusTally>,
}

#[derive(Deserialize)]
pub struct NewTaskRequest {
    pub task_name: String,
    pub assign_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: TaskStatus,
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub id: i64,
    pub status: TaskStatus,
}

/// New tasks always start out pending.
fn new_task(org_id: i64, req: NewTaskRequest) -> Result<Task, AppError> {
    let task_name = req.task_name.trim();
    if task_name.is_empty() {
        return Err(AppError::BadRequest("task_name is required".into()));
    }
    if req.end_date < req.assign_date {
        return Err(AppError::BadRequest(
            "end_date must not be before assign_date".into(),
        ));
    }
    Ok(Task {
        id: None,
        org_id,
        task_name: task_name.to_string(),
        assign_date: req.assign_date.to_string(),
        end_date: req.end_date.to_string(),
        status: TaskStatus::Pending,
    })
}

fn calendar_for(cursor: MonthCursor, today: NaiveDate) -> CalendarResponse {
    let cells = cursor
        .grid()
        .into_iter()
        .map(|cell| {
            cell.map(|date| DayCell {
                date,
                is_today: is_today(date, today),
                can_hover: can_hover(date, today),
            })
        })
        .collect();

    CalendarResponse {
        cursor,
        month_name: cursor.month_name(),
        weekdays: WEEKDAYS,
        cells,
    }
}

/// GET /api/v1/timesheet/calendar
pub async fn handle_calendar(
    Query(q): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let today = Utc::now().date_naive();
    let mut cursor = MonthCursor::around(today);

    if q.year.is_some() || q.month.is_some() {
        let year = q.year.unwrap_or(cursor.year);
        let month = q.month.unwrap_or(cursor.month);
        cursor = cursor.seek(year, month).ok_or_else(|| {
            AppError::BadRequest(format!(
                "{year}-{month:02} is outside {}..={}",
                cursor.min_year, cursor.max_year
            ))
        })?;
    }

    cursor = match q.nav.as_deref() {
        None => cursor,
        Some("prev_month") => cursor.prev_month(),
        Some("next_month") => cursor.next_month(),
        Some("prev_year") => cursor.prev_year(),
        Some("next_year") => cursor.next_year(),
        Some(other) => return Err(AppError::BadRequest(format!("Unknown navigation '{other}'"))),
    };

    Ok(Json(calendar_for(cursor, today)))
}

/// GET /api/v1/timesheet/:org_id/day/:date
pub async fn handle_day_log(
    State(state): State<AppState>,
    Path((org_id, date)): Path<(i64, NaiveDate)>,
) -> Result<Json<DayLogResponse>, AppError> {
    let today = Utc::now().date_naive();
    if !can_hover(date, today) {
        return Ok(Json(DayLogResponse { date, log: None }));
    }

    let latest = state.timesheet.latest_login(org_id).await?;
    Ok(Json(DayLogResponse {
        date,
        log: log_for_day(latest, date),
    }))
}

/// GET /api/v1/timesheet/:org_id/tasks
pub async fn handle_tasks(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
    Query(q): Query<TaskQuery>,
) -> Result<Json<TaskSummaryResponse>, AppError> {
    let filter: StatusFilter = q
        .status
        .as_deref()
        .unwrap_or("all")
        .parse()
        .map_err(AppError::BadRequest)?;

    let tasks = tasks_for_org(state.timesheet.tasks().await?, org_id);
    let tallies = tally(&tasks);

    Ok(Json(TaskSummaryResponse {
        org_id,
        total: tasks.len(),
        tasks: filter_tasks(&tasks, filter),
        tallies,
    }))
}

/// POST /api/v1/timesheet/:org_id/tasks
pub async fn handle_add_task(
    State(state): State<AppState>,
    Path(org_id): Path<i64>,
    Json(req): Json<NewTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let mut task = new_task(org_id, req)?;
    task.id = state.timesheet.add_task(&task).await?;
    tracing::info!("Task '{}' added for org {}", task.task_name, org_id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/v1/timesheet/tasks/:task_id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    if !req.status.is_tracked() {
        return Err(AppError::BadRequest(
            "status must be one of pending, complete, overdue".into(),
        ));
    }
    state.timesheet.update_status(task_id, req.status).await?;
    Ok(Json(StatusUpdateResponse {
        id: task_id,
        status: req.status,
    }))
}
