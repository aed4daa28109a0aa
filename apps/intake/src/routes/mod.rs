pub mod health;
pub mod modules;
pub mod profiles;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::state::AppState;
use crate::timesheet::handlers as timesheet;
use crate::wizard::handlers as wizard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate wizard
        .route("/api/v1/wizard/sessions", post(wizard::handle_mount))
        .route(
            "/api/v1/wizard/sessions/:id",
            get(wizard::handle_view).delete(wizard::handle_close),
        )
        .route(
            "/api/v1/wizard/sessions/:id/basic",
            patch(wizard::handle_edit_basic),
        )
        .route(
            "/api/v1/wizard/sessions/:id/address",
            patch(wizard::handle_edit_address),
        )
        .route(
            "/api/v1/wizard/sessions/:id/country",
            post(wizard::handle_select_country),
        )
        .route(
            "/api/v1/wizard/sessions/:id/state",
            post(wizard::handle_select_state),
        )
        .route("/api/v1/wizard/sessions/:id/next", post(wizard::handle_next))
        .route("/api/v1/wizard/sessions/:id/back", post(wizard::handle_back))
        .route(
            "/api/v1/wizard/sessions/:id/step/:n",
            post(wizard::handle_set_step),
        )
        .route(
            "/api/v1/wizard/sessions/:id/image",
            post(wizard::handle_stage_image),
        )
        .route(
            "/api/v1/wizard/sessions/:id/submit",
            post(wizard::handle_submit),
        )
        // Profile auth session
        .route(
            "/api/v1/profiles/:profile/auth",
            put(profiles::handle_put_auth).delete(profiles::handle_logout),
        )
        // Organization sidebar
        .route(
            "/api/v1/orgs/:org_id/modules",
            get(modules::handle_list_modules),
        )
        // Timesheet
        .route(
            "/api/v1/timesheet/calendar",
            get(timesheet::handle_calendar),
        )
        .route(
            "/api/v1/timesheet/tasks/:task_id/status",
            put(timesheet::handle_update_status),
        )
        .route(
            "/api/v1/timesheet/:org_id/day/:date",
            get(timesheet::handle_day_log),
        )
        .route(
            "/api/v1/timesheet/:org_id/tasks",
            get(timesheet::handle_tasks).post(timesheet::handle_add_task),
        )
        .with_state(state)
}
