//! Organization timesheet: the login calendar and task status summary.

pub mod calendar;
pub mod handlers;
pub mod tasks;
