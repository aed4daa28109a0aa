//! Candidate intake service: the multi-step candidate wizard with draft
//! autosave/resume, its REST-backend collaborators, and the organization
//! timesheet views.

pub mod backend;
pub mod config;
pub mod drafts;
pub mod errors;
pub mod models;
pub mod routes;
pub mod state;
pub mod timesheet;
pub mod wizard;

#[cfg(test)]
pub(crate) mod testing;
