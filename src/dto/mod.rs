//! Query and response shapes shared by services and routes.

pub mod query;
pub mod timesheet;
