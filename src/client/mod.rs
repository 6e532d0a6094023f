//! Dashboard data layer: a typed API client plus per-entity slices.

pub mod api;
pub mod status;
pub mod store;
pub mod timesheets;

pub use api::{ApiClient, ApiError};
pub use status::RequestStatus;
pub use store::{Notification, NotificationLevel, Slice, Store};
pub use timesheets::TimesheetFeed;
