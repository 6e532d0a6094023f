//! Domain aggregates exposed by the back-office service layer.

pub mod appointment;
pub mod attachment;
pub mod care_plan;
pub mod client;
pub mod document;
pub mod export;
pub mod note;
pub mod reference;
pub mod resource;
pub mod shift_note;
pub mod types;
