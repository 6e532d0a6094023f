//! Database models mirroring the tables in [`crate::schema`].
//!
//! Rows convert into domain entities through `TryFrom`, re-checking every
//! invariant the domain types enforce. Nested structures (goal trees,
//! recurrence rules, id lists) are stored as JSON text.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::types::TypeConstraintError;

pub mod appointment;
pub mod care_plan;
pub mod client;
#[cfg(feature = "server")]
pub mod config;
pub mod document;
pub mod note;
pub mod reference;
pub mod resource;
pub mod shift_note;

pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TypeConstraintError> {
    serde_json::to_string(value)
        .map_err(|e| TypeConstraintError::InvalidValue(format!("unencodable column: {e}")))
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, TypeConstraintError> {
    serde_json::from_str(raw)
        .map_err(|e| TypeConstraintError::InvalidValue(format!("corrupt column: {e}")))
}

pub(crate) fn decode_optional_json<T: DeserializeOwned>(
    raw: Option<&str>,
) -> Result<Option<T>, TypeConstraintError> {
    raw.map(decode_json).transpose()
}

pub(crate) fn encode_optional_json<T: Serialize>(
    value: Option<&T>,
) -> Result<Option<String>, TypeConstraintError> {
    value.map(encode_json).transpose()
}
