//! Form definitions backing the back-office routes.
//!
//! Forms keep raw user input (dates as text, ids as integers) so that every
//! problem can be reported against the field it came from. Conversion into
//! domain payloads happens in each form's `submit`/`TryFrom` implementation.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::domain::types::TypeConstraintError;

pub mod appointment;
pub mod care_plan;
pub mod client;
pub mod note;
pub mod reference;
pub mod resource;
pub mod shift_note;
pub mod timesheet;
#[cfg(feature = "server")]
pub mod upload;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid id")]
    InvalidId,

    #[error("invalid name")]
    InvalidName,

    #[error("confirmation text does not match")]
    NotConfirmed,
}

impl From<TypeConstraintError> for FormError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::NonPositiveId => FormError::InvalidId,
            TypeConstraintError::EmptyString => FormError::InvalidName,
            other => FormError::InvalidPayload(other.to_string()),
        }
    }
}

/// Builds a field error with a human readable message.
pub(crate) fn field_error(code: &'static str, message: impl Into<String>) -> ValidationError {
    let message: String = message.into();
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Returns the trimmed value, recording a `required` error when blank.
pub(crate) fn required<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            errors.add(field, field_error("required", "This field is required"));
            None
        }
    }
}

pub(crate) fn parse_date(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| errors.add(field, field_error("date", "Expected a YYYY-MM-DD date")))
        .ok()
}

pub(crate) fn parse_time(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| errors.add(field, field_error("time", "Expected an HH:MM time")))
        .ok()
}

pub(crate) fn parse_date_time(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|_| {
            errors.add(
                field,
                field_error("datetime", "Expected a YYYY-MM-DDTHH:MM timestamp"),
            )
        })
        .ok()
}

/// Combines a required date field and a required time field.
///
/// Both fields are checked so each missing part gets its own error.
pub(crate) fn date_and_time(
    errors: &mut ValidationErrors,
    date_field: &'static str,
    date: Option<&str>,
    time_field: &'static str,
    time: Option<&str>,
) -> Option<NaiveDateTime> {
    let date = required(errors, date_field, date).and_then(|v| parse_date(errors, date_field, v));
    let time = required(errors, time_field, time).and_then(|v| parse_time(errors, time_field, v));
    Some(date?.and_time(time?))
}

/// Parses an optional `YYYY-MM-DDTHH:MM` value, treating blank input as absent.
pub(crate) fn optional_date_time(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<NaiveDateTime> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| parse_date_time(errors, field, v))
}

/// Converts raw document ids staged for removal.
pub(crate) fn removed_documents(
    errors: &mut ValidationErrors,
    raw: &[i32],
) -> Vec<crate::domain::types::DocumentId> {
    raw.iter()
        .filter_map(|&id| parse_id(errors, "removed_document_ids", id))
        .collect()
}

/// Parses an optional date, treating blank input as absent.
pub(crate) fn optional_date(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<NaiveDate> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| parse_date(errors, field, v))
}

/// Converts a raw id, recording an error against `field` when non-positive.
pub(crate) fn parse_id<T>(errors: &mut ValidationErrors, field: &'static str, raw: i32) -> Option<T>
where
    T: TryFrom<i32, Error = TypeConstraintError>,
{
    T::try_from(raw)
        .map_err(|_| errors.add(field, field_error("id", "Must be a positive id")))
        .ok()
}

pub(crate) fn parse_optional_id<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<i32>,
) -> Option<T>
where
    T: TryFrom<i32, Error = TypeConstraintError>,
{
    raw.and_then(|raw| parse_id(errors, field, raw))
}

/// Starts from the derive-generated errors so conditional rules can add to them.
pub(crate) fn derived_errors(derived: Result<(), ValidationErrors>) -> ValidationErrors {
    derived.err().unwrap_or_else(ValidationErrors::new)
}

pub(crate) fn finish(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank_values() {
        let mut errors = ValidationErrors::new();
        assert_eq!(required(&mut errors, "a", Some("  x ")), Some("x"));
        assert_eq!(required(&mut errors, "b", Some("   ")), None);
        assert_eq!(required(&mut errors, "c", None), None);
        assert!(!errors.errors().contains_key("a"));
        assert!(errors.errors().contains_key("b"));
        assert!(errors.errors().contains_key("c"));
    }

    #[test]
    fn parsers_record_field_errors() {
        let mut errors = ValidationErrors::new();
        assert!(parse_date(&mut errors, "day", "2024-02-30").is_none());
        assert!(parse_time(&mut errors, "at", "9am").is_none());
        assert!(parse_time(&mut errors, "ok", "09:00").is_some());
        assert!(errors.errors().contains_key("day"));
        assert!(errors.errors().contains_key("at"));
        assert!(!errors.errors().contains_key("ok"));
    }

    #[test]
    fn date_and_time_reports_each_missing_part() {
        let mut errors = ValidationErrors::new();
        let value = date_and_time(&mut errors, "start_date", None, "start_time", Some("09:30"));
        assert!(value.is_none());
        assert!(errors.errors().contains_key("start_date"));
        assert!(!errors.errors().contains_key("start_time"));

        let mut errors = ValidationErrors::new();
        let value = date_and_time(
            &mut errors,
            "start_date",
            Some("2024-05-01"),
            "start_time",
            Some("09:30"),
        )
        .unwrap();
        assert_eq!(value.to_string(), "2024-05-01 09:30:00");
        assert!(errors.is_empty());
    }
}
