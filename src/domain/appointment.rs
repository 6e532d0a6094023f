//! Appointments with optional recurrence and caregiver assignment.

use std::fmt::Display;

use chrono::{NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::document::Document;
use crate::domain::types::{
    AppointmentId, CarePlanId, CaregiverId, ClientId, HubId, ReferenceId, Title,
    TypeConstraintError,
};

/// Scheduled window of an appointment. `end` is strictly after `start`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Schedule {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Schedule {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TypeConstraintError> {
        if end <= start {
            return Err(TypeConstraintError::InvalidValue(
                "end must be after start".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Length of the window in whole minutes.
    pub fn minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
}

impl Display for RecurrenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecurrenceType::Daily => write!(f, "Daily"),
            RecurrenceType::Weekly => write!(f, "Weekly"),
            RecurrenceType::Monthly => write!(f, "Monthly"),
        }
    }
}

impl TryFrom<&str> for RecurrenceType {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Daily" => Ok(RecurrenceType::Daily),
            "Weekly" => Ok(RecurrenceType::Weekly),
            "Monthly" => Ok(RecurrenceType::Monthly),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown recurrence type `{other}`"
            ))),
        }
    }
}

/// Recurrence rule attached to an appointment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrentWork {
    pub recurrence_type: RecurrenceType,
    /// Day of week, required for weekly recurrence.
    pub day: Option<Weekday>,
    /// Repeat every `frequency` units of `recurrence_type`.
    pub frequency: u32,
    /// Number of occurrences including the first one.
    pub occurrence_limit: u32,
}

impl RecurrentWork {
    pub fn new(
        recurrence_type: RecurrenceType,
        day: Option<Weekday>,
        frequency: u32,
        occurrence_limit: u32,
    ) -> Result<Self, TypeConstraintError> {
        if frequency == 0 || occurrence_limit == 0 {
            return Err(TypeConstraintError::InvalidValue(
                "frequency and occurrence limit must be positive".to_string(),
            ));
        }
        if recurrence_type == RecurrenceType::Weekly && day.is_none() {
            return Err(TypeConstraintError::InvalidValue(
                "weekly recurrence needs a day".to_string(),
            ));
        }
        Ok(Self {
            recurrence_type,
            day,
            frequency,
            occurrence_limit,
        })
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum BroadcastType {
    /// Offer the job to every caregiver in the hub.
    All,
    /// Offer the job to the listed caregivers only.
    #[default]
    Selected,
}

/// Caregiver assignment for an appointment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobAssigns {
    pub caregiver_ids: Vec<CaregiverId>,
    pub assigner_id: CaregiverId,
    pub broadcast_type: BroadcastType,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub hub_id: HubId,
    pub client_id: ClientId,
    pub care_plan_id: Option<CarePlanId>,
    pub appointment_type_id: Option<ReferenceId>,
    pub title: Title,
    pub schedule: Schedule,
    pub address: Option<String>,
    pub recurrence: Option<RecurrentWork>,
    pub job_assigns: Option<JobAssigns>,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable content of an appointment, shared by create and update.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct AppointmentContent {
    pub client_id: ClientId,
    pub care_plan_id: Option<CarePlanId>,
    pub appointment_type_id: Option<ReferenceId>,
    pub title: Title,
    pub schedule: Schedule,
    pub address: Option<String>,
    pub recurrence: Option<RecurrentWork>,
    pub job_assigns: Option<JobAssigns>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn schedule_requires_end_after_start() {
        assert!(Schedule::new(at(9), at(9)).is_err());
        assert_eq!(Schedule::new(at(9), at(17)).unwrap().minutes(), 480);
    }

    #[test]
    fn weekly_recurrence_requires_day() {
        assert!(RecurrentWork::new(RecurrenceType::Weekly, None, 1, 4).is_err());
        assert!(RecurrentWork::new(RecurrenceType::Weekly, Some(Weekday::Tue), 1, 4).is_ok());
        assert!(RecurrentWork::new(RecurrenceType::Daily, None, 0, 4).is_err());
    }
}
