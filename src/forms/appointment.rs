//! Appointment form, edited as a four step wizard.
//!
//! Steps: schedule, location & attachments, recurrence, job assignment.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::appointment::{
    AppointmentContent, BroadcastType, JobAssigns, RecurrenceType, RecurrentWork, Schedule,
};
use crate::domain::types::{CaregiverId, ClientId, DocumentId, Title};
use crate::forms::{
    date_and_time, derived_errors, field_error, finish, parse_id, parse_optional_id,
    removed_documents, required,
};
use crate::wizard::WizardForm;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for creating or updating an appointment.
pub struct AppointmentForm {
    pub client_id: i32,
    pub care_plan_id: Option<i32>,
    pub appointment_type_id: Option<i32>,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub end_date: Option<String>,
    pub end_time: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Turns the recurrence fields on.
    #[serde(default)]
    pub recurrence_state: bool,
    pub recurrence_type: Option<String>,
    /// Weekday name, used by weekly recurrence.
    pub recurrence_day: Option<String>,
    pub frequency: Option<u32>,
    pub occurrence_limit: Option<u32>,
    #[serde(default)]
    pub caregiver_ids: Vec<i32>,
    pub assigner_id: Option<i32>,
    pub broadcast_type: Option<BroadcastType>,
    #[serde(default)]
    pub removed_document_ids: Vec<i32>,
}

/// Validated appointment plus attachment removals.
#[derive(Debug, Clone, PartialEq)]
pub struct AppointmentPayload {
    pub content: AppointmentContent,
    pub removed_document_ids: Vec<DocumentId>,
}

impl AppointmentForm {
    fn schedule(&self, errors: &mut ValidationErrors) -> Option<Schedule> {
        let start = date_and_time(
            errors,
            "start_date",
            self.start_date.as_deref(),
            "start_time",
            self.start_time.as_deref(),
        );
        let end = date_and_time(
            errors,
            "end_date",
            self.end_date.as_deref(),
            "end_time",
            self.end_time.as_deref(),
        );
        let (start, end) = (start?, end?);
        Schedule::new(start, end)
            .map_err(|_| {
                errors.add(
                    "end_time",
                    field_error("range", "Appointment must end after it starts"),
                )
            })
            .ok()
    }

    /// Recurrence fields are only checked while recurrence is switched on.
    fn recurrence(&self, errors: &mut ValidationErrors) -> Option<RecurrentWork> {
        if !self.recurrence_state {
            return None;
        }

        let recurrence_type = required(errors, "recurrence_type", self.recurrence_type.as_deref())
            .and_then(|value| {
                RecurrenceType::try_from(value)
                    .map_err(|_| {
                        errors.add(
                            "recurrence_type",
                            field_error("choice", "Choose Daily, Weekly or Monthly"),
                        )
                    })
                    .ok()
            });

        let frequency = positive(errors, "frequency", self.frequency);
        let occurrence_limit = positive(errors, "occurrence_limit", self.occurrence_limit);

        let day = match recurrence_type {
            Some(RecurrenceType::Weekly) => {
                let day = required(errors, "recurrence_day", self.recurrence_day.as_deref())
                    .and_then(|value| {
                        value
                            .parse::<Weekday>()
                            .map_err(|_| {
                                errors.add(
                                    "recurrence_day",
                                    field_error("choice", "Unknown day of week"),
                                )
                            })
                            .ok()
                    });
                Some(day?)
            }
            _ => None,
        };

        RecurrentWork::new(recurrence_type?, day, frequency?, occurrence_limit?).ok()
    }

    fn job_assigns(&self, errors: &mut ValidationErrors) -> Option<JobAssigns> {
        let caregiver_ids: Vec<CaregiverId> = self
            .caregiver_ids
            .iter()
            .filter_map(|&id| parse_id(errors, "caregiver_ids", id))
            .collect();
        let broadcast_type = self.broadcast_type.unwrap_or_default();

        match self.assigner_id {
            Some(raw) => {
                let assigner_id = parse_id(errors, "assigner_id", raw)?;
                if broadcast_type == BroadcastType::Selected && caregiver_ids.is_empty() {
                    errors.add(
                        "caregiver_ids",
                        field_error("required", "Select at least one caregiver"),
                    );
                    return None;
                }
                Some(JobAssigns {
                    caregiver_ids,
                    assigner_id,
                    broadcast_type,
                })
            }
            None if !caregiver_ids.is_empty() => {
                errors.add(
                    "assigner_id",
                    field_error("required", "Assigner is required"),
                );
                None
            }
            None => None,
        }
    }
}

fn positive(errors: &mut ValidationErrors, field: &'static str, value: Option<u32>) -> Option<u32> {
    match value {
        Some(value) if value > 0 => Some(value),
        Some(_) => {
            errors.add(field, field_error("range", "Must be at least 1"));
            None
        }
        None => {
            errors.add(field, field_error("required", "This field is required"));
            None
        }
    }
}

impl WizardForm for AppointmentForm {
    type Output = AppointmentPayload;
    const STEP_COUNT: usize = 4;

    fn step_of_field(field: &str) -> usize {
        match field {
            "address" | "removed_document_ids" => 1,
            "recurrence_type" | "recurrence_day" | "frequency" | "occurrence_limit" => 2,
            "caregiver_ids" | "assigner_id" | "broadcast_type" => 3,
            _ => 0,
        }
    }

    fn submit(&self) -> Result<AppointmentPayload, ValidationErrors> {
        let mut errors = derived_errors(self.validate());

        let client_id: Option<ClientId> = parse_id(&mut errors, "client_id", self.client_id);
        let care_plan_id = parse_optional_id(&mut errors, "care_plan_id", self.care_plan_id);
        let appointment_type_id =
            parse_optional_id(&mut errors, "appointment_type_id", self.appointment_type_id);
        let title = Title::new(self.title.as_str())
            .map_err(|_| errors.add("title", field_error("required", "Title is required")))
            .ok();
        let schedule = self.schedule(&mut errors);
        let recurrence = self.recurrence(&mut errors);
        let job_assigns = self.job_assigns(&mut errors);
        let removed_document_ids = removed_documents(&mut errors, &self.removed_document_ids);

        finish(errors)?;

        match (client_id, title, schedule) {
            (Some(client_id), Some(title), Some(schedule)) => Ok(AppointmentPayload {
                content: AppointmentContent {
                    client_id,
                    care_plan_id,
                    appointment_type_id,
                    title,
                    schedule,
                    address: self
                        .address
                        .as_deref()
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                    recurrence,
                    job_assigns,
                },
                removed_document_ids,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}
