use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::appointment::Schedule;
use crate::domain::shift_note::RecordedWindow;
use crate::domain::types::{
    AppointmentId, CaregiverId, ClientId, DocumentId, RichText, ShiftNoteId,
};
use crate::forms::{
    date_and_time, derived_errors, field_error, finish, optional_date_time, parse_id,
    parse_optional_id, removed_documents,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for recording a caregiver shift note.
pub struct ShiftNoteForm {
    pub client_id: i32,
    pub caregiver_id: i32,
    pub appointment_id: Option<i32>,
    /// Selected existing note. Its shift window is reused when set.
    pub existing_note_id: Option<i32>,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub note: String,
    pub shift_start_date: Option<String>,
    pub shift_start_time: Option<String>,
    pub shift_end_date: Option<String>,
    pub shift_end_time: Option<String>,
    pub clock_in: Option<String>,
    pub clock_out: Option<String>,
    #[serde(default)]
    pub removed_document_ids: Vec<i32>,
}

/// Validated shift note input.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftNotePayload {
    pub existing_note_id: Option<ShiftNoteId>,
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub appointment_id: Option<AppointmentId>,
    pub note: RichText,
    /// Absent only when an existing note was selected and no window given.
    pub schedule: Option<Schedule>,
    pub recorded: RecordedWindow,
    pub removed_document_ids: Vec<DocumentId>,
}

fn any_present(values: &[&Option<String>]) -> bool {
    values
        .iter()
        .any(|value| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
}

impl ShiftNoteForm {
    fn shift_window(&self, errors: &mut ValidationErrors) -> Option<Schedule> {
        let window_fields = [
            &self.shift_start_date,
            &self.shift_start_time,
            &self.shift_end_date,
            &self.shift_end_time,
        ];
        // With an existing note the window is optional but must be complete if touched.
        if self.existing_note_id.is_some() && !any_present(&window_fields) {
            return None;
        }

        let start = date_and_time(
            errors,
            "shift_start_date",
            self.shift_start_date.as_deref(),
            "shift_start_time",
            self.shift_start_time.as_deref(),
        );
        let end = date_and_time(
            errors,
            "shift_end_date",
            self.shift_end_date.as_deref(),
            "shift_end_time",
            self.shift_end_time.as_deref(),
        );
        Schedule::new(start?, end?)
            .map_err(|_| {
                errors.add(
                    "shift_end_time",
                    field_error("range", "Shift must end after it starts"),
                )
            })
            .ok()
    }

    fn recorded(&self, errors: &mut ValidationErrors) -> RecordedWindow {
        RecordedWindow {
            clock_in: optional_date_time(errors, "clock_in", self.clock_in.as_deref()),
            clock_out: optional_date_time(errors, "clock_out", self.clock_out.as_deref()),
        }
    }
}

impl TryFrom<&ShiftNoteForm> for ShiftNotePayload {
    type Error = ValidationErrors;

    fn try_from(form: &ShiftNoteForm) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(form.validate());

        let existing_note_id =
            parse_optional_id(&mut errors, "existing_note_id", form.existing_note_id);
        let client_id: Option<ClientId> = parse_id(&mut errors, "client_id", form.client_id);
        let caregiver_id: Option<CaregiverId> =
            parse_id(&mut errors, "caregiver_id", form.caregiver_id);
        let appointment_id = parse_optional_id(&mut errors, "appointment_id", form.appointment_id);
        let schedule = form.shift_window(&mut errors);
        let recorded = form.recorded(&mut errors);
        let removed_document_ids = removed_documents(&mut errors, &form.removed_document_ids);

        finish(errors)?;

        match (client_id, caregiver_id) {
            (Some(client_id), Some(caregiver_id)) => Ok(Self {
                existing_note_id,
                client_id,
                caregiver_id,
                appointment_id,
                note: RichText::new(&form.note),
                schedule,
                recorded,
                removed_document_ids,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ShiftNoteForm {
        ShiftNoteForm {
            client_id: 2,
            caregiver_id: 5,
            note: "<p>Helped with lunch</p><script>x()</script>".to_string(),
            shift_start_date: Some("2024-04-02".to_string()),
            shift_start_time: Some("09:00".to_string()),
            shift_end_date: Some("2024-04-02".to_string()),
            shift_end_time: Some("13:15".to_string()),
            ..ShiftNoteForm::default()
        }
    }

    #[test]
    fn new_note_with_full_window_passes() {
        let payload = ShiftNotePayload::try_from(&form()).unwrap();
        assert_eq!(payload.schedule.unwrap().minutes(), 255);
        assert_eq!(payload.note.as_str(), "<p>Helped with lunch</p>");
        assert!(payload.existing_note_id.is_none());
    }

    #[test]
    fn omitting_any_window_field_is_a_required_error() {
        type Clear = fn(&mut ShiftNoteForm);
        let cases: [(&str, Clear); 4] = [
            ("shift_start_date", |f| f.shift_start_date = None),
            ("shift_start_time", |f| f.shift_start_time = None),
            ("shift_end_date", |f| f.shift_end_date = None),
            ("shift_end_time", |f| f.shift_end_time = Some(" ".to_string())),
        ];
        for (field, clear) in cases {
            let mut form = form();
            clear(&mut form);
            let errors = ShiftNotePayload::try_from(&form).unwrap_err();
            let field_errors = errors.field_errors();
            let reported = field_errors.get(field).expect(field);
            assert_eq!(reported[0].code, "required");
            assert_eq!(field_errors.len(), 1, "only {field} should fail");
        }
    }

    #[test]
    fn existing_note_makes_window_optional() {
        let form = ShiftNoteForm {
            existing_note_id: Some(11),
            shift_start_date: None,
            shift_start_time: None,
            shift_end_date: None,
            shift_end_time: None,
            ..form()
        };
        let payload = ShiftNotePayload::try_from(&form).unwrap();
        assert!(payload.schedule.is_none());
        assert_eq!(payload.existing_note_id.map(|id| id.get()), Some(11));
    }

    #[test]
    fn recorded_clock_times_are_parsed() {
        let with_clock = ShiftNoteForm {
            clock_in: Some("2024-04-02T09:05".to_string()),
            clock_out: Some("2024-04-02T13:00".to_string()),
            ..form()
        };
        let payload = ShiftNotePayload::try_from(&with_clock).unwrap();
        assert!(payload.recorded.clock_in.is_some());

        let bad = ShiftNoteForm {
            clock_in: Some("09:05".to_string()),
            ..form()
        };
        let errors = ShiftNotePayload::try_from(&bad).unwrap_err();
        assert!(errors.errors().contains_key("clock_in"));
    }
}
