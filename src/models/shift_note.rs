use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::appointment::Schedule;
use crate::domain::shift_note::{
    PaymentState, RecordedWindow, ShiftNote as DomainShiftNote, ShiftNoteContent,
};
use crate::domain::types::{
    AppointmentId, CaregiverId, ClientId, HubId, RichText, ShiftNoteId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::shift_notes)]
pub struct ShiftNote {
    pub id: i32,
    pub hub_id: i32,
    pub client_id: i32,
    pub caregiver_id: i32,
    pub appointment_id: Option<i32>,
    pub note: String,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub total_work_minutes: i32,
    pub payment_state: String,
    pub comment: Option<String>,
    pub export_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::shift_notes)]
pub struct NewShiftNote<'a> {
    pub hub_id: i32,
    pub client_id: i32,
    pub caregiver_id: i32,
    pub appointment_id: Option<i32>,
    pub note: &'a str,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub total_work_minutes: i32,
    pub payment_state: String,
}

/// Content update. Payment state and export count have their own paths.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::shift_notes)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateShiftNote<'a> {
    pub client_id: i32,
    pub caregiver_id: i32,
    pub appointment_id: Option<i32>,
    pub note: &'a str,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub total_work_minutes: i32,
    pub updated_at: NaiveDateTime,
}

fn minutes_column(minutes: i64) -> Result<i32, TypeConstraintError> {
    i32::try_from(minutes)
        .map_err(|_| TypeConstraintError::InvalidValue("shift is too long".to_string()))
}

impl TryFrom<ShiftNote> for DomainShiftNote {
    type Error = TypeConstraintError;

    fn try_from(note: ShiftNote) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ShiftNoteId::new(note.id)?,
            hub_id: HubId::new(note.hub_id)?,
            client_id: ClientId::new(note.client_id)?,
            caregiver_id: CaregiverId::new(note.caregiver_id)?,
            appointment_id: note.appointment_id.map(AppointmentId::new).transpose()?,
            // Stored bodies are already sanitized.
            note: RichText::new(note.note),
            schedule: Schedule::new(note.shift_start, note.shift_end)?,
            recorded: RecordedWindow {
                clock_in: note.clock_in,
                clock_out: note.clock_out,
            },
            total_work_minutes: i64::from(note.total_work_minutes),
            payment_state: PaymentState::try_from(note.payment_state.as_str())?,
            comment: note.comment,
            export_count: note.export_count,
            documents: Vec::new(),
            created_at: note.created_at,
            updated_at: note.updated_at,
        })
    }
}

impl<'a> NewShiftNote<'a> {
    /// New timesheets always start as Pending and unexported.
    pub fn from_domain(
        hub_id: HubId,
        content: &'a ShiftNoteContent,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            hub_id: hub_id.get(),
            client_id: content.client_id.get(),
            caregiver_id: content.caregiver_id.get(),
            appointment_id: content.appointment_id.map(AppointmentId::get),
            note: content.note.as_str(),
            shift_start: content.schedule.start(),
            shift_end: content.schedule.end(),
            clock_in: content.recorded.clock_in,
            clock_out: content.recorded.clock_out,
            total_work_minutes: minutes_column(content.total_work_minutes())?,
            payment_state: PaymentState::Pending.to_string(),
        })
    }
}

impl<'a> UpdateShiftNote<'a> {
    pub fn from_domain(
        content: &'a ShiftNoteContent,
        updated_at: NaiveDateTime,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            client_id: content.client_id.get(),
            caregiver_id: content.caregiver_id.get(),
            appointment_id: content.appointment_id.map(AppointmentId::get),
            note: content.note.as_str(),
            shift_start: content.schedule.start(),
            shift_end: content.schedule.end(),
            clock_in: content.recorded.clock_in,
            clock_out: content.recorded.clock_out,
            total_work_minutes: minutes_column(content.total_work_minutes())?,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn unknown_payment_state_is_rejected() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let row = ShiftNote {
            id: 1,
            hub_id: 1,
            client_id: 1,
            caregiver_id: 1,
            appointment_id: None,
            note: String::new(),
            shift_start: at,
            shift_end: at + chrono::Duration::hours(2),
            clock_in: None,
            clock_out: None,
            total_work_minutes: 120,
            payment_state: "Approved".to_string(),
            comment: None,
            export_count: 1,
            created_at: at,
            updated_at: at,
        };
        let note = DomainShiftNote::try_from(row.clone()).unwrap();
        assert_eq!(note.payment_state, PaymentState::Approved);
        assert!(note.is_exported());
        assert_eq!(note.total_work_hours(), 2.0);

        let bad = ShiftNote {
            payment_state: "Settled".to_string(),
            ..row
        };
        assert!(DomainShiftNote::try_from(bad).is_err());
    }
}
