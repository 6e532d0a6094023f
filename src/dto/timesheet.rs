//! Timesheet views returned by the payment and export endpoints.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::export::{BulkExportAction, BulkExportPlan};
use crate::domain::shift_note::{PaymentState, ShiftNote};
use crate::domain::types::{CaregiverId, ClientId, ShiftNoteId};

/// One row of a timesheet listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimesheetRow {
    pub id: ShiftNoteId,
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub shift_start: NaiveDateTime,
    pub shift_end: NaiveDateTime,
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
    pub total_work_minutes: i64,
    pub total_work_hours: f64,
    pub payment_state: PaymentState,
    /// States the row can move to next.
    pub allowed_transitions: Vec<PaymentState>,
    pub comment: Option<String>,
    pub export_count: i32,
    pub is_exported: bool,
}

impl From<&ShiftNote> for TimesheetRow {
    fn from(note: &ShiftNote) -> Self {
        Self {
            id: note.id,
            client_id: note.client_id,
            caregiver_id: note.caregiver_id,
            shift_start: note.schedule.start(),
            shift_end: note.schedule.end(),
            clock_in: note.recorded.clock_in,
            clock_out: note.recorded.clock_out,
            total_work_minutes: note.total_work_minutes,
            total_work_hours: note.total_work_hours(),
            payment_state: note.payment_state,
            allowed_transitions: note.payment_state.allowed_transitions().to_vec(),
            comment: note.comment.clone(),
            export_count: note.export_count,
            is_exported: note.is_exported(),
        }
    }
}

/// Outcome of a bulk export action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkExportOutcome {
    pub action: BulkExportAction,
    /// Rows whose export count was set to 1.
    pub exported: Vec<ShiftNoteId>,
    /// Rows whose export count was reset to 0.
    pub reversed: Vec<ShiftNoteId>,
}

impl BulkExportOutcome {
    pub fn new(plan: &BulkExportPlan, action: BulkExportAction) -> Self {
        let (exported, reversed) = plan.updates(action);
        Self {
            action,
            exported: exported.to_vec(),
            reversed: reversed.to_vec(),
        }
    }
}

/// Outcome of the export increment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementOutcome {
    pub updated: usize,
}

/// Flat CSV record of a timesheet export.
#[cfg(feature = "server")]
#[derive(Debug, Serialize)]
struct TimesheetCsvRecord<'a> {
    id: i32,
    client_id: i32,
    caregiver_id: i32,
    shift_start: String,
    shift_end: String,
    clock_in: String,
    clock_out: String,
    total_work_hours: f64,
    payment_state: String,
    export_count: i32,
    comment: &'a str,
}

#[cfg(feature = "server")]
const CSV_TIMESTAMP: &str = "%Y-%m-%d %H:%M";

#[cfg(feature = "server")]
impl<'a> From<&'a TimesheetRow> for TimesheetCsvRecord<'a> {
    fn from(row: &'a TimesheetRow) -> Self {
        let stamp = |value: Option<NaiveDateTime>| {
            value
                .map(|v| v.format(CSV_TIMESTAMP).to_string())
                .unwrap_or_default()
        };
        Self {
            id: row.id.get(),
            client_id: row.client_id.get(),
            caregiver_id: row.caregiver_id.get(),
            shift_start: row.shift_start.format(CSV_TIMESTAMP).to_string(),
            shift_end: row.shift_end.format(CSV_TIMESTAMP).to_string(),
            clock_in: stamp(row.clock_in),
            clock_out: stamp(row.clock_out),
            total_work_hours: row.total_work_hours,
            payment_state: row.payment_state.to_string(),
            export_count: row.export_count,
            comment: row.comment.as_deref().unwrap_or_default(),
        }
    }
}

/// Renders timesheet rows as CSV with a header line.
#[cfg(feature = "server")]
pub fn timesheets_to_csv(rows: &[TimesheetRow]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(TimesheetCsvRecord::from(row))?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}

#[cfg(all(test, feature = "server"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn row(id: i32, export_count: i32) -> TimesheetRow {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        TimesheetRow {
            id: ShiftNoteId::new(id).unwrap(),
            client_id: ClientId::new(2).unwrap(),
            caregiver_id: CaregiverId::new(7).unwrap(),
            shift_start: day.and_hms_opt(8, 0, 0).unwrap(),
            shift_end: day.and_hms_opt(12, 30, 0).unwrap(),
            clock_in: None,
            clock_out: None,
            total_work_minutes: 270,
            total_work_hours: 4.5,
            payment_state: PaymentState::Approved,
            allowed_transitions: PaymentState::Approved.allowed_transitions().to_vec(),
            comment: Some("late, \"traffic\"".to_string()),
            export_count,
            is_exported: export_count > 0,
        }
    }

    #[test]
    fn csv_has_header_and_quoted_comment() {
        let bytes = timesheets_to_csv(&[row(1, 0), row(2, 3)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,client_id,caregiver_id,shift_start"));
        assert_eq!(
            lines[1],
            "1,2,7,2024-03-04 08:00,2024-03-04 12:30,,,4.5,Approved,0,\"late, \"\"traffic\"\"\""
        );
    }
}
