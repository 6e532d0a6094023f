//! Caregiver shift notes and the timesheet payment workflow.

use std::fmt::Display;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::appointment::Schedule;
use crate::domain::document::Document;
use crate::domain::types::{
    AppointmentId, CaregiverId, ClientId, HubId, RichText, ShiftNoteId, TypeConstraintError,
};

/// Payment state of a timesheet.
///
/// ```text
/// Pending -> Approved | Rejected
/// Approved -> Rejected | Paid
/// Rejected -> Paid
/// Paid (terminal)
/// ```
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum PaymentState {
    #[default]
    Pending,
    Approved,
    Rejected,
    Paid,
}

impl PaymentState {
    pub const ALL: [PaymentState; 4] = [
        PaymentState::Pending,
        PaymentState::Approved,
        PaymentState::Rejected,
        PaymentState::Paid,
    ];

    /// States offered from the current one.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [PaymentState] {
        match self {
            PaymentState::Pending => &[PaymentState::Approved, PaymentState::Rejected],
            PaymentState::Approved => &[PaymentState::Rejected, PaymentState::Paid],
            PaymentState::Rejected => &[PaymentState::Paid],
            PaymentState::Paid => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: PaymentState) -> bool {
        self.allowed_transitions().contains(&next)
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Every state reachable through one or more transitions, in table order.
    #[must_use]
    pub fn reachable_states(self) -> Vec<PaymentState> {
        let mut reached: Vec<PaymentState> = Vec::new();
        let mut frontier = vec![self];
        while let Some(state) = frontier.pop() {
            for &next in state.allowed_transitions() {
                if !reached.contains(&next) {
                    reached.push(next);
                    frontier.push(next);
                }
            }
        }
        reached.sort_by_key(|state| PaymentState::ALL.iter().position(|s| s == state));
        reached
    }

    /// Validates a requested move, returning the target state.
    pub fn transition(self, next: PaymentState) -> Result<PaymentState, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Pending => write!(f, "Pending"),
            PaymentState::Approved => write!(f, "Approved"),
            PaymentState::Rejected => write!(f, "Rejected"),
            PaymentState::Paid => write!(f, "Paid"),
        }
    }
}

impl TryFrom<&str> for PaymentState {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "Pending" => Ok(PaymentState::Pending),
            "Approved" => Ok(PaymentState::Approved),
            "Rejected" => Ok(PaymentState::Rejected),
            "Paid" => Ok(PaymentState::Paid),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "unknown payment state `{other}`"
            ))),
        }
    }
}

/// Rejected payment-state move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move timesheet from {from} to {to}")]
pub struct TransitionError {
    pub from: PaymentState,
    pub to: PaymentState,
}

/// Clock-in/out recorded by the system, either end may be missing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RecordedWindow {
    pub clock_in: Option<NaiveDateTime>,
    pub clock_out: Option<NaiveDateTime>,
}

/// Minutes worked: the recorded window when complete and positive, else the
/// manual schedule.
#[must_use]
pub fn total_work_minutes(schedule: &Schedule, recorded: &RecordedWindow) -> i64 {
    match (recorded.clock_in, recorded.clock_out) {
        (Some(start), Some(end)) if end > start => (end - start).num_minutes(),
        _ => schedule.minutes(),
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ShiftNote {
    pub id: ShiftNoteId,
    pub hub_id: HubId,
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub appointment_id: Option<AppointmentId>,
    pub note: RichText,
    pub schedule: Schedule,
    pub recorded: RecordedWindow,
    pub total_work_minutes: i64,
    pub payment_state: PaymentState,
    pub comment: Option<String>,
    pub export_count: i32,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ShiftNote {
    /// Worked hours rounded to two decimals.
    #[must_use]
    pub fn total_work_hours(&self) -> f64 {
        (self.total_work_minutes as f64 / 60.0 * 100.0).round() / 100.0
    }

    #[must_use]
    pub fn is_exported(&self) -> bool {
        self.export_count > 0
    }
}

/// Editable content of a shift note, shared by create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct ShiftNoteContent {
    pub client_id: ClientId,
    pub caregiver_id: CaregiverId,
    pub appointment_id: Option<AppointmentId>,
    pub note: RichText,
    pub schedule: Schedule,
    pub recorded: RecordedWindow,
}

impl ShiftNoteContent {
    #[must_use]
    pub fn total_work_minutes(&self) -> i64 {
        total_work_minutes(&self.schedule, &self.recorded)
    }
}

/// Payment-state change for one timesheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub id: ShiftNoteId,
    pub status: PaymentState,
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn transition_table_matches_workflow() {
        use PaymentState::*;
        assert_eq!(Pending.allowed_transitions(), &[Approved, Rejected]);
        assert_eq!(Approved.allowed_transitions(), &[Rejected, Paid]);
        assert_eq!(Rejected.allowed_transitions(), &[Paid]);
        assert!(Paid.allowed_transitions().is_empty());
    }

    #[test]
    fn pending_reaches_every_other_state() {
        use PaymentState::*;
        assert_eq!(Pending.reachable_states(), vec![Approved, Rejected, Paid]);
        assert_eq!(Rejected.reachable_states(), vec![Paid]);
        assert!(Paid.reachable_states().is_empty());
    }

    #[test]
    fn paid_is_terminal() {
        for next in PaymentState::ALL {
            assert!(PaymentState::Paid.transition(next).is_err());
        }
        assert!(PaymentState::Paid.is_terminal());
        assert!(!PaymentState::Rejected.is_terminal());
    }

    #[test]
    fn illegal_transition_reports_both_states() {
        let err = PaymentState::Pending
            .transition(PaymentState::Paid)
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot move timesheet from Pending to Paid");
    }

    #[test]
    fn recorded_window_wins_when_complete() {
        let schedule = Schedule::new(at(9, 0), at(17, 0)).unwrap();
        let recorded = RecordedWindow {
            clock_in: Some(at(9, 10)),
            clock_out: Some(at(16, 40)),
        };
        assert_eq!(total_work_minutes(&schedule, &recorded), 450);

        let partial = RecordedWindow {
            clock_in: Some(at(9, 10)),
            clock_out: None,
        };
        assert_eq!(total_work_minutes(&schedule, &partial), 480);
    }
}
