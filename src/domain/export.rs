//! Bulk payment-export planning for selected timesheets.

use serde::{Deserialize, Serialize};

use crate::domain::shift_note::{PaymentState, ShiftNote};
use crate::domain::types::ShiftNoteId;

/// Text the user must type before a bulk export action runs.
pub const CONFIRMATION_TEXT: &str = "confirm";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BulkExportAction {
    /// Mark unexported rows as exported.
    ExportUnexported,
    /// Return exported rows to unexported.
    ReverseToUnexported,
    /// Both of the above in one step.
    PerformBoth,
}

/// Whether a timesheet belongs in the pending-only export view.
#[must_use]
pub fn is_outstanding(state: PaymentState) -> bool {
    !matches!(state, PaymentState::Paid | PaymentState::Rejected)
}

/// Selection split by export status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkExportPlan {
    pub unexported: Vec<ShiftNoteId>,
    pub exported: Vec<ShiftNoteId>,
}

impl BulkExportPlan {
    pub fn from_selection<'a>(rows: impl IntoIterator<Item = &'a ShiftNote>) -> Self {
        Self::from_counts(rows.into_iter().map(|row| (row.id, row.export_count)))
    }

    /// Builds the plan from `(id, export_count)` pairs.
    pub fn from_counts(rows: impl IntoIterator<Item = (ShiftNoteId, i32)>) -> Self {
        let mut plan = Self::default();
        for (id, export_count) in rows {
            if export_count > 0 {
                plan.exported.push(id);
            } else {
                plan.unexported.push(id);
            }
        }
        plan
    }

    /// Number of rows the action would change.
    #[must_use]
    pub fn affected(&self, action: BulkExportAction) -> usize {
        match action {
            BulkExportAction::ExportUnexported => self.unexported.len(),
            BulkExportAction::ReverseToUnexported => self.exported.len(),
            BulkExportAction::PerformBoth => self.unexported.len() + self.exported.len(),
        }
    }

    /// Actions with at least one affected row are offered.
    #[must_use]
    pub fn is_enabled(&self, action: BulkExportAction) -> bool {
        match action {
            BulkExportAction::PerformBoth => {
                !self.unexported.is_empty() && !self.exported.is_empty()
            }
            other => self.affected(other) > 0,
        }
    }

    /// Rows to mark exported and rows to reset for the chosen action.
    #[must_use]
    pub fn updates(&self, action: BulkExportAction) -> (&[ShiftNoteId], &[ShiftNoteId]) {
        match action {
            BulkExportAction::ExportUnexported => (&self.unexported, &[]),
            BulkExportAction::ReverseToUnexported => (&[], &self.exported),
            BulkExportAction::PerformBoth => (&self.unexported, &self.exported),
        }
    }
}

/// `true` when the typed text is exactly the confirmation word.
#[must_use]
pub fn is_confirmed(typed: &str) -> bool {
    typed.trim() == CONFIRMATION_TEXT
}

/// Dialog state for the bulk export confirmation.
#[derive(Clone, Debug, Default)]
pub struct BulkExportDialog {
    plan: BulkExportPlan,
    action: Option<BulkExportAction>,
    confirmation: String,
}

impl BulkExportDialog {
    pub fn new(plan: BulkExportPlan) -> Self {
        Self {
            plan,
            action: None,
            confirmation: String::new(),
        }
    }

    pub fn plan(&self) -> &BulkExportPlan {
        &self.plan
    }

    /// Picks an action; disabled actions are ignored.
    pub fn choose(&mut self, action: BulkExportAction) -> bool {
        if self.plan.is_enabled(action) {
            self.action = Some(action);
            true
        } else {
            false
        }
    }

    pub fn action(&self) -> Option<BulkExportAction> {
        self.action
    }

    pub fn type_confirmation(&mut self, text: impl Into<String>) {
        self.confirmation = text.into();
    }

    pub fn confirmation(&self) -> &str {
        &self.confirmation
    }

    /// Execute stays disabled until an action is chosen and `confirm` typed.
    #[must_use]
    pub fn can_execute(&self) -> bool {
        self.action.is_some() && is_confirmed(&self.confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: i32) -> ShiftNoteId {
        ShiftNoteId::new(value).unwrap()
    }

    fn mixed_selection() -> BulkExportPlan {
        BulkExportPlan::from_counts([(id(1), 0), (id(2), 0), (id(3), 2)])
    }

    #[test]
    fn mixed_selection_enables_every_action() {
        let plan = mixed_selection();
        assert_eq!(plan.affected(BulkExportAction::ExportUnexported), 2);
        assert_eq!(plan.affected(BulkExportAction::ReverseToUnexported), 1);
        assert_eq!(plan.affected(BulkExportAction::PerformBoth), 3);
        assert!(plan.is_enabled(BulkExportAction::ExportUnexported));
        assert!(plan.is_enabled(BulkExportAction::ReverseToUnexported));
        assert!(plan.is_enabled(BulkExportAction::PerformBoth));
    }

    #[test]
    fn unexported_only_selection_disables_reverse_and_both() {
        let plan = BulkExportPlan::from_counts([(id(1), 0), (id(2), 0)]);
        assert!(plan.is_enabled(BulkExportAction::ExportUnexported));
        assert!(!plan.is_enabled(BulkExportAction::ReverseToUnexported));
        assert!(!plan.is_enabled(BulkExportAction::PerformBoth));
    }

    #[test]
    fn execute_waits_for_literal_confirm() {
        let mut dialog = BulkExportDialog::new(mixed_selection());
        assert!(dialog.choose(BulkExportAction::PerformBoth));
        assert!(!dialog.can_execute());

        dialog.type_confirmation("Confirm");
        assert!(!dialog.can_execute());
        dialog.type_confirmation("confir");
        assert!(!dialog.can_execute());
        dialog.type_confirmation("confirm");
        assert!(dialog.can_execute());
    }

    #[test]
    fn updates_split_by_action() {
        let plan = mixed_selection();
        let (export, reverse) = plan.updates(BulkExportAction::ExportUnexported);
        assert_eq!(export, &[id(1), id(2)]);
        assert!(reverse.is_empty());
        let (export, reverse) = plan.updates(BulkExportAction::ReverseToUnexported);
        assert!(export.is_empty());
        assert_eq!(reverse, &[id(3)]);
    }

    #[test]
    fn paid_and_rejected_are_not_outstanding() {
        assert!(is_outstanding(PaymentState::Pending));
        assert!(is_outstanding(PaymentState::Approved));
        assert!(!is_outstanding(PaymentState::Rejected));
        assert!(!is_outstanding(PaymentState::Paid));
    }
}
