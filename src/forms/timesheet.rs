//! Inputs of the timesheet payment and export workflow.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::export::{BulkExportAction, is_confirmed};
use crate::domain::shift_note::PaymentState;
use crate::domain::types::{CaregiverId, ClientId, ShiftNoteId, ids_from_raw};
use crate::forms::{FormError, field_error, finish, optional_date};

/// `?status=` of the per-row status update.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub status: PaymentState,
}

/// Body of the per-row status update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct StatusCommentForm {
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

impl StatusCommentForm {
    pub fn into_comment(self) -> Result<Option<String>, FormError> {
        self.validate()?;
        Ok(trimmed(self.comment))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkStatusForm {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<i32>,
    pub status: PaymentState,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Validated bulk status change.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkStatusPayload {
    pub ids: Vec<ShiftNoteId>,
    pub status: PaymentState,
    pub comment: Option<String>,
}

impl TryFrom<BulkStatusForm> for BulkStatusPayload {
    type Error = FormError;

    fn try_from(form: BulkStatusForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            ids: unique_ids(&form.ids)?,
            status: form.status,
            comment: trimmed(form.comment),
        })
    }
}

/// Ids whose export count is incremented.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportIncrementForm {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<i32>,
}

impl ExportIncrementForm {
    pub fn into_ids(self) -> Result<Vec<ShiftNoteId>, FormError> {
        self.validate()?;
        unique_ids(&self.ids)
    }
}

/// Bulk export / reverse request. `confirmation` must read `confirm`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkExportForm {
    #[validate(length(min = 1, max = 500))]
    pub ids: Vec<i32>,
    pub action: BulkExportAction,
    pub confirmation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkExportPayload {
    pub ids: Vec<ShiftNoteId>,
    pub action: BulkExportAction,
}

impl TryFrom<BulkExportForm> for BulkExportPayload {
    type Error = FormError;

    fn try_from(form: BulkExportForm) -> Result<Self, Self::Error> {
        form.validate()?;
        if !is_confirmed(&form.confirmation) {
            return Err(FormError::NotConfirmed);
        }
        Ok(Self {
            ids: unique_ids(&form.ids)?,
            action: form.action,
        })
    }
}

/// Output format of the export listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

/// Query string of the timesheet listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimesheetFilterQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub client_id: Option<i32>,
    pub caregiver_id: Option<i32>,
    pub payment_state: Option<PaymentState>,
    /// Restricts the list to outstanding (not Paid, not Rejected) rows.
    #[serde(default)]
    pub pending_only: bool,
    pub page: Option<usize>,
    #[serde(default)]
    pub format: ExportFormat,
}

/// Validated timesheet filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimesheetFilter {
    pub from: Option<chrono::NaiveDate>,
    pub to: Option<chrono::NaiveDate>,
    pub client_id: Option<ClientId>,
    pub caregiver_id: Option<CaregiverId>,
    pub payment_state: Option<PaymentState>,
    pub pending_only: bool,
}

impl TryFrom<&TimesheetFilterQuery> for TimesheetFilter {
    type Error = ValidationErrors;

    fn try_from(query: &TimesheetFilterQuery) -> Result<Self, Self::Error> {
        let mut errors = ValidationErrors::new();
        let from = optional_date(&mut errors, "from", query.from.as_deref());
        let to = optional_date(&mut errors, "to", query.to.as_deref());
        if from.zip(to).is_some_and(|(from, to)| to < from) {
            errors.add("to", field_error("range", "Range end precedes its start"));
        }
        // Non-positive ids from the query string mean "no filter".
        let client_id = query.client_id.and_then(|id| ClientId::new(id).ok());
        let caregiver_id = query.caregiver_id.and_then(|id| CaregiverId::new(id).ok());

        finish(errors)?;

        Ok(Self {
            from,
            to,
            client_id,
            caregiver_id,
            payment_state: query.payment_state,
            pending_only: query.pending_only,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn unique_ids(raw: &[i32]) -> Result<Vec<ShiftNoteId>, FormError> {
    let mut ids: Vec<ShiftNoteId> = ids_from_raw(raw)?;
    ids.sort();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_export_requires_exact_confirmation() {
        let form = |confirmation: &str| BulkExportForm {
            ids: vec![3, 1, 3],
            action: BulkExportAction::PerformBoth,
            confirmation: confirmation.to_string(),
        };
        assert!(matches!(
            BulkExportPayload::try_from(form("Confirm")),
            Err(FormError::NotConfirmed)
        ));
        assert!(matches!(
            BulkExportPayload::try_from(form("")),
            Err(FormError::NotConfirmed)
        ));
        let payload = BulkExportPayload::try_from(form(" confirm ")).unwrap();
        let ids: Vec<i32> = payload.ids.into_iter().map(i32::from).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn empty_selection_is_rejected() {
        let form = ExportIncrementForm { ids: vec![] };
        assert!(matches!(form.into_ids(), Err(FormError::Validation(_))));
        let form = ExportIncrementForm { ids: vec![2, -1] };
        assert!(matches!(form.into_ids(), Err(FormError::InvalidId)));
    }

    #[test]
    fn filter_rejects_inverted_range() {
        let query = TimesheetFilterQuery {
            from: Some("2024-02-01".to_string()),
            to: Some("2024-01-01".to_string()),
            ..TimesheetFilterQuery::default()
        };
        let errors = TimesheetFilter::try_from(&query).unwrap_err();
        assert!(errors.errors().contains_key("to"));

        let query = TimesheetFilterQuery {
            client_id: Some(0),
            pending_only: true,
            ..TimesheetFilterQuery::default()
        };
        let filter = TimesheetFilter::try_from(&query).unwrap();
        assert!(filter.client_id.is_none());
        assert!(filter.pending_only);
    }
}
