//! Shift notes and the timesheet payment/export workflow.

use validator::ValidationErrors;

use crate::SERVICE_ACCESS_ROLE;
use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::appointment::Schedule;
use crate::domain::attachment::PendingFile;
use crate::domain::document::OwnerKind;
use crate::domain::shift_note::{ShiftNote, ShiftNoteContent};
use crate::domain::types::{ClientId, HubId, ShiftNoteId};
use crate::dto::query::ClientScopedQuery;
use crate::dto::timesheet::{
    BulkExportOutcome, IncrementOutcome, TimesheetRow, timesheets_to_csv,
};
use crate::forms::field_error;
use crate::forms::shift_note::{ShiftNoteForm, ShiftNotePayload};
use crate::forms::timesheet::{
    BulkExportForm, BulkExportPayload, BulkStatusForm, BulkStatusPayload, ExportFormat,
    ExportIncrementForm, StatusCommentForm, StatusQuery, TimesheetFilter, TimesheetFilterQuery,
};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    AppointmentReader, ClientReader, DocumentReader, DocumentWriter, ShiftNoteListQuery,
    ShiftNoteReader, ShiftNoteWriter,
};
use crate::services::attachments::{discard_files, sync_documents};
use crate::services::{ServiceError, ServiceResult, ensure_client_in_hub, hub_of, page_or_first};
use crate::storage::DocumentStore;

/// Rendered timesheet export.
#[derive(Debug)]
pub enum TimesheetExport {
    Rows(Vec<TimesheetRow>),
    Csv(Vec<u8>),
}

pub fn list_shift_notes<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ClientScopedQuery,
) -> ServiceResult<Paginated<ShiftNote>>
where
    R: ShiftNoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let page = page_or_first(query.page);
    let list_query = ShiftNoteListQuery::new(hub_id)
        .client(query.client_id.and_then(|id| ClientId::new(id).ok()))
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);

    let (total, notes) = repo.list_shift_notes(list_query).map_err(|err| {
        log::error!("Failed to list shift notes: {err}");
        err
    })?;

    Ok(Paginated::new(notes, total, page, DEFAULT_ITEMS_PER_PAGE))
}

pub fn get_shift_note<R>(
    repo: &R,
    user: &AuthenticatedUser,
    note_id: i32,
) -> ServiceResult<ShiftNote>
where
    R: ShiftNoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = ShiftNoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_shift_note_by_id(note_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get shift note {note_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

fn unknown(field: &'static str, message: &'static str) -> ServiceError {
    let mut errors = ValidationErrors::new();
    errors.add(field, field_error("unknown", message));
    ServiceError::Validation(errors)
}

/// Checks references and fills the shift window from the selected note when
/// the form left it out.
fn resolve_content<R>(
    repo: &R,
    payload: ShiftNotePayload,
    hub_id: HubId,
) -> ServiceResult<ShiftNoteContent>
where
    R: ShiftNoteReader + AppointmentReader + ClientReader + ?Sized,
{
    ensure_client_in_hub(repo, payload.client_id, hub_id)?;

    if let Some(appointment_id) = payload.appointment_id {
        let appointment = repo
            .get_appointment_by_id(appointment_id, hub_id)
            .map_err(|err| {
                log::error!("Failed to look up appointment {appointment_id}: {err}");
                err
            })?;
        if appointment.is_none() {
            return Err(unknown("appointment_id", "Unknown appointment"));
        }
    }

    let schedule: Schedule = match (payload.schedule, payload.existing_note_id) {
        (Some(schedule), _) => schedule,
        (None, Some(existing_id)) => repo
            .get_shift_note_by_id(existing_id, hub_id)
            .map_err(|err| {
                log::error!("Failed to look up shift note {existing_id}: {err}");
                err
            })?
            .map(|existing| existing.schedule)
            .ok_or_else(|| unknown("existing_note_id", "Unknown shift note"))?,
        (None, None) => {
            return Err(ServiceError::Internal(
                "shift window missing without an existing note".to_string(),
            ));
        }
    };

    Ok(ShiftNoteContent {
        client_id: payload.client_id,
        caregiver_id: payload.caregiver_id,
        appointment_id: payload.appointment_id,
        note: payload.note,
        schedule,
        recorded: payload.recorded,
    })
}

pub fn create_shift_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    form: ShiftNoteForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<ShiftNote>
where
    R: ShiftNoteReader
        + ShiftNoteWriter
        + AppointmentReader
        + ClientReader
        + DocumentReader
        + DocumentWriter
        + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let payload = ShiftNotePayload::try_from(&form)?;
    let content = resolve_content(repo, payload, hub_id)?;

    let mut note = repo.create_shift_note(hub_id, &content).map_err(|err| {
        log::error!("Failed to create shift note: {err}");
        err
    })?;
    note.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::ShiftNote,
        note.id.get(),
        &uploads,
        &[],
    )?;
    Ok(note)
}

pub fn update_shift_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    note_id: i32,
    form: ShiftNoteForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<ShiftNote>
where
    R: ShiftNoteReader
        + ShiftNoteWriter
        + AppointmentReader
        + ClientReader
        + DocumentReader
        + DocumentWriter
        + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = ShiftNoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;

    let payload = ShiftNotePayload::try_from(&form)?;
    let removed = payload.removed_document_ids.clone();
    let content = resolve_content(repo, payload, hub_id)?;

    let mut note = repo
        .update_shift_note(note_id, hub_id, &content)
        .map_err(|err| {
            log::error!("Failed to update shift note {note_id}: {err}");
            err
        })?;
    note.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::ShiftNote,
        note_id.get(),
        &uploads,
        &removed,
    )?;
    Ok(note)
}

pub fn delete_shift_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    note_id: i32,
) -> ServiceResult<()>
where
    R: ShiftNoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = ShiftNoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;

    let documents = repo.delete_shift_note(note_id, hub_id).map_err(|err| {
        log::error!("Failed to delete shift note {note_id}: {err}");
        err
    })?;
    discard_files(store, &documents);
    Ok(())
}

fn timesheet_query(hub_id: HubId, filter: TimesheetFilter) -> ShiftNoteListQuery {
    ShiftNoteListQuery::new(hub_id)
        .client(filter.client_id)
        .caregiver(filter.caregiver_id)
        .payment_state(filter.payment_state)
        .outstanding_only(filter.pending_only)
        .between(filter.from, filter.to)
}

/// Paginated timesheet view with payment state and allowed transitions.
pub fn list_timesheets<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: TimesheetFilterQuery,
) -> ServiceResult<Paginated<TimesheetRow>>
where
    R: ShiftNoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let filter = TimesheetFilter::try_from(&query)?;

    let page = page_or_first(query.page);
    let list_query = timesheet_query(hub_id, filter).paginate(page, DEFAULT_ITEMS_PER_PAGE);

    let (total, notes) = repo.list_shift_notes(list_query).map_err(|err| {
        log::error!("Failed to list timesheets: {err}");
        err
    })?;
    let rows = notes.iter().map(TimesheetRow::from).collect();

    Ok(Paginated::new(rows, total, page, DEFAULT_ITEMS_PER_PAGE))
}

/// Every outstanding timesheet matching the filter, unpaginated.
pub fn export_timesheets<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: TimesheetFilterQuery,
) -> ServiceResult<TimesheetExport>
where
    R: ShiftNoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let filter = TimesheetFilter::try_from(&query)?;

    let list_query = timesheet_query(hub_id, filter).outstanding_only(true);
    let (_, notes) = repo.list_shift_notes(list_query).map_err(|err| {
        log::error!("Failed to list exportable timesheets: {err}");
        err
    })?;
    let rows: Vec<TimesheetRow> = notes.iter().map(TimesheetRow::from).collect();

    match query.format {
        ExportFormat::Json => Ok(TimesheetExport::Rows(rows)),
        ExportFormat::Csv => timesheets_to_csv(&rows)
            .map(TimesheetExport::Csv)
            .map_err(|err| {
                log::error!("Failed to render timesheet CSV: {err}");
                ServiceError::Internal(err.to_string())
            }),
    }
}

/// Moves one timesheet along the payment workflow.
pub fn update_timesheet_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    note_id: i32,
    query: StatusQuery,
    form: StatusCommentForm,
) -> ServiceResult<TimesheetRow>
where
    R: ShiftNoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = ShiftNoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;
    let comment = form.into_comment()?;

    let updated = repo
        .update_payment_states(hub_id, &[note_id], query.status, comment)
        .map_err(|err| {
            log::error!("Failed to move timesheet {note_id} to {}: {err}", query.status);
            err
        })?;
    log::info!("Timesheet {note_id} moved to {}", query.status);

    updated
        .first()
        .map(TimesheetRow::from)
        .ok_or(ServiceError::NotFound)
}

/// Moves every selected timesheet, or none if any row refuses the move.
pub fn bulk_update_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: BulkStatusForm,
) -> ServiceResult<Vec<TimesheetRow>>
where
    R: ShiftNoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let payload = BulkStatusPayload::try_from(form)?;

    let updated = repo
        .update_payment_states(hub_id, &payload.ids, payload.status, payload.comment)
        .map_err(|err| {
            log::error!("Failed to bulk update timesheets to {}: {err}", payload.status);
            err
        })?;
    log::info!("{} timesheet(s) moved to {}", updated.len(), payload.status);

    Ok(updated.iter().map(TimesheetRow::from).collect())
}

pub fn increment_exports<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ExportIncrementForm,
) -> ServiceResult<IncrementOutcome>
where
    R: ShiftNoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let ids = form.into_ids()?;

    let updated = repo.increment_export_counts(hub_id, &ids).map_err(|err| {
        log::error!("Failed to increment export counts: {err}");
        err
    })?;
    Ok(IncrementOutcome { updated })
}

/// Runs a confirmed bulk export or reverse over the selection.
pub fn bulk_export<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: BulkExportForm,
) -> ServiceResult<BulkExportOutcome>
where
    R: ShiftNoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let payload = BulkExportPayload::try_from(form)?;

    let plan = repo
        .apply_bulk_export(hub_id, &payload.ids, payload.action)
        .map_err(|err| {
            log::error!("Failed to apply bulk export {:?}: {err}", payload.action);
            err
        })?;
    let outcome = BulkExportOutcome::new(&plan, payload.action);
    log::info!(
        "Bulk export {:?}: {} exported, {} reversed",
        payload.action,
        outcome.exported.len(),
        outcome.reversed.len()
    );
    Ok(outcome)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use crate::domain::client::{Client, ClientAddress, ClientClassifiers};
    use crate::domain::export::{BulkExportAction, BulkExportPlan};
    use crate::domain::shift_note::{PaymentState, RecordedWindow};
    use crate::domain::types::{CaregiverId, ClientName, RichText};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "payroll@example.com".to_string(),
            hub_id: 3,
            name: "Payroll".to_string(),
            roles: vec![SERVICE_ACCESS_ROLE.to_string()],
            exp: 0,
        }
    }

    fn client(id: ClientId, hub_id: HubId) -> Client {
        let now = Utc::now().naive_utc();
        Client {
            id,
            hub_id,
            name: ClientName::new("Ada Hill").unwrap(),
            email: None,
            phone: None,
            address: ClientAddress::default(),
            classifiers: ClientClassifiers::default(),
            created_at: now,
            updated_at: now,
        }
    }

    fn schedule() -> Schedule {
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        Schedule::new(
            day.and_hms_opt(9, 0, 0).unwrap(),
            day.and_hms_opt(13, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn shift_note(id: i32, state: PaymentState, export_count: i32) -> ShiftNote {
        let now = Utc::now().naive_utc();
        ShiftNote {
            id: ShiftNoteId::new(id).unwrap(),
            hub_id: HubId::new(3).unwrap(),
            client_id: ClientId::new(2).unwrap(),
            caregiver_id: CaregiverId::new(4).unwrap(),
            appointment_id: None,
            note: RichText::new("ok"),
            schedule: schedule(),
            recorded: RecordedWindow::default(),
            total_work_minutes: 240,
            payment_state: state,
            comment: None,
            export_count,
            documents: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn existing_note_supplies_missing_window() {
        let store = DocumentStore::new("/tmp/unused", "/documents");
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .returning(|id, hub_id| Ok(Some(client(id, hub_id))));
        repo.expect_get_shift_note_by_id()
            .withf(|id, _| id.get() == 11)
            .times(1)
            .returning(|_, _| Ok(Some(shift_note(11, PaymentState::Pending, 0))));
        repo.expect_create_shift_note()
            .withf(|_, content| content.schedule == schedule())
            .times(1)
            .returning(|_, _| Ok(shift_note(12, PaymentState::Pending, 0)));
        repo.expect_list_documents()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let form = ShiftNoteForm {
            client_id: 2,
            caregiver_id: 4,
            existing_note_id: Some(11),
            ..ShiftNoteForm::default()
        };
        let note = create_shift_note(&repo, &store, &user(), form, Vec::new()).unwrap();
        assert_eq!(note.id.get(), 12);
    }

    #[test]
    fn missing_window_field_is_reported_without_touching_storage() {
        let store = DocumentStore::new("/tmp/unused", "/documents");
        let mut repo = MockRepository::new();
        repo.expect_create_shift_note().times(0);
        let form = ShiftNoteForm {
            client_id: 2,
            caregiver_id: 4,
            shift_start_date: Some("2024-04-02".to_string()),
            shift_start_time: Some("09:00".to_string()),
            shift_end_date: Some("2024-04-02".to_string()),
            ..ShiftNoteForm::default()
        };

        match create_shift_note(&repo, &store, &user(), form, Vec::new()) {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("shift_end_time"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn illegal_transition_surfaces_as_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_update_payment_states()
            .withf(|_, ids, status, comment| {
                ids.len() == 1 && *status == PaymentState::Approved && comment.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| {
                Err(RepositoryError::Conflict(
                    "timesheet 7: cannot move timesheet from Paid to Approved".to_string(),
                ))
            });

        let result = update_timesheet_status(
            &repo,
            &user(),
            7,
            StatusQuery {
                status: PaymentState::Approved,
            },
            StatusCommentForm {
                comment: Some("   ".to_string()),
            },
        );

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn pending_only_listing_asks_for_outstanding_rows() {
        let mut repo = MockRepository::new();
        repo.expect_list_shift_notes()
            .withf(|query| query.outstanding_only && query.pagination.is_some())
            .times(1)
            .returning(|_| {
                Ok((
                    2,
                    vec![
                        shift_note(1, PaymentState::Pending, 0),
                        shift_note(2, PaymentState::Approved, 1),
                    ],
                ))
            });

        let query = TimesheetFilterQuery {
            pending_only: true,
            ..TimesheetFilterQuery::default()
        };
        let page = list_timesheets(&repo, &user(), query).unwrap();

        assert_eq!(page.total, 2);
        assert_eq!(
            page.items[0].allowed_transitions,
            vec![PaymentState::Approved, PaymentState::Rejected]
        );
        assert!(page.items[1].is_exported);
    }

    #[test]
    fn csv_export_is_unpaginated_and_outstanding() {
        let mut repo = MockRepository::new();
        repo.expect_list_shift_notes()
            .withf(|query| query.outstanding_only && query.pagination.is_none())
            .times(1)
            .returning(|_| Ok((1, vec![shift_note(1, PaymentState::Approved, 0)])));

        let query = TimesheetFilterQuery {
            format: ExportFormat::Csv,
            ..TimesheetFilterQuery::default()
        };
        match export_timesheets(&repo, &user(), query).unwrap() {
            TimesheetExport::Csv(bytes) => {
                let text = String::from_utf8(bytes).unwrap();
                assert_eq!(text.lines().count(), 2);
            }
            other => panic!("expected csv, got {other:?}"),
        }
    }

    #[test]
    fn bulk_export_needs_confirmation_before_repository() {
        let mut repo = MockRepository::new();
        repo.expect_apply_bulk_export().times(0);
        let form = BulkExportForm {
            ids: vec![1, 2, 3],
            action: BulkExportAction::PerformBoth,
            confirmation: "yes".to_string(),
        };

        let result = bulk_export(&repo, &user(), form);

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn bulk_export_reports_both_groups() {
        let mut repo = MockRepository::new();
        repo.expect_apply_bulk_export()
            .withf(|_, ids, action| ids.len() == 3 && *action == BulkExportAction::PerformBoth)
            .times(1)
            .returning(|_, _, _| {
                let rows = [
                    shift_note(1, PaymentState::Pending, 0),
                    shift_note(2, PaymentState::Pending, 0),
                    shift_note(3, PaymentState::Approved, 2),
                ];
                Ok(BulkExportPlan::from_selection(rows.iter()))
            });
        let form = BulkExportForm {
            ids: vec![1, 2, 3],
            action: BulkExportAction::PerformBoth,
            confirmation: "confirm".to_string(),
        };

        let outcome = bulk_export(&repo, &user(), form).unwrap();

        assert_eq!(outcome.exported.len(), 2);
        assert_eq!(outcome.reversed.len(), 1);
    }
}
