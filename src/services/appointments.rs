//! Appointments with recurrence, job assignment and attachments.

use chrono::NaiveDate;
use validator::ValidationErrors;

use crate::SERVICE_ACCESS_ROLE;
use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::appointment::{Appointment, AppointmentContent};
use crate::domain::attachment::PendingFile;
use crate::domain::document::OwnerKind;
use crate::domain::types::{AppointmentId, ClientId, HubId};
use crate::dto::query::AppointmentsQuery;
use crate::forms::appointment::AppointmentForm;
use crate::forms::{field_error, finish, optional_date};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    AppointmentListQuery, AppointmentReader, AppointmentWriter, CarePlanReader, ClientReader,
    DocumentReader, DocumentWriter,
};
use crate::services::attachments::{discard_files, sync_documents};
use crate::services::{ServiceError, ServiceResult, ensure_client_in_hub, hub_of, page_or_first};
use crate::storage::DocumentStore;
use crate::wizard::Wizard;

fn date_range(query: &AppointmentsQuery) -> ServiceResult<(Option<NaiveDate>, Option<NaiveDate>)> {
    let mut errors = ValidationErrors::new();
    let from = optional_date(&mut errors, "from", query.from.as_deref());
    let to = optional_date(&mut errors, "to", query.to.as_deref());
    if from.zip(to).is_some_and(|(from, to)| to < from) {
        errors.add("to", field_error("range", "Range end precedes its start"));
    }
    finish(errors)?;
    Ok((from, to))
}

pub fn list_appointments<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: AppointmentsQuery,
) -> ServiceResult<Paginated<Appointment>>
where
    R: AppointmentReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let (from, to) = date_range(&query)?;

    let page = page_or_first(query.page);
    let mut list_query = AppointmentListQuery::new(hub_id)
        .between(from, to)
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(client_id) = query.client_id.and_then(|id| ClientId::new(id).ok()) {
        list_query = list_query.client(client_id);
    }

    let (total, appointments) = repo.list_appointments(list_query).map_err(|err| {
        log::error!("Failed to list appointments: {err}");
        err
    })?;

    Ok(Paginated::new(appointments, total, page, DEFAULT_ITEMS_PER_PAGE))
}

pub fn get_appointment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    appointment_id: i32,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let appointment_id = AppointmentId::new(appointment_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_appointment_by_id(appointment_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get appointment {appointment_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

/// Client and care plan must both belong to the caller's hub.
fn check_references<R>(repo: &R, content: &AppointmentContent, hub_id: HubId) -> ServiceResult<()>
where
    R: ClientReader + CarePlanReader + ?Sized,
{
    ensure_client_in_hub(repo, content.client_id, hub_id)?;
    let Some(plan_id) = content.care_plan_id else {
        return Ok(());
    };
    let plan = repo.get_care_plan_by_id(plan_id, hub_id).map_err(|err| {
        log::error!("Failed to look up care plan {plan_id}: {err}");
        err
    })?;
    if plan.is_some_and(|plan| plan.client_id == content.client_id) {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    errors.add(
        "care_plan_id",
        field_error("unknown", "Care plan does not belong to this client"),
    );
    Err(ServiceError::Validation(errors))
}

pub fn create_appointment<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    form: AppointmentForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Appointment>
where
    R: AppointmentWriter + ClientReader + CarePlanReader + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let payload = Wizard::for_form::<AppointmentForm>().submit(&form)?;
    check_references(repo, &payload.content, hub_id)?;

    let mut appointment = repo
        .create_appointment(hub_id, &payload.content)
        .map_err(|err| {
            log::error!("Failed to create appointment: {err}");
            err
        })?;
    appointment.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Appointment,
        appointment.id.get(),
        &uploads,
        &[],
    )?;
    Ok(appointment)
}

pub fn update_appointment<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    appointment_id: i32,
    form: AppointmentForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Appointment>
where
    R: AppointmentWriter + ClientReader + CarePlanReader + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let appointment_id = AppointmentId::new(appointment_id).map_err(|_| ServiceError::NotFound)?;

    let payload = Wizard::for_form::<AppointmentForm>().submit(&form)?;
    check_references(repo, &payload.content, hub_id)?;

    let mut appointment = repo
        .update_appointment(appointment_id, hub_id, &payload.content)
        .map_err(|err| {
            log::error!("Failed to update appointment {appointment_id}: {err}");
            err
        })?;
    appointment.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Appointment,
        appointment_id.get(),
        &uploads,
        &payload.removed_document_ids,
    )?;
    Ok(appointment)
}

pub fn delete_appointment<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    appointment_id: i32,
) -> ServiceResult<()>
where
    R: AppointmentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let appointment_id = AppointmentId::new(appointment_id).map_err(|_| ServiceError::NotFound)?;

    let documents = repo
        .delete_appointment(appointment_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to delete appointment {appointment_id}: {err}");
            err
        })?;
    discard_files(store, &documents);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "scheduler@example.com".to_string(),
            hub_id: 5,
            name: "Scheduler".to_string(),
            roles: vec![SERVICE_ACCESS_ROLE.to_string()],
            exp: 0,
        }
    }

    #[test]
    fn inverted_range_is_rejected_before_querying() {
        let mut repo = MockRepository::new();
        repo.expect_list_appointments().times(0);
        let query = AppointmentsQuery {
            from: Some("2024-06-10".to_string()),
            to: Some("2024-06-01".to_string()),
            ..AppointmentsQuery::default()
        };

        let result = list_appointments(&repo, &user(), query);

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn recurrence_errors_block_creation() {
        let store = DocumentStore::new("/tmp/unused", "/documents");
        let mut repo = MockRepository::new();
        repo.expect_create_appointment().times(0);
        let form = AppointmentForm {
            client_id: 3,
            title: "Morning visit".to_string(),
            start_date: Some("2024-06-03".to_string()),
            start_time: Some("08:00".to_string()),
            end_date: Some("2024-06-03".to_string()),
            end_time: Some("09:00".to_string()),
            recurrence_state: true,
            ..AppointmentForm::default()
        };

        let result = create_appointment(&repo, &store, &user(), form, Vec::new());

        match result {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("recurrence_type"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
