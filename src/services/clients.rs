//! Client records.

use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::client::Client;
use crate::domain::types::ClientId;
use crate::dto::query::ClientsQuery;
use crate::forms::client::{ClientForm, ClientPayload};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{ClientListQuery, ClientReader, ClientWriter};
use crate::services::attachments::discard_files;
use crate::services::{ServiceError, ServiceResult, hub_of, page_or_first};
use crate::storage::DocumentStore;
use crate::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE};

/// Lists the hub's clients, optionally filtered by a search term.
pub fn list_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ClientsQuery,
) -> ServiceResult<Paginated<Client>>
where
    R: ClientReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let page = page_or_first(query.page);
    let mut list_query = ClientListQuery::new(hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(term) = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        list_query = list_query.search(term);
    }

    let (total, clients) = repo.list_clients(list_query).map_err(|err| {
        log::error!("Failed to list clients: {err}");
        err
    })?;

    Ok(Paginated::new(clients, total, page, DEFAULT_ITEMS_PER_PAGE))
}

pub fn get_client<R>(repo: &R, user: &AuthenticatedUser, client_id: i32) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let client_id = ClientId::new(client_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_client_by_id(client_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get client {client_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

pub fn create_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ClientForm,
) -> ServiceResult<Client>
where
    R: ClientWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let payload = ClientPayload::try_from(&form)?;
    let new_client = payload.into_new_client(hub_id);

    let client = repo.create_client(&new_client).map_err(|err| {
        log::error!("Failed to create client: {err}");
        err
    })?;
    log::info!("Created client {} in hub {hub_id}", client.id);
    Ok(client)
}

pub fn update_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: i32,
    form: ClientForm,
) -> ServiceResult<Client>
where
    R: ClientWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let client_id = ClientId::new(client_id).map_err(|_| ServiceError::NotFound)?;

    let updates = ClientPayload::try_from(&form)?.into_update();

    Ok(repo
        .update_client(client_id, hub_id, &updates)
        .map_err(|err| {
            log::error!("Failed to update client {client_id}: {err}");
            err
        })?)
}

/// Deletes the client together with its plans, appointments, notes and
/// timesheets. Requires the admin role.
pub fn delete_client<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    client_id: i32,
) -> ServiceResult<()>
where
    R: ClientWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    let hub_id = hub_of(user)?;
    let client_id = ClientId::new(client_id).map_err(|_| ServiceError::NotFound)?;

    let documents = repo.delete_client(client_id, hub_id).map_err(|err| {
        log::error!("Failed to delete client {client_id}: {err}");
        err
    })?;
    discard_files(store, &documents);
    Ok(())
}
