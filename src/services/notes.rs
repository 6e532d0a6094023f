//! Free-form notes, optionally attached to a client.

use crate::SERVICE_ACCESS_ROLE;
use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::attachment::PendingFile;
use crate::domain::document::OwnerKind;
use crate::domain::note::{Note, NoteContent};
use crate::domain::types::{ClientId, HubId, NoteId};
use crate::dto::query::ClientScopedQuery;
use crate::forms::note::{NoteForm, NotePayload};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    ClientReader, DocumentReader, DocumentWriter, NoteListQuery, NoteReader, NoteWriter,
};
use crate::services::attachments::{discard_files, sync_documents};
use crate::services::{ServiceError, ServiceResult, ensure_client_in_hub, hub_of, page_or_first};
use crate::storage::DocumentStore;

pub fn list_notes<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ClientScopedQuery,
) -> ServiceResult<Paginated<Note>>
where
    R: NoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let page = page_or_first(query.page);
    let list_query = NoteListQuery::new(hub_id)
        .client(query.client_id.and_then(|id| ClientId::new(id).ok()))
        .paginate(page, DEFAULT_ITEMS_PER_PAGE);

    let (total, notes) = repo.list_notes(list_query).map_err(|err| {
        log::error!("Failed to list notes: {err}");
        err
    })?;

    Ok(Paginated::new(notes, total, page, DEFAULT_ITEMS_PER_PAGE))
}

pub fn get_note<R>(repo: &R, user: &AuthenticatedUser, note_id: i32) -> ServiceResult<Note>
where
    R: NoteReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = NoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_note_by_id(note_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get note {note_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

fn check_client<R>(repo: &R, content: &NoteContent, hub_id: HubId) -> ServiceResult<()>
where
    R: ClientReader + ?Sized,
{
    match content.client_id {
        Some(client_id) => ensure_client_in_hub(repo, client_id, hub_id),
        None => Ok(()),
    }
}

pub fn create_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    form: NoteForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Note>
where
    R: NoteWriter + ClientReader + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let payload = NotePayload::try_from(&form)?;
    check_client(repo, &payload.content, hub_id)?;

    let mut note = repo.create_note(hub_id, &payload.content).map_err(|err| {
        log::error!("Failed to create note: {err}");
        err
    })?;
    note.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Note,
        note.id.get(),
        &uploads,
        &[],
    )?;
    Ok(note)
}

pub fn update_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    note_id: i32,
    form: NoteForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Note>
where
    R: NoteWriter + ClientReader + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = NoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;
    let payload = NotePayload::try_from(&form)?;
    check_client(repo, &payload.content, hub_id)?;

    let mut note = repo
        .update_note(note_id, hub_id, &payload.content)
        .map_err(|err| {
            log::error!("Failed to update note {note_id}: {err}");
            err
        })?;
    note.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Note,
        note_id.get(),
        &uploads,
        &payload.removed_document_ids,
    )?;
    Ok(note)
}

pub fn delete_note<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    note_id: i32,
) -> ServiceResult<()>
where
    R: NoteWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let note_id = NoteId::new(note_id).map_err(|_| ServiceError::NotFound)?;

    let documents = repo.delete_note(note_id, hub_id).map_err(|err| {
        log::error!("Failed to delete note {note_id}: {err}");
        err
    })?;
    discard_files(store, &documents);
    Ok(())
}
