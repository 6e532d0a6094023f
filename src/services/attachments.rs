//! Applies attachment changes sent alongside an owning entity.

use crate::domain::attachment::PendingFile;
use crate::domain::document::{Document, OwnerKind};
use crate::domain::types::{DocumentId, HubId};
use crate::repository::{DocumentReader, DocumentWriter};
use crate::services::{ServiceError, ServiceResult};
use crate::storage::DocumentStore;

/// Stores the uploads, removes the staged documents and returns the owner's
/// resulting attachment list.
///
/// Runs after the owner row is committed. Uploads are recorded first, so a
/// failure leaves the previous attachments in place and no stray files on
/// disk. Removal ids that belong to another owner are ignored.
pub fn sync_documents<R>(
    repo: &R,
    store: &DocumentStore,
    hub_id: HubId,
    owner_kind: OwnerKind,
    owner_id: i32,
    uploads: &[PendingFile],
    removed_ids: &[DocumentId],
) -> ServiceResult<Vec<Document>>
where
    R: DocumentReader + DocumentWriter + ?Sized,
{
    if !uploads.is_empty() {
        let new_documents = store
            .save(hub_id, owner_kind, owner_id, uploads)
            .map_err(|err| {
                log::error!("Failed to store uploads of {owner_kind} {owner_id}: {err}");
                ServiceError::Internal(err.to_string())
            })?;
        if let Err(err) = repo.create_documents(&new_documents) {
            log::error!("Failed to record uploads of {owner_kind} {owner_id}: {err}");
            store.discard_unrecorded(&new_documents);
            return Err(err.into());
        }
    }

    if !removed_ids.is_empty() {
        let removed = repo
            .delete_documents(hub_id, owner_kind, owner_id, removed_ids)
            .map_err(|err| {
                log::error!("Failed to delete documents of {owner_kind} {owner_id}: {err}");
                err
            })?;
        store.remove(&removed);
    }

    Ok(repo
        .list_documents(hub_id, owner_kind, owner_id)
        .map_err(|err| {
            log::error!("Failed to list documents of {owner_kind} {owner_id}: {err}");
            err
        })?)
}

/// Deletes the files behind documents whose rows are already gone.
pub fn discard_files(store: &DocumentStore, documents: &[Document]) {
    if !documents.is_empty() {
        log::info!("Removing {} stored document(s)", documents.len());
        store.remove(documents);
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::types::{DocumentLocation, FileName};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn stored(id: i32, location: &str) -> Document {
        Document {
            id: DocumentId::new(id).unwrap(),
            file_name: FileName::new("scan.pdf").unwrap(),
            location: DocumentLocation::new(location).unwrap(),
            content_type: "application/pdf".to_string(),
            size_bytes: 4,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn uploads_are_stored_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path(), "/documents");
        let mut repo = MockRepository::new();
        repo.expect_delete_documents().times(0);
        repo.expect_create_documents()
            .withf(|docs| docs.len() == 1 && docs[0].owner_id == 5)
            .times(1)
            .returning(|_| Ok(Vec::new()));
        repo.expect_list_documents()
            .times(1)
            .returning(|_, _, _| Ok(vec![stored(1, "/documents/a-scan.pdf")]));

        let files = vec![PendingFile::new("scan.pdf", "application/pdf", vec![0; 4])];
        let documents = sync_documents(
            &repo,
            &store,
            HubId::new(1).unwrap(),
            OwnerKind::Note,
            5,
            &files,
            &[],
        )
        .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn removals_are_scoped_to_the_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path(), "/documents");
        let mut repo = MockRepository::new();
        repo.expect_delete_documents()
            .withf(|_, kind, owner, ids| {
                *kind == OwnerKind::Appointment && *owner == 8 && ids.len() == 2
            })
            .times(1)
            .returning(|_, _, _, _| Ok(Vec::new()));
        repo.expect_create_documents().times(0);
        repo.expect_list_documents()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let removed = [DocumentId::new(3).unwrap(), DocumentId::new(4).unwrap()];
        let documents = sync_documents(
            &repo,
            &store,
            HubId::new(1).unwrap(),
            OwnerKind::Appointment,
            8,
            &[],
            &removed,
        )
        .unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn failed_recording_discards_written_files_and_keeps_removals() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path(), "/documents");
        let mut repo = MockRepository::new();
        repo.expect_create_documents()
            .times(1)
            .returning(|_| Err(RepositoryError::DatabaseError("disk full".into())));
        repo.expect_delete_documents().times(0);
        repo.expect_list_documents().times(0);

        let files = vec![PendingFile::new("scan.pdf", "application/pdf", vec![0; 4])];
        let result = sync_documents(
            &repo,
            &store,
            HubId::new(1).unwrap(),
            OwnerKind::ShiftNote,
            3,
            &files,
            &[DocumentId::new(2).unwrap()],
        );

        assert!(matches!(result, Err(ServiceError::Repository(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
