//! Shared resources (policies, guides) with attachments.

use crate::SERVICE_ACCESS_ROLE;
use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::attachment::PendingFile;
use crate::domain::document::OwnerKind;
use crate::domain::resource::Resource;
use crate::domain::types::ResourceId;
use crate::dto::query::PageQuery;
use crate::forms::resource::{ResourceForm, ResourcePayload};
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{
    DocumentReader, DocumentWriter, HubListQuery, ResourceReader, ResourceWriter,
};
use crate::services::attachments::{discard_files, sync_documents};
use crate::services::{ServiceError, ServiceResult, hub_of, page_or_first};
use crate::storage::DocumentStore;

pub fn list_resources<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: PageQuery,
) -> ServiceResult<Paginated<Resource>>
where
    R: ResourceReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let page = page_or_first(query.page);
    let (total, resources) = repo
        .list_resources(HubListQuery::new(hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE))
        .map_err(|err| {
            log::error!("Failed to list resources: {err}");
            err
        })?;

    Ok(Paginated::new(resources, total, page, DEFAULT_ITEMS_PER_PAGE))
}

pub fn get_resource<R>(
    repo: &R,
    user: &AuthenticatedUser,
    resource_id: i32,
) -> ServiceResult<Resource>
where
    R: ResourceReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let resource_id = ResourceId::new(resource_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_resource_by_id(resource_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get resource {resource_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

pub fn create_resource<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    form: ResourceForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Resource>
where
    R: ResourceWriter + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let payload = ResourcePayload::try_from(&form)?;

    let mut resource = repo
        .create_resource(hub_id, &payload.content)
        .map_err(|err| {
            log::error!("Failed to create resource: {err}");
            err
        })?;
    resource.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Resource,
        resource.id.get(),
        &uploads,
        &[],
    )?;
    Ok(resource)
}

pub fn update_resource<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    resource_id: i32,
    form: ResourceForm,
    uploads: Vec<PendingFile>,
) -> ServiceResult<Resource>
where
    R: ResourceWriter + DocumentReader + DocumentWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let resource_id = ResourceId::new(resource_id).map_err(|_| ServiceError::NotFound)?;
    let payload = ResourcePayload::try_from(&form)?;

    let mut resource = repo
        .update_resource(resource_id, hub_id, &payload.content)
        .map_err(|err| {
            log::error!("Failed to update resource {resource_id}: {err}");
            err
        })?;
    resource.documents = sync_documents(
        repo,
        store,
        hub_id,
        OwnerKind::Resource,
        resource_id.get(),
        &uploads,
        &payload.removed_document_ids,
    )?;
    Ok(resource)
}

pub fn delete_resource<R>(
    repo: &R,
    store: &DocumentStore,
    user: &AuthenticatedUser,
    resource_id: i32,
) -> ServiceResult<()>
where
    R: ResourceWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let resource_id = ResourceId::new(resource_id).map_err(|_| ServiceError::NotFound)?;

    let documents = repo
        .delete_resource(resource_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to delete resource {resource_id}: {err}");
            err
        })?;
    discard_files(store, &documents);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "library@example.com".to_string(),
            hub_id: 8,
            name: "Library".to_string(),
            roles: vec![SERVICE_ACCESS_ROLE.to_string()],
            exp: 0,
        }
    }

    #[test]
    fn missing_resource_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_resource_by_id()
            .times(1)
            .returning(|_, _| Ok(None));

        assert!(matches!(
            get_resource(&repo, &user(), 4),
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            get_resource(&repo, &user(), 0),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn update_of_foreign_resource_keeps_attachments_untouched() {
        let store = DocumentStore::new("/tmp/unused", "/documents");
        let mut repo = MockRepository::new();
        repo.expect_update_resource()
            .times(1)
            .returning(|_, _, _| Err(RepositoryError::NotFound));
        repo.expect_delete_documents().times(0);
        repo.expect_create_documents().times(0);
        let form = ResourceForm {
            title: "Fire drill".to_string(),
            valid_from: Some("2024-01-01".to_string()),
            removed_document_ids: vec![2],
            ..ResourceForm::default()
        };

        let result = update_resource(&repo, &store, &user(), 4, form, Vec::new());

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
