//! Reference data lists (languages, client types, goal outcomes...).

use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::reference::{ReferenceItem, ReferenceKind};
use crate::forms::reference::AddReferenceForm;
use crate::repository::{ReferenceReader, ReferenceWriter};
use crate::services::{ServiceResult, hub_of};
use crate::{SERVICE_ACCESS_ROLE, SERVICE_ADMIN_ROLE};

/// Active items of one kind, ordered by name.
pub fn list_reference_items<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: ReferenceKind,
) -> ServiceResult<Vec<ReferenceItem>>
where
    R: ReferenceReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    Ok(repo.list_reference_items(hub_id, kind).map_err(|err| {
        log::error!("Failed to list {kind} items: {err}");
        err
    })?)
}

pub fn create_reference_item<R>(
    repo: &R,
    user: &AuthenticatedUser,
    kind: ReferenceKind,
    form: AddReferenceForm,
) -> ServiceResult<ReferenceItem>
where
    R: ReferenceWriter + ?Sized,
{
    ensure_role(user, SERVICE_ADMIN_ROLE)?;
    let hub_id = hub_of(user)?;
    let new_item = form.into_new_item(hub_id, kind)?;

    let item = repo.create_reference_item(&new_item).map_err(|err| {
        log::error!("Failed to create {kind} item: {err}");
        err
    })?;
    log::info!("Added {kind} `{}` to hub {hub_id}", item.name);
    Ok(item)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::types::{ReferenceId, ReferenceName};
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::ServiceError;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "admin@example.com".to_string(),
            hub_id: 2,
            name: "Admin".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 0,
        }
    }

    #[test]
    fn creation_is_admin_only() {
        let mut repo = MockRepository::new();
        repo.expect_create_reference_item().times(0);
        let form = AddReferenceForm {
            name: "Welsh".to_string(),
        };

        let result = create_reference_item(
            &repo,
            &user(&[SERVICE_ACCESS_ROLE]),
            ReferenceKind::Language,
            form,
        );

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn duplicate_name_is_a_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_create_reference_item()
            .times(1)
            .returning(|item| {
                Err(RepositoryError::Conflict(format!(
                    "{} `{}` already exists",
                    item.kind, item.name
                )))
            });

        let result = create_reference_item(
            &repo,
            &user(&[SERVICE_ADMIN_ROLE]),
            ReferenceKind::GoalOutcome,
            AddReferenceForm {
                name: "Achieved".to_string(),
            },
        );

        assert!(matches!(result, Err(ServiceError::Conflict(_))));
    }

    #[test]
    fn listing_is_scoped_to_kind() {
        let mut repo = MockRepository::new();
        repo.expect_list_reference_items()
            .withf(|hub, kind| hub.get() == 2 && *kind == ReferenceKind::ClientType)
            .times(1)
            .returning(|_, kind| {
                Ok(vec![ReferenceItem {
                    id: ReferenceId::new(1).unwrap(),
                    kind,
                    name: ReferenceName::new("Private").unwrap(),
                    is_active: true,
                }])
            });

        let items = list_reference_items(
            &repo,
            &user(&[SERVICE_ACCESS_ROLE]),
            ReferenceKind::ClientType,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
    }
}
