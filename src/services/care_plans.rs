//! Care plans and their goal tree.

use crate::auth::{AuthenticatedUser, ensure_role};
use crate::domain::care_plan::{CarePlan, NewCarePlan};
use crate::domain::types::{CarePlanId, ClientId};
use crate::dto::query::ClientScopedQuery;
use crate::forms::care_plan::CarePlanForm;
use crate::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use crate::repository::{CarePlanListQuery, CarePlanReader, CarePlanWriter, ClientReader};
use crate::services::{ServiceError, ServiceResult, ensure_client_in_hub, hub_of, page_or_first};
use crate::wizard::Wizard;
use crate::SERVICE_ACCESS_ROLE;

pub fn list_care_plans<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ClientScopedQuery,
) -> ServiceResult<Paginated<CarePlan>>
where
    R: CarePlanReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let page = page_or_first(query.page);
    let mut list_query = CarePlanListQuery::new(hub_id).paginate(page, DEFAULT_ITEMS_PER_PAGE);
    if let Some(client_id) = query.client_id.and_then(|id| ClientId::new(id).ok()) {
        list_query = list_query.client(client_id);
    }

    let (total, plans) = repo.list_care_plans(list_query).map_err(|err| {
        log::error!("Failed to list care plans: {err}");
        err
    })?;

    Ok(Paginated::new(plans, total, page, DEFAULT_ITEMS_PER_PAGE))
}

/// All plans of one client, newest first.
pub fn list_client_care_plans<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: i32,
) -> ServiceResult<Vec<CarePlan>>
where
    R: CarePlanReader + ClientReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let client_id = ClientId::new(client_id).map_err(|_| ServiceError::NotFound)?;

    if repo.get_client_by_id(client_id, hub_id)?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let (_, plans) = repo
        .list_care_plans(CarePlanListQuery::new(hub_id).client(client_id))
        .map_err(|err| {
            log::error!("Failed to list care plans of client {client_id}: {err}");
            err
        })?;
    Ok(plans)
}

pub fn get_care_plan<R>(repo: &R, user: &AuthenticatedUser, plan_id: i32) -> ServiceResult<CarePlan>
where
    R: CarePlanReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let plan_id = CarePlanId::new(plan_id).map_err(|_| ServiceError::NotFound)?;

    repo.get_care_plan_by_id(plan_id, hub_id)
        .map_err(|err| {
            log::error!("Failed to get care plan {plan_id}: {err}");
            err
        })?
        .ok_or(ServiceError::NotFound)
}

/// Validates every wizard step and stores the plan.
pub fn create_care_plan<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CarePlanForm,
) -> ServiceResult<CarePlan>
where
    R: CarePlanWriter + ClientReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;

    let content = Wizard::for_form::<CarePlanForm>().submit(&form)?;
    ensure_client_in_hub(repo, content.client_id, hub_id)?;

    let plan = repo
        .create_care_plan(&NewCarePlan { hub_id, content })
        .map_err(|err| {
            log::error!("Failed to create care plan: {err}");
            err
        })?;
    log::info!("Created care plan {} for client {}", plan.id, plan.client_id);
    Ok(plan)
}

/// Replaces the plan, goal tree and billables included.
pub fn update_care_plan<R>(
    repo: &R,
    user: &AuthenticatedUser,
    plan_id: i32,
    form: CarePlanForm,
) -> ServiceResult<CarePlan>
where
    R: CarePlanWriter + ClientReader + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let plan_id = CarePlanId::new(plan_id).map_err(|_| ServiceError::NotFound)?;

    let content = Wizard::for_form::<CarePlanForm>().submit(&form)?;
    ensure_client_in_hub(repo, content.client_id, hub_id)?;

    Ok(repo
        .update_care_plan(plan_id, hub_id, &content)
        .map_err(|err| {
            log::error!("Failed to update care plan {plan_id}: {err}");
            err
        })?)
}

pub fn delete_care_plan<R>(repo: &R, user: &AuthenticatedUser, plan_id: i32) -> ServiceResult<()>
where
    R: CarePlanWriter + ?Sized,
{
    ensure_role(user, SERVICE_ACCESS_ROLE)?;
    let hub_id = hub_of(user)?;
    let plan_id = CarePlanId::new(plan_id).map_err(|_| ServiceError::NotFound)?;

    repo.delete_care_plan(plan_id, hub_id).map_err(|err| {
        log::error!("Failed to delete care plan {plan_id}: {err}");
        err
    })?;
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::forms::care_plan::LongTermGoalForm;
    use crate::repository::mock::MockRepository;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".to_string(),
            email: "planner@example.com".to_string(),
            hub_id: 5,
            name: "Planner".to_string(),
            roles: vec![SERVICE_ACCESS_ROLE.to_string()],
            exp: 0,
        }
    }

    fn form() -> CarePlanForm {
        CarePlanForm {
            client_id: 9,
            title: "Mobility plan".to_string(),
            start_date: Some("2024-05-01".to_string()),
            long_term_goals: vec![LongTermGoalForm {
                title: "Walk unaided".to_string(),
                ..LongTermGoalForm::default()
            }],
            ..CarePlanForm::default()
        }
    }

    #[test]
    fn plan_for_client_outside_hub_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .times(1)
            .returning(|_, _| Ok(None));
        repo.expect_create_care_plan().times(0);

        let result = create_care_plan(&repo, &user(), form());

        match result {
            Err(ServiceError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("client_id"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn invalid_goal_blocks_creation() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id().times(0);
        repo.expect_create_care_plan().times(0);
        let mut form = form();
        form.long_term_goals[0].title = String::new();

        let result = create_care_plan(&repo, &user(), form);

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }
}
