use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::care_plan::{CarePlan, CarePlanContent, NewCarePlan};
use crate::domain::types::{CarePlanId, HubId};
use crate::models::care_plan::{
    CarePlan as DbCarePlan, NewCarePlan as DbNewCarePlan, UpdateCarePlan as DbUpdateCarePlan,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CarePlanListQuery, CarePlanReader, CarePlanWriter, DieselRepository};
use crate::schema::care_plans;

fn filtered(query: &CarePlanListQuery) -> care_plans::BoxedQuery<'static, Sqlite> {
    let mut items = care_plans::table
        .filter(care_plans::hub_id.eq(query.hub_id.get()))
        .into_boxed();
    if let Some(client_id) = query.client_id {
        items = items.filter(care_plans::client_id.eq(client_id.get()));
    }
    items
}

impl CarePlanReader for DieselRepository {
    fn get_care_plan_by_id(
        &self,
        id: CarePlanId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<CarePlan>> {
        let mut conn = self.conn()?;
        let plan = care_plans::table
            .filter(care_plans::id.eq(id.get()))
            .filter(care_plans::hub_id.eq(hub_id.get()))
            .select(DbCarePlan::as_select())
            .first::<DbCarePlan>(&mut conn)
            .optional()?;

        plan.map(CarePlan::try_from).transpose().map_err(Into::into)
    }

    fn list_care_plans(
        &self,
        query: CarePlanListQuery,
    ) -> RepositoryResult<(usize, Vec<CarePlan>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items =
            filtered(&query).order((care_plans::start_date.desc(), care_plans::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let plans = items
            .select(DbCarePlan::as_select())
            .load::<DbCarePlan>(&mut conn)?
            .into_iter()
            .map(CarePlan::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, plans))
    }
}

impl CarePlanWriter for DieselRepository {
    fn create_care_plan(&self, new_plan: &NewCarePlan) -> RepositoryResult<CarePlan> {
        let mut conn = self.conn()?;
        let insertable = DbNewCarePlan::try_from(new_plan)?;
        let created = diesel::insert_into(care_plans::table)
            .values(&insertable)
            .returning(DbCarePlan::as_returning())
            .get_result::<DbCarePlan>(&mut conn)?;

        Ok(CarePlan::try_from(created)?)
    }

    fn update_care_plan(
        &self,
        id: CarePlanId,
        hub_id: HubId,
        content: &CarePlanContent,
    ) -> RepositoryResult<CarePlan> {
        let mut conn = self.conn()?;
        let changes = DbUpdateCarePlan::from_domain(content, Utc::now().naive_utc())?;

        let updated = diesel::update(
            care_plans::table
                .filter(care_plans::id.eq(id.get()))
                .filter(care_plans::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbCarePlan::as_returning())
        .get_result::<DbCarePlan>(&mut conn)?;

        Ok(CarePlan::try_from(updated)?)
    }

    fn delete_care_plan(&self, id: CarePlanId, hub_id: HubId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            care_plans::table
                .filter(care_plans::id.eq(id.get()))
                .filter(care_plans::hub_id.eq(hub_id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
