use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::document::{Document, OwnerKind};
use crate::domain::resource::{Resource, ResourceContent};
use crate::domain::types::{HubId, ResourceId};
use crate::models::resource::{
    NewResource as DbNewResource, Resource as DbResource, UpdateResource as DbUpdateResource,
};
use crate::repository::document::{delete_owner_documents, load_documents};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, HubListQuery, ResourceReader, ResourceWriter};
use crate::schema::resources;

fn filtered(query: &HubListQuery) -> resources::BoxedQuery<'static, Sqlite> {
    resources::table
        .filter(resources::hub_id.eq(query.hub_id.get()))
        .into_boxed()
}

fn with_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    rows: Vec<DbResource>,
) -> RepositoryResult<Vec<Resource>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut documents = load_documents(conn, hub_id, OwnerKind::Resource, &ids)?;
    rows.into_iter()
        .map(|row| {
            let owner_id = row.id;
            let mut resource = Resource::try_from(row)?;
            resource.documents = documents.remove(&owner_id).unwrap_or_default();
            Ok(resource)
        })
        .collect()
}

impl ResourceReader for DieselRepository {
    fn get_resource_by_id(
        &self,
        id: ResourceId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Resource>> {
        let mut conn = self.conn()?;
        let row = resources::table
            .filter(resources::id.eq(id.get()))
            .filter(resources::hub_id.eq(hub_id.get()))
            .select(DbResource::as_select())
            .first::<DbResource>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(with_documents(&mut conn, hub_id, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_resources(&self, query: HubListQuery) -> RepositoryResult<(usize, Vec<Resource>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items =
            filtered(&query).order((resources::valid_from.desc(), resources::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }
        let rows = items
            .select(DbResource::as_select())
            .load::<DbResource>(&mut conn)?;

        Ok((total as usize, with_documents(&mut conn, query.hub_id, rows)?))
    }
}

impl ResourceWriter for DieselRepository {
    fn create_resource(
        &self,
        hub_id: HubId,
        content: &ResourceContent,
    ) -> RepositoryResult<Resource> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(resources::table)
            .values(&DbNewResource::from_domain(hub_id, content))
            .returning(DbResource::as_returning())
            .get_result::<DbResource>(&mut conn)?;

        Ok(Resource::try_from(created)?)
    }

    fn update_resource(
        &self,
        id: ResourceId,
        hub_id: HubId,
        content: &ResourceContent,
    ) -> RepositoryResult<Resource> {
        let mut conn = self.conn()?;
        let changes = DbUpdateResource::from_domain(content, Utc::now().naive_utc());

        let updated = diesel::update(
            resources::table
                .filter(resources::id.eq(id.get()))
                .filter(resources::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbResource::as_returning())
        .get_result::<DbResource>(&mut conn)?;

        with_documents(&mut conn, hub_id, vec![updated])?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    fn delete_resource(&self, id: ResourceId, hub_id: HubId) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                resources::table
                    .filter(resources::id.eq(id.get()))
                    .filter(resources::hub_id.eq(hub_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            delete_owner_documents(conn, hub_id, OwnerKind::Resource, &[id.get()])
        })
    }
}
