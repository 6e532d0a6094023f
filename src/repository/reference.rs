use diesel::prelude::*;

use crate::domain::reference::{NewReferenceItem, ReferenceItem, ReferenceKind};
use crate::domain::types::HubId;
use crate::models::reference::{
    NewReferenceItem as DbNewReferenceItem, ReferenceItem as DbReferenceItem,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ReferenceReader, ReferenceWriter};
use crate::schema::reference_items;

impl ReferenceReader for DieselRepository {
    fn list_reference_items(
        &self,
        hub_id: HubId,
        kind: ReferenceKind,
    ) -> RepositoryResult<Vec<ReferenceItem>> {
        let mut conn = self.conn()?;

        let items = reference_items::table
            .filter(reference_items::hub_id.eq(hub_id.get()))
            .filter(reference_items::kind.eq(kind.to_string()))
            .filter(reference_items::is_active.eq(true))
            .order(reference_items::name.asc())
            .select(DbReferenceItem::as_select())
            .load::<DbReferenceItem>(&mut conn)?;

        items
            .into_iter()
            .map(|item| ReferenceItem::try_from(item).map_err(RepositoryError::from))
            .collect()
    }
}

impl ReferenceWriter for DieselRepository {
    fn create_reference_item(&self, item: &NewReferenceItem) -> RepositoryResult<ReferenceItem> {
        let mut conn = self.conn()?;

        let exists: i64 = reference_items::table
            .filter(reference_items::hub_id.eq(item.hub_id.get()))
            .filter(reference_items::kind.eq(item.kind.to_string()))
            .filter(reference_items::name.eq(item.name.as_str()))
            .count()
            .get_result(&mut conn)?;
        if exists > 0 {
            return Err(RepositoryError::Conflict(format!(
                "{} `{}` already exists",
                item.kind,
                item.name.as_str()
            )));
        }

        let created = diesel::insert_into(reference_items::table)
            .values(&DbNewReferenceItem::from(item))
            .returning(DbReferenceItem::as_returning())
            .get_result::<DbReferenceItem>(&mut conn)?;

        Ok(ReferenceItem::try_from(created)?)
    }
}
