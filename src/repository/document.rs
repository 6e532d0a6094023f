use std::collections::HashMap;

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::domain::document::{Document, NewDocument, OwnerKind};
use crate::domain::types::{DocumentId, HubId};
use crate::models::document::{Document as DbDocument, NewDocument as DbNewDocument};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, DocumentReader, DocumentWriter};
use crate::schema::documents;

/// Loads the documents of several owners, newest first, keyed by owner id.
pub(crate) fn load_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    owner_kind: OwnerKind,
    owner_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<Document>>> {
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = documents::table
        .filter(documents::hub_id.eq(hub_id.get()))
        .filter(documents::owner_kind.eq(owner_kind.to_string()))
        .filter(documents::owner_id.eq_any(owner_ids))
        .order((documents::created_at.desc(), documents::id.desc()))
        .select(DbDocument::as_select())
        .load::<DbDocument>(conn)?;

    let mut grouped: HashMap<i32, Vec<Document>> = HashMap::new();
    for row in rows {
        let owner_id = row.owner_id;
        grouped
            .entry(owner_id)
            .or_default()
            .push(Document::try_from(row)?);
    }
    Ok(grouped)
}

/// Deletes every document of the given owners, returning the removed rows.
pub(crate) fn delete_owner_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    owner_kind: OwnerKind,
    owner_ids: &[i32],
) -> RepositoryResult<Vec<Document>> {
    if owner_ids.is_empty() {
        return Ok(Vec::new());
    }

    diesel::delete(
        documents::table
            .filter(documents::hub_id.eq(hub_id.get()))
            .filter(documents::owner_kind.eq(owner_kind.to_string()))
            .filter(documents::owner_id.eq_any(owner_ids)),
    )
    .returning(DbDocument::as_returning())
    .get_results::<DbDocument>(conn)?
    .into_iter()
    .map(|row| Document::try_from(row).map_err(Into::into))
    .collect()
}

impl DocumentReader for DieselRepository {
    fn list_documents(
        &self,
        hub_id: HubId,
        owner_kind: OwnerKind,
        owner_id: i32,
    ) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        let mut grouped = load_documents(&mut conn, hub_id, owner_kind, &[owner_id])?;
        Ok(grouped.remove(&owner_id).unwrap_or_default())
    }
}

impl DocumentWriter for DieselRepository {
    fn create_documents(&self, new_documents: &[NewDocument]) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let mut created = Vec::with_capacity(new_documents.len());
            for document in new_documents {
                let insertable = DbNewDocument::try_from(document)?;
                let row = diesel::insert_into(documents::table)
                    .values(&insertable)
                    .returning(DbDocument::as_returning())
                    .get_result::<DbDocument>(conn)?;
                created.push(Document::try_from(row)?);
            }
            Ok(created)
        })
    }

    fn delete_documents(
        &self,
        hub_id: HubId,
        owner_kind: OwnerKind,
        owner_id: i32,
        ids: &[DocumentId],
    ) -> RepositoryResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw_ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let mut conn = self.conn()?;

        diesel::delete(
            documents::table
                .filter(documents::hub_id.eq(hub_id.get()))
                .filter(documents::owner_kind.eq(owner_kind.to_string()))
                .filter(documents::owner_id.eq(owner_id))
                .filter(documents::id.eq_any(raw_ids)),
        )
        .returning(DbDocument::as_returning())
        .get_results::<DbDocument>(&mut conn)?
        .into_iter()
        .map(|row| Document::try_from(row).map_err(Into::into))
        .collect()
    }
}
