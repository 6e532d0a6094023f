use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::document::{Document, OwnerKind};
use crate::domain::note::{Note, NoteContent};
use crate::domain::types::{HubId, NoteId};
use crate::models::note::{NewNote as DbNewNote, Note as DbNote, UpdateNote as DbUpdateNote};
use crate::repository::document::{delete_owner_documents, load_documents};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, NoteListQuery, NoteReader, NoteWriter};
use crate::schema::notes;

fn filtered(query: &NoteListQuery) -> notes::BoxedQuery<'static, Sqlite> {
    let mut items = notes::table
        .filter(notes::hub_id.eq(query.hub_id.get()))
        .into_boxed();
    if let Some(client_id) = query.client_id {
        items = items.filter(notes::client_id.eq(client_id.get()));
    }
    items
}

fn with_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    rows: Vec<DbNote>,
) -> RepositoryResult<Vec<Note>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut documents = load_documents(conn, hub_id, OwnerKind::Note, &ids)?;
    rows.into_iter()
        .map(|row| {
            let owner_id = row.id;
            let mut note = Note::try_from(row)?;
            note.documents = documents.remove(&owner_id).unwrap_or_default();
            Ok(note)
        })
        .collect()
}

impl NoteReader for DieselRepository {
    fn get_note_by_id(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Option<Note>> {
        let mut conn = self.conn()?;
        let row = notes::table
            .filter(notes::id.eq(id.get()))
            .filter(notes::hub_id.eq(hub_id.get()))
            .select(DbNote::as_select())
            .first::<DbNote>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(with_documents(&mut conn, hub_id, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_notes(&self, query: NoteListQuery) -> RepositoryResult<(usize, Vec<Note>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items = filtered(&query).order((notes::effective_date.desc(), notes::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }
        let rows = items.select(DbNote::as_select()).load::<DbNote>(&mut conn)?;

        Ok((total as usize, with_documents(&mut conn, query.hub_id, rows)?))
    }
}

impl NoteWriter for DieselRepository {
    fn create_note(&self, hub_id: HubId, content: &NoteContent) -> RepositoryResult<Note> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(notes::table)
            .values(&DbNewNote::from_domain(hub_id, content))
            .returning(DbNote::as_returning())
            .get_result::<DbNote>(&mut conn)?;

        Ok(Note::try_from(created)?)
    }

    fn update_note(
        &self,
        id: NoteId,
        hub_id: HubId,
        content: &NoteContent,
    ) -> RepositoryResult<Note> {
        let mut conn = self.conn()?;
        let changes = DbUpdateNote::from_domain(content, Utc::now().naive_utc());

        let updated = diesel::update(
            notes::table
                .filter(notes::id.eq(id.get()))
                .filter(notes::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbNote::as_returning())
        .get_result::<DbNote>(&mut conn)?;

        with_documents(&mut conn, hub_id, vec![updated])?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    fn delete_note(&self, id: NoteId, hub_id: HubId) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                notes::table
                    .filter(notes::id.eq(id.get()))
                    .filter(notes::hub_id.eq(hub_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            delete_owner_documents(conn, hub_id, OwnerKind::Note, &[id.get()])
        })
    }
}
