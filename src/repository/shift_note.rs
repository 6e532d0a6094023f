use chrono::{NaiveTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::document::{Document, OwnerKind};
use crate::domain::export::{BulkExportAction, BulkExportPlan, is_outstanding};
use crate::domain::shift_note::{PaymentState, ShiftNote, ShiftNoteContent};
use crate::domain::types::{HubId, ShiftNoteId};
use crate::models::shift_note::{
    NewShiftNote as DbNewShiftNote, ShiftNote as DbShiftNote,
    UpdateShiftNote as DbUpdateShiftNote,
};
use crate::repository::document::{delete_owner_documents, load_documents};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ShiftNoteListQuery, ShiftNoteReader, ShiftNoteWriter};
use crate::schema::shift_notes;

fn filtered(query: &ShiftNoteListQuery) -> shift_notes::BoxedQuery<'static, Sqlite> {
    let mut items = shift_notes::table
        .filter(shift_notes::hub_id.eq(query.hub_id.get()))
        .into_boxed();
    if let Some(client_id) = query.client_id {
        items = items.filter(shift_notes::client_id.eq(client_id.get()));
    }
    if let Some(caregiver_id) = query.caregiver_id {
        items = items.filter(shift_notes::caregiver_id.eq(caregiver_id.get()));
    }
    if let Some(state) = query.payment_state {
        items = items.filter(shift_notes::payment_state.eq(state.to_string()));
    }
    if query.outstanding_only {
        let outstanding: Vec<String> = PaymentState::ALL
            .into_iter()
            .filter(|state| is_outstanding(*state))
            .map(|state| state.to_string())
            .collect();
        items = items.filter(shift_notes::payment_state.eq_any(outstanding));
    }
    if let Some(from) = query.from {
        items = items.filter(shift_notes::shift_start.ge(from.and_time(NaiveTime::MIN)));
    }
    if let Some(next_day) = query.to.and_then(|to| to.succ_opt()) {
        items = items.filter(shift_notes::shift_start.lt(next_day.and_time(NaiveTime::MIN)));
    }
    items
}

fn with_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    rows: Vec<DbShiftNote>,
) -> RepositoryResult<Vec<ShiftNote>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut documents = load_documents(conn, hub_id, OwnerKind::ShiftNote, &ids)?;
    rows.into_iter()
        .map(|row| {
            let owner_id = row.id;
            let mut note = ShiftNote::try_from(row)?;
            note.documents = documents.remove(&owner_id).unwrap_or_default();
            Ok(note)
        })
        .collect()
}

fn raw_ids(ids: &[ShiftNoteId]) -> Vec<i32> {
    let mut raw: Vec<i32> = ids.iter().map(|id| id.get()).collect();
    raw.sort_unstable();
    raw.dedup();
    raw
}

/// Loads the selected rows of one hub, failing if any id is unknown.
fn load_selected(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    ids: &[i32],
) -> RepositoryResult<Vec<DbShiftNote>> {
    let rows = shift_notes::table
        .filter(shift_notes::hub_id.eq(hub_id.get()))
        .filter(shift_notes::id.eq_any(ids))
        .select(DbShiftNote::as_select())
        .load::<DbShiftNote>(conn)?;
    if rows.len() != ids.len() {
        return Err(RepositoryError::NotFound);
    }
    Ok(rows)
}

impl ShiftNoteReader for DieselRepository {
    fn get_shift_note_by_id(
        &self,
        id: ShiftNoteId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<ShiftNote>> {
        let mut conn = self.conn()?;
        let row = shift_notes::table
            .filter(shift_notes::id.eq(id.get()))
            .filter(shift_notes::hub_id.eq(hub_id.get()))
            .select(DbShiftNote::as_select())
            .first::<DbShiftNote>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(with_documents(&mut conn, hub_id, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_shift_notes(
        &self,
        query: ShiftNoteListQuery,
    ) -> RepositoryResult<(usize, Vec<ShiftNote>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items =
            filtered(&query).order((shift_notes::shift_start.desc(), shift_notes::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }
        let rows = items
            .select(DbShiftNote::as_select())
            .load::<DbShiftNote>(&mut conn)?;

        Ok((total as usize, with_documents(&mut conn, query.hub_id, rows)?))
    }
}

impl ShiftNoteWriter for DieselRepository {
    fn create_shift_note(
        &self,
        hub_id: HubId,
        content: &ShiftNoteContent,
    ) -> RepositoryResult<ShiftNote> {
        let mut conn = self.conn()?;
        let insertable = DbNewShiftNote::from_domain(hub_id, content)?;
        let created = diesel::insert_into(shift_notes::table)
            .values(&insertable)
            .returning(DbShiftNote::as_returning())
            .get_result::<DbShiftNote>(&mut conn)?;

        Ok(ShiftNote::try_from(created)?)
    }

    fn update_shift_note(
        &self,
        id: ShiftNoteId,
        hub_id: HubId,
        content: &ShiftNoteContent,
    ) -> RepositoryResult<ShiftNote> {
        let mut conn = self.conn()?;
        let changes = DbUpdateShiftNote::from_domain(content, Utc::now().naive_utc())?;

        let updated = diesel::update(
            shift_notes::table
                .filter(shift_notes::id.eq(id.get()))
                .filter(shift_notes::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbShiftNote::as_returning())
        .get_result::<DbShiftNote>(&mut conn)?;

        with_documents(&mut conn, hub_id, vec![updated])?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    fn delete_shift_note(
        &self,
        id: ShiftNoteId,
        hub_id: HubId,
    ) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                shift_notes::table
                    .filter(shift_notes::id.eq(id.get()))
                    .filter(shift_notes::hub_id.eq(hub_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            delete_owner_documents(conn, hub_id, OwnerKind::ShiftNote, &[id.get()])
        })
    }

    fn update_payment_states(
        &self,
        hub_id: HubId,
        ids: &[ShiftNoteId],
        status: PaymentState,
        comment: Option<String>,
    ) -> RepositoryResult<Vec<ShiftNote>> {
        let ids = raw_ids(ids);
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            for row in load_selected(conn, hub_id, &ids)? {
                let current = PaymentState::try_from(row.payment_state.as_str())?;
                current
                    .transition(status)
                    .map_err(|e| RepositoryError::Conflict(format!("timesheet {}: {e}", row.id)))?;
            }

            let target = shift_notes::table
                .filter(shift_notes::hub_id.eq(hub_id.get()))
                .filter(shift_notes::id.eq_any(&ids));
            let now = Utc::now().naive_utc();
            let updated = match comment {
                Some(comment) => diesel::update(target)
                    .set((
                        shift_notes::payment_state.eq(status.to_string()),
                        shift_notes::comment.eq(Some(comment)),
                        shift_notes::updated_at.eq(now),
                    ))
                    .returning(DbShiftNote::as_returning())
                    .get_results::<DbShiftNote>(conn)?,
                None => diesel::update(target)
                    .set((
                        shift_notes::payment_state.eq(status.to_string()),
                        shift_notes::updated_at.eq(now),
                    ))
                    .returning(DbShiftNote::as_returning())
                    .get_results::<DbShiftNote>(conn)?,
            };

            with_documents(conn, hub_id, updated)
        })
    }

    fn increment_export_counts(
        &self,
        hub_id: HubId,
        ids: &[ShiftNoteId],
    ) -> RepositoryResult<usize> {
        let ids = raw_ids(ids);
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            load_selected(conn, hub_id, &ids)?;
            let updated = diesel::update(
                shift_notes::table
                    .filter(shift_notes::hub_id.eq(hub_id.get()))
                    .filter(shift_notes::id.eq_any(&ids)),
            )
            .set((
                shift_notes::export_count.eq(shift_notes::export_count + 1),
                shift_notes::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;
            Ok(updated)
        })
    }

    fn apply_bulk_export(
        &self,
        hub_id: HubId,
        ids: &[ShiftNoteId],
        action: BulkExportAction,
    ) -> RepositoryResult<BulkExportPlan> {
        let ids = raw_ids(ids);
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let counts = load_selected(conn, hub_id, &ids)?
                .into_iter()
                .map(|row| Ok((ShiftNoteId::new(row.id)?, row.export_count)))
                .collect::<RepositoryResult<Vec<_>>>()?;
            let plan = BulkExportPlan::from_counts(counts);
            if !plan.is_enabled(action) {
                return Err(RepositoryError::Conflict(format!(
                    "{action:?} does not apply to the selected timesheets"
                )));
            }

            let (to_export, to_reset) = plan.updates(action);
            let now = Utc::now().naive_utc();
            set_export_count(conn, hub_id, to_export, 1, now)?;
            set_export_count(conn, hub_id, to_reset, 0, now)?;
            Ok(plan)
        })
    }
}

fn set_export_count(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    ids: &[ShiftNoteId],
    export_count: i32,
    now: chrono::NaiveDateTime,
) -> RepositoryResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let raw: Vec<i32> = ids.iter().map(|id| id.get()).collect();
    Ok(diesel::update(
        shift_notes::table
            .filter(shift_notes::hub_id.eq(hub_id.get()))
            .filter(shift_notes::id.eq_any(raw)),
    )
    .set((
        shift_notes::export_count.eq(export_count),
        shift_notes::updated_at.eq(now),
    ))
    .execute(conn)?)
}
