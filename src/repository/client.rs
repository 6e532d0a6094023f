use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::document::{Document, OwnerKind};
use crate::domain::types::{ClientId, HubId};
use crate::models::client::{
    Client as DbClient, NewClient as DbNewClient, UpdateClient as DbUpdateClient,
};
use crate::repository::document::delete_owner_documents;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ClientListQuery, ClientReader, ClientWriter, DieselRepository};
use crate::schema::{appointments, clients, notes, shift_notes};

fn filtered(query: &ClientListQuery) -> clients::BoxedQuery<'static, Sqlite> {
    let mut items = clients::table
        .filter(clients::hub_id.eq(query.hub_id.get()))
        .into_boxed();

    if let Some(term) = query.search.as_deref() {
        let pattern = format!("%{}%", term.trim());
        items = items.filter(
            clients::name
                .like(pattern.clone())
                .or(clients::email.like(pattern.clone()))
                .or(clients::phone.like(pattern.clone()))
                .or(clients::physical_address.like(pattern)),
        );
    }
    items
}

impl ClientReader for DieselRepository {
    fn get_client_by_id(&self, id: ClientId, hub_id: HubId) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        let client = clients::table
            .filter(clients::id.eq(id.get()))
            .filter(clients::hub_id.eq(hub_id.get()))
            .select(DbClient::as_select())
            .first::<DbClient>(&mut conn)
            .optional()?;

        client.map(Client::try_from).transpose().map_err(Into::into)
    }

    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items = filtered(&query).order(clients::name.asc());
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }

        let clients = items
            .select(DbClient::as_select())
            .load::<DbClient>(&mut conn)?
            .into_iter()
            .map(Client::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total as usize, clients))
    }
}

impl ClientWriter for DieselRepository {
    fn create_client(&self, new_client: &NewClient) -> RepositoryResult<Client> {
        let mut conn = self.conn()?;
        let insertable = DbNewClient::try_from(new_client)?;
        let created = diesel::insert_into(clients::table)
            .values(&insertable)
            .returning(DbClient::as_returning())
            .get_result::<DbClient>(&mut conn)?;

        Ok(Client::try_from(created)?)
    }

    fn update_client(
        &self,
        client_id: ClientId,
        hub_id: HubId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client> {
        let mut conn = self.conn()?;
        let changes = DbUpdateClient::from_domain(updates, Utc::now().naive_utc())?;

        let updated = diesel::update(
            clients::table
                .filter(clients::id.eq(client_id.get()))
                .filter(clients::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbClient::as_returning())
        .get_result::<DbClient>(&mut conn)?;

        Ok(Client::try_from(updated)?)
    }

    fn delete_client(&self, client_id: ClientId, hub_id: HubId) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let appointment_ids: Vec<i32> = appointments::table
                .filter(appointments::client_id.eq(client_id.get()))
                .select(appointments::id)
                .load(conn)?;
            let shift_note_ids: Vec<i32> = shift_notes::table
                .filter(shift_notes::client_id.eq(client_id.get()))
                .select(shift_notes::id)
                .load(conn)?;
            let note_ids: Vec<i32> = notes::table
                .filter(notes::client_id.eq(client_id.get()))
                .select(notes::id)
                .load(conn)?;

            let deleted = diesel::delete(
                clients::table
                    .filter(clients::id.eq(client_id.get()))
                    .filter(clients::hub_id.eq(hub_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }

            // Owned rows go with the client through ON DELETE CASCADE.
            let mut removed =
                delete_owner_documents(conn, hub_id, OwnerKind::Appointment, &appointment_ids)?;
            removed.extend(delete_owner_documents(
                conn,
                hub_id,
                OwnerKind::ShiftNote,
                &shift_note_ids,
            )?);
            removed.extend(delete_owner_documents(conn, hub_id, OwnerKind::Note, &note_ids)?);
            Ok(removed)
        })
    }
}
