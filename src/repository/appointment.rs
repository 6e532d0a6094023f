use chrono::{NaiveTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::appointment::{Appointment, AppointmentContent};
use crate::domain::document::{Document, OwnerKind};
use crate::domain::types::{AppointmentId, HubId};
use crate::models::appointment::{
    Appointment as DbAppointment, NewAppointment as DbNewAppointment,
    UpdateAppointment as DbUpdateAppointment,
};
use crate::repository::document::{delete_owner_documents, load_documents};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AppointmentListQuery, AppointmentReader, AppointmentWriter, DieselRepository,
};
use crate::schema::appointments;

fn filtered(query: &AppointmentListQuery) -> appointments::BoxedQuery<'static, Sqlite> {
    let mut items = appointments::table
        .filter(appointments::hub_id.eq(query.hub_id.get()))
        .into_boxed();
    if let Some(client_id) = query.client_id {
        items = items.filter(appointments::client_id.eq(client_id.get()));
    }
    if let Some(from) = query.from {
        items = items.filter(appointments::start_at.ge(from.and_time(NaiveTime::MIN)));
    }
    if let Some(next_day) = query.to.and_then(|to| to.succ_opt()) {
        items = items.filter(appointments::start_at.lt(next_day.and_time(NaiveTime::MIN)));
    }
    items
}

fn with_documents(
    conn: &mut SqliteConnection,
    hub_id: HubId,
    rows: Vec<DbAppointment>,
) -> RepositoryResult<Vec<Appointment>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut documents = load_documents(conn, hub_id, OwnerKind::Appointment, &ids)?;
    rows.into_iter()
        .map(|row| {
            let owner_id = row.id;
            let mut appointment = Appointment::try_from(row)?;
            appointment.documents = documents.remove(&owner_id).unwrap_or_default();
            Ok(appointment)
        })
        .collect()
}

impl AppointmentReader for DieselRepository {
    fn get_appointment_by_id(
        &self,
        id: AppointmentId,
        hub_id: HubId,
    ) -> RepositoryResult<Option<Appointment>> {
        let mut conn = self.conn()?;
        let row = appointments::table
            .filter(appointments::id.eq(id.get()))
            .filter(appointments::hub_id.eq(hub_id.get()))
            .select(DbAppointment::as_select())
            .first::<DbAppointment>(&mut conn)
            .optional()?;

        match row {
            Some(row) => Ok(with_documents(&mut conn, hub_id, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn list_appointments(
        &self,
        query: AppointmentListQuery,
    ) -> RepositoryResult<(usize, Vec<Appointment>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(&query).count().get_result(&mut conn)?;

        let mut items =
            filtered(&query).order((appointments::start_at.asc(), appointments::id.asc()));
        if let Some(pagination) = &query.pagination {
            items = items.limit(pagination.limit()).offset(pagination.offset());
        }
        let rows = items
            .select(DbAppointment::as_select())
            .load::<DbAppointment>(&mut conn)?;

        Ok((total as usize, with_documents(&mut conn, query.hub_id, rows)?))
    }
}

impl AppointmentWriter for DieselRepository {
    fn create_appointment(
        &self,
        hub_id: HubId,
        content: &AppointmentContent,
    ) -> RepositoryResult<Appointment> {
        let mut conn = self.conn()?;
        let insertable = DbNewAppointment::from_domain(hub_id, content)?;
        let created = diesel::insert_into(appointments::table)
            .values(&insertable)
            .returning(DbAppointment::as_returning())
            .get_result::<DbAppointment>(&mut conn)?;

        Ok(Appointment::try_from(created)?)
    }

    fn update_appointment(
        &self,
        id: AppointmentId,
        hub_id: HubId,
        content: &AppointmentContent,
    ) -> RepositoryResult<Appointment> {
        let mut conn = self.conn()?;
        let changes = DbUpdateAppointment::from_domain(content, Utc::now().naive_utc())?;

        let updated = diesel::update(
            appointments::table
                .filter(appointments::id.eq(id.get()))
                .filter(appointments::hub_id.eq(hub_id.get())),
        )
        .set(&changes)
        .returning(DbAppointment::as_returning())
        .get_result::<DbAppointment>(&mut conn)?;

        Ok(with_documents(&mut conn, hub_id, vec![updated])?
            .pop()
            .ok_or(RepositoryError::NotFound)?)
    }

    fn delete_appointment(
        &self,
        id: AppointmentId,
        hub_id: HubId,
    ) -> RepositoryResult<Vec<Document>> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let deleted = diesel::delete(
                appointments::table
                    .filter(appointments::id.eq(id.get()))
                    .filter(appointments::hub_id.eq(hub_id.get())),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(RepositoryError::NotFound);
            }
            delete_owner_documents(conn, hub_id, OwnerKind::Appointment, &[id.get()])
        })
    }
}
