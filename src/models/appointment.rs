use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::appointment::{
    Appointment as DomainAppointment, AppointmentContent, JobAssigns, RecurrentWork, Schedule,
};
use crate::domain::types::{
    AppointmentId, CarePlanId, ClientId, HubId, ReferenceId, Title, TypeConstraintError,
};
use crate::models::{decode_optional_json, encode_optional_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::appointments)]
pub struct Appointment {
    pub id: i32,
    pub hub_id: i32,
    pub client_id: i32,
    pub care_plan_id: Option<i32>,
    pub appointment_type_id: Option<i32>,
    pub title: String,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub address: Option<String>,
    pub recurrence: Option<String>,
    pub job_assigns: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::appointments)]
pub struct NewAppointment<'a> {
    pub hub_id: i32,
    pub client_id: i32,
    pub care_plan_id: Option<i32>,
    pub appointment_type_id: Option<i32>,
    pub title: &'a str,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub address: Option<&'a str>,
    pub recurrence: Option<String>,
    pub job_assigns: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::appointments)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateAppointment<'a> {
    pub client_id: i32,
    pub care_plan_id: Option<i32>,
    pub appointment_type_id: Option<i32>,
    pub title: &'a str,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub address: Option<&'a str>,
    pub recurrence: Option<String>,
    pub job_assigns: Option<String>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Appointment> for DomainAppointment {
    type Error = TypeConstraintError;

    fn try_from(appointment: Appointment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AppointmentId::new(appointment.id)?,
            hub_id: HubId::new(appointment.hub_id)?,
            client_id: ClientId::new(appointment.client_id)?,
            care_plan_id: appointment.care_plan_id.map(CarePlanId::new).transpose()?,
            appointment_type_id: appointment
                .appointment_type_id
                .map(ReferenceId::new)
                .transpose()?,
            title: Title::new(appointment.title)?,
            schedule: Schedule::new(appointment.start_at, appointment.end_at)?,
            address: appointment.address,
            recurrence: decode_optional_json::<RecurrentWork>(appointment.recurrence.as_deref())?,
            job_assigns: decode_optional_json::<JobAssigns>(appointment.job_assigns.as_deref())?,
            documents: Vec::new(),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        })
    }
}

impl<'a> NewAppointment<'a> {
    pub fn from_domain(
        hub_id: HubId,
        content: &'a AppointmentContent,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            hub_id: hub_id.get(),
            client_id: content.client_id.get(),
            care_plan_id: content.care_plan_id.map(CarePlanId::get),
            appointment_type_id: content.appointment_type_id.map(ReferenceId::get),
            title: content.title.as_str(),
            start_at: content.schedule.start(),
            end_at: content.schedule.end(),
            address: content.address.as_deref(),
            recurrence: encode_optional_json(content.recurrence.as_ref())?,
            job_assigns: encode_optional_json(content.job_assigns.as_ref())?,
        })
    }
}

impl<'a> UpdateAppointment<'a> {
    pub fn from_domain(
        content: &'a AppointmentContent,
        updated_at: NaiveDateTime,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            client_id: content.client_id.get(),
            care_plan_id: content.care_plan_id.map(CarePlanId::get),
            appointment_type_id: content.appointment_type_id.map(ReferenceId::get),
            title: content.title.as_str(),
            start_at: content.schedule.start(),
            end_at: content.schedule.end(),
            address: content.address.as_deref(),
            recurrence: encode_optional_json(content.recurrence.as_ref())?,
            job_assigns: encode_optional_json(content.job_assigns.as_ref())?,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;
    use crate::domain::appointment::RecurrenceType;

    #[test]
    fn recurrence_survives_the_json_column() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let content = AppointmentContent {
            client_id: ClientId::new(1).unwrap(),
            care_plan_id: None,
            appointment_type_id: None,
            title: Title::new("Visit").unwrap(),
            schedule: Schedule::new(start, start + chrono::Duration::hours(1)).unwrap(),
            address: None,
            recurrence: Some(
                RecurrentWork::new(RecurrenceType::Weekly, Some(Weekday::Mon), 2, 10).unwrap(),
            ),
            job_assigns: None,
        };
        let insertable = NewAppointment::from_domain(HubId::new(1).unwrap(), &content).unwrap();
        let row = Appointment {
            id: 5,
            hub_id: insertable.hub_id,
            client_id: insertable.client_id,
            care_plan_id: None,
            appointment_type_id: None,
            title: insertable.title.to_string(),
            start_at: insertable.start_at,
            end_at: insertable.end_at,
            address: None,
            recurrence: insertable.recurrence.clone(),
            job_assigns: None,
            created_at: start,
            updated_at: start,
        };
        let appointment = DomainAppointment::try_from(row).unwrap();
        assert_eq!(appointment.recurrence, content.recurrence);
        assert!(appointment.job_assigns.is_none());
    }
}
