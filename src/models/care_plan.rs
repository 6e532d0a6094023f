use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::care_plan::{
    CarePlan as DomainCarePlan, CarePlanContent, NewCarePlan as DomainNewCarePlan, PlanPeriod,
};
use crate::domain::types::{
    CarePlanId, ClientId, HubId, ReferenceId, Title, TypeConstraintError,
};
use crate::models::{decode_json, encode_json};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::care_plans)]
pub struct CarePlan {
    pub id: i32,
    pub hub_id: i32,
    pub client_id: i32,
    pub title: String,
    pub status_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub long_term_goals: String,
    pub billables: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::care_plans)]
pub struct NewCarePlan<'a> {
    pub hub_id: i32,
    pub client_id: i32,
    pub title: &'a str,
    pub status_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub long_term_goals: String,
    pub billables: String,
}

/// Goal tree and billables are replaced wholesale.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::care_plans)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateCarePlan<'a> {
    pub client_id: i32,
    pub title: &'a str,
    pub status_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub long_term_goals: String,
    pub billables: String,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<CarePlan> for DomainCarePlan {
    type Error = TypeConstraintError;

    fn try_from(plan: CarePlan) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CarePlanId::new(plan.id)?,
            hub_id: HubId::new(plan.hub_id)?,
            client_id: ClientId::new(plan.client_id)?,
            title: Title::new(plan.title)?,
            status_id: plan.status_id.map(ReferenceId::new).transpose()?,
            period: PlanPeriod::new(plan.start_date, plan.end_date)?,
            long_term_goals: decode_json(&plan.long_term_goals)?,
            billables: decode_json(&plan.billables)?,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        })
    }
}

impl<'a> TryFrom<&'a DomainNewCarePlan> for NewCarePlan<'a> {
    type Error = TypeConstraintError;

    fn try_from(plan: &'a DomainNewCarePlan) -> Result<Self, Self::Error> {
        let content = &plan.content;
        Ok(Self {
            hub_id: plan.hub_id.get(),
            client_id: content.client_id.get(),
            title: content.title.as_str(),
            status_id: content.status_id.map(ReferenceId::get),
            start_date: content.period.start(),
            end_date: content.period.end(),
            long_term_goals: encode_json(&content.long_term_goals)?,
            billables: encode_json(&content.billables)?,
        })
    }
}

impl<'a> UpdateCarePlan<'a> {
    pub fn from_domain(
        content: &'a CarePlanContent,
        updated_at: NaiveDateTime,
    ) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            client_id: content.client_id.get(),
            title: content.title.as_str(),
            status_id: content.status_id.map(ReferenceId::get),
            start_date: content.period.start(),
            end_date: content.period.end(),
            long_term_goals: encode_json(&content.long_term_goals)?,
            billables: encode_json(&content.billables)?,
            updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn goal_tree_is_decoded_from_json() {
        let now = Utc::now().naive_utc();
        let row = CarePlan {
            id: 1,
            hub_id: 1,
            client_id: 9,
            title: "Plan".to_string(),
            status_id: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            long_term_goals: concat!(
                r#"[{"title":"Walk daily","outcome_id":null,"short_term_goals":"#,
                r#"[{"title":"Walk to shop","outcome_id":2,"target_date":"2024-02-01"}]}]"#
            )
            .to_string(),
            billables: r#"[{"description":"Visit","rate_cents":4500,"units":4}]"#.to_string(),
            created_at: now,
            updated_at: now,
        };
        let plan = DomainCarePlan::try_from(row).unwrap();
        assert_eq!(plan.long_term_goals[0].short_term_goals[0].title.as_str(), "Walk to shop");
        assert_eq!(plan.billable_total_cents(), 18_000);
    }
}
