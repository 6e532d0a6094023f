//! Care plans: a goal tree plus billable items for one client.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CarePlanId, ClientId, HubId, ReferenceId, Title, TypeConstraintError};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ShortTermGoal {
    pub title: Title,
    pub outcome_id: Option<ReferenceId>,
    pub target_date: Option<NaiveDate>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LongTermGoal {
    pub title: Title,
    pub outcome_id: Option<ReferenceId>,
    #[serde(default)]
    pub short_term_goals: Vec<ShortTermGoal>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CarePlanBillable {
    pub description: Title,
    /// Rate per unit in cents.
    pub rate_cents: i64,
    pub units: u32,
}

impl CarePlanBillable {
    /// Total value of the line in cents.
    #[must_use]
    pub fn total_cents(&self) -> i64 {
        self.rate_cents * i64::from(self.units)
    }
}

/// Validity window of a plan. `end` is never before `start`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanPeriod {
    start: NaiveDate,
    end: Option<NaiveDate>,
}

impl PlanPeriod {
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self, TypeConstraintError> {
        if end.is_some_and(|end| end < start) {
            return Err(TypeConstraintError::InvalidValue(
                "plan end date precedes start date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether the plan covers the given day.
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && self.end.is_none_or(|end| day <= end)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CarePlan {
    pub id: CarePlanId,
    pub hub_id: HubId,
    pub client_id: ClientId,
    pub title: Title,
    pub status_id: Option<ReferenceId>,
    pub period: PlanPeriod,
    pub long_term_goals: Vec<LongTermGoal>,
    pub billables: Vec<CarePlanBillable>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CarePlan {
    #[must_use]
    pub fn billable_total_cents(&self) -> i64 {
        self.billables.iter().map(CarePlanBillable::total_cents).sum()
    }
}

/// Editable content of a care plan, shared by create and update.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CarePlanContent {
    pub client_id: ClientId,
    pub title: Title,
    pub status_id: Option<ReferenceId>,
    pub period: PlanPeriod,
    pub long_term_goals: Vec<LongTermGoal>,
    pub billables: Vec<CarePlanBillable>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NewCarePlan {
    pub hub_id: HubId,
    pub content: CarePlanContent,
}
