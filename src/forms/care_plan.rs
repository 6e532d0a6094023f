//! Care plan form, edited as a three step wizard: details, goals, billables.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::care_plan::{
    CarePlanBillable, CarePlanContent, LongTermGoal, PlanPeriod, ShortTermGoal,
};
use crate::domain::types::{ClientId, Title};
use crate::forms::{
    derived_errors, field_error, finish, optional_date, parse_date, parse_id, parse_optional_id,
    required,
};
use crate::wizard::WizardForm;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortTermGoalForm {
    pub title: String,
    pub outcome_id: Option<i32>,
    pub target_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongTermGoalForm {
    pub title: String,
    pub outcome_id: Option<i32>,
    #[serde(default)]
    pub short_term_goals: Vec<ShortTermGoalForm>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillableForm {
    pub description: String,
    /// Rate per unit in cents.
    pub rate_cents: i64,
    pub units: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for creating or updating a care plan.
pub struct CarePlanForm {
    pub client_id: i32,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    pub status_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Goal rows are checked by `submit`, errors are reported on the list field.
    #[serde(default)]
    pub long_term_goals: Vec<LongTermGoalForm>,
    #[serde(default)]
    pub billables: Vec<BillableForm>,
}

fn title(errors: &mut ValidationErrors, field: &'static str, value: &str) -> Option<Title> {
    Title::new(value)
        .map_err(|_| errors.add(field, field_error("required", "Title is required")))
        .ok()
}

impl CarePlanForm {
    fn goals(&self, errors: &mut ValidationErrors) -> Vec<LongTermGoal> {
        let mut goals = Vec::with_capacity(self.long_term_goals.len());
        for goal in &self.long_term_goals {
            let long_title = title(errors, "long_term_goals", &goal.title);
            let outcome_id = parse_optional_id(errors, "long_term_goals", goal.outcome_id);
            let mut short_term_goals = Vec::with_capacity(goal.short_term_goals.len());
            for short in &goal.short_term_goals {
                let short_title = title(errors, "long_term_goals", &short.title);
                let outcome_id = parse_optional_id(errors, "long_term_goals", short.outcome_id);
                let target_date =
                    optional_date(errors, "long_term_goals", short.target_date.as_deref());
                if let Some(title) = short_title {
                    short_term_goals.push(ShortTermGoal {
                        title,
                        outcome_id,
                        target_date,
                    });
                }
            }
            if let Some(title) = long_title {
                goals.push(LongTermGoal {
                    title,
                    outcome_id,
                    short_term_goals,
                });
            }
        }
        goals
    }

    fn billable_lines(&self, errors: &mut ValidationErrors) -> Vec<CarePlanBillable> {
        let mut lines = Vec::with_capacity(self.billables.len());
        for line in &self.billables {
            if line.rate_cents < 0 || line.units == 0 {
                errors.add(
                    "billables",
                    field_error("range", "Rate must not be negative and units must be positive"),
                );
                continue;
            }
            if let Some(description) = title(errors, "billables", &line.description) {
                lines.push(CarePlanBillable {
                    description,
                    rate_cents: line.rate_cents,
                    units: line.units,
                });
            }
        }
        lines
    }
}

impl WizardForm for CarePlanForm {
    type Output = CarePlanContent;
    const STEP_COUNT: usize = 3;

    fn step_of_field(field: &str) -> usize {
        match field {
            "long_term_goals" => 1,
            "billables" => 2,
            _ => 0,
        }
    }

    fn submit(&self) -> Result<CarePlanContent, ValidationErrors> {
        let mut errors = derived_errors(self.validate());

        let client_id: Option<ClientId> = parse_id(&mut errors, "client_id", self.client_id);
        let plan_title = title(&mut errors, "title", &self.title);
        let status_id = parse_optional_id(&mut errors, "status_id", self.status_id);
        let start = required(&mut errors, "start_date", self.start_date.as_deref())
            .and_then(|value| parse_date(&mut errors, "start_date", value));
        let end = optional_date(&mut errors, "end_date", self.end_date.as_deref());
        let period = start.and_then(|start| {
            PlanPeriod::new(start, end)
                .map_err(|_| {
                    errors.add(
                        "end_date",
                        field_error("range", "End date must not precede start date"),
                    )
                })
                .ok()
        });
        let long_term_goals = self.goals(&mut errors);
        let billables = self.billable_lines(&mut errors);

        finish(errors)?;

        match (client_id, plan_title, period) {
            (Some(client_id), Some(title), Some(period)) => Ok(CarePlanContent {
                client_id,
                title,
                status_id,
                period,
                long_term_goals,
                billables,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::Wizard;

    fn form() -> CarePlanForm {
        CarePlanForm {
            client_id: 3,
            title: "Home support".to_string(),
            status_id: Some(1),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-06-30".to_string()),
            long_term_goals: vec![LongTermGoalForm {
                title: "Independent living".to_string(),
                outcome_id: None,
                short_term_goals: vec![ShortTermGoalForm {
                    title: "Cook twice a week".to_string(),
                    outcome_id: Some(2),
                    target_date: Some("2024-03-01".to_string()),
                }],
            }],
            billables: vec![BillableForm {
                description: "Personal care".to_string(),
                rate_cents: 6_000,
                units: 10,
            }],
        }
    }

    #[test]
    fn valid_form_builds_goal_tree() {
        let content = form().submit().unwrap();
        assert_eq!(content.long_term_goals.len(), 1);
        assert_eq!(content.long_term_goals[0].short_term_goals.len(), 1);
        assert_eq!(content.billables[0].total_cents(), 60_000);
    }

    #[test]
    fn end_before_start_is_a_field_error() {
        let form = CarePlanForm {
            end_date: Some("2023-12-31".to_string()),
            ..form()
        };
        let errors = form.submit().unwrap_err();
        assert!(errors.errors().contains_key("end_date"));
    }

    #[test]
    fn invalid_goal_sends_wizard_back_to_goals_step() {
        let mut form = form();
        form.long_term_goals[0].short_term_goals[0].title = String::new();

        let mut wizard = Wizard::for_form::<CarePlanForm>();
        wizard.next();
        wizard.next();
        assert!(wizard.is_last_step());

        assert!(wizard.submit(&form).is_err());
        assert_eq!(wizard.active_step(), 1);
    }

    #[test]
    fn missing_start_date_sends_wizard_to_first_step() {
        let form = CarePlanForm {
            start_date: None,
            ..form()
        };
        let mut wizard = Wizard::for_form::<CarePlanForm>();
        wizard.next();
        let errors = wizard.submit(&form).unwrap_err();
        assert!(errors.errors().contains_key("start_date"));
        assert_eq!(wizard.active_step(), 0);
    }
}
