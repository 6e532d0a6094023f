//! Multi-step form wizard.
//!
//! The wizard only tracks which step is shown. Submitting validates the whole
//! form through [`WizardForm`] and, on failure, moves back to the earliest
//! step that owns an invalid field.

use validator::ValidationErrors;

/// A form split across wizard steps.
pub trait WizardForm {
    /// Validated payload produced on successful submit.
    type Output;

    /// Number of steps the form is split into.
    const STEP_COUNT: usize;

    /// Step index that renders the given top-level field.
    fn step_of_field(field: &str) -> usize;

    /// Validates every step and builds the payload.
    fn submit(&self) -> Result<Self::Output, ValidationErrors>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wizard {
    active_step: usize,
    step_count: usize,
}

impl Wizard {
    /// Creates a wizard positioned on the first step.
    pub fn new(step_count: usize) -> Self {
        Self {
            active_step: 0,
            step_count: step_count.max(1),
        }
    }

    pub fn for_form<F: WizardForm>() -> Self {
        Self::new(F::STEP_COUNT)
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Back is offered on every step but the first.
    pub fn can_go_back(&self) -> bool {
        self.active_step > 0
    }

    /// On the last step the primary action becomes "Save".
    pub fn is_last_step(&self) -> bool {
        self.active_step + 1 == self.step_count
    }

    /// Advances one step. Returns `false` on the last step, where Save applies.
    pub fn next(&mut self) -> bool {
        if self.is_last_step() {
            return false;
        }
        self.active_step += 1;
        true
    }

    /// Goes back one step. Returns `false` on the first step.
    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.active_step -= 1;
        true
    }

    /// Validates the whole form.
    ///
    /// On failure the wizard jumps to the earliest step with an error and the
    /// errors are returned untouched.
    pub fn submit<F: WizardForm>(&mut self, form: &F) -> Result<F::Output, ValidationErrors> {
        form.submit().map_err(|errors| {
            if let Some(step) = errors
                .errors()
                .keys()
                .map(|field| F::step_of_field(field))
                .min()
            {
                self.active_step = step.min(self.step_count - 1);
            }
            errors
        })
    }
}

#[cfg(test)]
mod tests {
    use validator::ValidationError;

    use super::*;

    struct TwoFieldForm {
        first: String,
        last: String,
    }

    impl WizardForm for TwoFieldForm {
        type Output = String;
        const STEP_COUNT: usize = 3;

        fn step_of_field(field: &str) -> usize {
            match field {
                "first" => 0,
                "last" => 2,
                _ => 1,
            }
        }

        fn submit(&self) -> Result<String, ValidationErrors> {
            let mut errors = ValidationErrors::new();
            if self.first.is_empty() {
                errors.add("first", ValidationError::new("required"));
            }
            if self.last.is_empty() {
                errors.add("last", ValidationError::new("required"));
            }
            if errors.is_empty() {
                Ok(format!("{} {}", self.first, self.last))
            } else {
                Err(errors)
            }
        }
    }

    #[test]
    fn back_disabled_exactly_on_first_step() {
        let mut wizard = Wizard::new(3);
        assert!(!wizard.can_go_back());
        assert!(!wizard.back());
        assert!(wizard.next());
        assert!(wizard.can_go_back());
        assert!(wizard.back());
        assert_eq!(wizard.active_step(), 0);
    }

    #[test]
    fn next_increments_by_one_until_last_step() {
        let mut wizard = Wizard::for_form::<TwoFieldForm>();
        for expected in 1..3 {
            let before = wizard.active_step();
            assert!(wizard.next());
            assert_eq!(wizard.active_step(), before + 1);
            assert_eq!(wizard.active_step(), expected);
        }
        assert!(wizard.is_last_step());
        assert!(!wizard.next());
        assert_eq!(wizard.active_step(), 2);
    }

    #[test]
    fn failed_submit_returns_to_earliest_invalid_step() {
        let mut wizard = Wizard::for_form::<TwoFieldForm>();
        wizard.next();
        wizard.next();

        let form = TwoFieldForm {
            first: String::new(),
            last: String::new(),
        };
        let errors = wizard.submit(&form).unwrap_err();
        assert!(errors.errors().contains_key("first"));
        assert_eq!(wizard.active_step(), 0);
    }

    #[test]
    fn successful_submit_keeps_position() {
        let mut wizard = Wizard::for_form::<TwoFieldForm>();
        wizard.next();
        let form = TwoFieldForm {
            first: "Ada".into(),
            last: "Lovelace".into(),
        };
        assert_eq!(wizard.submit(&form).unwrap(), "Ada Lovelace");
        assert_eq!(wizard.active_step(), 1);
    }
}
