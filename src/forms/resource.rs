use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::resource::{ResourceContent, Validity};
use crate::domain::types::{DocumentId, ShareScope, Title};
use crate::forms::{
    derived_errors, field_error, finish, optional_date, parse_date, removed_documents, required,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for a shared resource, sent as the `resourceData` multipart field.
pub struct ResourceForm {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub valid_from: Option<String>,
    pub valid_to: Option<String>,
    #[serde(default)]
    pub share_scope: ShareScope,
    #[serde(default)]
    pub removed_document_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourcePayload {
    pub content: ResourceContent,
    pub removed_document_ids: Vec<DocumentId>,
}

impl TryFrom<&ResourceForm> for ResourcePayload {
    type Error = ValidationErrors;

    fn try_from(form: &ResourceForm) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(form.validate());

        let title = Title::new(form.title.as_str())
            .map_err(|_| errors.add("title", field_error("required", "Title is required")))
            .ok();
        let from = required(&mut errors, "valid_from", form.valid_from.as_deref())
            .and_then(|value| parse_date(&mut errors, "valid_from", value));
        let to = optional_date(&mut errors, "valid_to", form.valid_to.as_deref());
        let validity = from.and_then(|from| {
            Validity::new(from, to)
                .map_err(|_| {
                    errors.add(
                        "valid_to",
                        field_error("range", "Validity must not end before it starts"),
                    )
                })
                .ok()
        });
        let removed_document_ids = removed_documents(&mut errors, &form.removed_document_ids);

        finish(errors)?;

        match (title, validity) {
            (Some(title), Some(validity)) => Ok(Self {
                content: ResourceContent {
                    title,
                    description: form
                        .description
                        .as_deref()
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                    validity,
                    share_scope: form.share_scope,
                },
                removed_document_ids,
            }),
            _ => Err(ValidationErrors::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_requires_title_and_start() {
        let form = ResourceForm {
            title: " ".to_string(),
            ..ResourceForm::default()
        };
        let errors = ResourcePayload::try_from(&form).unwrap_err();
        assert!(errors.errors().contains_key("title"));
        assert!(errors.errors().contains_key("valid_from"));
    }

    #[test]
    fn open_ended_validity_is_accepted() {
        let form = ResourceForm {
            title: "Manual handling guide".to_string(),
            valid_from: Some("2024-01-01".to_string()),
            share_scope: ShareScope::Public,
            removed_document_ids: vec![3],
            ..ResourceForm::default()
        };
        let payload = ResourcePayload::try_from(&form).unwrap();
        assert!(payload.content.validity.to().is_none());
        assert_eq!(payload.removed_document_ids.len(), 1);
    }

    #[test]
    fn validity_end_before_start_is_rejected() {
        let form = ResourceForm {
            title: "Policy".to_string(),
            valid_from: Some("2024-05-01".to_string()),
            valid_to: Some("2024-04-30".to_string()),
            ..ResourceForm::default()
        };
        let errors = ResourcePayload::try_from(&form).unwrap_err();
        assert!(errors.errors().contains_key("valid_to"));
    }
}
