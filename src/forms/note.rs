use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::domain::note::NoteContent;
use crate::domain::types::{DocumentId, RichText, ShareScope, Title};
use crate::forms::{
    derived_errors, field_error, finish, parse_date, parse_optional_id, removed_documents,
    required,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
/// Form data for a note, sent as the `note` multipart field.
pub struct NoteForm {
    pub client_id: Option<i32>,
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[validate(length(max = 20000))]
    #[serde(default)]
    pub body: String,
    pub effective_date: Option<String>,
    #[serde(default)]
    pub share_scope: ShareScope,
    #[serde(default)]
    pub removed_document_ids: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotePayload {
    pub content: NoteContent,
    pub removed_document_ids: Vec<DocumentId>,
}

impl TryFrom<&NoteForm> for NotePayload {
    type Error = ValidationErrors;

    fn try_from(form: &NoteForm) -> Result<Self, Self::Error> {
        let mut errors = derived_errors(form.validate());

        let client_id = parse_optional_id(&mut errors, "client_id", form.client_id);
        let title = Title::new(form.title.as_str())
            .map_err(|_| errors.add("title", field_error("required", "Title is required")))
            .ok();
        let effective_date = required(&mut errors, "effective_date", form.effective_date.as_deref())
            .and_then(|value| parse_date(&mut errors, "effective_date", value));
        let removed_document_ids = removed_documents(&mut errors, &form.removed_document_ids);

        finish(errors)?;

        match (title, effective_date) {
            (Some(title), Some(effective_date)) => Ok(Self {
                content: NoteContent {
                    client_id,
                    title,
                    body: RichText::new(form.body.as_str()),
                    effective_date,
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
    fn note_body_is_sanitized() {
        let form = NoteForm {
            title: "Family meeting".to_string(),
            body: "<b>Agreed</b><img src=x onerror=alert(1)>".to_string(),
            effective_date: Some("2024-02-10".to_string()),
            ..NoteForm::default()
        };
        let payload = NotePayload::try_from(&form).unwrap();
        assert!(!payload.content.body.as_str().contains("onerror"));
        assert!(payload.content.client_id.is_none());
    }

    #[test]
    fn note_requires_effective_date() {
        let form = NoteForm {
            title: "Call".to_string(),
            client_id: Some(0),
            ..NoteForm::default()
        };
        let errors = NotePayload::try_from(&form).unwrap_err();
        assert!(errors.errors().contains_key("effective_date"));
        assert!(errors.errors().contains_key("client_id"));
    }
}
