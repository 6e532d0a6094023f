//! Multipart bodies for entities that carry attachments.
//!
//! Each body holds the entity as a JSON text field plus any number of
//! `files[]` parts.

use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::de::DeserializeOwned;

use crate::domain::attachment::PendingFile;
use crate::domain::document::accepts_size;
use crate::forms::FormError;
use crate::forms::appointment::AppointmentForm;
use crate::forms::note::NoteForm;
use crate::forms::resource::ResourceForm;
use crate::forms::shift_note::ShiftNoteForm;

#[derive(MultipartForm)]
pub struct AppointmentUpload {
    pub appointment: Text<String>,
    #[multipart(rename = "files[]")]
    pub files: Vec<TempFile>,
}

#[derive(MultipartForm)]
pub struct ShiftNoteUpload {
    pub note: Text<String>,
    #[multipart(rename = "files[]")]
    pub files: Vec<TempFile>,
}

#[derive(MultipartForm)]
pub struct ResourceUpload {
    #[multipart(rename = "resourceData")]
    pub resource_data: Text<String>,
    #[multipart(rename = "files[]")]
    pub files: Vec<TempFile>,
}

#[derive(MultipartForm)]
pub struct NoteUpload {
    pub note: Text<String>,
    #[multipart(rename = "files[]")]
    pub files: Vec<TempFile>,
}

impl AppointmentUpload {
    pub fn into_parts(self) -> Result<(AppointmentForm, Vec<PendingFile>), FormError> {
        split(self.appointment, self.files)
    }
}

impl ShiftNoteUpload {
    pub fn into_parts(self) -> Result<(ShiftNoteForm, Vec<PendingFile>), FormError> {
        split(self.note, self.files)
    }
}

impl ResourceUpload {
    pub fn into_parts(self) -> Result<(ResourceForm, Vec<PendingFile>), FormError> {
        split(self.resource_data, self.files)
    }
}

impl NoteUpload {
    pub fn into_parts(self) -> Result<(NoteForm, Vec<PendingFile>), FormError> {
        split(self.note, self.files)
    }
}

fn split<T: DeserializeOwned>(
    json: Text<String>,
    files: Vec<TempFile>,
) -> Result<(T, Vec<PendingFile>), FormError> {
    let form = parse_json_field(&json)?;
    Ok((form, read_files(files)?))
}

/// Decodes the JSON text part of a multipart body.
pub fn parse_json_field<T: DeserializeOwned>(raw: &str) -> Result<T, FormError> {
    serde_json::from_str(raw).map_err(|e| FormError::InvalidPayload(e.to_string()))
}

/// Loads uploaded parts into memory, dropping files over the attachment limit.
pub fn read_files(files: Vec<TempFile>) -> Result<Vec<PendingFile>, FormError> {
    let mut accepted = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name
            .clone()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "attachment".to_string());
        if !accepts_size(file.size as u64) {
            log::warn!("Dropping upload `{name}`: {} bytes over limit", file.size);
            continue;
        }
        let content_type = file
            .content_type
            .as_ref()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = std::fs::read(file.file.path())
            .map_err(|e| FormError::InvalidPayload(format!("unreadable upload `{name}`: {e}")))?;
        accepted.push(PendingFile::new(name, content_type, bytes));
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_field_errors_are_invalid_payloads() {
        let parsed: Result<NoteForm, _> = parse_json_field("{not json");
        assert!(matches!(parsed, Err(FormError::InvalidPayload(_))));

        let parsed: NoteForm =
            parse_json_field(r#"{"title":"Visit","effective_date":"2024-01-02"}"#).unwrap();
        assert_eq!(parsed.title, "Visit");
        assert!(parsed.removed_document_ids.is_empty());
    }
}
