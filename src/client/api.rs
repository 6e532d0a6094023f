//! Typed HTTP client over the back-office JSON API.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::domain::appointment::Appointment;
use crate::domain::attachment::PendingFile;
use crate::domain::care_plan::CarePlan;
use crate::domain::client::Client;
use crate::domain::note::Note;
use crate::domain::reference::{ReferenceItem, ReferenceKind};
use crate::domain::resource::Resource;
use crate::domain::shift_note::{PaymentState, ShiftNote};
use crate::dto::query::{AppointmentsQuery, ClientScopedQuery, ClientsQuery, PageQuery};
use crate::dto::timesheet::{BulkExportOutcome, IncrementOutcome, TimesheetRow};
use crate::forms::appointment::AppointmentForm;
use crate::forms::care_plan::CarePlanForm;
use crate::forms::client::ClientForm;
use crate::forms::note::NoteForm;
use crate::forms::reference::AddReferenceForm;
use crate::forms::resource::ResourceForm;
use crate::forms::shift_note::ShiftNoteForm;
use crate::forms::timesheet::{
    BulkExportForm, BulkStatusForm, ExportFormat, ExportIncrementForm, StatusCommentForm,
    TimesheetFilterQuery,
};
use crate::pagination::Paginated;

/// Shown instead of the body of any 5xx response.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Superseded or cancelled request. Never shown to the user.
    #[error("request canceled")]
    Canceled,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text suitable for a notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Canceled => "Request canceled".to_string(),
            ApiError::Http { status, .. } if *status >= 500 => INTERNAL_ERROR_MESSAGE.to_string(),
            ApiError::Http { status, body } => error_text(body).unwrap_or_else(|| {
                StatusCode::from_u16(*status)
                    .ok()
                    .and_then(|code| code.canonical_reason())
                    .unwrap_or("Request failed")
                    .to_string()
            }),
            ApiError::Transport(_) => "Unable to reach the server".to_string(),
            ApiError::Decode(_) => "Unexpected response from the server".to_string(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ApiError::Canceled)
    }
}

/// `error` field of a JSON error body, otherwise the raw body.
fn error_text(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let field = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string));
    Some(field.unwrap_or_else(|| body.to_string()))
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Client bound to one API base URL and bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn checked(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        log::warn!("API call failed with {status}: {body}");
        Err(ApiError::Http {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::checked(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        Self::json(self.request(Method::GET, path)).await
    }

    async fn get_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        Self::json(self.request(Method::GET, path).query(query)).await
    }

    async fn send<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        Self::json(self.request(method, path).json(body)).await
    }

    /// Sends the entity as a JSON text field named `field` plus `files[]` parts.
    async fn send_multipart<T, B>(
        &self,
        method: Method,
        path: &str,
        field: &'static str,
        body: &B,
        files: &[PendingFile],
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let mut form = Form::new().text(field, json);
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.name.clone())
                .mime_str(&file.content_type)?;
            form = form.part("files[]", part);
        }
        Self::json(self.request(method, path).multipart(form)).await
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        Self::checked(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    pub async fn list_clients(&self, query: &ClientsQuery) -> Result<Paginated<Client>, ApiError> {
        self.get_query("/clients", query).await
    }

    pub async fn get_client(&self, id: i32) -> Result<Client, ApiError> {
        self.get(&format!("/clients/{id}")).await
    }

    pub async fn create_client(&self, form: &ClientForm) -> Result<Client, ApiError> {
        self.send(Method::POST, "/clients", form).await
    }

    pub async fn update_client(&self, id: i32, form: &ClientForm) -> Result<Client, ApiError> {
        self.send(Method::PUT, &format!("/clients/{id}"), form)
            .await
    }

    pub async fn delete_client(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/clients/{id}")).await
    }

    pub async fn list_care_plans(
        &self,
        query: &ClientScopedQuery,
    ) -> Result<Paginated<CarePlan>, ApiError> {
        self.get_query("/careplans", query).await
    }

    pub async fn client_care_plans(&self, client_id: i32) -> Result<Vec<CarePlan>, ApiError> {
        self.get(&format!("/careplans/client/{client_id}"))
            .await
    }

    pub async fn get_care_plan(&self, id: i32) -> Result<CarePlan, ApiError> {
        self.get(&format!("/careplans/{id}")).await
    }

    pub async fn create_care_plan(&self, form: &CarePlanForm) -> Result<CarePlan, ApiError> {
        self.send(Method::POST, "/careplans", form).await
    }

    pub async fn update_care_plan(
        &self,
        id: i32,
        form: &CarePlanForm,
    ) -> Result<CarePlan, ApiError> {
        self.send(Method::PUT, &format!("/careplans/{id}"), form)
            .await
    }

    pub async fn delete_care_plan(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/careplans/{id}")).await
    }

    pub async fn list_appointments(
        &self,
        query: &AppointmentsQuery,
    ) -> Result<Paginated<Appointment>, ApiError> {
        self.get_query("/appointments", query).await
    }

    pub async fn get_appointment(&self, id: i32) -> Result<Appointment, ApiError> {
        self.get(&format!("/appointments/{id}")).await
    }

    pub async fn create_appointment(
        &self,
        form: &AppointmentForm,
        files: &[PendingFile],
    ) -> Result<Appointment, ApiError> {
        self.send_multipart(Method::POST, "/appointments", "appointment", form, files)
            .await
    }

    pub async fn update_appointment(
        &self,
        id: i32,
        form: &AppointmentForm,
        files: &[PendingFile],
    ) -> Result<Appointment, ApiError> {
        let path = format!("/appointments/{id}");
        self.send_multipart(Method::PUT, &path, "appointment", form, files)
            .await
    }

    pub async fn delete_appointment(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/appointments/{id}")).await
    }

    pub async fn list_shift_notes(
        &self,
        query: &ClientScopedQuery,
    ) -> Result<Paginated<ShiftNote>, ApiError> {
        self.get_query("/shiftnotes", query).await
    }

    pub async fn get_shift_note(&self, id: i32) -> Result<ShiftNote, ApiError> {
        self.get(&format!("/shiftnotes/{id}")).await
    }

    pub async fn create_shift_note(
        &self,
        form: &ShiftNoteForm,
        files: &[PendingFile],
    ) -> Result<ShiftNote, ApiError> {
        self.send_multipart(Method::POST, "/shiftnotes", "note", form, files)
            .await
    }

    pub async fn update_shift_note(
        &self,
        id: i32,
        form: &ShiftNoteForm,
        files: &[PendingFile],
    ) -> Result<ShiftNote, ApiError> {
        let path = format!("/shiftnotes/{id}");
        self.send_multipart(Method::PUT, &path, "note", form, files)
            .await
    }

    pub async fn delete_shift_note(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/shiftnotes/{id}")).await
    }

    pub async fn list_timesheets(
        &self,
        query: &TimesheetFilterQuery,
    ) -> Result<Paginated<TimesheetRow>, ApiError> {
        self.get_query("/shiftnotes/time-sheets", query).await
    }

    /// Outstanding timesheets as JSON rows, ignoring the requested format.
    pub async fn export_timesheets(
        &self,
        query: &TimesheetFilterQuery,
    ) -> Result<Vec<TimesheetRow>, ApiError> {
        let query = TimesheetFilterQuery {
            format: ExportFormat::Json,
            ..query.clone()
        };
        self.get_query("/shiftnotes/export/time-sheets", &query).await
    }

    pub async fn export_timesheets_csv(
        &self,
        query: &TimesheetFilterQuery,
    ) -> Result<String, ApiError> {
        let query = TimesheetFilterQuery {
            format: ExportFormat::Csv,
            ..query.clone()
        };
        let builder = self
            .request(Method::GET, "/shiftnotes/export/time-sheets")
            .query(&query);
        let response = Self::checked(builder).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn update_timesheet_status(
        &self,
        id: i32,
        status: PaymentState,
        comment: Option<String>,
    ) -> Result<TimesheetRow, ApiError> {
        let builder = self
            .request(Method::PUT, &format!("/shiftnotes/time-sheets/status/{id}"))
            .query(&[("status", status.to_string())])
            .json(&StatusCommentForm { comment });
        Self::json(builder).await
    }

    pub async fn bulk_update_status(
        &self,
        form: &BulkStatusForm,
    ) -> Result<Vec<TimesheetRow>, ApiError> {
        self.send(
            Method::POST,
            "/shiftnotes/time-sheets/bulk-status-update",
            form,
        )
        .await
    }

    pub async fn increment_exports(
        &self,
        form: &ExportIncrementForm,
    ) -> Result<IncrementOutcome, ApiError> {
        self.send(Method::POST, "/shiftnotes/export/increment", form)
            .await
    }

    pub async fn bulk_export(&self, form: &BulkExportForm) -> Result<BulkExportOutcome, ApiError> {
        self.send(Method::POST, "/shiftnotes/export/bulk-update", form)
            .await
    }

    pub async fn list_resources(&self, query: &PageQuery) -> Result<Paginated<Resource>, ApiError> {
        self.get_query("/resources", query).await
    }

    pub async fn get_resource(&self, id: i32) -> Result<Resource, ApiError> {
        self.get(&format!("/resources/{id}")).await
    }

    pub async fn create_resource(
        &self,
        form: &ResourceForm,
        files: &[PendingFile],
    ) -> Result<Resource, ApiError> {
        self.send_multipart(Method::POST, "/resources", "resourceData", form, files)
            .await
    }

    pub async fn update_resource(
        &self,
        id: i32,
        form: &ResourceForm,
        files: &[PendingFile],
    ) -> Result<Resource, ApiError> {
        let path = format!("/resources/{id}");
        self.send_multipart(Method::PUT, &path, "resourceData", form, files)
            .await
    }

    pub async fn delete_resource(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/resources/{id}")).await
    }

    pub async fn list_notes(&self, query: &ClientScopedQuery) -> Result<Paginated<Note>, ApiError> {
        self.get_query("/notes", query).await
    }

    pub async fn get_note(&self, id: i32) -> Result<Note, ApiError> {
        self.get(&format!("/notes/{id}")).await
    }

    pub async fn create_note(
        &self,
        form: &NoteForm,
        files: &[PendingFile],
    ) -> Result<Note, ApiError> {
        self.send_multipart(Method::POST, "/notes", "note", form, files)
            .await
    }

    pub async fn update_note(
        &self,
        id: i32,
        form: &NoteForm,
        files: &[PendingFile],
    ) -> Result<Note, ApiError> {
        let path = format!("/notes/{id}");
        self.send_multipart(Method::PUT, &path, "note", form, files)
            .await
    }

    pub async fn delete_note(&self, id: i32) -> Result<(), ApiError> {
        self.delete(&format!("/notes/{id}")).await
    }

    pub async fn list_reference_items(
        &self,
        kind: ReferenceKind,
    ) -> Result<Vec<ReferenceItem>, ApiError> {
        self.get(&format!("/{}", kind.path())).await
    }

    pub async fn create_reference_item(
        &self,
        kind: ReferenceKind,
        form: &AddReferenceForm,
    ) -> Result<ReferenceItem, ApiError> {
        self.send(Method::POST, &format!("/{}", kind.path()), form)
            .await
    }
}
