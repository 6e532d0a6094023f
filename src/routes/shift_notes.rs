use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::ClientScopedQuery;
use crate::forms::timesheet::{
    BulkExportForm, BulkStatusForm, ExportIncrementForm, StatusCommentForm, StatusQuery,
    TimesheetFilterQuery,
};
use crate::forms::upload::ShiftNoteUpload;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::shift_notes::{self, TimesheetExport};
use crate::services::ServiceError;
use crate::storage::DocumentStore;

#[get("/shiftnotes/time-sheets")]
pub async fn list_timesheets(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: TimesheetFilterQuery = parse_query(&req)?;
    let page = shift_notes::list_timesheets(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[get("/shiftnotes/export/time-sheets")]
pub async fn export_timesheets(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: TimesheetFilterQuery = parse_query(&req)?;
    match shift_notes::export_timesheets(repo.get_ref(), &user, query)? {
        TimesheetExport::Rows(rows) => Ok(HttpResponse::Ok().json(rows)),
        TimesheetExport::Csv(bytes) => Ok(HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename("time-sheets.csv".to_string())],
            })
            .body(bytes)),
    }
}

#[post("/shiftnotes/export/increment")]
pub async fn increment_exports(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<ExportIncrementForm>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = shift_notes::increment_exports(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[post("/shiftnotes/export/bulk-update")]
pub async fn bulk_export(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<BulkExportForm>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = shift_notes::bulk_export(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// The comment is optional; an empty body is accepted.
#[put("/shiftnotes/time-sheets/status/{note_id}")]
pub async fn update_timesheet_status(
    req: HttpRequest,
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    body: web::Bytes,
) -> Result<HttpResponse, ServiceError> {
    let query: StatusQuery = parse_query(&req)?;
    let form: StatusCommentForm = if body.iter().all(u8::is_ascii_whitespace) {
        StatusCommentForm::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ServiceError::Form(format!("invalid payload: {err}")))?
    };
    let row = shift_notes::update_timesheet_status(
        repo.get_ref(),
        &user,
        note_id.into_inner(),
        query,
        form,
    )?;
    Ok(HttpResponse::Ok().json(row))
}

#[post("/shiftnotes/time-sheets/bulk-status-update")]
pub async fn bulk_update_status(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<BulkStatusForm>,
) -> Result<HttpResponse, ServiceError> {
    let rows = shift_notes::bulk_update_status(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Ok().json(rows))
}

#[get("/shiftnotes")]
pub async fn list_shift_notes(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: ClientScopedQuery = parse_query(&req)?;
    let page = shift_notes::list_shift_notes(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/shiftnotes")]
pub async fn create_shift_note(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<ShiftNoteUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let note = shift_notes::create_shift_note(repo.get_ref(), store.get_ref(), &user, form, files)?;
    Ok(HttpResponse::Created().json(note))
}

#[get("/shiftnotes/{note_id:\\d+}")]
pub async fn show_shift_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let note = shift_notes::get_shift_note(repo.get_ref(), &user, note_id.into_inner())?;
    Ok(HttpResponse::Ok().json(note))
}

#[put("/shiftnotes/{note_id:\\d+}")]
pub async fn update_shift_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<ShiftNoteUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let note = shift_notes::update_shift_note(
        repo.get_ref(),
        store.get_ref(),
        &user,
        note_id.into_inner(),
        form,
        files,
    )?;
    Ok(HttpResponse::Ok().json(note))
}

#[delete("/shiftnotes/{note_id:\\d+}")]
pub async fn delete_shift_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse, ServiceError> {
    shift_notes::delete_shift_note(repo.get_ref(), store.get_ref(), &user, note_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
