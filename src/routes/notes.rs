use actix_multipart::form::MultipartForm;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::ClientScopedQuery;
use crate::forms::upload::NoteUpload;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::{ServiceError, notes};
use crate::storage::DocumentStore;

#[get("/notes")]
pub async fn list_notes(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: ClientScopedQuery = parse_query(&req)?;
    let page = notes::list_notes(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/notes")]
pub async fn create_note(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<NoteUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let note = notes::create_note(repo.get_ref(), store.get_ref(), &user, form, files)?;
    Ok(HttpResponse::Created().json(note))
}

#[get("/notes/{note_id}")]
pub async fn show_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let note = notes::get_note(repo.get_ref(), &user, note_id.into_inner())?;
    Ok(HttpResponse::Ok().json(note))
}

#[put("/notes/{note_id}")]
pub async fn update_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<NoteUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let note = notes::update_note(
        repo.get_ref(),
        store.get_ref(),
        &user,
        note_id.into_inner(),
        form,
        files,
    )?;
    Ok(HttpResponse::Ok().json(note))
}

#[delete("/notes/{note_id}")]
pub async fn delete_note(
    note_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse, ServiceError> {
    notes::delete_note(repo.get_ref(), store.get_ref(), &user, note_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
