use actix_multipart::form::MultipartForm;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::AppointmentsQuery;
use crate::forms::upload::AppointmentUpload;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::{ServiceError, appointments};
use crate::storage::DocumentStore;

#[get("/appointments")]
pub async fn list_appointments(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: AppointmentsQuery = parse_query(&req)?;
    let page = appointments::list_appointments(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/appointments")]
pub async fn create_appointment(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<AppointmentUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let appointment =
        appointments::create_appointment(repo.get_ref(), store.get_ref(), &user, form, files)?;
    Ok(HttpResponse::Created().json(appointment))
}

#[get("/appointments/{appointment_id}")]
pub async fn show_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let appointment =
        appointments::get_appointment(repo.get_ref(), &user, appointment_id.into_inner())?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[put("/appointments/{appointment_id}")]
pub async fn update_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<AppointmentUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let appointment = appointments::update_appointment(
        repo.get_ref(),
        store.get_ref(),
        &user,
        appointment_id.into_inner(),
        form,
        files,
    )?;
    Ok(HttpResponse::Ok().json(appointment))
}

#[delete("/appointments/{appointment_id}")]
pub async fn delete_appointment(
    appointment_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse, ServiceError> {
    appointments::delete_appointment(
        repo.get_ref(),
        store.get_ref(),
        &user,
        appointment_id.into_inner(),
    )?;
    Ok(HttpResponse::NoContent().finish())
}
