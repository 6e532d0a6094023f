use actix_multipart::form::MultipartForm;
use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::PageQuery;
use crate::forms::upload::ResourceUpload;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::{ServiceError, resources};
use crate::storage::DocumentStore;

#[get("/resources")]
pub async fn list_resources(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: PageQuery = parse_query(&req)?;
    let page = resources::list_resources(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/resources")]
pub async fn create_resource(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<ResourceUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let resource = resources::create_resource(repo.get_ref(), store.get_ref(), &user, form, files)?;
    Ok(HttpResponse::Created().json(resource))
}

#[get("/resources/{resource_id}")]
pub async fn show_resource(
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let resource = resources::get_resource(repo.get_ref(), &user, resource_id.into_inner())?;
    Ok(HttpResponse::Ok().json(resource))
}

#[put("/resources/{resource_id}")]
pub async fn update_resource(
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
    MultipartForm(upload): MultipartForm<ResourceUpload>,
) -> Result<HttpResponse, ServiceError> {
    let (form, files) = upload.into_parts()?;
    let resource = resources::update_resource(
        repo.get_ref(),
        store.get_ref(),
        &user,
        resource_id.into_inner(),
        form,
        files,
    )?;
    Ok(HttpResponse::Ok().json(resource))
}

#[delete("/resources/{resource_id}")]
pub async fn delete_resource(
    resource_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse, ServiceError> {
    resources::delete_resource(repo.get_ref(), store.get_ref(), &user, resource_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
