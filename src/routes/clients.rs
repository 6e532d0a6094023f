use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::ClientsQuery;
use crate::forms::client::ClientForm;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::{ServiceError, clients};
use crate::storage::DocumentStore;

#[get("/clients")]
pub async fn list_clients(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: ClientsQuery = parse_query(&req)?;
    let page = clients::list_clients(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/clients")]
pub async fn create_client(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client = clients::create_client(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(client))
}

#[get("/clients/{client_id}")]
pub async fn show_client(
    client_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let client = clients::get_client(repo.get_ref(), &user, client_id.into_inner())?;
    Ok(HttpResponse::Ok().json(client))
}

#[put("/clients/{client_id}")]
pub async fn update_client(
    client_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client = clients::update_client(
        repo.get_ref(),
        &user,
        client_id.into_inner(),
        form.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(client))
}

#[delete("/clients/{client_id}")]
pub async fn delete_client(
    client_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse, ServiceError> {
    clients::delete_client(repo.get_ref(), store.get_ref(), &user, client_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
