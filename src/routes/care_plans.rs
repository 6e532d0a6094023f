use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};

use crate::auth::AuthenticatedUser;
use crate::dto::query::ClientScopedQuery;
use crate::forms::care_plan::CarePlanForm;
use crate::repository::DieselRepository;
use crate::routes::parse_query;
use crate::services::{ServiceError, care_plans};

#[get("/careplans/client/{client_id}")]
pub async fn list_client_care_plans(
    client_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let plans = care_plans::list_client_care_plans(repo.get_ref(), &user, client_id.into_inner())?;
    Ok(HttpResponse::Ok().json(plans))
}

#[get("/careplans")]
pub async fn list_care_plans(
    req: HttpRequest,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let query: ClientScopedQuery = parse_query(&req)?;
    let page = care_plans::list_care_plans(repo.get_ref(), &user, query)?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/careplans")]
pub async fn create_care_plan(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<CarePlanForm>,
) -> Result<HttpResponse, ServiceError> {
    let plan = care_plans::create_care_plan(repo.get_ref(), &user, form.into_inner())?;
    Ok(HttpResponse::Created().json(plan))
}

#[get("/careplans/{plan_id:\\d+}")]
pub async fn show_care_plan(
    plan_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let plan = care_plans::get_care_plan(repo.get_ref(), &user, plan_id.into_inner())?;
    Ok(HttpResponse::Ok().json(plan))
}

#[put("/careplans/{plan_id:\\d+}")]
pub async fn update_care_plan(
    plan_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<CarePlanForm>,
) -> Result<HttpResponse, ServiceError> {
    let plan = care_plans::update_care_plan(
        repo.get_ref(),
        &user,
        plan_id.into_inner(),
        form.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(plan))
}

#[delete("/careplans/{plan_id:\\d+}")]
pub async fn delete_care_plan(
    plan_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    care_plans::delete_care_plan(repo.get_ref(), &user, plan_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
