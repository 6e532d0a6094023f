//! Reference data handlers. One resource is mounted per kind, carrying the
//! kind as app data.

use actix_web::{HttpResponse, web};

use crate::auth::AuthenticatedUser;
use crate::domain::reference::ReferenceKind;
use crate::forms::reference::AddReferenceForm;
use crate::repository::DieselRepository;
use crate::services::{ServiceError, reference};

pub async fn list_reference_items(
    kind: web::Data<ReferenceKind>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let items = reference::list_reference_items(repo.get_ref(), &user, **kind)?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn create_reference_item(
    kind: web::Data<ReferenceKind>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    form: web::Json<AddReferenceForm>,
) -> Result<HttpResponse, ServiceError> {
    let item = reference::create_reference_item(repo.get_ref(), &user, **kind, form.into_inner())?;
    Ok(HttpResponse::Created().json(item))
}
