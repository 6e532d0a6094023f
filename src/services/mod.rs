//! Business services sitting between the routes and the repository.
//!
//! Every service checks the caller's role, scopes the work to the caller's
//! hub and logs failures before handing them back.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthenticatedUser;
use crate::domain::types::{ClientId, HubId};
use crate::forms::{FormError, field_error};
use crate::repository::ClientReader;
use crate::repository::errors::RepositoryError;

pub mod appointments;
pub mod attachments;
pub mod care_plans;
pub mod clients;
pub mod notes;
pub mod reference;
pub mod resources;
pub mod shift_notes;

/// Response text for anything that must not leak internals.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Form(String),

    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(errors) => ServiceError::Validation(errors),
            FormError::NotConfirmed => {
                ServiceError::Form("Type `confirm` to run this action".to_string())
            }
            other => ServiceError::Form(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Form(_)
            | ServiceError::Validation(_)
            | ServiceError::TypeConstraint(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Repository(RepositoryError::ConstraintViolation(_)) => {
                StatusCode::CONFLICT
            }
            ServiceError::Repository(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            ServiceError::Validation(errors) => json!({
                "error": "Validation failed",
                "fields": errors,
            }),
            ServiceError::Repository(RepositoryError::ConstraintViolation(_)) => {
                json!({ "error": "The record conflicts with existing data" })
            }
            _ if status.is_server_error() => json!({ "error": INTERNAL_ERROR_MESSAGE }),
            other => json!({ "error": other.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

/// Hub every query of this user is scoped to.
pub(crate) fn hub_of(user: &AuthenticatedUser) -> ServiceResult<HubId> {
    Ok(HubId::new(user.hub_id)?)
}

/// Rejects references to clients outside the caller's hub.
pub(crate) fn ensure_client_in_hub<R>(
    repo: &R,
    client_id: ClientId,
    hub_id: HubId,
) -> ServiceResult<()>
where
    R: ClientReader + ?Sized,
{
    let client = repo.get_client_by_id(client_id, hub_id).map_err(|err| {
        log::error!("Failed to look up client {client_id}: {err}");
        err
    })?;
    if client.is_some() {
        return Ok(());
    }
    let mut errors = ValidationErrors::new();
    errors.add("client_id", field_error("unknown", "Unknown client"));
    Err(ServiceError::Validation(errors))
}

/// Requested page, never below one.
pub(crate) fn page_or_first(page: Option<usize>) -> usize {
    page.filter(|page| *page > 0).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let err = ServiceError::Repository(RepositoryError::DatabaseError(
            "disk I/O error at /var/lib/app.db".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains(INTERNAL_ERROR_MESSAGE));
        assert!(!text.contains("disk"));
    }

    #[test]
    fn repository_errors_map_to_matching_statuses() {
        assert_eq!(
            ServiceError::from(RepositoryError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::from(RepositoryError::Conflict("paid".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::from(FormError::NotConfirmed).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page_or_first(None), 1);
        assert_eq!(page_or_first(Some(0)), 1);
        assert_eq!(page_or_first(Some(4)), 4);
    }
}
