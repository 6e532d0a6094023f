//! Bearer-token authentication for the JSON API.
//!
//! Tokens are HS256 JWTs signed with `ServerConfig::secret`. The claims carry
//! the caller's hub, which scopes every query the request makes.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::config::ServerConfig;
use crate::services::{ServiceError, ServiceResult};

/// Claims of an authenticated back-office user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub hub_id: i32,
    pub name: String,
    pub roles: Vec<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<AuthenticatedUser>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
    }

    /// Signs the claims into a bearer token.
    pub fn to_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequest for AuthenticatedUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(config) = req.app_data::<web::Data<ServerConfig>>() else {
            log::error!("Server configuration is not registered");
            return ready(Err(ErrorInternalServerError("Internal server error")));
        };
        let Some(token) = bearer_token(req) else {
            return ready(Err(ErrorUnauthorized("Missing bearer token")));
        };
        ready(
            AuthenticatedUser::from_token(token, &config.secret).map_err(|e| {
                log::warn!("Rejected bearer token: {e}");
                ErrorUnauthorized("Invalid bearer token")
            }),
        )
    }
}

pub fn check_role(role: &str, roles: &[String]) -> bool {
    roles.iter().any(|r| r == role)
}

/// Fails with [`ServiceError::Unauthorized`] unless the user holds `role`.
pub fn ensure_role(user: &AuthenticatedUser, role: &str) -> ServiceResult<()> {
    if check_role(role, &user.roles) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "7".to_string(),
            email: "coordinator@example.com".to_string(),
            hub_id: 3,
            name: "Coordinator".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            exp: 4_102_444_800,
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let original = user(&["care"]);
        let token = original.to_token("secret").unwrap();
        assert_eq!(AuthenticatedUser::from_token(&token, "secret").unwrap(), original);
        assert!(AuthenticatedUser::from_token(&token, "other").is_err());
    }

    #[test]
    fn ensure_role_requires_exact_role() {
        assert!(ensure_role(&user(&["care"]), "care").is_ok());
        assert!(matches!(
            ensure_role(&user(&["care"]), "care_admin"),
            Err(ServiceError::Unauthorized)
        ));
    }
}
