//! Request extractors for the two trust domains
//!
//! `CurrentStudent` authenticates an end user bearer token and resolves it
//! against the student directory. `ServiceKey` authenticates trusted backend
//! callers via the static shared secret. The two are never interchangeable.

use axum::{extract::FromRequestParts, http::request::Parts};
use scholarcheck_common::{
    auth::{extract_bearer, validate_service_key},
    db::models::Student,
    errors::AppError,
};

use crate::AppState;

/// Header carrying the service credential
pub const SERVICE_KEY_HEADER: &str = "x-api-key";

/// The authenticated student behind a bearer token
#[derive(Debug, Clone)]
pub struct CurrentStudent(pub Student);

impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Invalid token format".to_string(),
        })?;

        let claims = state.tokens.verify(token)?;

        // The subject must still exist in the owner directory. A vanished
        // account reads as a credential failure, not a missing resource.
        let student = state
            .repo
            .find_student_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized {
                message: "Could not validate credentials".to_string(),
            })?;

        Ok(CurrentStudent(student))
    }
}

/// Marker for a validated service credential
#[derive(Debug, Clone, Copy)]
pub struct ServiceKey;

impl FromRequestParts<AppState> for ServiceKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(SERVICE_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Forbidden)?;

        if !validate_service_key(presented, &state.config.auth.service_api_key) {
            return Err(AppError::Forbidden);
        }

        Ok(ServiceKey)
    }
}
