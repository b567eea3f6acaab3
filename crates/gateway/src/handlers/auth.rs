//! Registration and login handlers
//!
//! Both issue a bearer token on success; registration has no separate
//! confirmation step. Login failures are indistinguishable between unknown
//! email and wrong password.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use scholarcheck_common::{
    auth::{hash_password, verify_password},
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[validate(length(min = 1, max = 200))]
    pub full_name: String,

    #[validate(length(min = 1, max = 64))]
    pub student_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

fn token_response(token: String) -> TokenResponse {
    TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }
}

/// Register a new student account and issue a bearer token
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>> {
    request.validate().map_err(|e| AppError::InvalidArgument {
        message: e.to_string(),
    })?;

    if state
        .repo
        .student_exists(&request.email, &request.student_id)
        .await?
    {
        return Err(AppError::DuplicateAccount);
    }

    let password_hash = hash_password(&request.password)?;

    let student = state
        .repo
        .create_student(
            request.email,
            password_hash,
            request.full_name,
            request.student_id,
        )
        .await?;

    tracing::info!(student_id = student.id, "Student registered");

    let token = state.tokens.issue(&student.email)?;
    Ok(Json(token_response(token)))
}

/// Validate credentials and issue a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    request.validate().map_err(|e| AppError::InvalidArgument {
        message: e.to_string(),
    })?;

    // Unknown email and wrong password take the same exit so neither the
    // status nor the message enumerates accounts.
    let invalid_credentials = || AppError::Unauthorized {
        message: "Incorrect email or password".to_string(),
    };

    let student = state
        .repo
        .find_student_by_email(&request.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&request.password, &student.password_hash) {
        return Err(invalid_credentials());
    }

    tracing::info!(student_id = student.id, "Student logged in");

    let token = state.tokens.issue(&student.email)?;
    Ok(Json(token_response(token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "pw1234".to_string(),
            full_name: "Alice".to_string(),
            student_id: "S1".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let short_password = RegisterRequest {
            password: "pw".to_string(),
            ..valid_clone(&valid)
        };
        assert!(short_password.validate().is_err());
    }

    fn valid_clone(r: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            email: r.email.clone(),
            password: r.password.clone(),
            full_name: r.full_name.clone(),
            student_id: r.student_id.clone(),
        }
    }

    #[test]
    fn test_token_response_shape() {
        let resp = token_response("abc".to_string());
        assert_eq!(resp.token_type, "bearer");
        assert_eq!(resp.access_token, "abc");
    }
}
