//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use super::dto::{JwtResponse, SigninRequest, SignupRequest, UserInfo};
use crate::application::IdentityService;
use crate::interfaces::http::common::{ApiResponse, ErrorResponse, ValidatedJson};
use crate::shared::DomainError;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub identity: Arc<IdentityService>,
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created with role USER", body = ApiResponse<UserInfo>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), DomainError> {
    let user = state
        .identity
        .signup(&request.email, &request.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(UserInfo::from(user))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/signin",
    tag = "Authentication",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Successful signin", body = ApiResponse<JwtResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn signin(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<SigninRequest>,
) -> Result<Json<ApiResponse<JwtResponse>>, DomainError> {
    let auth = state
        .identity
        .signin(&request.email, &request.password)
        .await?;

    Ok(Json(ApiResponse::success(JwtResponse {
        token: auth.token,
        token_type: auth.token_type,
        expires_in: auth.expires_in,
        id: auth.user.id,
        email: auth.user.email,
        roles: auth.user.roles,
    })))
}
