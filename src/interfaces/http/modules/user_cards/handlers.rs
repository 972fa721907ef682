//! Account holder handlers: own cards, block requests, transfers, balances
//!
//! The acting user is always the one named in the verified token.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::TransferRequest;
use crate::application::{BalanceView, CardAccountService, CardView};
use crate::config::PaginationConfig;
use crate::interfaces::http::common::{
    ApiResponse, ErrorResponse, PageParams, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::shared::DomainError;

#[derive(Clone)]
pub struct UserCardState {
    pub cards: Arc<CardAccountService>,
    pub pagination: PaginationConfig,
}

#[utoipa::path(
    get,
    path = "/api/user/cards",
    tag = "User Cards",
    params(PageParams),
    responses(
        (status = 200, description = "The caller's cards, masked", body = ApiResponse<PaginatedResponse<CardView>>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_own_cards(
    State(state): State<UserCardState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<PaginatedResponse<CardView>>>, DomainError> {
    let page = state.pagination.page_request(params.page, params.page_size);
    let cards = state.cards.list_own_cards(&user.email, page).await?;
    Ok(Json(ApiResponse::success(cards.into())))
}

#[utoipa::path(
    post,
    path = "/api/user/cards/{id}/block-request",
    tag = "User Cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 204, description = "Card blocked"),
        (status = 403, description = "Card belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse),
        (status = 409, description = "Card is not active", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn request_block(
    State(state): State<UserCardState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, DomainError> {
    state.cards.request_block(&user.email, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/user/cards/transfer",
    tag = "User Cards",
    request_body = TransferRequest,
    responses(
        (status = 204, description = "Funds moved"),
        (status = 400, description = "Invalid amount or identical cards", body = ErrorResponse),
        (status = 403, description = "A card belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Source or target card not found", body = ErrorResponse),
        (status = 422, description = "Insufficient funds", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn transfer(
    State(state): State<UserCardState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<TransferRequest>,
) -> Result<StatusCode, DomainError> {
    state
        .cards
        .transfer(
            &user.email,
            request.source_card_id,
            request.target_card_id,
            request.amount,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/user/cards/{id}/balance",
    tag = "User Cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Current balance", body = ApiResponse<BalanceView>),
        (status = 403, description = "Card belongs to someone else", body = ErrorResponse),
        (status = 404, description = "Card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_balance(
    State(state): State<UserCardState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<BalanceView>>, DomainError> {
    let balance = state.cards.get_balance(&user.email, id).await?;
    Ok(Json(ApiResponse::success(balance)))
}
