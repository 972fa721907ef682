//! Admin card handlers: create, list, block/activate, delete, browse users

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{CreateCardRequest, ListCardsQuery, ListUsersQuery};
use crate::application::{CardAccountService, CardView, UserDirectoryService, UserView};
use crate::config::PaginationConfig;
use crate::domain::CardStatus;
use crate::interfaces::http::common::{ApiResponse, ErrorResponse, PaginatedResponse, ValidatedJson};
use crate::shared::DomainError;

#[derive(Clone)]
pub struct AdminCardState {
    pub cards: Arc<CardAccountService>,
    pub users: Arc<UserDirectoryService>,
    pub pagination: PaginationConfig,
}

#[utoipa::path(
    post,
    path = "/api/admin/cards",
    tag = "Admin Cards",
    request_body = CreateCardRequest,
    responses(
        (status = 201, description = "Card created", body = ApiResponse<CardView>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Owner not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_card(
    State(state): State<AdminCardState>,
    ValidatedJson(request): ValidatedJson<CreateCardRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CardView>>), DomainError> {
    let card = state.cards.create_card(request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(card))))
}

#[utoipa::path(
    get,
    path = "/api/admin/cards",
    tag = "Admin Cards",
    params(ListCardsQuery),
    responses(
        (status = 200, description = "Cards ordered by id", body = ApiResponse<PaginatedResponse<CardView>>),
        (status = 404, description = "Owner not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_cards(
    State(state): State<AdminCardState>,
    Query(query): Query<ListCardsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<CardView>>>, DomainError> {
    let page = state.pagination.page_request(query.page, query.page_size);
    let cards = state
        .cards
        .list_cards(query.owner_email.as_deref(), query.status, page)
        .await?;
    Ok(Json(ApiResponse::success(cards.into())))
}

#[utoipa::path(
    put,
    path = "/api/admin/cards/{id}/block",
    tag = "Admin Cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 204, description = "Card blocked"),
        (status = 404, description = "Card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn block_card(
    State(state): State<AdminCardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, DomainError> {
    state.cards.change_status(id, CardStatus::Blocked).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/api/admin/cards/{id}/activate",
    tag = "Admin Cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 204, description = "Card activated"),
        (status = 404, description = "Card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn activate_card(
    State(state): State<AdminCardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, DomainError> {
    state.cards.change_status(id, CardStatus::Active).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/admin/cards/{id}",
    tag = "Admin Cards",
    params(("id" = i64, Path, description = "Card ID")),
    responses(
        (status = 204, description = "Card deleted"),
        (status = 404, description = "Card not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_card(
    State(state): State<AdminCardState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, DomainError> {
    state.cards.delete_card(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/admin/cards/users",
    tag = "Admin Cards",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users ordered by id", body = ApiResponse<PaginatedResponse<UserView>>),
        (status = 404, description = "No user with that email", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AdminCardState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<UserView>>>, DomainError> {
    let page = state.pagination.page_request(query.page, query.page_size);
    let users = state.users.list_users(query.email.as_deref(), page).await?;
    Ok(Json(ApiResponse::success(users.into())))
}
