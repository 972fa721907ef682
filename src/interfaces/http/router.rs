//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    BalanceView, CardAccountService, CardView, IdentityService, UserDirectoryService, UserView,
};
use crate::config::PaginationConfig;
use crate::domain::{CardStatus, UserRole};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ErrorResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{auth_middleware, require_admin, require_user, AuthState};

use super::modules::{admin_cards, auth, health, metrics, request_id, user_cards};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT from POST /api/auth/signin"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::signup,
        auth::signin,
        // Admin
        admin_cards::create_card,
        admin_cards::list_cards,
        admin_cards::block_card,
        admin_cards::activate_card,
        admin_cards::delete_card,
        admin_cards::list_users,
        // User
        user_cards::list_own_cards,
        user_cards::request_block,
        user_cards::transfer,
        user_cards::get_balance,
    ),
    components(
        schemas(
            ErrorResponse,
            CardView,
            BalanceView,
            UserView,
            CardStatus,
            UserRole,
            PaginatedResponse<CardView>,
            PaginatedResponse<UserView>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::SignupRequest,
            auth::SigninRequest,
            auth::UserInfo,
            auth::JwtResponse,
            admin_cards::CreateCardRequest,
            user_cards::TransferRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Authentication", description = "Signup and signin (JWT)"),
        (name = "Admin Cards", description = "Card lifecycle and user browsing for administrators"),
        (name = "User Cards", description = "Own cards, block requests, balances and transfers"),
    ),
    info(
        title = "Card Bank API",
        version = "1.0.0",
        description = "Bank card management: encrypted card storage, ownership-checked transfers",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the HTTP layer needs from the rest of the application
#[derive(Clone)]
pub struct ApiContext {
    pub identity: Arc<IdentityService>,
    pub cards: Arc<CardAccountService>,
    pub users: Arc<UserDirectoryService>,
    pub jwt_config: JwtConfig,
    pub pagination: PaginationConfig,
    /// `None` when running on the in-memory repositories
    pub db: Option<DatabaseConnection>,
    pub prometheus: PrometheusHandle,
}

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let middleware_state = AuthState {
        jwt_config: ctx.jwt_config.clone(),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .with_state(auth::AuthHandlerState {
            identity: ctx.identity.clone(),
        });

    // Admin routes: token + ADMIN role
    let admin_routes = Router::new()
        .route(
            "/",
            get(admin_cards::list_cards).post(admin_cards::create_card),
        )
        .route("/users", get(admin_cards::list_users))
        .route("/{id}", delete(admin_cards::delete_card))
        .route("/{id}/block", put(admin_cards::block_card))
        .route("/{id}/activate", put(admin_cards::activate_card))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            middleware_state.clone(),
            auth_middleware,
        ))
        .with_state(admin_cards::AdminCardState {
            cards: ctx.cards.clone(),
            users: ctx.users.clone(),
            pagination: ctx.pagination,
        });

    // User routes: token + USER role
    let user_routes = Router::new()
        .route("/", get(user_cards::list_own_cards))
        .route("/transfer", post(user_cards::transfer))
        .route("/{id}/block-request", post(user_cards::request_block))
        .route("/{id}/balance", get(user_cards::get_balance))
        .route_layer(middleware::from_fn(require_user))
        .route_layer(middleware::from_fn_with_state(
            middleware_state,
            auth_middleware,
        ))
        .with_state(user_cards::UserCardState {
            cards: ctx.cards,
            pagination: ctx.pagination,
        });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health::HealthState {
            db: ctx.db,
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(metrics::MetricsState {
            handle: ctx.prometheus,
        });

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health & metrics
        .merge(health_routes)
        .merge(metrics_routes)
        // Auth
        .nest("/api/auth", auth_routes)
        // Cards
        .nest("/api/admin/cards", admin_routes)
        .nest("/api/user/cards", user_routes)
        // Middleware
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
