//! # tracksheet_api
//!
//! HTTP API library for Tracksheet.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, patch, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracksheet_core::auth::federation::{AssertionVerifier, SignedAssertionVerifier};
use tracksheet_core::auth::jwt::SessionIssuer;
use tracksheet_core::store::DynStore;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, problems, sheets, templates};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Persistence handle.
    pub store: DynStore,
    /// API configuration.
    pub config: ApiConfig,
    /// Mints and verifies session tokens.
    pub issuer: SessionIssuer,
    /// Checks provider assertions on federated login.
    pub verifier: Arc<dyn AssertionVerifier>,
}

impl AppState {
    /// Build state with the issuer and verifier derived from `config`.
    pub fn new(store: DynStore, config: ApiConfig) -> Self {
        let issuer = SessionIssuer::new(config.jwt_secret.as_bytes(), config.session_ttl());
        let verifier = config
            .federation_secrets
            .iter()
            .fold(SignedAssertionVerifier::new(), |v, (provider, secret)| {
                v.with_provider(*provider, secret.as_bytes())
            });
        Self {
            store,
            config,
            issuer,
            verifier: Arc::new(verifier),
        }
    }

    /// Replace the assertion verifier.
    pub fn with_verifier(mut self, verifier: Arc<dyn AssertionVerifier>) -> Self {
        self.verifier = verifier;
        self
    }
}

/// Run embedded database migrations.
///
/// Delegates to `tracksheet_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tracksheet_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
///
/// Every route sees the caller's session, if any. Access decisions are made
/// per operation, so there is no separate protected router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(
            routes::POST_AUTH_LOGIN_CREDENTIALS,
            post(auth::credentials_login_handler),
        )
        .route(
            routes::POST_AUTH_LOGIN_FEDERATED,
            post(auth::federated_login_handler),
        )
        .route(routes::GET_AUTH_SESSION, get(auth::session_handler))
        .route(
            routes::POST_AUTH_SESSION_REFRESH,
            post(auth::refresh_handler),
        )
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .route(routes::PUT_AUTH_PROFILE, put(auth::update_profile_handler))
        .route(
            routes::PATCH_ADMIN_USERS_ID,
            patch(admin::update_account_handler),
        );

    let sheet_routes = Router::new()
        .route(
            routes::SHEETS,
            get(sheets::list_handler).post(sheets::create_handler),
        )
        .route(
            routes::SHEETS_ID,
            get(sheets::get_handler)
                .put(sheets::update_handler)
                .delete(sheets::delete_handler),
        )
        .route(
            routes::POST_SHEETS_ID_DUPLICATE,
            post(sheets::duplicate_handler),
        )
        .route(
            routes::PATCH_SHEETS_ID_PROBLEMS_PROBLEM_ID,
            patch(sheets::update_progress_handler),
        );

    let template_routes = Router::new()
        .route(
            routes::TEMPLATES,
            get(templates::list_handler).post(templates::create_handler),
        )
        .route(routes::GET_TEMPLATES_SEARCH, get(templates::search_handler))
        .route(
            routes::GET_TEMPLATES_CATEGORIES,
            get(templates::categories_handler),
        )
        .route(routes::GET_TEMPLATES_MINE, get(templates::mine_handler))
        .route(
            routes::TEMPLATES_ID,
            get(templates::get_handler)
                .put(templates::update_handler)
                .delete(templates::delete_handler),
        )
        .route(
            routes::PATCH_TEMPLATES_ID_PROBLEMS,
            patch(templates::add_problems_handler),
        )
        .route(
            routes::DELETE_TEMPLATES_ID_PROBLEMS_PROBLEM_ID,
            delete(templates::remove_problem_handler),
        )
        .route(
            routes::POST_TEMPLATES_ID_CREATE_SHEET,
            post(templates::create_sheet_handler),
        );

    let problem_routes = Router::new()
        .route(
            routes::PROBLEMS,
            get(problems::list_handler).post(problems::create_handler),
        )
        .route(
            routes::PROBLEMS_ID,
            get(problems::get_handler)
                .put(problems::update_handler)
                .delete(problems::delete_handler),
        );

    Router::new()
        .merge(auth_routes)
        .merge(sheet_routes)
        .merge(template_routes)
        .merge(problem_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session::load_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
