//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api`
//! - Authentication middleware and the `AuthUser` extractor
//! - The JSON error envelope

pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod session;

#[cfg(test)]
mod test_support;

use axum::Router;
use axum::http::HeaderValue;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use orcamento_core::workflow::{EditPolicy, EditWindow};
use orcamento_shared::config::{AppConfig, CorsConfig};
use orcamento_shared::{AppError, JwtService};

use crate::session::{DbSessionStore, SessionStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Revoked tokens and current user roles.
    pub sessions: Arc<dyn SessionStore>,
    /// Who may change which amounts, and until when.
    pub edit_policy: Arc<EditPolicy>,
    /// Timezone that decides the current date.
    pub timezone: Tz,
}

impl AppState {
    /// Builds the state from a connection and the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the configured timezone is unknown.
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Result<Self, AppError> {
        let timezone: Tz = config.workflow.timezone.parse().map_err(|_| {
            AppError::Internal(format!("Fuso horário inválido: {}", config.workflow.timezone))
        })?;

        let window = EditWindow::new(
            config.workflow.realizado_edit_business_days,
            config.workflow.holidays.iter().copied(),
        );

        Ok(Self {
            sessions: Arc::new(DbSessionStore::new(db.clone())),
            db: Arc::new(db),
            jwt_service: Arc::new(JwtService::new((&config.jwt).into())),
            edit_policy: Arc::new(EditPolicy::new(window)),
            timezone,
        })
    }

    /// Current date in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Any origin when the list is empty or contains `*`.
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
