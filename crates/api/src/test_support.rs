//! Helpers shared by the router tests.

use axum::response::Response;
use chrono_tz::Tz;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use orcamento_core::auth::Role;
use orcamento_core::workflow::EditPolicy;
use orcamento_shared::{AppError, JwtConfig, JwtService};

use crate::AppState;
use crate::session::SessionStore;

/// In-memory sessions: known users and revoked token IDs.
#[derive(Debug, Default)]
pub struct MemorySessions {
    roles: HashMap<i32, Role>,
    revoked: HashSet<String>,
}

impl MemorySessions {
    pub fn user(mut self, id: i32, role: Role) -> Self {
        self.roles.insert(id, role);
        self
    }

    pub fn revoked(mut self, jti: impl Into<String>) -> Self {
        self.revoked.insert(jti.into());
        self
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessions {
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        Ok(self.revoked.contains(jti))
    }

    async fn current_role(&self, user_id: i32) -> Result<Option<Role>, AppError> {
        Ok(self.roles.get(&user_id).copied())
    }
}

/// State with no database behind it.
pub fn state_with(sessions: MemorySessions) -> AppState {
    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        sessions: Arc::new(sessions),
        edit_policy: Arc::new(EditPolicy::default()),
        timezone: Tz::America__Sao_Paulo,
    }
}

pub fn test_state() -> AppState {
    state_with(MemorySessions::default())
}

/// Bearer header value for a fresh token.
pub fn bearer(state: &AppState, user_id: i32, role: &str) -> String {
    let token = state
        .jwt_service
        .generate_access_token(user_id, role)
        .unwrap();
    format!("Bearer {token}")
}

/// The `jti` inside a header built by [`bearer`].
pub fn token_id(state: &AppState, header: &str) -> String {
    let token = header.trim_start_matches("Bearer ");
    state.jwt_service.validate_token(token).unwrap().jti
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
