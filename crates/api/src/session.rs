//! Per-request session lookups made by the auth middleware.

use sea_orm::DatabaseConnection;

use orcamento_core::auth::Role;
use orcamento_db::{TokenBlacklistRepository, UserRepository};
use orcamento_shared::AppError;

/// Token revocations and the current role of each user.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether logout revoked the token with this `jti`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError>;

    /// The user's role as stored now, `None` when the user was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup fails.
    async fn current_role(&self, user_id: i32) -> Result<Option<Role>, AppError>;
}

/// Session lookups backed by `token_blacklist` and `usuarios`.
#[derive(Debug, Clone)]
pub struct DbSessionStore {
    db: DatabaseConnection,
}

impl DbSessionStore {
    /// Creates a store over `db`.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl SessionStore for DbSessionStore {
    async fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        TokenBlacklistRepository::new(self.db.clone())
            .is_revoked(jti)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn current_role(&self, user_id: i32) -> Result<Option<Role>, AppError> {
        let user = UserRepository::new(self.db.clone())
            .find_by_id(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(user.map(|u| Role::from(u.papel)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnected_store_reports_database_error() {
        let store = DbSessionStore::new(DatabaseConnection::Disconnected);
        let err = store.is_revoked("jti").await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(store.current_role(1).await.is_err());
    }
}
