//! Revoked access tokens.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, Set,
};

use crate::entities::token_blacklist;

/// Repository for the token revocation list.
#[derive(Debug, Clone)]
pub struct TokenBlacklistRepository {
    db: DatabaseConnection,
}

impl TokenBlacklistRepository {
    /// Creates a new token blacklist repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Revokes a token by its `jti`. Revoking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn revoke(&self, jti: &str) -> Result<(), DbErr> {
        let entry = token_blacklist::ActiveModel {
            jti: Set(jti.to_string()),
            criado_em: Set(Utc::now().into()),
            ..Default::default()
        };

        token_blacklist::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(token_blacklist::Column::Jti)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(())
    }

    /// Checks whether a token has been revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn is_revoked(&self, jti: &str) -> Result<bool, DbErr> {
        let count = token_blacklist::Entity::find()
            .filter(token_blacklist::Column::Jti.eq(jti))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Deletes entries older than `cutoff`. Tokens issued before it have expired anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DbErr> {
        let result = token_blacklist::Entity::delete_many()
            .filter(token_blacklist::Column::CriadoEm.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
