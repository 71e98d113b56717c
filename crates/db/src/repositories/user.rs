//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde_json::json;

use orcamento_core::auth::Role;
use orcamento_shared::AppError;
use orcamento_shared::auth::UserInfo;

use crate::entities::{sea_orm_active_enums::UserRole, usuarios};

use super::audit::{AuditRepository, NewLog, tables};

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("Usuário não encontrado")]
    NotFound(i32),

    /// Email already registered on create.
    #[error("Email já cadastrado")]
    EmailTaken,

    /// Email belongs to another user on update.
    #[error("Email já em uso")]
    EmailInUse,

    /// An admin tried to delete their own account.
    #[error("Não é possível deletar seu próprio usuário")]
    CannotDeleteSelf,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::NotFound(err.to_string()),
            UserError::EmailTaken | UserError::EmailInUse => Self::Conflict(err.to_string()),
            UserError::CannotDeleteSelf => Self::Validation(err.to_string()),
            UserError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// A unique violation means another request stored the email first.
fn unique_email(err: DbErr, conflict: UserError) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict,
        _ => UserError::Database(err),
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Display name.
    pub nome: String,
    /// Email, unique.
    pub email: String,
    /// Argon2 hash of the password.
    pub senha_hash: String,
    /// Role.
    pub papel: Role,
}

/// Input for updating a user. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Display name.
    pub nome: Option<String>,
    /// Email.
    pub email: Option<String>,
    /// Role.
    pub papel: Option<Role>,
    /// New password hash.
    pub senha_hash: Option<String>,
}

impl From<usuarios::Model> for UserInfo {
    fn from(user: usuarios::Model) -> Self {
        Self {
            id_usuario: user.id_usuario,
            nome: user.nome,
            email: user.email,
            papel: Role::from(user.papel).as_str().to_string(),
            criado_em: user.criado_em.map(|t| t.with_timezone(&chrono::Utc)),
        }
    }
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<usuarios::Model>, DbErr> {
        usuarios::Entity::find()
            .filter(usuarios::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<usuarios::Model>, DbErr> {
        usuarios::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists all users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<usuarios::Model>, DbErr> {
        usuarios::Entity::find()
            .order_by_asc(usuarios::Column::Nome)
            .all(&self.db)
            .await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = usuarios::Entity::find()
            .filter(usuarios::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Creates a user and logs it.
    ///
    /// # Errors
    ///
    /// `UserError::EmailTaken` if the email is registered, including by a
    /// concurrent create.
    pub async fn create(
        &self,
        actor_id: Option<i32>,
        input: CreateUserInput,
    ) -> Result<usuarios::Model, UserError> {
        if self.email_exists(&input.email).await? {
            return Err(UserError::EmailTaken);
        }

        let txn = self.db.begin().await?;

        let user = usuarios::ActiveModel {
            nome: Set(input.nome),
            email: Set(input.email),
            senha_hash: Set(input.senha_hash),
            papel: Set(UserRole::from(input.papel)),
            criado_em: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| unique_email(e, UserError::EmailTaken))?;

        if let Some(actor) = actor_id {
            AuditRepository::record(
                &txn,
                NewLog::new(actor, format!("Criou usuário {}", user.nome), tables::USUARIOS)
                    .record(user.id_usuario)
                    .details(json!({
                        "nome": user.nome,
                        "email": user.email,
                        "papel": input.papel.as_str(),
                    })),
            )
            .await?;
        }

        txn.commit().await?;
        tracing::info!(user_id = user.id_usuario, "User created");
        Ok(user)
    }

    /// Updates a user and logs the change.
    ///
    /// # Errors
    ///
    /// `UserError::NotFound`, or `UserError::EmailInUse` if the new email belongs to someone else.
    pub async fn update(
        &self,
        actor_id: i32,
        id: i32,
        input: UpdateUserInput,
    ) -> Result<usuarios::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        if let Some(email) = &input.email {
            let other = self.find_by_email(email).await?;
            if other.is_some_and(|u| u.id_usuario != id) {
                return Err(UserError::EmailInUse);
            }
        }

        let changes = json!({
            "nome": input.nome,
            "email": input.email,
            "papel": input.papel.map(Role::as_str),
            "senha_alterada": input.senha_hash.is_some(),
        });

        let txn = self.db.begin().await?;
        let mut active = user.into_active_model();
        if let Some(nome) = input.nome {
            active.nome = Set(nome);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(papel) = input.papel {
            active.papel = Set(UserRole::from(papel));
        }
        if let Some(hash) = input.senha_hash {
            active.senha_hash = Set(hash);
        }
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| unique_email(e, UserError::EmailInUse))?;

        AuditRepository::record(
            &txn,
            NewLog::new(actor_id, format!("Atualizou usuário {}", updated.nome), tables::USUARIOS)
                .record(id)
                .details(changes),
        )
        .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Deletes a user and logs it.
    ///
    /// # Errors
    ///
    /// `UserError::CannotDeleteSelf` when `actor_id == id`, `UserError::NotFound`.
    pub async fn delete(&self, actor_id: i32, id: i32) -> Result<(), UserError> {
        if actor_id == id {
            return Err(UserError::CannotDeleteSelf);
        }
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let txn = self.db.begin().await?;
        usuarios::Entity::delete_by_id(id).exec(&txn).await?;
        AuditRepository::record(
            &txn,
            NewLog::new(actor_id, format!("Deletou usuário {}", user.nome), tables::USUARIOS)
                .record(id)
                .details(json!({ "nome": user.nome, "email": user.email })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(user_id = id, actor_id, "User deleted");
        Ok(())
    }

    /// Replaces a user's password hash and logs it.
    ///
    /// # Errors
    ///
    /// `UserError::NotFound`.
    pub async fn change_password(&self, id: i32, senha_hash: String) -> Result<(), UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let txn = self.db.begin().await?;
        let mut active = user.into_active_model();
        active.senha_hash = Set(senha_hash);
        active.update(&txn).await?;
        AuditRepository::record(
            &txn,
            NewLog::new(id, "Alterou a própria senha", tables::USUARIOS).record(id),
        )
        .await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_mapping() {
        assert_eq!(AppError::from(UserError::EmailTaken).status_code(), 409);
        assert_eq!(AppError::from(UserError::NotFound(1)).status_code(), 404);
        let err = AppError::from(UserError::CannotDeleteSelf);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Não é possível deletar seu próprio usuário");
    }

    #[test]
    fn test_other_database_errors_are_not_conflicts() {
        let err = unique_email(DbErr::Custom("timeout".to_string()), UserError::EmailTaken);
        assert!(matches!(err, UserError::Database(_)));
        assert_eq!(AppError::from(err).status_code(), 500);
    }

    #[test]
    fn test_model_into_user_info() {
        let model = usuarios::Model {
            id_usuario: 4,
            nome: "Gestor".to_string(),
            email: "gestor@empresa.com".to_string(),
            senha_hash: "$argon2id$x".to_string(),
            papel: UserRole::Gestor,
            criado_em: None,
        };
        let info = UserInfo::from(model);
        assert_eq!(info.papel, "gestor");
        assert_eq!(info.id_usuario, 4);
    }
}
