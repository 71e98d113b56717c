//! Category repository.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;

use orcamento_core::reports::CategoryImportRow;
use orcamento_shared::AppError;

use crate::entities::{categorias, orcamentos};

use super::audit::{AuditRepository, NewLog, tables};

/// Error types for category operations.
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    /// Category not found.
    #[error("Categoria não encontrada")]
    NotFound(i32),

    /// Same name, group and class code already exist.
    #[error("Categoria já existe com este grupo e código de classe")]
    Duplicate,

    /// Category still has budget entries.
    #[error("Categoria possui {0} orçamentos vinculados e não pode ser excluída")]
    HasEntries(u64),

    /// Name is blank.
    #[error("Campo 'categoria' é obrigatório")]
    MissingName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::NotFound(_) => Self::NotFound(err.to_string()),
            CategoryError::Duplicate => Self::Conflict(err.to_string()),
            CategoryError::HasEntries(_) | CategoryError::MissingName => {
                Self::Validation(err.to_string())
            }
            CategoryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Category fields as written by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    /// Name.
    pub categoria: String,
    /// State.
    #[serde(default)]
    pub uf: Option<String>,
    /// Cost center.
    #[serde(default)]
    pub master: Option<String>,
    /// Group.
    #[serde(default)]
    pub grupo: Option<String>,
    /// Classification code.
    #[serde(default)]
    pub cod_class: Option<String>,
    /// Cost class.
    #[serde(default)]
    pub classe_custo: Option<String>,
}

impl CategoryInput {
    /// Trims every field and turns blank optional fields into `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        Self {
            categoria: self.categoria.trim().to_string(),
            uf: clean(self.uf),
            master: clean(self.master),
            grupo: clean(self.grupo),
            cod_class: clean(self.cod_class),
            classe_custo: clean(self.classe_custo),
        }
    }

    fn key(&self) -> (String, Option<String>, Option<String>) {
        (
            self.categoria.clone(),
            self.grupo.clone(),
            self.cod_class.clone(),
        )
    }
}

impl From<CategoryImportRow> for CategoryInput {
    fn from(row: CategoryImportRow) -> Self {
        Self {
            categoria: row.categoria,
            uf: row.uf,
            master: row.master,
            grupo: row.grupo,
            cod_class: row.cod_class,
            classe_custo: row.classe_custo,
        }
    }
}

/// Filters for the category listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryFilter {
    /// Name contains.
    pub categoria: Option<String>,
    /// State equals.
    pub uf: Option<String>,
    /// Group equals.
    pub grupo: Option<String>,
    /// Name, group or cost center contains.
    pub search: Option<String>,
}

/// Distinct values for category filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFilterOptions {
    /// Category names.
    pub categorias: Vec<String>,
    /// States.
    pub ufs: Vec<String>,
    /// Groups.
    pub grupos: Vec<String>,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    /// Categories created.
    pub criadas: usize,
    /// One message per skipped row.
    pub erros: Vec<String>,
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &CategoryFilter) -> Result<Vec<categorias::Model>, DbErr> {
        let mut query = categorias::Entity::find();
        if let Some(name) = &filter.categoria {
            query = query.filter(categorias::Column::Categoria.contains(name.as_str()));
        }
        if let Some(uf) = &filter.uf {
            query = query.filter(categorias::Column::Uf.eq(uf.as_str()));
        }
        if let Some(grupo) = &filter.grupo {
            query = query.filter(categorias::Column::Grupo.eq(grupo.as_str()));
        }
        if let Some(term) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(categorias::Column::Categoria.contains(term.as_str()))
                    .add(categorias::Column::Grupo.contains(term.as_str()))
                    .add(categorias::Column::Master.contains(term.as_str())),
            );
        }

        query
            .order_by_asc(categorias::Column::Categoria)
            .order_by_asc(categorias::Column::Grupo)
            .all(&self.db)
            .await
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<categorias::Model>, DbErr> {
        categorias::Entity::find_by_id(id).one(&self.db).await
    }

    /// Counts all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        categorias::Entity::find().count(&self.db).await
    }

    /// Distinct names, states and groups.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn filter_options(&self) -> Result<CategoryFilterOptions, DbErr> {
        Ok(CategoryFilterOptions {
            categorias: self.distinct(categorias::Column::Categoria).await?,
            ufs: self.distinct(categorias::Column::Uf).await?,
            grupos: self.distinct(categorias::Column::Grupo).await?,
        })
    }

    /// Distinct non-empty values of `column`, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn distinct(&self, column: categorias::Column) -> Result<Vec<String>, DbErr> {
        let values: Vec<Option<String>> = categorias::Entity::find()
            .select_only()
            .column(column)
            .distinct()
            .filter(column.is_not_null())
            .order_by_asc(column)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(values
            .into_iter()
            .flatten()
            .filter(|v| !v.trim().is_empty())
            .collect())
    }

    /// Creates a category and logs it.
    ///
    /// # Errors
    ///
    /// `CategoryError::MissingName`, `CategoryError::Duplicate`.
    pub async fn create(
        &self,
        actor_id: i32,
        input: CategoryInput,
    ) -> Result<categorias::Model, CategoryError> {
        let input = input.normalized();
        if input.categoria.is_empty() {
            return Err(CategoryError::MissingName);
        }

        let txn = self.db.begin().await?;
        if find_duplicate(&txn, &input, None).await?.is_some() {
            return Err(CategoryError::Duplicate);
        }
        let created = insert(&txn, &input).await?;
        AuditRepository::record(
            &txn,
            NewLog::new(
                actor_id,
                format!("Criou categoria {}", created.categoria),
                tables::CATEGORIAS,
            )
            .record(created.id_categoria)
            .details(json!(input)),
        )
        .await?;
        txn.commit().await?;

        Ok(created)
    }

    /// Updates a category and logs it.
    ///
    /// # Errors
    ///
    /// `CategoryError::NotFound`, `CategoryError::MissingName`, `CategoryError::Duplicate`.
    pub async fn update(
        &self,
        actor_id: i32,
        id: i32,
        input: CategoryInput,
    ) -> Result<categorias::Model, CategoryError> {
        let input = input.normalized();
        if input.categoria.is_empty() {
            return Err(CategoryError::MissingName);
        }
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let txn = self.db.begin().await?;
        if find_duplicate(&txn, &input, Some(id)).await?.is_some() {
            return Err(CategoryError::Duplicate);
        }

        let mut active = existing.into_active_model();
        active.categoria = Set(input.categoria.clone());
        active.uf = Set(input.uf.clone());
        active.master = Set(input.master.clone());
        active.grupo = Set(input.grupo.clone());
        active.cod_class = Set(input.cod_class.clone());
        active.classe_custo = Set(input.classe_custo.clone());
        let updated = active.update(&txn).await?;

        AuditRepository::record(
            &txn,
            NewLog::new(
                actor_id,
                format!("Atualizou categoria {}", updated.categoria),
                tables::CATEGORIAS,
            )
            .record(id)
            .details(json!(input)),
        )
        .await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Deletes a category without budget entries and logs it.
    ///
    /// # Errors
    ///
    /// `CategoryError::NotFound`, `CategoryError::HasEntries`.
    pub async fn delete(&self, actor_id: i32, id: i32) -> Result<(), CategoryError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(CategoryError::NotFound(id))?;

        let entries = orcamentos::Entity::find()
            .filter(orcamentos::Column::IdCategoria.eq(id))
            .count(&self.db)
            .await?;
        if entries > 0 {
            return Err(CategoryError::HasEntries(entries));
        }

        let txn = self.db.begin().await?;
        categorias::Entity::delete_by_id(id).exec(&txn).await?;
        AuditRepository::record(
            &txn,
            NewLog::new(
                actor_id,
                format!("Deletou categoria {}", existing.categoria),
                tables::CATEGORIAS,
            )
            .record(id)
            .details(json!({ "categoria": existing.categoria, "grupo": existing.grupo })),
        )
        .await?;
        txn.commit().await?;

        Ok(())
    }

    /// Creates categories from import rows in one transaction.
    ///
    /// Rows that duplicate an existing category or an earlier row are skipped
    /// and reported.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn import(
        &self,
        actor_id: i32,
        rows: Vec<CategoryImportRow>,
    ) -> Result<ImportResult, CategoryError> {
        let mut result = ImportResult::default();
        let mut seen = HashSet::new();

        let txn = self.db.begin().await?;
        for row in rows {
            let line = row.line;
            let input = CategoryInput::from(row).normalized();

            if !seen.insert(input.key()) || find_duplicate(&txn, &input, None).await?.is_some() {
                result.erros.push(format!(
                    "Linha {line}: categoria '{}' já existe",
                    input.categoria
                ));
                continue;
            }

            insert(&txn, &input).await?;
            result.criadas += 1;
        }

        AuditRepository::record(
            &txn,
            NewLog::new(
                actor_id,
                format!("Importou {} categorias via CSV", result.criadas),
                tables::CATEGORIAS,
            )
            .details(json!({ "criadas": result.criadas, "erros": result.erros })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(actor_id, created = result.criadas, skipped = result.erros.len(), "Categories imported");
        Ok(result)
    }
}

async fn insert<C: ConnectionTrait>(
    conn: &C,
    input: &CategoryInput,
) -> Result<categorias::Model, DbErr> {
    categorias::ActiveModel {
        categoria: Set(input.categoria.clone()),
        uf: Set(input.uf.clone()),
        master: Set(input.master.clone()),
        grupo: Set(input.grupo.clone()),
        cod_class: Set(input.cod_class.clone()),
        classe_custo: Set(input.classe_custo.clone()),
        criado_em: Set(Some(chrono::Utc::now().into())),
        ..Default::default()
    }
    .insert(conn)
    .await
}

fn null_safe_eq(column: categorias::Column, value: Option<&String>) -> Condition {
    match value {
        Some(v) => Condition::all().add(column.eq(v.as_str())),
        None => Condition::all().add(column.is_null()),
    }
}

async fn find_duplicate<C: ConnectionTrait>(
    conn: &C,
    input: &CategoryInput,
    exclude: Option<i32>,
) -> Result<Option<categorias::Model>, DbErr> {
    let mut query = categorias::Entity::find()
        .filter(categorias::Column::Categoria.eq(input.categoria.as_str()))
        .filter(null_safe_eq(categorias::Column::Grupo, input.grupo.as_ref()))
        .filter(null_safe_eq(categorias::Column::CodClass, input.cod_class.as_ref()));
    if let Some(id) = exclude {
        query = query.filter(categorias::Column::IdCategoria.ne(id));
    }
    query.one(conn).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_blanks_become_none() {
        let input = CategoryInput {
            categoria: "  Energia ".to_string(),
            uf: Some(" ".to_string()),
            master: Some(" ADM".to_string()),
            ..CategoryInput::default()
        }
        .normalized();

        assert_eq!(input.categoria, "Energia");
        assert_eq!(input.uf, None);
        assert_eq!(input.master.as_deref(), Some("ADM"));
    }

    #[test]
    fn test_category_error_mapping() {
        assert_eq!(AppError::from(CategoryError::Duplicate).status_code(), 409);
        assert_eq!(AppError::from(CategoryError::HasEntries(3)).status_code(), 400);
        assert_eq!(
            CategoryError::HasEntries(3).to_string(),
            "Categoria possui 3 orçamentos vinculados e não pode ser excluída"
        );
    }
}
