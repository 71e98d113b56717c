//! Budget entry repository.
//!
//! Writes go through [`EditPolicy`] and [`WorkflowService`]; each write and its
//! audit row share one transaction.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use orcamento_core::auth::Role;
use orcamento_core::budget::{BudgetStatus, Month, MonthlyEntry, YearGrid};
use orcamento_core::workflow::history::{
    self, REJECT_BATCH_PREFIX, REJECT_SINGLE_PREFIX, SUBMIT_BATCH_PREFIX,
};
use orcamento_core::workflow::{
    BatchOutcome, EditMode, EditPolicy, EditRequest, EntryRef, EntrySnapshot, RejectionGroup,
    SubmissionBatch, Transition, WorkflowAction, WorkflowError, WorkflowService,
};
use orcamento_shared::AppError;

use crate::entities::sea_orm_active_enums::{BudgetStatus as DbStatus, MonthName};
use crate::entities::{categorias, orcamentos, usuarios};

use super::audit::{AuditRepository, NewLog, tables};
use super::category::CategoryRepository;

/// Error types for budget entry operations.
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    /// Entry not found.
    #[error("Orçamento não encontrado")]
    NotFound(i32),

    /// Referenced category does not exist.
    #[error("Categoria não encontrada")]
    CategoryNotFound(i32),

    /// Refused by the workflow or the edit policy.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::NotFound(_) | EntryError::CategoryNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            EntryError::Workflow(e) => e.into(),
            EntryError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// The user performing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub id: i32,
    /// Role from the token.
    pub role: Role,
}

/// One entry to create or update, keyed by category, month and year.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EntryInput {
    /// Category.
    pub id_categoria: i32,
    /// Month, by name or number.
    pub mes: Month,
    /// Year.
    pub ano: i32,
    /// Planned amount.
    #[serde(default)]
    pub orcado: Option<Decimal>,
    /// Actual amount.
    #[serde(default)]
    pub realizado: Option<Decimal>,
    /// Requested status.
    #[serde(default)]
    pub status: Option<BudgetStatus>,
}

impl EntryInput {
    const fn request(&self) -> EditRequest {
        EditRequest {
            orcado: self.orcado,
            realizado: self.realizado,
            status: self.status,
        }
    }
}

/// Filters for the entry listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    /// Year.
    pub ano: Option<i32>,
    /// Month.
    pub mes: Option<Month>,
    /// Status.
    pub status: Option<BudgetStatus>,
    /// Category state.
    pub uf: Option<String>,
    /// Category cost center.
    pub master: Option<String>,
    /// Category ID.
    pub id_categoria: Option<i32>,
    /// Category name.
    pub categoria: Option<String>,
}

/// An entry with its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    /// Entry ID.
    pub id_orcamento: i32,
    /// Category ID.
    pub id_categoria: i32,
    /// Month.
    pub mes: Month,
    /// Year.
    pub ano: i32,
    /// Planned amount.
    pub orcado: Decimal,
    /// Actual amount.
    pub realizado: Decimal,
    /// `realizado - orcado`.
    pub dif: Decimal,
    /// Workflow status.
    pub status: BudgetStatus,
    /// Approver.
    pub aprovado_por: Option<i32>,
    /// Approval time.
    pub data_aprovacao: Option<chrono::DateTime<Utc>>,
    /// Creation time.
    pub criado_em: Option<chrono::DateTime<Utc>>,
    /// Last update.
    pub atualizado_em: Option<chrono::DateTime<Utc>>,
    /// Category.
    pub categoria: Option<categorias::Model>,
}

impl EntryView {
    /// Builds the view from an entry and its category.
    #[must_use]
    pub fn new(entry: orcamentos::Model, categoria: Option<categorias::Model>) -> Self {
        let utc = |t: Option<sea_orm::prelude::DateTimeWithTimeZone>| t.map(|t| t.with_timezone(&Utc));
        Self {
            id_orcamento: entry.id_orcamento,
            id_categoria: entry.id_categoria,
            mes: entry.mes.into(),
            ano: entry.ano,
            orcado: entry.orcado,
            realizado: entry.realizado,
            dif: entry.dif,
            status: entry.status.into(),
            aprovado_por: entry.aprovado_por,
            data_aprovacao: utc(entry.data_aprovacao),
            criado_em: utc(entry.criado_em),
            atualizado_em: utc(entry.atualizado_em),
            categoria,
        }
    }
}

/// Distinct values for entry filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryFilterOptions {
    /// Years with entries, newest first.
    pub anos: Vec<i32>,
    /// Statuses present.
    pub status: Vec<BudgetStatus>,
    /// Category states.
    pub ufs: Vec<String>,
    /// Category cost centers.
    pub masters: Vec<String>,
    /// Category names.
    pub categorias: Vec<String>,
}

/// Outcome of a single upsert.
#[derive(Debug, Clone)]
pub struct Upserted {
    /// Stored entry.
    pub entry: EntryView,
    /// True when the entry was created.
    pub created: bool,
}

/// Outcome of a batch edit.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchEditResult {
    /// Status line.
    pub message: String,
    /// Entries created.
    pub created: usize,
    /// Entries changed.
    pub updated: usize,
    /// One message per refused item.
    pub errors: Vec<String>,
    /// Every entry the batch touched or left unchanged.
    pub orcamentos: Vec<EntryView>,
}

/// Outcome of a batch workflow transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchTransitionResult {
    /// Status line.
    pub message: String,
    /// One message per refused entry.
    pub errors: Vec<String>,
}

enum Applied {
    Created(orcamentos::Model),
    Updated(orcamentos::Model),
    Unchanged(orcamentos::Model),
}

impl Applied {
    fn into_model(self) -> orcamentos::Model {
        match self {
            Self::Created(m) | Self::Updated(m) | Self::Unchanged(m) => m,
        }
    }
}

/// Budget entry repository.
#[derive(Debug, Clone)]
pub struct BudgetEntryRepository {
    db: DatabaseConnection,
}

impl BudgetEntryRepository {
    /// Creates a new budget entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists entries with their categories, newest year first, then by
    /// category and calendar month.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: &EntryFilter) -> Result<Vec<EntryView>, DbErr> {
        let mut query = orcamentos::Entity::find().find_also_related(categorias::Entity);

        if let Some(ano) = filter.ano {
            query = query.filter(orcamentos::Column::Ano.eq(ano));
        }
        if let Some(mes) = filter.mes {
            query = query.filter(orcamentos::Column::Mes.eq(MonthName::from(mes)));
        }
        if let Some(status) = filter.status {
            query = query.filter(orcamentos::Column::Status.eq(DbStatus::from(status)));
        }
        if let Some(id) = filter.id_categoria {
            query = query.filter(orcamentos::Column::IdCategoria.eq(id));
        }
        if let Some(uf) = non_blank(filter.uf.as_deref()) {
            query = query.filter(categorias::Column::Uf.eq(uf));
        }
        if let Some(master) = non_blank(filter.master.as_deref()) {
            query = query.filter(categorias::Column::Master.eq(master));
        }
        if let Some(name) = non_blank(filter.categoria.as_deref()) {
            query = query.filter(categorias::Column::Categoria.eq(name));
        }

        let mut views: Vec<EntryView> = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(entry, cat)| EntryView::new(entry, cat))
            .collect();

        views.sort_by_key(|v| {
            (
                Reverse(v.ano),
                v.categoria.as_ref().map(|c| c.categoria.clone()),
                v.id_categoria,
                v.mes,
            )
        });
        Ok(views)
    }

    /// Finds an entry with its category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<EntryView>, DbErr> {
        let found = orcamentos::Entity::find_by_id(id)
            .find_also_related(categorias::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(entry, cat)| EntryView::new(entry, cat)))
    }

    /// Distinct years, statuses and category attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn filter_options(&self) -> Result<EntryFilterOptions, DbErr> {
        let anos: Vec<i32> = orcamentos::Entity::find()
            .select_only()
            .column(orcamentos::Column::Ano)
            .distinct()
            .order_by_desc(orcamentos::Column::Ano)
            .into_tuple()
            .all(&self.db)
            .await?;

        let present: HashSet<BudgetStatus> = orcamentos::Entity::find()
            .select_only()
            .column(orcamentos::Column::Status)
            .distinct()
            .into_tuple::<DbStatus>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(BudgetStatus::from)
            .collect();

        let categories = CategoryRepository::new(self.db.clone());
        Ok(EntryFilterOptions {
            anos,
            status: BudgetStatus::ALL
                .into_iter()
                .filter(|s| present.contains(s))
                .collect(),
            ufs: categories.distinct(categorias::Column::Uf).await?,
            masters: categories.distinct(categorias::Column::Master).await?,
            categorias: categories.distinct(categorias::Column::Categoria).await?,
        })
    }

    /// The twelve months of a category in one year.
    ///
    /// # Errors
    ///
    /// `EntryError::CategoryNotFound`.
    pub async fn year_grid(&self, id_categoria: i32, ano: i32) -> Result<YearGrid, EntryError> {
        categorias::Entity::find_by_id(id_categoria)
            .one(&self.db)
            .await?
            .ok_or(EntryError::CategoryNotFound(id_categoria))?;

        let entries = orcamentos::Entity::find()
            .filter(orcamentos::Column::IdCategoria.eq(id_categoria))
            .filter(orcamentos::Column::Ano.eq(ano))
            .all(&self.db)
            .await?;

        Ok(YearGrid::build(
            id_categoria,
            ano,
            entries.into_iter().map(|e| MonthlyEntry {
                id_orcamento: Some(e.id_orcamento),
                id_categoria: e.id_categoria,
                mes: e.mes.into(),
                ano: e.ano,
                orcado: e.orcado,
                realizado: e.realizado,
                dif: e.dif,
                status: e.status.into(),
            }),
        ))
    }

    /// Creates or updates one entry.
    ///
    /// # Errors
    ///
    /// `EntryError::CategoryNotFound`, or `EntryError::Workflow` when the
    /// edit policy refuses the change.
    pub async fn upsert(
        &self,
        actor: Actor,
        input: &EntryInput,
        policy: &EditPolicy,
        today: NaiveDate,
    ) -> Result<Upserted, EntryError> {
        let txn = self.db.begin().await?;

        let categoria = categorias::Entity::find_by_id(input.id_categoria)
            .one(&txn)
            .await?
            .ok_or(EntryError::CategoryNotFound(input.id_categoria))?;

        let applied = apply_edit(&txn, actor, input, policy, EditMode::Single, today).await?;
        let created = matches!(applied, Applied::Created(_));
        let acao = match applied {
            Applied::Created(_) => Some("Criou orçamento"),
            Applied::Updated(_) => Some("Atualizou orçamento"),
            Applied::Unchanged(_) => None,
        };
        let entry = applied.into_model();

        if let Some(acao) = acao {
            AuditRepository::record(
                &txn,
                NewLog::new(
                    actor.id,
                    format!("{acao} {}/{}", input.mes, input.ano),
                    tables::ORCAMENTOS,
                )
                .record(entry.id_orcamento)
                .details(json!({
                    "categoria": categoria.categoria,
                    "grupo": categoria.grupo,
                    "mes": input.mes,
                    "ano": input.ano,
                    "orcado": entry.orcado,
                    "realizado": entry.realizado,
                    "status": BudgetStatus::from(entry.status),
                })),
            )
            .await?;
        }
        txn.commit().await?;

        Ok(Upserted {
            entry: EntryView::new(entry, Some(categoria)),
            created,
        })
    }

    /// Applies many edits in one transaction.
    ///
    /// Items refused by the edit policy or pointing at a missing category are
    /// reported in `errors` and leave the others untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn batch_edit(
        &self,
        actor: Actor,
        items: &[EntryInput],
        policy: &EditPolicy,
        today: NaiveDate,
    ) -> Result<BatchEditResult, EntryError> {
        let mut result = BatchEditResult::default();
        let mut categories: HashMap<i32, Option<categorias::Model>> = HashMap::new();

        let txn = self.db.begin().await?;
        for (index, item) in items.iter().enumerate() {
            let line = index + 1;

            if !categories.contains_key(&item.id_categoria) {
                let found = categorias::Entity::find_by_id(item.id_categoria).one(&txn).await?;
                categories.insert(item.id_categoria, found);
            }
            let Some(categoria) = categories.get(&item.id_categoria).cloned().flatten() else {
                result.errors.push(format!(
                    "Item {line}: categoria {} não encontrada",
                    item.id_categoria
                ));
                continue;
            };

            match apply_edit(&txn, actor, item, policy, EditMode::Batch, today).await {
                Ok(applied) => {
                    match applied {
                        Applied::Created(_) => result.created += 1,
                        Applied::Updated(_) => result.updated += 1,
                        Applied::Unchanged(_) => {}
                    }
                    result
                        .orcamentos
                        .push(EntryView::new(applied.into_model(), Some(categoria)));
                }
                Err(EntryError::Workflow(e)) => {
                    result.errors.push(format!(
                        "Item {line} ({} {}/{}): {e}",
                        categoria.categoria, item.mes, item.ano
                    ));
                }
                Err(e) => return Err(e),
            }
        }

        AuditRepository::record(
            &txn,
            NewLog::new(
                actor.id,
                format!(
                    "Atualização em lote: {} criados, {} atualizados",
                    result.created, result.updated
                ),
                tables::ORCAMENTOS,
            )
            .details(json!({
                "criados": result.created,
                "atualizados": result.updated,
                "erros": result.errors,
            })),
        )
        .await?;
        txn.commit().await?;

        result.message = "Atualização concluída".to_string();
        tracing::info!(
            actor_id = actor.id,
            created = result.created,
            updated = result.updated,
            errors = result.errors.len(),
            "Batch edit applied"
        );
        Ok(result)
    }

    /// Submits, approves or rejects many entries in one transaction.
    ///
    /// # Errors
    ///
    /// `WorkflowError::NotAuthorized` when `actor` may not perform
    /// `transition`, or a database error.
    pub async fn batch_transition(
        &self,
        actor: Actor,
        transition: Transition,
        ids: &[i32],
        motivo: Option<&str>,
    ) -> Result<BatchTransitionResult, EntryError> {
        WorkflowService::authorize(actor.role, transition)?;

        let mut unique = HashSet::new();
        let ids: Vec<i32> = ids.iter().copied().filter(|id| unique.insert(*id)).collect();

        let txn = self.db.begin().await?;
        lock_entries(&txn, &ids).await?;
        let mut found: HashMap<i32, (orcamentos::Model, Option<categorias::Model>)> =
            orcamentos::Entity::find()
                .find_also_related(categorias::Entity)
                .filter(orcamentos::Column::IdOrcamento.is_in(ids.iter().copied()))
                .all(&txn)
                .await?
                .into_iter()
                .map(|(entry, cat)| (entry.id_orcamento, (entry, cat)))
                .collect();

        let reason = WorkflowService::rejection_reason(motivo);
        let mut applied: Vec<EntryRef> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        for id in ids {
            let current = found.get(&id).map(|(entry, _)| BudgetStatus::from(entry.status));
            match WorkflowService::plan_batch_item(transition, id, current) {
                BatchOutcome::Skip => {}
                BatchOutcome::Error(message) => errors.push(message),
                BatchOutcome::Apply => {
                    let Some((entry, cat)) = found.remove(&id) else {
                        continue;
                    };
                    let action = transition_action(transition, entry.status.into(), actor.id, &reason)?;
                    let stored = apply_action(&txn, entry, &action).await?;
                    applied.push(entry_ref(&stored, cat.as_ref()));
                }
            }
        }

        let now = Utc::now();
        let total = applied.len();
        let log = match transition {
            Transition::Submit => (total > 0).then(|| {
                NewLog::new(actor.id, history::submission_action(total), tables::ORCAMENTOS)
                    .details(history::submission_details(&applied, &errors, now))
            }),
            Transition::Approve => Some(
                NewLog::new(actor.id, history::batch_approval_action(total), tables::ORCAMENTOS)
                    .details(json!({
                        "ids": applied.iter().map(|e| e.id_orcamento).collect::<Vec<_>>(),
                        "erros": errors,
                    })),
            ),
            Transition::Reject if total > 0 => {
                let nome = actor_name(&txn, actor.id).await?;
                Some(
                    NewLog::new(actor.id, history::batch_rejection_action(total), tables::ORCAMENTOS)
                        .details(history::batch_rejection_details(
                            &applied, &reason, &nome, &errors, now,
                        )),
                )
            }
            Transition::Reject => None,
        };
        if let Some(log) = log {
            AuditRepository::record(&txn, log).await?;
        }
        txn.commit().await?;

        let message = match transition {
            Transition::Submit => format!("{total} orçamentos enviados para aprovação."),
            Transition::Approve => format!("{total} orçamentos aprovados."),
            Transition::Reject => format!("{total} orçamentos reprovados."),
        };
        tracing::info!(actor_id = actor.id, ?transition, total, errors = errors.len(), "Batch transition applied");

        Ok(BatchTransitionResult { message, errors })
    }

    /// Approves one entry.
    ///
    /// # Errors
    ///
    /// `EntryError::NotFound`, `WorkflowError::AlreadyApproved`,
    /// `WorkflowError::InvalidTransition`.
    pub async fn approve(&self, actor: Actor, id: i32) -> Result<EntryView, EntryError> {
        WorkflowService::authorize(actor.role, Transition::Approve)?;

        let txn = self.db.begin().await?;
        let (entry, cat) = find_with_category(&txn, id).await?;
        let action = WorkflowService::approve(entry.status.into(), actor.id)?;
        let stored = apply_action(&txn, entry, &action).await?;

        let mes = Month::from(stored.mes);
        AuditRepository::record(
            &txn,
            NewLog::new(actor.id, history::approval_action(mes, stored.ano), tables::ORCAMENTOS)
                .record(id)
                .details(json!({ "orcamento": entry_ref(&stored, cat.as_ref()) })),
        )
        .await?;
        txn.commit().await?;

        Ok(EntryView::new(stored, cat))
    }

    /// Rejects one entry.
    ///
    /// # Errors
    ///
    /// `EntryError::NotFound`, `WorkflowError::InvalidTransition`.
    pub async fn reject(
        &self,
        actor: Actor,
        id: i32,
        motivo: Option<&str>,
    ) -> Result<EntryView, EntryError> {
        WorkflowService::authorize(actor.role, Transition::Reject)?;

        let txn = self.db.begin().await?;
        let (entry, cat) = find_with_category(&txn, id).await?;
        let action = WorkflowService::reject(entry.status.into(), actor.id, motivo)?;
        let reason = match &action {
            WorkflowAction::Reject { reason, .. } => reason.clone(),
            _ => WorkflowService::rejection_reason(motivo),
        };
        let stored = apply_action(&txn, entry, &action).await?;

        let mes = Month::from(stored.mes);
        AuditRepository::record(
            &txn,
            NewLog::new(
                actor.id,
                history::single_rejection_action(mes, stored.ano),
                tables::ORCAMENTOS,
            )
            .record(id)
            .details(history::single_rejection_details(
                &entry_ref(&stored, cat.as_ref()),
                &reason,
            )),
        )
        .await?;
        txn.commit().await?;

        Ok(EntryView::new(stored, cat))
    }

    /// Deletes one entry and logs it.
    ///
    /// # Errors
    ///
    /// `EntryError::NotFound`.
    pub async fn delete(&self, actor: Actor, id: i32) -> Result<(), EntryError> {
        let txn = self.db.begin().await?;
        let (entry, cat) = find_with_category(&txn, id).await?;
        let view = EntryView::new(entry.clone(), cat);

        orcamentos::Entity::delete_by_id(id).exec(&txn).await?;
        AuditRepository::record(
            &txn,
            NewLog::new(
                actor.id,
                format!("Deletou orçamento {}/{}", view.mes, view.ano),
                tables::ORCAMENTOS,
            )
            .record(id)
            .details(json!({ "orcamento_deletado": view })),
        )
        .await?;
        txn.commit().await?;

        tracing::info!(entry_id = id, actor_id = actor.id, "Budget entry deleted");
        Ok(())
    }

    /// Entries awaiting approval as log references.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending(&self) -> Result<Vec<EntryRef>, DbErr> {
        let rows = orcamentos::Entity::find()
            .find_also_related(categorias::Entity)
            .filter(orcamentos::Column::Status.eq(DbStatus::AguardandoAprovacao))
            .order_by_asc(orcamentos::Column::IdOrcamento)
            .all(&self.db)
            .await?;
        Ok(rows
            .iter()
            .map(|(entry, cat)| entry_ref(entry, cat.as_ref()))
            .collect())
    }

    /// Submissions shown to gestores.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn submissions(&self) -> Result<Vec<SubmissionBatch>, DbErr> {
        let logs = AuditRepository::new(self.db.clone())
            .history(&[SUBMIT_BATCH_PREFIX])
            .await?;
        let pending = self.pending().await?;
        Ok(history::build_submissions(&logs, &pending))
    }

    /// Rejections shown to admins.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn rejections(&self) -> Result<Vec<RejectionGroup>, DbErr> {
        let logs = AuditRepository::new(self.db.clone())
            .history(&[REJECT_BATCH_PREFIX, REJECT_SINGLE_PREFIX])
            .await?;
        Ok(history::build_rejections(&logs))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Log reference for an entry.
fn entry_ref(entry: &orcamentos::Model, cat: Option<&categorias::Model>) -> EntryRef {
    EntryRef {
        id_orcamento: entry.id_orcamento,
        id_categoria: entry.id_categoria,
        categoria_nome: cat.map(|c| c.categoria.clone()).unwrap_or_default(),
        master: cat.and_then(|c| c.master.clone()),
        uf: cat.and_then(|c| c.uf.clone()),
        grupo: cat.and_then(|c| c.grupo.clone()),
        mes: entry.mes.into(),
        ano: entry.ano,
    }
}

fn transition_action(
    transition: Transition,
    current: BudgetStatus,
    actor_id: i32,
    reason: &str,
) -> Result<WorkflowAction, WorkflowError> {
    match transition {
        Transition::Submit => WorkflowService::submit(current, actor_id),
        Transition::Approve => WorkflowService::approve(current, actor_id),
        Transition::Reject => WorkflowService::reject(current, actor_id, Some(reason)),
    }
}

/// Takes row locks on the entries until the transaction ends.
///
/// `FOR UPDATE` cannot reach the nullable side of the category join, so the
/// lock is a separate select on `orcamentos` alone.
async fn lock_entries<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<(), DbErr> {
    orcamentos::Entity::find()
        .select_only()
        .column(orcamentos::Column::IdOrcamento)
        .filter(orcamentos::Column::IdOrcamento.is_in(ids.iter().copied()))
        .lock_exclusive()
        .into_tuple::<i32>()
        .all(conn)
        .await?;
    Ok(())
}

/// Loads an entry with its category, locking the entry row.
async fn find_with_category<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<(orcamentos::Model, Option<categorias::Model>), EntryError> {
    lock_entries(conn, &[id]).await?;
    orcamentos::Entity::find_by_id(id)
        .find_also_related(categorias::Entity)
        .one(conn)
        .await?
        .ok_or(EntryError::NotFound(id))
}

async fn actor_name<C: ConnectionTrait>(conn: &C, id: i32) -> Result<String, DbErr> {
    Ok(usuarios::Entity::find_by_id(id)
        .one(conn)
        .await?
        .map(|u| u.nome)
        .unwrap_or_default())
}

/// Stores the status and approval fields of `action`.
async fn apply_action<C: ConnectionTrait>(
    conn: &C,
    entry: orcamentos::Model,
    action: &WorkflowAction,
) -> Result<orcamentos::Model, DbErr> {
    let approval = action.approval();
    let mut active = entry.into_active_model();
    active.status = Set(action.new_status().into());
    active.aprovado_por = Set(approval.map(|(by, _)| by));
    active.data_aprovacao = Set(approval.map(|(_, at)| at.into()));
    active.atualizado_por = Set(Some(action.actor()));
    active.atualizado_em = Set(Some(Utc::now().into()));
    active.update(conn).await
}

/// Creates or updates the entry keyed by `input` as the edit policy allows.
async fn apply_edit<C: ConnectionTrait>(
    conn: &C,
    actor: Actor,
    input: &EntryInput,
    policy: &EditPolicy,
    mode: EditMode,
    today: NaiveDate,
) -> Result<Applied, EntryError> {
    let existing = orcamentos::Entity::find()
        .filter(orcamentos::Column::IdCategoria.eq(input.id_categoria))
        .filter(orcamentos::Column::Mes.eq(MonthName::from(input.mes)))
        .filter(orcamentos::Column::Ano.eq(input.ano))
        .one(conn)
        .await?;

    let request = input.request();
    let now = Utc::now();

    let Some(entry) = existing else {
        let decision = policy.check_create(actor.role, &request)?;
        let created = orcamentos::ActiveModel {
            id_categoria: Set(input.id_categoria),
            mes: Set(input.mes.into()),
            ano: Set(input.ano),
            orcado: Set(decision.orcado),
            realizado: Set(decision.realizado),
            dif: Set(decision.dif),
            status: Set(decision.status.into()),
            criado_por: Set(Some(actor.id)),
            atualizado_por: Set(Some(actor.id)),
            criado_em: Set(Some(now.into())),
            atualizado_em: Set(Some(now.into())),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        return Ok(Applied::Created(created));
    };

    let snapshot = EntrySnapshot {
        status: entry.status.into(),
        orcado: entry.orcado,
        realizado: entry.realizado,
        mes: entry.mes.into(),
        ano: entry.ano,
    };
    let decision = policy.check_update(actor.role, &snapshot, &request, mode, today)?;
    if !decision.changed {
        return Ok(Applied::Unchanged(entry));
    }

    let mut active = entry.into_active_model();
    active.orcado = Set(decision.orcado);
    active.realizado = Set(decision.realizado);
    active.dif = Set(decision.dif);
    active.status = Set(decision.status.into());
    active.atualizado_por = Set(Some(actor.id));
    active.atualizado_em = Set(Some(now.into()));
    Ok(Applied::Updated(active.update(conn).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(status: DbStatus) -> orcamentos::Model {
        orcamentos::Model {
            id_orcamento: 11,
            id_categoria: 3,
            mes: MonthName::Marco,
            ano: 2024,
            orcado: dec!(100.00),
            realizado: dec!(80.00),
            dif: dec!(-20.00),
            status,
            aprovado_por: None,
            data_aprovacao: None,
            criado_por: Some(1),
            atualizado_por: None,
            criado_em: None,
            atualizado_em: None,
        }
    }

    fn category() -> categorias::Model {
        categorias::Model {
            id_categoria: 3,
            categoria: "Energia".to_string(),
            uf: Some("SP".to_string()),
            master: Some("ADM".to_string()),
            grupo: Some("Utilidades".to_string()),
            cod_class: None,
            classe_custo: None,
            criado_em: None,
        }
    }

    #[test]
    fn test_entry_input_accepts_month_number() {
        let input: EntryInput = serde_json::from_value(json!({
            "id_categoria": 3,
            "mes": 3,
            "ano": 2024,
            "orcado": "150.50",
        }))
        .unwrap();
        assert_eq!(input.mes, Month::Marco);
        assert_eq!(input.orcado, Some(dec!(150.50)));
        assert_eq!(input.realizado, None);
    }

    #[test]
    fn test_entry_ref_copies_category() {
        let r = entry_ref(&entry(DbStatus::AguardandoAprovacao), Some(&category()));
        assert_eq!(r.categoria_nome, "Energia");
        assert_eq!(r.master.as_deref(), Some("ADM"));
        assert_eq!(r.mes, Month::Marco);

        let orphan = entry_ref(&entry(DbStatus::Rascunho), None);
        assert!(orphan.categoria_nome.is_empty());
        assert!(orphan.uf.is_none());
    }

    #[test]
    fn test_entry_view_serializes_domain_values() {
        let view = EntryView::new(entry(DbStatus::Aprovado), Some(category()));
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["mes"], "Março");
        assert_eq!(value["status"], "aprovado");
        assert_eq!(value["categoria"]["categoria"], "Energia");
    }

    #[test]
    fn test_entry_error_mapping() {
        let err = AppError::from(EntryError::Workflow(WorkflowError::AlreadyApproved));
        assert_eq!(err.status_code(), 400);
        assert_eq!(AppError::from(EntryError::NotFound(1)).status_code(), 404);
        assert_eq!(
            AppError::from(EntryError::CategoryNotFound(1)).message(),
            "Categoria não encontrada"
        );
    }

    #[test]
    fn test_transition_action_uses_reason() {
        let action =
            transition_action(Transition::Reject, BudgetStatus::Aprovado, 2, "valores").unwrap();
        assert!(matches!(action, WorkflowAction::Reject { ref reason, .. } if reason == "valores"));
        assert!(transition_action(Transition::Submit, BudgetStatus::Aprovado, 1, "").is_err());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" SP ")), Some("SP"));
        assert_eq!(non_blank(None), None);
    }
}
