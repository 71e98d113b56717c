//! Audit log repository.
//!
//! Every mutation writes one `logs` row. [`AuditRepository::record`] takes any
//! connection so callers can write the row inside their own transaction.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use orcamento_core::reports::LogExportRow;
use orcamento_core::workflow::LogRecord;
use orcamento_shared::types::PageRequest;

use crate::entities::{logs, usuarios};

/// Tables that appear in `tabela_afetada`.
pub mod tables {
    /// Users.
    pub const USUARIOS: &str = "usuarios";
    /// Categories.
    pub const CATEGORIAS: &str = "categorias";
    /// Budget entries.
    pub const ORCAMENTOS: &str = "orcamentos";
    /// Logins, logouts and other system events.
    pub const SISTEMA: &str = "sistema";

    /// All audited tables.
    pub const ALL: [&str; 4] = [USUARIOS, CATEGORIAS, ORCAMENTOS, SISTEMA];

    /// Returns true if `name` is an audited table.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        ALL.contains(&name)
    }
}

/// A log row to write.
#[derive(Debug, Clone, Default)]
pub struct NewLog {
    /// Acting user.
    pub id_usuario: Option<i32>,
    /// Action description.
    pub acao: String,
    /// Affected table.
    pub tabela_afetada: Option<String>,
    /// Affected record.
    pub id_registro: Option<i32>,
    /// Structured details.
    pub detalhes: Option<Value>,
}

impl NewLog {
    /// Starts a log row for `acao` by `id_usuario` on `tabela`.
    #[must_use]
    pub fn new(id_usuario: i32, acao: impl Into<String>, tabela: &str) -> Self {
        Self {
            id_usuario: Some(id_usuario),
            acao: acao.into(),
            tabela_afetada: Some(tabela.to_string()),
            ..Self::default()
        }
    }

    /// Sets the affected record.
    #[must_use]
    pub const fn record(mut self, id: i32) -> Self {
        self.id_registro = Some(id);
        self
    }

    /// Sets the details.
    #[must_use]
    pub fn details(mut self, detalhes: Value) -> Self {
        self.detalhes = Some(detalhes);
        self
    }
}

/// A log row with its user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogView {
    /// Log ID.
    pub id_log: i32,
    /// Acting user.
    pub id_usuario: Option<i32>,
    /// Acting user's name.
    pub usuario_nome: Option<String>,
    /// Acting user's email.
    pub usuario_email: Option<String>,
    /// Action description.
    pub acao: String,
    /// Affected table.
    pub tabela_afetada: Option<String>,
    /// Affected record.
    pub id_registro: Option<i32>,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Structured details.
    pub detalhes: Option<Value>,
}

impl LogView {
    fn from_models(log: logs::Model, user: Option<usuarios::Model>) -> Self {
        Self {
            id_log: log.id_log,
            id_usuario: log.id_usuario,
            usuario_nome: user.as_ref().map(|u| u.nome.clone()),
            usuario_email: user.map(|u| u.email),
            acao: log.acao,
            tabela_afetada: log.tabela_afetada,
            id_registro: log.id_registro,
            timestamp: log.timestamp.with_timezone(&Utc),
            detalhes: log.detalhes,
        }
    }
}

/// Filters for the log listing.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    /// Only this user.
    pub id_usuario: Option<i32>,
    /// Only this table.
    pub tabela_afetada: Option<String>,
    /// Action contains.
    pub acao: Option<String>,
    /// From this day.
    pub data_inicio: Option<NaiveDate>,
    /// Until the end of this day.
    pub data_fim: Option<NaiveDate>,
    /// Action or table contains.
    pub search: Option<String>,
}

/// Filters for the advanced log search.
#[derive(Debug, Clone, Default)]
pub struct LogSearch {
    /// Any of these users.
    pub usuarios: Vec<i32>,
    /// Any of these tables.
    pub tabelas: Vec<String>,
    /// Action contains any of these.
    pub acoes: Vec<String>,
    /// From this day.
    pub data_inicio: Option<NaiveDate>,
    /// Until the end of this day.
    pub data_fim: Option<NaiveDate>,
    /// Action or details contain.
    pub texto: Option<String>,
}

/// Log count per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    /// User.
    pub id_usuario: Option<i32>,
    /// User name.
    pub nome: Option<String>,
    /// Number of logs.
    pub total: i64,
}

/// Log count per key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    /// Table, action or day.
    pub chave: String,
    /// Number of logs.
    pub total: i64,
}

/// Audit log overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogSummary {
    /// All logs.
    pub total: u64,
    /// Ten most active users.
    pub por_usuario: Vec<UserActivity>,
    /// Logs per table.
    pub por_tabela: Vec<KeyCount>,
    /// Ten most frequent actions.
    pub acoes_frequentes: Vec<KeyCount>,
    /// Logs per day over the last seven days.
    pub ultimos_7_dias: Vec<KeyCount>,
    /// Ten most recent logs.
    pub recentes: Vec<LogView>,
}

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Writes a log row on `conn`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record<C: ConnectionTrait>(conn: &C, log: NewLog) -> Result<logs::Model, DbErr> {
        logs::ActiveModel {
            id_usuario: Set(log.id_usuario),
            acao: Set(log.acao),
            tabela_afetada: Set(log.tabela_afetada),
            id_registro: Set(log.id_registro),
            timestamp: Set(Utc::now().into()),
            detalhes: Set(log.detalhes),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    /// Writes a log row outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn log(&self, log: NewLog) -> Result<logs::Model, DbErr> {
        Self::record(&self.db, log).await
    }

    /// Lists logs, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        filter: &LogFilter,
        page: &PageRequest,
    ) -> Result<(Vec<LogView>, u64), DbErr> {
        self.page(filter_condition(filter), page).await
    }

    /// Runs the advanced search, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(
        &self,
        search: &LogSearch,
        page: &PageRequest,
    ) -> Result<(Vec<LogView>, u64), DbErr> {
        self.page(search_condition(search), page).await
    }

    /// Finds one log.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<LogView>, DbErr> {
        let found = logs::Entity::find_by_id(id)
            .find_also_related(usuarios::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(log, user)| LogView::from_models(log, user)))
    }

    /// All logs matching `filter` for export, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn export(&self, filter: &LogFilter) -> Result<Vec<LogExportRow>, DbErr> {
        let rows = logs::Entity::find()
            .find_also_related(usuarios::Entity)
            .filter(filter_condition(filter))
            .order_by_desc(logs::Column::Timestamp)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(log, user)| LogExportRow {
                id_log: log.id_log,
                usuario: user.map(|u| u.nome),
                acao: log.acao,
                tabela: log.tabela_afetada,
                id_registro: log.id_registro,
                timestamp: log.timestamp.with_timezone(&Utc),
                detalhes: log.detalhes,
            })
            .collect())
    }

    /// Logs whose action starts with one of `prefixes`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(&self, prefixes: &[&str]) -> Result<Vec<LogRecord>, DbErr> {
        let mut any = Condition::any();
        for prefix in prefixes {
            any = any.add(logs::Column::Acao.starts_with(*prefix));
        }

        let rows = logs::Entity::find()
            .find_also_related(usuarios::Entity)
            .filter(logs::Column::TabelaAfetada.eq(tables::ORCAMENTOS))
            .filter(any)
            .order_by_desc(logs::Column::Timestamp)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(log, user)| LogRecord {
                id_log: log.id_log,
                timestamp: log.timestamp.with_timezone(&Utc),
                id_usuario: log.id_usuario,
                usuario_nome: user.map(|u| u.nome),
                acao: log.acao,
                detalhes: log.detalhes.unwrap_or(Value::Null),
            })
            .collect())
    }

    /// Builds the log overview.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn summary(&self) -> Result<LogSummary, DbErr> {
        let total = logs::Entity::find().count(&self.db).await?;

        let per_user: Vec<(Option<i32>, i64)> = logs::Entity::find()
            .select_only()
            .column(logs::Column::IdUsuario)
            .column_as(Expr::col(logs::Column::IdLog).count(), "total")
            .group_by(logs::Column::IdUsuario)
            .into_tuple()
            .all(&self.db)
            .await?;
        let per_user = top(per_user, 10);

        let user_ids: Vec<i32> = per_user.iter().filter_map(|(id, _)| *id).collect();
        let names: HashMap<i32, String> = usuarios::Entity::find()
            .filter(usuarios::Column::IdUsuario.is_in(user_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id_usuario, u.nome))
            .collect();

        let per_table: Vec<(Option<String>, i64)> = logs::Entity::find()
            .select_only()
            .column(logs::Column::TabelaAfetada)
            .column_as(Expr::col(logs::Column::IdLog).count(), "total")
            .group_by(logs::Column::TabelaAfetada)
            .into_tuple()
            .all(&self.db)
            .await?;

        let per_action: Vec<(String, i64)> = logs::Entity::find()
            .select_only()
            .column(logs::Column::Acao)
            .column_as(Expr::col(logs::Column::IdLog).count(), "total")
            .group_by(logs::Column::Acao)
            .into_tuple()
            .all(&self.db)
            .await?;

        let since = Utc::now() - Duration::days(7);
        let recent_times: Vec<DateTime<Utc>> = logs::Entity::find()
            .select_only()
            .column(logs::Column::Timestamp)
            .filter(logs::Column::Timestamp.gte(since))
            .into_tuple::<sea_orm::prelude::DateTimeWithTimeZone>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|ts| ts.with_timezone(&Utc))
            .collect();

        let (recentes, _) = self
            .list(&LogFilter::default(), &PageRequest::new(Some(1), Some(10)))
            .await?;

        Ok(LogSummary {
            total,
            por_usuario: per_user
                .into_iter()
                .map(|(id, total)| UserActivity {
                    id_usuario: id,
                    nome: id.and_then(|id| names.get(&id).cloned()),
                    total,
                })
                .collect(),
            por_tabela: top(per_table, usize::MAX)
                .into_iter()
                .map(|(tabela, total)| KeyCount {
                    chave: tabela.unwrap_or_default(),
                    total,
                })
                .collect(),
            acoes_frequentes: top(per_action, 10)
                .into_iter()
                .map(|(acao, total)| KeyCount { chave: acao, total })
                .collect(),
            ultimos_7_dias: daily_counts(&recent_times),
            recentes,
        })
    }

    async fn page(
        &self,
        condition: Condition,
        page: &PageRequest,
    ) -> Result<(Vec<LogView>, u64), DbErr> {
        let query = logs::Entity::find()
            .find_also_related(usuarios::Entity)
            .filter(condition);

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(logs::Column::Timestamp)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((
            rows.into_iter()
                .map(|(log, user)| LogView::from_models(log, user))
                .collect(),
            total,
        ))
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    start_of_day(day) + Duration::days(1) - Duration::seconds(1)
}

fn date_range(mut cond: Condition, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Condition {
    if let Some(from) = from {
        cond = cond.add(logs::Column::Timestamp.gte(start_of_day(from)));
    }
    if let Some(to) = to {
        cond = cond.add(logs::Column::Timestamp.lte(end_of_day(to)));
    }
    cond
}

fn filter_condition(filter: &LogFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(id) = filter.id_usuario {
        cond = cond.add(logs::Column::IdUsuario.eq(id));
    }
    if let Some(tabela) = &filter.tabela_afetada {
        cond = cond.add(logs::Column::TabelaAfetada.eq(tabela.as_str()));
    }
    if let Some(acao) = &filter.acao {
        cond = cond.add(logs::Column::Acao.contains(acao.as_str()));
    }
    if let Some(term) = &filter.search {
        cond = cond.add(
            Condition::any()
                .add(logs::Column::Acao.contains(term.as_str()))
                .add(logs::Column::TabelaAfetada.contains(term.as_str())),
        );
    }
    date_range(cond, filter.data_inicio, filter.data_fim)
}

fn search_condition(search: &LogSearch) -> Condition {
    let mut cond = Condition::all();
    if !search.usuarios.is_empty() {
        cond = cond.add(logs::Column::IdUsuario.is_in(search.usuarios.iter().copied()));
    }
    if !search.tabelas.is_empty() {
        cond = cond.add(logs::Column::TabelaAfetada.is_in(search.tabelas.iter().cloned()));
    }
    if !search.acoes.is_empty() {
        let mut any = Condition::any();
        for acao in &search.acoes {
            any = any.add(logs::Column::Acao.contains(acao.as_str()));
        }
        cond = cond.add(any);
    }
    if let Some(texto) = &search.texto {
        let pattern = format!("%{texto}%");
        cond = cond.add(
            Condition::any()
                .add(logs::Column::Acao.contains(texto.as_str()))
                .add(Expr::cust_with_values("detalhes::text ILIKE $1", [pattern])),
        );
    }
    date_range(cond, search.data_inicio, search.data_fim)
}

fn top<K>(mut counts: Vec<(K, i64)>, n: usize) -> Vec<(K, i64)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(n);
    counts
}

/// Counts timestamps per day, oldest day first.
fn daily_counts(times: &[DateTime<Utc>]) -> Vec<KeyCount> {
    let mut days: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for ts in times {
        *days.entry(ts.date_naive()).or_default() += 1;
    }
    days.into_iter()
        .map(|(day, total)| KeyCount {
            chave: day.to_string(),
            total,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tables() {
        assert!(tables::is_valid("orcamentos"));
        assert!(tables::is_valid("sistema"));
        assert!(!tables::is_valid("pg_user"));
    }

    #[test]
    fn test_end_of_day_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            end_of_day(day),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()
        );
        assert_eq!(
            start_of_day(day),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_top_sorts_and_truncates() {
        let counts = vec![("a", 1), ("b", 5), ("c", 3)];
        assert_eq!(top(counts, 2), vec![("b", 5), ("c", 3)]);
    }

    #[test]
    fn test_daily_counts() {
        let times = vec![
            Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 2, 23, 0, 0).unwrap(),
        ];
        let counts = daily_counts(&times);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].chave, "2024-03-01");
        assert_eq!(counts[1].total, 2);
    }

    #[test]
    fn test_new_log_builder() {
        let log = NewLog::new(3, "Criou categoria", tables::CATEGORIAS)
            .record(9)
            .details(serde_json::json!({"categoria": "Energia"}));
        assert_eq!(log.id_usuario, Some(3));
        assert_eq!(log.id_registro, Some(9));
        assert_eq!(log.tabela_afetada.as_deref(), Some("categorias"));
        assert!(log.detalhes.is_some());
    }
}
