//! Submission and rejection history rebuilt from the audit log.
//!
//! Batch workflow operations write one log row whose `detalhes` lists the
//! affected entries. The helpers here build those rows and read them back
//! into the views shown to gestores ("Submissões") and admins ("Rejeições").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::budget::Month;

/// `acao` prefix of batch submission logs.
pub const SUBMIT_BATCH_PREFIX: &str = "Submissão em lote";
/// `acao` prefix of batch rejection logs.
pub const REJECT_BATCH_PREFIX: &str = "Reprovação em lote";
/// `acao` prefix of single rejection logs.
pub const REJECT_SINGLE_PREFIX: &str = "Reprovou orçamento";
/// Submitter shown for pending entries without a submission log.
pub const IMPORTED_SUBMITTER: &str = "Importado";

const UNKNOWN_USER: &str = "Desconhecido";

/// Audit log row as needed by the history views.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Log ID.
    pub id_log: i32,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
    /// Acting user, if still present.
    pub id_usuario: Option<i32>,
    /// Acting user's name, if still present.
    pub usuario_nome: Option<String>,
    /// Action description.
    pub acao: String,
    /// Structured details.
    pub detalhes: Value,
}

/// A budget entry as referenced from log details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    /// Entry ID.
    pub id_orcamento: i32,
    /// Category ID.
    pub id_categoria: i32,
    /// Category name.
    #[serde(default)]
    pub categoria_nome: String,
    /// Cost center.
    #[serde(default)]
    pub master: Option<String>,
    /// State.
    #[serde(default)]
    pub uf: Option<String>,
    /// Group.
    #[serde(default)]
    pub grupo: Option<String>,
    /// Month.
    pub mes: Month,
    /// Year.
    pub ano: i32,
}

/// One submission shown to gestores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionBatch {
    /// Source log, `None` for the virtual "Importado" batch.
    pub id_log: Option<i32>,
    /// When the batch was submitted.
    pub data: Option<DateTime<Utc>>,
    /// Who submitted it.
    pub admin_usuario: String,
    /// Number of submitted entries.
    pub total_submetidos: usize,
    /// Submitted entries.
    pub orcamentos: Vec<EntryRef>,
    /// Distinct cost centers.
    pub masters: Vec<String>,
    /// Distinct states.
    pub ufs: Vec<String>,
    /// Distinct category names.
    pub categorias: Vec<String>,
}

/// Whether a rejection came from a batch or from single rejections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RejectionKind {
    /// One batch rejection log.
    Lote,
    /// Single rejections sharing time, user and reason.
    Individual,
}

/// One rejection shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectionGroup {
    /// Batch or single rejections.
    pub tipo: RejectionKind,
    /// Source log for batches.
    pub id_log: Option<i32>,
    /// When the entries were rejected.
    pub data: DateTime<Utc>,
    /// Who rejected them.
    pub gestor_usuario: String,
    /// Rejection reason.
    pub motivo: String,
    /// Number of rejected entries.
    pub total_reprovados: usize,
    /// Rejected entries.
    pub orcamentos: Vec<EntryRef>,
    /// Distinct cost centers.
    pub masters: Vec<String>,
    /// Distinct states.
    pub ufs: Vec<String>,
    /// Distinct category names.
    pub categorias: Vec<String>,
}

/// `acao` of a batch submission log.
#[must_use]
pub fn submission_action(total: usize) -> String {
    format!("{SUBMIT_BATCH_PREFIX}: {total} orçamentos enviados para aprovação")
}

/// `acao` of a batch rejection log.
#[must_use]
pub fn batch_rejection_action(total: usize) -> String {
    format!("{REJECT_BATCH_PREFIX}: {total} orçamentos rejeitados")
}

/// `acao` of a single rejection log.
#[must_use]
pub fn single_rejection_action(mes: Month, ano: i32) -> String {
    format!("{REJECT_SINGLE_PREFIX} {mes}/{ano}")
}

/// `acao` of a single approval log.
#[must_use]
pub fn approval_action(mes: Month, ano: i32) -> String {
    format!("Aprovou orçamento {mes}/{ano}")
}

/// `acao` of a batch approval log.
#[must_use]
pub fn batch_approval_action(total: usize) -> String {
    format!("Aprovação em lote: {total} aprovados")
}

/// `detalhes` of a batch submission log.
#[must_use]
pub fn submission_details(entries: &[EntryRef], errors: &[String], at: DateTime<Utc>) -> Value {
    json!({
        "orcamentos_submetidos": entries,
        "total_submetidos": entries.len(),
        "erros": errors,
        "timestamp": at,
    })
}

/// `detalhes` of a batch rejection log.
#[must_use]
pub fn batch_rejection_details(
    entries: &[EntryRef],
    motivo: &str,
    gestor_usuario: &str,
    errors: &[String],
    at: DateTime<Utc>,
) -> Value {
    json!({
        "orcamentos_reprovados": entries,
        "total_reprovados": entries.len(),
        "motivo": motivo,
        "gestor_usuario": gestor_usuario,
        "erros": errors,
        "timestamp": at,
    })
}

/// `detalhes` of a single rejection log.
#[must_use]
pub fn single_rejection_details(entry: &EntryRef, motivo: &str) -> Value {
    json!({
        "orcamento": entry,
        "motivo": motivo,
    })
}

/// Builds the submission list.
///
/// `pending` holds every entry currently awaiting approval. Those not
/// referenced by any submission log form a virtual batch placed first.
/// Logged batches follow, newest first.
#[must_use]
pub fn build_submissions(logs: &[LogRecord], pending: &[EntryRef]) -> Vec<SubmissionBatch> {
    let mut batches: Vec<SubmissionBatch> = logs
        .iter()
        .filter(|log| log.acao.starts_with(SUBMIT_BATCH_PREFIX))
        .map(|log| {
            let orcamentos = entry_list(&log.detalhes, "orcamentos_submetidos");
            let total = count_field(&log.detalhes, "total_submetidos").unwrap_or(orcamentos.len());
            let (masters, ufs, categorias) = labels(&orcamentos);
            SubmissionBatch {
                id_log: Some(log.id_log),
                data: Some(log.timestamp),
                admin_usuario: user_name(log),
                total_submetidos: total,
                orcamentos,
                masters,
                ufs,
                categorias,
            }
        })
        .collect();

    batches.sort_by(|a, b| b.data.cmp(&a.data));

    let referenced: HashSet<i32> = batches
        .iter()
        .flat_map(|b| b.orcamentos.iter().map(|e| e.id_orcamento))
        .collect();
    let orphans: Vec<EntryRef> = pending
        .iter()
        .filter(|e| !referenced.contains(&e.id_orcamento))
        .cloned()
        .collect();

    if !orphans.is_empty() {
        let (masters, ufs, categorias) = labels(&orphans);
        batches.insert(
            0,
            SubmissionBatch {
                id_log: None,
                data: None,
                admin_usuario: IMPORTED_SUBMITTER.to_string(),
                total_submetidos: orphans.len(),
                orcamentos: orphans,
                masters,
                ufs,
                categorias,
            },
        );
    }

    batches
}

/// Builds the rejection list, newest first.
///
/// Single rejections logged in the same second by the same user with the
/// same reason are merged into one group.
#[must_use]
pub fn build_rejections(logs: &[LogRecord]) -> Vec<RejectionGroup> {
    let mut groups = Vec::new();
    let mut singles: BTreeMap<(i64, Option<i32>, String), RejectionGroup> = BTreeMap::new();

    for log in logs {
        if log.acao.starts_with(REJECT_BATCH_PREFIX) {
            let orcamentos = entry_list(&log.detalhes, "orcamentos_reprovados");
            let total = count_field(&log.detalhes, "total_reprovados").unwrap_or(orcamentos.len());
            let gestor = log
                .detalhes
                .get("gestor_usuario")
                .and_then(Value::as_str)
                .map_or_else(|| user_name(log), str::to_string);
            let (masters, ufs, categorias) = labels(&orcamentos);
            groups.push(RejectionGroup {
                tipo: RejectionKind::Lote,
                id_log: Some(log.id_log),
                data: log.timestamp,
                gestor_usuario: gestor,
                motivo: reason(&log.detalhes),
                total_reprovados: total,
                orcamentos,
                masters,
                ufs,
                categorias,
            });
        } else if log.acao.starts_with(REJECT_SINGLE_PREFIX) {
            let motivo = reason(&log.detalhes);
            let key = (log.timestamp.timestamp(), log.id_usuario, motivo.clone());
            let group = singles.entry(key).or_insert_with(|| RejectionGroup {
                tipo: RejectionKind::Individual,
                id_log: None,
                data: log.timestamp,
                gestor_usuario: user_name(log),
                motivo,
                total_reprovados: 0,
                orcamentos: Vec::new(),
                masters: Vec::new(),
                ufs: Vec::new(),
                categorias: Vec::new(),
            });
            if let Some(entry) = log
                .detalhes
                .get("orcamento")
                .cloned()
                .and_then(|v| serde_json::from_value::<EntryRef>(v).ok())
            {
                group.orcamentos.push(entry);
            }
            group.total_reprovados += 1;
        }
    }

    for mut group in singles.into_values() {
        let (masters, ufs, categorias) = labels(&group.orcamentos);
        group.masters = masters;
        group.ufs = ufs;
        group.categorias = categorias;
        groups.push(group);
    }

    groups.sort_by(|a, b| b.data.cmp(&a.data));
    groups
}

fn entry_list(detalhes: &Value, field: &str) -> Vec<EntryRef> {
    detalhes
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn count_field(detalhes: &Value, field: &str) -> Option<usize> {
    detalhes
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn reason(detalhes: &Value) -> String {
    detalhes
        .get("motivo")
        .and_then(Value::as_str)
        .unwrap_or(super::types::DEFAULT_REJECTION_REASON)
        .to_string()
}

fn user_name(log: &LogRecord) -> String {
    log.usuario_nome
        .clone()
        .unwrap_or_else(|| UNKNOWN_USER.to_string())
}

fn labels(entries: &[EntryRef]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut masters = BTreeSet::new();
    let mut ufs = BTreeSet::new();
    let mut categorias = BTreeSet::new();
    for e in entries {
        if let Some(m) = e.master.as_ref().filter(|m| !m.is_empty()) {
            masters.insert(m.clone());
        }
        if let Some(u) = e.uf.as_ref().filter(|u| !u.is_empty()) {
            ufs.insert(u.clone());
        }
        if !e.categoria_nome.is_empty() {
            categorias.insert(e.categoria_nome.clone());
        }
    }
    (
        masters.into_iter().collect(),
        ufs.into_iter().collect(),
        categorias.into_iter().collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(id: i32, categoria: &str, master: &str, uf: &str) -> EntryRef {
        EntryRef {
            id_orcamento: id,
            id_categoria: id * 10,
            categoria_nome: categoria.to_string(),
            master: Some(master.to_string()),
            uf: Some(uf.to_string()),
            grupo: Some("Operacional".to_string()),
            mes: Month::Janeiro,
            ano: 2024,
        }
    }

    fn at(hour: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, second).unwrap()
    }

    fn log(id_log: i32, ts: DateTime<Utc>, acao: String, detalhes: Value) -> LogRecord {
        LogRecord {
            id_log,
            timestamp: ts,
            id_usuario: Some(1),
            usuario_nome: Some("Admin".to_string()),
            acao,
            detalhes,
        }
    }

    #[test]
    fn test_action_texts() {
        assert_eq!(
            submission_action(3),
            "Submissão em lote: 3 orçamentos enviados para aprovação"
        );
        assert_eq!(
            batch_rejection_action(2),
            "Reprovação em lote: 2 orçamentos rejeitados"
        );
        assert_eq!(
            single_rejection_action(Month::Marco, 2024),
            "Reprovou orçamento Março/2024"
        );
    }

    #[test]
    fn test_submissions_with_orphans_first() {
        let submitted = vec![entry(1, "Energia", "ADM", "SP"), entry(2, "Água", "ADM", "RJ")];
        let logs = vec![
            log(
                10,
                at(9, 0),
                submission_action(2),
                submission_details(&submitted, &[], at(9, 0)),
            ),
            log(11, at(10, 0), "Login realizado".to_string(), Value::Null),
        ];
        let pending = vec![submitted[0].clone(), entry(3, "Frete", "LOG", "SP")];

        let batches = build_submissions(&logs, &pending);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].id_log, None);
        assert_eq!(batches[0].admin_usuario, IMPORTED_SUBMITTER);
        assert_eq!(batches[0].orcamentos.len(), 1);
        assert_eq!(batches[0].orcamentos[0].id_orcamento, 3);

        assert_eq!(batches[1].id_log, Some(10));
        assert_eq!(batches[1].total_submetidos, 2);
        assert_eq!(batches[1].masters, vec!["ADM"]);
        assert_eq!(batches[1].ufs, vec!["RJ", "SP"]);
        assert_eq!(batches[1].categorias, vec!["Energia", "Água"]);
    }

    #[test]
    fn test_no_virtual_batch_without_orphans() {
        assert!(build_submissions(&[], &[]).is_empty());
    }

    #[test]
    fn test_rejections_grouped_and_sorted() {
        let a = entry(1, "Energia", "ADM", "SP");
        let b = entry(2, "Água", "ADM", "RJ");
        let c = entry(3, "Frete", "LOG", "SP");
        let logs = vec![
            log(
                20,
                at(8, 0),
                batch_rejection_action(1),
                batch_rejection_details(
                    std::slice::from_ref(&c),
                    "Acima do teto",
                    "Gestor",
                    &[],
                    at(8, 0),
                ),
            ),
            log(
                21,
                at(12, 5),
                single_rejection_action(Month::Janeiro, 2024),
                single_rejection_details(&a, "Valores errados"),
            ),
            log(
                22,
                at(12, 5),
                single_rejection_action(Month::Janeiro, 2024),
                single_rejection_details(&b, "Valores errados"),
            ),
            log(
                23,
                at(12, 5),
                single_rejection_action(Month::Janeiro, 2024),
                single_rejection_details(&b, "Outro motivo"),
            ),
        ];

        let groups = build_rejections(&logs);

        assert_eq!(groups.len(), 3);
        assert!(groups[..2].iter().all(|g| g.tipo == RejectionKind::Individual));
        let merged = groups
            .iter()
            .find(|g| g.motivo == "Valores errados")
            .unwrap();
        assert_eq!(merged.total_reprovados, 2);
        assert_eq!(merged.ufs, vec!["RJ", "SP"]);

        let batch = groups.last().unwrap();
        assert_eq!(batch.tipo, RejectionKind::Lote);
        assert_eq!(batch.gestor_usuario, "Gestor");
        assert_eq!(batch.id_log, Some(20));
    }

    #[test]
    fn test_rejection_without_reason_uses_default() {
        let logs = vec![log(
            30,
            at(7, 0),
            batch_rejection_action(0),
            json!({"orcamentos_reprovados": []}),
        )];
        let groups = build_rejections(&logs);
        assert_eq!(groups[0].motivo, "Sem motivo especificado");
        assert_eq!(groups[0].gestor_usuario, "Admin");
    }
}
