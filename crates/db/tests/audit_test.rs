//! Integration tests for the audit log repository.

mod common;

use orcamento_core::auth::Role;
use orcamento_db::repositories::{AuditRepository, LogFilter, LogSearch, tables};
use orcamento_shared::types::PageRequest;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_mutations_are_logged() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let categoria = common::create_category(&db, admin).await;
    let repo = AuditRepository::new(db);

    let (logs, total) = repo
        .list(
            &LogFilter {
                id_usuario: Some(admin),
                tabela_afetada: Some(tables::CATEGORIAS.to_string()),
                ..LogFilter::default()
            },
            &PageRequest::new(Some(1), Some(50)),
        )
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(logs[0].id_registro, Some(categoria));
    assert!(logs[0].acao.starts_with("Criou categoria"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_search_matches_details() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let categoria = common::create_category(&db, admin).await;
    let repo = AuditRepository::new(db);

    let (logs, _) = repo
        .search(
            &LogSearch {
                usuarios: vec![admin],
                texto: Some("despesas FIXAS".to_string()),
                ..LogSearch::default()
            },
            &PageRequest::new(None, None),
        )
        .await
        .unwrap();
    assert!(logs.iter().any(|l| l.id_registro == Some(categoria)));

    let summary = repo.summary().await.unwrap();
    assert!(summary.total >= 1);
    assert!(summary.recentes.len() <= 10);
}
