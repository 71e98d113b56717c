//! Integration tests for the category repository.

mod common;

use orcamento_core::auth::Role;
use orcamento_core::budget::Month;
use orcamento_core::reports::CategoryImportRow;
use orcamento_core::workflow::EditPolicy;
use orcamento_db::repositories::{
    Actor, BudgetEntryRepository, CategoryError, CategoryFilter, CategoryInput,
    CategoryRepository, EntryInput,
};
use rust_decimal_macros::dec;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_category_is_conflict() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let repo = CategoryRepository::new(db);

    let input = CategoryInput {
        categoria: common::unique("Aluguel"),
        grupo: Some("Imoveis".to_string()),
        ..CategoryInput::default()
    };
    repo.create(admin, input.clone()).await.expect("first create");

    // cod_class is NULL on both rows and still counts as equal
    let result = repo.create(admin, input).await;
    assert!(matches!(result, Err(CategoryError::Duplicate)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_with_entries_fails() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let id = common::create_category(&db, admin).await;

    BudgetEntryRepository::new(db.clone())
        .upsert(
            Actor { id: admin, role: Role::Admin },
            &EntryInput {
                id_categoria: id,
                mes: Month::Janeiro,
                ano: 2024,
                orcado: Some(dec!(100)),
                realizado: None,
                status: None,
            },
            &EditPolicy::default(),
            chrono::Utc::now().date_naive(),
        )
        .await
        .expect("upsert");

    let result = CategoryRepository::new(db).delete(admin, id).await;
    assert!(matches!(result, Err(CategoryError::HasEntries(1))));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_filters_and_options() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let id = common::create_category(&db, admin).await;
    let repo = CategoryRepository::new(db);

    let created = repo.find_by_id(id).await.unwrap().unwrap();
    let listed = repo
        .list(&CategoryFilter {
            search: Some(created.categoria.clone()),
            ..CategoryFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id_categoria, id);

    let options = repo.filter_options().await.unwrap();
    assert!(options.categorias.contains(&created.categoria));
    assert!(options.ufs.contains(&"SP".to_string()));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_import_skips_duplicates() {
    let db = common::setup().await;
    let admin = common::create_user(&db, Role::Admin).await;
    let repo = CategoryRepository::new(db);
    let name = common::unique("Frete");

    let row = |line: usize| CategoryImportRow {
        line,
        categoria: name.clone(),
        uf: Some("MG".to_string()),
        master: None,
        grupo: Some("Logistica".to_string()),
        cod_class: None,
        classe_custo: None,
    };

    let result = repo.import(admin, vec![row(2), row(3)]).await.unwrap();
    assert_eq!(result.criadas, 1);
    assert_eq!(result.erros.len(), 1);
    assert!(result.erros[0].starts_with("Linha 3"));
}
