//! Database seeder for development and testing.
//!
//! Seeds one user per role, a handful of categories and draft entries for
//! the first half of the current year. Safe to run twice.
//!
//! Usage: cargo run --bin seeder

use chrono::{Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use orcamento_core::auth::{Role, hash_password};
use orcamento_core::budget::Month;
use orcamento_core::workflow::EditPolicy;
use orcamento_db::{
    Actor, BudgetEntryRepository, CategoryError, CategoryInput, CategoryRepository,
    CreateUserInput, EntryInput, UserRepository,
};
use orcamento_shared::AppConfig;

/// Development users: name, email, password, role.
const USERS: [(&str, &str, &str, Role); 3] = [
    ("Administrador", "admin@empresa.com", "admin123", Role::Admin),
    ("Gestor", "gestor@empresa.com", "gestor123", Role::Gestor),
    ("Visualizador", "visualizador@empresa.com", "visual123", Role::Visualizador),
];

/// Sample categories: name, state, cost center, group, planned monthly amount.
const CATEGORIES: [(&str, &str, &str, &str, i64); 5] = [
    ("Energia Elétrica", "SP", "Operações", "Utilidades", 12_000),
    ("Água e Esgoto", "SP", "Operações", "Utilidades", 3_500),
    ("Aluguel", "RJ", "Administrativo", "Ocupação", 25_000),
    ("Telefonia", "MG", "Administrativo", "Comunicação", 4_200),
    ("Manutenção Predial", "RJ", "Facilities", "Manutenção", 8_000),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    println!("Connecting to database...");
    let db = orcamento_db::connect(&config.database)
        .await
        .expect("Failed to connect to database");

    println!("Seeding users...");
    let admin_id = seed_users(&db).await;

    let Some(admin_id) = admin_id else {
        eprintln!("Admin user missing, skipping categories and entries");
        return;
    };

    println!("Seeding categories...");
    let categories = seed_categories(&db, admin_id).await;

    println!("Seeding entries...");
    seed_entries(&db, admin_id, &categories).await;

    println!("Seeding complete!");
}

/// Creates the development users. Returns the admin's ID.
async fn seed_users(db: &DatabaseConnection) -> Option<i32> {
    let repo = UserRepository::new(db.clone());
    let mut admin_id = None;

    for (nome, email, senha, papel) in USERS {
        let existing = repo.find_by_email(email).await.ok().flatten();
        let id = if let Some(user) = existing {
            println!("  {email} already exists, skipping...");
            user.id_usuario
        } else {
            let input = CreateUserInput {
                nome: nome.to_string(),
                email: email.to_string(),
                senha_hash: hash_password(senha).expect("Failed to hash password"),
                papel,
            };
            match repo.create(None, input).await {
                Ok(user) => {
                    println!("  Created {papel} user: {email} / {senha}");
                    user.id_usuario
                }
                Err(e) => {
                    eprintln!("Failed to insert user {email}: {e}");
                    continue;
                }
            }
        };

        if papel == Role::Admin {
            admin_id = Some(id);
        }
    }

    admin_id
}

/// Creates the sample categories. Returns `(id, planned amount)` pairs.
async fn seed_categories(db: &DatabaseConnection, admin_id: i32) -> Vec<(i32, Decimal)> {
    let repo = CategoryRepository::new(db.clone());
    let mut seeded = Vec::new();

    for (categoria, uf, master, grupo, orcado) in CATEGORIES {
        let input = CategoryInput {
            categoria: categoria.to_string(),
            uf: Some(uf.to_string()),
            master: Some(master.to_string()),
            grupo: Some(grupo.to_string()),
            cod_class: None,
            classe_custo: None,
        };

        match repo.create(admin_id, input).await {
            Ok(cat) => {
                println!("  Created category: {categoria}");
                seeded.push((cat.id_categoria, Decimal::from(orcado)));
            }
            Err(CategoryError::Duplicate) => {
                println!("  {categoria} already exists, skipping...");
            }
            Err(e) => eprintln!("Failed to insert category {categoria}: {e}"),
        }
    }

    seeded
}

/// Creates draft entries from January to June of the current year.
async fn seed_entries(db: &DatabaseConnection, admin_id: i32, categories: &[(i32, Decimal)]) {
    let repo = BudgetEntryRepository::new(db.clone());
    let policy = EditPolicy::default();
    let today = Utc::now().date_naive();
    let actor = Actor {
        id: admin_id,
        role: Role::Admin,
    };

    let items: Vec<EntryInput> = categories
        .iter()
        .flat_map(|&(id_categoria, orcado)| {
            Month::ALL.into_iter().take(6).map(move |mes| EntryInput {
                id_categoria,
                mes,
                ano: today.year(),
                orcado: Some(orcado),
                realizado: None,
                status: None,
            })
        })
        .collect();

    if items.is_empty() {
        println!("  No new categories, skipping entries...");
        return;
    }

    match repo.batch_edit(actor, &items, &policy, today).await {
        Ok(result) => println!(
            "  {} created, {} updated, {} refused",
            result.created,
            result.updated,
            result.errors.len()
        ),
        Err(e) => eprintln!("Failed to insert entries: {e}"),
    }
}
