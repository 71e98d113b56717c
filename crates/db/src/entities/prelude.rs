//! `SeaORM` entity prelude.

pub use super::categorias::Entity as Categorias;
pub use super::logs::Entity as Logs;
pub use super::orcamentos::Entity as Orcamentos;
pub use super::resumo_orcamento::Entity as ResumoOrcamento;
pub use super::token_blacklist::Entity as TokenBlacklist;
pub use super::usuarios::Entity as Usuarios;
