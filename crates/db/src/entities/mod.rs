//! `SeaORM` entity definitions.

pub mod prelude;

pub mod categorias;
pub mod logs;
pub mod orcamentos;
pub mod resumo_orcamento;
pub mod sea_orm_active_enums;
pub mod token_blacklist;
pub mod usuarios;
