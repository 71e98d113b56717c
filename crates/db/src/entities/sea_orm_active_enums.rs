//! `SeaORM` active enums and their mapping to core types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use orcamento_core::auth::Role;
use orcamento_core::budget::{BudgetStatus as CoreStatus, Month};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "gestor")]
    Gestor,
    #[sea_orm(string_value = "visualizador")]
    Visualizador,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "budget_status")]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[sea_orm(string_value = "rascunho")]
    Rascunho,
    #[sea_orm(string_value = "aguardando_aprovacao")]
    AguardandoAprovacao,
    #[sea_orm(string_value = "aprovado")]
    Aprovado,
    #[sea_orm(string_value = "reprovado")]
    Reprovado,
}

/// Month stored by its Portuguese name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum MonthName {
    #[sea_orm(string_value = "Janeiro")]
    Janeiro,
    #[sea_orm(string_value = "Fevereiro")]
    Fevereiro,
    #[sea_orm(string_value = "Março")]
    Marco,
    #[sea_orm(string_value = "Abril")]
    Abril,
    #[sea_orm(string_value = "Maio")]
    Maio,
    #[sea_orm(string_value = "Junho")]
    Junho,
    #[sea_orm(string_value = "Julho")]
    Julho,
    #[sea_orm(string_value = "Agosto")]
    Agosto,
    #[sea_orm(string_value = "Setembro")]
    Setembro,
    #[sea_orm(string_value = "Outubro")]
    Outubro,
    #[sea_orm(string_value = "Novembro")]
    Novembro,
    #[sea_orm(string_value = "Dezembro")]
    Dezembro,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Gestor => Self::Gestor,
            UserRole::Visualizador => Self::Visualizador,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Gestor => Self::Gestor,
            Role::Visualizador => Self::Visualizador,
        }
    }
}

impl From<BudgetStatus> for CoreStatus {
    fn from(status: BudgetStatus) -> Self {
        match status {
            BudgetStatus::Rascunho => Self::Rascunho,
            BudgetStatus::AguardandoAprovacao => Self::AguardandoAprovacao,
            BudgetStatus::Aprovado => Self::Aprovado,
            BudgetStatus::Reprovado => Self::Reprovado,
        }
    }
}

impl From<CoreStatus> for BudgetStatus {
    fn from(status: CoreStatus) -> Self {
        match status {
            CoreStatus::Rascunho => Self::Rascunho,
            CoreStatus::AguardandoAprovacao => Self::AguardandoAprovacao,
            CoreStatus::Aprovado => Self::Aprovado,
            CoreStatus::Reprovado => Self::Reprovado,
        }
    }
}

impl From<MonthName> for Month {
    fn from(mes: MonthName) -> Self {
        match mes {
            MonthName::Janeiro => Self::Janeiro,
            MonthName::Fevereiro => Self::Fevereiro,
            MonthName::Marco => Self::Marco,
            MonthName::Abril => Self::Abril,
            MonthName::Maio => Self::Maio,
            MonthName::Junho => Self::Junho,
            MonthName::Julho => Self::Julho,
            MonthName::Agosto => Self::Agosto,
            MonthName::Setembro => Self::Setembro,
            MonthName::Outubro => Self::Outubro,
            MonthName::Novembro => Self::Novembro,
            MonthName::Dezembro => Self::Dezembro,
        }
    }
}

impl From<Month> for MonthName {
    fn from(mes: Month) -> Self {
        match mes {
            Month::Janeiro => Self::Janeiro,
            Month::Fevereiro => Self::Fevereiro,
            Month::Marco => Self::Marco,
            Month::Abril => Self::Abril,
            Month::Maio => Self::Maio,
            Month::Junho => Self::Junho,
            Month::Julho => Self::Julho,
            Month::Agosto => Self::Agosto,
            Month::Setembro => Self::Setembro,
            Month::Outubro => Self::Outubro,
            Month::Novembro => Self::Novembro,
            Month::Dezembro => Self::Dezembro,
        }
    }
}
