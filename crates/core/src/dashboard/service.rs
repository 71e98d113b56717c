//! Dashboard aggregations over summary rows.

use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeMap, HashMap};

use crate::budget::{BudgetStatus, Month};

use super::types::{
    CategoryTotals, CriticalGroup, CriticalMonth, DashboardData, DashboardTotals,
    DistributionKind, DistributionSlice, Kpis, MonthlyPoint, SummaryRow, Variation, YearComparison,
    YearTotals,
};

/// Default number of critical groups.
pub const CRITICAL_GROUPS: usize = 5;

const NO_GROUP: &str = "Sem grupo";
const NO_COST_CENTER: &str = "Sem centro de custo";

/// Stateless dashboard calculations.
pub struct DashboardService;

impl DashboardService {
    /// Builds the main dashboard payload.
    #[must_use]
    pub fn build(rows: &[SummaryRow]) -> DashboardData {
        let dados_mensais = Self::monthly(rows);
        DashboardData {
            totais: Self::totals(rows),
            mes_critico: Self::critical_month(&dados_mensais),
            dados_mensais,
            grupos_criticos: Self::critical_groups(rows, CRITICAL_GROUPS),
            centros_custo: Self::by_category(rows),
        }
    }

    /// Sums all rows.
    #[must_use]
    pub fn totals(rows: &[SummaryRow]) -> DashboardTotals {
        let (orcado, realizado, dif) = rows.iter().fold(
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            |(o, r, d), row| (o + row.total_orcado, r + row.total_realizado, d + row.total_dif),
        );
        DashboardTotals {
            total_orcado: orcado,
            total_realizado: realizado,
            total_dif: dif,
            percentual_execucao: percent(realizado, orcado),
        }
    }

    /// Twelve monthly points, January first, months without rows zeroed.
    #[must_use]
    pub fn monthly(rows: &[SummaryRow]) -> Vec<MonthlyPoint> {
        let mut points: Vec<MonthlyPoint> = Month::ALL
            .into_iter()
            .map(|mes| MonthlyPoint {
                mes,
                orcado: Decimal::ZERO,
                realizado: Decimal::ZERO,
                dif: Decimal::ZERO,
            })
            .collect();

        for row in rows {
            let point = &mut points[(row.mes.number() - 1) as usize];
            point.orcado += row.total_orcado;
            point.realizado += row.total_realizado;
            point.dif += row.total_dif;
        }
        points
    }

    /// Month with the largest absolute deviation, `None` when every month is zero.
    ///
    /// Ties go to the earlier month.
    #[must_use]
    pub fn critical_month(points: &[MonthlyPoint]) -> Option<CriticalMonth> {
        points
            .iter()
            .filter(|p| !p.dif.is_zero())
            .fold(None::<&MonthlyPoint>, |best, p| match best {
                Some(b) if b.dif.abs() >= p.dif.abs() => Some(b),
                _ => Some(p),
            })
            .map(|p| CriticalMonth {
                mes: p.mes,
                desvio: p.dif,
            })
    }

    /// The `n` groups with the largest absolute deviation.
    #[must_use]
    pub fn critical_groups(rows: &[SummaryRow], n: usize) -> Vec<CriticalGroup> {
        let mut sums: HashMap<&str, Decimal> = HashMap::new();
        for row in rows {
            let grupo = row.grupo.as_deref().filter(|g| !g.is_empty()).unwrap_or(NO_GROUP);
            *sums.entry(grupo).or_default() += row.total_dif;
        }

        let mut groups: Vec<CriticalGroup> = sums
            .into_iter()
            .map(|(grupo, desvio)| CriticalGroup {
                grupo: grupo.to_string(),
                desvio,
            })
            .collect();
        groups.sort_by(|a, b| {
            b.desvio
                .abs()
                .cmp(&a.desvio.abs())
                .then_with(|| a.grupo.cmp(&b.grupo))
        });
        groups.truncate(n);
        groups
    }

    /// Per-category sums, ordered by category name.
    #[must_use]
    pub fn by_category(rows: &[SummaryRow]) -> Vec<CategoryTotals> {
        let mut sums: BTreeMap<&str, (Decimal, Decimal, Decimal)> = BTreeMap::new();
        for row in rows {
            let entry = sums.entry(row.categoria.as_str()).or_default();
            entry.0 += row.total_orcado;
            entry.1 += row.total_realizado;
            entry.2 += row.total_dif;
        }
        sums.into_iter()
            .map(|(categoria, (orcado, realizado, dif))| CategoryTotals {
                categoria: categoria.to_string(),
                orcado,
                realizado,
                dif,
            })
            .collect()
    }

    /// Share of the actual total per category or cost center, largest first.
    ///
    /// Keys with zero actual amount are left out. When every value is
    /// positive the percentages add up to exactly 100.
    #[must_use]
    pub fn distribution(rows: &[SummaryRow], kind: DistributionKind) -> Vec<DistributionSlice> {
        let mut sums: HashMap<&str, Decimal> = HashMap::new();
        for row in rows {
            let key = match kind {
                DistributionKind::Categoria => row.categoria.as_str(),
                DistributionKind::CentroCusto => row
                    .master
                    .as_deref()
                    .filter(|m| !m.is_empty())
                    .unwrap_or(NO_COST_CENTER),
            };
            *sums.entry(key).or_default() += row.total_realizado;
        }

        let mut slices: Vec<DistributionSlice> = sums
            .into_iter()
            .filter(|(_, v)| !v.is_zero())
            .map(|(nome, valor)| DistributionSlice {
                nome: nome.to_string(),
                valor,
                percentual: Decimal::ZERO,
            })
            .collect();
        slices.sort_by(|a, b| b.valor.cmp(&a.valor).then_with(|| a.nome.cmp(&b.nome)));

        assign_percentages(&mut slices);
        slices
    }

    /// Compares the totals of `ano` with those of `ano - 1`, saturating at `i32::MIN`.
    #[must_use]
    pub fn comparison(ano: i32, current: &[SummaryRow], previous: &[SummaryRow]) -> YearComparison {
        let year_totals = |ano: i32, rows: &[SummaryRow]| {
            let t = Self::totals(rows);
            YearTotals {
                ano,
                orcado: t.total_orcado,
                realizado: t.total_realizado,
                dif: t.total_dif,
            }
        };
        let atual = year_totals(ano, current);
        let anterior = year_totals(ano.saturating_sub(1), previous);

        YearComparison {
            variacao: Variation {
                orcado: variation(atual.orcado, anterior.orcado),
                realizado: variation(atual.realizado, anterior.realizado),
                dif: variation(atual.dif, anterior.dif),
            },
            ano_atual: atual,
            ano_anterior: anterior,
        }
    }

    /// Builds the headline counts from per-status entry counts.
    #[must_use]
    pub fn kpis(total_categorias: u64, status_counts: &[(BudgetStatus, u64)]) -> Kpis {
        let mut kpis = Kpis {
            total_categorias,
            ..Kpis::default()
        };
        for &(status, count) in status_counts {
            kpis.total_orcamentos += count;
            match status {
                BudgetStatus::Rascunho => kpis.rascunhos += count,
                BudgetStatus::AguardandoAprovacao => kpis.aguardando_aprovacao += count,
                BudgetStatus::Aprovado => kpis.aprovados += count,
                BudgetStatus::Reprovado => kpis.reprovados += count,
            }
        }
        kpis
    }
}

/// `part / whole * 100` rounded to two places, 0 when `whole` is zero.
#[must_use]
pub fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Percent change from `previous` to `current`, 0 when `previous` is zero.
#[must_use]
pub fn variation(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    ((current - previous) / previous.abs() * Decimal::ONE_HUNDRED).round_dp(2)
}

// Largest remainder: truncate to cents, then hand the missing cents to the
// slices that lost the most.
fn assign_percentages(slices: &mut [DistributionSlice]) {
    let total: Decimal = slices.iter().map(|s| s.valor).sum();
    if total.is_zero() {
        return;
    }

    if slices.iter().any(|s| s.valor.is_sign_negative()) {
        for slice in slices.iter_mut() {
            slice.percentual = percent(slice.valor, total);
        }
        return;
    }

    let cent = Decimal::new(1, 2);
    let mut remainders: Vec<(usize, Decimal)> = Vec::with_capacity(slices.len());
    for (i, slice) in slices.iter_mut().enumerate() {
        let raw = slice.valor / total * Decimal::ONE_HUNDRED;
        let truncated = raw.round_dp_with_strategy(2, RoundingStrategy::ToZero);
        slice.percentual = truncated;
        remainders.push((i, raw - truncated));
    }

    let assigned: Decimal = slices.iter().map(|s| s.percentual).sum();
    let mut missing = Decimal::ONE_HUNDRED - assigned;
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (i, _) in remainders {
        if missing < cent {
            break;
        }
        slices[i].percentual += cent;
        missing -= cent;
    }
}
