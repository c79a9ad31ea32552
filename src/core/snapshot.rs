use crate::core::ledger::CostLedger;
use crate::core::money;
use crate::core::solver::{ProfitabilitySolver, SolverInput};
use crate::core::surcharge::SurchargeCalculator;
use crate::domain::model::{
    CourseLine, FinancialSnapshot, LedgerAggregates, RoleId, SurchargeRates,
};
use crate::domain::ports::CommissionBracketResolver;
use rust_decimal::Decimal;

/// 影響快照的全部輸入。兩組輸入相等時，重新計算必得相同結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInputs {
    pub revenue: Decimal,
    pub aggregates: LedgerAggregates,
    pub rates: SurchargeRates,
    pub role_id: Option<RoleId>,
    pub manual_commission_percent: Option<Decimal>,
}

impl SnapshotInputs {
    pub fn new(
        ledger: &CostLedger,
        rates: &SurchargeRates,
        revenue: Decimal,
        role_id: Option<&RoleId>,
        manual_commission_percent: Option<Decimal>,
    ) -> Self {
        Self {
            revenue,
            aggregates: ledger.aggregates(),
            rates: rates.clone(),
            role_id: role_id.cloned(),
            manual_commission_percent,
        }
    }
}

/// Σ quantity × unit_price over the project's course lines.
pub fn revenue_from_courses(courses: &[CourseLine]) -> Decimal {
    courses.iter().fold(Decimal::ZERO, |acc, line| {
        let subtotal = line
            .unit_price
            .checked_mul(Decimal::from(line.quantity))
            .unwrap_or(Decimal::ZERO);
        money::add(acc, money::non_negative(subtotal))
    })
}

pub struct FinancialSnapshotAssembler<R: CommissionBracketResolver> {
    solver: ProfitabilitySolver<R>,
}

impl<R: CommissionBracketResolver> FinancialSnapshotAssembler<R> {
    pub fn new(solver: ProfitabilitySolver<R>) -> Self {
        Self { solver }
    }

    pub async fn compute_snapshot(
        &self,
        ledger: &CostLedger,
        rates: &SurchargeRates,
        revenue: Decimal,
        role_id: Option<&RoleId>,
        manual_commission_percent: Option<Decimal>,
    ) -> FinancialSnapshot {
        let inputs = SnapshotInputs::new(ledger, rates, revenue, role_id, manual_commission_percent);
        self.assemble(&inputs).await
    }

    pub async fn assemble(&self, inputs: &SnapshotInputs) -> FinancialSnapshot {
        let aggregates = &inputs.aggregates;
        let surcharges = SurchargeCalculator::compute(inputs.revenue, aggregates, &inputs.rates);
        let costs_excluding_commission = money::add(aggregates.total(), surcharges.total());

        let outcome = self
            .solver
            .solve(&SolverInput {
                revenue: inputs.revenue,
                costs_excluding_commission,
                role_id: inputs.role_id.clone(),
                manual_commission_percent: inputs.manual_commission_percent,
            })
            .await;

        let snapshot = FinancialSnapshot {
            revenue: inputs.revenue,
            cost_subtotal_taxed: aggregates.taxed_base,
            cost_subtotal_withholding: aggregates.withholding_base,
            cost_subtotal_net: aggregates.net_base,
            vat_amount: surcharges.vat_amount,
            withholding_amount: surcharges.withholding_amount,
            ppm_amount: surcharges.ppm_amount,
            admin_expense_amount: surcharges.admin_expense_amount,
            cash_reserve_amount: surcharges.cash_reserve_amount,
            costs_excluding_commission,
            commission_percent: outcome.commission_percent,
            commission_amount: outcome.commission_amount,
            commission_source: outcome.source,
            total_cost: outcome.total_cost,
            net_profit: money::sub(inputs.revenue, outcome.total_cost),
            net_margin_percent: outcome.net_margin_percent,
            converged: outcome.converged,
            iterations: outcome.iterations,
            defaulted_settings: inputs.rates.defaulted.clone(),
            resolver_degraded: outcome.resolver_degraded,
        };

        tracing::debug!(
            "Snapshot: revenue={} total_cost={} commission={}% margin={}% converged={} passes={}",
            snapshot.revenue,
            snapshot.total_cost,
            snapshot.commission_percent,
            snapshot.net_margin_percent.round_dp(2),
            snapshot.converged,
            snapshot.iterations
        );

        snapshot
    }
}
