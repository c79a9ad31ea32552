use crate::core::money;
use crate::domain::model::{CommissionSource, RoleId};
use crate::domain::ports::CommissionBracketResolver;
use rust_decimal::Decimal;
use std::time::Duration;

/// 佣金與毛利率互相依賴，最多迭代的次數
pub const MAX_ITERATIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverInput {
    pub revenue: Decimal,
    /// 除佣金以外的所有成本（成本明細 + 附加費用）
    pub costs_excluding_commission: Decimal,
    pub role_id: Option<RoleId>,
    pub manual_commission_percent: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverOutcome {
    pub commission_percent: Decimal,
    pub commission_amount: Decimal,
    pub total_cost: Decimal,
    pub net_margin_percent: Decimal,
    pub source: CommissionSource,
    pub converged: bool,
    pub iterations: u32,
    /// 任一次查詢發生錯誤或逾時
    pub resolver_degraded: bool,
}

enum Lookup {
    Found(Decimal),
    NotFound,
    Failed,
}

/// 毛利率 ⇄ 佣金百分比的不動點求解器
pub struct ProfitabilitySolver<R: CommissionBracketResolver> {
    resolver: R,
    resolve_timeout: Option<Duration>,
}

impl<R: CommissionBracketResolver> ProfitabilitySolver<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            resolve_timeout: None,
        }
    }

    /// Calls that exceed `timeout` degrade to zero like a missing bracket.
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub async fn solve(&self, input: &SolverInput) -> SolverOutcome {
        let revenue = input.revenue;
        let base_costs = input.costs_excluding_commission;

        if let Some(manual) = input.manual_commission_percent.filter(|p| *p > Decimal::ZERO) {
            tracing::debug!("Manual commission override active: {}%", manual);
            return Self::settle(revenue, base_costs, manual, CommissionSource::Manual, true, 0, false);
        }

        let Some(role_id) = input.role_id.as_ref() else {
            tracing::debug!("No sales role assigned, commission is zero");
            return Self::settle(
                revenue,
                base_costs,
                Decimal::ZERO,
                CommissionSource::Automatic,
                true,
                0,
                false,
            );
        };

        let mut previous = Decimal::NEGATIVE_ONE;
        let mut current = Decimal::ZERO;
        let mut iteration = 0u32;
        let mut degraded = false;

        while current != previous && iteration < MAX_ITERATIONS {
            iteration += 1;
            previous = current;

            let commission_amount = money::percent_of(revenue, previous);
            let total_costs = money::add(base_costs, commission_amount);
            let margin = money::margin_percent(revenue, total_costs);

            current = match self.lookup(margin, role_id).await {
                Lookup::Found(percent) => money::non_negative(percent),
                Lookup::NotFound => Decimal::ZERO,
                Lookup::Failed => {
                    degraded = true;
                    Decimal::ZERO
                }
            };

            tracing::debug!(
                "🔁 Pass {}: commission {}% -> margin {}% -> bracket {}%",
                iteration,
                previous,
                margin.round_dp(4),
                current
            );
        }

        let converged = current == previous;
        if !converged {
            tracing::warn!(
                "⚠️ Commission did not stabilize after {} passes for role {} (last {}%, previous {}%), using last value",
                MAX_ITERATIONS,
                role_id,
                current,
                previous
            );
        }

        Self::settle(
            revenue,
            base_costs,
            current,
            CommissionSource::Automatic,
            converged,
            iteration,
            degraded,
        )
    }

    async fn lookup(&self, margin: Decimal, role_id: &RoleId) -> Lookup {
        let call = self.resolver.resolve(margin, role_id);

        let result = match self.resolve_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        "⏱️ Bracket lookup timed out after {:?} (margin {}%, role {}), using 0%",
                        limit,
                        margin.round_dp(4),
                        role_id
                    );
                    return Lookup::Failed;
                }
            },
            None => call.await,
        };

        match result {
            Ok(Some(percent)) => Lookup::Found(percent),
            Ok(None) => {
                tracing::debug!(
                    "No commission bracket for margin {}% and role {}",
                    margin.round_dp(4),
                    role_id
                );
                Lookup::NotFound
            }
            Err(e) => {
                tracing::warn!("⚠️ Bracket lookup failed: {}, using 0%", e);
                Lookup::Failed
            }
        }
    }

    fn settle(
        revenue: Decimal,
        base_costs: Decimal,
        commission_percent: Decimal,
        source: CommissionSource,
        converged: bool,
        iterations: u32,
        resolver_degraded: bool,
    ) -> SolverOutcome {
        let commission_amount = money::percent_of(revenue, commission_percent);
        let total_cost = money::add(base_costs, commission_amount);

        SolverOutcome {
            commission_percent,
            commission_amount,
            total_cost,
            net_margin_percent: money::margin_percent(revenue, total_cost),
            source,
            converged,
            iterations,
            resolver_degraded,
        }
    }
}
