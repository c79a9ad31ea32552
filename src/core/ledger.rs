use crate::core::money;
use crate::domain::model::{CostCategory, CostLine, CostLineId, LedgerAggregates, UserRef};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// 專案成本明細。
///
/// 所有寫入都經過 [`CostLedger::add_or_update`]，確保同一筆成本不會同時
/// 適用增值稅與扣繳。
#[derive(Debug, Clone, Default)]
pub struct CostLedger {
    lines: Vec<CostLine>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lines(lines: impl IntoIterator<Item = CostLine>) -> Self {
        let mut ledger = Self::new();
        for line in lines {
            ledger.add_or_update(line);
        }
        ledger
    }

    /// 新增或更新成本項目。
    ///
    /// 旗標衝突時採「最後寫入者勝」：與既有項目相比剛被設為 true 的旗標
    /// 保留，另一個被清除。無法判斷先後時（新項目或兩者同時打開）扣繳優先。
    pub fn add_or_update(&mut self, mut line: CostLine) {
        if line.amount.is_sign_negative() {
            tracing::warn!(
                "Cost line {} ('{}') has negative amount {}, treating as 0",
                line.id,
                line.concept,
                line.amount
            );
            line.amount = money::non_negative(line.amount);
        }

        let position = self.lines.iter().position(|l| l.id == line.id);

        if line.applies_vat && line.applies_withholding {
            let vat_was_on = position
                .map(|i| self.lines[i].applies_vat)
                .unwrap_or(false);
            let withholding_was_on = position
                .map(|i| self.lines[i].applies_withholding)
                .unwrap_or(false);

            if withholding_was_on && !vat_was_on {
                line.applies_withholding = false;
            } else {
                line.applies_vat = false;
            }
        }

        match position {
            Some(i) => self.lines[i] = line,
            None => self.lines.push(line),
        }
    }

    pub fn remove(&mut self, id: CostLineId) -> Option<CostLine> {
        let position = self.lines.iter().position(|l| l.id == id)?;
        Some(self.lines.remove(position))
    }

    pub fn get(&self, id: CostLineId) -> Option<&CostLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn lines(&self) -> &[CostLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn next_id(&self) -> CostLineId {
        self.lines.iter().map(|l| l.id).max().map_or(1, |max| max + 1)
    }

    /// Returns false when no line has this id.
    pub fn set_applies_vat(&mut self, id: CostLineId, applies: bool) -> bool {
        let Some(mut line) = self.get(id).cloned() else {
            return false;
        };
        line.applies_vat = applies;
        if applies {
            line.applies_withholding = false;
        }
        self.add_or_update(line);
        true
    }

    pub fn set_applies_withholding(&mut self, id: CostLineId, applies: bool) -> bool {
        let Some(mut line) = self.get(id).cloned() else {
            return false;
        };
        line.applies_withholding = applies;
        if applies {
            line.applies_vat = false;
        }
        self.add_or_update(line);
        true
    }

    pub fn set_amount(&mut self, id: CostLineId, amount: Decimal) -> bool {
        let Some(mut line) = self.get(id).cloned() else {
            return false;
        };
        line.amount = amount;
        self.add_or_update(line);
        true
    }

    pub fn approve(&mut self, id: CostLineId, user: UserRef, at: DateTime<Utc>) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.approved = true;
                line.approved_by = Some(user);
                line.approved_at = Some(at);
                true
            }
            None => false,
        }
    }

    pub fn revoke_approval(&mut self, id: CostLineId) -> bool {
        match self.lines.iter_mut().find(|l| l.id == id) {
            Some(line) => {
                line.approved = false;
                line.approved_by = None;
                line.approved_at = None;
                true
            }
            None => false,
        }
    }

    pub fn aggregates(&self) -> LedgerAggregates {
        self.lines
            .iter()
            .fold(LedgerAggregates::default(), |mut acc, line| {
                let amount = money::non_negative(line.amount);
                match line.category() {
                    CostCategory::Taxed => acc.taxed_base = money::add(acc.taxed_base, amount),
                    CostCategory::Withholding => {
                        acc.withholding_base = money::add(acc.withholding_base, amount)
                    }
                    CostCategory::Net => acc.net_base = money::add(acc.net_base, amount),
                }
                acc
            })
    }
}
