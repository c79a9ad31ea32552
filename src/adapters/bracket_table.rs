use crate::domain::model::{CommissionBracket, RoleId};
use crate::domain::ports::CommissionBracketResolver;
use crate::utils::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// In-memory bracket table. Ranges are inclusive on both ends and the first
/// matching row wins.
#[derive(Debug, Clone, Default)]
pub struct BracketTable {
    brackets: Vec<CommissionBracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<CommissionBracket>) -> Self {
        Self { brackets }
    }

    pub fn lookup(&self, margin_percent: Decimal, role_id: &RoleId) -> Option<Decimal> {
        self.brackets
            .iter()
            .find(|b| b.contains(margin_percent, role_id))
            .map(|b| b.commission_percent)
    }
}

#[async_trait]
impl CommissionBracketResolver for BracketTable {
    async fn resolve(&self, margin_percent: Decimal, role_id: &RoleId) -> Result<Option<Decimal>> {
        Ok(self.lookup(margin_percent, role_id))
    }
}
