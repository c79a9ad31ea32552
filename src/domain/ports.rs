use crate::domain::model::{RoleId, SettingKey};
use crate::utils::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// 依毛利率與角色查詢佣金級距。
/// `Ok(None)` 代表查無級距，這是正常結果而非錯誤。
#[async_trait]
pub trait CommissionBracketResolver: Send + Sync {
    async fn resolve(&self, margin_percent: Decimal, role_id: &RoleId) -> Result<Option<Decimal>>;
}

/// 全域設定來源，每個 key 都可能不存在
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn get(&self, key: SettingKey) -> Result<Option<Decimal>>;
}

#[async_trait]
impl<T: CommissionBracketResolver + ?Sized> CommissionBracketResolver for Box<T> {
    async fn resolve(&self, margin_percent: Decimal, role_id: &RoleId) -> Result<Option<Decimal>> {
        (**self).resolve(margin_percent, role_id).await
    }
}

#[async_trait]
impl<T: CommissionBracketResolver + ?Sized> CommissionBracketResolver for Arc<T> {
    async fn resolve(&self, margin_percent: Decimal, role_id: &RoleId) -> Result<Option<Decimal>> {
        (**self).resolve(margin_percent, role_id).await
    }
}

#[async_trait]
impl<T: SettingsSource + ?Sized> SettingsSource for Box<T> {
    async fn get(&self, key: SettingKey) -> Result<Option<Decimal>> {
        (**self).get(key).await
    }
}
