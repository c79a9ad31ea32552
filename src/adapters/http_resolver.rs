use crate::adapters::json_decimal;
use crate::domain::model::RoleId;
use crate::domain::ports::CommissionBracketResolver;
use crate::utils::error::{EngineError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// 透過 HTTP 查詢佣金級距。
///
/// `GET {endpoint}?margin=<pct>&role=<role>`：200 回傳
/// `{"commission_percent": n}`，404 代表查無級距。
#[derive(Debug, Clone)]
pub struct HttpBracketResolver {
    client: Client,
    endpoint: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpBracketResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl CommissionBracketResolver for HttpBracketResolver {
    async fn resolve(&self, margin_percent: Decimal, role_id: &RoleId) -> Result<Option<Decimal>> {
        let margin = margin_percent.round_dp(4).normalize().to_string();

        // 構建請求
        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[("margin", margin.as_str()), ("role", role_id.as_str())]);

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("📡 Bracket lookup: margin={} role={}", margin, role_id);
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(EngineError::ResolverError {
                message: format!("bracket service responded with status: {}", status),
            });
        }

        let body: serde_json::Value = response.json().await?;
        match body.get("commission_percent") {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => json_decimal(value).map(Some).ok_or_else(|| {
                EngineError::ResolverError {
                    message: format!("unreadable commission_percent: {}", value),
                }
            }),
        }
    }
}
