use crate::adapters::json_decimal;
use crate::domain::model::SettingKey;
use crate::domain::ports::SettingsSource;
use crate::utils::error::{EngineError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;

/// 設定值來自組態檔 `[settings.values]`
#[derive(Debug, Clone, Default)]
pub struct StaticSettings {
    values: HashMap<SettingKey, Decimal>,
}

impl StaticSettings {
    pub fn new(values: HashMap<SettingKey, Decimal>) -> Self {
        Self { values }
    }

    pub fn with(mut self, key: SettingKey, value: Decimal) -> Self {
        self.values.insert(key, value);
        self
    }
}

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn get(&self, key: SettingKey) -> Result<Option<Decimal>> {
        Ok(self.values.get(&key).copied())
    }
}

/// `GET {base_url}/{key}` returning `{"value": n}`; 404 means not configured.
#[derive(Debug, Clone)]
pub struct HttpSettingsSource {
    client: Client,
    base_url: String,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpSettingsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
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
impl SettingsSource for HttpSettingsSource {
    async fn get(&self, key: SettingKey) -> Result<Option<Decimal>> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), key.as_str());

        let mut request = self.client.get(&url);
        for (name, value) in &self.headers {
            request = request.header(name, value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 Setting {} -> {}", key, status);

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(EngineError::SettingsError {
                message: format!("{} responded with status: {}", url, status),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(body.get("value").and_then(json_decimal))
    }
}
