use crate::adapters::openai::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::domain::model::Stage;
use crate::domain::ports::{ConfigProvider, StageSettings};
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8888";

/// HTTP 服務的設定，全部來自環境變數
#[derive(Clone)]
pub struct ServerConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub bind_address: String,
    pub request_timeout_seconds: Option<u64>,
    pub json_mode: bool,
    pub log_json: bool,
    pub monitor: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 以任意查詢函式取值，測試時不必修改行程環境
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let request_timeout_seconds = match get("REQUEST_TIMEOUT_SECONDS") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                ReportError::InvalidConfigValueError {
                    field: "REQUEST_TIMEOUT_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        Ok(Self {
            api_base: get("OPENAI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key: get("OPENAI_API_KEY"),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            request_timeout_seconds,
            json_mode: get("OPENAI_JSON_MODE").is_some_and(|v| is_truthy(&v)),
            log_json: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
            monitor: get("REPORT_MONITOR").is_some_and(|v| is_truthy(&v)),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("bind_address", &self.bind_address)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("json_mode", &self.json_mode)
            .field("log_json", &self.log_json)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl ConfigProvider for ServerConfig {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_seconds.map(Duration::from_secs)
    }

    fn json_mode(&self) -> bool {
        self.json_mode
    }

    fn stage_settings(&self, stage: Stage) -> StageSettings {
        StageSettings::defaults_for(stage)
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| ReportError::InvalidConfigValueError {
                field: "BIND_ADDRESS".to_string(),
                value: self.bind_address.clone(),
                reason: e.to_string(),
            })?;
        validation::validate_provider(self)
    }
}
