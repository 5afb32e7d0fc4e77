use crate::adapters::openai::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::domain::model::Stage;
use crate::domain::ports::{ConfigProvider, StageSettings};
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub stages: HashMap<String, StageConfig>,
    pub output: Option<OutputConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub json_mode: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            model: default_model(),
            timeout_seconds: None,
            json_mode: false,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

/// `[stages.<key>]`，未填的值沿用該階段預設
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})；未設定的變數保留原字樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 設定檔未提供金鑰時使用命令列/環境變數的金鑰
    pub fn with_fallback_api_key(mut self, api_key: Option<String>) -> Self {
        if self.api_key().is_none() {
            self.completion.api_key = api_key;
        }
        self
    }

    pub fn output_path(&self) -> Option<&str> {
        self.output.as_ref().map(|o| o.path.as_str())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn validate_config(&self) -> Result<()> {
        let known: Vec<&str> = Stage::ALL.iter().map(|s| s.key()).collect();
        for key in self.stages.keys() {
            if !known.contains(&key.as_str()) {
                return Err(ReportError::InvalidConfigValueError {
                    field: "stages".to_string(),
                    value: key.clone(),
                    reason: format!("Unknown stage. Valid stages: {}", known.join(", ")),
                });
            }
        }

        if let Some(path) = self.output_path() {
            validation::validate_path("output.path", path)?;
        }

        validation::validate_provider(self)
    }
}

impl ConfigProvider for TomlConfig {
    fn api_base(&self) -> &str {
        &self.completion.api_base
    }

    fn api_key(&self) -> Option<&str> {
        // 未替換的 ${VAR} 視為未設定
        self.completion
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
    }

    fn model(&self) -> &str {
        &self.completion.model
    }

    fn request_timeout(&self) -> Option<Duration> {
        self.completion.timeout_seconds.map(Duration::from_secs)
    }

    fn json_mode(&self) -> bool {
        self.completion.json_mode
    }

    fn stage_settings(&self, stage: Stage) -> StageSettings {
        let defaults = StageSettings::defaults_for(stage);
        match self.stages.get(stage.key()) {
            Some(overrides) => StageSettings {
                temperature: overrides.temperature.unwrap_or(defaults.temperature),
                max_tokens: overrides.max_tokens.unwrap_or(defaults.max_tokens),
            },
            None => defaults,
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
