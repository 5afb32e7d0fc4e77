use crate::adapters::openai::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::domain::model::Stage;
use crate::domain::ports::{ConfigProvider, StageSettings};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::time::Duration;

#[derive(Clone, Parser)]
#[command(name = "marketing-audit")]
#[command(about = "Generate a marketing strategy report (JSON + PDF) from a form")]
pub struct CliConfig {
    #[arg(long, help = "Path to the marketing form JSON file")]
    pub form: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    // 指定時由設定檔提供連線參數
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, help = "Per-request timeout for the completion service")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Ask the service for a JSON object response")]
    pub json_mode: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log per-stage timings and memory usage")]
    pub monitor: bool,
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("form", &self.form)
            .field("output_path", &self.output_path)
            .field("config", &self.config)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("json_mode", &self.json_mode)
            .finish()
    }
}

impl ConfigProvider for CliConfig {
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
        self.timeout_seconds.map(Duration::from_secs)
    }

    fn json_mode(&self) -> bool {
        self.json_mode
    }

    fn stage_settings(&self, stage: Stage) -> StageSettings {
        StageSettings::defaults_for(stage)
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("form", &self.form)?;
        validation::validate_path("output_path", &self.output_path)?;
        if let Some(config) = &self.config {
            validation::validate_path("config", config)?;
            // 連線參數由設定檔提供
            return Ok(());
        }
        validation::validate_provider(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["marketing-audit"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--form", "form.json", "--api-key", "sk-test"]);
        assert_eq!(config.output_path, "./output");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(
            config.stage_settings(Stage::StrategyDevelopment).max_tokens,
            2500
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_and_json_mode() {
        let config = parse(&[
            "--form",
            "form.json",
            "--api-key",
            "sk-test",
            "--api-base",
            "http://localhost:9000/v1",
            "--timeout-seconds",
            "30",
            "--json-mode",
        ]);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(config.json_mode());
        assert_eq!(config.api_base(), "http://localhost:9000/v1");
    }

    #[test]
    fn test_invalid_api_base_is_rejected() {
        let config = parse(&[
            "--form",
            "form.json",
            "--api-key",
            "sk-test",
            "--api-base",
            "not a url",
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_output_hides_api_key() {
        let config = parse(&["--form", "form.json", "--api-key", "sk-secret"]);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
