use crate::domain::model::{FormattedReport, RenderedDocument, Stage};
use crate::utils::error::{CompletionError, RenderError};
use async_trait::async_trait;
use std::time::Duration;

/// 單次文字生成請求
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 每個階段的取樣參數
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl StageSettings {
    pub fn defaults_for(stage: Stage) -> Self {
        let max_tokens = match stage {
            Stage::BusinessAnalysis => 2000,
            Stage::StrategyDevelopment => 2500,
            Stage::ReportFormatting => 3000,
        };
        Self {
            temperature: 0.7,
            max_tokens,
        }
    }
}

/// 文字生成服務。一次呼叫 = 一次網路請求，不重試
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

pub trait DocumentRenderer: Send + Sync {
    fn render(&self, report: &FormattedReport) -> Result<RenderedDocument, RenderError>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn request_timeout(&self) -> Option<Duration>;
    fn json_mode(&self) -> bool;
    fn stage_settings(&self, stage: Stage) -> StageSettings;
}
