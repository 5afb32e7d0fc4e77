use crate::domain::model::Stage;
use thiserror::Error;

/// 文字生成服務呼叫失敗
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("request to completion service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("completion service returned an unreadable body: {message}")]
    MalformedResponse { message: String },

    #[error("completion contained no content")]
    EmptyCompletion,
}

/// 模型輸出不符合階段 schema
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("missing required field `{path}`")]
    MissingField { path: String },

    #[error("field `{path}` should be {expected}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("response could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
}

impl SchemaError {
    /// 出錯欄位的路徑 (若可得)
    pub fn field(&self) -> Option<&str> {
        match self {
            SchemaError::MissingField { path } | SchemaError::WrongType { path, .. } => {
                Some(path.as_str())
            }
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("font could not be loaded: {0}")]
    Font(String),

    #[error("PDF backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Stage {} ({stage}) failed: {source}", .stage.number())]
    Completion {
        stage: Stage,
        #[source]
        source: CompletionError,
    },

    #[error("Stage {} ({stage}) returned invalid output: {source}", .stage.number())]
    Validation {
        stage: Stage,
        #[source]
        source: SchemaError,
    },

    #[error("Document rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Completion,
    Validation,
    Rendering,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    /// 失敗的階段；渲染、設定等錯誤不屬於任何階段
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ReportError::Completion { stage, .. } | ReportError::Validation { stage, .. } => {
                Some(*stage)
            }
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::InvalidRequest { .. } => ErrorCategory::Request,
            ReportError::Completion { .. } => ErrorCategory::Completion,
            ReportError::Validation { .. } => ErrorCategory::Validation,
            ReportError::Render(_) => ErrorCategory::Rendering,
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ReportError::IoError(_) | ReportError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Request => ErrorSeverity::Low,
            ErrorCategory::Completion => ErrorSeverity::Medium,
            ErrorCategory::Validation | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Rendering | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息，不含內部細節
    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::InvalidRequest { message } => format!("The submitted form is invalid: {}", message),
            ReportError::Completion { stage, .. } => {
                format!("The AI service could not complete the {} step.", stage)
            }
            ReportError::Validation { stage, source } => match source.field() {
                Some(field) => format!(
                    "The AI service returned an unusable {} result (problem with `{}`).",
                    stage, field
                ),
                None => format!("The AI service returned an unusable {} result.", stage),
            },
            ReportError::Render(_) => "The report could not be converted to PDF.".to_string(),
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => format!("Configuration problem: {}", self),
            ReportError::IoError(_) | ReportError::SerializationError(_) => {
                format!("Internal error: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => "Fill in every required form field and submit a JSON object",
            ErrorCategory::Completion => {
                "Check the API key, network access and rate limits, then submit the form again"
            }
            ErrorCategory::Validation => {
                "The model produced malformed JSON; submitting again usually succeeds"
            }
            ErrorCategory::Rendering => "This is a rendering bug; report it with the logged report JSON",
            ErrorCategory::Configuration => "Check the configuration file and environment variables",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_carry_stage() {
        let err = ReportError::Completion {
            stage: Stage::StrategyDevelopment,
            source: CompletionError::EmptyCompletion,
        };
        assert_eq!(err.stage(), Some(Stage::StrategyDevelopment));
        assert_eq!(err.category(), ErrorCategory::Completion);
        assert!(err.to_string().contains("Stage 2 (strategy development)"));
    }

    #[test]
    fn test_render_error_is_distinct_from_stage_errors() {
        let err: ReportError = RenderError::Backend("boom".to_string()).into();
        assert_eq!(err.stage(), None);
        assert_eq!(err.category(), ErrorCategory::Rendering);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_validation_message_names_field() {
        let err = ReportError::Validation {
            stage: Stage::BusinessAnalysis,
            source: SchemaError::MissingField {
                path: "market_position.market_tier".to_string(),
            },
        };
        assert!(err.to_string().contains("market_position.market_tier"));
        assert!(err.user_friendly_message().contains("market_position.market_tier"));
    }
}
