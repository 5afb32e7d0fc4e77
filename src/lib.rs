pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{env::ServerConfig, toml_config::TomlConfig};

pub use adapters::{openai::OpenAiClient, pdf::PdfRenderer, storage::LocalStorage};
pub use core::pipeline::{PipelineRun, PipelineSettings, PipelineState, ReportPipeline};
pub use domain::model::{GeneratedReport, MarketingForm, ReportResponse};
pub use utils::error::{ReportError, Result};
