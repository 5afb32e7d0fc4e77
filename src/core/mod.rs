pub mod form;
pub mod layout;
pub mod metrics;
pub mod pipeline;
pub mod prompts;
pub mod schema;

pub use crate::domain::model::{FormattedReport, GeneratedReport, MarketingForm, Stage};
pub use crate::domain::ports::{CompletionClient, ConfigProvider, DocumentRenderer};
pub use crate::utils::error::Result;
