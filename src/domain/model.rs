use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 三個 LLM 階段，依序執行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    BusinessAnalysis,
    StrategyDevelopment,
    ReportFormatting,
}

impl Stage {
    pub const ALL: [Stage; 3] = [
        Stage::BusinessAnalysis,
        Stage::StrategyDevelopment,
        Stage::ReportFormatting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::BusinessAnalysis => "business analysis",
            Stage::StrategyDevelopment => "strategy development",
            Stage::ReportFormatting => "report formatting",
        }
    }

    /// 設定檔中使用的鍵名
    pub fn key(&self) -> &'static str {
        match self {
            Stage::BusinessAnalysis => "business_analysis",
            Stage::StrategyDevelopment => "strategy_development",
            Stage::ReportFormatting => "report_formatting",
        }
    }

    /// 1-based 序號，用於日誌
    pub fn number(&self) -> usize {
        match self {
            Stage::BusinessAnalysis => 1,
            Stage::StrategyDevelopment => 2,
            Stage::ReportFormatting => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const COMPANY_TYPES: &[&str] = &["B2B", "B2C", "D2C", "SaaS", "Service-based", "E-commerce"];
pub const CUSTOMER_SIZES: &[&str] = &["Small Business", "Mid-Market", "Enterprise"];
pub const INDUSTRIES: &[&str] = &[
    "Technology",
    "Healthcare",
    "Finance",
    "Manufacturing",
    "Retail",
    "Education",
    "Professional Services",
    "Real Estate",
    "Entertainment",
    "Transportation",
];
pub const TIMELINES: &[&str] = &["3 months", "6 months", "12 months"];
pub const MAIN_GOALS: &[&str] = &["Awareness", "Conversion", "Retention"];

/// 主要目標對應的子目標選項
pub fn sub_goals(main_goal: &str) -> &'static [&'static str] {
    match main_goal {
        "Awareness" => &["Brand Recognition", "Market Presence", "Thought Leadership"],
        "Conversion" => &["Lead Generation", "Sales Increase", "Customer Acquisition"],
        "Retention" => &["Customer Loyalty", "Repeat Business", "Referral Growth"],
        _ => &[],
    }
}

/// 前端表單提交的商業資料
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketingForm {
    pub company_type: String,
    pub industry: String,
    pub annual_revenue: String,
    pub avg_deal_size: String,
    pub target_customer: String,
    pub customer_size: String,
    pub customer_industry: String,
    pub marketing_budget: String,
    pub timeline: String,
    pub main_goal: String,
    pub sub_goal: String,
}

// ---- Stage 1 ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessAnalysis {
    pub market_position: MarketPosition,
    pub business_model: BusinessModel,
    pub competitive_analysis: CompetitiveAnalysis,
    pub growth_assessment: GrowthAssessment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketPosition {
    pub industry_standing: String,
    pub market_tier: String,
    pub penetration_rate: String,
    pub key_differentiators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessModel {
    pub sales_cycle_length: String,
    pub revenue_patterns: Vec<String>,
    pub acquisition_channels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveAnalysis {
    pub main_competitors: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub market_gaps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthAssessment {
    pub tam_size: String,
    pub expansion_opportunities: Vec<String>,
    pub scaling_factors: Vec<String>,
}

// ---- Stage 2 ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingStrategy {
    pub strategic_objectives: Vec<StrategicObjective>,
    pub budget_allocation: Vec<BudgetAllocation>,
    pub channel_strategy: Vec<ChannelStrategy>,
    pub action_items: Vec<ActionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicObjective {
    pub objective: String,
    pub kpis: Vec<String>,
    pub target_milestones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub channel: String,
    pub allocation: String,
    pub expected_roi: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStrategy {
    pub channel: String,
    pub content_types: Vec<String>,
    pub metrics: Vec<String>,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub title: String,
    pub description: String,
    pub timeline: String,
    pub resources_needed: Vec<String>,
    pub expected_outcome: String,
    pub budget: String,
    pub priority_level: String,
}

// ---- Stage 3 ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedReport {
    pub sections: Vec<ReportSection>,
    pub styling: ReportStyling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub title: String,
    pub content: String,
    pub visualizations: Vec<String>,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStyling {
    pub fonts: Vec<String>,
    pub colors: Vec<String>,
    pub layouts: Vec<String>,
}

/// 渲染後每個章節的摘要，保留圖表與表格的引用給下游使用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionOutline {
    pub title: String,
    pub first_page: usize,
    pub visualizations: Vec<String>,
    pub tables: Vec<String>,
}

/// 渲染結果
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub sections: Vec<SectionOutline>,
}

/// Pipeline 完整輸出
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub business_analysis: BusinessAnalysis,
    pub strategy: MarketingStrategy,
    pub report: FormattedReport,
    pub document: RenderedDocument,
}

/// HTTP 回應本體，欄位名稱與前端約定一致
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub business_analysis: BusinessAnalysis,
    pub strategy: MarketingStrategy,
    pub report: FormattedReport,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pdf: Option<String>,
}

impl ReportResponse {
    /// 不含 PDF 的版本，CLI 另外寫出 PDF 檔
    pub fn without_document(report: &GeneratedReport) -> Self {
        Self {
            business_analysis: report.business_analysis.clone(),
            strategy: report.strategy.clone(),
            report: report.report.clone(),
            pdf: None,
        }
    }
}

impl From<&GeneratedReport> for ReportResponse {
    fn from(report: &GeneratedReport) -> Self {
        Self {
            pdf: Some(base64::engine::general_purpose::STANDARD.encode(&report.document.bytes)),
            ..Self::without_document(report)
        }
    }
}
