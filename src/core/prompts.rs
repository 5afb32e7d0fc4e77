use crate::core::schema::{self, Shape};
use crate::domain::model::{BusinessAnalysis, MarketingForm, MarketingStrategy, Stage};
use serde::Serialize;

/// 送給模型的 system + user 訊息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn system_instruction(stage: Stage) -> &'static str {
    match stage {
        Stage::BusinessAnalysis => {
            "You are an expert business analyst specializing in marketing strategy."
        }
        Stage::StrategyDevelopment => {
            "You are an expert marketing strategist specializing in comprehensive marketing plans."
        }
        Stage::ReportFormatting => {
            "You are an expert report writer specializing in marketing strategy reports."
        }
    }
}

/// Stage 1：只用表單資料
pub fn business_analysis(form: &MarketingForm) -> Prompt {
    let user = format!(
        r#"You are an expert business analyst with extensive experience in market research and strategic planning. Analyze the following business profile with exceptional detail and strategic insight:

Company Type: {company_type}
Industry/Vertical: {industry}
Annual Revenue: {annual_revenue}
Average Deal Size: {avg_deal_size}
Target Customer Description: {target_customer}

Provide a comprehensive analysis following these exact steps:

1. Market Position Analysis:
   - Evaluate the company's position within their industry vertical
   - Identify the market tier (enterprise, mid-market, SMB) based on deal size
   - Assess market penetration potential based on revenue

2. Business Model Evaluation:
   - Analyze sales cycle based on deal size and industry
   - Identify revenue patterns and growth opportunities
   - Evaluate customer acquisition channels

3. Competitive Landscape:
   - Determine likely competitors based on industry and company size
   - Identify potential competitive advantages
   - Analyze market differentiation opportunities

4. Growth Potential:
   - Calculate total addressable market (TAM)
   - Identify expansion opportunities
   - Evaluate scaling potential

{format}"#,
        company_type = form.company_type,
        industry = form.industry,
        annual_revenue = form.annual_revenue,
        avg_deal_size = form.avg_deal_size,
        target_customer = form.target_customer,
        format = response_format(&schema::BUSINESS_ANALYSIS),
    );

    Prompt {
        system: system_instruction(Stage::BusinessAnalysis).to_string(),
        user,
    }
}

/// Stage 2：表單 + 已驗證的商業分析
pub fn strategy_development(form: &MarketingForm, analysis: &BusinessAnalysis) -> Prompt {
    let user = format!(
        r#"You are an expert marketing strategist responsible for developing comprehensive marketing plans. Using the business analysis provided and marketing parameters, create a detailed strategic marketing plan.

Business Analysis: {analysis}

Marketing Parameters:
Monthly Budget: {budget}
Timeline: {timeline}
Main Goal: {main_goal} ({sub_goal})
Target Customer Description: {target_customer}

Follow these steps to develop your marketing strategy:

1. Goal Analysis:
   - Break down the main goal into specific, measurable objectives
   - Establish KPIs for each objective
   - Set milestone targets aligned with the timeline

2. Budget Allocation:
   - Divide budget across different marketing channels
   - Prioritize high-impact activities
   - Include contingency allocation

3. Channel Strategy:
   - Identify primary and secondary marketing channels
   - Specify content types for each channel
   - Define channel-specific success metrics

4. Action Plan Development:
   - Create detailed implementation steps
   - Establish timeline for each activity
   - Define resource requirements

{format}"#,
        analysis = pretty_json(analysis),
        budget = form.marketing_budget,
        timeline = form.timeline,
        main_goal = form.main_goal,
        sub_goal = form.sub_goal,
        target_customer = form.target_customer,
        format = response_format(&schema::MARKETING_STRATEGY),
    );

    Prompt {
        system: system_instruction(Stage::StrategyDevelopment).to_string(),
        user,
    }
}

/// Stage 3：表單 + 分析 + 策略
pub fn report_formatting(
    form: &MarketingForm,
    analysis: &BusinessAnalysis,
    strategy: &MarketingStrategy,
) -> Prompt {
    let user = format!(
        r#"You are an expert report writer specializing in creating clear, actionable marketing plans. Transform the following strategic data into a comprehensive marketing report.

Business Analysis: {analysis}
Marketing Strategy: {strategy}
Client Parameters: {form}

Create a detailed report following this structure:

1. Executive Summary
2. Business Analysis
3. Marketing Strategy
4. Implementation Plan
5. ROI Projections

Each section needs a title, its body text, the identifiers of any charts ("visualizations") and tables it refers to, and the report needs styling hints (font families, hex colors, layout keywords) for the PDF version.

{format}"#,
        analysis = pretty_json(analysis),
        strategy = pretty_json(strategy),
        form = pretty_json(form),
        format = response_format(&schema::FORMATTED_REPORT),
    );

    Prompt {
        system: system_instruction(Stage::ReportFormatting).to_string(),
        user,
    }
}

fn response_format(shape: &Shape) -> String {
    format!(
        "Format your response as a single JSON object matching this schema exactly, with no commentary:\n{}",
        pretty_json(&schema::skeleton(shape))
    )
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    // 這些型別只有字串欄位，序列化不會失敗
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> MarketingForm {
        serde_json::from_str(include_str!("../../tests/fixtures/marketing_form.json")).unwrap()
    }

    fn analysis() -> BusinessAnalysis {
        serde_json::from_str(include_str!("../../tests/fixtures/business_analysis.json")).unwrap()
    }

    fn strategy() -> MarketingStrategy {
        serde_json::from_str(include_str!("../../tests/fixtures/marketing_strategy.json")).unwrap()
    }

    #[test]
    fn test_business_analysis_prompt_interpolates_form() {
        let prompt = business_analysis(&form());
        assert_eq!(prompt.system, system_instruction(Stage::BusinessAnalysis));
        assert!(prompt.user.contains("Company Type: B2B"));
        assert!(prompt.user.contains("Average Deal Size: $50,000"));
        assert!(prompt.user.contains("Target Customer Description: Mid-market IT directors"));
        assert!(prompt.user.contains("\"key_differentiators\""));
    }

    #[test]
    fn test_strategy_prompt_embeds_analysis_json() {
        let analysis = analysis();
        let prompt = strategy_development(&form(), &analysis);
        assert!(prompt.user.contains(&serde_json::to_string_pretty(&analysis).unwrap()));
        assert!(prompt.user.contains("Main Goal: Conversion (Lead Generation)"));
        assert!(prompt.user.contains("Monthly Budget: $10,000"));
    }

    #[test]
    fn test_report_prompt_embeds_all_prior_records() {
        let (form, analysis, strategy) = (form(), analysis(), strategy());
        let prompt = report_formatting(&form, &analysis, &strategy);
        assert!(prompt.user.contains(&serde_json::to_string_pretty(&analysis).unwrap()));
        assert!(prompt.user.contains(&serde_json::to_string_pretty(&strategy).unwrap()));
        assert!(prompt.user.contains("\"companyType\": \"B2B\""));
        assert!(prompt.user.contains("ROI Projections"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        assert_eq!(business_analysis(&form()), business_analysis(&form()));
    }
}
