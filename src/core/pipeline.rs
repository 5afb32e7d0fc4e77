use crate::core::prompts::{self, Prompt};
use crate::core::schema::{self, StageRecord};
use crate::domain::model::{
    BusinessAnalysis, FormattedReport, GeneratedReport, MarketingForm, MarketingStrategy, Stage,
};
use crate::domain::ports::{
    CompletionClient, CompletionRequest, ConfigProvider, DocumentRenderer, StageSettings,
};
use crate::utils::error::{ReportError, Result};
use crate::utils::monitor::SystemMonitor;
use std::collections::HashMap;

/// Pipeline 狀態。只能依序前進，`Failed` 為終止狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    AnalyzingBusiness,
    DevelopingStrategy,
    FormattingReport,
    RenderingDocument,
    Done,
    Failed,
}

impl PipelineState {
    /// 驗證通過後的下一個狀態
    pub fn next(self) -> Self {
        match self {
            PipelineState::AnalyzingBusiness => PipelineState::DevelopingStrategy,
            PipelineState::DevelopingStrategy => PipelineState::FormattingReport,
            PipelineState::FormattingReport => PipelineState::RenderingDocument,
            PipelineState::RenderingDocument => PipelineState::Done,
            PipelineState::Done => PipelineState::Done,
            PipelineState::Failed => PipelineState::Failed,
        }
    }

    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::BusinessAnalysis => PipelineState::AnalyzingBusiness,
            Stage::StrategyDevelopment => PipelineState::DevelopingStrategy,
            Stage::ReportFormatting => PipelineState::FormattingReport,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

/// 單次執行的狀態紀錄，每個請求各自擁有
#[derive(Debug, Clone)]
pub struct PipelineRun {
    state: PipelineState,
    history: Vec<PipelineState>,
}

impl PipelineRun {
    pub fn new() -> Self {
        Self {
            state: PipelineState::AnalyzingBusiness,
            history: vec![PipelineState::AnalyzingBusiness],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn history(&self) -> &[PipelineState] {
        &self.history
    }

    fn advance(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = self.state.next();
        self.history.push(self.state);
    }

    fn fail(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = PipelineState::Failed;
        self.history.push(self.state);
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

/// 模型名稱與各階段取樣參數
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub model: String,
    stages: HashMap<Stage, StageSettings>,
}

impl PipelineSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            stages: Stage::ALL
                .iter()
                .map(|stage| (*stage, StageSettings::defaults_for(*stage)))
                .collect(),
        }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        let mut settings = Self::new(config.model());
        for stage in Stage::ALL {
            settings.set_stage(stage, config.stage_settings(stage));
        }
        settings
    }

    pub fn set_stage(&mut self, stage: Stage, stage_settings: StageSettings) {
        self.stages.insert(stage, stage_settings);
    }

    pub fn stage(&self, stage: Stage) -> StageSettings {
        self.stages
            .get(&stage)
            .copied()
            .unwrap_or_else(|| StageSettings::defaults_for(stage))
    }
}

/// 三階段報告產生流程：分析 → 策略 → 排版 → PDF
pub struct ReportPipeline<C: CompletionClient, R: DocumentRenderer> {
    client: C,
    renderer: R,
    settings: PipelineSettings,
    monitor_enabled: bool,
}

impl<C: CompletionClient, R: DocumentRenderer> ReportPipeline<C, R> {
    pub fn new(client: C, renderer: R, settings: PipelineSettings) -> Self {
        Self::new_with_monitoring(client, renderer, settings, false)
    }

    pub fn new_with_monitoring(
        client: C,
        renderer: R,
        settings: PipelineSettings,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            client,
            renderer,
            settings,
            monitor_enabled,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(&self, form: &MarketingForm) -> Result<GeneratedReport> {
        let mut run = PipelineRun::new();
        self.execute(form, &mut run).await
    }

    /// 依序執行所有階段；任何失敗都會讓 `run` 進入 `Failed` 並立即返回
    pub async fn execute(&self, form: &MarketingForm, run: &mut PipelineRun) -> Result<GeneratedReport> {
        let mut monitor = SystemMonitor::new(self.monitor_enabled);
        tracing::info!("🚀 Starting report generation for {} / {}", form.company_type, form.industry);

        let result = self.execute_stages(form, run, &mut monitor).await;
        match &result {
            Ok(report) => {
                tracing::info!(
                    "✅ Report generated: {} sections, {} pages, {} bytes",
                    report.report.sections.len(),
                    report.document.page_count,
                    report.document.bytes.len()
                );
            }
            Err(e) => {
                run.fail();
                tracing::error!(
                    "❌ Report generation failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
            }
        }
        monitor.log_final_stats();
        result
    }

    async fn execute_stages(
        &self,
        form: &MarketingForm,
        run: &mut PipelineRun,
        monitor: &mut SystemMonitor,
    ) -> Result<GeneratedReport> {
        let business_analysis: BusinessAnalysis =
            self.run_stage(prompts::business_analysis(form)).await?;
        monitor.mark(Stage::BusinessAnalysis.name());
        run.advance();

        let strategy: MarketingStrategy = self
            .run_stage(prompts::strategy_development(form, &business_analysis))
            .await?;
        monitor.mark(Stage::StrategyDevelopment.name());
        run.advance();

        let report: FormattedReport = self
            .run_stage(prompts::report_formatting(form, &business_analysis, &strategy))
            .await?;
        monitor.mark(Stage::ReportFormatting.name());
        run.advance();

        tracing::info!("📄 Rendering {} report sections", report.sections.len());
        let document = self.renderer.render(&report)?;
        monitor.mark("document rendering");
        run.advance();

        Ok(GeneratedReport {
            business_analysis,
            strategy,
            report,
            document,
        })
    }

    /// 單一階段：呼叫模型 → 解析 → schema 驗證
    async fn run_stage<T: StageRecord>(&self, prompt: Prompt) -> Result<T> {
        let stage = T::STAGE;
        let stage_settings = self.settings.stage(stage);
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system: prompt.system,
            prompt: prompt.user,
            temperature: stage_settings.temperature,
            max_tokens: stage_settings.max_tokens,
        };

        tracing::info!("🤖 Stage {}/3: {}", stage.number(), stage);
        tracing::debug!(
            "Prompt for {}: {} chars, temperature {}, max_tokens {}",
            stage,
            request.prompt.len(),
            request.temperature,
            request.max_tokens
        );

        let raw = self
            .client
            .complete(&request)
            .await
            .map_err(|source| ReportError::Completion { stage, source })?;
        tracing::debug!("Completion for {}: {} chars", stage, raw.len());

        let record = schema::parse_record::<T>(&raw)
            .map_err(|source| ReportError::Validation { stage, source })?;
        tracing::info!("✅ Stage {}/3 validated", stage.number());
        Ok(record)
    }
}
