use clap::Parser;
use marketing_audit::domain::ports::ConfigProvider;
use marketing_audit::utils::error::{ErrorSeverity, ReportError};
use marketing_audit::utils::{logger, validation::Validate};
use marketing_audit::{
    CliConfig, LocalStorage, MarketingForm, OpenAiClient, PdfRenderer, PipelineSettings,
    ReportPipeline, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting marketing-audit CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ Report generation failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        std::process::exit(exit_code(&e));
    }

    Ok(())
}

async fn run(config: CliConfig) -> marketing_audit::Result<()> {
    config.validate()?;

    // 有設定檔時連線參數以設定檔為準
    let (provider, monitor_enabled, output_path) = match &config.config {
        Some(path) => {
            let toml = TomlConfig::from_file(path)?.with_fallback_api_key(config.api_key.clone());
            toml.validate()?;
            let monitor = config.monitor || toml.monitoring_enabled();
            let output = toml
                .output_path()
                .unwrap_or(config.output_path.as_str())
                .to_string();
            (Box::new(toml) as Box<dyn ConfigProvider>, monitor, output)
        }
        None => (
            Box::new(config.clone()) as Box<dyn ConfigProvider>,
            config.monitor,
            config.output_path.clone(),
        ),
    };

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let form_bytes = std::fs::read(&config.form)?;
    let form = MarketingForm::from_json_slice(&form_bytes)?;
    form.validate()?;
    tracing::info!("📋 Loaded form from {}", config.form);

    let client = OpenAiClient::from_config(provider.as_ref())?;
    let settings = PipelineSettings::from_config(provider.as_ref());
    let pipeline =
        ReportPipeline::new_with_monitoring(client, PdfRenderer::new(), settings, monitor_enabled);

    let report = pipeline.run(&form).await?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let saved = LocalStorage::new(&output_path).save_report(&report, &stamp)?;

    tracing::info!("✅ Report generation completed successfully!");
    tracing::info!("📁 PDF saved to: {}", saved.pdf_path.display());
    println!("✅ Report generated ({} pages)", report.document.page_count);
    println!("📁 PDF:  {}", saved.pdf_path.display());
    println!("📁 JSON: {}", saved.json_path.display());

    Ok(())
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &ReportError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1, // 輸入或處理錯誤
        ErrorSeverity::Medium => 2,                    // 可重試
        ErrorSeverity::Critical => 3,                  // 系統錯誤
    }
}
