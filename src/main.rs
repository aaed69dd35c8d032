use clap::Parser;
use site_probe::config::cli::read_targets_file;
use site_probe::core::render::{render, RenderMode};
use site_probe::utils::logger;
use site_probe::{CliConfig, Command, InspectionService, ProbeError, Report};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting site-probe");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => exit_with(&e, 1),
    };

    let service = match InspectionService::from_config(&config) {
        Ok(service) => service,
        Err(e) => exit_with(&e, 1),
    };

    let mode = match &cli.command {
        Command::Check { .. } => RenderMode::Single,
        Command::Batch { .. } => RenderMode::Batch,
    };

    let outcome = match &cli.command {
        Command::Check { url } => service
            .request_single_inspection(&cli.caller, url)
            .await
            .map(|report| vec![report]),
        Command::Batch { file } => match read_targets_file(file) {
            Ok(urls) => {
                tracing::info!("📁 Loaded {} targets from {}", urls.len(), file.display());
                service.request_batch_inspection(&cli.caller, &urls).await
            }
            Err(e) => Err(e),
        },
    };

    let reports: Vec<Report> = match outcome {
        Ok(reports) => reports,
        Err(e) => {
            // 驗證與限流屬於使用者輸入問題
            let code = if e.is_rejection() { 2 } else { 1 };
            exit_with(&e, code)
        }
    };

    let output = render(&reports, mode, config.output.format, service.inspector().probes())?;
    println!("{}", output);

    Ok(())
}

fn exit_with(error: &ProbeError, code: i32) -> ! {
    tracing::error!("❌ {}", error);
    tracing::error!("💡 Suggestion: {}", error.recovery_suggestion());
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(code)
}
