//! Network Speed Tester - Main CLI Application
//!
//! Measures latency, download and upload throughput against a speed test
//! endpoint and prints the results as text or JSON.

use clap::Parser;
use network_speed_tester::{
    cli::Cli,
    config::{display_config_summary, validate_config, ConfigParser, EnvManager},
    error::{AppError, Result},
    executor::SpeedTestExecutor,
    log_debug, log_info, log_warn,
    logging::{Logger, ProbeLogger},
    metadata::MetadataClient,
    models::{ClientMetadata, Config},
    output::ReportFormatter,
    PKG_NAME, VERSION,
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(99);
    }));

    let cli = Cli::parse();
    let use_color = cli.color_override().unwrap_or(true);

    if let Err(e) = run_application(cli).await {
        eprintln!("{}", e.format_for_console(use_color));
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    if cli.env_help {
        println!("{}", EnvManager::display_env_help());
        return Ok(());
    }

    if let Some(ref path) = cli.write_env_example {
        EnvManager::save_example_env_file(path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let json = cli.json;
    let skip_metadata = cli.skip_metadata;
    let config = ConfigParser::new(cli).parse()?;

    for warning in validate_config(&config)? {
        eprintln!("{}", warning.format(config.enable_color));
    }

    let logger = Logger::with_config("SPEEDTEST".to_string(), &config);
    let session_id = logger.start_session().await;
    log_debug!(logger, "{} v{} session {}", PKG_NAME, VERSION, session_id);
    log_debug!(logger, "Configuration:\n{}", display_config_summary(&config));

    let metadata = if skip_metadata {
        None
    } else {
        Some(fetch_metadata(&config, &logger).await?)
    };

    let executor = SpeedTestExecutor::from_config(&config)?.with_logger(ProbeLogger::from_logger(logger.clone()));
    log_info!(
        logger,
        "Running {} latency probes and {} throughput transfers against {}",
        executor.plan().latency_probes,
        executor.plan().total_transfers(),
        config.server_url
    );

    if json {
        let mut report = executor.run().await?;
        if let Some(metadata) = metadata {
            report = report.with_metadata(metadata);
        }
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    // Print each stage as soon as it completes
    let formatter = ReportFormatter::from_config(&config);
    println!("{}", formatter.format_header("Speed Test Results")?);
    print!("{}", formatter.format_metadata(&config.server_url, metadata.as_ref())?);
    println!();

    let latency = executor.measure_latency().await?;
    println!("{}", formatter.format_latency(&latency)?);

    let download = executor.measure_download().await?;
    println!("{}", formatter.format_direction(&download)?);

    let upload = executor.measure_upload().await?;
    print!("{}", formatter.format_direction(&upload)?);

    let failed = latency.failed_probes + download.failed_probes() + upload.failed_probes();
    if failed > 0 {
        log_warn!(logger, "{} probe(s) failed and were left out of the results", failed);
    }

    Ok(())
}

/// Lookup failures only cost the location line, never the run
async fn fetch_metadata(config: &Config, logger: &Logger) -> Result<ClientMetadata> {
    let client = MetadataClient::new(config)?;
    let (metadata, errors) = client.fetch_client_metadata().await;

    for error in &errors {
        logger
            .warn(&format!("Metadata lookup failed: {}", error))
            .error_info(error)
            .log()
            .await;
    }

    Ok(metadata)
}

fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Parse(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Run with --env-help to list supported environment variables");
            eprintln!("  - Plans are comma-separated BYTESxITERATIONS items, e.g. 101000x10,1001000x8");
            eprintln!("  - The server URL must start with http:// or https://");
        }
        AppError::InvalidInput(_) => {
            eprintln!();
            eprintln!("Every probe of a stage failed:");
            eprintln!("  - Check your internet connection and the --url value");
            eprintln!("  - Increase the per-transfer timeout with --timeout");
            eprintln!("  - Rerun with --verbose to see why each probe failed");
        }
        _ => {}
    }
}
