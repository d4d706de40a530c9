use anyhow::Context;
use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use travel_sheet::cli::Cli;
use travel_sheet::cli::Command;
use travel_sheet::cli::TripFile;
use travel_sheet::config::Config;
use travel_sheet::merge::MergeEngine;
use travel_sheet::spreadsheet::EMBEDDED_PREFIX;
use travel_sheet::spreadsheet::EMBEDDED_TEMPLATE_NAME;

fn setup_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).with_context(|| format!("Invalid log level '{level}'"))?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_owned());
    setup_logging(&level)?;

    match cli.command {
        Command::Generate {
            trip,
            output_dir,
            format,
            date,
        } => {
            let trip = TripFile::load(&trip)?;
            let mut session = config.session();
            trip.apply(&mut session)?;
            let engine = config.merge_engine()?;
            let exporter = config.exporter(format);
            let generated_on = date.unwrap_or_else(|| Local::now().date_naive());

            let document = session
                .generate(&engine, &exporter, generated_on)
                .inspect_err(|error| {
                    if error.is_user_correctable() {
                        warn!("{error}");
                    }
                })
                .context("Failed to generate document")?;
            write_document(&output_dir, &document.file_name, &document.bytes)?;
        }
        Command::Templates => {
            let loader = config.template_loader();
            println!("{EMBEDDED_PREFIX}{EMBEDDED_TEMPLATE_NAME}");
            for name in loader.available_templates()? {
                println!("{}", loader.template_dir().join(name).display());
            }
        }
        Command::Check { template } => {
            let source = config.template_source(template.as_deref())?;
            let engine = MergeEngine::new(config.template_loader(), source);
            let sheet = engine
                .load_template()
                .with_context(|| format!("Template {} does not fit the form layout", engine.source()))?;
            println!(
                "{}: {} rows x {} columns, layout OK",
                engine.source(),
                sheet.row_count(),
                sheet.column_count()
            );
        }
    }
    Ok(())
}

fn write_document(output_dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
    let path = output_dir.join(file_name);
    fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "document written");
    println!("{}", path.display());
    Ok(())
}
