use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use greek_xmltv::{
    config::Config,
    exporter::XmltvExporter,
    sources::{DigeaCollector, EpgCollector, ErtCollector, write_export},
    utils::time::parse_timezone,
};

#[derive(Parser)]
#[command(name = "greek-xmltv")]
#[command(version)]
#[command(about = "Greek TV listings (Digea, ERT) to XMLTV")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the XMLTV document from the intermediate JSON files
    Generate {
        /// Directory holding the intermediate JSON files
        #[arg(long, value_name = "DIR")]
        input_dir: Option<PathBuf>,

        /// Read only this file (relative to the input directory)
        #[arg(long, value_name = "FILE")]
        input_file: Option<String>,

        /// Read only the newest input file instead of all of them
        #[arg(long)]
        single_file: bool,

        /// Channel identity cache
        #[arg(long, value_name = "PATH")]
        cache_file: Option<PathBuf>,

        /// Output document path
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Also write the national + Attica subset document
        #[arg(long)]
        regional: bool,
    },
    /// Fetch one day of Digea listings into the export directory
    FetchDigea {
        /// Listing date, defaults to today
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Where to write the intermediate JSON file
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,
    },
    /// Fetch the ERT programme pages into the export directory
    FetchErt {
        /// Where to write the intermediate JSON file
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("greek_xmltv={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting greek-xmltv v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_from_file(&cli.config)?;

    match cli.command {
        Command::Generate {
            input_dir,
            input_file,
            single_file,
            cache_file,
            output,
            regional,
        } => {
            if let Some(input_dir) = input_dir {
                config.paths.input_dir = input_dir;
            }
            if input_file.is_some() {
                config.ingestion.multi_file = false;
                config.ingestion.input_file = input_file;
            } else if single_file {
                config.ingestion.multi_file = false;
                config.ingestion.input_file = None;
            }
            if let Some(cache_file) = cache_file {
                config.paths.cache_file = cache_file;
            }
            if let Some(output) = output {
                if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
                    config.paths.output_dir = dir.to_path_buf();
                }
                if let Some(name) = output.file_name() {
                    config.paths.output_file = name.to_string_lossy().into_owned();
                }
            }

            let summary = XmltvExporter::new(config)?.run(regional)?;
            for document in &summary.documents {
                info!(
                    "{}: {} channels, {} programmes",
                    document.path.display(),
                    document.channels,
                    document.programmes
                );
            }
        }
        Command::FetchDigea { date, export_dir } => {
            if let Some(export_dir) = export_dir {
                config.digea.export_dir = export_dir;
            }
            let timezone = parse_timezone(&config.xmltv.timezone)?;
            let date = date.unwrap_or_else(|| Utc::now().with_timezone(&timezone).date_naive());

            let collector =
                DigeaCollector::from_config(&config.digea, timezone, &config.xmltv.default_description)?;
            let channels = collector.collect(date).await?;
            let path = write_export(&config.digea.export_dir, collector.name(), &channels, Utc::now())?;
            info!("Digea listings for {} written to {}", date, path.display());
        }
        Command::FetchErt { export_dir } => {
            if let Some(export_dir) = export_dir {
                config.ert.export_dir = export_dir;
            }
            let timezone = parse_timezone(&config.xmltv.timezone)?;
            let today = Utc::now().with_timezone(&timezone).date_naive();

            let collector =
                ErtCollector::from_config(&config.ert, timezone, &config.xmltv.default_description)?;
            let channels = collector.collect(today).await?;
            let path = write_export(&config.ert.export_dir, collector.name(), &channels, Utc::now())?;
            info!("ERT listings written to {}", path.display());
        }
    }

    Ok(())
}
