//! `datasource-import` - imports schema and metadata files into an in-memory
//! platform and prints what was stored.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use datasource::{
    AnalysisService, Collaborators, ImportBundle, InMemoryPlatform, LoggingConfig,
    MetadataService, PlatformEvent, SchemaUpload, ServiceConfig,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "datasource-import", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import one or more OLAP schema documents, in order
    Analysis(AnalysisArgs),
    /// Import a metadata model under a domain id
    Metadata(MetadataArgs),
}

#[derive(Debug, Args)]
struct AnalysisArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long)]
    catalog_name: Option<String>,

    /// Name the catalog was stored under before this upload
    #[arg(long)]
    orig_catalog_name: Option<String>,

    #[arg(long)]
    datasource_name: Option<String>,

    /// Overwrite flag, "true" in any case means overwrite
    #[arg(long)]
    overwrite: Option<String>,

    #[arg(long)]
    xmla_enabled: Option<String>,

    /// Parameter blob, e.g. "Provider=mondrian;DataSource=SampleData"
    #[arg(long)]
    parameters: Option<String>,
}

#[derive(Debug, Args)]
struct MetadataArgs {
    domain_id: String,
    file: PathBuf,

    #[arg(long)]
    overwrite: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    stored: Vec<ImportBundle>,
    events: Vec<PlatformEvent>,
    analysis_ids: Vec<String>,
    metadata_ids: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    init_tracing(&config.logging, cli.json_logs);

    let platform = Arc::new(InMemoryPlatform::new(
        config.import.clone(),
        config.platform.clone(),
    ));
    let collaborators = Collaborators::from_platform(platform.clone(), Arc::new(|| true));
    let analysis = AnalysisService::new(collaborators.clone(), config.import.clone());
    let metadata = MetadataService::new(collaborators, config.import.clone());

    match cli.command {
        Command::Analysis(args) => {
            for path in &args.files {
                let upload = SchemaUpload {
                    file_name: file_name(path),
                    catalog_name: args.catalog_name.clone(),
                    orig_catalog_name: args.orig_catalog_name.clone(),
                    datasource_name: args.datasource_name.clone(),
                    overwrite: args.overwrite.clone(),
                    xmla_enabled: args.xmla_enabled.clone(),
                    parameters: args.parameters.clone(),
                };
                let file = File::open(path)
                    .with_context(|| format!("opening {}", path.display()))?;
                let domain_id = analysis
                    .put_mondrian_schema(BufReader::new(file), &upload)
                    .with_context(|| format!("importing {}", path.display()))?;
                tracing::info!(path = %path.display(), domain_id = %domain_id, "imported");
            }
        }
        Command::Metadata(args) => {
            let file = File::open(&args.file)
                .with_context(|| format!("opening {}", args.file.display()))?;
            metadata
                .import_metadata(&args.domain_id, BufReader::new(file), args.overwrite.as_deref())
                .with_context(|| format!("importing {}", args.file.display()))?;
        }
    }

    let report = Report {
        stored: platform.stored_bundles(),
        events: platform.events(),
        analysis_ids: analysis.analysis_datasource_ids()?,
        metadata_ids: metadata.metadata_datasource_ids(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn init_tracing(logging: &LoggingConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json || logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
