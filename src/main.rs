mod artifacts;
mod cli;
mod config;
mod hedge;
mod openalex;
mod pubmed;
mod query;
mod search;
mod terms;

pub const USER_AGENT: &str = concat!("pubhedge/", env!("CARGO_PKG_VERSION"));

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

use artifacts::ArtifactWriter;
use cli::{Cli, Command};
use config::Config;
use openalex::OpenAlexClient;
use pubmed::PubMedClient;
use search::{QueryOutcome, RunRequest};

fn init_tracing(log_file: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive("pubhedge=info".parse()?);
    match log_file {
        Some(path) => tracing_subscriber::fmt()
            .with_writer(Mutex::new(File::create(path)?))
            .with_ansi(false)
            .with_env_filter(filter)
            .init(),
        None => tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init(),
    }
    Ok(())
}

async fn run_search(config: &Config, http: Client) -> Result<(), Box<dyn std::error::Error>> {
    let blocks = terms::load_blocks(&config.mesh_dir, &config.keyword_dir)?;
    let writer = ArtifactWriter::create(&config.target_dir, &config.datestamp, &config.libraries)?;
    let client = PubMedClient::new(http, config);

    let report = search::run(
        &client,
        &writer,
        &RunRequest {
            blocks: &blocks,
            field_tags: &config.field_tags,
            max_results: config.max_results,
        },
    )
    .await?;

    info!(root = %writer.root().display(), hedges = report.hedges.len(), "artifacts written");
    for run in &report.queries {
        match &run.outcome {
            QueryOutcome::Completed(r) => info!(
                query = %run.label,
                count = r.count,
                articles = r.articles,
                query_file = %r.query_file.display(),
                table = %r.files.table.display(),
                "variant retrieved"
            ),
            QueryOutcome::TooLong { file } => {
                info!(query = %run.label, file = %file.display(), "variant too long")
            }
            QueryOutcome::Failed(e) => info!(query = %run.label, error = %e, "variant failed"),
        }
    }
    Ok(())
}

/// `<target>/<table stem>-mag.txt` and `<target>/<table stem>-nomag.txt`.
fn enrich_outputs(target: &Path, table: &Path) -> (PathBuf, PathBuf) {
    let stem = table
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    (
        target.join(format!("{stem}-mag.txt")),
        target.join(format!("{stem}-nomag.txt")),
    )
}

async fn run_enrich(config: &Config, http: Client, table: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&config.target_dir)?;
    let (mag_file, nomag_file) = enrich_outputs(&config.target_dir, table);
    let client = OpenAlexClient::new(http, config);
    let summary = openalex::enrich(&client, table, &mag_file, &nomag_file).await?;
    info!(
        mapped = summary.mapped,
        unmapped = summary.unmapped,
        mag_file = %summary.mag_file.display(),
        nomag_file = %summary.nomag_file.display(),
        "openalex enrichment complete"
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    let config = cli.config();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        email = %config.email,
        target = %config.target_dir.display(),
        datestamp = %config.datestamp,
        "BEGIN"
    );

    let http = Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(120))
        .build()?;

    match cli.command() {
        Command::Search => run_search(&config, http).await?,
        Command::Enrich { csv } => run_enrich(&config, http, &csv).await?,
    }

    info!("END");
    Ok(())
}
