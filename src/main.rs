mod error;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use senas_asyncutils::RetryPolicy;
use senas_catalog::{Database, Repository};
use senas_config::Config;
use senas_import::{DATASET, Importer, Settings, TaxonomyNode, scaffold};
use senas_media::ImageValidator;
use senas_storage::backend::LocalBackend;
use senas_storage::remote::DriveAuthenticator;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Import the sign dataset from Google Drive")]
struct Cli {
    /// TOML configuration file (defaults to ./senas.toml, then the user config directory).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
    /// Create the local folders, then import every image into a new batch.
    #[default]
    Import,
    /// Only create the local folder for every category and sign.
    Scaffold,
    /// Print the compiled taxonomy.
    Taxonomy,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();
    if let Command::Taxonomy = command {
        print_taxonomy(DATASET, 0);
        return ExitCode::SUCCESS;
    }

    let config = Config::load(cli.config.as_deref());
    init_tracing(config.as_ref().map(|c| c.log_level.as_directive()).unwrap_or("info"));
    let outcome = match config.or_raise(|| ErrorKind::Config) {
        Ok(config) => match command {
            Command::Scaffold => prepare(&config).await.map(|_| ()),
            _ => import(&config).await,
        },
        Err(err) => Err(err),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "{}", *err);
            ExitCode::FAILURE
        },
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Open the local dataset root and create the taxonomy's folders below it.
async fn prepare(config: &Config) -> Result<Arc<LocalBackend>> {
    let root = std::path::absolute(&config.base_output_dir).or_raise(|| ErrorKind::Storage)?;
    let local = LocalBackend::new("datasets", &root).or_raise(|| ErrorKind::Storage)?;
    let created = scaffold(&local, DATASET).await.or_raise(|| ErrorKind::Storage)?;
    tracing::info!(root = %root.display(), folders = created, "Local folder structure ready");
    Ok(Arc::new(local))
}

async fn import(config: &Config) -> Result<()> {
    let local = prepare(config).await?;
    let db = Database::connect(&config.database_path).await.or_raise(|| ErrorKind::Catalog)?;
    let importer = Importer::new(
        Arc::new(Repository::from(&db)),
        Arc::new(DriveAuthenticator::new(&config.google_credentials_path, &config.google_token_path)),
        local,
        Arc::new(ImageValidator),
        Settings {
            root_folder_id: config.drive_folder_id.clone(),
            retry: RetryPolicy::new(config.attempts(), config.retry_delay()),
            concurrency: config.concurrency(),
        },
    );
    let result = importer.run().await;
    db.close().await;
    let report = result.or_raise(|| ErrorKind::Import)?;
    println!("Import completed (batch {})", report.batch.id);
    println!("  Images processed: {}", report.tally.processed);
    println!("  Errors:           {}", report.tally.failed);
    Ok(())
}

fn print_taxonomy(nodes: &[TaxonomyNode], depth: usize) {
    let indent = "  ".repeat(depth);
    for (index, node) in nodes.iter().enumerate() {
        println!("{indent}{} [{}] order={}", node.name, node.code, node.order_at(index));
        if !node.leaves.is_empty() {
            println!("{indent}  {} ({}): {}", node.difficulty(), node.leaves.len(), node.leaves.join(", "));
        }
        print_taxonomy(node.children, depth + 1);
    }
}
