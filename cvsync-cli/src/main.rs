//! cvsync — edit CV record collections stored as data files in a GitHub
//! repository.
//!
//! Each command is one load→mutate→save round trip against the repository's
//! contents API, guarded by the file's version token. Configuration comes
//! from `CVSYNC_*` environment variables.
//!
//! # Usage
//!
//! ```bash
//! # List a collection with indices
//! cvsync show publications
//!
//! # Add a record (JSON in the collection's wire shape)
//! cvsync add publications --json '{"title":"...","authors":"...","journal":"...","year":2024,"type":"journal"}'
//!
//! # Replace the record at index 3
//! cvsync update publications 3 --json '{...}'
//!
//! # Delete the record at index 2 (following records shift down)
//! cvsync remove publications 2
//!
//! # Upload an asset and print its public URL (for pdfUrl/imageUrl fields)
//! cvsync upload images/photo.png ./photo.png
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cvsync_core::{
    Award, CvRecord, Evaluation, GitHubStore, Presentation, Publication, ResearchProject,
    Supervision, SyncConfig, SyncController,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cvsync")]
#[command(author = "cvsync Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Edit CV record collections stored in a GitHub repository")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Gate password (required for mutating commands when
    /// CVSYNC_ADMIN_PASSWORD is configured)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CollectionArg {
    Publications,
    Awards,
    Presentations,
    ResearchProjects,
    Supervision,
    Evaluation,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List a collection's records with their indices
    Show {
        collection: CollectionArg,
    },

    /// Add a record and commit
    Add {
        collection: CollectionArg,
        /// Record as JSON in the collection's wire shape
        #[arg(long)]
        json: String,
    },

    /// Replace the record at an index and commit
    Update {
        collection: CollectionArg,
        /// Zero-based record index
        index: usize,
        /// Record as JSON in the collection's wire shape
        #[arg(long)]
        json: String,
    },

    /// Delete the record at an index and commit
    Remove {
        collection: CollectionArg,
        /// Zero-based record index
        index: usize,
    },

    /// Upload a binary asset (image, PDF) and print its public URL
    Upload {
        /// Repository-relative destination path, e.g. images/photo.png
        path: String,
        /// Local file to upload
        file: PathBuf,
    },
}

enum Action {
    Show,
    Add(String),
    Update(usize, String),
    Remove(usize),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::WARN.into())
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let config = SyncConfig::from_env();

    // Plaintext gate for mutating commands, standing in for the admin
    // panel's login page.
    let mutating = !matches!(cli.command, Commands::Show { .. });
    if mutating {
        if let Some(expected) = &config.admin_password {
            match &cli.password {
                Some(given) if given == expected => {}
                _ => return Err(anyhow!("admin password required (use --password)")),
            }
        }
    }

    let store = GitHubStore::new(&config)?;

    let (collection, action) = match cli.command {
        Commands::Upload { path, file } => {
            let data = std::fs::read(&file)
                .map_err(|e| anyhow!("failed to read {}: {}", file.display(), e))?;
            let message = format!("Uploaded asset: {}", path);
            let url = store.upload_asset(&path, &data, &message).await?;
            println!("{}", url);
            return Ok(());
        }
        Commands::Show { collection } => (collection, Action::Show),
        Commands::Add { collection, json } => (collection, Action::Add(json)),
        Commands::Update {
            collection,
            index,
            json,
        } => (collection, Action::Update(index, json)),
        Commands::Remove { collection, index } => (collection, Action::Remove(index)),
    };

    let controller = SyncController::new(store);

    match collection {
        CollectionArg::Publications => run::<Publication>(&controller, action).await,
        CollectionArg::Awards => run::<Award>(&controller, action).await,
        CollectionArg::Presentations => run::<Presentation>(&controller, action).await,
        CollectionArg::ResearchProjects => run::<ResearchProject>(&controller, action).await,
        CollectionArg::Supervision => run::<Supervision>(&controller, action).await,
        CollectionArg::Evaluation => run::<Evaluation>(&controller, action).await,
    }
}

async fn run<T: CvRecord>(controller: &SyncController<GitHubStore>, action: Action) -> Result<()> {
    match action {
        Action::Show => {
            let session = controller.load::<T>().await?;
            println!(
                "{} ({} records, token {})",
                T::COLLECTION,
                session.records().len(),
                session.version_token()
            );
            for (index, record) in session.records().iter().enumerate() {
                println!("[{}] {}", index, serde_json::to_string_pretty(record)?);
            }
        }
        Action::Add(json) => {
            let record: T = parse_record(&json)?;
            let mut session = controller.load::<T>().await?;
            session.add(record)?;
            let message = session.commit_message();
            controller.save(&mut session).await?;
            println!("Committed: {}", message);
        }
        Action::Update(index, json) => {
            let record: T = parse_record(&json)?;
            let mut session = controller.load::<T>().await?;
            session.update(index, record)?;
            let message = session.commit_message();
            controller.save(&mut session).await?;
            println!("Committed: {}", message);
        }
        Action::Remove(index) => {
            let mut session = controller.load::<T>().await?;
            let removed = session.remove(index)?;
            let message = session.commit_message();
            controller.save(&mut session).await?;
            println!("Removed {}: {}", T::NOUN, removed.summary());
            println!("Committed: {}", message);
        }
    }
    Ok(())
}

fn parse_record<T: CvRecord>(json: &str) -> Result<T> {
    serde_json::from_str(json)
        .map_err(|e| anyhow!("invalid {} JSON: {}", T::NOUN, e))
}
