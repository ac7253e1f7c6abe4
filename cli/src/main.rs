use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tribunal_core::{
    config::generate_default,
    replay::{load_script, replay},
    ContentId, Error, LogFormat, ModerationConfig, ModerationEngine, ParticipantId,
    SnapshotStorage, TribunalResult,
};

#[derive(Parser)]
#[command(name = "tribunal")]
#[command(about = "Tribunal - Stake-weighted content moderation engine", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Generate default configuration")]
    Config {
        #[arg(short, long, default_value = "tribunal.toml")]
        output: PathBuf,
    },

    #[command(about = "Apply an operation script and print each outcome")]
    Replay {
        script: PathBuf,

        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        #[arg(short, long)]
        resume: bool,
    },

    #[command(about = "Inspect a saved snapshot")]
    Show {
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        #[command(subcommand)]
        target: ShowTarget,
    },

    #[command(about = "Export a saved snapshot as JSON")]
    Export {
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        output: PathBuf,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    Content { id: ContentId },
    Participant { id: String },
    Category { id: u64 },
    Categories,
    Pending,
    Digest,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    let result = match cli.command {
        Commands::Config { output } => generate_default(&output),
        Commands::Replay {
            script,
            snapshot,
            resume,
        } => handle_replay(config, &script, snapshot, resume),
        Commands::Show { snapshot, target } => handle_show(config, snapshot, target),
        Commands::Export { snapshot, output } => handle_export(snapshot, &output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> TribunalResult<ModerationConfig> {
    match path {
        Some(path) => ModerationConfig::load(path),
        None => Ok(ModerationConfig::default()),
    }
}

fn init_logging(config: &ModerationConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone()),
    );

    match config.logging.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn open_storage(snapshot: Option<PathBuf>) -> TribunalResult<SnapshotStorage> {
    match snapshot {
        Some(dir) => SnapshotStorage::with_path(dir),
        None => SnapshotStorage::new(),
    }
}

fn handle_replay(
    config: ModerationConfig,
    script: &Path,
    snapshot: Option<PathBuf>,
    resume: bool,
) -> TribunalResult<()> {
    let ops = load_script(script)?;
    info!(script = %script.display(), operations = ops.len(), "Loaded replay script");

    let storage = match (&snapshot, resume) {
        (None, false) => None,
        _ => Some(open_storage(snapshot)?),
    };

    let store = match &storage {
        Some(storage) if resume => storage.load_or_default()?,
        _ => Default::default(),
    };

    let mut engine = ModerationEngine::new(config, store)?;
    let outcomes = replay(&mut engine, &ops);

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    for outcome in &outcomes {
        println!("{}", outcome);
    }

    println!();
    println!("Operations: {} ({} failed)", outcomes.len(), failed);
    println!("Digest:     {}", engine.state_digest()?);

    if let Some(storage) = storage {
        storage.save(engine.store())?;
        info!(path = %storage.data_dir().display(), "Snapshot saved");
        println!("Snapshot:   {}", storage.data_dir().display());
    }

    Ok(())
}

fn handle_show(
    config: ModerationConfig,
    snapshot: Option<PathBuf>,
    target: ShowTarget,
) -> TribunalResult<()> {
    let storage = open_storage(snapshot)?;
    let engine = ModerationEngine::new(config, storage.load()?)?;

    match target {
        ShowTarget::Content { id } => {
            let content = engine
                .get_content(id)
                .ok_or_else(|| Error::Storage(format!("Content {} not found", id)))?;
            println!("Content {} ({})", content.id, content.status);
            println!("Hash:       {}", content.content_hash_hex());
            println!("{}", serde_json::to_string_pretty(&content)?);
        }
        ShowTarget::Participant { id } => {
            let id = ParticipantId::new(id);
            let participant = engine
                .get_participant(&id)
                .ok_or_else(|| Error::Storage(format!("Participant {} not found", id)))?;
            println!("{}", serde_json::to_string_pretty(&participant)?);

            let score = engine.score(&id)?;
            println!(
                "Recomputed:  {} (accuracy {} bps over {} settled votes)",
                score.total(&engine.config().reputation),
                score.accuracy_bps(),
                score.settled_votes
            );
        }
        ShowTarget::Category { id } => {
            let category = engine
                .get_category(id)
                .ok_or_else(|| Error::Storage(format!("Category {} not found", id)))?;
            println!("{}", serde_json::to_string_pretty(&category)?);
        }
        ShowTarget::Categories => {
            for category in engine.list_categories() {
                println!(
                    "{:>4}  {:<24} min rep {:<8} threshold {}",
                    category.id, category.name, category.required_reputation, category.vote_threshold
                );
            }
        }
        ShowTarget::Pending => {
            for content in engine.pending_content() {
                println!(
                    "{:>4}  submitted at {:<8} by {:<16} for {:<8} against {}",
                    content.id,
                    content.submitted_at,
                    content.submitter,
                    content.votes_for,
                    content.votes_against
                );
            }
        }
        ShowTarget::Digest => {
            println!("{}", engine.state_digest()?);
        }
    }

    Ok(())
}

fn handle_export(snapshot: Option<PathBuf>, output: &Path) -> TribunalResult<()> {
    let storage = open_storage(snapshot)?;
    let store = storage.load()?;

    storage.export_json(&store, output)?;
    println!("Snapshot exported to: {}", output.display());

    Ok(())
}
