//! Taskdeck
//!
//! HTTP API server and command-line tools for a small task manager with
//! projects, tags and an AI assistant.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use taskdeck::api::{AppState, start_server};
use taskdeck::assistant;
use taskdeck::cli::{AddArgs, Cli, Command};
use taskdeck::config::{Config, ConfigLoader};
use taskdeck::db::Database;
use taskdeck::logging;
use taskdeck::quick_add::parse_quick_add;
use taskdeck::types::NewTask;
use tracing::{debug, info};

/// Start the API and block until Ctrl-C.
async fn serve(config: &Config, db: Arc<Database>) -> Result<()> {
    if config.server.seed_on_startup && db.seed()? {
        info!("Inserted sample data");
    }

    let assistant = assistant::from_config(&config.ai);
    let state = AppState::new(db, assistant, config.projects.delete_policy);

    let (shutdown_tx, _addr) = start_server(state, &config.server.host, config.server.port).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    let _ = shutdown_tx.send(());
    Ok(())
}

fn add(db: &Database, args: AddArgs) -> Result<()> {
    let parsed = parse_quick_add(&args.text, Utc::now());
    if parsed.title.is_empty() {
        anyhow::bail!("Task title is empty after removing the due date keyword");
    }

    let task = NewTask {
        due_date: parsed.due_date,
        project_id: args.project,
        priority: args.priority.unwrap_or_default(),
        ..NewTask::titled(parsed.title)
    };
    let created = db.create_task(&task, None)?;

    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&cli.log, cli.verbose)?;

    let mut loader = ConfigLoader::load(cli.config.as_ref().map(PathBuf::from))?;
    for source in loader.sources() {
        debug!("Loaded config from {}", source.display());
    }

    // CLI flags override every config tier
    let config = loader.config_mut();
    if let Some(database) = &cli.database {
        config.server.db_path = PathBuf::from(database);
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    let config = loader.into_config();

    config.ensure_db_dir()?;
    info!("Database: {}", config.server.db_path.display());
    let db = Arc::new(Database::open(&config.server.db_path)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, db).await,
        Command::Seed => {
            if db.seed()? {
                println!("Seeded sample projects, tags and tasks");
            } else {
                println!("Database is not empty; nothing seeded");
            }
            Ok(())
        }
        Command::Add(args) => add(&db, args),
    }
}
