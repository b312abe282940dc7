//! CLI command definitions for taskdeck
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::types::Priority;
use clap::{Args, Parser, Subcommand};

/// Taskdeck task manager API server and CLI tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Address to bind the HTTP API to (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port for the HTTP API (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API server (default if no subcommand given)
    Serve,

    /// Insert sample projects, tags and tasks into an empty database
    Seed,

    /// Create a task from a quick-add line such as "Buy milk tomorrow"
    Add(AddArgs),
}

/// Arguments for `taskdeck add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task text; "today" or "tomorrow" sets the due date
    pub text: String,

    /// Project id to file the task under
    #[arg(long)]
    pub project: Option<i64>,

    /// Task priority
    #[arg(long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    Priority::parse(value).ok_or_else(|| {
        let expected: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();
        format!("expected one of: {}", expected.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["taskdeck"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn test_add_with_options() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "--database",
            "/tmp/t.db",
            "add",
            "Buy milk tomorrow",
            "--project",
            "2",
            "--priority",
            "high",
        ])
        .unwrap();
        assert_eq!(cli.database.as_deref(), Some("/tmp/t.db"));
        match cli.command {
            Some(Command::Add(args)) => {
                assert_eq!(args.text, "Buy milk tomorrow");
                assert_eq!(args.project, Some(2));
                assert_eq!(args.priority, Some(Priority::High));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_add_rejects_unknown_priority() {
        let result = Cli::try_parse_from(["taskdeck", "add", "x", "--priority", "urgent"]);
        assert!(result.is_err());
    }
}
