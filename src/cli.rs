//! CLI interface for Harbour.
//!
//! Every subcommand is non-interactive: arguments in, text or JSON out.
//! Human-readable output goes to stdout; logs go to stderr.
//!
//! - `harbour prs`: my open pull requests across every registered repository.
//! - `harbour repos`: the registry, optionally filtered.
//! - `harbour open <name>`: open a repository in its editor.
//! - `harbour auth`: check that `gh` is installed and logged in.
//! - `harbour util list|run`: configured utility scripts.

mod format;

use std::path::Path;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::exec::SystemRunner;
use crate::github;
use crate::launch;
use crate::model::{LoadStatus, PullRequest, Repository};
use crate::registry::Registry;
use crate::utility::{self, Utility};

use format::{format_load_status, format_pull_request, format_repository};

/// Harbour: your pull requests, across every repository you work in.
#[derive(Debug, Parser)]
#[command(name = "harbour", version, after_long_help = CONFIG_HELP)]
pub struct Cli {
    /// Log external commands and per-repository outcomes to stderr.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const CONFIG_HELP: &str = r#"Files:
  ~/.harbour/config.toml     optional settings (registry path, gh config dir, timeouts)
  ~/.harbour/repos.json      registered repositories:
                             [{ "name": "widgets", "path": "/src/widgets", "type": "code" }]
  ~/.harbour/utilities.json  utility scripts:
                             [{ "name": "clean", "command": "cargo clean", "type": "bash" }]

Logging:
  HARBOUR_LOG or RUST_LOG set the log filter (e.g. HARBOUR_LOG=harbour=debug)."#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show my open pull requests across every registered repository.
    ///
    /// Newest first, followed by one load status per repository explaining
    /// any gaps.
    Prs {
        /// Print pull requests and load statuses as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List registered repositories.
    Repos {
        /// Only repositories whose directory exists.
        #[arg(long)]
        active: bool,

        /// Only repositories whose name contains this text (case-insensitive).
        #[arg(long)]
        filter: Option<String>,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Open a registered repository in its editor.
    Open {
        /// Repository name, or its registered path.
        name: String,
    },

    /// Check that the GitHub CLI is installed and authenticated.
    ///
    /// Exits non-zero when it isn't.
    Auth,

    /// List or run utility scripts.
    Util {
        #[command(subcommand)]
        command: UtilCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum UtilCommand {
    /// List configured utilities.
    List {
        /// Only utilities whose name or description contains this text.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Run a utility by name.
    Run {
        /// Utility name.
        name: String,
    },
}

/// JSON shape of `harbour prs --json`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestReport<'a> {
    pull_requests: &'a [PullRequest],
    statuses: &'a [LoadStatus],
}

/// Run the CLI, returning an error message on failure.
pub async fn run(cli: Cli, config: &Config) -> Result<(), String> {
    let runner = SystemRunner::new().with_timeout(config.command_timeout());

    match cli.command {
        Command::Prs { json } => cmd_prs(config, &runner, json).await,
        Command::Repos {
            active,
            filter,
            json,
        } => cmd_repos(config, active, filter.as_deref(), json),
        Command::Open { name } => cmd_open(config, &runner, &name),
        Command::Auth => cmd_auth(config, &runner).await,
        Command::Util { command } => match command {
            UtilCommand::List { filter } => cmd_util_list(config, filter.as_deref()),
            UtilCommand::Run { name } => cmd_util_run(config, &runner, &name).await,
        },
    }
}

fn load_registry(config: &Config) -> Result<Registry, String> {
    let path = config
        .registry_path()
        .ok_or("could not determine home directory")?;
    Registry::load(&path).map_err(|e| format!("failed to load registry: {e}"))
}

fn load_utilities(config: &Config) -> Result<Vec<Utility>, String> {
    let path = config
        .utilities_path()
        .ok_or("could not determine home directory")?;
    utility::load_utilities(&path).map_err(|e| format!("failed to load utilities: {e}"))
}

async fn cmd_prs(config: &Config, runner: &SystemRunner, json: bool) -> Result<(), String> {
    let registry = load_registry(config)?;
    if registry.all().is_empty() {
        return Err("no repositories registered; add some to ~/.harbour/repos.json".to_string());
    }

    let (pull_requests, statuses) =
        github::my_open_pull_requests(runner, registry.all(), &config.fetch_policy()).await;

    if json {
        let report = PullRequestReport {
            pull_requests: &pull_requests,
            statuses: &statuses,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("failed to serialize pull requests: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if pull_requests.is_empty() {
        println!("No open pull requests");
    }
    for pr in &pull_requests {
        println!("{}", format_pull_request(pr));
    }

    println!();
    for status in &statuses {
        println!("{}", format_load_status(status));
    }

    Ok(())
}

fn cmd_repos(
    config: &Config,
    active: bool,
    filter: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let registry = load_registry(config)?;

    let repos: Vec<&Repository> = match filter {
        Some(query) => registry
            .filtered(query)
            .filter(|r| !active || r.has_active_directory)
            .collect(),
        None if active => registry.active().collect(),
        None => registry.all().iter().collect(),
    };

    if json {
        let out = serde_json::to_string_pretty(&repos)
            .map_err(|e| format!("failed to serialize repositories: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if repos.is_empty() {
        println!("No repositories");
        return Ok(());
    }

    for repo in repos {
        println!("{}", format_repository(repo));
    }

    Ok(())
}

fn cmd_open(config: &Config, runner: &SystemRunner, name: &str) -> Result<(), String> {
    let registry = load_registry(config)?;
    let repo = registry
        .by_name(name)
        .or_else(|| registry.by_path(Path::new(name)))
        .ok_or_else(|| format!("no repository named '{name}'"))?;

    if launch::open_repository(runner, repo, config.wsl_distribution())? {
        eprintln!("Opened {}", repo.name);
        Ok(())
    } else {
        Err(format!("failed to open {} ({})", repo.name, repo.kind))
    }
}

async fn cmd_auth(config: &Config, runner: &SystemRunner) -> Result<(), String> {
    if github::is_authenticated(runner, config.gh_config_dir.as_deref()).await {
        println!("Authenticated with GitHub");
        Ok(())
    } else {
        Err("not authenticated with GitHub: install gh and run `gh auth login`".to_string())
    }
}

fn cmd_util_list(config: &Config, filter: Option<&str>) -> Result<(), String> {
    let utilities = load_utilities(config)?;
    let matching: Vec<&Utility> = utilities
        .iter()
        .filter(|u| filter.is_none_or(|q| u.matches(q)))
        .collect();

    if matching.is_empty() {
        println!("No utilities");
        return Ok(());
    }

    for u in matching {
        let admin = if u.requires_admin { "  (admin)" } else { "" };
        println!("{}  {}{admin}", u.name, u.description);
    }

    Ok(())
}

async fn cmd_util_run(config: &Config, runner: &SystemRunner, name: &str) -> Result<(), String> {
    let utilities = load_utilities(config)?;
    let utility = utilities
        .iter()
        .find(|u| u.name == name)
        .ok_or_else(|| format!("no utility named '{name}'"))?;

    let run = utility::run_utility(runner, utility).await;
    if !run.stdout.is_empty() {
        print!("{}", run.stdout);
    }
    if !run.stderr.is_empty() {
        eprint!("{}", run.stderr);
    }

    if run.success {
        Ok(())
    } else {
        Err(format!("utility '{name}' failed"))
    }
}
