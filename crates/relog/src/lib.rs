//! The `relog` CLI: validate, query, and append to conventional Markdown
//! changelogs.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;

mod cmd;
mod config;
mod fs;

#[derive(Debug, Parser)]
#[command(
    name = "relog",
    about = "Maintain and validate conventional Markdown changelogs",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Path to the changelog document (default: CHANGELOG.md)
    #[arg(long, global = true, env = "RELOG_CHANGELOG")]
    path: Option<PathBuf>,

    /// Path to the configuration file (default: relog.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log what the tool is doing (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate the changelog and report every problem found
    Check {
        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,
        /// Report problems as JSON instead of rendered diagnostics
        #[arg(long)]
        json: bool,
    },
    /// Print one release's recorded notes (the newest when omitted)
    #[command(disable_version_flag = true)]
    Show {
        /// The version to look up, e.g. 1.4.0
        version: Option<String>,
        /// Print the parsed entry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a new release entry built from conventional commit messages
    #[command(disable_version_flag = true)]
    Add {
        /// Commit messages, each optionally prefixed with an abbreviated
        /// hash (the shape of `git log --format="%h %s"`)
        #[arg(required_unless_present = "version")]
        messages: Vec<String>,
        /// The bump rule to apply instead of deriving one from the messages
        #[arg(long, conflicts_with = "version")]
        rule: Option<RuleArg>,
        /// Record exactly this version instead of bumping
        #[arg(long)]
        version: Option<String>,
        /// Prerelease label for `--rule pre` (default: rc)
        #[arg(long)]
        pre_label: Option<String>,
        /// Release date, YYYY-MM-DD (default: today, UTC)
        #[arg(long)]
        date: Option<String>,
        /// Print the entry that would be added without writing the file
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the version the next release would get
    Bump {
        /// Commit messages to derive the bump rule from
        messages: Vec<String>,
        /// The bump rule to apply instead of deriving one from the messages
        #[arg(long)]
        rule: Option<RuleArg>,
        /// Prerelease label for `--rule pre` (default: rc)
        #[arg(long)]
        pre_label: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum RuleArg {
    Major,
    Minor,
    Patch,
    Pre,
    Release,
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// Any problem running the command, already wrapped for reporting.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("relog=debug,relog_changelog=debug")
    } else {
        return;
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run an already-parsed invocation.
///
/// # Errors
///
/// Any problem running the command, already wrapped for reporting.
pub fn execute(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    let path = cli
        .path
        .or_else(|| config.changelog_path())
        .unwrap_or_else(|| PathBuf::from("CHANGELOG.md"));
    let sections = config.sections();

    match cli.command {
        Command::Check { strict, json } => cmd::check::run(&path, &sections, strict, json),
        Command::Show { version, json } => {
            cmd::show::run(&path, &sections, version.as_deref(), json)
        }
        Command::Add {
            messages,
            rule,
            version,
            pre_label,
            date,
            dry_run,
        } => cmd::add::run(
            &path,
            &sections,
            config.repo_urls(),
            &cmd::add::Options {
                messages,
                rule,
                version,
                pre_label,
                date,
                dry_run,
            },
        ),
        Command::Bump {
            messages,
            rule,
            pre_label,
        } => cmd::bump::run(&path, &sections, &messages, rule, pre_label.as_deref()),
    }
}
