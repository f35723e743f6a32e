//! gitpolicy: a git pre-push hook that checks ref updates against a
//! declarative policy in `.gitpolicy.yml`.
//!
//! Exit behavior:
//!   - Exit 0: push accepted (post-push messages may be printed)
//!   - Exit 1: push rejected by policy (violations printed to stderr)
//!   - Exit 2: configuration or setup error

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gitpolicy::classify::{PushEvent, classify};
use gitpolicy::config::{DEFAULT_CONFIG_FILE, PolicyConfig};
use gitpolicy::init;
use gitpolicy::output::Console;
use gitpolicy::policy::{notify, select_section, verify};

#[derive(Debug, Parser)]
#[command(name = "gitpolicy", version, about = "Checks git pushes against a declarative ref policy")]
struct Cli {
    /// Disable colored output (colors also back off for non-terminals and NO_COLOR).
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate one pre-push ref update (called by the installed hook).
    Check {
        /// Name of the local ref being pushed.
        #[arg(long)]
        local_ref: String,

        /// Commit hash of the local ref.
        #[arg(long)]
        local_sha: String,

        /// Name of the ref on the remote.
        #[arg(long)]
        remote_ref: String,

        /// Commit hash the remote ref currently points at.
        #[arg(long)]
        remote_sha: String,

        /// Path to the policy file.
        #[arg(long, env = "GITPOLICY_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },

    /// Install the pre-push hook and a starter .gitpolicy.yml.
    Init {
        /// Replace an existing hook or config file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }
    let console = Console;

    match cli.command {
        Command::Check {
            local_ref,
            local_sha,
            remote_ref,
            remote_sha,
            config,
        } => run_check(
            &PushEvent {
                local_ref,
                local_sha,
                remote_ref,
                remote_sha,
            },
            &config,
            &console,
        ),
        Command::Init { force } => match init::run(force, &console) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                console.error(&err.to_string());
                ExitCode::from(2)
            }
        },
    }
}

fn run_check(event: &PushEvent, config_path: &Path, console: &Console) -> ExitCode {
    console.good("Checking GitPolicy");

    let config = match PolicyConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            console.error(&err.to_string());
            return ExitCode::from(2);
        }
    };
    let policy = config.compile();
    for warning in &policy.warnings {
        console.warning(warning);
    }

    let push = classify(event);
    tracing::debug!(
        kind = push.ref_kind.config_key(),
        ref_name = %push.ref_name,
        refs_differ = push.refs_differ,
        "classified push"
    );

    let section = select_section(&policy, &push);
    let verdict = verify(section, &push);
    for message in &verdict.violations {
        console.error(message);
    }

    if !verdict.passed {
        console.error("Stopping :/");
        return ExitCode::FAILURE;
    }

    for message in notify(section, &push) {
        console.good(&message);
    }
    console.good("Done :)");
    ExitCode::SUCCESS
}
