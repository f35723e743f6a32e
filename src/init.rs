//! Repository setup: `gitpolicy init`.
//!
//! Installs the pre-push hook script at `.git/hooks/pre-push` and drops a
//! starter `.gitpolicy.yml` in the repository root. Both steps are idempotent
//! and refuse to clobber existing files unless `--force` is given.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::output::Console;

/// The pre-push hook script installed into `.git/hooks/`.
pub const HOOK_SCRIPT: &str = include_str!("../templates/pre-push");

/// The starter configuration written by `init`.
pub const DEFAULT_CONFIG: &str = include_str!("../templates/gitpolicy.yml");

const HOOK_PATH: &str = ".git/hooks/pre-push";

/// Error running `init`.
#[derive(Debug)]
pub enum InitError {
    /// The working directory is not a git repository.
    NotARepo,
    /// A filesystem operation failed.
    Io(&'static str, io::Error),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotARepo => {
                write!(f, "this doesn't appear to be a git repository (no .git directory)")
            }
            Self::Io(what, err) => write!(f, "failed to {what}: {err}"),
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotARepo => None,
            Self::Io(_, err) => Some(err),
        }
    }
}

/// Install the hook and the starter config into the current directory.
pub fn run(force: bool, console: &Console) -> Result<(), InitError> {
    if !Path::new(".git").is_dir() {
        return Err(InitError::NotARepo);
    }

    console.good("GitPolicy initialization");
    install_hook(force, console)?;
    install_config(force, console)?;
    console.good("Done");
    Ok(())
}

fn install_hook(force: bool, console: &Console) -> Result<(), InitError> {
    let hook_path = Path::new(HOOK_PATH);

    if hook_path.exists() && !force {
        let existing = fs::read_to_string(hook_path)
            .map_err(|err| InitError::Io("read the existing pre-push hook", err))?;
        if existing == HOOK_SCRIPT {
            console.good("The pre-push hook is already in place.");
        } else {
            console.warning(
                "This repository already has a pre-push hook. Please ensure manually that it \
                 runs gitpolicy, or re-run with --force to replace it. Continuing...",
            );
        }
        return Ok(());
    }

    fs::create_dir_all(".git/hooks")
        .map_err(|err| InitError::Io("create .git/hooks", err))?;
    fs::write(hook_path, HOOK_SCRIPT)
        .map_err(|err| InitError::Io("write the pre-push hook", err))?;
    make_executable(hook_path)?;
    console.good("Installed the pre-push hook.");
    Ok(())
}

fn install_config(force: bool, console: &Console) -> Result<(), InitError> {
    let config_path = Path::new(DEFAULT_CONFIG_FILE);

    if config_path.exists() && !force {
        console.warning(".gitpolicy.yml already exists. Won't copy the default config in. Continuing...");
        return Ok(());
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .map_err(|err| InitError::Io("write .gitpolicy.yml", err))?;
    console.good(
        "Wrote a starter .gitpolicy.yml into your repository. Have a look and adjust it to \
         your needs.",
    );
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InitError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|err| InitError::Io("mark the pre-push hook executable", err))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InitError> {
    Ok(())
}
