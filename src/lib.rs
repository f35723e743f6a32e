//! Declarative push policies for git repositories.
//!
//! gitpolicy is a pre-push hook: git hands it the local/remote ref names and
//! commit hashes of each ref update, and the hook checks the update against
//! the rules in the repository's `.gitpolicy.yml`.
//!
//! The crate is split into a pure core and thin glue:
//!
//! - [`classify`] derives the structured push view (tag vs branch,
//!   create/update/delete) from the four raw inputs.
//! - [`config`] loads and compiles `.gitpolicy.yml`, including the delimited
//!   regex convention used in pattern rules.
//! - [`policy`] evaluates a compiled section against a classification and
//!   returns a [`policy::Verdict`]; it never exits the process.
//! - [`output`] and [`init`] cover console styling and repository setup.

pub mod classify;
pub mod config;
pub mod init;
pub mod output;
pub mod policy;
