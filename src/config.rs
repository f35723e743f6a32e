//! `.gitpolicy.yml` loading and compilation.
//!
//! The configuration is a nested mapping keyed first by ref kind. All inner
//! mappings keep their document order, which in turn fixes the order of the
//! printed messages.
//!
//! # Example config file
//!
//! ```yaml
//! tag:
//!   forbidden:
//!     delete: 'Deleting tags is forbidden.'
//!     update: 'Overwriting an existing tag is forbidden.'
//!   name:
//!     required_patterns:
//!       '/^v?\d+\.\d+\.\d+$/': 'Tag names must look like 1.2.3 or v1.2.3.'
//!   after_push_messages:
//!     create: 'New tag pushed - remember to update the changelog.'
//!
//! branch:
//!   forbidden:
//!     delete: 'Deleting remote branches is forbidden.'
//!   name:
//!     forbidden:
//!       master: 'Do not push to master directly.'
//!     forbidden_patterns:
//!       '/^wip/i': 'Do not push wip branches.'
//! ```
//!
//! Pattern strings follow the preg-style delimited convention historically
//! used in these files: a non-alphanumeric delimiter around the body plus
//! optional trailing `imsx` flags (`'/^v/i'`). Bare regexes without delimiters
//! are accepted too. Patterns are parsed and compiled once at load time; a
//! malformed entry is skipped and surfaced as a warning instead of aborting
//! the whole evaluation.

use fancy_regex::Regex;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::classify::{PushState, RefKind};

/// Default config filename, looked up in the repository root.
pub const DEFAULT_CONFIG_FILE: &str = ".gitpolicy.yml";

/// Raw policy configuration, one section per ref kind. Missing keys at any
/// depth mean "no rule", never an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub tag: Option<RefPolicy>,
    #[serde(default)]
    pub branch: Option<RefPolicy>,
}

/// The rules for one ref kind.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefPolicy {
    /// State flag name -> violation message.
    #[serde(default)]
    pub forbidden: IndexMap<String, String>,

    /// Rules about the ref name itself.
    #[serde(default)]
    pub name: Option<NamePolicy>,

    /// State flag name -> informational message printed after a passed check.
    #[serde(default)]
    pub after_push_messages: IndexMap<String, String>,
}

/// Ref-name rules: exact names, forbidden patterns, required patterns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamePolicy {
    /// Exact ref name -> violation message.
    #[serde(default)]
    pub forbidden: IndexMap<String, String>,

    /// Pattern -> message, violated when the pattern matches the ref name.
    #[serde(default)]
    pub forbidden_patterns: IndexMap<String, String>,

    /// Pattern -> message, violated when the pattern does NOT match.
    #[serde(default)]
    pub required_patterns: IndexMap<String, String>,
}

/// Error loading the configuration file.
#[derive(Debug)]
pub enum ConfigError {
    /// The config file does not exist.
    NotFound(PathBuf),
    /// The config file exists but could not be read.
    Io(PathBuf, io::Error),
    /// The config file is not valid YAML for the policy schema.
    Parse(PathBuf, serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(
                f,
                "{} not found. Maybe you want to run `gitpolicy init`?",
                path.display()
            ),
            Self::Io(path, err) => write!(f, "failed to read {}: {err}", path.display()),
            Self::Parse(path, err) => write!(f, "failed to parse {}: {err}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(_, err) => Some(err),
            Self::Parse(_, err) => Some(err),
        }
    }
}

impl PolicyConfig {
    /// Load the raw configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        // An empty file is an empty policy, not a parse error.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|err| ConfigError::Parse(path.to_path_buf(), err))
    }

    /// Compile all rules into their evaluated form, collecting a warning per
    /// skipped rule.
    pub fn compile(&self) -> CompiledPolicy {
        let mut warnings = Vec::new();
        let tag = CompiledSection::build(self.tag.as_ref(), RefKind::Tag, &mut warnings);
        let branch = CompiledSection::build(self.branch.as_ref(), RefKind::Branch, &mut warnings);
        CompiledPolicy {
            tag,
            branch,
            warnings,
        }
    }
}

/// A policy with all patterns compiled, ready for evaluation.
#[derive(Debug, Default)]
pub struct CompiledPolicy {
    tag: CompiledSection,
    branch: CompiledSection,
    /// One line per rule skipped during compilation.
    pub warnings: Vec<String>,
}

impl CompiledPolicy {
    /// The section applicable to one ref kind. A kind without configured
    /// rules yields an empty section.
    pub const fn section(&self, kind: RefKind) -> &CompiledSection {
        match kind {
            RefKind::Tag => &self.tag,
            RefKind::Branch => &self.branch,
        }
    }
}

/// The compiled rules for one ref kind, empty when the config has none.
#[derive(Debug, Default)]
pub struct CompiledSection {
    /// Forbidden state flags, in config order. Unknown flag names are
    /// dropped, matching the original's silent key intersection.
    pub forbidden: Vec<(PushState, String)>,
    /// Exact forbidden ref names.
    pub name_forbidden: IndexMap<String, String>,
    /// Patterns that must not match the ref name, in config order.
    pub forbidden_patterns: Vec<(PolicyPattern, String)>,
    /// Patterns that must match the ref name, in config order.
    pub required_patterns: Vec<(PolicyPattern, String)>,
    /// Post-push messages keyed by state flag, in config order.
    pub after_push: Vec<(PushState, String)>,
}

impl CompiledSection {
    fn build(raw: Option<&RefPolicy>, kind: RefKind, warnings: &mut Vec<String>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let mut section = Self {
            forbidden: states_in_order(&raw.forbidden),
            after_push: states_in_order(&raw.after_push_messages),
            ..Self::default()
        };

        if let Some(name) = &raw.name {
            section.name_forbidden = name
                .forbidden
                .iter()
                .filter(|(_, message)| !message.trim().is_empty())
                .map(|(key, message)| (key.clone(), message.clone()))
                .collect();
            section.forbidden_patterns =
                compile_patterns(&name.forbidden_patterns, kind, "forbidden_patterns", warnings);
            section.required_patterns =
                compile_patterns(&name.required_patterns, kind, "required_patterns", warnings);
        }

        section
    }
}

// Rules with blank messages are dropped: a push only fails when it produces
// visible output, so a message-less rule can never fire.
fn states_in_order(map: &IndexMap<String, String>) -> Vec<(PushState, String)> {
    map.iter()
        .filter(|(_, message)| !message.trim().is_empty())
        .filter_map(|(key, message)| {
            PushState::from_key(key).map(|state| (state, message.clone()))
        })
        .collect()
}

fn compile_patterns(
    map: &IndexMap<String, String>,
    kind: RefKind,
    rule: &str,
    warnings: &mut Vec<String>,
) -> Vec<(PolicyPattern, String)> {
    map.iter()
        .filter(|(_, message)| !message.trim().is_empty())
        .filter_map(|(raw, message)| match PolicyPattern::parse(raw) {
            Ok(pattern) => Some((pattern, message.clone())),
            Err(err) => {
                warnings.push(format!(
                    "skipping invalid pattern in {}.name.{rule}: {err}",
                    kind.config_key()
                ));
                None
            }
        })
        .collect()
}

/// A ref-name pattern from the config, compiled once at load time.
///
/// Matching is a search (found anywhere in the ref name) unless the pattern
/// itself anchors.
#[derive(Debug)]
pub struct PolicyPattern {
    regex: Regex,
    raw: String,
}

/// A pattern string that did not compile.
#[derive(Debug)]
pub struct PatternError {
    raw: String,
    source: fancy_regex::Error,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.raw, self.source)
    }
}

impl std::error::Error for PatternError {}

impl PolicyPattern {
    /// Parse a delimited (`/body/flags`) or bare pattern string and compile it.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let expr = match split_delimited(raw) {
            Some((body, flags)) if flags.is_empty() => body.to_string(),
            Some((body, flags)) => format!("(?{flags}){body}"),
            None => raw.to_string(),
        };
        let regex = Regex::new(&expr).map_err(|source| PatternError {
            raw: raw.to_string(),
            source,
        })?;
        Ok(Self {
            regex,
            raw: raw.to_string(),
        })
    }

    /// Whether the pattern is found in the given ref name.
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack).unwrap_or(false)
    }

    /// The pattern exactly as written in the config.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Split a preg-style `<delim>body<delim>flags` string into body and flags.
/// Returns `None` for strings that don't follow the convention, which are
/// then compiled as bare regexes.
fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let delim = raw.chars().next()?;
    if delim.is_ascii_alphanumeric() || delim == '\\' || delim.is_whitespace() {
        return None;
    }
    let body_start = delim.len_utf8();
    let closing = raw[body_start..].rfind(delim)?;
    let body = &raw[body_start..body_start + closing];
    let flags = &raw[body_start + closing + delim.len_utf8()..];
    if flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'x')) {
        Some((body, flags))
    } else {
        None
    }
}
