//! Push classification.
//!
//! Turns the four raw strings git hands a pre-push hook for one ref update
//! into a structured view: what kind of ref is moving, its short name, and
//! whether the push creates, updates, or deletes it.
//!
//! Classification is a pure function and total over any string input. Empty
//! strings are treated literally (an empty remote ref yields branch kind and
//! an empty name).

/// The 40-zero hash git uses for "this side of the update does not exist".
pub const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

/// Local ref token git sends when a remote ref is being deleted.
pub const DELETED_REF: &str = "(deleted)";

/// One pre-push hook invocation's ref/hash tuple, as received from git.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub local_ref: String,
    pub local_sha: String,
    pub remote_ref: String,
    pub remote_sha: String,
}

/// The kind of ref being pushed. Anything that is not a tag is treated as a
/// branch; there is no intention to process other ref namespaces for now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    Branch,
}

impl RefKind {
    /// The top-level config section key for this kind.
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Branch => "branch",
        }
    }
}

/// A named state flag of a push.
///
/// These replace the original string-keyed state map: config files still refer
/// to them by name (`tag`, `branch`, `create`, `update`, `delete`), but
/// internally lookups are exhaustive and typo-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushState {
    Tag,
    Branch,
    Create,
    Update,
    Delete,
}

impl PushState {
    /// All states, in the order they are reported.
    pub const ALL: [Self; 5] = [
        Self::Tag,
        Self::Branch,
        Self::Create,
        Self::Update,
        Self::Delete,
    ];

    /// The name used for this state in `.gitpolicy.yml`.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Tag => "tag",
            Self::Branch => "branch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse a config key into a state. Unknown keys yield `None` and are
    /// skipped by the evaluator, never an error.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "tag" => Some(Self::Tag),
            "branch" => Some(Self::Branch),
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Structured view of one push, derived once per invocation and immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushClassification {
    /// Tag iff the remote ref lives under `refs/tags/`, else branch.
    pub ref_kind: RefKind,
    /// Remote ref with the leading `refs/<segment>/` stripped.
    pub ref_name: String,
    /// Whether local and remote ref names differ.
    pub refs_differ: bool,
    states: [bool; 5],
}

impl PushClassification {
    /// Whether the given state flag holds for this push.
    pub const fn is(&self, state: PushState) -> bool {
        self.states[state as usize]
    }
}

/// Classify one push event.
///
/// The create/update/delete flags are computed independently from the hash
/// sentinels; in valid git usage at most one of create/delete holds, but
/// nothing here assumes that.
pub fn classify(event: &PushEvent) -> PushClassification {
    let is_tag = event.remote_ref.starts_with("refs/tags/");
    let is_branch = event.remote_ref.starts_with("refs/heads/");

    let mut states = [false; 5];
    states[PushState::Tag as usize] = is_tag;
    states[PushState::Branch as usize] = is_branch;
    states[PushState::Create as usize] = event.remote_sha == ZERO_SHA;
    states[PushState::Update as usize] =
        event.local_sha != ZERO_SHA && event.remote_sha != ZERO_SHA;
    states[PushState::Delete as usize] =
        event.local_ref == DELETED_REF || event.local_sha == ZERO_SHA;

    PushClassification {
        ref_kind: if is_tag { RefKind::Tag } else { RefKind::Branch },
        ref_name: short_ref_name(&event.remote_ref),
        refs_differ: event.local_ref != event.remote_ref,
        states,
    }
}

/// Strip the first `refs/<segment>/` prefix, keeping everything after it.
/// Refs without such a prefix are returned unchanged, so nested branch names
/// like `refs/heads/feature/login` shorten to `feature/login`.
fn short_ref_name(remote_ref: &str) -> String {
    if let Some(rest) = remote_ref.strip_prefix("refs/") {
        if let Some(slash) = rest.find('/') {
            return rest[slash + 1..].to_string();
        }
    }
    remote_ref.to_string()
}
