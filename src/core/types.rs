//! core::types
//!
//! Strong types for the identifiers that flow between the resolver, the
//! snapshot store, and the git doorway.
//!
//! # Types
//!
//! - [`Oid`] - Full git object identifier (commit or tree)
//! - [`BranchName`] - Validated branch name
//! - [`Reference`] - What a caller asked to see: the default branch, a
//!   named branch, or an explicit commit
//!
//! # Examples
//!
//! ```
//! use gitblog::core::types::{BranchName, Oid, Reference};
//!
//! let oid = Oid::new("ABC123DEF4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
//!
//! let reference = Reference::branch("main").unwrap();
//! assert_eq!(reference.cache_key(&BranchName::new("master").unwrap()), "branch:main");
//!
//! assert!(Oid::new("not-a-sha").is_err());
//! assert!(Reference::commit("zz").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid commit reference: {0}")]
    InvalidCommitRef(String),
}

/// A validated git branch name.
///
/// Follows the subset of `git check-ref-format` rules that matter for
/// looking a branch up: no empty names, no `..`, `@{` or `//`, no leading
/// `.`/`-`, no trailing `/` or `.lock`, and none of the characters git
/// reserves for revision syntax.
///
/// ```
/// use gitblog::core::types::BranchName;
///
/// assert!(BranchName::new("posts/drafts").is_ok());
/// assert!(BranchName::new("has space").is_err());
/// assert!(BranchName::new("@").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| TypeError::InvalidBranchName(reason.into()))?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), &'static str> {
        const FORBIDDEN_SEQUENCES: [(&str, &str); 3] = [
            ("..", "branch name cannot contain '..'"),
            ("@{", "branch name cannot contain '@{'"),
            ("//", "branch name cannot contain '//'"),
        ];
        const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

        if name.is_empty() {
            return Err("branch name cannot be empty");
        }
        if name == "@" {
            return Err("branch name cannot be '@'");
        }
        if name.starts_with('-') {
            return Err("branch name cannot start with '-'");
        }
        if name.ends_with('/') {
            return Err("branch name cannot end with '/'");
        }
        for (sequence, reason) in FORBIDDEN_SEQUENCES {
            if name.contains(sequence) {
                return Err(reason);
            }
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || FORBIDDEN_CHARS.contains(&c))
        {
            return Err("branch name contains a reserved character");
        }
        if name
            .split('/')
            .any(|part| part.starts_with('.') || part.ends_with(".lock"))
        {
            return Err("path components cannot start with '.' or end with '.lock'");
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A full git object identifier, normalized to lowercase hex.
///
/// Both SHA-1 (40 hex characters) and SHA-256 (64) object formats are
/// accepted. Abbreviated ids are not: every id stored in a cache key has
/// already been resolved by the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a full hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// Abbreviated form for log lines.
    ///
    /// ```
    /// use gitblog::core::types::Oid;
    ///
    /// let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
    /// assert_eq!(oid.short(7), "abc123d");
    /// ```
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The view a caller asked for.
///
/// A reference is transient: it lives for one request and is resolved to a
/// `(tree, commit)` pair before anything is read from the snapshot cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Reference {
    /// The configured default branch.
    #[default]
    Default,
    /// A named branch; its head moves over time.
    Branch(BranchName),
    /// An explicit (possibly abbreviated) commit id.
    Commit(String),
}

impl Reference {
    /// Reference a named branch.
    pub fn branch(name: impl Into<String>) -> Result<Self, TypeError> {
        Ok(Reference::Branch(BranchName::new(name)?))
    }

    /// Reference a commit by id. Abbreviations of at least 4 hex digits are
    /// accepted and expanded by the repository at resolution time.
    pub fn commit(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into().to_ascii_lowercase();
        if id.len() < 4 || id.len() > 64 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidCommitRef(id));
        }
        Ok(Reference::Commit(id))
    }

    /// Build a reference from optional `--branch` / `--commit` style inputs.
    ///
    /// A branch wins over a commit when both are given, matching the route
    /// order of the site (`/branch/:branch` before `/commit/:commit`).
    pub fn from_parts(branch: Option<&str>, commit: Option<&str>) -> Result<Self, TypeError> {
        match (branch, commit) {
            (Some(branch), _) if !branch.is_empty() => Self::branch(branch),
            (_, Some(commit)) if !commit.is_empty() => Self::commit(commit),
            _ => Ok(Reference::Default),
        }
    }

    /// Key under which the resolution of this reference is cached.
    ///
    /// The default reference shares its key with an explicit reference to
    /// the default branch, so both observe the same branch head.
    pub fn cache_key(&self, default_branch: &BranchName) -> String {
        match self {
            Reference::Default => format!("branch:{default_branch}"),
            Reference::Branch(name) => format!("branch:{name}"),
            Reference::Commit(id) => format!("commit:{id}"),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::Default => f.write_str("default branch"),
            Reference::Branch(name) => write!(f, "branch '{name}'"),
            Reference::Commit(id) => write!(f, "commit {id}"),
        }
    }
}
