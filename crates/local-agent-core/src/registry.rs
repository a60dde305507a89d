// local-agent-core/src/registry.rs
// ============================================================================
// Module: Static Registries
// Description: Immutable allowlists for applications, URLs, and projects.
// Purpose: Resolve caller-facing symbolic ids to concrete, pre-approved resources.
// Dependencies: serde, thiserror, url
// ============================================================================

//! ## Overview
//! Registries are loaded once at startup and are read-only afterwards. Ids are
//! normalized to lower case on lookup, so `Chrome` and `chrome` name the same
//! entry. Every entry is validated when the registry is built: an invalid
//! registry never reaches the router.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a registry id.
pub const MAX_REGISTRY_ID_LENGTH: usize = 64;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Registry lookup and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// App id is not in the allowlist.
    #[error("App not allowed")]
    AppNotAllowed,
    /// No candidate path for the app exists on disk.
    #[error("Executable not found for {0}")]
    ExecutableNotFound(String),
    /// URL id is not registered.
    #[error("Unknown url id")]
    UnknownUrlId,
    /// Literal URL is not http/https.
    #[error("Invalid URL (must be http/https)")]
    InvalidUrl,
    /// Project id is not registered.
    #[error("Unknown project")]
    UnknownProject,
    /// Registry id does not match `[a-z0-9_-]{1,64}`.
    #[error("invalid registry id: {0}")]
    InvalidId(String),
    /// Registry entry failed startup validation.
    #[error("invalid registry entry {id}: {reason}")]
    InvalidEntry {
        /// Offending id.
        id: String,
        /// Validation failure.
        reason: String,
    },
}

impl RegistryError {
    /// Returns true when the error comes from a side-effect-free lookup miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ExecutableNotFound(_) | Self::UnknownUrlId | Self::UnknownProject)
    }
}

// ============================================================================
// SECTION: Entries
// ============================================================================

/// Launch descriptor for an allowlisted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AppEntry {
    /// A single program name assumed resolvable on the host search path.
    Program {
        /// Program name or path.
        program: String,
    },
    /// Ordered absolute path candidates; the first existing file wins.
    Candidates {
        /// Candidate executable paths.
        paths: Vec<PathBuf>,
    },
}

/// Registered project folder and its open behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    /// Absolute project folder.
    pub folder: PathBuf,
    /// Reveal the folder in the host file browser.
    #[serde(default)]
    pub reveal: bool,
    /// Open the folder in the configured editor.
    #[serde(default)]
    pub open_in_editor: bool,
}

// ============================================================================
// SECTION: App Registry
// ============================================================================

/// Allowlisted applications keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppRegistry {
    /// Validated entries.
    entries: BTreeMap<String, AppEntry>,
}

impl AppRegistry {
    /// Builds and validates an application registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when an id or entry is invalid.
    pub fn new(entries: BTreeMap<String, AppEntry>) -> Result<Self, RegistryError> {
        for (id, entry) in &entries {
            validate_id(id)?;
            match entry {
                AppEntry::Program {
                    program,
                } => {
                    if program.trim().is_empty() {
                        return Err(invalid_entry(id, "program must be non-empty"));
                    }
                }
                AppEntry::Candidates {
                    paths,
                } => {
                    if paths.is_empty() {
                        return Err(invalid_entry(id, "candidate list must be non-empty"));
                    }
                    if paths.iter().any(|path| !path.is_absolute()) {
                        return Err(invalid_entry(id, "candidate paths must be absolute"));
                    }
                }
            }
        }
        Ok(Self {
            entries,
        })
    }

    /// Looks up an app entry by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AppNotAllowed`] for unregistered ids.
    pub fn lookup(&self, app_id: &str) -> Result<&AppEntry, RegistryError> {
        self.entries.get(&normalize_id(app_id)).ok_or(RegistryError::AppNotAllowed)
    }

    /// Resolves an app id to the program that should be launched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AppNotAllowed`] for unregistered ids and
    /// [`RegistryError::ExecutableNotFound`] when no candidate exists.
    pub fn resolve_executable(&self, app_id: &str) -> Result<PathBuf, RegistryError> {
        let id = normalize_id(app_id);
        match self.entries.get(&id).ok_or(RegistryError::AppNotAllowed)? {
            AppEntry::Program {
                program,
            } => Ok(PathBuf::from(program)),
            AppEntry::Candidates {
                paths,
            } => find_first_existing(paths).ok_or(RegistryError::ExecutableNotFound(id)),
        }
    }

    /// Returns the registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Returns the first candidate that exists as a file.
#[must_use]
pub fn find_first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|candidate| Path::new(candidate).is_file()).cloned()
}

// ============================================================================
// SECTION: URL Registry
// ============================================================================

/// Allowlisted URLs keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRegistry {
    /// Validated URLs.
    entries: BTreeMap<String, Url>,
}

impl UrlRegistry {
    /// Builds a URL registry, validating every URL as http/https.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when an id or URL is invalid.
    pub fn new(entries: BTreeMap<String, String>) -> Result<Self, RegistryError> {
        let mut validated = BTreeMap::new();
        for (id, raw) in entries {
            validate_id(&id)?;
            let url = parse_http_url(&raw)
                .map_err(|_| invalid_entry(&id, "url must be an absolute http/https URL"))?;
            validated.insert(id, url);
        }
        Ok(Self {
            entries: validated,
        })
    }

    /// Looks up a URL by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownUrlId`] for unregistered ids.
    pub fn lookup(&self, url_id: &str) -> Result<&Url, RegistryError> {
        self.entries.get(&normalize_id(url_id)).ok_or(RegistryError::UnknownUrlId)
    }

    /// Returns the registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Validates a literal URL: `http://` or `https://` prefix and a parseable host.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidUrl`] for anything else.
pub fn parse_http_url(raw: &str) -> Result<Url, RegistryError> {
    let trimmed = raw.trim();
    let lowered = trimmed.get(.. 8).unwrap_or(trimmed).to_ascii_lowercase();
    if !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
        return Err(RegistryError::InvalidUrl);
    }
    let url = Url::parse(trimmed).map_err(|_| RegistryError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(RegistryError::InvalidUrl);
    }
    Ok(url)
}

// ============================================================================
// SECTION: Project Registry
// ============================================================================

/// Registered projects keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRegistry {
    /// Validated entries.
    entries: BTreeMap<String, ProjectEntry>,
}

impl ProjectRegistry {
    /// Builds and validates a project registry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when an id or folder is invalid.
    pub fn new(entries: BTreeMap<String, ProjectEntry>) -> Result<Self, RegistryError> {
        for (id, entry) in &entries {
            validate_id(id)?;
            if !entry.folder.is_absolute() {
                return Err(invalid_entry(id, "project folder must be absolute"));
            }
        }
        Ok(Self {
            entries,
        })
    }

    /// Looks up a project by id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownProject`] for unregistered ids.
    pub fn lookup(&self, project_id: &str) -> Result<&ProjectEntry, RegistryError> {
        self.entries.get(&normalize_id(project_id)).ok_or(RegistryError::UnknownProject)
    }

    /// Returns the registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Trims a caller-supplied id and lower-cases its ASCII letters.
///
/// Non-ASCII characters pass through unchanged so they can never fold onto
/// a registered id.
#[must_use]
pub fn normalize_id(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// Checks an id against `[a-z0-9_-]{1,64}`.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidId`] when the id does not match.
pub fn validate_id(id: &str) -> Result<(), RegistryError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_REGISTRY_ID_LENGTH
        && id.bytes().all(|byte| matches!(byte, b'a' ..= b'z' | b'0' ..= b'9' | b'_' | b'-'));
    if valid { Ok(()) } else { Err(RegistryError::InvalidId(id.to_string())) }
}

/// Builds an [`RegistryError::InvalidEntry`].
fn invalid_entry(id: &str, reason: &str) -> RegistryError {
    RegistryError::InvalidEntry {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
