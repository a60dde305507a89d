// local-agent-core/src/search.rs
// ============================================================================
// Module: Bounded Search
// Description: Depth- and count-limited file name search under sandbox roots.
// Purpose: Let callers locate files without granting an unbounded directory walk.
// Dependencies: std, serde, thiserror
// ============================================================================

//! ## Overview
//! [`search_roots`] walks each root depth-first, visiting entries in name
//! order so results are deterministic. Entries directly under a root are at
//! depth 0; a directory at `max_depth` is matched but never entered. Symbolic
//! links are matched by name but never followed, so every hit is a literal
//! descendant of a root. Directories named in the skip list are neither
//! matched nor entered. Unreadable directories are skipped.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LENGTH: usize = 256;
/// Default result cap.
pub const DEFAULT_MAX_RESULTS: usize = 30;
/// Default traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Traversal limits for a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Maximum number of paths returned.
    pub max_results: usize,
    /// Deepest entry depth visited (root entries are depth 0).
    pub max_depth: usize,
    /// Directory names never matched or entered (case-insensitive).
    pub skip_dirs: Vec<String>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            max_depth: DEFAULT_MAX_DEPTH,
            skip_dirs: vec![".git".to_string(), "node_modules".to_string()],
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Search request errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Query is empty or whitespace.
    #[error("Missing search query")]
    MissingQuery,
    /// Query exceeds [`MAX_QUERY_LENGTH`].
    #[error("Search query exceeds {MAX_QUERY_LENGTH} bytes")]
    QueryTooLong,
}

// ============================================================================
// SECTION: Search
// ============================================================================

/// Searches the roots for entries whose name contains `query`, ignoring case.
///
/// # Errors
///
/// Returns [`SearchError`] when the query is empty or too long.
pub fn search_roots(
    roots: &[PathBuf],
    query: &str,
    limits: &SearchLimits,
) -> Result<Vec<PathBuf>, SearchError> {
    let needle = query.trim();
    if needle.is_empty() {
        return Err(SearchError::MissingQuery);
    }
    if needle.len() > MAX_QUERY_LENGTH {
        return Err(SearchError::QueryTooLong);
    }
    let mut walk = Walk {
        needle: needle.to_lowercase(),
        limits,
        skip: limits.skip_dirs.iter().map(|name| name.to_lowercase()).collect(),
        seen: BTreeSet::new(),
        hits: Vec::new(),
    };
    for root in roots {
        if walk.full() {
            break;
        }
        walk.visit(root, 0);
    }
    Ok(walk.hits)
}

/// Mutable traversal state for one search.
struct Walk<'a> {
    /// Lower-cased query.
    needle: String,
    /// Traversal limits.
    limits: &'a SearchLimits,
    /// Lower-cased skip list.
    skip: BTreeSet<String>,
    /// Paths already reported (nested roots).
    seen: BTreeSet<PathBuf>,
    /// Collected hits in visit order.
    hits: Vec<PathBuf>,
}

impl Walk<'_> {
    /// Returns true once the result cap is reached.
    fn full(&self) -> bool {
        self.hits.len() >= self.limits.max_results
    }

    /// Lists `dir`, whose entries sit at `depth`.
    fn visit(&mut self, dir: &Path, depth: usize) {
        let Ok(read_dir) = fs::read_dir(dir) else {
            return;
        };
        let mut entries: Vec<fs::DirEntry> = read_dir.filter_map(Result::ok).collect();
        entries.sort_by_key(fs::DirEntry::file_name);
        for entry in entries {
            if self.full() {
                return;
            }
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if file_type.is_dir() && self.skip.contains(&name) {
                continue;
            }
            let path = entry.path();
            if name.contains(&self.needle) && self.seen.insert(path.clone()) {
                self.hits.push(path.clone());
            }
            if file_type.is_dir() && depth < self.limits.max_depth {
                self.visit(&path, depth + 1);
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
