// local-agent-core/src/sandbox.rs
// ============================================================================
// Module: Path Sandbox
// Description: Resolution and boundary checks for caller-supplied paths.
// Purpose: Guarantee file operations never act outside configured roots.
// Dependencies: std, thiserror
// ============================================================================

//! ## Overview
//! The sandbox turns an untrusted path string into a [`SandboxedPath`], the
//! only type accepted by file-touching handlers. Resolution is total before the
//! boundary check: the input is made absolute, `.`/`..` segments are collapsed
//! lexically, and the longest existing ancestor is canonicalized so symbolic
//! links inside a root cannot point outside it. The boundary check compares
//! path components, so a root `/data/projects` never admits `/data/projects2`.
//!
//! A resolved path carries two forms. The target form follows every link and
//! is what the boundary check sees. The entry form resolves only the parent,
//! so the final component names the directory entry the caller asked for;
//! removing a symbolic link acts on the link, never on what it points to.
//!
//! ## Invariants
//! - Both forms of a [`SandboxedPath`] are equal to, or descend from, a root.
//! - Roots are fixed at construction and never mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum total path length accepted from callers.
pub const MAX_PATH_LENGTH: usize = 4096;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Path sandbox errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// Resolved path lies outside every root.
    #[error("Path not allowed")]
    NotAllowed,
    /// Caller did not supply a path.
    #[error("Missing path")]
    MissingPath,
    /// Path exceeds total or per-component length limits.
    #[error("Path exceeds length limits")]
    TooLong,
    /// Sandbox was built without any root.
    #[error("sandbox requires at least one root")]
    NoRoots,
    /// A configured root is not absolute.
    #[error("sandbox root must be absolute: {0}")]
    RelativeRoot(String),
    /// Relative input could not be anchored.
    #[error("unable to determine working directory")]
    WorkingDirectory,
}

// ============================================================================
// SECTION: Sandboxed Path
// ============================================================================

/// A fully resolved path proven to lie inside the sandbox.
///
/// Only [`PathSandbox::resolve`] constructs this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedPath {
    /// Resolved absolute path with every link followed.
    path: PathBuf,
    /// Canonical parent joined with the final component as named.
    entry: PathBuf,
}

impl SandboxedPath {
    /// Returns the resolved path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Returns the directory entry the caller named, without following a
    /// link in the final component.
    #[must_use]
    pub fn entry_path(&self) -> &Path {
        &self.entry
    }

    /// Consumes the wrapper and returns the resolved path.
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for SandboxedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SandboxedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

// ============================================================================
// SECTION: Sandbox
// ============================================================================

/// Immutable set of allowed root directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSandbox {
    /// Resolved roots in configuration order, deduplicated.
    roots: Vec<PathBuf>,
}

impl PathSandbox {
    /// Builds a sandbox from absolute root directories.
    ///
    /// Roots that do not exist yet are resolved as far as the filesystem
    /// allows and kept; they simply admit nothing until created.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError`] when no roots are given or a root is relative.
    pub fn new<I, P>(roots: I) -> Result<Self, SandboxError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut resolved: Vec<PathBuf> = Vec::new();
        for root in roots {
            let root = root.into();
            if !root.is_absolute() {
                return Err(SandboxError::RelativeRoot(root.display().to_string()));
            }
            let root = resolve_through_links(&normalize_lexically(&root))?;
            if !resolved.contains(&root) {
                resolved.push(root);
            }
        }
        if resolved.is_empty() {
            return Err(SandboxError::NoRoots);
        }
        Ok(Self {
            roots: resolved,
        })
    }

    /// Returns the resolved roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolves a caller-supplied path and checks it against the roots.
    ///
    /// # Errors
    ///
    /// Returns [`SandboxError::NotAllowed`] when the resolved path escapes
    /// every root, or another [`SandboxError`] when the input is unusable.
    pub fn resolve(&self, raw: &str) -> Result<SandboxedPath, SandboxError> {
        let lexical = lexical_candidate(raw)?;
        let resolved = resolve_through_links(&lexical)?;
        if !self.contains(&resolved) {
            return Err(SandboxError::NotAllowed);
        }
        let entry = match (lexical.parent(), lexical.file_name()) {
            (Some(parent), Some(name)) => resolve_through_links(parent)?.join(name),
            _ => resolved.clone(),
        };
        // An entry outside every root is a root reached through an alias.
        let entry = if self.contains(&entry) { entry } else { resolved.clone() };
        Ok(SandboxedPath {
            path: resolved,
            entry,
        })
    }

    /// Returns true when `path` is exactly one of the roots.
    #[must_use]
    pub fn is_root(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| root == path)
    }

    /// Returns true when an already-resolved path equals or descends from a root.
    #[must_use]
    pub fn contains(&self, resolved: &Path) -> bool {
        self.roots.iter().any(|root| resolved.starts_with(root))
    }
}

// ============================================================================
// SECTION: Resolution Helpers
// ============================================================================

/// Produces the absolute, lexically normalized form of an untrusted path string.
fn lexical_candidate(raw: &str) -> Result<PathBuf, SandboxError> {
    if raw.trim().is_empty() {
        return Err(SandboxError::MissingPath);
    }
    if raw.contains('\0') {
        return Err(SandboxError::NotAllowed);
    }
    check_lengths(Path::new(raw))?;
    let candidate = PathBuf::from(raw);
    let absolute = if candidate.is_absolute() {
        candidate
    } else {
        env::current_dir().map_err(|_| SandboxError::WorkingDirectory)?.join(candidate)
    };
    Ok(normalize_lexically(&absolute))
}

/// Rejects paths over the total or per-component length limits.
fn check_lengths(path: &Path) -> Result<(), SandboxError> {
    if path.as_os_str().len() > MAX_PATH_LENGTH {
        return Err(SandboxError::TooLong);
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SandboxError::TooLong);
        }
    }
    Ok(())
}

/// Removes `.` segments and collapses `..` without touching the filesystem.
///
/// `..` at the filesystem root stays at the root.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Canonicalizes the longest existing ancestor and re-appends the remainder.
///
/// A dangling symbolic link anywhere on the path is rejected, since writing
/// through it would land at an unchecked target.
fn resolve_through_links(path: &Path) -> Result<PathBuf, SandboxError> {
    let mut existing = path.to_path_buf();
    let mut remainder: Vec<OsString> = Vec::new();
    loop {
        if let Ok(canonical) = fs::canonicalize(&existing) {
            let mut resolved = canonical;
            for part in remainder.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }
        if fs::symlink_metadata(&existing).is_ok() {
            return Err(SandboxError::NotAllowed);
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                remainder.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => return Ok(path.to_path_buf()),
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions use unwrap for clarity."
    )]

    use std::fs;
    use std::path::Path;
    use std::path::PathBuf;

    use super::PathSandbox;
    use super::SandboxError;
    use super::normalize_lexically;

    fn sandbox_for(dir: &Path) -> PathSandbox {
        PathSandbox::new([dir.to_path_buf()]).unwrap()
    }

    fn text(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn normalize_collapses_parent_segments() {
        let base = std::env::temp_dir();
        let input = base.join("a").join(".").join("b").join("..").join("c");
        assert_eq!(normalize_lexically(&input), normalize_lexically(&base.join("a").join("c")));
    }

    #[cfg(unix)]
    #[test]
    fn normalize_never_climbs_above_filesystem_root() {
        assert_eq!(normalize_lexically(Path::new("/../../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn accepts_root_itself_and_missing_descendants() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        let root = sandbox.roots()[0].clone();
        assert_eq!(sandbox.resolve(&text(dir.path())).unwrap().as_path(), root);
        let nested = dir.path().join("new").join("deeper").join("file.txt");
        let resolved = sandbox.resolve(&text(&nested)).unwrap();
        assert!(resolved.as_path().starts_with(&root));
        assert!(resolved.as_path().ends_with("new/deeper/file.txt"));
    }

    #[test]
    fn rejects_sibling_with_shared_prefix() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("Projects");
        let sibling = parent.path().join("Projects2");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        let sandbox = sandbox_for(&root);
        let err = sandbox.resolve(&text(&sibling.join("x.txt"))).unwrap_err();
        assert_eq!(err, SandboxError::NotAllowed);
    }

    #[test]
    fn rejects_traversal_that_escapes_after_resolution() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("root");
        fs::create_dir_all(&root).unwrap();
        let sandbox = sandbox_for(&root);
        let escape = format!("{}/../outside.txt", text(&root));
        assert_eq!(sandbox.resolve(&escape).unwrap_err(), SandboxError::NotAllowed);
        let deep_escape = format!("{}/a/b/../../../outside.txt", text(&root));
        assert_eq!(sandbox.resolve(&deep_escape).unwrap_err(), SandboxError::NotAllowed);
    }

    #[test]
    fn accepts_traversal_that_stays_inside() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        let inside = format!("{}/a/../b.txt", text(dir.path()));
        let resolved = sandbox.resolve(&inside).unwrap();
        assert_eq!(resolved.as_path(), sandbox.roots()[0].join("b.txt"));
    }

    #[test]
    fn rejects_empty_and_nul_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        assert_eq!(sandbox.resolve("").unwrap_err(), SandboxError::MissingPath);
        assert_eq!(sandbox.resolve("   ").unwrap_err(), SandboxError::MissingPath);
        let with_nul = format!("{}/a\0b", text(dir.path()));
        assert_eq!(sandbox.resolve(&with_nul).unwrap_err(), SandboxError::NotAllowed);
    }

    #[test]
    fn rejects_overlong_component() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        let long = format!("{}/{}", text(dir.path()), "a".repeat(300));
        assert_eq!(sandbox.resolve(&long).unwrap_err(), SandboxError::TooLong);
    }

    #[test]
    fn construction_requires_absolute_roots() {
        assert!(matches!(
            PathSandbox::new([PathBuf::from("relative/root")]),
            Err(SandboxError::RelativeRoot(_))
        ));
        assert_eq!(PathSandbox::new(Vec::<PathBuf>::new()).unwrap_err(), SandboxError::NoRoots);
    }

    #[test]
    fn duplicate_roots_are_collapsed() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox =
            PathSandbox::new([dir.path().to_path_buf(), dir.path().join("x").join("..")]).unwrap();
        assert_eq!(sandbox.roots().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlink_pointing_outside_root() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("root");
        let outside = parent.path().join("outside");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();
        let sandbox = sandbox_for(&root);
        let through_link = root.join("link").join("secret.txt");
        assert_eq!(sandbox.resolve(&text(&through_link)).unwrap_err(), SandboxError::NotAllowed);
    }

    #[cfg(unix)]
    #[test]
    fn entry_path_keeps_an_in_root_link_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        let root = sandbox.roots()[0].clone();
        fs::write(root.join("real.txt"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("real.txt"), root.join("link.txt")).unwrap();
        let resolved = sandbox.resolve(&text(&dir.path().join("link.txt"))).unwrap();
        assert_eq!(resolved.as_path(), root.join("real.txt"));
        assert_eq!(resolved.entry_path(), root.join("link.txt"));
    }

    #[test]
    fn entry_path_of_root_is_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let sandbox = sandbox_for(dir.path());
        let resolved = sandbox.resolve(&text(dir.path())).unwrap();
        assert_eq!(resolved.entry_path(), sandbox.roots()[0]);
        assert!(sandbox.is_root(resolved.entry_path()));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_dangling_symlink() {
        let parent = tempfile::tempdir().unwrap();
        let root = parent.path().join("root");
        fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(parent.path().join("missing"), root.join("dangling")).unwrap();
        let sandbox = sandbox_for(&root);
        let err = sandbox.resolve(&text(&root.join("dangling"))).unwrap_err();
        assert_eq!(err, SandboxError::NotAllowed);
    }
}
