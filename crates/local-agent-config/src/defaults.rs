// local-agent-config/src/defaults.rs
// ============================================================================
// Module: Built-in Defaults
// Description: Per-platform default roots, registries, and editor.
// Purpose: Give an unconfigured agent a small, conservative allowlist.
// Dependencies: local-agent-core
// ============================================================================

//! ## Overview
//! Defaults are selected at compile time for the target OS family. They are
//! only used when the corresponding config table is omitted; a present table
//! replaces the default entirely rather than merging with it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use local_agent_core::AppEntry;
use local_agent_core::ProjectEntry;

// ============================================================================
// SECTION: Scalars
// ============================================================================

/// Default bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8787";
/// Default environment variable holding the shared secret.
pub const DEFAULT_TOKEN_ENV: &str = "LOCAL_AGENT_TOKEN";
/// Default audit log file.
pub const DEFAULT_AUDIT_PATH: &str = "local-agent-audit.log";
/// Default audit message truncation, in characters.
pub const DEFAULT_AUDIT_MESSAGE_CHARS: usize = 4000;
/// Default subprocess timeout in milliseconds.
pub const DEFAULT_EXEC_TIMEOUT_MS: u64 = 30_000;
/// Default captured output cap in bytes.
pub const DEFAULT_EXEC_MAX_OUTPUT_BYTES: usize = 1024 * 1024;
/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Sandbox Roots
// ============================================================================

/// Default sandbox roots; `~` expands to the user's home directory.
#[must_use]
pub fn default_roots() -> Vec<String> {
    let projects = if cfg!(windows) { "C:\\Projects" } else { "~/Projects" };
    vec![projects.to_string(), "~/Documents".to_string(), "~/Desktop".to_string()]
}

// ============================================================================
// SECTION: Editor
// ============================================================================

/// Default editor program used for `open_in_editor` projects.
#[must_use]
pub fn default_editor_program() -> String {
    if cfg!(windows) { "code.cmd".to_string() } else { "code".to_string() }
}

// ============================================================================
// SECTION: Registries
// ============================================================================

/// Builds a program entry.
fn program(name: &str) -> AppEntry {
    AppEntry::Program {
        program: name.to_string(),
    }
}

/// Builds a candidate-list entry.
fn candidates(paths: &[&str]) -> AppEntry {
    AppEntry::Candidates {
        paths: paths.iter().map(PathBuf::from).collect(),
    }
}

/// Default application allowlist.
#[cfg(windows)]
#[must_use]
pub fn default_apps() -> BTreeMap<String, AppEntry> {
    BTreeMap::from([
        ("notepad".to_string(), program("notepad.exe")),
        ("calc".to_string(), program("calc.exe")),
        ("vscode".to_string(), program("code.cmd")),
        (
            "chrome".to_string(),
            candidates(&[
                "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
                "C:\\Program Files (x86)\\Google\\Chrome\\Application\\chrome.exe",
            ]),
        ),
        (
            "word".to_string(),
            candidates(&[
                "C:\\Program Files\\Microsoft Office\\root\\Office16\\WINWORD.EXE",
                "C:\\Program Files (x86)\\Microsoft Office\\root\\Office16\\WINWORD.EXE",
            ]),
        ),
        (
            "outlook".to_string(),
            candidates(&[
                "C:\\Program Files\\Microsoft Office\\root\\Office16\\OUTLOOK.EXE",
                "C:\\Program Files (x86)\\Microsoft Office\\root\\Office16\\OUTLOOK.EXE",
            ]),
        ),
    ])
}

/// Default application allowlist.
#[cfg(target_os = "macos")]
#[must_use]
pub fn default_apps() -> BTreeMap<String, AppEntry> {
    BTreeMap::from([
        (
            "notepad".to_string(),
            candidates(&["/System/Applications/TextEdit.app/Contents/MacOS/TextEdit"]),
        ),
        (
            "calc".to_string(),
            candidates(&["/System/Applications/Calculator.app/Contents/MacOS/Calculator"]),
        ),
        ("vscode".to_string(), program("code")),
        (
            "chrome".to_string(),
            candidates(&["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"]),
        ),
    ])
}

/// Default application allowlist.
#[cfg(not(any(windows, target_os = "macos")))]
#[must_use]
pub fn default_apps() -> BTreeMap<String, AppEntry> {
    BTreeMap::from([
        (
            "notepad".to_string(),
            candidates(&["/usr/bin/gnome-text-editor", "/usr/bin/gedit", "/usr/bin/kate"]),
        ),
        ("calc".to_string(), candidates(&["/usr/bin/gnome-calculator", "/usr/bin/kcalc"])),
        ("vscode".to_string(), program("code")),
        (
            "chrome".to_string(),
            candidates(&[
                "/usr/bin/google-chrome",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
            ]),
        ),
    ])
}

/// Default URL allowlist.
#[must_use]
pub fn default_urls() -> BTreeMap<String, String> {
    [
        ("gmail", "https://mail.google.com/mail/u/0/#inbox"),
        ("calendar", "https://calendar.google.com/calendar/u/0/r"),
        ("linkedin", "https://www.linkedin.com/feed/"),
        ("github", "https://github.com/"),
    ]
    .into_iter()
    .map(|(id, url)| (id.to_string(), url.to_string()))
    .collect()
}

/// Default project registry (empty; projects are user-specific).
#[must_use]
pub const fn default_projects() -> BTreeMap<String, ProjectEntry> {
    BTreeMap::new()
}
