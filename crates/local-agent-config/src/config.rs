// local-agent-config/src/config.rs
// ============================================================================
// Module: Local Agent Configuration
// Description: Configuration loading and validation for the local agent.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: local-agent-core, dirs, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every table is optional and falls back to conservative defaults; a present
//! table is validated in full. Invalid configuration fails closed: the agent
//! refuses to start rather than run with a partially understood policy.
//!
//! Security posture: config inputs are trusted to the operator but still
//! bounded, since the sandbox and registries derived here are the agent's
//! entire capability surface.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use local_agent_core::AppEntry;
use local_agent_core::ProjectEntry;
use local_agent_core::SearchLimits;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::defaults;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "local-agent.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "LOCAL_AGENT_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of the shared secret (matches the header cap).
pub const MAX_AUTH_TOKEN_LENGTH: usize = 8192;
/// Maximum number of sandbox roots.
pub(crate) const MAX_SANDBOX_ROOTS: usize = 64;
/// Maximum entries per registry table.
pub(crate) const MAX_REGISTRY_ENTRIES: usize = 256;
/// Inclusive bounds for `exec.timeout_ms`.
pub(crate) const EXEC_TIMEOUT_RANGE_MS: (u64, u64) = (100, 300_000);
/// Upper bound for `exec.max_output_bytes`.
pub(crate) const MAX_EXEC_OUTPUT_BYTES: usize = 16 * 1024 * 1024;
/// Upper bound for `search.max_results`.
pub(crate) const MAX_SEARCH_RESULTS: usize = 1000;
/// Upper bound for `search.max_depth`.
pub(crate) const MAX_SEARCH_DEPTH: usize = 64;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Local agent configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Path sandbox configuration.
    #[serde(default)]
    pub sandbox: SandboxConfig,
    /// Bounded search limits.
    #[serde(default)]
    pub search: SearchLimits,
    /// Subprocess execution limits.
    #[serde(default)]
    pub exec: ExecConfig,
    /// Application allowlist.
    #[serde(default = "defaults::default_apps")]
    pub apps: BTreeMap<String, AppEntry>,
    /// URL allowlist.
    #[serde(default = "defaults::default_urls")]
    pub urls: BTreeMap<String, String>,
    /// Project registry.
    #[serde(default = "defaults::default_projects")]
    pub projects: BTreeMap<String, ProjectEntry>,
    /// Editor used by `open_in_editor` projects.
    #[serde(default)]
    pub editor: EditorConfig,
    /// File the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sandbox: SandboxConfig::default(),
            search: SearchLimits::default(),
            exec: ExecConfig::default(),
            apps: defaults::default_apps(),
            urls: defaults::default_urls(),
            projects: defaults::default_projects(),
            editor: EditorConfig::default(),
            source_path: None,
        }
    }
}

impl AgentConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `LOCAL_AGENT_CONFIG`, then
    /// `local-agent.toml` in the working directory. Only the implicit default
    /// file may be absent, in which case built-in defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(resolved) = resolve_path(path)? else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml(content)?;
        config.source_path = Some(resolved);
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the TOML is malformed.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Validates the configuration for internal consistency.
    ///
    /// Validation builds the sandbox and registries, so every error they would
    /// raise at startup surfaces here.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.sandbox.validate()?;
        validate_search(&self.search)?;
        self.exec.validate()?;
        self.editor.validate()?;
        let tables = [
            ("apps", self.apps.len()),
            ("urls", self.urls.len()),
            ("projects", self.projects.len()),
        ];
        for (table, len) in tables {
            if len > MAX_REGISTRY_ENTRIES {
                return Err(ConfigError::Invalid(format!("too many {table} entries")));
            }
        }
        self.build_policy().map(|_| ())
    }

    /// Returns the configured shared secret, if any.
    ///
    /// `server.auth.token` wins; otherwise the environment variable named by
    /// `server.auth.token_env` is read. Empty values count as unset.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.server
            .auth
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| {
                env::var(&self.server.auth.token_env).ok().filter(|token| !token.is_empty())
            })
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is invalid.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_bind(&self.server.bind)
    }

    /// Returns the sandbox roots with `~` expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a root cannot be expanded or is relative.
    pub fn sandbox_roots(&self) -> Result<Vec<PathBuf>, ConfigError> {
        self.sandbox
            .roots
            .iter()
            .map(|root| {
                let expanded = expand_home(root)?;
                if expanded.is_absolute() {
                    Ok(expanded)
                } else {
                    Err(ConfigError::Invalid(format!("sandbox root must be absolute: {root}")))
                }
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (`ip:port`).
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Shared-secret configuration.
    #[serde(default)]
    pub auth: ServerAuthConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            auth: ServerAuthConfig::default(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        parse_bind(&self.bind)?;
        self.auth.validate()?;
        self.audit.validate()
    }
}

/// Shared-secret configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuthConfig {
    /// Inline secret; prefer `token_env` outside of development.
    #[serde(default)]
    pub token: Option<String>,
    /// Environment variable read when `token` is unset.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

impl Default for ServerAuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
        }
    }
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(token) = &self.token {
            if token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("server.auth.token too long".to_string()));
            }
            if token.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
                return Err(ConfigError::Invalid(
                    "server.auth.token must not contain whitespace".to_string(),
                ));
            }
        }
        let env_name = self.token_env.trim();
        if env_name.is_empty()
            || !env_name.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
        {
            return Err(ConfigError::Invalid(
                "server.auth.token_env must be a valid environment variable name".to_string(),
            ));
        }
        Ok(())
    }
}

/// Audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Append JSON lines to `server.audit.path`.
    #[default]
    File,
    /// Write JSON lines to stderr.
    Stderr,
}

/// Audit log configuration.
///
/// There is no switch to turn auditing off; unknown keys are rejected so a
/// stale `enabled = false` fails loudly instead of being ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuditConfig {
    /// Audit destination.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Audit log path for the file sink (JSON lines).
    #[serde(default = "default_audit_path")]
    pub path: String,
    /// Result/error text is truncated to this many characters.
    #[serde(default = "default_audit_message_chars")]
    pub max_message_chars: usize,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::default(),
            path: default_audit_path(),
            max_message_chars: default_audit_message_chars(),
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sink == AuditSinkKind::File {
            validate_path_string("server.audit.path", &self.path)?;
        }
        if self.max_message_chars == 0 {
            return Err(ConfigError::Invalid(
                "server.audit.max_message_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Sandbox, Exec, Editor
// ============================================================================

/// Path sandbox configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxConfig {
    /// Allowed root directories; a leading `~` expands to the home directory.
    #[serde(default = "defaults::default_roots")]
    pub roots: Vec<String>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            roots: defaults::default_roots(),
        }
    }
}

impl SandboxConfig {
    /// Validates sandbox configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Invalid("sandbox.roots must not be empty".to_string()));
        }
        if self.roots.len() > MAX_SANDBOX_ROOTS {
            return Err(ConfigError::Invalid("too many sandbox.roots entries".to_string()));
        }
        for root in &self.roots {
            validate_path_string("sandbox.roots", root)?;
        }
        Ok(())
    }
}

/// Subprocess execution limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecConfig {
    /// Timeout for blocking primitives in milliseconds.
    #[serde(default = "default_exec_timeout_ms")]
    pub timeout_ms: u64,
    /// Captured stdout/stderr cap in bytes.
    #[serde(default = "default_exec_max_output_bytes")]
    pub max_output_bytes: usize,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_exec_timeout_ms(),
            max_output_bytes: default_exec_max_output_bytes(),
        }
    }
}

impl ExecConfig {
    /// Validates exec configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = EXEC_TIMEOUT_RANGE_MS;
        if !(min ..= max).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "exec.timeout_ms must be between {min} and {max}"
            )));
        }
        if self.max_output_bytes == 0 || self.max_output_bytes > MAX_EXEC_OUTPUT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "exec.max_output_bytes must be between 1 and {MAX_EXEC_OUTPUT_BYTES}"
            )));
        }
        Ok(())
    }
}

/// Editor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    /// Editor program launched with the project folder as its only argument.
    #[serde(default = "defaults::default_editor_program")]
    pub program: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            program: defaults::default_editor_program(),
        }
    }
}

impl EditorConfig {
    /// Validates editor configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("editor.program", &self.program)
    }
}

/// Validates search limits.
fn validate_search(limits: &SearchLimits) -> Result<(), ConfigError> {
    if limits.max_results == 0 || limits.max_results > MAX_SEARCH_RESULTS {
        return Err(ConfigError::Invalid(format!(
            "search.max_results must be between 1 and {MAX_SEARCH_RESULTS}"
        )));
    }
    if limits.max_depth > MAX_SEARCH_DEPTH {
        return Err(ConfigError::Invalid(format!(
            "search.max_depth must be at most {MAX_SEARCH_DEPTH}"
        )));
    }
    if limits.skip_dirs.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::Invalid("search.skip_dirs entries must be non-empty".to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// Returns `None` when nothing was named and the default file is absent.
fn resolve_path(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = path {
        return Ok(Some(path.to_path_buf()));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(Some(PathBuf::from(env_path)));
    }
    let default = PathBuf::from(DEFAULT_CONFIG_NAME);
    Ok(default.is_file().then_some(default))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Parses a bind address.
fn parse_bind(bind: &str) -> Result<SocketAddr, ConfigError> {
    bind.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("invalid server.bind address: {bind}")))
}

/// Expands a leading `~` to the current user's home directory.
///
/// # Errors
///
/// Returns [`ConfigError`] when the home directory is required but unknown.
pub fn expand_home(raw: &str) -> Result<PathBuf, ConfigError> {
    let trimmed = raw.trim();
    let rest = if trimmed == "~" {
        Some("")
    } else {
        trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\"))
    };
    let Some(rest) = rest else {
        return Ok(PathBuf::from(trimmed));
    };
    let home = dirs::home_dir()
        .ok_or_else(|| ConfigError::Invalid("home directory is unavailable".to_string()))?;
    Ok(if rest.is_empty() { home } else { home.join(rest) })
}

/// Default bind address.
fn default_bind() -> String {
    defaults::DEFAULT_BIND.to_string()
}

/// Default maximum request body size in bytes.
const fn default_max_body_bytes() -> usize {
    defaults::DEFAULT_MAX_BODY_BYTES
}

/// Default token environment variable.
fn default_token_env() -> String {
    defaults::DEFAULT_TOKEN_ENV.to_string()
}

/// Default audit log path.
fn default_audit_path() -> String {
    defaults::DEFAULT_AUDIT_PATH.to_string()
}

/// Default audit truncation length.
const fn default_audit_message_chars() -> usize {
    defaults::DEFAULT_AUDIT_MESSAGE_CHARS
}

/// Default subprocess timeout.
const fn default_exec_timeout_ms() -> u64 {
    defaults::DEFAULT_EXEC_TIMEOUT_MS
}

/// Default captured output cap.
const fn default_exec_max_output_bytes() -> usize {
    defaults::DEFAULT_EXEC_MAX_OUTPUT_BYTES
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions use unwrap for clarity."
    )]

    use std::path::Path;

    use super::expand_home;
    use super::validate_path_string;

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        let home = dirs::home_dir();
        if let Some(home) = home {
            assert_eq!(expand_home("~").unwrap(), home);
            assert_eq!(expand_home("~/Documents").unwrap(), home.join("Documents"));
        }
        assert_eq!(expand_home("/srv/~data").unwrap(), Path::new("/srv/~data"));
        assert_eq!(expand_home("~other/x").unwrap(), Path::new("~other/x"));
    }

    #[test]
    fn validate_path_string_rejects_empty_and_long_components() {
        assert!(validate_path_string("field", "  ").is_err());
        assert!(validate_path_string("field", &"a".repeat(256)).is_err());
        assert!(validate_path_string("field", "local-agent-audit.log").is_ok());
    }
}
