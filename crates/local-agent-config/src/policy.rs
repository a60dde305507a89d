// local-agent-config/src/policy.rs
// ============================================================================
// Module: Agent Policy
// Description: Immutable runtime policy derived from validated configuration.
// Purpose: Build the sandbox and registries exactly once at startup.
// Dependencies: local-agent-core
// ============================================================================

//! ## Overview
//! [`AgentPolicy`] is the read-only view the router consults on every call:
//! sandbox roots, the three registries, search limits, and the editor
//! program. It is built from an [`AgentConfig`] and never mutated.

use std::collections::BTreeMap;
use std::path::PathBuf;

use local_agent_core::AppRegistry;
use local_agent_core::PathSandbox;
use local_agent_core::ProjectEntry;
use local_agent_core::ProjectRegistry;
use local_agent_core::SearchLimits;
use local_agent_core::UrlRegistry;

use crate::config::AgentConfig;
use crate::config::ConfigError;
use crate::config::expand_home;

/// Runtime capability policy.
#[derive(Debug, Clone)]
pub struct AgentPolicy {
    /// Path sandbox for every file-touching tool.
    pub sandbox: PathSandbox,
    /// Application allowlist.
    pub apps: AppRegistry,
    /// URL allowlist.
    pub urls: UrlRegistry,
    /// Project registry (folders already `~`-expanded).
    pub projects: ProjectRegistry,
    /// Search traversal limits.
    pub search: SearchLimits,
    /// Editor program for `open_in_editor` projects.
    pub editor_program: PathBuf,
}

impl AgentConfig {
    /// Builds the runtime policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the sandbox or a registry rejects
    /// its configuration.
    pub fn build_policy(&self) -> Result<AgentPolicy, ConfigError> {
        let sandbox = PathSandbox::new(self.sandbox_roots()?)
            .map_err(|err| ConfigError::Invalid(format!("sandbox: {err}")))?;
        let apps = AppRegistry::new(self.apps.clone()).map_err(invalid("apps"))?;
        let urls = UrlRegistry::new(self.urls.clone()).map_err(invalid("urls"))?;
        let projects =
            ProjectRegistry::new(self.expanded_projects()?).map_err(invalid("projects"))?;
        Ok(AgentPolicy {
            sandbox,
            apps,
            urls,
            projects,
            search: self.search.clone(),
            editor_program: PathBuf::from(self.editor.program.trim()),
        })
    }

    /// Returns the project table with `~` expanded in every folder.
    fn expanded_projects(&self) -> Result<BTreeMap<String, ProjectEntry>, ConfigError> {
        self.projects
            .iter()
            .map(|(id, entry)| {
                let folder = match entry.folder.to_str() {
                    Some(text) => expand_home(text)?,
                    None => entry.folder.clone(),
                };
                Ok((id.clone(), ProjectEntry {
                    folder,
                    ..entry.clone()
                }))
            })
            .collect()
    }
}

/// Maps a registry error into a config error for the named table.
fn invalid(table: &'static str) -> impl Fn(local_agent_core::RegistryError) -> ConfigError {
    move |err| ConfigError::Invalid(format!("{table}: {err}"))
}
