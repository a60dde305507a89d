// local-agent-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for local-agent-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::path::Path;

use local_agent_config::AgentConfig;
use local_agent_config::ConfigError;

pub type TestResult = Result<(), String>;

/// Parses a TOML string into an `AgentConfig` for tests.
pub fn config_from_toml(toml_str: &str) -> Result<AgentConfig, String> {
    AgentConfig::from_toml(toml_str).map_err(|err| err.to_string())
}

/// Returns a config with a single sandbox root at `root` and defaults elsewhere.
pub fn config_with_root(root: &Path) -> Result<AgentConfig, String> {
    let mut config = config_from_toml("")?;
    config.sandbox.roots = vec![root.display().to_string()];
    Ok(config)
}

/// Asserts that a validation result failed with a message containing `needle`.
pub fn assert_invalid(result: Result<(), ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(()) => Err("expected invalid config".to_string()),
    }
}
