//! Config defaults and validation tests for local-agent-config.
// local-agent-config/tests/config_validation.rs
// =============================================================================
// Module: Config Validation Tests
// Description: Validate defaults and fail-closed config invariants.
// Purpose: Ensure an empty config is usable and bad policy never loads.
// =============================================================================

#![allow(clippy::use_debug, reason = "Debug formatting in test failure messages.")]

use std::path::PathBuf;

use local_agent_config::AuditSinkKind;
use local_agent_config::config_toml_example;
use local_agent_core::AppEntry;

mod common;
use common::TestResult;
use common::assert_invalid;

#[test]
fn empty_config_uses_safe_defaults() -> TestResult {
    let config = common::config_from_toml("")?;
    if config.server.bind != "127.0.0.1:8787" {
        return Err(format!("unexpected default bind {}", config.server.bind));
    }
    if config.server.auth.token_env != "LOCAL_AGENT_TOKEN" {
        return Err("unexpected default token env".to_string());
    }
    if config.search.max_results != 30 || config.search.max_depth != 8 {
        return Err("unexpected default search limits".to_string());
    }
    if config.exec.timeout_ms != 30_000 {
        return Err("unexpected default timeout".to_string());
    }
    if config.server.audit.sink != AuditSinkKind::File
        || config.server.audit.max_message_chars != 4000
    {
        return Err("unexpected default audit config".to_string());
    }
    for id in ["gmail", "calendar", "linkedin", "github"] {
        if !config.urls.contains_key(id) {
            return Err(format!("missing default url {id}"));
        }
    }
    if !config.apps.contains_key("vscode") || !config.projects.is_empty() {
        return Err("unexpected default registries".to_string());
    }
    config.validate().map_err(|err| err.to_string())
}

#[test]
fn present_registry_table_replaces_defaults() -> TestResult {
    let config = common::config_from_toml("[urls]\ndocs = \"https://docs.rs/\"\n")?;
    if config.urls.len() != 1 || !config.urls.contains_key("docs") {
        return Err(format!("expected only docs url, got {:?}", config.urls.keys()));
    }
    Ok(())
}

#[test]
fn example_config_parses_and_validates() -> TestResult {
    let config = common::config_from_toml(&config_toml_example())?;
    config.validate().map_err(|err| err.to_string())?;
    match config.apps.get("chrome") {
        Some(AppEntry::Candidates {
            paths,
        }) if !paths.is_empty() => {}
        other => return Err(format!("unexpected chrome entry {other:?}")),
    }
    let policy = config.build_policy().map_err(|err| err.to_string())?;
    let website = policy.projects.lookup("website").map_err(|err| err.to_string())?;
    if !website.folder.is_absolute() || !website.reveal || !website.open_in_editor {
        return Err("website project not expanded".to_string());
    }
    Ok(())
}

#[test]
fn empty_sandbox_roots_are_rejected() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.sandbox.roots.clear();
    assert_invalid(config.validate(), "sandbox.roots must not be empty")
}

#[test]
fn relative_sandbox_roots_are_rejected() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.sandbox.roots = vec!["relative/dir".to_string()];
    assert_invalid(config.validate(), "sandbox root must be absolute")
}

#[test]
fn invalid_bind_is_rejected() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.server.bind = "localhost".to_string();
    assert_invalid(config.validate(), "invalid server.bind address")
}

#[test]
fn zero_body_limit_is_rejected() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.server.max_body_bytes = 0;
    assert_invalid(config.validate(), "max_body_bytes must be greater than zero")
}

#[test]
fn exec_timeout_must_be_in_range() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.exec.timeout_ms = 50;
    assert_invalid(config.validate(), "exec.timeout_ms must be between")?;
    config.exec.timeout_ms = 300_001;
    assert_invalid(config.validate(), "exec.timeout_ms must be between")
}

#[test]
fn search_limits_are_bounded() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.search.max_results = 0;
    assert_invalid(config.validate(), "search.max_results")?;
    config.search.max_results = 30;
    config.search.max_depth = 65;
    assert_invalid(config.validate(), "search.max_depth")
}

#[test]
fn registry_ids_are_validated() -> TestResult {
    let config = common::config_from_toml("[urls]\n\"Bad Id\" = \"https://example.com/\"\n")?;
    assert_invalid(config.validate(), "invalid registry id")
}

#[test]
fn registry_urls_must_be_http() -> TestResult {
    let config = common::config_from_toml("[urls]\nlocal = \"file:///etc/passwd\"\n")?;
    assert_invalid(config.validate(), "url must be an absolute http/https URL")
}

#[test]
fn candidate_paths_must_be_absolute() -> TestResult {
    let config = common::config_from_toml("[apps]\ntool = { paths = [\"bin/tool\"] }\n")?;
    assert_invalid(config.validate(), "candidate paths must be absolute")
}

#[test]
fn token_env_must_be_a_variable_name() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.server.auth.token_env = "NOT A NAME".to_string();
    assert_invalid(config.validate(), "server.auth.token_env")
}

#[test]
fn inline_token_wins_and_empty_means_unset() -> TestResult {
    let mut config = common::config_from_toml("")?;
    config.server.auth.token_env = "LOCAL_AGENT_TEST_TOKEN_THAT_IS_NEVER_SET".to_string();
    config.server.auth.token = Some(String::new());
    if config.resolve_token().is_some() {
        return Err("empty token should be treated as unset".to_string());
    }
    config.server.auth.token = Some("s3cret".to_string());
    if config.resolve_token().as_deref() != Some("s3cret") {
        return Err("inline token should be used".to_string());
    }
    Ok(())
}

#[test]
fn unknown_audit_sink_fails_to_parse() -> TestResult {
    match common::config_from_toml("[server.audit]\nsink = \"syslog\"\n") {
        Err(message) if message.contains("config parse error") => Ok(()),
        Err(message) => Err(format!("unexpected error {message}")),
        Ok(_) => Err("expected parse failure".to_string()),
    }
}

#[test]
fn audit_cannot_be_switched_off() -> TestResult {
    match common::config_from_toml("[server.audit]\nenabled = false\n") {
        Err(err) if err.contains("enabled") => Ok(()),
        Err(err) => Err(format!("unexpected error {err}")),
        Ok(_) => Err("audit switch should be rejected".to_string()),
    }
}

#[test]
fn sandbox_roots_expand_home() -> TestResult {
    let Some(home) = dirs::home_dir() else {
        return Ok(());
    };
    let mut config = common::config_from_toml("")?;
    config.sandbox.roots = vec!["~/Documents".to_string()];
    let roots = config.sandbox_roots().map_err(|err| err.to_string())?;
    if roots != vec![home.join("Documents")] {
        return Err(format!("unexpected roots {roots:?}"));
    }
    let absolute = PathBuf::from(if cfg!(windows) { "C:\\Projects" } else { "/srv/projects" });
    config.sandbox.roots = vec![absolute.display().to_string()];
    if config.sandbox_roots().map_err(|err| err.to_string())? != vec![absolute] {
        return Err("absolute root should pass through".to_string());
    }
    Ok(())
}
