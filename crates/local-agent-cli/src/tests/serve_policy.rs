// local-agent-cli/src/tests/serve_policy.rs
// ============================================================================
// Module: Serve Policy Tests
// Description: Unit tests for agent bind safety rules.
// Purpose: Ensure non-loopback binding stays fail-closed without opt-in.
// Dependencies: local-agent-cli serve_policy, local-agent-config
// ============================================================================

//! ## Overview
//! Validates the serve policy fails closed for unsafe binds and allows
//! loopback operation without a token.

use local_agent_config::AgentConfig;

use crate::serve_policy::ServePolicyError;
use crate::serve_policy::enforce_local_only;
use crate::serve_policy::parse_allow_non_loopback_value;

fn config(contents: &str) -> AgentConfig {
    AgentConfig::from_toml(contents).expect("parse config")
}

#[test]
fn loopback_allows_without_token() {
    let config = config(
        r#"
[server]
bind = "127.0.0.1:8787"

[server.auth]
token_env = "LOCAL_AGENT_TEST_TOKEN_THAT_IS_NEVER_SET"
"#,
    );
    let outcome = enforce_local_only(&config, false).expect("loopback allowed");
    assert!(!outcome.network_exposed);
    assert!(!outcome.token_configured);
    assert_eq!(outcome.bind_addr.port(), 8787);
}

#[test]
fn ipv6_loopback_is_local() {
    let config = config(
        r#"
[server]
bind = "[::1]:8787"
"#,
    );
    let outcome = enforce_local_only(&config, false).expect("loopback allowed");
    assert!(!outcome.network_exposed);
}

#[test]
fn non_loopback_requires_opt_in() {
    let config = config(
        r#"
[server]
bind = "0.0.0.0:8787"

[server.auth]
token = "secret"
"#,
    );
    let err = enforce_local_only(&config, false).expect_err("expected opt-in error");
    assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
}

#[test]
fn non_loopback_requires_token() {
    let config = config(
        r#"
[server]
bind = "0.0.0.0:8787"

[server.auth]
token_env = "LOCAL_AGENT_TEST_TOKEN_THAT_IS_NEVER_SET"
"#,
    );
    let err = enforce_local_only(&config, true).expect_err("expected token error");
    assert!(matches!(err, ServePolicyError::NonLoopbackTokenRequired { .. }));
}

#[test]
fn non_loopback_allows_opt_in_with_token() {
    let config = config(
        r#"
[server]
bind = "0.0.0.0:8787"

[server.auth]
token = "secret"
"#,
    );
    let outcome = enforce_local_only(&config, true).expect("expected success");
    assert!(outcome.network_exposed);
    assert!(outcome.token_configured);
}

#[test]
fn invalid_bind_is_rejected() {
    let config = config(
        r#"
[server]
bind = "localhost"
"#,
    );
    let err = enforce_local_only(&config, true).expect_err("expected bind error");
    assert!(matches!(err, ServePolicyError::InvalidBind { .. }));
}

#[test]
fn parse_allow_non_loopback_accepts_one_and_true() {
    assert!(parse_allow_non_loopback_value("1").expect("parse env"));
    assert!(parse_allow_non_loopback_value("TRUE").expect("parse env"));
    assert!(!parse_allow_non_loopback_value("0").expect("parse env"));
}

#[test]
fn parse_allow_non_loopback_rejects_invalid() {
    let err = parse_allow_non_loopback_value("yes please").expect_err("expected invalid env");
    assert!(matches!(err, ServePolicyError::InvalidEnv { .. }));
}
