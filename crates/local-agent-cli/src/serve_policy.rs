// local-agent-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure policy checks for the agent launcher.
// Purpose: Keep the agent on loopback unless the operator explicitly opts in.
// Dependencies: local-agent-config, thiserror
// ============================================================================

//! ## Overview
//! The agent executes host operations on behalf of whoever holds the shared
//! secret, so it binds to loopback by default. Binding anywhere else needs an
//! explicit opt-in (flag or environment) and a configured token; the check is
//! fail-closed.

use std::env;
use std::net::SocketAddr;

use local_agent_config::AgentConfig;
use thiserror::Error;

/// Environment variable enabling non-loopback binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "LOCAL_AGENT_ALLOW_NON_LOOPBACK";

/// Bind outcome metadata for startup warnings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindOutcome {
    /// Parsed bind address.
    pub bind_addr: SocketAddr,
    /// True when the agent listens on a non-loopback address.
    pub network_exposed: bool,
    /// Whether a shared secret is configured.
    pub token_configured: bool,
}

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    #[error("LOCAL_AGENT_ALLOW_NON_LOOPBACK must be 1 or true (got {value:?})")]
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    #[error("invalid bind address {bind}: {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    #[error(
        "refusing to bind {bind}: pass --allow-non-loopback or set LOCAL_AGENT_ALLOW_NON_LOOPBACK=1"
    )]
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
    /// Non-loopback binding requires a shared secret.
    #[error("refusing to bind {bind}: a non-loopback agent requires an agent token")]
    NonLoopbackTokenRequired {
        /// Bind address.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    parse_allow_non_loopback_value(&value.to_string_lossy())
}

/// Enforces local-only binding for the agent.
///
/// # Errors
/// Returns [`ServePolicyError`] when the bind address is unsafe for the config.
pub fn enforce_local_only(
    config: &AgentConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let bind = config.server.bind.trim();
    let bind_addr: SocketAddr =
        bind.parse().map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        })?;
    let token_configured = config.resolve_token().is_some();
    if bind_addr.ip().is_loopback() {
        return Ok(BindOutcome {
            bind_addr,
            network_exposed: false,
            token_configured,
        });
    }
    if !allow_non_loopback {
        return Err(ServePolicyError::NonLoopbackOptInRequired {
            bind: bind.to_string(),
        });
    }
    if !token_configured {
        return Err(ServePolicyError::NonLoopbackTokenRequired {
            bind: bind.to_string(),
        });
    }
    Ok(BindOutcome {
        bind_addr,
        network_exposed: true,
        token_configured,
    })
}

/// Parses an env value for allow-non-loopback. Only `1`/`true` opt in.
pub(crate) fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "" | "0" | "false" => Ok(false),
        _ => Err(ServePolicyError::InvalidEnv {
            value: value.to_string(),
        }),
    }
}
