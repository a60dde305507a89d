// local-agent-config/src/lib.rs
// ============================================================================
// Module: Local Agent Config Library
// Description: Canonical config model, validation, defaults, and examples.
// Purpose: Single source of truth for local-agent.toml semantics.
// Dependencies: local-agent-core, dirs, serde, toml
// ============================================================================

//! ## Overview
//! `local-agent-config` defines the configuration model for the local agent.
//! It provides strict, fail-closed validation, per-platform defaults for the
//! sandbox and registries, and a deterministic example file. A validated
//! config is turned into an immutable [`AgentPolicy`] once at startup.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod defaults;
pub mod examples;
pub mod policy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
pub use policy::AgentPolicy;
