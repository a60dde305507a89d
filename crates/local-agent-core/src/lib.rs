// local-agent-core/src/lib.rs
// ============================================================================
// Module: Local Agent Core
// Description: Capability set, path sandbox, registries, and bounded search.
// Purpose: Pure policy primitives shared by the config, server, and CLI crates.
// Dependencies: serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! Local Agent core defines what the agent is allowed to do and on what. It
//! performs no process execution and no network I/O; the only filesystem
//! access is the resolution needed by the sandbox and read-only directory
//! listing for search.
//!
//! Security posture: every input handled here is untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod process;
pub mod registry;
pub mod sandbox;
pub mod search;
pub mod tooling;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use process::InvalidPid;
pub use process::ProcessId;
pub use registry::AppEntry;
pub use registry::AppRegistry;
pub use registry::ProjectEntry;
pub use registry::ProjectRegistry;
pub use registry::RegistryError;
pub use registry::UrlRegistry;
pub use registry::normalize_id;
pub use registry::parse_http_url;
pub use sandbox::PathSandbox;
pub use sandbox::SandboxError;
pub use sandbox::SandboxedPath;
pub use search::SearchError;
pub use search::SearchLimits;
pub use search::search_roots;
pub use tooling::ToolClass;
pub use tooling::ToolInvocation;
pub use tooling::ToolName;
