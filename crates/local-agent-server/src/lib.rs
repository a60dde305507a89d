// local-agent-server/src/lib.rs
// ============================================================================
// Module: Local Agent Server
// Description: HTTP agent exposing sandboxed, pre-approved OS tools.
// Purpose: Authenticate, gate, dispatch, execute, and audit tool calls.
// Dependencies: local-agent-core, local-agent-config, axum, subtle, tokio
// ============================================================================

//! ## Overview
//! The server crate is the agent's security boundary. Requests flow through
//! [`auth::AgentAuthenticator`], then [`tools::ToolRouter`] (capability set,
//! confirmation gate, sandbox and registry validation), then a
//! [`executor::HostExecutor`] running one entry of the fixed
//! [`platform`] table. Every `/tool/run` call leaves one [`audit::AuditLog`]
//! record.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod executor;
pub mod platform;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditLog;
pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::StderrAuditSink;
pub use audit::ToolRunRecord;
pub use auth::AGENT_TOKEN_HEADER;
pub use auth::AgentAuthenticator;
pub use auth::CONFIRM_HEADER;
pub use executor::ExecError;
pub use executor::ExecLimits;
pub use executor::HostExecutor;
pub use executor::Invocation;
pub use executor::SystemExecutor;
pub use server::AgentServer;
pub use server::AgentServerParts;
pub use server::ServerError;
pub use tools::ToolCall;
pub use tools::ToolError;
pub use tools::ToolRouter;
pub use tools::ToolRouterConfig;
