// local-agent-cli/src/lib.rs
// ============================================================================
// Module: Local Agent CLI Library
// Description: Shared helpers for the local agent command-line interface.
// Purpose: Keep bind policy checks testable outside the binary.
// Dependencies: local-agent-config, thiserror
// ============================================================================

//! ## Overview
//! Houses the pieces of the `local-agent` binary that carry policy, so they
//! can be unit tested without spawning the process. The binary entry point
//! (`src/main.rs`) imports these helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Network exposure checks for the serve command.
pub mod serve_policy;

#[cfg(test)]
mod tests;
