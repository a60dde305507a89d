// local-agent-server/src/server.rs
// ============================================================================
// Module: Agent HTTP Server
// Description: axum surface for `/health` and `/tool/run`.
// Purpose: Authenticate, dispatch, and audit every tool request.
// Dependencies: axum, tokio, local-agent-config
// ============================================================================

//! ## Overview
//! Two routes. `GET /health` is unauthenticated and reports the platform and
//! sandbox roots. `POST /tool/run` authenticates the shared secret, decodes
//! `{ tool_name, args }`, routes through [`ToolRouter`], writes exactly one
//! audit record, and replies `{ ok, result | error, audit_id }`.
//!
//! Security posture: the caller is a less-trusted orchestrator relaying
//! model output. Authentication happens before the body is interpreted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use local_agent_config::AgentConfig;
use local_agent_config::AgentPolicy;
use local_agent_config::AuditSinkKind;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;

use crate::audit::AuditLog;
use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::LifecycleEvent;
use crate::audit::StderrAuditSink;
use crate::auth::AGENT_TOKEN_HEADER;
use crate::auth::AgentAuthenticator;
use crate::auth::CONFIRM_HEADER;
use crate::auth::is_confirmed;
use crate::executor::ExecLimits;
use crate::executor::HostExecutor;
use crate::executor::SystemExecutor;
use crate::platform::platform_name;
use crate::tools::ToolCall;
use crate::tools::ToolError;
use crate::tools::ToolRouter;
use crate::tools::ToolRouterConfig;

/// Service label reported by `/health`.
pub const SERVICE_NAME: &str = "local-agent";

// ============================================================================
// SECTION: Agent Server
// ============================================================================

/// Inputs for assembling a server without reading configuration files.
pub struct AgentServerParts {
    /// Bind address used by [`AgentServer::serve`].
    pub bind: SocketAddr,
    /// Immutable sandbox and registries.
    pub policy: AgentPolicy,
    /// Configured shared secret, if any.
    pub token: Option<String>,
    /// Host primitive executor.
    pub executor: Arc<dyn HostExecutor>,
    /// Limits for blocking host commands.
    pub limits: ExecLimits,
    /// Audit record destination.
    pub audit_sink: Arc<dyn AuditSink>,
    /// Human-readable audit destination for the startup event.
    pub audit_label: String,
    /// Audit message truncation length.
    pub max_message_chars: usize,
    /// Maximum request body size.
    pub max_body_bytes: usize,
}

/// Local agent HTTP server.
pub struct AgentServer {
    /// Bind address used by [`AgentServer::serve`].
    bind: SocketAddr,
    /// Shared request state.
    state: Arc<ServerState>,
}

/// Shared state for request handlers.
struct ServerState {
    /// Tool dispatch.
    router: ToolRouter,
    /// Shared-secret check.
    auth: AgentAuthenticator,
    /// Audit log.
    audit: AuditLog,
    /// Audit destination label.
    audit_label: String,
    /// Sandbox roots rendered for `/health`.
    allowed_roots: Vec<String>,
    /// Maximum request body size.
    max_body_bytes: usize,
}

impl AgentServer {
    /// Builds a server from validated configuration using real host processes.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration is invalid or the audit log
    /// cannot be opened.
    pub fn from_config(config: &AgentConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let policy = config.build_policy().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let audit = &config.server.audit;
        let (audit_sink, audit_label): (Arc<dyn AuditSink>, String) = match audit.sink {
            AuditSinkKind::Stderr => (Arc::new(StderrAuditSink), "stderr".to_string()),
            AuditSinkKind::File => {
                let path = PathBuf::from(&audit.path);
                let sink = FileAuditSink::new(&path).map_err(|err| {
                    ServerError::Init(format!("audit log {}: {err}", path.display()))
                })?;
                (Arc::new(sink), path.display().to_string())
            }
        };
        Ok(Self::from_parts(AgentServerParts {
            bind,
            policy,
            token: config.resolve_token(),
            executor: Arc::new(SystemExecutor),
            limits: ExecLimits {
                timeout: Duration::from_millis(config.exec.timeout_ms),
                max_output_bytes: config.exec.max_output_bytes,
            },
            audit_sink,
            audit_label,
            max_message_chars: audit.max_message_chars,
            max_body_bytes: config.server.max_body_bytes,
        }))
    }

    /// Builds a server from explicit parts.
    #[must_use]
    pub fn from_parts(parts: AgentServerParts) -> Self {
        let allowed_roots =
            parts.policy.sandbox.roots().iter().map(|root| root.display().to_string()).collect();
        let router = ToolRouter::new(ToolRouterConfig {
            policy: parts.policy,
            executor: parts.executor,
            limits: parts.limits,
        });
        Self {
            bind: parts.bind,
            state: Arc::new(ServerState {
                router,
                auth: AgentAuthenticator::new(parts.token),
                audit: AuditLog::new(parts.audit_sink, parts.max_message_chars),
                audit_label: parts.audit_label,
                allowed_roots,
                max_body_bytes: parts.max_body_bytes,
            }),
        }
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Builds the axum application.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/tool/run", post(handle_tool_run))
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Binds the configured address and serves until the process exits.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("bind {} failed: {err}", self.bind)))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already-bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener.local_addr().map_or_else(|_| self.bind.to_string(), |a| a.to_string());
        self.emit_startup(&local);
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }

    /// Emits the startup event and the missing-token warning.
    fn emit_startup(&self, local: &str) {
        let state = &self.state;
        LifecycleEvent::new(
            "agent_started",
            json!({
                "bind": local,
                "platform": platform_name(),
                "allowed_roots": state.allowed_roots,
                "token_configured": state.auth.is_configured(),
                "audit": state.audit_label,
            }),
        )
        .emit();
        if !state.auth.is_configured() {
            LifecycleEvent::new(
                "agent_token_missing",
                json!({
                    "message": "no agent token configured; /tool/run rejects every request",
                }),
            )
            .emit();
        }
    }
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `/tool/run` request body.
#[derive(Debug, Deserialize)]
struct RunRequest {
    /// Tool identifier.
    #[serde(default)]
    tool_name: Option<String>,
    /// Tool arguments.
    #[serde(default)]
    args: Option<Value>,
}

/// `/tool/run` response body.
#[derive(Debug, Serialize)]
struct RunResponse {
    /// Whether the tool succeeded.
    ok: bool,
    /// Tool result on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    /// Error text on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Audit id of the record written for this call.
    audit_id: String,
}

/// Handles `GET /health`.
async fn handle_health(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    axum::Json(json!({
        "ok": true,
        "service": SERVICE_NAME,
        "platform": platform_name(),
        "allowed_roots": state.allowed_roots,
    }))
}

/// Handles `POST /tool/run`.
async fn handle_tool_run(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    let ticket = state.audit.ticket();
    let attempt = run_tool(&state, &headers, body).await;
    state.audit.record(&ticket, attempt.tool.as_deref(), attempt.args.as_ref(), &attempt.outcome);
    let status = match &attempt.outcome {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err),
    };
    let response = match attempt.outcome {
        Ok(result) => RunResponse {
            ok: true,
            result: Some(result),
            error: None,
            audit_id: ticket.audit_id,
        },
        Err(err) => RunResponse {
            ok: false,
            result: None,
            error: Some(err.to_string()),
            audit_id: ticket.audit_id,
        },
    };
    (status, axum::Json(response))
}

/// Everything the audit record needs about one request.
struct ToolAttempt {
    /// Caller-supplied tool name, once the body was read.
    tool: Option<String>,
    /// Caller-supplied arguments, once the body was read.
    args: Option<Value>,
    /// Tool outcome.
    outcome: Result<Value, ToolError>,
}

impl ToolAttempt {
    /// An attempt rejected before the body was interpreted.
    const fn rejected(error: ToolError) -> Self {
        Self {
            tool: None,
            args: None,
            outcome: Err(error),
        }
    }
}

/// Authenticates, decodes, and dispatches one request.
async fn run_tool(
    state: &ServerState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ToolAttempt {
    let token = headers.get(AGENT_TOKEN_HEADER).map(HeaderValue::as_bytes);
    if state.auth.authenticate(token).is_err() {
        return ToolAttempt::rejected(ToolError::Unauthorized);
    }
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return ToolAttempt::rejected(ToolError::BodyTooLarge);
        }
        Err(rejection) => {
            return ToolAttempt::rejected(ToolError::MalformedBody(rejection.body_text()));
        }
    };
    let request: RunRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(err) => return ToolAttempt::rejected(ToolError::MalformedBody(err.to_string())),
    };
    let confirmed = is_confirmed(headers.get(CONFIRM_HEADER).map(HeaderValue::as_bytes));
    let call = ToolCall {
        tool_name: request.tool_name.clone(),
        args: request.args.clone(),
        confirmed,
    };
    let outcome = state.router.handle_tool_call(call).await;
    ToolAttempt {
        tool: request.tool_name,
        args: Some(request.args.unwrap_or_else(|| json!({}))),
        outcome,
    }
}

/// Maps a tool error class to an HTTP status.
const fn status_for(error: &ToolError) -> StatusCode {
    match error {
        ToolError::Unauthorized => StatusCode::UNAUTHORIZED,
        ToolError::Validation(_) | ToolError::MalformedBody(_) => StatusCode::BAD_REQUEST,
        ToolError::Disabled(_) => StatusCode::FORBIDDEN,
        ToolError::NotFound(_) => StatusCode::NOT_FOUND,
        ToolError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ToolError::Execution(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Agent server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
