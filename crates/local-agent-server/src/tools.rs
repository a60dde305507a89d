// local-agent-server/src/tools.rs
// ============================================================================
// Module: Tool Router
// Description: Capability dispatch for `/tool/run` requests.
// Purpose: Route each recognized tool to exactly one fixed handler.
// Dependencies: local-agent-core, local-agent-config, serde, tokio
// ============================================================================

//! ## Overview
//! [`ToolRouter::handle_tool_call`] applies the gates in a fixed order:
//!
//! 1. tool name present,
//! 2. tool name recognized,
//! 3. tool not disabled,
//! 4. confirmation present for destructive tools,
//! 5. arguments decode into the tool's request type,
//! 6. sandbox / registry validation inside the handler,
//! 7. the host action.
//!
//! Nothing before step 7 touches the filesystem or spawns a process, with
//! the exception of read-only existence checks during validation.
//! Security posture: arguments originate from a language model and are
//! untrusted; they only ever reach the host as a [`SandboxedPath`], a
//! registry value, a validated URL, or a [`ProcessId`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::path::Path;
use std::sync::Arc;

use local_agent_config::AgentPolicy;
use local_agent_core::InvalidPid;
use local_agent_core::ProcessId;
use local_agent_core::RegistryError;
use local_agent_core::SandboxError;
use local_agent_core::SandboxedPath;
use local_agent_core::SearchError;
use local_agent_core::ToolClass;
use local_agent_core::ToolName;
use local_agent_core::parse_http_url;
use local_agent_core::search_roots;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::executor::ExecError;
use crate::executor::ExecLimits;
use crate::executor::HostExecutor;
use crate::executor::Invocation;
use crate::platform;

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Tool router for `/tool/run` requests.
#[derive(Clone)]
pub struct ToolRouter {
    /// Immutable sandbox and registries.
    policy: Arc<AgentPolicy>,
    /// Host primitive executor.
    executor: Arc<dyn HostExecutor>,
    /// Limits for blocking host commands.
    limits: ExecLimits,
}

/// Configuration inputs for building a tool router.
pub struct ToolRouterConfig {
    /// Immutable sandbox and registries.
    pub policy: AgentPolicy,
    /// Host primitive executor.
    pub executor: Arc<dyn HostExecutor>,
    /// Limits for blocking host commands.
    pub limits: ExecLimits,
}

/// One decoded `/tool/run` call.
#[derive(Debug, Clone, Default)]
pub struct ToolCall {
    /// Caller-supplied tool name.
    pub tool_name: Option<String>,
    /// Caller-supplied arguments.
    pub args: Option<Value>,
    /// Whether `x-confirm: YES` was present.
    pub confirmed: bool,
}

impl ToolRouter {
    /// Creates a new tool router.
    #[must_use]
    pub fn new(config: ToolRouterConfig) -> Self {
        Self {
            policy: Arc::new(config.policy),
            executor: config.executor,
            limits: config.limits,
        }
    }

    /// Returns the policy the router enforces.
    #[must_use]
    pub fn policy(&self) -> &AgentPolicy {
        &self.policy
    }

    /// Handles a tool call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when any gate rejects the call or the host
    /// action fails.
    pub async fn handle_tool_call(&self, call: ToolCall) -> Result<Value, ToolError> {
        let name = call
            .tool_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ToolError::Validation("Missing tool_name".to_string()))?;
        let tool = ToolName::parse(name)
            .ok_or_else(|| ToolError::Validation("Unknown tool".to_string()))?;
        match tool.class() {
            ToolClass::Disabled => {
                return Err(ToolError::Disabled(format!("{tool} is disabled for security")));
            }
            ToolClass::Destructive if !call.confirmed => {
                return Err(ToolError::Validation(
                    "Confirmation required (x-confirm: YES)".to_string(),
                ));
            }
            ToolClass::Safe | ToolClass::Destructive => {}
        }
        let payload = match call.args {
            None | Some(Value::Null) => json!({}),
            Some(value) => value,
        };
        match tool {
            ToolName::OpenUrl => self.handle_open_url(decode(payload)?).await,
            ToolName::OpenUrlId => self.handle_open_url_id(decode(payload)?).await,
            ToolName::OpenApp => self.handle_open_app(decode(payload)?).await,
            ToolName::OpenProject => self.handle_open_project(decode(payload)?).await,
            ToolName::RevealFile => self.handle_reveal_file(decode(payload)?).await,
            ToolName::CreateFile => self.handle_create_file(decode(payload)?).await,
            ToolName::CreateFolder => self.handle_create_folder(decode(payload)?).await,
            ToolName::DeleteFile => self.handle_delete_file(decode(payload)?).await,
            ToolName::DeleteFolder => self.handle_delete_folder(decode(payload)?).await,
            ToolName::SearchFiles => self.handle_search_files(decode(payload)?).await,
            ToolName::GetSystemInfo => self.run_text(&platform::system_info()).await,
            ToolName::ListProcesses => self.run_text(&platform::process_list()).await,
            ToolName::KillProcess => self.handle_kill_process(decode(payload)?).await,
            ToolName::RunCommand => {
                Err(ToolError::Disabled(format!("{tool} is disabled for security")))
            }
        }
    }
}

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// `open_url` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenUrlRequest {
    /// Literal http/https URL.
    url: Option<String>,
}

/// `open_url_id` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenUrlIdRequest {
    /// URL registry id.
    id: Option<String>,
}

/// `open_app` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAppRequest {
    /// App registry id.
    app_id: Option<String>,
}

/// `open_project` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenProjectRequest {
    /// Project registry id.
    project_id: Option<String>,
}

/// Arguments for tools that take a single path.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PathRequest {
    /// Caller-supplied path.
    path: Option<String>,
}

/// `create_file` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateFileRequest {
    /// Caller-supplied path.
    path: Option<String>,
    /// UTF-8 file content.
    content: Option<String>,
}

/// `search_files` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchRequest {
    /// Name substring.
    query: Option<String>,
}

/// `kill_process` arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KillRequest {
    /// Process id as a JSON integer or digit string.
    pid: Value,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

impl ToolRouter {
    async fn handle_open_url(&self, request: OpenUrlRequest) -> Result<Value, ToolError> {
        let url = parse_http_url(request.url.as_deref().unwrap_or_default())?;
        self.executor.launch_detached(&platform::open_target(url.as_str())).await?;
        Ok(json!("URL opened"))
    }

    async fn handle_open_url_id(&self, request: OpenUrlIdRequest) -> Result<Value, ToolError> {
        let id = normalize_id(request.id.as_deref());
        let url = self.policy.urls.lookup(&id)?;
        self.executor.launch_detached(&platform::open_target(url.as_str())).await?;
        Ok(json!(format!("Opened URL id: {id}")))
    }

    async fn handle_open_app(&self, request: OpenAppRequest) -> Result<Value, ToolError> {
        let app_id = normalize_id(request.app_id.as_deref());
        let program = self.policy.apps.resolve_executable(&app_id)?;
        self.executor.launch_detached(&Invocation::new(program)).await?;
        Ok(json!(format!("Opened {app_id}")))
    }

    async fn handle_open_project(&self, request: OpenProjectRequest) -> Result<Value, ToolError> {
        let project_id = normalize_id(request.project_id.as_deref());
        let project = self.policy.projects.lookup(&project_id)?;
        let folder = self.policy.sandbox.resolve(&project.folder.to_string_lossy())?;
        if project.reveal {
            self.executor.launch_detached(&platform::open_target(folder.as_path())).await?;
        }
        if project.open_in_editor {
            let invocation =
                platform::open_in_editor(&self.policy.editor_program, folder.as_path());
            self.executor.launch_detached(&invocation).await?;
        }
        Ok(json!(format!("Opened project {project_id}")))
    }

    async fn handle_reveal_file(&self, request: PathRequest) -> Result<Value, ToolError> {
        let target = self.sandboxed(request.path.as_deref())?;
        if !exists(target.as_path()).await? {
            return Err(ToolError::NotFound("File not found".to_string()));
        }
        self.executor.launch_detached(&platform::reveal(target.as_path())).await?;
        Ok(json!("File revealed"))
    }

    async fn handle_create_file(&self, request: CreateFileRequest) -> Result<Value, ToolError> {
        let target = self.sandboxed(request.path.as_deref())?;
        if let Some(parent) = target.as_path().parent() {
            self.create_dirs_within(parent).await?;
        }
        let content = request.content.unwrap_or_default();
        tokio::fs::write(target.as_path(), content).await.map_err(ToolError::from_io)?;
        Ok(json!("File created"))
    }

    async fn handle_create_folder(&self, request: PathRequest) -> Result<Value, ToolError> {
        let target = self.sandboxed(request.path.as_deref())?;
        self.create_dirs_within(target.as_path()).await?;
        Ok(json!("Folder created"))
    }

    async fn handle_delete_file(&self, request: PathRequest) -> Result<Value, ToolError> {
        let target = self.sandboxed(request.path.as_deref())?;
        let entry = target.entry_path();
        match tokio::fs::symlink_metadata(entry).await {
            Ok(meta) if meta.is_dir() => {
                return Err(ToolError::Validation("Path is not a file".to_string()));
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound("File not found".to_string()));
            }
            Err(err) => return Err(ToolError::from_io(err)),
        }
        remove_link_or_file(entry).await.map_err(ToolError::from_io)?;
        Ok(json!("File deleted"))
    }

    async fn handle_delete_folder(&self, request: PathRequest) -> Result<Value, ToolError> {
        let target = self.sandboxed(request.path.as_deref())?;
        let entry = target.entry_path();
        let sandbox = &self.policy.sandbox;
        if sandbox.is_root(target.as_path()) || sandbox.is_root(entry) {
            return Err(ToolError::Validation("Refusing to delete a sandbox root".to_string()));
        }
        match tokio::fs::symlink_metadata(entry).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                // The link goes; the folder it points at stays.
                if !is_dir(target.as_path()).await? {
                    return Err(ToolError::Validation("Path is not a folder".to_string()));
                }
                remove_link_or_file(entry).await.map_err(ToolError::from_io)?;
                return Ok(json!("Folder deleted"));
            }
            Ok(meta) if !meta.is_dir() => {
                return Err(ToolError::Validation("Path is not a folder".to_string()));
            }
            Ok(_) => {}
            // Forceful delete: a folder that is already gone is success.
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(json!("Folder deleted"));
            }
            Err(err) => return Err(ToolError::from_io(err)),
        }
        tokio::fs::remove_dir_all(entry).await.map_err(ToolError::from_io)?;
        Ok(json!("Folder deleted"))
    }

    async fn handle_search_files(&self, request: SearchRequest) -> Result<Value, ToolError> {
        let query = request.query.unwrap_or_default();
        let roots = self.policy.sandbox.roots().to_vec();
        let limits = self.policy.search.clone();
        let hits = tokio::task::spawn_blocking(move || search_roots(&roots, &query, &limits))
            .await
            .map_err(|err| ToolError::Execution(format!("search join failed: {err}")))??;
        let paths: Vec<String> = hits.iter().map(|path| path.display().to_string()).collect();
        Ok(json!(paths))
    }

    async fn handle_kill_process(&self, request: KillRequest) -> Result<Value, ToolError> {
        let pid = ProcessId::parse(&request.pid)?;
        self.executor.run_fixed(&platform::kill(pid), self.limits).await?;
        Ok(json!(format!("Process {pid} killed")))
    }

    /// Runs a fixed, parameterless command and returns its stdout.
    async fn run_text(&self, invocation: &Invocation) -> Result<Value, ToolError> {
        let stdout = self.executor.run_fixed(invocation, self.limits).await?;
        Ok(Value::String(stdout))
    }

    /// Resolves an optional caller path through the sandbox.
    fn sandboxed(&self, raw: Option<&str>) -> Result<SandboxedPath, ToolError> {
        Ok(self.policy.sandbox.resolve(raw.unwrap_or_default())?)
    }

    /// Creates `dir` and its missing ancestors.
    ///
    /// Every directory that would be created must lie inside the sandbox, so
    /// a root that does not exist yet never causes its parents to appear.
    async fn create_dirs_within(&self, dir: &Path) -> Result<(), ToolError> {
        let mut missing = Vec::new();
        let mut cursor = Some(dir);
        while let Some(current) = cursor {
            if exists(current).await? {
                break;
            }
            if !self.policy.sandbox.contains(current) {
                return Err(SandboxError::NotAllowed.into());
            }
            missing.push(current);
            cursor = current.parent();
        }
        for current in missing.into_iter().rev() {
            match tokio::fs::create_dir(current).await {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                Err(err) => return Err(ToolError::from_io(err)),
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool call errors. Each variant is one audit/HTTP error class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// Missing or incorrect credential.
    #[error("Unauthorized")]
    Unauthorized,
    /// Rejected before any side effect.
    #[error("{0}")]
    Validation(String),
    /// Side-effect-free lookup found nothing.
    #[error("{0}")]
    NotFound(String),
    /// The host action was attempted and failed.
    #[error("{0}")]
    Execution(String),
    /// Tool is permanently disabled.
    #[error("{0}")]
    Disabled(String),
    /// Request body is not a JSON object.
    #[error("Invalid request body: {0}")]
    MalformedBody(String),
    /// Request body exceeds the configured limit.
    #[error("Request body too large")]
    BodyTooLarge,
}

impl ToolError {
    /// Stable error class label used in audit records.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "auth",
            Self::Validation(_) | Self::MalformedBody(_) | Self::BodyTooLarge => "validation",
            Self::NotFound(_) => "not_found",
            Self::Execution(_) => "execution",
            Self::Disabled(_) => "disabled",
        }
    }

    /// Maps a filesystem failure after the action was attempted.
    fn from_io(err: io::Error) -> Self {
        Self::Execution(err.to_string())
    }
}

impl From<SandboxError> for ToolError {
    fn from(error: SandboxError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<RegistryError> for ToolError {
    fn from(error: RegistryError) -> Self {
        if error.is_not_found() {
            Self::NotFound(error.to_string())
        } else {
            Self::Validation(error.to_string())
        }
    }
}

impl From<SearchError> for ToolError {
    fn from(error: SearchError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<InvalidPid> for ToolError {
    fn from(error: InvalidPid) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<ExecError> for ToolError {
    fn from(error: ExecError) -> Self {
        Self::Execution(error.to_string())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a JSON value into a typed request payload.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, ToolError> {
    serde_json::from_value(payload)
        .map_err(|err| ToolError::Validation(format!("Invalid arguments: {err}")))
}

/// Normalizes an optional caller-supplied registry id.
fn normalize_id(raw: Option<&str>) -> String {
    local_agent_core::normalize_id(raw.unwrap_or_default())
}

/// Returns true when something exists at the path (links not followed).
async fn exists(path: &Path) -> Result<bool, ToolError> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ToolError::from_io(err)),
    }
}

/// Returns true when the path is a directory (links followed).
async fn is_dir(path: &Path) -> Result<bool, ToolError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ToolError::from_io(err)),
    }
}

/// Removes a file or a symlink itself, never a link target.
async fn remove_link_or_file(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        // Windows directory links are removed as directories.
        Err(err) if cfg!(windows) => tokio::fs::remove_dir(path).await.map_err(|_| err),
        Err(err) => Err(err),
    }
}
