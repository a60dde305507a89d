// local-agent-server/tests/common/mod.rs
// =============================================================================
// Module: Server Test Helpers
// Description: Recording executor, memory audit sink, and temp sandboxes.
// Purpose: Exercise tool routing without touching real host programs.
// =============================================================================

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test helpers are selectively used across suites."
)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use local_agent_config::AgentConfig;
use local_agent_config::AgentPolicy;
use local_agent_core::AppEntry;
use local_agent_core::ProjectEntry;
use local_agent_server::AgentServer;
use local_agent_server::AgentServerParts;
use local_agent_server::AuditSink;
use local_agent_server::ExecError;
use local_agent_server::ExecLimits;
use local_agent_server::HostExecutor;
use local_agent_server::Invocation;
use local_agent_server::ToolRouter;
use local_agent_server::ToolRouterConfig;
use local_agent_server::ToolRunRecord;
use tempfile::TempDir;

/// Shared secret used by server fixtures.
pub const TEST_TOKEN: &str = "integration-test-token";

/// Executor that records invocations instead of running them.
#[derive(Default)]
pub struct RecordingExecutor {
    /// Detached launches in call order.
    pub launched: Mutex<Vec<Invocation>>,
    /// Blocking runs in call order.
    pub ran: Mutex<Vec<Invocation>>,
}

impl RecordingExecutor {
    /// Returns every recorded invocation, launches first.
    pub fn all(&self) -> Vec<Invocation> {
        let mut all = self.launched.lock().unwrap().clone();
        all.extend(self.ran.lock().unwrap().iter().cloned());
        all
    }
}

#[async_trait]
impl HostExecutor for RecordingExecutor {
    async fn launch_detached(&self, invocation: &Invocation) -> Result<(), ExecError> {
        self.launched.lock().unwrap().push(invocation.clone());
        Ok(())
    }

    async fn run_fixed(
        &self,
        invocation: &Invocation,
        _limits: ExecLimits,
    ) -> Result<String, ExecError> {
        self.ran.lock().unwrap().push(invocation.clone());
        Ok(format!("ran {invocation}"))
    }
}

/// Audit sink that keeps records in memory.
#[derive(Default)]
pub struct MemoryAuditSink {
    /// Records in write order.
    pub records: Mutex<Vec<ToolRunRecord>>,
}

impl MemoryAuditSink {
    /// Returns the number of records written so far.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Returns the most recent record.
    pub fn last(&self) -> ToolRunRecord {
        self.records.lock().unwrap().last().cloned().expect("audit record")
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &ToolRunRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// A temporary sandbox root plus the policy built around it.
pub struct Sandbox {
    /// Keeps the directory alive.
    pub dir: TempDir,
    /// Policy whose only root is `dir`.
    pub policy: AgentPolicy,
}

impl Sandbox {
    /// Returns `name` joined onto the sandbox root.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Returns `name` joined onto the sandbox root as a string argument.
    pub fn arg(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }
}

/// Builds a sandbox whose registries hold a few deterministic entries.
pub fn sandbox() -> Sandbox {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AgentConfig::from_toml("").unwrap();
    config.sandbox.roots = vec![dir.path().display().to_string()];
    config.apps = BTreeMap::from([
        ("editor".to_string(), AppEntry::Program {
            program: "code".to_string(),
        }),
        ("chrome".to_string(), AppEntry::Candidates {
            paths: vec![missing_absolute("chrome-a"), missing_absolute("chrome-b")],
        }),
    ]);
    config.urls = BTreeMap::from([("github".to_string(), "https://github.com/".to_string())]);
    config.projects = BTreeMap::from([
        ("site".to_string(), ProjectEntry {
            folder: dir.path().join("site"),
            reveal: true,
            open_in_editor: true,
        }),
        ("outside".to_string(), ProjectEntry {
            folder: std::env::temp_dir(),
            reveal: true,
            open_in_editor: false,
        }),
    ]);
    let policy = config.build_policy().unwrap();
    Sandbox {
        dir,
        policy,
    }
}

/// Builds a router over the sandbox with a recording executor.
pub fn router(sandbox: &Sandbox) -> (ToolRouter, Arc<RecordingExecutor>) {
    let executor = Arc::new(RecordingExecutor::default());
    let router = ToolRouter::new(ToolRouterConfig {
        policy: sandbox.policy.clone(),
        executor: Arc::clone(&executor) as Arc<dyn HostExecutor>,
        limits: ExecLimits::default(),
    });
    (router, executor)
}

/// Builds a router whose sandbox holds exactly `roots` and no registries.
pub fn router_for_roots(roots: &[PathBuf]) -> (ToolRouter, Arc<RecordingExecutor>) {
    let mut config = AgentConfig::from_toml("").unwrap();
    config.sandbox.roots = roots.iter().map(|root| root.display().to_string()).collect();
    let executor = Arc::new(RecordingExecutor::default());
    let router = ToolRouter::new(ToolRouterConfig {
        policy: config.build_policy().unwrap(),
        executor: Arc::clone(&executor) as Arc<dyn HostExecutor>,
        limits: ExecLimits::default(),
    });
    (router, executor)
}

/// Builds a server over the sandbox with recording executor and memory audit.
pub fn server(
    sandbox: &Sandbox,
    token: Option<&str>,
) -> (AgentServer, Arc<RecordingExecutor>, Arc<MemoryAuditSink>) {
    let executor = Arc::new(RecordingExecutor::default());
    let audit = Arc::new(MemoryAuditSink::default());
    let server = AgentServer::from_parts(AgentServerParts {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        policy: sandbox.policy.clone(),
        token: token.map(str::to_string),
        executor: Arc::clone(&executor) as Arc<dyn HostExecutor>,
        limits: ExecLimits::default(),
        audit_sink: Arc::clone(&audit) as Arc<dyn AuditSink>,
        audit_label: "memory".to_string(),
        max_message_chars: 4000,
        max_body_bytes: 64 * 1024,
    });
    (server, executor, audit)
}

/// An absolute path that does not exist on this host.
fn missing_absolute(name: &str) -> PathBuf {
    let base = if cfg!(windows) { Path::new("C:\\") } else { Path::new("/") };
    base.join("local-agent-missing").join(name)
}
