// local-agent-core/src/tooling.rs
// ============================================================================
// Module: Tooling Identifiers
// Description: Canonical tool identifiers and their static classification.
// Purpose: Closed capability set shared by config, router, and CLI.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Canonical tool identifiers accepted by `POST /tool/run`. These names are
//! part of the external contract surface. Every identifier carries a fixed
//! [`ToolClass`] that callers cannot influence; the classification is an
//! exhaustive match so a new variant cannot be added without classifying it.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names for the local agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Open a literal http/https URL in the default browser.
    OpenUrl,
    /// Open a URL resolved through the URL registry.
    OpenUrlId,
    /// Launch an application resolved through the app registry.
    OpenApp,
    /// Open a registered project folder.
    OpenProject,
    /// Reveal a sandboxed file in the file browser.
    RevealFile,
    /// Create (or overwrite) a sandboxed file.
    CreateFile,
    /// Create a sandboxed folder, including parents.
    CreateFolder,
    /// Delete a sandboxed file.
    DeleteFile,
    /// Recursively delete a sandboxed folder.
    DeleteFolder,
    /// Bounded name search across sandbox roots.
    SearchFiles,
    /// Fixed system information command.
    GetSystemInfo,
    /// Fixed process listing command.
    ListProcesses,
    /// Kill a process by pid.
    KillProcess,
    /// Arbitrary command execution (permanently disabled).
    RunCommand,
}

/// Static safety classification for a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClass {
    /// No irreversible state change.
    Safe,
    /// Irreversible state change; requires explicit confirmation.
    Destructive,
    /// Never executes, regardless of arguments or confirmation.
    Disabled,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenUrl => "open_url",
            Self::OpenUrlId => "open_url_id",
            Self::OpenApp => "open_app",
            Self::OpenProject => "open_project",
            Self::RevealFile => "reveal_file",
            Self::CreateFile => "create_file",
            Self::CreateFolder => "create_folder",
            Self::DeleteFile => "delete_file",
            Self::DeleteFolder => "delete_folder",
            Self::SearchFiles => "search_files",
            Self::GetSystemInfo => "get_system_info",
            Self::ListProcesses => "list_processes",
            Self::KillProcess => "kill_process",
            Self::RunCommand => "run_command",
        }
    }

    /// Returns the fixed classification for the tool.
    #[must_use]
    pub const fn class(self) -> ToolClass {
        match self {
            Self::OpenUrl
            | Self::OpenUrlId
            | Self::OpenApp
            | Self::OpenProject
            | Self::RevealFile
            | Self::CreateFile
            | Self::CreateFolder
            | Self::SearchFiles
            | Self::GetSystemInfo
            | Self::ListProcesses => ToolClass::Safe,
            Self::DeleteFile | Self::DeleteFolder | Self::KillProcess => ToolClass::Destructive,
            Self::RunCommand => ToolClass::Disabled,
        }
    }

    /// Returns true when the tool requires confirmation.
    #[must_use]
    pub const fn is_destructive(self) -> bool {
        matches!(self.class(), ToolClass::Destructive)
    }

    /// Returns all tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::OpenUrl,
            Self::OpenUrlId,
            Self::OpenApp,
            Self::OpenProject,
            Self::RevealFile,
            Self::CreateFile,
            Self::CreateFolder,
            Self::DeleteFile,
            Self::DeleteFolder,
            Self::SearchFiles,
            Self::GetSystemInfo,
            Self::ListProcesses,
            Self::KillProcess,
            Self::RunCommand,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl ToolClass {
    /// Returns the stable label for the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Destructive => "destructive",
            Self::Disabled => "disabled",
        }
    }
}

// ============================================================================
// SECTION: Invocation
// ============================================================================

/// A single parsed tool request. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Recognized tool identifier.
    pub tool: ToolName,
    /// Raw caller arguments (an object, or `{}` when omitted).
    pub args: Value,
}

impl ToolInvocation {
    /// Builds an invocation from a raw tool name and arguments.
    ///
    /// Returns `None` when the name is not part of the capability set.
    #[must_use]
    pub fn parse(name: &str, args: Option<Value>) -> Option<Self> {
        let tool = ToolName::parse(name)?;
        let args = match args {
            None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
            Some(value) => value,
        };
        Some(Self {
            tool,
            args,
        })
    }

    /// Destructive flag derived from the static classification.
    #[must_use]
    pub const fn is_destructive(&self) -> bool {
        self.tool.is_destructive()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
