// local-agent-server/src/platform.rs
// ============================================================================
// Module: Host Primitives
// Description: The fixed per-OS table of program/argument templates.
// Purpose: Keep every host command in one closed, reviewable place.
// Dependencies: local-agent-core
// ============================================================================

//! ## Overview
//! One table per target OS family, selected at compile time. Each function
//! returns an [`Invocation`] whose arguments are discrete values; no entry
//! goes through `cmd.exe /c` or `sh -c`.
//!
//! | Primitive    | Windows                     | macOS / other Unix          |
//! |--------------|-----------------------------|-----------------------------|
//! | open target  | `explorer.exe <t>`          | `open <t>` / `xdg-open <t>` |
//! | reveal file  | `explorer.exe /select, <p>` | `open -R <p>` / `xdg-open`  |
//! | system info  | `systeminfo`                | `uname -a`                  |
//! | process list | `tasklist`                  | `ps -axo` / `ps -eo` fields |
//! | kill         | `taskkill /PID <pid> /F`    | `kill -9 <pid>`             |

use std::ffi::OsStr;
use std::path::Path;

use local_agent_core::ProcessId;

use crate::executor::Invocation;

/// Platform label reported by `/health`.
#[must_use]
pub const fn platform_name() -> &'static str {
    std::env::consts::OS
}

/// Opens a URL or folder with the host's default handler.
#[must_use]
pub fn open_target(target: impl AsRef<OsStr>) -> Invocation {
    let program = if cfg!(windows) {
        "explorer.exe"
    } else if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    };
    Invocation::new(program).arg(target)
}

/// Reveals a file in the host file browser.
#[must_use]
pub fn reveal(path: &Path) -> Invocation {
    if cfg!(windows) {
        Invocation::new("explorer.exe").arg("/select,").arg(path)
    } else if cfg!(target_os = "macos") {
        Invocation::new("open").arg("-R").arg(path)
    } else {
        // xdg-open has no select mode; open the containing folder instead.
        Invocation::new("xdg-open").arg(path.parent().unwrap_or(path))
    }
}

/// Opens a folder in the configured editor.
#[must_use]
pub fn open_in_editor(editor: &Path, folder: &Path) -> Invocation {
    Invocation::new(editor).arg(folder)
}

/// Fixed system information command.
#[must_use]
pub fn system_info() -> Invocation {
    if cfg!(windows) { Invocation::new("systeminfo") } else { Invocation::new("uname").arg("-a") }
}

/// Fixed process listing command.
#[must_use]
pub fn process_list() -> Invocation {
    if cfg!(windows) {
        Invocation::new("tasklist")
    } else if cfg!(target_os = "macos") {
        Invocation::new("ps").arg("-axo").arg("pid,ppid,user,comm")
    } else {
        Invocation::new("ps").arg("-eo").arg("pid,ppid,user,comm")
    }
}

/// Fixed kill command with the pid as a discrete argument.
#[must_use]
pub fn kill(pid: ProcessId) -> Invocation {
    let pid = pid.to_string();
    if cfg!(windows) {
        Invocation::new("taskkill").arg("/PID").arg(pid).arg("/F")
    } else {
        Invocation::new("kill").arg("-9").arg(pid)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use std::ffi::OsString;

    use local_agent_core::ProcessId;
    use serde_json::json;

    use super::kill;
    use super::open_target;

    #[test]
    fn kill_passes_pid_as_single_argument() {
        let pid = ProcessId::parse(&json!("4242")).unwrap();
        let invocation = kill(pid);
        assert!(invocation.args.contains(&OsString::from("4242")));
        assert!(!invocation.to_string().contains(';'));
    }

    #[test]
    fn open_target_never_uses_a_shell() {
        let invocation = open_target("https://example.com/?q=a&b=c");
        let program = invocation.program.to_string_lossy().to_lowercase();
        assert!(!program.contains("cmd") && program != "sh" && program != "bash");
        assert_eq!(invocation.args, vec![OsString::from("https://example.com/?q=a&b=c")]);
    }
}
