// local-agent-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starting point printed by `local-agent config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `local-agent.toml`. The `[apps]` table is chosen
//! for the build target so the example validates as-is on every platform.

/// Returns a canonical example `local-agent.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    let mut example = String::from(
        r#"[server]
bind = "127.0.0.1:8787"
max_body_bytes = 1048576

[server.auth]
# Prefer the environment variable; an inline token is read first when set.
token_env = "LOCAL_AGENT_TOKEN"
# token = "replace-with-a-long-random-string"

[server.audit]
sink = "file"
path = "local-agent-audit.log"
max_message_chars = 4000

[sandbox]
roots = ["~/Projects", "~/Documents", "~/Desktop"]

[search]
max_results = 30
max_depth = 8
skip_dirs = [".git", "node_modules"]

[exec]
timeout_ms = 30000
max_output_bytes = 1048576

[editor]
program = "code"

[urls]
github = "https://github.com/"
calendar = "https://calendar.google.com/calendar/u/0/r"

[projects.website]
folder = "~/Projects/website"
reveal = true
open_in_editor = true
"#,
    );
    example.push_str(APPS_EXAMPLE);
    example
}

/// Platform-specific `[apps]` table; candidate paths must be absolute on the host.
#[cfg(windows)]
const APPS_EXAMPLE: &str = r#"
[apps]
vscode = { program = "code.cmd" }
chrome = { paths = [
  'C:\Program Files\Google\Chrome\Application\chrome.exe',
  'C:\Program Files (x86)\Google\Chrome\Application\chrome.exe',
] }
"#;

/// Platform-specific `[apps]` table; candidate paths must be absolute on the host.
#[cfg(target_os = "macos")]
const APPS_EXAMPLE: &str = r#"
[apps]
vscode = { program = "code" }
chrome = { paths = ["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"] }
"#;

/// Platform-specific `[apps]` table; candidate paths must be absolute on the host.
#[cfg(not(any(windows, target_os = "macos")))]
const APPS_EXAMPLE: &str = r#"
[apps]
vscode = { program = "code" }
chrome = { paths = ["/usr/bin/google-chrome", "/usr/bin/chromium"] }
"#;
