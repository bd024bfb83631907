//! Debug switches for the compiler and VM.
//!
//! Settings are layered: defaults, then environment variables, then command
//! line flags. The REPL can flip them at runtime.

use tracing::warn;

/// Environment variable that enables the post-compile chunk dump.
pub const PRINT_CODE_VAR: &str = "BNUUY_PRINT_CODE";
/// Environment variable that enables execution tracing.
pub const TRACE_EXECUTION_VAR: &str = "BNUUY_TRACE_EXECUTION";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Dump each compiled chunk through the disassembler before running it.
    pub print_code: bool,
    /// Print the stack and the next instruction before every dispatch.
    pub trace_execution: bool,
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay settings found through `lookup`. Unset keys leave a setting alone.
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(enabled) = read_flag(&lookup, PRINT_CODE_VAR) {
            self.print_code = enabled;
        }
        if let Some(enabled) = read_flag(&lookup, TRACE_EXECUTION_VAR) {
            self.trace_execution = enabled;
        }
        self
    }
}

fn read_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    let value = lookup(key)?;
    let parsed = parse_flag(&value);
    if parsed.is_none() {
        warn!(key, value = %value, "ignoring unrecognized boolean setting");
    }
    parsed
}

/// Parse an on/off setting (`1`/`true`/`yes`/`on` and their opposites).
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
