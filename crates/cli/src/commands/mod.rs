pub mod checkout;
pub mod config;
pub mod doctor;
pub mod inputs;
pub mod migrate;
pub mod price;
pub mod rule_edit;
pub mod rules;
pub mod sales;
mod storage;
pub mod summary;

use serde::Serialize;

/// What a command prints and the process exit code that goes with it.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

/// One-line status document shared by every command that has nothing richer
/// to report.
#[derive(Debug, Serialize)]
struct StatusLine<'a> {
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let line = StatusLine { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: render(&line) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let line = StatusLine {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: render(&line) }
    }

    /// Pretty-printed structured report for a successful command.
    pub fn report<T: Serialize>(command: &str, report: &T) -> Self {
        match serde_json::to_string_pretty(report) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 1),
        }
    }
}

fn render(line: &StatusLine<'_>) -> String {
    serde_json::to_string(line).unwrap_or_else(|error| {
        let message = error.to_string().replace('\\', "\\\\").replace('"', "\\\"");
        format!(
            "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{message}\"}}",
            line.command
        )
    })
}
