//! CLI error types and exit codes

use idgov_connector::error::ConnectorError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Authentication failed
/// - 3: Network error
/// - 4: Invalid input or configuration
/// - 5: Directory rejected the request
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Connector(e) => match e {
                ConnectorError::AuthenticationFailed { .. } => 2,
                ConnectorError::Transport { .. } | ConnectorError::ConnectionFailed { .. } => 3,
                ConnectorError::UnsupportedOperation { .. }
                | ConnectorError::InvalidConfiguration { .. }
                | ConnectorError::InvalidData { .. } => 4,
                ConnectorError::DownstreamRequest { .. } => 5,
            },
            CliError::Config(_) | CliError::Input(_) => 4,
            CliError::Io(_) => 1,
        }
    }

    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Input(format!("JSON error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            CliError::from(ConnectorError::authentication_failed("x")).exit_code(),
            2
        );
        assert_eq!(
            CliError::from(ConnectorError::connection_failed("x")).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(ConnectorError::downstream("list accounts", 500, "")).exit_code(),
            5
        );
        assert_eq!(
            CliError::from(ConnectorError::UnsupportedOperation { op: "x".into() }).exit_code(),
            4
        );
        assert_eq!(CliError::Input("bad".into()).exit_code(), 4);
    }

    #[test]
    fn test_connector_error_display_is_transparent() {
        let err = CliError::from(ConnectorError::downstream("read account `1`", 404, "missing"));
        assert_eq!(
            err.to_string(),
            "Issue when trying to read account `1` - 404 - missing"
        );
    }
}
