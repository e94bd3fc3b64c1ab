// src/error.rs

//! Error types for recipe orchestration
//!
//! Every failure that aborts a build maps to exactly one variant, and the
//! variants that belong to a lifecycle phase name that phase in their
//! message so the process exit message says where the build stopped.

use crate::cmake::failed_tests;
use crate::orchestrator::{BuildState, Phase};
use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid recipe: {0}")]
    ParseError(String),

    #[error("Invalid settings: {0}")]
    SettingsError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("export failed: {0}")]
    ExportError(String),

    #[error("layout failed: {0}")]
    LayoutError(String),

    /// A declared build requirement could not be located
    #[error("build_requirements failed: unresolved requirement(s): {}", .0.join(", "))]
    ResolutionError(Vec<String>),

    #[error("build failed during configure: {0}")]
    ConfigurationError(String),

    /// The native build exited non-zero
    #[error("build failed during compile ({}): {message}", display_status(*.status))]
    CompilationError {
        status: Option<i32>,
        message: String,
    },

    #[error("build failed during test: {}", test_failure(*.failed, *.total, .output))]
    TestFailure {
        failed: usize,
        total: usize,
        output: String,
    },

    /// The test step ran but nothing was executed
    #[error("build failed during test: no tests were run ({0})")]
    NoTestsRun(String),

    #[error("package failed during install: {0}")]
    InstallError(String),

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: BuildState, to: BuildState },
}

impl Error {
    /// The lifecycle phase this error aborted, if it belongs to one
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::LayoutError(_) => Some(Phase::Layout),
            Error::ResolutionError(_) => Some(Phase::BuildRequirements),
            Error::ConfigurationError(_)
            | Error::CompilationError { .. }
            | Error::TestFailure { .. }
            | Error::NoTestsRun(_) => Some(Phase::Build),
            Error::InstallError(_) => Some(Phase::Package),
            _ => None,
        }
    }
}

fn display_status(status: Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {}", code),
        None => "no exit status".to_string(),
    }
}

/// Counts plus the names ctest listed as failed
fn test_failure(failed: usize, total: usize, output: &str) -> String {
    let mut message = if total == 0 {
        match output.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
            Some(last) => format!("ctest reported failure ({})", last),
            None => "ctest reported failure".to_string(),
        }
    } else {
        format!("{} of {} test(s) failed", failed, total)
    };

    let names = failed_tests(output);
    if !names.is_empty() {
        message.push_str(": ");
        message.push_str(&names.join(", "));
    }
    message
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ParseError(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::IoError(format!("Failed to (de)serialize JSON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_phase() {
        let err = Error::ResolutionError(vec!["gtest/1.14.0".to_string()]);
        assert!(err.to_string().starts_with("build_requirements failed"));
        assert!(err.to_string().contains("gtest/1.14.0"));

        let err = Error::CompilationError {
            status: Some(2),
            message: "undefined reference".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "build failed during compile (exit status 2): undefined reference"
        );

        let err = Error::TestFailure {
            failed: 1,
            total: 4,
            output: String::new(),
        };
        assert_eq!(err.to_string(), "build failed during test: 1 of 4 test(s) failed");

        let err = Error::TestFailure {
            failed: 1,
            total: 4,
            output: "The following tests FAILED:\n\t  3 - MatrixTest.Inverse (Failed)\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "build failed during test: 1 of 4 test(s) failed: MatrixTest.Inverse"
        );

        let err = Error::CompilationError {
            status: None,
            message: "Failed to run cmake: No such file or directory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "build failed during compile (no exit status): Failed to run cmake: No such file or directory"
        );
    }

    #[test]
    fn test_error_phase() {
        assert_eq!(
            Error::ResolutionError(Vec::new()).phase(),
            Some(Phase::BuildRequirements)
        );
        assert_eq!(Error::NoTestsRun("x".into()).phase(), Some(Phase::Build));
        assert_eq!(Error::InstallError("x".into()).phase(), Some(Phase::Package));
        assert_eq!(Error::ParseError("x".into()).phase(), None);
    }
}
