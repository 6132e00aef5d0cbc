//! Commands accepted by [`EnvironmentSession::run`](super::EnvironmentSession::run).

use crate::error::{LaunchError, Result};

/// A command to run inside an environment.
///
/// Either a single shell-syntax string, split with shell-word rules, or an
/// already tokenized argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLine {
    Shell(String),
    Argv(Vec<String>),
}

impl CommandLine {
    /// Tokenize into an argument vector.
    pub fn into_argv(self) -> Result<Vec<String>> {
        let argv = match self {
            CommandLine::Shell(line) => shell_words::split(&line).map_err(|e| {
                LaunchError::Command(format!(
                    "failed to parse command '{}': {}\n\
                     Fix: check for unmatched quotes or invalid escape sequences.",
                    line, e
                ))
            })?,
            CommandLine::Argv(argv) => argv,
        };

        if argv.is_empty() {
            return Err(LaunchError::Command("command is empty".to_string()));
        }
        Ok(argv)
    }
}

impl From<&str> for CommandLine {
    fn from(line: &str) -> Self {
        CommandLine::Shell(line.to_string())
    }
}

impl From<String> for CommandLine {
    fn from(line: String) -> Self {
        CommandLine::Shell(line)
    }
}

impl From<Vec<String>> for CommandLine {
    fn from(argv: Vec<String>) -> Self {
        CommandLine::Argv(argv)
    }
}

impl From<&[String]> for CommandLine {
    fn from(argv: &[String]) -> Self {
        CommandLine::Argv(argv.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for CommandLine {
    fn from(argv: [&str; N]) -> Self {
        CommandLine::Argv(argv.iter().map(|s| s.to_string()).collect())
    }
}
