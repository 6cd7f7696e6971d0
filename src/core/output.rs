//! Output destinations for the report.
//!
//! The destination is decided once per run: either stdout directly or the
//! stdin of a pager child process. The pager is found the way git finds it
//! (`GIT_PAGER`, `core.pager`, `PAGER`, then `less`) and `cat` or an empty
//! command disables paging.

use crate::core::error::{BriefError, Result};
use colored::*;
use std::io::{self, Write};
use std::process::{Child, Command, Stdio};

const DEFAULT_PAGER: &str = "less";
const DEFAULT_LESS: &str = "FRX";

/// Formats and prints an error message with consistent styling
///
/// # Format
/// ```text
/// ✕ Error: <message>
/// ```
///
/// "✕ Error:" is red. Errors go to stderr so they never reach a pager or a
/// JSON consumer.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✕ Error:".red(), message);
}

/// Pager program to run, or `None` when paging is disabled
pub fn pager_command(core_pager: Option<&str>) -> Option<String> {
    let command = std::env::var("GIT_PAGER")
        .ok()
        .or_else(|| core_pager.map(str::to_string))
        .or_else(|| std::env::var("PAGER").ok())
        .unwrap_or_else(|| DEFAULT_PAGER.to_string());
    select_pager(command)
}

fn select_pager(command: String) -> Option<String> {
    let trimmed = command.trim();
    if trimmed.is_empty() || trimmed == "cat" {
        return None;
    }
    Some(trimmed.to_string())
}

/// `LESS` value for the pager child. `forced` means paging was requested
/// although stdout is not a terminal; `F` would then quit at once, so it is
/// dropped.
pub fn less_flags(existing: Option<&str>, forced: bool) -> String {
    let flags = existing.unwrap_or(DEFAULT_LESS);
    if forced {
        flags.chars().filter(|c| *c != 'F').collect()
    } else {
        flags.to_string()
    }
}

pub enum Output {
    Stdout(io::Stdout),
    Pager { command: String, child: Child },
}

impl Output {
    pub fn stdout() -> Self {
        Output::Stdout(io::stdout())
    }

    pub fn pager(command: &str, forced: bool) -> Result<Self> {
        let less = less_flags(std::env::var("LESS").ok().as_deref(), forced);
        log::debug!("Starting pager '{command}' with LESS={less}");
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .env("LESS", less)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| BriefError::pager_failed(command, e))?;
        Ok(Output::Pager {
            command: command.to_string(),
            child,
        })
    }

    /// Write the whole report. A reader that went away early is not an error.
    pub fn write(&mut self, text: &str) -> Result<()> {
        let result = match self {
            Output::Stdout(stdout) => {
                let mut lock = stdout.lock();
                lock.write_all(text.as_bytes()).and_then(|_| lock.flush())
            }
            Output::Pager { child, .. } => match child.stdin.as_mut() {
                Some(stdin) => stdin.write_all(text.as_bytes()),
                None => Ok(()),
            },
        };
        match result {
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            other => other.map_err(BriefError::Io),
        }
    }

    /// Close the pager's input and wait for it to exit
    pub fn finish(self) -> Result<()> {
        if let Output::Pager { command, mut child } = self {
            drop(child.stdin.take());
            let status = child.wait()?;
            if !status.success() {
                log::debug!("Pager '{command}' exited with {status}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_error_does_not_panic() {
        print_error("Test error message");
    }

    #[test]
    fn test_select_pager() {
        assert_eq!(select_pager("less -S".to_string()).as_deref(), Some("less -S"));
        assert_eq!(select_pager("cat".to_string()), None);
        assert_eq!(select_pager("  ".to_string()), None);
    }

    #[test]
    fn test_less_flags() {
        assert_eq!(less_flags(None, false), "FRX");
        assert_eq!(less_flags(None, true), "RX");
        assert_eq!(less_flags(Some("FSR"), true), "SR");
        assert_eq!(less_flags(Some("FSR"), false), "FSR");
    }

    #[test]
    fn test_pager_receives_report() -> Result<()> {
        let mut output = Output::pager("cat > /dev/null", false)?;
        output.write("line\n")?;
        output.finish()
    }
}
