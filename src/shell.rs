use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::debug;

/// Failures from the external control tools.
///
/// `FieldNotFound` lives here too: a metadata query that succeeds at the
/// process level can still come back without a field the caller requires.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to launch `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}: {output}")]
    Failed {
        program: String,
        status: ExitStatus,
        output: String,
    },

    #[error("could not find `{0}` in player metadata")]
    FieldNotFound(String),
}

/// The seam between the controllers and the system. Production code uses
/// [`SystemRunner`]; tests inject scripted runners to assert on the exact
/// argv a controller issues.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its combined stdout + stderr.
    ///
    /// The player tool reports "No players found" on stderr, so both streams
    /// are captured together. With `check` set, a non-zero exit becomes
    /// [`CommandError::Failed`]; without it the output is returned as-is and
    /// the caller decides what the text means.
    fn run(&self, program: &str, args: &[&str], check: bool) -> Result<String, CommandError>;
}

/// Runs commands with `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], check: bool) -> Result<String, CommandError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        debug!(program, ?args, output = %text.trim_end(), "ran command");

        if check && !output.status.success() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status,
                output: text,
            });
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = SystemRunner.run("echo", &["hello"], true).unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_an_error_when_checked() {
        let err = SystemRunner.run("false", &[], true).unwrap_err();
        assert!(matches!(err, CommandError::Failed { .. }));
    }

    #[test]
    fn nonzero_exit_is_tolerated_when_unchecked() {
        assert!(SystemRunner.run("false", &[], false).is_ok());
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = SystemRunner
            .run("definitely-not-a-real-binary", &[], true)
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
