use crate::{Error, Result};
use std::fmt::Debug;

/// Output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit status, `0` on success.
    pub status: i32,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Whether the command exited with status `0`.
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// CommandExecute runs external programs, in practice the Azure CLI.
///
/// Implementations must capture stdout and stderr separately and must not
/// inherit stdin. A command that starts but exits non-zero is reported
/// through [`CommandOutput::status`], not as an error.
#[async_trait::async_trait]
pub trait CommandExecute: Debug + Send + Sync + 'static {
    /// Run `program` with `args`.
    async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput>;
}

/// CommandExecute that refuses to run anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCommandExecute;

#[async_trait::async_trait]
impl CommandExecute for NoopCommandExecute {
    async fn command_execute(&self, program: &str, _args: &[&str]) -> Result<CommandOutput> {
        Err(Error::unexpected(format!(
            "cannot run {program}: no command executor configured"
        )))
    }
}
