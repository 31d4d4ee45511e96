use azauth_command_execute_tokio::TokioCommandExecute;
use azauth_core::{Context, OsEnv};
use azauth_file_read_tokio::TokioFileRead;
use azauth_http_send_reqwest::ReqwestHttpSend;
use std::time::Duration;

/// Upper bound for a single Azure CLI invocation.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Context`] reading files with tokio, sending requests with reqwest,
/// running commands as tokio processes and reading the process environment.
pub fn default_context() -> Context {
    Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_command_execute(TokioCommandExecute::new().with_timeout(COMMAND_TIMEOUT))
        .with_env(OsEnv)
}
