//! Scripted context components for unit tests.

use azauth_core::{
    CommandExecute, CommandOutput, Context, Error, FileRead, HttpSend, Result, StaticEnv,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) const SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000001";
pub(crate) const TENANT_ID: &str = "11111111-1111-1111-1111-111111111111";

/// `az account show` of a user signed in to [`SUBSCRIPTION_ID`].
pub(crate) const ACCOUNT_SHOW: &str = r#"{
    "environmentName": "AzureCloud",
    "id": "00000000-0000-0000-0000-000000000001",
    "isDefault": true,
    "name": "Dev",
    "state": "Enabled",
    "tenantId": "11111111-1111-1111-1111-111111111111",
    "user": {"name": "dev@example.com", "type": "user"}
}"#;

/// Answers `az` invocations from a table keyed by the joined arguments.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockCommandExecute {
    outputs: Arc<Mutex<HashMap<String, CommandOutput>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockCommandExecute {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` when run with `args` (without the trailing `-o=json`).
    pub(crate) fn with_output(self, args: &str, stdout: &str) -> Self {
        self.outputs.lock().unwrap().insert(
            format!("{args} -o=json"),
            CommandOutput {
                status: 0,
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        );
        self
    }

    /// Exit with status 1 and `stderr` when run with `args`.
    pub(crate) fn with_failure(self, args: &str, stderr: &str) -> Self {
        self.outputs.lock().unwrap().insert(
            format!("{args} -o=json"),
            CommandOutput {
                status: 1,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            },
        );
        self
    }

    /// Every invocation so far, as `program args...`.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandExecute for MockCommandExecute {
    async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let key = args.join(" ");
        self.calls
            .lock()
            .unwrap()
            .push(format!("{program} {key}"));
        self.outputs
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::unexpected(format!("unexpected command: {program} {key}")))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: http::Method,
    pub uri: String,
    pub headers: http::HeaderMap,
    pub body: String,
}

/// Answers HTTP requests from routes matched by uri substring, first match wins.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockHttpSend {
    routes: Arc<Mutex<Vec<(String, u16, String)>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpSend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_response(self, uri_contains: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((uri_contains.to_string(), status, body.to_string()));
        self
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let uri = parts.uri.to_string();
        self.requests.lock().unwrap().push(RecordedRequest {
            method: parts.method,
            uri: uri.clone(),
            headers: parts.headers,
            body: String::from_utf8_lossy(&body).to_string(),
        });

        let routes = self.routes.lock().unwrap();
        let (_, status, body) = routes
            .iter()
            .find(|(pattern, _, _)| uri.contains(pattern.as_str()))
            .ok_or_else(|| Error::unexpected(format!("unexpected request: {uri}")))?;
        Ok(http::Response::builder()
            .status(*status)
            .body(Bytes::from(body.clone()))?)
    }
}

/// Serves files from memory.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockFileRead {
    files: HashMap<String, Vec<u8>>,
}

impl MockFileRead {
    pub(crate) fn with_file(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.to_string(), content.into());
        self
    }
}

#[async_trait::async_trait]
impl FileRead for MockFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::unexpected(format!("file not found: {path}")))
    }
}

pub(crate) fn context(cmd: MockCommandExecute, http: MockHttpSend, envs: &[(&str, &str)]) -> Context {
    Context::new()
        .with_command_execute(cmd)
        .with_http_send(http)
        .with_env(StaticEnv {
            home_dir: Some("/home/azure".into()),
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
}

/// An unsigned JWT carrying `claims`.
pub(crate) fn jwt(claims: &str) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims)
    )
}
