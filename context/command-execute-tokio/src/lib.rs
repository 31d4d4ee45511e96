// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Tokio based command execution for azauth.
//!
//! [`TokioCommandExecute`] runs programs through `tokio::process`. It is what
//! drives the Azure CLI (`az`) when resolving CLI based authentication.
//!
//! A stuck `az` (waiting on a browser login, or on a hung network call) would
//! otherwise block resolution forever, so a timeout can be set. On timeout
//! the child is killed and a [`CommandFailed`](azauth_core::ErrorKind::CommandFailed)
//! error is returned.
//!
//! ```no_run
//! use azauth_command_execute_tokio::TokioCommandExecute;
//! use azauth_core::Context;
//! use std::time::Duration;
//!
//! # async fn example() -> azauth_core::Result<()> {
//! let ctx = Context::new()
//!     .with_command_execute(TokioCommandExecute::new().with_timeout(Duration::from_secs(30)));
//!
//! let output = ctx.command_execute("az", &["version", "-o=json"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use azauth_core::{CommandExecute, CommandOutput, Error, Result};
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// CommandExecute backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandExecute {
    timeout: Option<Duration>,
}

impl TokioCommandExecute {
    /// Create an executor without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl CommandExecute for TokioCommandExecute {
    async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("executing command {program} with {} args", args.len());
        let output = match self.timeout {
            None => cmd.output().await,
            Some(timeout) => tokio::time::timeout(timeout, cmd.output())
                .await
                .map_err(|_| {
                    Error::command_failed(format!(
                        "command '{program}' did not finish within {timeout:?}"
                    ))
                })?,
        }
        .map_err(|e| {
            Error::command_failed(format!("failed to execute command '{program}'")).with_source(e)
        })?;

        Ok(CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
