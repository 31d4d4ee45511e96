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

//! Bridge to the Azure CLI.
//!
//! Every call goes through [`Context::command_execute`] so that nothing here
//! depends on a real `az` being installed.

mod profile;
pub(crate) use profile::load_profile;

use crate::oauth::TokenVersion;
use crate::token::Token;
use crate::token_request::default_scope;
use azauth_core::time::{self, DateTime};
use azauth_core::{Context, Error, ProvideToken, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const AZ: &str = "az";
const CLI_EXPIRES_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Run `az <args> -o=json` and decode its standard output.
pub(crate) async fn json_unmarshal_az_cmd<T: DeserializeOwned>(
    ctx: &Context,
    args: &[&str],
) -> Result<T> {
    let mut full = args.to_vec();
    full.push("-o=json");
    let command = format!("{AZ} {}", full.join(" "));

    debug!("running Azure CLI: {command}");
    let output = ctx.command_execute(AZ, &full).await.map_err(|e| {
        Error::command_failed(format!("launching Azure CLI `{command}`")).with_source(e)
    })?;

    if !output.success() {
        return Err(Error::command_failed(format!(
            "running Azure CLI `{command}` exited with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    serde_json::from_slice(&output.stdout).map_err(|e| {
        Error::response_invalid(format!("unmarshaling the output of Azure CLI `{command}`"))
            .with_source(e)
    })
}

/// An account as listed by `az account show` / `az account list` and stored
/// in `azureProfile.json`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AzureCliAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub user: Option<AzureCliUser>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct AzureCliUser {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl AzureCliAccount {
    /// Only user accounts may be used; a CLI logged in as a Service Principal
    /// has to be configured as one instead.
    pub(crate) fn ensure_user(&self) -> Result<()> {
        match &self.user {
            Some(user) if user.kind.eq_ignore_ascii_case("user") => Ok(()),
            Some(user) => Err(Error::identity_unsupported(format!(
                "authenticating using the Azure CLI is only supported as a user (not a {:?}); \
                 configure the Service Principal credentials directly instead",
                user.kind
            ))),
            None => Err(Error::identity_unsupported(format!(
                "the Azure CLI account for subscription {:?} has no signed in user",
                self.id
            ))),
        }
    }
}

/// The account of `subscription_id`, or the CLI's current account when `None`.
pub(crate) async fn obtain_subscription(
    ctx: &Context,
    subscription_id: Option<&str>,
) -> Result<AzureCliAccount> {
    let Some(subscription_id) = subscription_id else {
        return json_unmarshal_az_cmd(ctx, &["account", "show"]).await;
    };

    let accounts: Vec<AzureCliAccount> = json_unmarshal_az_cmd(ctx, &["account", "list"]).await?;
    accounts
        .into_iter()
        .find(|a| a.id.eq_ignore_ascii_case(subscription_id))
        .ok_or_else(|| {
            Error::config_invalid(format!(
                "subscription {subscription_id:?} was not found in the Azure CLI; \
                 run `az account list` to see the available subscriptions"
            ))
        })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCliToken {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_on: Option<String>,
    #[serde(rename = "expires_on", default)]
    expires_on_timestamp: Option<i64>,
}

impl AzureCliToken {
    fn expiry(&self) -> Option<DateTime> {
        if let Some(secs) = self.expires_on_timestamp {
            match time::from_timestamp(secs) {
                Ok(v) => return Some(v),
                Err(e) => warn!("ignoring Azure CLI expires_on {secs}: {e}"),
            }
        }

        let value = self.expires_on.as_deref()?;
        match time::parse_local(value, CLI_EXPIRES_ON_FORMAT) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("ignoring Azure CLI expiresOn {value:?}: {e}");
                None
            }
        }
    }
}

/// What `az account get-access-token` is scoped to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CliTokenScope {
    Subscription(String),
    Tenant(String),
}

/// Token for `resource` from `az account get-access-token`.
pub(crate) async fn get_access_token(
    ctx: &Context,
    resource: &str,
    version: TokenVersion,
    scope: &CliTokenScope,
) -> Result<Token> {
    let target = match version {
        TokenVersion::V1 => ("--resource", resource.to_string()),
        TokenVersion::V2 => ("--scope", default_scope(resource)),
    };
    let (flag, id) = match scope {
        CliTokenScope::Subscription(id) => ("--subscription", id.as_str()),
        CliTokenScope::Tenant(id) => ("--tenant", id.as_str()),
    };
    let args: [&str; 6] = [
        "account",
        "get-access-token",
        target.0,
        target.1.as_str(),
        flag,
        id,
    ];

    let token: AzureCliToken = json_unmarshal_az_cmd(ctx, &args).await?;
    let expires_on = token.expiry();
    Ok(Token {
        expires_on,
        access_token: token.access_token,
        token_type: token
            .token_type
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "Bearer".to_string()),
        resource: Some(resource.to_string()),
    })
}

#[derive(Deserialize)]
struct SignedInUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "objectId", default)]
    object_id: Option<String>,
}

/// Object ID of the signed in user, from `az ad signed-in-user show`.
pub(crate) async fn signed_in_user_object_id(ctx: &Context) -> Result<Option<String>> {
    let user: SignedInUser = json_unmarshal_az_cmd(ctx, &["ad", "signed-in-user", "show"]).await?;
    Ok(user.id.or(user.object_id).filter(|v| !v.is_empty()))
}

/// Refresh callback re-running `az account get-access-token`.
#[derive(Clone, Debug)]
pub(crate) struct AzureCliTokenProvider {
    pub(crate) resource: String,
    pub(crate) version: TokenVersion,
    pub(crate) scope: CliTokenScope,
}

#[async_trait::async_trait]
impl ProvideToken for AzureCliTokenProvider {
    type Token = Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Token> {
        get_access_token(ctx, &self.resource, self.version, &self.scope).await
    }
}
