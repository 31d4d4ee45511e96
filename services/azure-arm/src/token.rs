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

use crate::constants::EXPIRY_BUFFER_SECONDS;
use azauth_core::time::{self, DateTime};
use azauth_core::utils::Redact;
use azauth_core::{Error, Result, TokenCredential};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

/// Bearer token issued by Azure AD, the instance metadata service or the Azure CLI.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// The token itself.
    pub access_token: String,
    /// Scheme to present the token with, `Bearer` in practice.
    pub token_type: String,
    /// Resource the token was issued for, when known.
    pub resource: Option<String>,
    /// Expiry, when known. Tokens without expiry never go stale.
    pub expires_on: Option<DateTime>,
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &Redact::from(&self.access_token))
            .field("token_type", &self.token_type)
            .field("resource", &self.resource)
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl Token {
    /// Create a bearer token.
    pub fn new(access_token: impl Into<String>, expires_on: Option<DateTime>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            resource: None,
            expires_on,
        }
    }

    /// Decode the claims of the token without verifying its signature.
    pub fn claims(&self) -> Result<Claims> {
        let payload = self
            .access_token
            .split('.')
            .nth(1)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::response_invalid("access token is not a JWT"))?;
        let decoded = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| Error::response_invalid("decoding access token claims").with_source(e))?;
        serde_json::from_slice(&decoded)
            .map_err(|e| Error::response_invalid("parsing access token claims").with_source(e))
    }
}

impl TokenCredential for Token {
    fn is_valid(&self) -> bool {
        if self.access_token.is_empty() {
            return false;
        }

        match self.expires_on {
            None => true,
            Some(expires_on) => {
                expires_on > time::now() + chrono::TimeDelta::seconds(EXPIRY_BUFFER_SECONDS)
            }
        }
    }
}

/// Tokens of a primary tenant and its auxiliary tenants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiTenantToken {
    /// Token of the primary tenant.
    pub primary: Token,
    /// Tokens of the auxiliary tenants, in configuration order.
    pub auxiliary: Vec<Token>,
}

impl TokenCredential for MultiTenantToken {
    fn is_valid(&self) -> bool {
        self.primary.is_valid() && self.auxiliary.iter().all(|t| t.is_valid())
    }
}

/// The claims of an Azure AD access token we care about.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Object ID of the authenticated principal.
    #[serde(rename = "oid")]
    pub object_id: Option<String>,
    /// Tenant that issued the token.
    #[serde(rename = "tid")]
    pub tenant_id: Option<String>,
    /// Application the token was issued to.
    #[serde(rename = "appid")]
    pub app_id: Option<String>,
    /// `app` or `user`.
    #[serde(rename = "idtyp")]
    pub identity_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    String(String),
}

/// Response of Azure AD token endpoints and of the instance metadata service.
///
/// v1 and IMDS answer `expires_on` (seconds since epoch, often as a string),
/// v2 only answers `expires_in`.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    expires_on: Option<NumberOrString>,
    #[serde(default)]
    expires_in: Option<NumberOrString>,
}

impl TokenResponse {
    pub(crate) fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body)
            .map_err(|e| Error::response_invalid("parsing token response").with_source(e))
    }

    pub(crate) fn into_token(self, resource: &str) -> Result<Token> {
        let expires_on = match (self.expires_on, self.expires_in) {
            (Some(NumberOrString::Number(secs)), _) => Some(time::from_timestamp(secs)?),
            (Some(NumberOrString::String(v)), _) => Some(match v.parse::<i64>() {
                Ok(secs) => time::from_timestamp(secs)?,
                Err(_) => time::parse_rfc3339(&v)?,
            }),
            (None, Some(NumberOrString::Number(secs))) => Some(expires_after(secs)?),
            (None, Some(NumberOrString::String(v))) => {
                let secs = v.parse::<i64>().map_err(|e| {
                    Error::response_invalid(format!("invalid expires_in {v:?}")).with_source(e)
                })?;
                Some(expires_after(secs)?)
            }
            (None, None) => None,
        };

        Ok(Token {
            access_token: self.access_token,
            token_type: self
                .token_type
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "Bearer".to_string()),
            resource: Some(self.resource.unwrap_or_else(|| resource.to_string())),
            expires_on,
        })
    }
}

fn expires_after(secs: i64) -> Result<DateTime> {
    chrono::TimeDelta::try_seconds(secs)
        .and_then(|delta| time::now().checked_add_signed(delta))
        .ok_or_else(|| Error::response_invalid(format!("expires_in {secs} is out of range")))
}
