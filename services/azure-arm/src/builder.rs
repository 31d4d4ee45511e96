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

use crate::auth_method::{AuthMethod, AUTH_METHOD_PRIORITY};
use crate::constants::*;
use crate::{Config, Environment};
use azauth_core::utils::Redact;
use azauth_core::{Context, Error, Result};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Every input an authentication method may need.
///
/// Fill in what is known, switch on the methods that may be used with the
/// `supports_*` toggles and call [`Builder::build`]. Empty strings count as
/// unset.
#[derive(Clone, Default)]
pub struct Builder {
    /// Subscription to work in.
    pub subscription_id: Option<String>,
    /// Application (client) ID of the Service Principal or managed identity.
    pub client_id: Option<String>,
    /// Tenant of the credential.
    pub tenant_id: Option<String>,
    /// Additional tenants to authorize against, at most three.
    pub auxiliary_tenant_ids: Vec<String>,
    /// Cloud name, see [`Environment::from_name`].
    pub environment: Option<String>,
    /// Use the Azure CLI without a subscription.
    pub tenant_only: bool,
    /// Request v2 (MSAL) tokens instead of v1 (ADAL) ones.
    pub use_microsoft_graph: bool,

    /// Allow authorizing against auxiliary tenants.
    pub supports_auxiliary_tenants: bool,
    /// Allow the Azure CLI.
    pub supports_azure_cli_token: bool,
    /// Allow a Service Principal with a client certificate.
    pub supports_client_certificate_auth: bool,
    /// Allow a Service Principal with a client secret.
    pub supports_client_secret_auth: bool,
    /// Allow managed identity.
    pub supports_managed_service_identity: bool,
    /// Allow a Service Principal with an OIDC federated token.
    pub supports_oidc_auth: bool,

    /// Managed identity endpoint, the instance metadata service by default.
    pub msi_endpoint: Option<String>,
    /// PKCS#12 (`.pfx`) file holding the client certificate and its private key.
    /// A PEM bundle is accepted too.
    pub client_certificate_path: Option<String>,
    /// Password of the PKCS#12 archive or of an encrypted PEM key.
    pub client_certificate_password: Option<String>,
    /// Client secret of the Service Principal.
    pub client_secret: Option<String>,
    /// OIDC ID token.
    pub id_token: Option<String>,
    /// File holding an OIDC ID token.
    pub id_token_file_path: Option<String>,
    /// URL an OIDC ID token can be requested from.
    pub id_token_request_url: Option<String>,
    /// Bearer token for `id_token_request_url`.
    pub id_token_request_token: Option<String>,
}

impl Debug for Builder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("subscription_id", &self.subscription_id)
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .field("auxiliary_tenant_ids", &self.auxiliary_tenant_ids)
            .field("environment", &self.environment)
            .field("tenant_only", &self.tenant_only)
            .field("use_microsoft_graph", &self.use_microsoft_graph)
            .field("supports_auxiliary_tenants", &self.supports_auxiliary_tenants)
            .field("supports_azure_cli_token", &self.supports_azure_cli_token)
            .field(
                "supports_client_certificate_auth",
                &self.supports_client_certificate_auth,
            )
            .field("supports_client_secret_auth", &self.supports_client_secret_auth)
            .field(
                "supports_managed_service_identity",
                &self.supports_managed_service_identity,
            )
            .field("supports_oidc_auth", &self.supports_oidc_auth)
            .field("msi_endpoint", &self.msi_endpoint)
            .field("client_certificate_path", &self.client_certificate_path)
            .field(
                "client_certificate_password",
                &Redact::from(&self.client_certificate_password),
            )
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("id_token", &Redact::from(&self.id_token))
            .field("id_token_file_path", &self.id_token_file_path)
            .field("id_token_request_url", &self.id_token_request_url)
            .field(
                "id_token_request_token",
                &Redact::from(&self.id_token_request_token),
            )
            .finish()
    }
}

/// `Some` only for present, non-empty values.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        "" => None,
        _ => {
            log::warn!("ignoring {key}={value:?}: not a boolean");
            None
        }
    }
}

impl Builder {
    /// Create an empty builder with every method switched off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill unset fields from `ARM_*` environment variables.
    ///
    /// String fields that are already set are kept. The boolean toggles
    /// `ARM_USE_CLI`, `ARM_USE_MSI`, `ARM_USE_OIDC`, `ARM_USE_MSAL` and
    /// `ARM_TENANT_ONLY` override their field only when present.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let var = |key: &str| ctx.env_var(key).filter(|v| !v.is_empty());
        let fill = |field: &mut Option<String>, keys: &[&str]| {
            if non_empty(field).is_some() {
                return;
            }
            if let Some(v) = keys.iter().find_map(|&k| var(k)) {
                *field = Some(v);
            }
        };

        fill(&mut self.subscription_id, &[ARM_SUBSCRIPTION_ID]);
        fill(&mut self.client_id, &[ARM_CLIENT_ID]);
        fill(&mut self.tenant_id, &[ARM_TENANT_ID]);
        fill(&mut self.environment, &[ARM_ENVIRONMENT]);
        fill(&mut self.client_secret, &[ARM_CLIENT_SECRET]);
        fill(&mut self.client_certificate_path, &[ARM_CLIENT_CERTIFICATE_PATH]);
        fill(
            &mut self.client_certificate_password,
            &[ARM_CLIENT_CERTIFICATE_PASSWORD],
        );
        fill(&mut self.msi_endpoint, &[ARM_MSI_ENDPOINT]);
        fill(&mut self.id_token, &[ARM_OIDC_TOKEN]);
        fill(&mut self.id_token_file_path, &[ARM_OIDC_TOKEN_FILE_PATH]);
        fill(
            &mut self.id_token_request_url,
            &[ARM_OIDC_REQUEST_URL, ACTIONS_ID_TOKEN_REQUEST_URL],
        );
        fill(
            &mut self.id_token_request_token,
            &[ARM_OIDC_REQUEST_TOKEN, ACTIONS_ID_TOKEN_REQUEST_TOKEN],
        );

        if self.auxiliary_tenant_ids.is_empty() {
            if let Some(v) = var(ARM_AUXILIARY_TENANT_IDS) {
                self.auxiliary_tenant_ids = v
                    .split(';')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
                    .collect();
            }
        }

        let flag = |key: &str| ctx.env_var(key).and_then(|v| parse_bool(key, &v));
        if let Some(v) = flag(ARM_USE_CLI) {
            self.supports_azure_cli_token = v;
        }
        if let Some(v) = flag(ARM_USE_MSI) {
            self.supports_managed_service_identity = v;
        }
        if let Some(v) = flag(ARM_USE_OIDC) {
            self.supports_oidc_auth = v;
        }
        if let Some(v) = flag(ARM_USE_MSAL) {
            self.use_microsoft_graph = v;
        }
        if let Some(v) = flag(ARM_TENANT_ONLY) {
            self.tenant_only = v;
        }

        self
    }

    /// Pick the first applicable authentication method, build and validate it
    /// and return the resolved [`Config`].
    ///
    /// Methods are probed in [`AUTH_METHOD_PRIORITY`] order.
    pub async fn build(&self, ctx: &Context) -> Result<Config> {
        let environment =
            Environment::from_name(non_empty(&self.environment).unwrap_or_default())?;

        for kind in AUTH_METHOD_PRIORITY {
            debug!("testing if {} is applicable for authentication", kind.name());
            if !kind.is_applicable(self) {
                continue;
            }

            debug!("using {} for authentication", kind.name());
            let method: Arc<dyn AuthMethod> = Arc::from(
                kind.build(ctx, self)
                    .await
                    .map_err(|e| e.with_context(format!("building {}", kind.name())))?,
            );
            method
                .validate()
                .map_err(|e| e.with_context(format!("validating {}", kind.name())))?;

            let mut config = Config::new(self, environment, method.clone());
            method.populate_config(&mut config);
            return Ok(config);
        }

        Err(Error::no_applicable_method(
            "no supported authentication methods were found; \
             enable at least one `supports_*` toggle together with its credentials",
        ))
    }
}
