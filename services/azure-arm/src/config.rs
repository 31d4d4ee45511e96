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

use crate::auth_method::{AuthMethod, AuthMethodKind};
use crate::authorizer::ArmAuthorizer;
use crate::oauth::{MultiOAuth, MultiTenantOAuthConfig, OAuthConfig, TokenVersion};
use crate::token::Token;
use crate::{Builder, Environment};
use azauth_core::{Context, Result};
use log::debug;
use std::sync::Arc;

/// The outcome of [`Builder::build`]: who we are and how to get tokens.
#[derive(Clone, Debug)]
pub struct Config {
    /// Client ID of the resolved identity.
    pub client_id: String,
    /// Tenant of the resolved identity.
    pub tenant_id: String,
    /// Subscription to work in, empty in tenant only mode.
    pub subscription_id: String,
    /// Auxiliary tenants tokens are requested for.
    pub auxiliary_tenant_ids: Vec<String>,
    /// Cloud the identity lives in.
    pub environment: Environment,
    /// False only for the Azure CLI.
    pub authenticated_as_a_service_principal: bool,
    /// Whether an OIDC federated token is used.
    pub authenticated_via_oidc: bool,
    /// Whether v2 (MSAL) tokens are requested.
    pub use_microsoft_graph: bool,

    auth_method: Arc<dyn AuthMethod>,
}

impl Config {
    pub(crate) fn new(
        b: &Builder,
        environment: Environment,
        auth_method: Arc<dyn AuthMethod>,
    ) -> Self {
        Config {
            client_id: String::new(),
            tenant_id: String::new(),
            subscription_id: String::new(),
            auxiliary_tenant_ids: Vec::new(),
            environment,
            authenticated_as_a_service_principal: false,
            authenticated_via_oidc: false,
            use_microsoft_graph: b.use_microsoft_graph,
            auth_method,
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(method: &(impl AuthMethod + Clone)) -> Self {
        let mut config = Config::new(
            &Builder::default(),
            Environment::default(),
            Arc::new(method.clone()),
        );
        method.populate_config(&mut config);
        config
    }

    /// Which method the identity was resolved with.
    pub fn auth_method(&self) -> AuthMethodKind {
        self.auth_method.kind()
    }

    /// v2 when Microsoft Graph is in use, v1 otherwise.
    pub fn token_version(&self) -> TokenVersion {
        TokenVersion::for_microsoft_graph(self.use_microsoft_graph)
    }

    /// OAuth endpoints of the primary tenant.
    pub fn get_oauth_config(&self, active_directory_endpoint: &str) -> Result<OAuthConfig> {
        debug!(
            "getting OAuth config for endpoint {active_directory_endpoint} with tenant {}",
            self.tenant_id
        );
        OAuthConfig::new(active_directory_endpoint, &self.tenant_id)
    }

    /// OAuth endpoints of the primary tenant and every auxiliary tenant.
    pub fn get_multi_tenant_oauth_config(
        &self,
        active_directory_endpoint: &str,
    ) -> Result<MultiTenantOAuthConfig> {
        debug!(
            "getting multi-tenant OAuth config for endpoint {active_directory_endpoint} with tenant {} (auxiliary tenants {:?})",
            self.tenant_id, self.auxiliary_tenant_ids
        );
        MultiTenantOAuthConfig::new(
            active_directory_endpoint,
            &self.tenant_id,
            &self.auxiliary_tenant_ids,
        )
    }

    /// Single tenant without auxiliary tenants, multi-tenant otherwise.
    pub fn get_multi_oauth_config(&self, active_directory_endpoint: &str) -> Result<MultiOAuth> {
        if self.auxiliary_tenant_ids.is_empty() {
            Ok(MultiOAuth::SingleTenant(
                self.get_oauth_config(active_directory_endpoint)?,
            ))
        } else {
            Ok(MultiOAuth::MultiTenant(
                self.get_multi_tenant_oauth_config(active_directory_endpoint)?,
            ))
        }
    }

    /// Authorizer for requests to `endpoint`.
    ///
    /// Tokens are fetched from v1 or v2 endpoints depending on
    /// [`Config::use_microsoft_graph`] and refreshed when they are about to
    /// expire.
    pub async fn get_authorization_token(
        &self,
        ctx: &Context,
        oauth: &MultiOAuth,
        endpoint: &str,
    ) -> Result<ArmAuthorizer> {
        self.auth_method
            .get_authorization_token(ctx, oauth, endpoint, self.token_version())
            .await
    }

    /// v1 token for `endpoint`.
    pub async fn get_adal_token(
        &self,
        ctx: &Context,
        oauth: &OAuthConfig,
        endpoint: &str,
    ) -> Result<Token> {
        self.auth_method.get_adal_token(ctx, oauth, endpoint).await
    }

    /// v2 token for `endpoint`.
    pub async fn get_msal_token(
        &self,
        ctx: &Context,
        oauth: &OAuthConfig,
        endpoint: &str,
    ) -> Result<Token> {
        self.auth_method.get_msal_token(ctx, oauth, endpoint).await
    }

    /// Object ID of the authenticated principal.
    pub async fn get_authenticated_object_id(&self, ctx: &Context) -> Result<Option<String>> {
        self.auth_method.get_authenticated_object_id(ctx, self).await
    }
}
