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

//! The authentication methods a [`Builder`] can resolve to.

mod azure_cli;
mod azure_cli_multi_tenant;
mod client_certificate;
mod client_secret;
mod client_secret_multi_tenant;
mod managed_service_identity;
mod oidc;

use crate::authorizer::{
    bearer_authorizer, multi_tenant_authorizer, ArmAuthorizer, BoxedTokenProvider,
    MultiTenantTokenProvider,
};
use crate::builder::non_empty;
use crate::oauth::{MultiOAuth, MultiTenantOAuthConfig, OAuthConfig, TokenVersion};
use crate::token::Token;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::{Context, Error, Result};
use log::debug;
use std::fmt::{Debug, Display, Formatter};

/// The authentication methods, in the order they are tried.
///
/// Multi-tenant variants come before their single-tenant counterparts so that
/// they win whenever auxiliary tenants are configured.
pub const AUTH_METHOD_PRIORITY: [AuthMethodKind; 7] = [
    AuthMethodKind::ClientCertificate,
    AuthMethodKind::ClientSecretMultiTenant,
    AuthMethodKind::ClientSecret,
    AuthMethodKind::Oidc,
    AuthMethodKind::ManagedServiceIdentity,
    AuthMethodKind::AzureCliMultiTenant,
    AuthMethodKind::AzureCli,
];

/// Identifies an authentication method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMethodKind {
    /// Service Principal with a client certificate.
    ClientCertificate,
    /// Service Principal with a client secret, across auxiliary tenants.
    ClientSecretMultiTenant,
    /// Service Principal with a client secret.
    ClientSecret,
    /// Service Principal with an OIDC federated token.
    Oidc,
    /// Managed identity through the instance metadata service.
    ManagedServiceIdentity,
    /// Azure CLI user, across auxiliary tenants.
    AzureCliMultiTenant,
    /// Azure CLI user.
    AzureCli,
}

impl AuthMethodKind {
    /// Human readable name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            AuthMethodKind::ClientCertificate => "Client Certificate",
            AuthMethodKind::ClientSecretMultiTenant => "Multi Tenant Client Secret",
            AuthMethodKind::ClientSecret => "Client Secret",
            AuthMethodKind::Oidc => "OIDC",
            AuthMethodKind::ManagedServiceIdentity => "Managed Service Identity",
            AuthMethodKind::AzureCliMultiTenant => "Multi Tenant Azure CLI Token",
            AuthMethodKind::AzureCli => "Azure CLI Token",
        }
    }

    /// Whether `builder` carries what this method needs to be tried.
    pub fn is_applicable(&self, b: &Builder) -> bool {
        let has_auxiliary = b.supports_auxiliary_tenants && !b.auxiliary_tenant_ids.is_empty();
        match self {
            AuthMethodKind::ClientCertificate => {
                b.supports_client_certificate_auth
                    && non_empty(&b.client_certificate_path).is_some()
            }
            AuthMethodKind::ClientSecretMultiTenant => {
                b.supports_client_secret_auth
                    && has_auxiliary
                    && non_empty(&b.client_secret).is_some()
            }
            AuthMethodKind::ClientSecret => {
                b.supports_client_secret_auth && non_empty(&b.client_secret).is_some()
            }
            AuthMethodKind::Oidc => {
                b.supports_oidc_auth
                    && (non_empty(&b.id_token).is_some()
                        || non_empty(&b.id_token_file_path).is_some()
                        || (non_empty(&b.id_token_request_url).is_some()
                            && non_empty(&b.id_token_request_token).is_some()))
            }
            AuthMethodKind::ManagedServiceIdentity => b.supports_managed_service_identity,
            AuthMethodKind::AzureCliMultiTenant => b.supports_azure_cli_token && has_auxiliary,
            AuthMethodKind::AzureCli => b.supports_azure_cli_token,
        }
    }

    pub(crate) async fn build(&self, ctx: &Context, b: &Builder) -> Result<Box<dyn AuthMethod>> {
        Ok(match self {
            AuthMethodKind::ClientCertificate => {
                Box::new(client_certificate::ClientCertificateAuth::build(b))
            }
            AuthMethodKind::ClientSecretMultiTenant => Box::new(
                client_secret_multi_tenant::ClientSecretMultiTenantAuth::build(b),
            ),
            AuthMethodKind::ClientSecret => Box::new(client_secret::ClientSecretAuth::build(b)),
            AuthMethodKind::Oidc => Box::new(oidc::OidcAuth::build(b)),
            AuthMethodKind::ManagedServiceIdentity => Box::new(
                managed_service_identity::ManagedServiceIdentityAuth::build(ctx, b)?,
            ),
            AuthMethodKind::AzureCliMultiTenant => Box::new(
                azure_cli_multi_tenant::AzureCliMultiTenantAuth::build(ctx, b).await?,
            ),
            AuthMethodKind::AzureCli => Box::new(azure_cli::AzureCliAuth::build(ctx, b).await?),
        })
    }
}

impl Display for AuthMethodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved authentication method.
///
/// Implementations only capture what their flow needs and are immutable once
/// built.
#[async_trait]
pub(crate) trait AuthMethod: Debug + Send + Sync + 'static {
    fn kind(&self) -> AuthMethodKind;

    /// Check that every field the method needs is set, reporting all gaps at once.
    fn validate(&self) -> Result<()>;

    /// Copy the resolved identity into `config`.
    fn populate_config(&self, config: &mut Config);

    /// Refresh callback fetching a token for `endpoint` from the tenant of `oauth`.
    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider;

    async fn get_authorization_token(
        &self,
        ctx: &Context,
        oauth: &MultiOAuth,
        endpoint: &str,
        version: TokenVersion,
    ) -> Result<ArmAuthorizer> {
        debug!(
            "creating {} authorizer for {endpoint} in tenant {}",
            self.kind(),
            oauth.primary().tenant_id
        );
        Ok(bearer_authorizer(
            ctx,
            self.token_provider(oauth.primary(), endpoint, version),
        ))
    }

    async fn get_adal_token(
        &self,
        ctx: &Context,
        oauth: &OAuthConfig,
        endpoint: &str,
    ) -> Result<Token> {
        self.token_provider(oauth, endpoint, TokenVersion::V1)
            .provide_token(ctx)
            .await
    }

    async fn get_msal_token(
        &self,
        ctx: &Context,
        oauth: &OAuthConfig,
        endpoint: &str,
    ) -> Result<Token> {
        self.token_provider(oauth, endpoint, TokenVersion::V2)
            .provide_token(ctx)
            .await
    }

    /// Object ID of the authenticated principal, read from the `oid` claim of
    /// a Microsoft Graph token.
    async fn get_authenticated_object_id(
        &self,
        ctx: &Context,
        config: &Config,
    ) -> Result<Option<String>> {
        let oauth = config.get_oauth_config(config.environment.active_directory_endpoint)?;
        let token = self
            .get_msal_token(ctx, &oauth, config.environment.microsoft_graph_endpoint)
            .await?;
        Ok(token.claims()?.object_id.filter(|v| !v.is_empty()))
    }
}

/// Authorizer for methods that fetch one token per tenant.
pub(crate) fn multi_tenant_authorization(
    method: &dyn AuthMethod,
    ctx: &Context,
    oauth: &MultiOAuth,
    endpoint: &str,
    version: TokenVersion,
) -> Result<ArmAuthorizer> {
    let MultiOAuth::MultiTenant(MultiTenantOAuthConfig { primary, auxiliary }) = oauth else {
        return Err(Error::config_invalid(format!(
            "{} requires a multi-tenant OAuth configuration",
            method.kind()
        )));
    };

    debug!(
        "creating {} authorizer for {endpoint} in tenant {} with {} auxiliary tenants",
        method.kind(),
        primary.tenant_id,
        auxiliary.len()
    );
    Ok(multi_tenant_authorizer(
        ctx,
        MultiTenantTokenProvider {
            primary: method.token_provider(primary, endpoint, version),
            auxiliary: auxiliary
                .iter()
                .map(|oauth| method.token_provider(oauth, endpoint, version))
                .collect(),
        },
    ))
}

/// Owned copy of an optional builder field, empty when unset.
pub(crate) fn field(value: &Option<String>) -> String {
    non_empty(value).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn builder() -> Builder {
        Builder {
            subscription_id: Some("sub".to_string()),
            client_id: Some("client".to_string()),
            tenant_id: Some("tenant".to_string()),
            ..Default::default()
        }
    }

    fn applicable(b: &Builder) -> Vec<AuthMethodKind> {
        AUTH_METHOD_PRIORITY
            .into_iter()
            .filter(|k| k.is_applicable(b))
            .collect()
    }

    #[test]
    fn test_nothing_is_applicable_by_default() {
        assert!(applicable(&Builder::default()).is_empty());
    }

    #[test_case(
        Builder { supports_client_certificate_auth: true, client_certificate_path: Some("/sp.pem".into()), ..builder() }
        => vec![AuthMethodKind::ClientCertificate]; "client certificate")]
    #[test_case(
        Builder { supports_client_secret_auth: true, client_secret: Some("s".into()), ..builder() }
        => vec![AuthMethodKind::ClientSecret]; "client secret")]
    #[test_case(
        Builder { supports_oidc_auth: true, id_token: Some("t".into()), ..builder() }
        => vec![AuthMethodKind::Oidc]; "oidc token")]
    #[test_case(
        Builder { supports_oidc_auth: true, id_token_file_path: Some("/t".into()), ..builder() }
        => vec![AuthMethodKind::Oidc]; "oidc token file")]
    #[test_case(
        Builder { supports_oidc_auth: true, id_token_request_url: Some("https://gh".into()), ..builder() }
        => Vec::<AuthMethodKind>::new(); "oidc request url without token")]
    #[test_case(
        Builder { supports_managed_service_identity: true, ..builder() }
        => vec![AuthMethodKind::ManagedServiceIdentity]; "managed identity")]
    #[test_case(
        Builder { supports_azure_cli_token: true, ..builder() }
        => vec![AuthMethodKind::AzureCli]; "azure cli")]
    #[test_case(
        Builder { supports_client_secret_auth: true, client_secret: Some(String::new()), ..builder() }
        => Vec::<AuthMethodKind>::new(); "empty client secret")]
    fn test_single_credential_set(b: Builder) -> Vec<AuthMethodKind> {
        applicable(&b)
    }

    #[test]
    fn test_multi_tenant_needs_auxiliary_support() {
        let b = Builder {
            supports_client_secret_auth: true,
            supports_azure_cli_token: true,
            client_secret: Some("s".into()),
            auxiliary_tenant_ids: vec!["aux".into()],
            ..builder()
        };
        assert_eq!(
            applicable(&b),
            vec![AuthMethodKind::ClientSecret, AuthMethodKind::AzureCli]
        );

        let b = Builder {
            supports_auxiliary_tenants: true,
            ..b
        };
        assert_eq!(
            applicable(&b),
            vec![
                AuthMethodKind::ClientSecretMultiTenant,
                AuthMethodKind::ClientSecret,
                AuthMethodKind::AzureCliMultiTenant,
                AuthMethodKind::AzureCli,
            ]
        );
    }

    #[test]
    fn test_names() {
        assert_eq!(AuthMethodKind::AzureCli.to_string(), "Azure CLI Token");
        assert_eq!(AuthMethodKind::Oidc.name(), "OIDC");
    }
}
