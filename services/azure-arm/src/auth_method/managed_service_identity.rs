use super::{field, AuthMethod, AuthMethodKind};
use crate::authorizer::BoxedTokenProvider;
use crate::builder::non_empty;
use crate::constants::{IMDS_API_VERSION, IMDS_ENDPOINT, MSI_ENDPOINT, MSI_SECRET};
use crate::oauth::{OAuthConfig, TokenVersion};
use crate::token::{Token, TokenResponse};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::{Context, Error, ProvideToken, Result};
use bytes::Bytes;
use http::header::ACCEPT;
use log::debug;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// Managed identity served by the instance metadata service.
#[derive(Clone, Debug, Default)]
pub(crate) struct ManagedServiceIdentityAuth {
    pub(crate) msi_endpoint: String,
    /// Client ID of a user assigned identity, empty for the system assigned one.
    pub(crate) client_id: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
}

impl ManagedServiceIdentityAuth {
    pub(crate) fn build(ctx: &Context, b: &Builder) -> Result<Self> {
        let has = |key: &str| ctx.env_var(key).is_some_and(|v| !v.is_empty());
        if has(MSI_ENDPOINT) && has(MSI_SECRET) {
            return Err(Error::identity_unsupported(
                "managed identity of App Service and Azure Functions is not supported: \
                 both MSI_ENDPOINT and MSI_SECRET are set",
            ));
        }

        let msi_endpoint = match non_empty(&b.msi_endpoint) {
            Some(endpoint) => endpoint.to_string(),
            None => {
                debug!("no MSI endpoint configured, using the instance metadata service");
                IMDS_ENDPOINT.to_string()
            }
        };
        Ok(ManagedServiceIdentityAuth {
            msi_endpoint,
            client_id: field(&b.client_id),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
        })
    }
}

#[async_trait]
impl AuthMethod for ManagedServiceIdentityAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::ManagedServiceIdentity
    }

    fn validate(&self) -> Result<()> {
        let mut v = Validation::new("authenticating using Managed Service Identity");
        v.require(&self.msi_endpoint, "MSI Endpoint");
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        config.client_id = self.client_id.clone();
        config.subscription_id = self.subscription_id.clone();
        config.tenant_id = self.tenant_id.clone();
        config.authenticated_as_a_service_principal = true;
    }

    fn token_provider(
        &self,
        _: &OAuthConfig,
        endpoint: &str,
        _: TokenVersion,
    ) -> BoxedTokenProvider {
        Box::new(MsiTokenProvider {
            msi_endpoint: self.msi_endpoint.clone(),
            client_id: self.client_id.clone(),
            resource: endpoint.to_string(),
        })
    }
}

/// Fetches tokens from the instance metadata service.
///
/// The service only knows about resources, so v1 and v2 requests look the same.
#[derive(Clone, Debug)]
pub(crate) struct MsiTokenProvider {
    msi_endpoint: String,
    client_id: String,
    resource: String,
}

impl MsiTokenProvider {
    fn url(&self) -> String {
        let separator = if self.msi_endpoint.contains('?') { '&' } else { '?' };
        let mut url = format!(
            "{}{separator}api-version={IMDS_API_VERSION}&resource={}",
            self.msi_endpoint,
            utf8_percent_encode(&self.resource, NON_ALPHANUMERIC)
        );
        if !self.client_id.is_empty() {
            url.push_str("&client_id=");
            url.push_str(&utf8_percent_encode(&self.client_id, NON_ALPHANUMERIC).to_string());
        }
        url
    }
}

#[async_trait]
impl ProvideToken for MsiTokenProvider {
    type Token = Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Token> {
        let url = self.url();
        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri(&url)
            .header("Metadata", "true")
            .header(ACCEPT, "application/json")
            .body(Bytes::new())?;

        debug!("requesting managed identity token from {url}");
        let resp = ctx.http_send(req).await.map_err(|e| {
            Error::token_exchange(format!("sending managed identity token request to {url}"))
                .with_source(e)
        })?;
        if !resp.status().is_success() {
            return Err(Error::token_exchange(format!(
                "managed identity token request to {url} failed with status {}: {}",
                resp.status(),
                String::from_utf8_lossy(resp.body())
            )));
        }

        TokenResponse::parse(resp.body())?.into_token(&self.resource)
    }
}
