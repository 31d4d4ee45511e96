use super::{field, AuthMethod, AuthMethodKind};
use crate::authorizer::BoxedTokenProvider;
use crate::builder::non_empty;
use crate::constants::OIDC_AUDIENCE;
use crate::oauth::{OAuthConfig, TokenVersion};
use crate::token::Token;
use crate::token_request::{request_token, ClientAuth};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::utils::Redact;
use azauth_core::{Context, Error, ProvideToken, Result};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION};
use log::debug;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

/// Where the federated ID token comes from.
#[derive(Clone)]
pub(crate) enum IdTokenSource {
    Static(String),
    /// Re-read on every exchange, the file may be rotated underneath us.
    File(String),
    /// GitHub Actions style token service.
    Request { url: String, token: String },
}

impl Debug for IdTokenSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdTokenSource::Static(token) => f
                .debug_tuple("Static")
                .field(&Redact::from(token))
                .finish(),
            IdTokenSource::File(path) => f.debug_tuple("File").field(path).finish(),
            IdTokenSource::Request { url, token } => f
                .debug_struct("Request")
                .field("url", url)
                .field("token", &Redact::from(token))
                .finish(),
        }
    }
}

impl IdTokenSource {
    /// A literal token wins over a file, which wins over a token service.
    fn from_builder(b: &Builder) -> Option<Self> {
        if let Some(token) = non_empty(&b.id_token) {
            return Some(IdTokenSource::Static(token.to_string()));
        }
        if let Some(path) = non_empty(&b.id_token_file_path) {
            return Some(IdTokenSource::File(path.to_string()));
        }
        match (
            non_empty(&b.id_token_request_url),
            non_empty(&b.id_token_request_token),
        ) {
            (Some(url), Some(token)) => Some(IdTokenSource::Request {
                url: url.to_string(),
                token: token.to_string(),
            }),
            _ => None,
        }
    }

    async fn id_token(&self, ctx: &Context) -> Result<String> {
        match self {
            IdTokenSource::Static(token) => Ok(token.clone()),
            IdTokenSource::File(path) => {
                let path = ctx.expand_home_dir(path).unwrap_or_else(|| path.clone());
                debug!("loading OIDC token from {path}");
                let token = ctx.file_read_as_string(&path).await.map_err(|e| {
                    Error::config_invalid(format!("reading the OIDC token file at {path}"))
                        .with_source(e)
                })?;
                Ok(token.trim().to_string())
            }
            IdTokenSource::Request { url, token } => request_id_token(ctx, url, token).await,
        }
    }
}

#[derive(Deserialize)]
struct IdTokenResponse {
    #[serde(default)]
    value: String,
}

async fn request_id_token(ctx: &Context, url: &str, token: &str) -> Result<String> {
    let separator = if url.contains('?') { '&' } else { '?' };
    let url = format!(
        "{url}{separator}audience={}",
        utf8_percent_encode(OIDC_AUDIENCE, NON_ALPHANUMERIC)
    );
    let req = http::Request::builder()
        .method(http::Method::GET)
        .uri(&url)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(ACCEPT, "application/json")
        .body(Bytes::new())?;

    debug!("requesting OIDC token from {url}");
    let resp = ctx.http_send(req).await.map_err(|e| {
        Error::token_exchange(format!("sending OIDC token request to {url}")).with_source(e)
    })?;
    if !resp.status().is_success() {
        return Err(Error::token_exchange(format!(
            "OIDC token request to {url} failed with status {}: {}",
            resp.status(),
            String::from_utf8_lossy(resp.body())
        )));
    }

    let body: IdTokenResponse = serde_json::from_slice(resp.body())
        .map_err(|e| Error::response_invalid("parsing OIDC token response").with_source(e))?;
    if body.value.is_empty() {
        return Err(Error::response_invalid(format!(
            "OIDC token response from {url} carries no token"
        )));
    }
    Ok(body.value)
}

/// Service Principal authenticating with a federated ID token.
#[derive(Clone, Debug, Default)]
pub(crate) struct OidcAuth {
    pub(crate) client_id: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
    pub(crate) source: Option<IdTokenSource>,
}

impl OidcAuth {
    pub(crate) fn build(b: &Builder) -> Self {
        OidcAuth {
            client_id: field(&b.client_id),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
            source: IdTokenSource::from_builder(b),
        }
    }
}

#[async_trait]
impl AuthMethod for OidcAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::Oidc
    }

    fn validate(&self) -> Result<()> {
        let when = "authenticating as a Service Principal using OpenID Connect";
        let mut v = Validation::new(when);
        v.require(&self.subscription_id, "Subscription ID")
            .require(&self.client_id, "Client ID")
            .require(&self.tenant_id, "Tenant ID")
            .check(
                self.source.is_some(),
                format!(
                    "An ID Token, an ID Token File Path or an ID Token Request URL and Token must be configured when {when}."
                ),
            );
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        config.client_id = self.client_id.clone();
        config.subscription_id = self.subscription_id.clone();
        config.tenant_id = self.tenant_id.clone();
        config.authenticated_as_a_service_principal = true;
        config.authenticated_via_oidc = true;
    }

    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        Box::new(OidcTokenProvider {
            oauth: oauth.clone(),
            version,
            resource: endpoint.to_string(),
            client_id: self.client_id.clone(),
            source: self.source.clone(),
        })
    }
}

/// Client credentials grant with a federated assertion.
#[derive(Clone, Debug)]
pub(crate) struct OidcTokenProvider {
    oauth: OAuthConfig,
    version: TokenVersion,
    resource: String,
    client_id: String,
    source: Option<IdTokenSource>,
}

#[async_trait]
impl ProvideToken for OidcTokenProvider {
    type Token = Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Token> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| Error::config_invalid("no OIDC token source is configured"))?;
        let assertion = source.id_token(ctx).await?;

        request_token(
            ctx,
            &self.oauth,
            self.version,
            &self.client_id,
            ClientAuth::Assertion(&assertion),
            &self.resource,
        )
        .await
    }
}
