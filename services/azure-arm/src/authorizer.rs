use crate::constants::AUXILIARY_AUTHORIZATION_HEADER;
use crate::token::{MultiTenantToken, Token};
use azauth_core::{Authorize, Authorizer, Context, ProvideToken, Result};
use http::header::{HeaderName, AUTHORIZATION};
use http::HeaderValue;

/// Authorizer stamping a single bearer token.
pub type BearerAuthorizer = Authorizer<Token>;

/// Authorizer stamping a primary token plus auxiliary tenant tokens.
pub type MultiTenantBearerAuthorizer = Authorizer<MultiTenantToken>;

fn bearer(token: &Token) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.access_token))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Sets `Authorization: Bearer <token>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct BearerAuthorize;

impl Authorize for BearerAuthorize {
    type Token = Token;

    fn authorize(&self, req: &mut http::request::Parts, token: &Token) -> Result<()> {
        req.headers.insert(AUTHORIZATION, bearer(token)?);
        Ok(())
    }
}

/// Sets `Authorization` from the primary token and
/// `x-ms-authorization-auxiliary: Bearer <a>, Bearer <b>` from the auxiliary ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiTenantBearerAuthorize;

impl Authorize for MultiTenantBearerAuthorize {
    type Token = MultiTenantToken;

    fn authorize(&self, req: &mut http::request::Parts, token: &MultiTenantToken) -> Result<()> {
        req.headers.insert(AUTHORIZATION, bearer(&token.primary)?);

        if !token.auxiliary.is_empty() {
            let auxiliary = token
                .auxiliary
                .iter()
                .map(|t| format!("Bearer {}", t.access_token))
                .collect::<Vec<_>>()
                .join(", ");
            let mut value = HeaderValue::from_str(&auxiliary)?;
            value.set_sensitive(true);
            req.headers.insert(
                HeaderName::from_static(AUXILIARY_AUTHORIZATION_HEADER),
                value,
            );
        }
        Ok(())
    }
}

/// Authorizer handed out by [`Config::get_authorization_token`](crate::Config::get_authorization_token).
#[derive(Clone, Debug)]
pub enum ArmAuthorizer {
    /// Single tenant.
    Bearer(BearerAuthorizer),
    /// Primary plus auxiliary tenants.
    MultiTenant(MultiTenantBearerAuthorizer),
}

impl ArmAuthorizer {
    /// Put the authorization headers on `req`, refreshing tokens if needed.
    pub async fn authorize(&self, req: &mut http::request::Parts) -> Result<()> {
        match self {
            ArmAuthorizer::Bearer(a) => a.authorize(req).await,
            ArmAuthorizer::MultiTenant(a) => a.authorize(req).await,
        }
    }

    /// Fetch fresh tokens right away instead of on first use.
    pub async fn refresh(&self) -> Result<()> {
        match self {
            ArmAuthorizer::Bearer(a) => a.refresh().await.map(|_| ()),
            ArmAuthorizer::MultiTenant(a) => a.refresh().await.map(|_| ()),
        }
    }

    /// Whether auxiliary tenant tokens are sent too.
    pub fn is_multi_tenant(&self) -> bool {
        matches!(self, ArmAuthorizer::MultiTenant(_))
    }
}

pub(crate) type BoxedTokenProvider = Box<dyn ProvideToken<Token = Token>>;

/// Gathers one token per tenant.
#[derive(Debug)]
pub(crate) struct MultiTenantTokenProvider {
    pub(crate) primary: BoxedTokenProvider,
    pub(crate) auxiliary: Vec<BoxedTokenProvider>,
}

#[async_trait::async_trait]
impl ProvideToken for MultiTenantTokenProvider {
    type Token = MultiTenantToken;

    async fn provide_token(&self, ctx: &Context) -> Result<MultiTenantToken> {
        let primary = self.primary.provide_token(ctx).await?;
        let mut auxiliary = Vec::with_capacity(self.auxiliary.len());
        for provider in &self.auxiliary {
            auxiliary.push(provider.provide_token(ctx).await?);
        }
        Ok(MultiTenantToken { primary, auxiliary })
    }
}

pub(crate) fn bearer_authorizer(ctx: &Context, provider: BoxedTokenProvider) -> ArmAuthorizer {
    ArmAuthorizer::Bearer(Authorizer::new(ctx.clone(), provider, BearerAuthorize))
}

pub(crate) fn multi_tenant_authorizer(
    ctx: &Context,
    provider: MultiTenantTokenProvider,
) -> ArmAuthorizer {
    ArmAuthorizer::MultiTenant(Authorizer::new(
        ctx.clone(),
        provider,
        MultiTenantBearerAuthorize,
    ))
}
