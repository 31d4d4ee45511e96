use super::client_secret::ClientSecretAuth;
use super::{multi_tenant_authorization, AuthMethod, AuthMethodKind};
use crate::authorizer::{ArmAuthorizer, BoxedTokenProvider};
use crate::oauth::{MultiOAuth, OAuthConfig, TokenVersion};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::{Context, Result};

/// Service Principal with a client secret, authorized in auxiliary tenants too.
#[derive(Clone, Debug, Default)]
pub(crate) struct ClientSecretMultiTenantAuth {
    pub(crate) secret: ClientSecretAuth,
    pub(crate) auxiliary_tenant_ids: Vec<String>,
}

impl ClientSecretMultiTenantAuth {
    pub(crate) fn build(b: &Builder) -> Self {
        ClientSecretMultiTenantAuth {
            secret: ClientSecretAuth::build(b),
            auxiliary_tenant_ids: b.auxiliary_tenant_ids.clone(),
        }
    }
}

#[async_trait]
impl AuthMethod for ClientSecretMultiTenantAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::ClientSecretMultiTenant
    }

    fn validate(&self) -> Result<()> {
        let mut v = Validation::new(
            "authenticating as a Service Principal in a multi-tenant context using a Client Secret",
        );
        self.secret.require_fields(&mut v);
        v.require_auxiliary_tenants(&self.auxiliary_tenant_ids);
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        self.secret.populate_config(config);
        config.auxiliary_tenant_ids = self.auxiliary_tenant_ids.clone();
    }

    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        self.secret.provider(oauth, endpoint, version)
    }

    async fn get_authorization_token(
        &self,
        ctx: &Context,
        oauth: &MultiOAuth,
        endpoint: &str,
        version: TokenVersion,
    ) -> Result<ArmAuthorizer> {
        multi_tenant_authorization(self, ctx, oauth, endpoint, version)
    }
}
