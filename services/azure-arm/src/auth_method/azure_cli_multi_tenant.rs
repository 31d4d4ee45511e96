use super::{field, multi_tenant_authorization, AuthMethod, AuthMethodKind};
use crate::authorizer::{ArmAuthorizer, BoxedTokenProvider};
use crate::builder::non_empty;
use crate::cli::{self, AzureCliTokenProvider, CliTokenScope};
use crate::constants::AZURE_CLI_CLIENT_ID;
use crate::oauth::{MultiOAuth, OAuthConfig, TokenVersion};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::{Context, Result};
use log::debug;

/// Tokens of the Azure CLI user for a primary tenant and its auxiliary tenants.
#[derive(Clone, Debug, Default)]
pub(crate) struct AzureCliMultiTenantAuth {
    pub(crate) client_id: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
    pub(crate) auxiliary_tenant_ids: Vec<String>,
    pub(crate) tenant_only: bool,
}

impl AzureCliMultiTenantAuth {
    /// Pick the subscription from the CLI's on-disk profile.
    pub(crate) async fn build(ctx: &Context, b: &Builder) -> Result<Self> {
        let mut auth = AzureCliMultiTenantAuth {
            client_id: AZURE_CLI_CLIENT_ID.to_string(),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
            auxiliary_tenant_ids: b.auxiliary_tenant_ids.clone(),
            tenant_only: b.tenant_only,
        };
        if b.tenant_only {
            debug!("Azure CLI in tenant only mode, skipping subscription discovery");
            return Ok(auth);
        }

        let profile = cli::load_profile(ctx).await?;
        let account = profile.find_subscription(non_empty(&b.subscription_id))?;
        account.ensure_user()?;

        auth.subscription_id = account.id.clone();
        if auth.tenant_id.is_empty() {
            auth.tenant_id = account.tenant_id.clone();
        }
        Ok(auth)
    }
}

#[async_trait]
impl AuthMethod for AzureCliMultiTenantAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::AzureCliMultiTenant
    }

    fn validate(&self) -> Result<()> {
        let mut v = Validation::new("authenticating using the Azure CLI in a multi-tenant context");
        if !self.tenant_only {
            v.require(&self.subscription_id, "Subscription ID");
        }
        v.require(&self.tenant_id, "Tenant ID")
            .require_auxiliary_tenants(&self.auxiliary_tenant_ids);
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        config.client_id = self.client_id.clone();
        config.subscription_id = self.subscription_id.clone();
        config.tenant_id = self.tenant_id.clone();
        config.auxiliary_tenant_ids = self.auxiliary_tenant_ids.clone();
        config.authenticated_as_a_service_principal = false;
    }

    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        Box::new(AzureCliTokenProvider {
            resource: endpoint.to_string(),
            version,
            scope: CliTokenScope::Tenant(oauth.tenant_id.clone()),
        })
    }

    async fn get_authorization_token(
        &self,
        ctx: &Context,
        oauth: &MultiOAuth,
        endpoint: &str,
        version: TokenVersion,
    ) -> Result<ArmAuthorizer> {
        let authorizer = multi_tenant_authorization(self, ctx, oauth, endpoint, version)?;
        authorizer.refresh().await?;
        Ok(authorizer)
    }

    async fn get_authenticated_object_id(
        &self,
        ctx: &Context,
        _: &Config,
    ) -> Result<Option<String>> {
        cli::signed_in_user_object_id(ctx).await
    }
}
