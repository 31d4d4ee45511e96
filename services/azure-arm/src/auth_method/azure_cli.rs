use super::{field, AuthMethod, AuthMethodKind};
use crate::authorizer::{bearer_authorizer, ArmAuthorizer, BoxedTokenProvider};
use crate::builder::non_empty;
use crate::cli::{self, AzureCliTokenProvider, CliTokenScope};
use crate::constants::AZURE_CLI_CLIENT_ID;
use crate::oauth::{MultiOAuth, OAuthConfig, TokenVersion};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::{Context, Result};
use log::debug;

/// Tokens of the user signed in to the Azure CLI.
#[derive(Clone, Debug, Default)]
pub(crate) struct AzureCliAuth {
    pub(crate) client_id: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
    pub(crate) tenant_only: bool,
}

impl AzureCliAuth {
    /// Discover the subscription and tenant from the CLI.
    ///
    /// A configured tenant wins over the discovered one. In tenant only mode
    /// no subscription is looked up at all.
    pub(crate) async fn build(ctx: &Context, b: &Builder) -> Result<Self> {
        let mut auth = AzureCliAuth {
            client_id: AZURE_CLI_CLIENT_ID.to_string(),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
            tenant_only: b.tenant_only,
        };
        if b.tenant_only {
            debug!("Azure CLI in tenant only mode, skipping subscription discovery");
            return Ok(auth);
        }

        let account = cli::obtain_subscription(ctx, non_empty(&b.subscription_id)).await?;
        account.ensure_user()?;
        if let Some(user) = &account.user {
            debug!(
                "Azure CLI signed in as {} to subscription {:?} ({})",
                user.name, account.name, account.id
            );
        }

        auth.subscription_id = account.id;
        if auth.tenant_id.is_empty() {
            auth.tenant_id = account.tenant_id;
        }
        Ok(auth)
    }
}

#[async_trait]
impl AuthMethod for AzureCliAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::AzureCli
    }

    fn validate(&self) -> Result<()> {
        let mut v = Validation::new("authenticating using the Azure CLI");
        if !self.tenant_only {
            v.require(&self.subscription_id, "Subscription ID");
        }
        v.require(&self.tenant_id, "Tenant ID");
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        config.client_id = self.client_id.clone();
        config.subscription_id = self.subscription_id.clone();
        config.tenant_id = self.tenant_id.clone();
        config.authenticated_as_a_service_principal = false;
    }

    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        let scope = if self.tenant_only {
            CliTokenScope::Tenant(oauth.tenant_id.clone())
        } else {
            CliTokenScope::Subscription(self.subscription_id.clone())
        };
        Box::new(AzureCliTokenProvider {
            resource: endpoint.to_string(),
            version,
            scope,
        })
    }

    async fn get_authorization_token(
        &self,
        ctx: &Context,
        oauth: &MultiOAuth,
        endpoint: &str,
        version: TokenVersion,
    ) -> Result<ArmAuthorizer> {
        let authorizer = bearer_authorizer(
            ctx,
            self.token_provider(oauth.primary(), endpoint, version),
        );
        // surface a missing login now instead of on the first request
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        context, MockCommandExecute, MockHttpSend, ACCOUNT_SHOW, SUBSCRIPTION_ID, TENANT_ID,
    };
    use azauth_core::ErrorKind;
    use pretty_assertions::assert_eq;

    fn builder() -> Builder {
        Builder {
            supports_azure_cli_token: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_build_from_current_account() {
        let cmd = MockCommandExecute::new().with_output("account show", ACCOUNT_SHOW);
        let ctx = context(cmd, MockHttpSend::new(), &[]);

        let auth = AzureCliAuth::build(&ctx, &builder()).await.unwrap();
        assert_eq!(auth.subscription_id, SUBSCRIPTION_ID);
        assert_eq!(auth.tenant_id, TENANT_ID);
        assert_eq!(auth.client_id, AZURE_CLI_CLIENT_ID);
        assert!(auth.validate().is_ok());
    }

    #[tokio::test]
    async fn test_configured_tenant_wins() {
        let cmd = MockCommandExecute::new().with_output("account list", &format!("[{ACCOUNT_SHOW}]"));
        let ctx = context(cmd, MockHttpSend::new(), &[]);
        let b = Builder {
            subscription_id: Some(SUBSCRIPTION_ID.to_string()),
            tenant_id: Some("configured".to_string()),
            ..builder()
        };

        let auth = AzureCliAuth::build(&ctx, &b).await.unwrap();
        assert_eq!(auth.tenant_id, "configured");
    }

    #[tokio::test]
    async fn test_service_principal_login_is_rejected() {
        let account = ACCOUNT_SHOW.replace(r#""type": "user""#, r#""type": "servicePrincipal""#);
        let cmd = MockCommandExecute::new().with_output("account show", &account);
        let ctx = context(cmd, MockHttpSend::new(), &[]);

        let err = AzureCliAuth::build(&ctx, &builder()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IdentityUnsupported);
    }

    #[tokio::test]
    async fn test_tenant_only() {
        let cmd = MockCommandExecute::new().with_output(
            "account get-access-token --resource https://management.azure.com/ --tenant tenant",
            r#"{"accessToken": "tenant-token", "expires_on": 4102444800, "tokenType": "Bearer"}"#,
        );
        let ctx = context(cmd.clone(), MockHttpSend::new(), &[]);
        let b = Builder {
            tenant_id: Some("tenant".to_string()),
            tenant_only: true,
            ..builder()
        };

        let auth = AzureCliAuth::build(&ctx, &b).await.unwrap();
        assert!(auth.validate().is_ok());

        let oauth = OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap();
        let token = auth
            .get_adal_token(&ctx, &oauth, "https://management.azure.com/")
            .await
            .unwrap();
        assert_eq!(token.access_token, "tenant-token");
        assert_eq!(cmd.calls().len(), 1);
    }

    #[test]
    fn test_validate_reports_every_gap() {
        let err = AzureCliAuth::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("2 errors occurred:"));
        assert!(message.contains("A Subscription ID must be configured when authenticating using the Azure CLI."));
        assert!(message.contains("A Tenant ID must be configured when authenticating using the Azure CLI."));
    }

    #[tokio::test]
    async fn test_authorization_token_is_fetched_eagerly() {
        let cmd = MockCommandExecute::new().with_failure(
            "account get-access-token --resource https://management.azure.com/ --subscription sub",
            "ERROR: AADSTS70043: The refresh token has expired",
        );
        let ctx = context(cmd, MockHttpSend::new(), &[]);
        let auth = AzureCliAuth {
            client_id: AZURE_CLI_CLIENT_ID.to_string(),
            subscription_id: "sub".to_string(),
            tenant_id: "tenant".to_string(),
            tenant_only: false,
        };
        let oauth = MultiOAuth::SingleTenant(
            OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap(),
        );

        let err = auth
            .get_authorization_token(&ctx, &oauth, "https://management.azure.com/", TokenVersion::V1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CommandFailed);
        assert!(err.to_string().contains("AADSTS70043"));
    }

    #[tokio::test]
    async fn test_object_id_from_signed_in_user() {
        let cmd = MockCommandExecute::new().with_output("ad signed-in-user show", r#"{"id": "user-oid"}"#);
        let ctx = context(cmd, MockHttpSend::new(), &[]);
        let auth = AzureCliAuth::default();
        let config = Config::for_test(&auth);

        assert_eq!(
            auth.get_authenticated_object_id(&ctx, &config).await.unwrap(),
            Some("user-oid".to_string())
        );
    }
}
