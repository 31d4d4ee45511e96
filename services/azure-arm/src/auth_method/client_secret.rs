use super::{field, AuthMethod, AuthMethodKind};
use crate::authorizer::BoxedTokenProvider;
use crate::oauth::{OAuthConfig, TokenVersion};
use crate::token::Token;
use crate::token_request::{request_token, ClientAuth};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::utils::Redact;
use azauth_core::{Context, ProvideToken, Result};
use std::fmt::{Debug, Formatter};

/// Service Principal authenticating with a client secret.
#[derive(Clone, Default)]
pub(crate) struct ClientSecretAuth {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
}

impl Debug for ClientSecretAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretAuth")
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl ClientSecretAuth {
    pub(crate) fn build(b: &Builder) -> Self {
        ClientSecretAuth {
            client_id: field(&b.client_id),
            client_secret: field(&b.client_secret),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
        }
    }

    /// Record the fields every client secret flow needs.
    pub(crate) fn require_fields(&self, v: &mut Validation) {
        v.require(&self.subscription_id, "Subscription ID")
            .require(&self.client_id, "Client ID")
            .require(&self.client_secret, "Client Secret")
            .require(&self.tenant_id, "Tenant ID");
    }

    pub(crate) fn provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        Box::new(ClientSecretTokenProvider {
            oauth: oauth.clone(),
            version,
            resource: endpoint.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        })
    }
}

#[async_trait]
impl AuthMethod for ClientSecretAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::ClientSecret
    }

    fn validate(&self) -> Result<()> {
        let mut v =
            Validation::new("authenticating as a Service Principal using a Client Secret");
        self.require_fields(&mut v);
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
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        self.provider(oauth, endpoint, version)
    }
}

/// Client credentials grant with a client secret.
#[derive(Clone)]
pub(crate) struct ClientSecretTokenProvider {
    oauth: OAuthConfig,
    version: TokenVersion,
    resource: String,
    client_id: String,
    client_secret: String,
}

impl Debug for ClientSecretTokenProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretTokenProvider")
            .field("tenant_id", &self.oauth.tenant_id)
            .field("version", &self.version)
            .field("resource", &self.resource)
            .field("client_id", &self.client_id)
            .field("client_secret", &Redact::from(&self.client_secret))
            .finish()
    }
}

#[async_trait]
impl ProvideToken for ClientSecretTokenProvider {
    type Token = Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Token> {
        request_token(
            ctx,
            &self.oauth,
            self.version,
            &self.client_id,
            ClientAuth::Secret(&self.client_secret),
            &self.resource,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::MultiOAuth;
    use crate::testing::{context, jwt, MockCommandExecute, MockHttpSend};
    use http::header::AUTHORIZATION;
    use pretty_assertions::assert_eq;

    fn auth() -> ClientSecretAuth {
        ClientSecretAuth {
            client_id: "client".to_string(),
            client_secret: "s3cret-value".to_string(),
            subscription_id: "sub".to_string(),
            tenant_id: "tenant".to_string(),
        }
    }

    fn oauth() -> OAuthConfig {
        OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap()
    }

    #[test]
    fn test_validate_lists_every_missing_field() {
        let err = ClientSecretAuth::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("4 errors occurred:"));
        for field in ["Subscription ID", "Client ID", "Client Secret", "Tenant ID"] {
            assert!(message.contains(&format!(
                "A {field} must be configured when authenticating as a Service Principal using a Client Secret."
            )));
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", auth());
        assert!(!debug.contains("s3cret-value"));
    }

    #[tokio::test]
    async fn test_adal_and_msal_tokens() {
        let http = MockHttpSend::new()
            .with_response(
                "/oauth2/token?api-version=1.0",
                200,
                r#"{"access_token":"adal","token_type":"Bearer","expires_on":"4102444800"}"#,
            )
            .with_response(
                "/oauth2/v2.0/token",
                200,
                r#"{"access_token":"msal","token_type":"Bearer","expires_in":3599}"#,
            );
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);

        let adal = auth()
            .get_adal_token(&ctx, &oauth(), "https://management.azure.com/")
            .await
            .unwrap();
        assert_eq!(adal.access_token, "adal");

        let msal = auth()
            .get_msal_token(&ctx, &oauth(), "https://management.azure.com/")
            .await
            .unwrap();
        assert_eq!(msal.access_token, "msal");

        let requests = http.requests();
        assert!(requests[0].body.contains("resource=https%3A%2F%2Fmanagement.azure.com%2F"));
        assert!(requests[1]
            .body
            .contains("scope=https%3A%2F%2Fmanagement.azure.com%2F.default"));
        assert!(requests[1].body.contains("client_secret=s3cret-value"));
    }

    #[tokio::test]
    async fn test_authorization_token_is_lazy() {
        let http = MockHttpSend::new().with_response(
            "/oauth2/token",
            200,
            r#"{"access_token":"arm","expires_on":4102444800}"#,
        );
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);

        let authorizer = auth()
            .get_authorization_token(
                &ctx,
                &MultiOAuth::SingleTenant(oauth()),
                "https://management.azure.com/",
                TokenVersion::V1,
            )
            .await
            .unwrap();
        assert!(http.requests().is_empty());

        let mut req = http::Request::get("https://management.azure.com/")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        authorizer.authorize(&mut req).await.unwrap();
        authorizer.authorize(&mut req).await.unwrap();
        assert_eq!(req.headers[AUTHORIZATION], "Bearer arm");
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_boxed_provider_runs_on_spawned_task() {
        let http = MockHttpSend::new().with_response(
            "/oauth2/token",
            200,
            r#"{"access_token":"spawned","expires_on":4102444800}"#,
        );
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);
        let provider = auth().token_provider(&oauth(), "https://management.azure.com/", TokenVersion::V1);

        let token = tokio::spawn(async move { provider.provide_token(&ctx).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.access_token, "spawned");
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_object_id_from_graph_token() {
        let body = format!(
            r#"{{"access_token":"{}","expires_in":3599}}"#,
            jwt(r#"{"oid":"sp-object-id","tid":"tenant","appid":"client"}"#)
        );
        let http = MockHttpSend::new().with_response("/oauth2/v2.0/token", 200, &body);
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);
        let auth = auth();
        let config = Config::for_test(&auth);

        let object_id = auth.get_authenticated_object_id(&ctx, &config).await.unwrap();
        assert_eq!(object_id, Some("sp-object-id".to_string()));
        assert!(http.requests()[0]
            .body
            .contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"));
    }
}
