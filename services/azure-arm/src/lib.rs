//! Azure Resource Manager authentication
//!
//! This crate resolves how to authenticate against Azure from whatever is
//! configured and hands out authorizers for ARM requests. Supported methods,
//! in the order they are tried:
//!
//! - Service Principal with a client certificate
//! - Service Principal with a client secret (optionally across auxiliary tenants)
//! - Service Principal with an OIDC federated token
//! - Managed identity
//! - The Azure CLI (optionally across auxiliary tenants)
//!
//! # Example
//!
//! ```rust,no_run
//! use anyhow::Result;
//! use azauth_azure_arm::Builder;
//! use azauth_command_execute_tokio::TokioCommandExecute;
//! use azauth_core::{Context, OsEnv};
//! use azauth_file_read_tokio::TokioFileRead;
//! use azauth_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_command_execute(TokioCommandExecute::new())
//!         .with_env(OsEnv);
//!
//!     let builder = Builder {
//!         supports_client_secret_auth: true,
//!         supports_client_certificate_auth: true,
//!         supports_auxiliary_tenants: true,
//!         ..Default::default()
//!     }
//!     .from_env(&ctx);
//!     let config = builder.build(&ctx).await?;
//!
//!     let oauth = config.get_multi_oauth_config(config.environment.active_directory_endpoint)?;
//!     let authorizer = config
//!         .get_authorization_token(&ctx, &oauth, config.environment.resource_manager_endpoint)
//!         .await?;
//!
//!     let url = "https://management.azure.com/subscriptions?api-version=2020-01-01";
//!     let (mut parts, body) = http::Request::get(url).body(())?.into_parts();
//!     authorizer.authorize(&mut parts).await?;
//!     let _req = http::Request::from_parts(parts, body);
//!     Ok(())
//! }
//! ```

mod constants;

mod environment;
pub use environment::{
    Environment, CHINA_CLOUD, GERMAN_CLOUD, PUBLIC_CLOUD, US_GOVERNMENT_CLOUD,
};

mod oauth;
pub use oauth::{MultiOAuth, MultiTenantOAuthConfig, OAuthConfig, TokenVersion};

mod token;
pub use token::{Claims, MultiTenantToken, Token};

mod authorizer;
pub use authorizer::{
    ArmAuthorizer, BearerAuthorize, BearerAuthorizer, MultiTenantBearerAuthorize,
    MultiTenantBearerAuthorizer,
};

mod auth_method;
pub use auth_method::{AuthMethodKind, AUTH_METHOD_PRIORITY};

mod builder;
pub use builder::Builder;

mod config;
pub use config::Config;

mod cli;
mod token_request;
mod validation;

#[cfg(test)]
mod testing;
