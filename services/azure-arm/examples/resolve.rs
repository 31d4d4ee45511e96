use std::time::Duration;

use anyhow::Result;
use azauth_azure_arm::Builder;
use azauth_command_execute_tokio::TokioCommandExecute;
use azauth_core::{Context, OsEnv};
use azauth_file_read_tokio::TokioFileRead;
use azauth_http_send_reqwest::ReqwestHttpSend;

/// Resolve the authentication method from `ARM_*` variables and print who we are.
#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let ctx = Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::default())
        .with_command_execute(TokioCommandExecute::new().with_timeout(Duration::from_secs(30)))
        .with_env(OsEnv);

    let builder = Builder {
        supports_auxiliary_tenants: true,
        supports_client_certificate_auth: true,
        supports_client_secret_auth: true,
        supports_oidc_auth: true,
        supports_azure_cli_token: true,
        ..Default::default()
    }
    .from_env(&ctx);

    let config = match builder.build(&ctx).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to resolve an authentication method: {err}");
            return Err(err.into());
        }
    };

    println!("authentication method: {}", config.auth_method());
    println!("environment:           {}", config.environment.name);
    println!("subscription:          {}", config.subscription_id);
    println!("tenant:                {}", config.tenant_id);
    println!("client:                {}", config.client_id);
    if !config.auxiliary_tenant_ids.is_empty() {
        println!("auxiliary tenants:     {}", config.auxiliary_tenant_ids.join(", "));
    }

    match config.get_authenticated_object_id(&ctx).await {
        Ok(Some(object_id)) => println!("object id:             {object_id}"),
        Ok(None) => println!("object id:             unknown"),
        Err(err) => eprintln!("failed to look up the object id: {err}"),
    }

    let oauth = config.get_oauth_config(config.environment.active_directory_endpoint)?;
    let token = if config.use_microsoft_graph {
        config
            .get_msal_token(&ctx, &oauth, config.environment.resource_manager_endpoint)
            .await?
    } else {
        config
            .get_adal_token(&ctx, &oauth, config.environment.resource_manager_endpoint)
            .await?
    };
    println!("token expires on:      {:?}", token.expires_on);

    Ok(())
}
