use anyhow::Result;
use azauth::azure_arm::Builder;
use azauth::default_context;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let ctx = default_context();

    let config = Builder {
        supports_client_secret_auth: true,
        supports_client_certificate_auth: true,
        supports_managed_service_identity: true,
        supports_azure_cli_token: true,
        ..Default::default()
    }
    .from_env(&ctx)
    .build(&ctx)
    .await?;
    println!("authenticated with {}", config.auth_method());

    let oauth = config.get_multi_oauth_config(config.environment.active_directory_endpoint)?;
    let authorizer = config
        .get_authorization_token(&ctx, &oauth, config.environment.resource_manager_endpoint)
        .await?;

    let mut req = http::Request::builder()
        .method(http::Method::GET)
        .uri(format!(
            "{}subscriptions/{}?api-version=2020-01-01",
            config.environment.resource_manager_endpoint, config.subscription_id
        ))
        .body(())?
        .into_parts()
        .0;
    authorizer.authorize(&mut req).await?;

    let signed = http::Request::from_parts(req, bytes::Bytes::new());
    let resp = ctx.http_send(signed).await?;
    println!("Response status: {}", resp.status());

    Ok(())
}
