//! Reqwest based HTTP sending for azauth.
//!
//! [`ReqwestHttpSend`] carries the token requests sent to Azure AD, the
//! instance metadata service and OIDC token endpoints. Pass a configured
//! [`reqwest::Client`] to control TLS, proxies and timeouts.

use async_trait::async_trait;
use azauth_core::{Error, HttpSend, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};

/// HttpSend backed by a [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Send requests through `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let uri = req.uri().to_string();
        let req = Request::try_from(req).map_err(|e| {
            Error::unexpected(format!("failed to convert request to {uri}")).with_source(e)
        })?;
        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| Error::unexpected(format!("failed to send request to {uri}")).with_source(e))?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::unexpected(format!("failed to read response from {uri}")).with_source(e)
            })?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let req = http::Request::get("http://127.0.0.1:1/metadata/identity/oauth2/token")
            .body(Bytes::new())
            .unwrap();

        let err = ReqwestHttpSend::default().http_send(req).await.unwrap_err();
        assert!(err.to_string().contains("127.0.0.1:1"));
    }
}
