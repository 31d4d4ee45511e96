use crate::{Error, Result};
use bytes::Bytes;
use std::fmt::Debug;

/// HttpSend sends the few HTTP requests token acquisition needs.
///
/// That covers Azure AD token endpoints, the instance metadata service and
/// OIDC token request URLs. It is not meant to be a general purpose client.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send `req` and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// HttpSend that refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::unexpected(format!(
            "cannot send request to {}: no http client configured",
            req.uri()
        )))
    }
}
