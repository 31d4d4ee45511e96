use crate::{Context, Result};
use std::fmt::Debug;

/// TokenCredential is a token that knows whether it can still be used.
pub trait TokenCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Whether the token can be sent as is.
    ///
    /// Implementations should return `false` slightly before the real expiry
    /// so that a request never leaves with a token that dies in flight.
    fn is_valid(&self) -> bool;
}

impl<T: TokenCredential> TokenCredential for Option<T> {
    fn is_valid(&self) -> bool {
        let Some(token) = self else {
            return false;
        };

        token.is_valid()
    }
}

/// ProvideToken acquires a fresh token.
///
/// Every authentication method exposes one of these per tenant. An
/// [`Authorizer`](crate::Authorizer) calls it again whenever its cached token
/// is missing or about to expire, so it doubles as the refresh callback.
#[async_trait::async_trait]
pub trait ProvideToken: Debug + Send + Sync + Unpin + 'static {
    /// Token produced by this provider.
    type Token: Send + Sync + Unpin + 'static;

    /// Acquire a new token.
    async fn provide_token(&self, ctx: &Context) -> Result<Self::Token>;
}

/// Authorize stamps a token onto an outgoing request.
pub trait Authorize: Debug + Send + Sync + Unpin + 'static {
    /// Token understood by this implementation.
    type Token: Send + Sync + Unpin + 'static;

    /// Put `token` on `req`, usually as headers.
    fn authorize(&self, req: &mut http::request::Parts, token: &Self::Token) -> Result<()>;
}
