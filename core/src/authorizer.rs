use crate::{Authorize, Context, ProvideToken, Result, TokenCredential};
use log::debug;
use std::sync::{Arc, Mutex};

/// Authorizer puts a valid token on every request it is handed.
///
/// The token is cached and shared between clones. When the cached token is
/// missing or no longer valid the provider is asked for a new one first.
#[derive(Clone, Debug)]
pub struct Authorizer<T: TokenCredential> {
    ctx: Context,
    provider: Arc<dyn ProvideToken<Token = T>>,
    applier: Arc<dyn Authorize<Token = T>>,
    token: Arc<Mutex<Option<T>>>,
}

impl<T: TokenCredential> Authorizer<T> {
    /// Create a new authorizer with an empty cache.
    pub fn new(
        ctx: Context,
        provider: impl ProvideToken<Token = T>,
        applier: impl Authorize<Token = T>,
    ) -> Self {
        Self {
            ctx,
            provider: Arc::new(provider),
            applier: Arc::new(applier),
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Current token, refreshed through the provider when needed.
    pub async fn token(&self) -> Result<T> {
        let cached = self.token.lock().expect("lock poisoned").clone();
        match cached {
            Some(token) if token.is_valid() => Ok(token),
            _ => self.refresh().await,
        }
    }

    /// Fetch a new token from the provider and cache it.
    pub async fn refresh(&self) -> Result<T> {
        debug!("refreshing token through {:?}", self.provider);
        let token = self.provider.provide_token(&self.ctx).await?;
        *self.token.lock().expect("lock poisoned") = Some(token.clone());
        Ok(token)
    }

    /// Authorize `req` with the current token.
    pub async fn authorize(&self, req: &mut http::request::Parts) -> Result<()> {
        let token = self.token().await?;
        self.applier.authorize(req, &token)
    }
}

#[async_trait::async_trait]
impl<P: ProvideToken + ?Sized> ProvideToken for Box<P> {
    type Token = P::Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Self::Token> {
        (**self).provide_token(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use http::header::AUTHORIZATION;
    use http::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug)]
    struct Fake {
        value: String,
        valid: bool,
    }

    impl TokenCredential for Fake {
        fn is_valid(&self) -> bool {
            self.valid
        }
    }

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        valid: bool,
    }

    #[async_trait::async_trait]
    impl ProvideToken for CountingProvider {
        type Token = Fake;

        async fn provide_token(&self, _: &Context) -> Result<Fake> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Fake {
                value: format!("token-{n}"),
                valid: self.valid,
            })
        }
    }

    #[derive(Debug)]
    struct FailingProvider;

    #[async_trait::async_trait]
    impl ProvideToken for FailingProvider {
        type Token = Fake;

        async fn provide_token(&self, _: &Context) -> Result<Fake> {
            Err(Error::token_exchange("denied"))
        }
    }

    #[derive(Debug)]
    struct HeaderApplier;

    impl Authorize for HeaderApplier {
        type Token = Fake;

        fn authorize(&self, req: &mut http::request::Parts, token: &Fake) -> Result<()> {
            req.headers
                .insert(AUTHORIZATION, HeaderValue::from_str(&token.value)?);
            Ok(())
        }
    }

    fn parts() -> http::request::Parts {
        http::Request::get("https://management.azure.com/subscriptions")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn test_valid_token_is_cached() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let authorizer = Authorizer::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: true,
            },
            HeaderApplier,
        );

        let mut req = parts();
        authorizer.authorize(&mut req).await?;
        authorizer.clone().authorize(&mut req).await?;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(req.headers[AUTHORIZATION], "token-1");
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_token_is_refreshed() -> Result<()> {
        let calls = Arc::new(AtomicUsize::new(0));
        let authorizer = Authorizer::new(
            Context::new(),
            CountingProvider {
                calls: calls.clone(),
                valid: false,
            },
            HeaderApplier,
        );

        let mut req = parts();
        authorizer.authorize(&mut req).await?;
        authorizer.authorize(&mut req).await?;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(req.headers[AUTHORIZATION], "token-2");
        Ok(())
    }

    #[tokio::test]
    async fn test_provider_error_is_returned() {
        let authorizer = Authorizer::new(Context::new(), Box::new(FailingProvider), HeaderApplier);

        let err = authorizer.authorize(&mut parts()).await.unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::TokenExchange);
    }
}
