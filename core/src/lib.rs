//! Core building blocks of azauth.
//!
//! This crate holds everything that is not specific to a cloud: the
//! [`Context`] through which all side effects flow, the [`Error`] type, the
//! token traits and the caching [`Authorizer`].
//!
//! ## Overview
//!
//! - [`Context`] owns pluggable implementations of [`FileRead`], [`HttpSend`],
//!   [`Env`] and [`CommandExecute`].
//! - [`ProvideToken`] acquires a token, [`Authorize`] puts it on a request and
//!   [`TokenCredential`] tells whether a cached token is still good.
//! - [`Authorizer`] ties the three together and refreshes on demand.
//!
//! ## Example
//!
//! ```no_run
//! use async_trait::async_trait;
//! use azauth_core::{Authorize, Authorizer, Context, ProvideToken, Result, TokenCredential};
//! use http::header::AUTHORIZATION;
//!
//! #[derive(Clone, Debug)]
//! struct StaticToken(String);
//!
//! impl TokenCredential for StaticToken {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Provider;
//!
//! #[async_trait]
//! impl ProvideToken for Provider {
//!     type Token = StaticToken;
//!
//!     async fn provide_token(&self, _: &Context) -> Result<StaticToken> {
//!         Ok(StaticToken("secret".to_string()))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct Bearer;
//!
//! impl Authorize for Bearer {
//!     type Token = StaticToken;
//!
//!     fn authorize(&self, req: &mut http::request::Parts, token: &StaticToken) -> Result<()> {
//!         req.headers
//!             .insert(AUTHORIZATION, format!("Bearer {}", token.0).parse()?);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let authorizer = Authorizer::new(Context::new(), Provider, Bearer);
//! let mut parts = http::Request::get("https://management.azure.com/")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! authorizer.authorize(&mut parts).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod time;
pub mod utils;

mod context;
pub use context::Context;
mod fs;
pub use fs::{FileRead, NoopFileRead};
mod http;
pub use http::{HttpSend, NoopHttpSend};
mod env;
pub use env::{Env, NoopEnv, OsEnv, StaticEnv};
mod command;
pub use command::{CommandExecute, CommandOutput, NoopCommandExecute};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{Authorize, ProvideToken, TokenCredential};
mod authorizer;
pub use authorizer::Authorizer;
