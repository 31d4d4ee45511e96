#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use azauth_core::*;

#[cfg(all(feature = "default-context", not(target_arch = "wasm32")))]
mod context;
#[cfg(all(feature = "default-context", not(target_arch = "wasm32")))]
pub use context::default_context;

#[cfg(feature = "azure-arm")]
pub mod azure_arm {
    pub use azauth_azure_arm::*;
}
