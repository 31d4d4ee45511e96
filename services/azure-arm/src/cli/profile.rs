use super::AzureCliAccount;
use crate::constants::{AZURE_CONFIG_DIR, AZURE_PROFILE_FILE};
use azauth_core::{Context, Error, Result};
use log::debug;
use serde::Deserialize;
use std::path::PathBuf;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The `azureProfile.json` the Azure CLI keeps its accounts in.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AzureCliProfile {
    #[serde(default)]
    pub installation_id: String,
    #[serde(default)]
    pub subscriptions: Vec<AzureCliAccount>,
}

impl AzureCliProfile {
    /// The account of `subscription_id`, or the default one when `None`.
    pub(crate) fn find_subscription(&self, subscription_id: Option<&str>) -> Result<&AzureCliAccount> {
        let found = match subscription_id {
            Some(id) => self
                .subscriptions
                .iter()
                .find(|a| a.id.eq_ignore_ascii_case(id)),
            None => self.subscriptions.iter().find(|a| a.is_default),
        };

        found.ok_or_else(|| match subscription_id {
            Some(id) => Error::config_invalid(format!(
                "subscription {id:?} was not found in the Azure CLI profile; \
                 run `az account list` to see the available subscriptions"
            )),
            None => Error::config_invalid(
                "no default subscription was found in the Azure CLI profile; \
                 run `az account set` to select one",
            ),
        })
    }
}

/// `$AZURE_CONFIG_DIR`, falling back to `~/.azure`.
pub(crate) fn azure_config_dir(ctx: &Context) -> Option<PathBuf> {
    if let Some(dir) = ctx.env_var(AZURE_CONFIG_DIR).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    ctx.home_dir().map(|home| home.join(".azure"))
}

/// Load the Azure CLI profile from disk.
pub(crate) async fn load_profile(ctx: &Context) -> Result<AzureCliProfile> {
    let dir = azure_config_dir(ctx).ok_or_else(|| {
        Error::config_invalid(
            "cannot locate the Azure CLI profile: neither AZURE_CONFIG_DIR nor a home directory is available",
        )
    })?;
    let path = dir.join(AZURE_PROFILE_FILE);
    let path = path.to_string_lossy();

    debug!("loading Azure CLI profile from {path}");
    let content = ctx.file_read(&path).await.map_err(|e| {
        Error::config_invalid(format!(
            "the Azure CLI profile was not found at {path}; \
             make sure the Azure CLI is installed and run `az login`"
        ))
        .with_source(e)
    })?;

    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);
    let profile: AzureCliProfile = serde_json::from_slice(content).map_err(|e| {
        Error::response_invalid(format!("parsing the Azure CLI profile at {path}")).with_source(e)
    })?;
    debug!(
        "Azure CLI installation {} lists {} subscriptions",
        profile.installation_id,
        profile.subscriptions.len()
    );
    Ok(profile)
}
