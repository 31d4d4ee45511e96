use azauth_core::{Error, Result};

/// Endpoints of one Azure cloud.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environment {
    /// Canonical name such as `AzurePublicCloud`.
    pub name: &'static str,
    /// Azure AD login endpoint.
    pub active_directory_endpoint: &'static str,
    /// Azure Resource Manager endpoint.
    pub resource_manager_endpoint: &'static str,
    /// Azure AD Graph endpoint.
    pub graph_endpoint: &'static str,
    /// Microsoft Graph endpoint.
    pub microsoft_graph_endpoint: &'static str,
    /// Key Vault resource.
    pub key_vault_endpoint: &'static str,
    /// Audience of Resource Manager tokens.
    pub token_audience: &'static str,
}

/// Azure public cloud.
pub const PUBLIC_CLOUD: Environment = Environment {
    name: "AzurePublicCloud",
    active_directory_endpoint: "https://login.microsoftonline.com/",
    resource_manager_endpoint: "https://management.azure.com/",
    graph_endpoint: "https://graph.windows.net/",
    microsoft_graph_endpoint: "https://graph.microsoft.com/",
    key_vault_endpoint: "https://vault.azure.net/",
    token_audience: "https://management.azure.com/",
};

/// Azure US Government cloud.
pub const US_GOVERNMENT_CLOUD: Environment = Environment {
    name: "AzureUSGovernmentCloud",
    active_directory_endpoint: "https://login.microsoftonline.us/",
    resource_manager_endpoint: "https://management.usgovcloudapi.net/",
    graph_endpoint: "https://graph.windows.net/",
    microsoft_graph_endpoint: "https://graph.microsoft.us/",
    key_vault_endpoint: "https://vault.usgovcloudapi.net/",
    token_audience: "https://management.usgovcloudapi.net/",
};

/// Azure China cloud.
pub const CHINA_CLOUD: Environment = Environment {
    name: "AzureChinaCloud",
    active_directory_endpoint: "https://login.chinacloudapi.cn/",
    resource_manager_endpoint: "https://management.chinacloudapi.cn/",
    graph_endpoint: "https://graph.chinacloudapi.cn/",
    microsoft_graph_endpoint: "https://microsoftgraph.chinacloudapi.cn/",
    key_vault_endpoint: "https://vault.azure.cn/",
    token_audience: "https://management.chinacloudapi.cn/",
};

/// Azure Germany cloud.
pub const GERMAN_CLOUD: Environment = Environment {
    name: "AzureGermanCloud",
    active_directory_endpoint: "https://login.microsoftonline.de/",
    resource_manager_endpoint: "https://management.microsoftazure.de/",
    graph_endpoint: "https://graph.cloudapi.de/",
    microsoft_graph_endpoint: "https://graph.microsoft.de/",
    key_vault_endpoint: "https://vault.microsoftazure.de/",
    token_audience: "https://management.microsoftazure.de/",
};

const ENVIRONMENTS: [&Environment; 4] = [
    &PUBLIC_CLOUD,
    &US_GOVERNMENT_CLOUD,
    &CHINA_CLOUD,
    &GERMAN_CLOUD,
];

impl Default for Environment {
    fn default() -> Self {
        PUBLIC_CLOUD
    }
}

impl Environment {
    /// Look a cloud up by name.
    ///
    /// Matching ignores case and accepts both the short form (`china`) and the
    /// canonical one (`AzureChinaCloud`). An empty name means the public cloud.
    pub fn from_name(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(PUBLIC_CLOUD);
        }

        let upper = name.to_uppercase();
        let wrapped = format!("AZURE{upper}CLOUD");
        ENVIRONMENTS
            .iter()
            .find(|env| {
                let canonical = env.name.to_uppercase();
                canonical == upper || canonical == wrapped
            })
            .map(|env| (*env).clone())
            .ok_or_else(|| {
                Error::config_invalid(format!(
                    "no Azure cloud environment matches the name {name:?}"
                ))
            })
    }
}
