use crate::constants::MAX_AUXILIARY_TENANTS;
use azauth_core::{Error, Result};
use http::Uri;

/// Flavor of Azure AD token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenVersion {
    /// ADAL style v1 endpoint, asked for a `resource`.
    V1,
    /// MSAL style v2 endpoint, asked for a `scope`.
    V2,
}

impl TokenVersion {
    /// V2 when Microsoft Graph is in use, V1 otherwise.
    pub fn for_microsoft_graph(use_microsoft_graph: bool) -> Self {
        if use_microsoft_graph {
            TokenVersion::V2
        } else {
            TokenVersion::V1
        }
    }
}

/// OAuth endpoints of a single Azure AD tenant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthConfig {
    /// Tenant the endpoints belong to.
    pub tenant_id: String,
    /// `https://login.microsoftonline.com/{tenant}/`
    pub authority_endpoint: String,
    /// v1 authorize endpoint.
    pub authorize_endpoint: String,
    /// v1 token endpoint.
    pub token_endpoint: String,
    /// v1 device code endpoint.
    pub device_code_endpoint: String,
}

impl OAuthConfig {
    /// Build the endpoints of `tenant_id` below `active_directory_endpoint`.
    pub fn new(active_directory_endpoint: &str, tenant_id: &str) -> Result<Self> {
        let uri: Uri = active_directory_endpoint.parse().map_err(|e| {
            Error::config_invalid(format!(
                "invalid Active Directory endpoint {active_directory_endpoint:?}"
            ))
            .with_source(e)
        })?;
        if !matches!(uri.scheme_str(), Some("https") | Some("http")) || uri.host().is_none() {
            return Err(Error::config_invalid(format!(
                "Active Directory endpoint {active_directory_endpoint:?} must be an absolute http(s) url"
            )));
        }

        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(Error::config_invalid("tenant ID must not be empty"));
        }
        if tenant_id.contains('/') {
            return Err(Error::config_invalid(format!(
                "tenant ID {tenant_id:?} must not contain '/'"
            )));
        }

        let authority = format!(
            "{}/{}/",
            active_directory_endpoint.trim_end_matches('/'),
            tenant_id
        );
        Ok(Self {
            tenant_id: tenant_id.to_string(),
            authorize_endpoint: format!("{authority}oauth2/authorize?api-version=1.0"),
            token_endpoint: format!("{authority}oauth2/token?api-version=1.0"),
            device_code_endpoint: format!("{authority}oauth2/devicecode?api-version=1.0"),
            authority_endpoint: authority,
        })
    }

    /// v2 token endpoint.
    pub fn v2_token_endpoint(&self) -> String {
        format!("{}oauth2/v2.0/token", self.authority_endpoint)
    }

    /// Token endpoint of the given flavor.
    pub fn token_endpoint_for(&self, version: TokenVersion) -> String {
        match version {
            TokenVersion::V1 => self.token_endpoint.clone(),
            TokenVersion::V2 => self.v2_token_endpoint(),
        }
    }
}

/// OAuth endpoints of a primary tenant plus its auxiliary tenants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiTenantOAuthConfig {
    /// Tenant that owns the credential.
    pub primary: OAuthConfig,
    /// One to three additional tenants.
    pub auxiliary: Vec<OAuthConfig>,
}

impl MultiTenantOAuthConfig {
    /// Build the endpoints for `primary_tenant_id` and every auxiliary tenant.
    pub fn new(
        active_directory_endpoint: &str,
        primary_tenant_id: &str,
        auxiliary_tenant_ids: &[String],
    ) -> Result<Self> {
        if auxiliary_tenant_ids.is_empty() || auxiliary_tenant_ids.len() > MAX_AUXILIARY_TENANTS {
            return Err(Error::config_invalid(format!(
                "must specify one to {MAX_AUXILIARY_TENANTS} auxiliary tenants, got {}",
                auxiliary_tenant_ids.len()
            )));
        }

        let primary = OAuthConfig::new(active_directory_endpoint, primary_tenant_id)?;
        let auxiliary = auxiliary_tenant_ids
            .iter()
            .map(|tenant| OAuthConfig::new(active_directory_endpoint, tenant))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { primary, auxiliary })
    }
}

/// Either a single tenant or a multi-tenant OAuth configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultiOAuth {
    /// No auxiliary tenants.
    SingleTenant(OAuthConfig),
    /// Primary plus auxiliary tenants.
    MultiTenant(MultiTenantOAuthConfig),
}

impl MultiOAuth {
    /// Configuration of the primary tenant.
    pub fn primary(&self) -> &OAuthConfig {
        match self {
            MultiOAuth::SingleTenant(oauth) => oauth,
            MultiOAuth::MultiTenant(oauth) => &oauth.primary,
        }
    }

    /// Configurations of the auxiliary tenants, empty for a single tenant.
    pub fn auxiliary(&self) -> &[OAuthConfig] {
        match self {
            MultiOAuth::SingleTenant(_) => &[],
            MultiOAuth::MultiTenant(oauth) => &oauth.auxiliary,
        }
    }

    /// Whether auxiliary tenants are present.
    pub fn is_multi_tenant(&self) -> bool {
        matches!(self, MultiOAuth::MultiTenant(_))
    }
}
