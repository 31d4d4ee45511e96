// Env values used by `Builder::from_env`.
pub const ARM_SUBSCRIPTION_ID: &str = "ARM_SUBSCRIPTION_ID";
pub const ARM_CLIENT_ID: &str = "ARM_CLIENT_ID";
pub const ARM_TENANT_ID: &str = "ARM_TENANT_ID";
pub const ARM_AUXILIARY_TENANT_IDS: &str = "ARM_AUXILIARY_TENANT_IDS";
pub const ARM_ENVIRONMENT: &str = "ARM_ENVIRONMENT";
pub const ARM_CLIENT_SECRET: &str = "ARM_CLIENT_SECRET";
pub const ARM_CLIENT_CERTIFICATE_PATH: &str = "ARM_CLIENT_CERTIFICATE_PATH";
pub const ARM_CLIENT_CERTIFICATE_PASSWORD: &str = "ARM_CLIENT_CERTIFICATE_PASSWORD";
pub const ARM_MSI_ENDPOINT: &str = "ARM_MSI_ENDPOINT";
pub const ARM_OIDC_TOKEN: &str = "ARM_OIDC_TOKEN";
pub const ARM_OIDC_TOKEN_FILE_PATH: &str = "ARM_OIDC_TOKEN_FILE_PATH";
pub const ARM_OIDC_REQUEST_URL: &str = "ARM_OIDC_REQUEST_URL";
pub const ARM_OIDC_REQUEST_TOKEN: &str = "ARM_OIDC_REQUEST_TOKEN";
pub const ACTIONS_ID_TOKEN_REQUEST_URL: &str = "ACTIONS_ID_TOKEN_REQUEST_URL";
pub const ACTIONS_ID_TOKEN_REQUEST_TOKEN: &str = "ACTIONS_ID_TOKEN_REQUEST_TOKEN";
pub const ARM_USE_CLI: &str = "ARM_USE_CLI";
pub const ARM_USE_MSI: &str = "ARM_USE_MSI";
pub const ARM_USE_OIDC: &str = "ARM_USE_OIDC";
pub const ARM_USE_MSAL: &str = "ARM_USE_MSAL";
pub const ARM_TENANT_ONLY: &str = "ARM_TENANT_ONLY";

// App Service / Functions managed identity, which we refuse.
pub const MSI_ENDPOINT: &str = "MSI_ENDPOINT";
pub const MSI_SECRET: &str = "MSI_SECRET";

pub const AZURE_CONFIG_DIR: &str = "AZURE_CONFIG_DIR";
pub const AZURE_PROFILE_FILE: &str = "azureProfile.json";

/// Application ID the Azure CLI signs in with.
pub const AZURE_CLI_CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";

pub const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
pub const IMDS_API_VERSION: &str = "2018-02-01";

pub const AUXILIARY_AUTHORIZATION_HEADER: &str = "x-ms-authorization-auxiliary";
pub const MAX_AUXILIARY_TENANTS: usize = 3;

pub const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
pub const OIDC_AUDIENCE: &str = "api://AzureADTokenExchange";

/// Tokens expiring within this many seconds are treated as expired.
pub const EXPIRY_BUFFER_SECONDS: i64 = 20;
