// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use super::{field, AuthMethod, AuthMethodKind};
use crate::authorizer::BoxedTokenProvider;
use crate::oauth::{OAuthConfig, TokenVersion};
use crate::token::Token;
use crate::token_request::{request_token, ClientAuth};
use crate::validation::Validation;
use crate::{Builder, Config};
use async_trait::async_trait;
use azauth_core::time;
use azauth_core::utils::Redact;
use azauth_core::{Context, Error, ProvideToken, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use log::debug;
use p12_keystore::KeyStore;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use serde::Serialize;
use sha1::{Digest, Sha1};
use std::fmt::{Debug, Formatter};

/// Lifetime of a client assertion.
const ASSERTION_LIFETIME_SECONDS: i64 = 600;

/// Service Principal authenticating with a client certificate.
#[derive(Clone, Default)]
pub(crate) struct ClientCertificateAuth {
    pub(crate) client_id: String,
    pub(crate) client_certificate_path: String,
    pub(crate) client_certificate_password: String,
    pub(crate) subscription_id: String,
    pub(crate) tenant_id: String,
}

impl Debug for ClientCertificateAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificateAuth")
            .field("client_id", &self.client_id)
            .field("client_certificate_path", &self.client_certificate_path)
            .field(
                "client_certificate_password",
                &Redact::from(&self.client_certificate_password),
            )
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

impl ClientCertificateAuth {
    pub(crate) fn build(b: &Builder) -> Self {
        ClientCertificateAuth {
            client_id: field(&b.client_id),
            client_certificate_path: field(&b.client_certificate_path),
            client_certificate_password: field(&b.client_certificate_password),
            subscription_id: field(&b.subscription_id),
            tenant_id: field(&b.tenant_id),
        }
    }
}

#[async_trait]
impl AuthMethod for ClientCertificateAuth {
    fn kind(&self) -> AuthMethodKind {
        AuthMethodKind::ClientCertificate
    }

    fn validate(&self) -> Result<()> {
        let mut v =
            Validation::new("authenticating as a Service Principal using a Client Certificate");
        v.require(&self.subscription_id, "Subscription ID")
            .require(&self.client_id, "Client ID")
            .require(&self.client_certificate_path, "Client Certificate Path")
            .require(&self.tenant_id, "Tenant ID");
        v.finish()
    }

    fn populate_config(&self, config: &mut Config) {
        config.client_id = self.client_id.clone();
        config.subscription_id = self.subscription_id.clone();
        config.tenant_id = self.tenant_id.clone();
        config.authenticated_as_a_service_principal = true;
    }

    fn token_provider(
        &self,
        oauth: &OAuthConfig,
        endpoint: &str,
        version: TokenVersion,
    ) -> BoxedTokenProvider {
        Box::new(ClientCertificateTokenProvider {
            oauth: oauth.clone(),
            version,
            resource: endpoint.to_string(),
            client_id: self.client_id.clone(),
            certificate_path: self.client_certificate_path.clone(),
            certificate_password: self.client_certificate_password.clone(),
        })
    }
}

/// Certificate and private key loaded from a PKCS#12 archive or a PEM bundle.
pub(crate) struct ClientCertificate {
    /// DER of the leaf certificate.
    certificate: Vec<u8>,
    key: RsaPrivateKey,
}

impl ClientCertificate {
    /// Load a PKCS#12 archive (`.pfx`/`.p12`), falling back to a PEM bundle
    /// when the content is not DER.
    pub(crate) fn load(content: &[u8], password: &str) -> Result<Self> {
        // DER SEQUENCE tag
        if content.first() == Some(&0x30) {
            Self::from_pkcs12(content, password)
        } else {
            Self::from_pem(content, password)
        }
    }

    /// Decrypt a PKCS#12 archive with `password` and take its first key chain.
    pub(crate) fn from_pkcs12(content: &[u8], password: &str) -> Result<Self> {
        let keystore = KeyStore::from_pkcs12(content, password).map_err(|e| {
            Error::config_invalid("decoding the PKCS#12 client certificate").with_source(e)
        })?;
        let (alias, chain) = keystore.private_key_chain().ok_or_else(|| {
            Error::config_invalid("no private key found in the PKCS#12 client certificate")
        })?;
        let certificate = chain.chain().first().ok_or_else(|| {
            Error::config_invalid(format!(
                "no certificate found for key {alias:?} in the PKCS#12 client certificate"
            ))
        })?;
        let key = RsaPrivateKey::from_pkcs8_der(chain.key()).map_err(|e| {
            Error::config_invalid(format!("decoding the client certificate key: {e}"))
        })?;
        debug!("loaded PKCS#12 client certificate {alias:?}");

        Ok(Self {
            certificate: certificate.as_der().to_vec(),
            key,
        })
    }

    /// Parse a PEM bundle holding a `CERTIFICATE` and an RSA private key.
    ///
    /// The key may be PKCS#8 (`PRIVATE KEY`), password protected PKCS#8
    /// (`ENCRYPTED PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`).
    pub(crate) fn from_pem(content: &[u8], password: &str) -> Result<Self> {
        let blocks = pem::parse_many(content).map_err(|e| {
            Error::config_invalid(format!("client certificate is not a valid PEM bundle: {e}"))
        })?;

        let mut certificate = None;
        let mut key: Option<std::result::Result<RsaPrivateKey, String>> = None;
        for block in &blocks {
            match block.tag() {
                "CERTIFICATE" if certificate.is_none() => {
                    certificate = Some(block.contents().to_vec())
                }
                "PRIVATE KEY" => {
                    key = Some(
                        RsaPrivateKey::from_pkcs8_der(block.contents()).map_err(|e| e.to_string()),
                    )
                }
                "ENCRYPTED PRIVATE KEY" => {
                    if password.is_empty() {
                        return Err(Error::config_invalid(
                            "client certificate key is encrypted but no password was configured",
                        ));
                    }
                    key = Some(
                        RsaPrivateKey::from_pkcs8_encrypted_der(block.contents(), password)
                            .map_err(|e| e.to_string()),
                    )
                }
                "RSA PRIVATE KEY" => {
                    key = Some(
                        RsaPrivateKey::from_pkcs1_der(block.contents()).map_err(|e| e.to_string()),
                    )
                }
                _ => {}
            }
        }

        let certificate = certificate.ok_or_else(|| {
            Error::config_invalid("no CERTIFICATE block found in the client certificate")
        })?;
        let key = key
            .ok_or_else(|| {
                Error::config_invalid("no private key block found in the client certificate")
            })?
            .map_err(|e| {
                Error::config_invalid(format!("decoding the client certificate key: {e}"))
            })?;
        Ok(Self { certificate, key })
    }

    /// Base64url SHA-1 thumbprint of the certificate, the JWT `x5t` header.
    pub(crate) fn thumbprint(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha1::digest(&self.certificate))
    }

    /// Self-signed client assertion for `audience`.
    pub(crate) fn assertion(&self, client_id: &str, audience: &str) -> Result<String> {
        let now = time::now().timestamp();
        let claims = AssertionClaims {
            aud: audience,
            exp: now + ASSERTION_LIFETIME_SECONDS,
            iss: client_id,
            jti: hex::encode(rand::random::<[u8; 16]>()),
            nbf: now,
            sub: client_id,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(self.thumbprint());

        let der = self.key.to_pkcs1_der().map_err(|e| {
            Error::unexpected(format!("encoding the client certificate key: {e}"))
        })?;
        jsonwebtoken::encode(&header, &claims, &EncodingKey::from_rsa_der(der.as_bytes()))
            .map_err(|e| Error::unexpected("signing the client assertion").with_source(e))
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    aud: &'a str,
    exp: i64,
    iss: &'a str,
    jti: String,
    nbf: i64,
    sub: &'a str,
}

/// Client credentials grant with a certificate signed assertion.
#[derive(Clone)]
pub(crate) struct ClientCertificateTokenProvider {
    oauth: OAuthConfig,
    version: TokenVersion,
    resource: String,
    client_id: String,
    certificate_path: String,
    certificate_password: String,
}

impl Debug for ClientCertificateTokenProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificateTokenProvider")
            .field("tenant_id", &self.oauth.tenant_id)
            .field("version", &self.version)
            .field("resource", &self.resource)
            .field("client_id", &self.client_id)
            .field("certificate_path", &self.certificate_path)
            .field("certificate_password", &Redact::from(&self.certificate_password))
            .finish()
    }
}

#[async_trait]
impl ProvideToken for ClientCertificateTokenProvider {
    type Token = Token;

    async fn provide_token(&self, ctx: &Context) -> Result<Token> {
        let path = ctx
            .expand_home_dir(&self.certificate_path)
            .unwrap_or_else(|| self.certificate_path.clone());
        debug!("loading client certificate from {path}");
        let content = ctx.file_read(&path).await.map_err(|e| {
            Error::config_invalid(format!("reading the client certificate at {path}")).with_source(e)
        })?;
        let certificate = ClientCertificate::load(&content, &self.certificate_password)?;

        let endpoint = self.oauth.token_endpoint_for(self.version);
        let audience = endpoint.split('?').next().unwrap_or_default();
        let assertion = certificate.assertion(&self.client_id, audience)?;

        request_token(
            ctx,
            &self.oauth,
            self.version,
            &self.client_id,
            ClientAuth::Assertion(&assertion),
            &self.resource,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, MockCommandExecute, MockFileRead, MockHttpSend};
    use rsa::pkcs1::{EncodeRsaPublicKey, LineEnding};
    use rsa::pkcs8::EncodePrivateKey;
    use std::sync::OnceLock;

    const CERTIFICATE: &[u8] = b"not really a certificate, only hashed";
    const PFX: &[u8] = include_bytes!("../../testdata/client.pfx");
    const PFX_PASSWORD: &str = "azauth-pw";
    const PFX_PUBLIC_KEY: &str = include_str!("../../testdata/client-public.pem");
    /// `openssl x509 -outform DER | openssl dgst -sha1 -binary`, base64url.
    const PFX_THUMBPRINT: &str = "4aRPUS4ZGYQYGHqhgwLeKC2IUb4";

    fn key() -> &'static RsaPrivateKey {
        static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap())
    }

    fn bundle(key_pem: &str) -> String {
        let certificate = pem::encode(&pem::Pem::new("CERTIFICATE", CERTIFICATE.to_vec()));
        format!("{certificate}{key_pem}")
    }

    fn pkcs8_bundle() -> String {
        bundle(&key().to_pkcs8_pem(LineEnding::LF).unwrap())
    }

    #[test]
    fn test_from_pem_pkcs8_and_pkcs1() {
        let certificate = ClientCertificate::from_pem(pkcs8_bundle().as_bytes(), "").unwrap();
        assert_eq!(&certificate.key, key());

        let pkcs1 = bundle(&key().to_pkcs1_pem(LineEnding::LF).unwrap());
        let certificate = ClientCertificate::from_pem(pkcs1.as_bytes(), "").unwrap();
        assert_eq!(&certificate.key, key());
        assert_eq!(
            certificate.thumbprint(),
            URL_SAFE_NO_PAD.encode(Sha1::digest(CERTIFICATE))
        );
    }

    #[test]
    fn test_from_pem_rejects_incomplete_bundles() {
        let only_key = key().to_pkcs8_pem(LineEnding::LF).unwrap();
        let err = ClientCertificate::from_pem(only_key.as_bytes(), "")
            .err()
            .unwrap();
        assert!(err.to_string().contains("no CERTIFICATE block"));

        let only_certificate = bundle("");
        let err = ClientCertificate::from_pem(only_certificate.as_bytes(), "")
            .err()
            .unwrap();
        assert!(err.to_string().contains("no private key block"));

        let encrypted = bundle(&pem::encode(&pem::Pem::new(
            "ENCRYPTED PRIVATE KEY",
            vec![0u8; 8],
        )));
        let err = ClientCertificate::from_pem(encrypted.as_bytes(), "")
            .err()
            .unwrap();
        assert!(err.to_string().contains("no password"));
    }

    #[test]
    fn test_assertion_is_verifiable() {
        let certificate = ClientCertificate::from_pem(pkcs8_bundle().as_bytes(), "").unwrap();
        let audience = "https://login.microsoftonline.com/tenant/oauth2/token";
        let assertion = certificate.assertion("client", audience).unwrap();

        let header = jsonwebtoken::decode_header(&assertion).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.x5t, Some(certificate.thumbprint()));

        let public = key().to_public_key().to_pkcs1_pem(LineEnding::LF).unwrap();
        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        validation.set_issuer(&["client"]);
        let data = jsonwebtoken::decode::<serde_json::Value>(
            &assertion,
            &jsonwebtoken::DecodingKey::from_rsa_pem(public.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims["sub"], "client");
        assert_eq!(data.claims["jti"].as_str().unwrap().len(), 32);
    }

    #[test]
    fn test_load_pkcs12() {
        let certificate = ClientCertificate::load(PFX, PFX_PASSWORD).unwrap();
        assert_eq!(certificate.thumbprint(), PFX_THUMBPRINT);

        let audience = "https://login.microsoftonline.com/tenant/oauth2/v2.0/token";
        let assertion = certificate.assertion("client", audience).unwrap();
        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);
        jsonwebtoken::decode::<serde_json::Value>(
            &assertion,
            &jsonwebtoken::DecodingKey::from_rsa_pem(PFX_PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();
    }

    #[test]
    fn test_load_pkcs12_with_wrong_password() {
        for password in ["", "wrong"] {
            let err = ClientCertificate::load(PFX, password).err().unwrap();
            assert!(err.is_config_error());
            assert!(err.to_string().contains("PKCS#12"));
        }
    }

    #[test]
    fn test_load_falls_back_to_pem() {
        let certificate = ClientCertificate::load(pkcs8_bundle().as_bytes(), "").unwrap();
        assert_eq!(&certificate.key, key());
    }

    #[test]
    fn test_validate() {
        let message = ClientCertificateAuth::default()
            .validate()
            .unwrap_err()
            .to_string();
        assert!(message.starts_with("4 errors occurred:"));
        assert!(message.contains(
            "A Client Certificate Path must be configured when authenticating as a Service Principal using a Client Certificate."
        ));
    }

    #[tokio::test]
    async fn test_token_exchange() {
        let http = MockHttpSend::new().with_response(
            "/tenant/oauth2/token",
            200,
            r#"{"access_token":"cert-token","expires_on":"4102444800"}"#,
        );
        let files = MockFileRead::default().with_file("/home/azure/certs/sp.pem", pkcs8_bundle());
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]).with_file_read(files);
        let auth = ClientCertificateAuth {
            client_id: "client".to_string(),
            client_certificate_path: "~/certs/sp.pem".to_string(),
            subscription_id: "sub".to_string(),
            tenant_id: "tenant".to_string(),
            ..Default::default()
        };
        let oauth = OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap();

        let token = auth
            .get_adal_token(&ctx, &oauth, "https://management.azure.com/")
            .await
            .unwrap();
        assert_eq!(token.access_token, "cert-token");

        let body = &http.requests()[0].body;
        assert!(body.contains("client_assertion_type="));
        assert!(body.contains("client_assertion=eyJ"));
    }

    #[tokio::test]
    async fn test_token_exchange_with_pfx() {
        let http = MockHttpSend::new().with_response(
            "/tenant/oauth2/v2.0/token",
            200,
            r#"{"access_token":"pfx-token","expires_in":3599}"#,
        );
        let files = MockFileRead::default().with_file("/certs/sp.pfx", PFX.to_vec());
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]).with_file_read(files);
        let auth = ClientCertificateAuth {
            client_id: "client".to_string(),
            client_certificate_path: "/certs/sp.pfx".to_string(),
            client_certificate_password: PFX_PASSWORD.to_string(),
            subscription_id: "sub".to_string(),
            tenant_id: "tenant".to_string(),
        };
        let oauth = OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap();

        let token = auth
            .get_msal_token(&ctx, &oauth, "https://management.azure.com/")
            .await
            .unwrap();
        assert_eq!(token.access_token, "pfx-token");
        assert!(http.requests()[0].body.contains("client_assertion=eyJ"));
    }

    #[tokio::test]
    async fn test_missing_certificate_file() {
        let ctx = context(MockCommandExecute::new(), MockHttpSend::new(), &[])
            .with_file_read(MockFileRead::default());
        let auth = ClientCertificateAuth {
            client_id: "client".to_string(),
            client_certificate_path: "/missing.pem".to_string(),
            ..Default::default()
        };
        let oauth = OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap();

        let err = auth
            .get_adal_token(&ctx, &oauth, "https://management.azure.com/")
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
