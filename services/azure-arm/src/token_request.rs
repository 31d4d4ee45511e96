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

//! OAuth2 client credentials grant against Azure AD.

use crate::constants::CLIENT_ASSERTION_TYPE;
use crate::oauth::{OAuthConfig, TokenVersion};
use crate::token::{Token, TokenResponse};
use azauth_core::{Context, Error, Result};
use bytes::Bytes;
use http::header::{ACCEPT, CONTENT_TYPE};
use log::debug;

/// How the client proves its identity.
#[derive(Clone, Copy)]
pub(crate) enum ClientAuth<'a> {
    Secret(&'a str),
    /// A signed JWT, either self-signed with a certificate or federated.
    Assertion(&'a str),
}

/// `<resource>/.default`, the v2 scope covering every permission granted on `resource`.
pub(crate) fn default_scope(resource: &str) -> String {
    format!("{}/.default", resource.trim_end_matches('/'))
}

/// Request a token for `resource` on behalf of `client_id`.
pub(crate) async fn request_token(
    ctx: &Context,
    oauth: &OAuthConfig,
    version: TokenVersion,
    client_id: &str,
    auth: ClientAuth<'_>,
    resource: &str,
) -> Result<Token> {
    let url = oauth.token_endpoint_for(version);

    let body = {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "client_credentials")
            .append_pair("client_id", client_id);
        match version {
            TokenVersion::V1 => form.append_pair("resource", resource),
            TokenVersion::V2 => form.append_pair("scope", &default_scope(resource)),
        };
        match auth {
            ClientAuth::Secret(secret) => form.append_pair("client_secret", secret),
            ClientAuth::Assertion(assertion) => form
                .append_pair("client_assertion_type", CLIENT_ASSERTION_TYPE)
                .append_pair("client_assertion", assertion),
        };
        form.finish()
    };

    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(&url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(Bytes::from(body))?;

    debug!("requesting token for {resource} from {url}");
    let resp = ctx.http_send(req).await.map_err(|e| {
        Error::token_exchange(format!("sending token request to {url}")).with_source(e)
    })?;

    if !resp.status().is_success() {
        return Err(Error::token_exchange(format!(
            "token request to {url} failed with status {}: {}",
            resp.status(),
            String::from_utf8_lossy(resp.body())
        )));
    }

    TokenResponse::parse(resp.body())?.into_token(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, MockCommandExecute, MockHttpSend};
    use azauth_core::ErrorKind;

    fn oauth() -> OAuthConfig {
        OAuthConfig::new("https://login.microsoftonline.com/", "tenant").unwrap()
    }

    #[test]
    fn test_default_scope() {
        assert_eq!(
            default_scope("https://management.azure.com/"),
            "https://management.azure.com/.default"
        );
        assert_eq!(
            default_scope("https://vault.azure.net"),
            "https://vault.azure.net/.default"
        );
    }

    #[tokio::test]
    async fn test_v1_secret_request() {
        let http = MockHttpSend::new().with_response(
            "/tenant/oauth2/token?api-version=1.0",
            200,
            r#"{"access_token":"v1-token","expires_on":"4102444800"}"#,
        );
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);

        let token = request_token(
            &ctx,
            &oauth(),
            TokenVersion::V1,
            "client",
            ClientAuth::Secret("s3cret"),
            "https://management.azure.com/",
        )
        .await
        .unwrap();
        assert_eq!(token.access_token, "v1-token");

        let requests = http.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, http::Method::POST);
        assert_eq!(
            requests[0].body,
            "grant_type=client_credentials&client_id=client\
             &resource=https%3A%2F%2Fmanagement.azure.com%2F&client_secret=s3cret"
        );
    }

    #[tokio::test]
    async fn test_v2_assertion_request() {
        let http = MockHttpSend::new().with_response(
            "/tenant/oauth2/v2.0/token",
            200,
            r#"{"access_token":"v2-token","expires_in":3599}"#,
        );
        let ctx = context(MockCommandExecute::new(), http.clone(), &[]);

        request_token(
            &ctx,
            &oauth(),
            TokenVersion::V2,
            "client",
            ClientAuth::Assertion("header.payload.sig"),
            "https://graph.microsoft.com/",
        )
        .await
        .unwrap();

        let body = &http.requests()[0].body;
        assert!(body.contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"));
        assert!(body.contains(
            "client_assertion_type=urn%3Aietf%3Aparams%3Aoauth%3Aclient-assertion-type%3Ajwt-bearer"
        ));
        assert!(body.contains("client_assertion=header.payload.sig"));
        assert!(!body.contains("client_secret"));
    }

    #[tokio::test]
    async fn test_rejected_request() {
        let http = MockHttpSend::new().with_response(
            "/oauth2/token",
            401,
            r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided."}"#,
        );
        let ctx = context(MockCommandExecute::new(), http, &[]);

        let err = request_token(
            &ctx,
            &oauth(),
            TokenVersion::V1,
            "client",
            ClientAuth::Secret("wrong"),
            "https://management.azure.com/",
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TokenExchange);
        assert!(err.to_string().contains("AADSTS7000215"));
    }
}
