// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 authorization-code client for the session flow.
//!
//! Handles:
//! - Building the consent URL
//! - Exchanging the authorization code for an access token
//! - Fetching the OpenID Connect userinfo profile

use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{ExternalIdentity, IdentityProvider};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SCOPES: &str = "openid email profile";

/// Google OAuth endpoints; overridable so tests can point at a local server.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize_url: AUTHORIZE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }
}

/// Google OAuth2 client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(config: &Config, endpoints: GoogleEndpoints) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            endpoints,
        })
    }

    /// Consent page URL the browser is redirected to.
    pub fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
            self.endpoints.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code and fetch the user's profile.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExternalIdentity, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Token exchange request failed: {}", e)))?;

        let tokens: TokenResponse = check_response_json(response, "token exchange").await?;

        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Userinfo request failed: {}", e)))?;

        let profile: GoogleProfile = check_response_json(response, "userinfo").await?;

        tracing::debug!(subject = %profile.sub, "Fetched Google profile");

        profile.into_identity()
    }
}

async fn check_response_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Provider(format!(
            "Google {} returned {}: {}",
            what, status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Provider(format!("Invalid Google {} response: {}", what, e)))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub sub: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub email: Option<String>,
    pub picture: Option<String>,
}

impl GoogleProfile {
    fn into_identity(self) -> Result<ExternalIdentity, AppError> {
        let email = self
            .email
            .ok_or_else(|| AppError::Provider("Google profile has no email".to_string()))?;

        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(ExternalIdentity {
            provider: IdentityProvider::Google,
            subject: self.sub,
            display_name,
            first_name: self.given_name,
            last_name: self.family_name,
            email,
            picture: self.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_contains_parameters() {
        let client = GoogleOAuthClient::new(&Config::test_default()).unwrap();
        let url = client.authorize_url("abc123", "http://localhost:5000/api/auth/google/callback");

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test-client-id.apps.googleusercontent.com"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=abc123"));
    }

    #[test]
    fn profile_without_name_falls_back_to_email() {
        let profile = GoogleProfile {
            sub: "1089".to_string(),
            name: None,
            given_name: None,
            family_name: None,
            email: Some("grace@example.com".to_string()),
            picture: None,
        };
        let identity = profile.into_identity().unwrap();
        assert_eq!(identity.display_name, "grace@example.com");
        assert_eq!(identity.provider, IdentityProvider::Google);
    }

    #[test]
    fn profile_without_email_is_provider_error() {
        let profile = GoogleProfile {
            sub: "1089".to_string(),
            name: Some("Grace".to_string()),
            given_name: None,
            family_name: None,
            email: None,
            picture: None,
        };
        assert!(matches!(
            profile.into_identity(),
            Err(AppError::Provider(_))
        ));
    }
}
