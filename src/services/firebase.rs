// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification for the bearer-token flow.
//!
//! Firebase ID tokens are RS256 JWTs signed by Google's `securetoken`
//! service account. Public keys are published as a JWKS document and cached
//! according to the response's `Cache-Control: max-age`.

use anyhow::Context;
use axum::http::HeaderValue;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::error::AppError;
use crate::models::{ExternalIdentity, IdentityProvider};
use crate::time_utils::now_unix_secs;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
const MAX_UID_LEN: usize = 128;

/// Token verification error categories.
#[derive(Debug, Clone)]
pub enum TokenError {
    /// The token is missing/invalid or its claims do not match expectations.
    Unauthorized(String),
    /// Keys could not be fetched.
    Transient(String),
    /// The token is genuine but the account has no email address
    /// (phone or anonymous sign-in); user records require one.
    MissingEmail,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Unauthorized(reason) => {
                tracing::debug!(reason = %reason, "Rejected ID token");
                AppError::InvalidToken
            }
            TokenError::Transient(reason) => AppError::Provider(reason),
            TokenError::MissingEmail => {
                tracing::info!("Verified ID token has no email claim");
                AppError::BadRequest("Signed-in account has no email address".to_string())
            }
        }
    }
}

#[derive(Clone)]
enum KeySource {
    Jwks { url: String },
    StaticKey {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase-issued ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    expected_issuer: String,
    source: KeySource,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    /// Create a production verifier using Google's published keys.
    pub fn new(project_id: &str) -> anyhow::Result<Self> {
        Self::with_jwks_url(project_id, JWKS_URL)
    }

    /// Create a verifier that fetches keys from a custom JWKS URL.
    pub fn with_jwks_url(project_id: &str, url: impl Into<String>) -> anyhow::Result<Self> {
        let verifier = Self::build(project_id, KeySource::Jwks { url: url.into() })?;
        tracing::info!(
            project = %verifier.project_id,
            issuer = %verifier.expected_issuer,
            "Initialized Firebase ID token verifier"
        );
        Ok(verifier)
    }

    /// Create a verifier with a static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        project_id: &str,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key kid must not be empty");
        }
        Self::build(
            project_id,
            KeySource::StaticKey {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(project_id: &str, source: KeySource) -> anyhow::Result<Self> {
        if project_id.trim().is_empty() {
            anyhow::bail!("Firebase project ID must not be empty");
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building Firebase key HTTP client")?;

        Ok(Self {
            http_client,
            project_id: project_id.to_string(),
            expected_issuer: format!("{ISSUER_PREFIX}{project_id}"),
            source,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Verify a raw ID token and return the identity it asserts.
    pub async fn verify(&self, token: &str) -> Result<ExternalIdentity, TokenError> {
        let header = decode_header(token)
            .map_err(|e| TokenError::Unauthorized(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(TokenError::Unauthorized(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| TokenError::Unauthorized("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.expected_issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| TokenError::Unauthorized(format!("JWT validation failed: {e}")))?
            .claims;

        validate_times(claims.iat, claims.auth_time)?;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(TokenError::Unauthorized(
                "sub claim must be 1-128 characters".to_string(),
            ));
        }

        let email = claims.email.ok_or(TokenError::MissingEmail)?;

        let display_name = claims
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        tracing::debug!(uid = %claims.sub, "Verified Firebase ID token");

        Ok(ExternalIdentity {
            provider: IdentityProvider::Firebase,
            subject: claims.sub,
            display_name,
            first_name: None,
            last_name: None,
            email,
            picture: claims.picture,
        })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, TokenError> {
        let url = match &self.source {
            KeySource::StaticKey {
                kid: static_kid,
                decoding_key,
            } => {
                if kid == static_kid {
                    return Ok(decoding_key.clone());
                }
                return Err(TokenError::Unauthorized(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )));
            }
            KeySource::Jwks { url } => url,
        };

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; an unknown kid forces one refresh past the TTL.
        for force_refresh in [false, true] {
            self.refresh_jwks(url, force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(TokenError::Unauthorized(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, url: &str, force_refresh: bool) -> Result<(), TokenError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = %url, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TokenError::Transient(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TokenError::Transient(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = cache_ttl_from_headers(response.headers(), DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| TokenError::Transient(format!("invalid JWKS JSON: {e}")))?;

        let mut keys_by_kid: HashMap<String, Arc<DecodingKey>> = HashMap::new();

        for jwk in jwks.keys {
            if jwk.kty != "RSA" || jwk.kid.trim().is_empty() {
                continue;
            }
            if jwk.alg.as_deref().is_some_and(|alg| alg != "RS256") {
                continue;
            }
            if jwk.use_.as_deref().is_some_and(|u| u != "sig") {
                continue;
            }

            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys_by_kid.insert(jwk.kid, Arc::new(key));
                }
                Err(e) => {
                    tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                }
            }
        }

        if keys_by_kid.is_empty() {
            return Err(TokenError::Transient(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    n: String,
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(auth_header: Option<&HeaderValue>) -> Result<&str, TokenError> {
    let value = auth_header
        .ok_or_else(|| TokenError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| TokenError::Unauthorized("invalid Authorization header".to_string()))?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        TokenError::Unauthorized("Authorization header must be Bearer token".to_string())
    })?;

    if token.is_empty() {
        return Err(TokenError::Unauthorized("Bearer token is empty".to_string()));
    }

    Ok(token)
}

fn validate_times(iat: Option<u64>, auth_time: Option<u64>) -> Result<(), TokenError> {
    let now = now_unix_secs();

    let Some(iat) = iat else {
        return Err(TokenError::Unauthorized("missing iat claim".to_string()));
    };
    if iat > now + CLOCK_SKEW_SECS {
        return Err(TokenError::Unauthorized(
            "iat claim is in the future".to_string(),
        ));
    }

    let Some(auth_time) = auth_time else {
        return Err(TokenError::Unauthorized(
            "missing auth_time claim".to_string(),
        ));
    };
    if auth_time > now + CLOCK_SKEW_SECS {
        return Err(TokenError::Unauthorized(
            "auth_time claim is in the future".to_string(),
        ));
    }

    Ok(())
}

fn cache_ttl_from_headers(headers: &reqwest::header::HeaderMap, fallback: Duration) -> Duration {
    headers
        .get(CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_cache_control_max_age)
        .map(Duration::from_secs)
        .unwrap_or(fallback)
}

fn parse_cache_control_max_age(value: &str) -> Option<u64> {
    value
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cache_control_max_age_valid() {
        assert_eq!(
            parse_cache_control_max_age("public, max-age=19302, must-revalidate"),
            Some(19302)
        );
        assert_eq!(parse_cache_control_max_age("max-age=60"), Some(60));
        assert_eq!(parse_cache_control_max_age("max-age=\"120\""), Some(120));
    }

    #[test]
    fn parse_cache_control_max_age_invalid() {
        assert_eq!(parse_cache_control_max_age("public, immutable"), None);
        assert_eq!(parse_cache_control_max_age("max-age=abc"), None);
        assert_eq!(parse_cache_control_max_age(""), None);
    }

    #[test]
    fn extract_bearer_token_errors() {
        assert!(matches!(
            extract_bearer_token(None),
            Err(TokenError::Unauthorized(_))
        ));

        let bad = HeaderValue::from_static("Basic abc");
        assert!(matches!(
            extract_bearer_token(Some(&bad)),
            Err(TokenError::Unauthorized(_))
        ));

        let empty = HeaderValue::from_static("Bearer ");
        assert!(matches!(
            extract_bearer_token(Some(&empty)),
            Err(TokenError::Unauthorized(_))
        ));

        let ok = HeaderValue::from_static("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(Some(&ok)).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn future_auth_time_rejected() {
        let now = now_unix_secs();
        assert!(validate_times(Some(now), Some(now)).is_ok());
        assert!(validate_times(Some(now), Some(now + 3600)).is_err());
        assert!(validate_times(Some(now + 3600), Some(now)).is_err());
        assert!(validate_times(None, Some(now)).is_err());
        assert!(validate_times(Some(now), None).is_err());
    }

    #[test]
    fn empty_project_rejected() {
        assert!(FirebaseTokenVerifier::new("").is_err());
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let verifier = FirebaseTokenVerifier::new("assistant-dev").unwrap();
        assert!(matches!(
            verifier.verify("not-a-jwt").await,
            Err(TokenError::Unauthorized(_))
        ));
    }
}
