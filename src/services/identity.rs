// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity verification, selected by configuration.
//!
//! Both flows produce an [`ExternalIdentity`]; neither touches the user
//! directory.

use crate::config::{AuthMode, Config};
use crate::error::AppError;
use crate::models::ExternalIdentity;

use super::firebase::FirebaseTokenVerifier;
use super::google_oauth::GoogleOAuthClient;

/// A credential presented by a caller.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    /// OAuth authorization code returned to the callback URL.
    AuthorizationCode {
        code: &'a str,
        redirect_uri: &'a str,
    },
    /// Firebase ID token from an `Authorization: Bearer` header.
    IdToken(&'a str),
}

/// The configured identity provider adapter.
pub enum IdentityVerifier {
    GoogleOAuth(GoogleOAuthClient),
    FirebaseToken(FirebaseTokenVerifier),
}

impl IdentityVerifier {
    /// Build the production verifier for `config.auth_mode`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(match config.auth_mode {
            AuthMode::Session => IdentityVerifier::GoogleOAuth(GoogleOAuthClient::new(config)?),
            AuthMode::Token => IdentityVerifier::FirebaseToken(FirebaseTokenVerifier::new(
                &config.firebase_project_id,
            )?),
        })
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            IdentityVerifier::GoogleOAuth(_) => AuthMode::Session,
            IdentityVerifier::FirebaseToken(_) => AuthMode::Token,
        }
    }

    /// Verify a credential and return the identity it proves.
    pub async fn verify(&self, credential: Credential<'_>) -> Result<ExternalIdentity, AppError> {
        match (self, credential) {
            (
                IdentityVerifier::GoogleOAuth(google),
                Credential::AuthorizationCode { code, redirect_uri },
            ) => google.exchange_code(code, redirect_uri).await,
            (IdentityVerifier::FirebaseToken(firebase), Credential::IdToken(token)) => {
                Ok(firebase.verify(token).await?)
            }
            (IdentityVerifier::GoogleOAuth(_), Credential::IdToken(_)) => Err(
                AppError::BadRequest("ID tokens are not accepted in session mode".to_string()),
            ),
            (IdentityVerifier::FirebaseToken(_), Credential::AuthorizationCode { .. }) => {
                Err(AppError::BadRequest(
                    "Authorization codes are not accepted in token mode".to_string(),
                ))
            }
        }
    }
}
