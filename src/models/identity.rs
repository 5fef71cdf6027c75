// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Verified external identities produced by the identity providers.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Identity provider that vouched for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    /// Google OAuth2 (session flow)
    Google,
    /// Firebase Authentication (token flow)
    Firebase,
}

impl IdentityProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityProvider::Google => "google",
            IdentityProvider::Firebase => "firebase",
        }
    }
}

/// Normalized identity returned by either verifier.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct ExternalIdentity {
    pub provider: IdentityProvider,
    /// OAuth `sub` claim or Firebase UID
    #[validate(length(min = 1, max = 128))]
    pub subject: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: String,
    pub picture: Option<String>,
}
