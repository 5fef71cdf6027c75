// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use super::identity::{ExternalIdentity, IdentityProvider};

/// User profile stored in Firestore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal id (UUID v4), stable for the life of the record
    pub id: String,
    /// Which adapter verified this user
    pub provider: IdentityProvider,
    /// Google OAuth subject or Firebase UID
    pub external_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    /// Avatar image URL
    pub image: Option<String>,
    /// When the record was created (RFC3339)
    pub created_at: String,
}

impl User {
    /// Build a brand-new record for a verified identity.
    pub fn from_identity(identity: &ExternalIdentity, created_at: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider: identity.provider,
            external_id: identity.subject.clone(),
            display_name: identity.display_name.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            email: identity.email.clone(),
            image: identity.picture.clone(),
            created_at,
        }
    }

    /// Directory key (also the Firestore document ID).
    pub fn key(&self) -> String {
        user_key(self.provider, &self.external_id)
    }
}

/// Directory key for an external identity: `"{provider}:{external_id}"`.
pub fn user_key(provider: IdentityProvider, external_id: &str) -> String {
    format!("{}:{}", provider.as_str(), external_id)
}

/// User as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            display_name: user.display_name,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            image: user.image,
            created_at: user.created_at,
        }
    }
}
