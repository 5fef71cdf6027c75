// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User directory: maps verified external identities to user records.
//!
//! Backed by Firestore in production. An in-memory backend is available for
//! tests and for local development without GCP credentials.
//!
//! The document ID is derived from the external identity, so the store
//! itself guarantees at most one record per identity. Creation uses a
//! create-only write; losing a first-login race surfaces as a conflict and
//! the winner's record is read back.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use validator::Validate;

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::user_key;
use crate::models::{ExternalIdentity, User};
use crate::time_utils::format_utc_rfc3339;

#[derive(Clone)]
enum Backend {
    Firestore(firestore::FirestoreDb),
    Memory(Arc<DashMap<String, User>>),
}

/// User directory client.
#[derive(Clone)]
pub struct UserDirectory {
    backend: Backend,
}

impl UserDirectory {
    /// Connect to Firestore.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn connect(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Connect to the Firestore emulator with unauthenticated access.
    async fn connect_emulator(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            backend: Backend::Firestore(client),
        })
    }

    /// Create a process-local directory.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(DashMap::new())),
        }
    }

    /// Look up a user by directory key (`"{provider}:{external_id}"`).
    pub async fn get(&self, key: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(client) => client
                .fluent()
                .select()
                .by_id_in(collections::USERS)
                .obj()
                .one(key)
                .await
                .map_err(|e| AppError::Storage(e.to_string())),
            Backend::Memory(users) => Ok(users.get(key).map(|u| u.value().clone())),
        }
    }

    /// Return the user for `identity`, creating it on first sight.
    ///
    /// The boolean is `true` when this call created the record.
    pub async fn find_or_create(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<(User, bool), AppError> {
        if identity.subject.trim().is_empty() {
            return Err(AppError::BadRequest(
                "external identity id must not be empty".to_string(),
            ));
        }
        identity
            .validate()
            .map_err(|e| AppError::BadRequest(format!("invalid identity: {e}")))?;

        let key = user_key(identity.provider, &identity.subject);

        if let Some(existing) = self.get(&key).await? {
            return Ok((existing, false));
        }

        let candidate = User::from_identity(identity, format_utc_rfc3339(chrono::Utc::now()));

        match &self.backend {
            Backend::Firestore(client) => {
                let inserted: Result<User, _> = client
                    .fluent()
                    .insert()
                    .into(collections::USERS)
                    .document_id(&key)
                    .object(&candidate)
                    .execute()
                    .await;

                match inserted {
                    Ok(user) => {
                        tracing::info!(user_id = %user.id, key = %key, "Created user");
                        Ok((user, true))
                    }
                    Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                        tracing::debug!(key = %key, "User created concurrently, re-reading");
                        let user = self.get(&key).await?.ok_or_else(|| {
                            AppError::Storage(format!("user {key} vanished after conflict"))
                        })?;
                        Ok((user, false))
                    }
                    Err(e) => Err(AppError::Storage(e.to_string())),
                }
            }
            Backend::Memory(users) => match users.entry(key) {
                Entry::Occupied(entry) => Ok((entry.get().clone(), false)),
                Entry::Vacant(entry) => {
                    tracing::info!(user_id = %candidate.id, key = %entry.key(), "Created user");
                    entry.insert(candidate.clone());
                    Ok((candidate, true))
                }
            },
        }
    }

    /// Number of stored users (in-memory backend only).
    pub fn len(&self) -> Option<usize> {
        match &self.backend {
            Backend::Memory(users) => Some(users.len()),
            Backend::Firestore(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentityProvider;

    fn identity(subject: &str) -> ExternalIdentity {
        ExternalIdentity {
            provider: IdentityProvider::Firebase,
            subject: subject.to_string(),
            display_name: "Ada Lovelace".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            picture: None,
        }
    }

    #[tokio::test]
    async fn find_or_create_is_idempotent() {
        let dir = UserDirectory::in_memory();

        let (first, created) = dir.find_or_create(&identity("uid-1")).await.unwrap();
        assert!(created);
        let (second, created) = dir.find_or_create(&identity("uid-1")).await.unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(dir.len(), Some(1));
    }

    #[tokio::test]
    async fn same_subject_different_provider_is_distinct() {
        let dir = UserDirectory::in_memory();
        let mut google = identity("shared-sub");
        google.provider = IdentityProvider::Google;

        let (a, _) = dir.find_or_create(&identity("shared-sub")).await.unwrap();
        let (b, _) = dir.find_or_create(&google).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(dir.len(), Some(2));
    }

    #[tokio::test]
    async fn empty_subject_rejected() {
        let dir = UserDirectory::in_memory();
        let err = dir.find_or_create(&identity("  ")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(dir.len(), Some(0));
    }

    #[tokio::test]
    async fn invalid_email_rejected() {
        let dir = UserDirectory::in_memory();
        let mut bad = identity("uid-2");
        bad.email = "not-an-email".to_string();
        assert!(matches!(
            dir.find_or_create(&bad).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
