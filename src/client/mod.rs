// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side state for frontends of the API.
//!
//! - [`AuthContext`]: current user and loading flag, backed by the auth API
//! - [`Preferences`]: theme, language and notification settings
//! - [`LocalStorage`]: where both persist between runs

pub mod auth;
pub mod preferences;
pub mod storage;

pub use auth::{AuthContext, AuthState};
pub use preferences::{Language, NotificationKind, Notifications, Preferences, Theme};
pub use storage::LocalStorage;

/// Client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}
