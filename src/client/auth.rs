// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Frontend auth state: who is logged in, and whether we know yet.
//!
//! Failures never surface to the caller as errors: they are logged and leave
//! the context in its logged-out state, matching what the UI renders.

use std::time::Duration;

use serde::Deserialize;

use super::{ClientError, LocalStorage};
use crate::models::UserResponse;

/// Storage key for the cached user.
pub const USER_KEY: &str = "user";
/// Storage key for the bearer ID token (token mode).
pub const TOKEN_KEY: &str = "token";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Snapshot of the auth state.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user: Option<UserResponse>,
    /// `true` until the first `check_auth` completes
    pub loading: bool,
}

#[derive(Deserialize)]
struct CheckBody {
    authenticated: bool,
}

#[derive(Deserialize)]
struct UserBody {
    success: bool,
    user: Option<UserResponse>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the `/api/auth` endpoints holding the current user.
pub struct AuthContext {
    http: reqwest::Client,
    /// e.g. `http://localhost:5000/api/auth`
    auth_base: String,
    storage: LocalStorage,
    state: AuthState,
}

impl AuthContext {
    /// `api_url` is the server origin, e.g. `http://localhost:5000`.
    pub fn new(api_url: &str, storage: LocalStorage) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            // Login/logout redirects target the browser, not us.
            .redirect(reqwest::redirect::Policy::none())
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            auth_base: format!("{}/api/auth", api_url.trim_end_matches('/')),
            storage,
            state: AuthState {
                user: None,
                loading: true,
            },
        })
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserResponse> {
        self.state.user.as_ref()
    }

    /// Initial check, run once when the context is created.
    pub async fn mount(&mut self) -> &AuthState {
        self.check_auth().await;
        &self.state
    }

    /// Ask the API who we are and update the cached user.
    pub async fn check_auth(&mut self) {
        match self.fetch_user().await {
            Ok(Some(user)) => {
                if let Err(e) = self.storage.set(USER_KEY, &user) {
                    tracing::warn!(error = %e, "Failed to cache user");
                }
                self.state.user = Some(user);
            }
            Ok(None) => {
                if let Err(e) = self.storage.remove(USER_KEY) {
                    tracing::warn!(error = %e, "Failed to clear cached user");
                }
                self.state.user = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Authentication check failed");
            }
        }
        self.state.loading = false;
    }

    /// URL the browser should open to start the Google session flow.
    pub fn login_url(&self) -> String {
        format!("{}/google", self.auth_base)
    }

    /// Token flow: remember the Firebase ID token, then refresh the user.
    pub async fn login_with_id_token(&mut self, id_token: &str) -> Result<(), ClientError> {
        self.storage.set(TOKEN_KEY, id_token)?;
        self.check_auth().await;
        Ok(())
    }

    /// Log out locally and, for cookie sessions, on the server.
    pub async fn logout(&mut self) {
        if !self.storage.contains(TOKEN_KEY) {
            let result = self.http.get(format!("{}/logout", self.auth_base)).send().await;
            match result {
                Ok(resp) if resp.status().is_success() || resp.status().is_redirection() => {}
                Ok(resp) => tracing::warn!(status = %resp.status(), "Logout request rejected"),
                Err(e) => tracing::error!(error = %e, "Logout request failed"),
            }
        }

        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!(key, error = %e, "Failed to clear stored auth value");
            }
        }
        self.state.user = None;
    }

    async fn fetch_user(&self) -> Result<Option<UserResponse>, ClientError> {
        let check: CheckBody = self.get_json("check").await?;
        if !check.authenticated {
            return Ok(None);
        }

        let body: UserBody = self.get_json("user").await?;
        Ok(if body.success { body.user } else { None })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        let mut request = self.http.get(format!("{}/{}", self.auth_base, path));
        if let Some(token) = self.storage.get::<String>(TOKEN_KEY) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}
