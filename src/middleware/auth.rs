// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication boundary: session cookie or bearer ID token.

use crate::error::AppError;
use crate::models::{ExternalIdentity, User};
use crate::services::firebase::{extract_bearer_token, TokenError};
use crate::services::{Credential, IdentityVerifier, SESSION_COOKIE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub enum Caller {
    /// Logged in through the OAuth flow; the user record already exists.
    Session { user: User },
    /// Presented a valid ID token; the user record may not exist yet.
    Token { identity: ExternalIdentity },
}

/// Resolve the caller from the request, according to the configured mode.
pub async fn authenticate(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<Caller, AppError> {
    match &state.identity {
        IdentityVerifier::GoogleOAuth(_) => {
            let session_id = jar
                .get(SESSION_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(AppError::Unauthorized)?;

            let session = state
                .sessions
                .get(&session_id)
                .ok_or(AppError::Unauthorized)?;

            let user = state.users.get(&session.user_key).await?.ok_or_else(|| {
                tracing::warn!(key = %session.user_key, "Session refers to unknown user");
                AppError::Unauthorized
            })?;

            Ok(Caller::Session { user })
        }
        IdentityVerifier::FirebaseToken(_) => {
            let token = match extract_bearer_token(headers.get(header::AUTHORIZATION)) {
                Ok(token) => token,
                Err(TokenError::Unauthorized(reason)) => {
                    tracing::debug!(reason = %reason, "No usable bearer token");
                    return Err(AppError::Unauthorized);
                }
                Err(e) => return Err(e.into()),
            };

            let identity = state.identity.verify(Credential::IdToken(token)).await?;
            Ok(Caller::Token { identity })
        }
    }
}

/// Middleware that requires an authenticated caller.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = authenticate(&state, &jar, request.headers()).await?;
    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
