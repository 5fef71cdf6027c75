// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes, mounted under `/api/auth`.

use axum::{
    extract::{Query, State},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::AuthMode;
use crate::error::{AppError, Result};
use crate::middleware::auth::{authenticate, require_auth, Caller};
use crate::models::UserResponse;
use crate::services::oauth_state::{sign_state, verify_state};
use crate::services::{Credential, IdentityVerifier, SESSION_COOKIE};
use crate::AppState;

/// Returned by the redirect endpoints when the token flow is configured.
pub const TOKEN_MODE_LOGIN_MESSAGE: &str =
    "Google sign-in is handled by the Firebase client SDK; this endpoint is not used";

pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/google", get(auth_start))
        .route("/google/callback", get(auth_callback))
        .route("/check", get(check))
        .route(
            "/user",
            get(current_user).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_auth,
            )),
        );

    // The token flow has nothing to tear down server-side.
    match state.identity.mode() {
        AuthMode::Session => router.route("/logout", get(logout)),
        AuthMode::Token => router,
    }
}

/// `{success: true, user}` body.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CheckResponse {
    pub authenticated: bool,
}

/// Query parameters for starting the OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Frontend path to land on after login.
    #[serde(default)]
    return_to: Option<String>,
}

/// Start OAuth flow - redirect to Google consent.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuthStartParams>,
) -> Result<Redirect> {
    let IdentityVerifier::GoogleOAuth(google) = &state.identity else {
        return Err(AppError::BadRequest(TOKEN_MODE_LOGIN_MESSAGE.to_string()));
    };

    let return_to = sanitize_return_path(params.return_to.as_deref());
    let oauth_state = sign_state(&return_to, &state.config.session_secret)?;
    let auth_url = google.authorize_url(&oauth_state, &state.config.google_callback_url);

    tracing::info!(return_to = %return_to, "Starting OAuth flow, redirecting to Google");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, find-or-create user, start session.
///
/// Every failure lands the browser on the frontend login page.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if state.identity.mode() != AuthMode::Session {
        return Err(AppError::BadRequest(TOKEN_MODE_LOGIN_MESSAGE.to_string()));
    }

    let login_failed = |code: &str| login_failed_redirect(&state.config.client_url, code);

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Ok(login_failed(&error));
    }

    let Some(return_to) = params
        .state
        .as_deref()
        .and_then(|s| verify_state(s, &state.config.session_secret))
    else {
        tracing::warn!("Invalid, expired or missing OAuth state parameter");
        return Ok(login_failed("invalid_state"));
    };

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return Ok(login_failed("missing_code"));
    };

    tracing::info!("Exchanging authorization code");

    let credential = Credential::AuthorizationCode {
        code: &code,
        redirect_uri: &state.config.google_callback_url,
    };
    let identity = match state.identity.verify(credential).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "Authorization code exchange failed");
            return Ok(login_failed(e.code()));
        }
    };

    let user = match state.users.find_or_create(&identity).await {
        Ok((user, created)) => {
            tracing::info!(user_id = %user.id, created, "OAuth login successful");
            user
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store user after OAuth login");
            return Ok(login_failed(e.code()));
        }
    };

    let session_id = match state.sessions.create(&user.key()) {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create session after OAuth login");
            return Ok(login_failed(AppError::Internal(e).code()));
        }
    };
    let jar = jar.add(session_cookie(&state, session_id));

    let mut success_url = format!("{}/auth/success", state.config.client_url);
    if return_to != "/" {
        success_url.push_str(&format!("?next={}", urlencoding::encode(&return_to)));
    }

    Ok((jar, Redirect::temporary(&success_url)).into_response())
}

/// Current user.
///
/// In token mode the record is created on first sight, so this GET has a
/// side effect; clients rely on it as their registration step.
async fn current_user(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<UserEnvelope>> {
    let user = match caller {
        Caller::Session { user } => user,
        Caller::Token { identity } => {
            let (user, created) = state.users.find_or_create(&identity).await?;
            if created {
                tracing::info!(user_id = %user.id, "Registered user on first authenticated request");
            }
            user
        }
    };

    Ok(Json(UserEnvelope {
        success: true,
        user: user.into(),
    }))
}

/// Authentication status. Never creates a record.
async fn check(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> Json<CheckResponse> {
    let authenticated = match authenticate(&state, &jar, &headers).await {
        Ok(_) => true,
        Err(AppError::Unauthorized | AppError::InvalidToken) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Authentication check failed");
            false
        }
    };

    Json(CheckResponse { authenticated })
}

/// Logout - destroy the server-side session and clear the cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.sessions.destroy(cookie.value()) {
            tracing::info!("Session destroyed");
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    let redirect = Redirect::temporary(&format!("{}/login", state.config.client_url));
    (jar, redirect)
}

/// Send the browser back to the frontend login page with an error code.
fn login_failed_redirect(client_url: &str, code: &str) -> Response {
    Redirect::temporary(&format!(
        "{}/login?error={}",
        client_url,
        urlencoding::encode(code)
    ))
    .into_response()
}

fn session_cookie(state: &AppState, session_id: String) -> Cookie<'static> {
    // Cross-site frontends need SameSite=None, which browsers only accept with Secure.
    let same_site = if state.config.production {
        SameSite::None
    } else {
        SameSite::Lax
    };

    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(state.config.production)
        .same_site(same_site)
        .max_age(time::Duration::seconds(state.sessions.ttl().as_secs() as i64))
        .build()
}

/// Only same-origin relative paths are allowed as post-login destinations.
fn sanitize_return_path(path: Option<&str>) -> String {
    match path {
        Some(p) if p.starts_with('/') && !p.starts_with("//") && !p.contains('|') => {
            p.to_string()
        }
        _ => "/".to_string(),
    }
}
