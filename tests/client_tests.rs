// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client auth context against a live token-mode and session-mode server.

use chat_assistant_api::client::auth::{TOKEN_KEY, USER_KEY};
use chat_assistant_api::client::{AuthContext, LocalStorage};
use chat_assistant_api::models::UserResponse;

mod common;

#[tokio::test]
async fn test_mount_without_credentials_is_logged_out() {
    let (app, state) = common::create_token_app();
    let base = common::spawn_server(app).await;

    let mut ctx = AuthContext::new(&base, LocalStorage::in_memory()).unwrap();
    assert!(ctx.state().loading);

    let auth = ctx.mount().await;
    assert!(!auth.loading);
    assert!(auth.user.is_none());
    assert_eq!(state.users.len(), Some(0));
}

#[tokio::test]
async fn test_login_with_id_token_caches_user() {
    let (app, state) = common::create_token_app();
    let token = common::create_test_id_token(&state.config, "client-uid");
    let base = common::spawn_server(app).await;

    let storage = LocalStorage::in_memory();
    let mut ctx = AuthContext::new(&base, storage.clone()).unwrap();
    ctx.mount().await;

    ctx.login_with_id_token(&token).await.unwrap();

    let user = ctx.user().expect("logged in");
    assert_eq!(user.email, "client-uid@example.com");
    assert_eq!(user.display_name, "Test User");
    assert_eq!(storage.get::<UserResponse>(USER_KEY).as_ref(), Some(user));
    assert_eq!(state.users.len(), Some(1));
}

#[tokio::test]
async fn test_stored_token_restores_login_on_mount() {
    let (app, state) = common::create_token_app();
    let token = common::create_test_id_token(&state.config, "returning-uid");
    let base = common::spawn_server(app).await;

    let storage = LocalStorage::in_memory();
    storage.set(TOKEN_KEY, &token).unwrap();

    let mut ctx = AuthContext::new(&base, storage).unwrap();
    let auth = ctx.mount().await;
    assert_eq!(
        auth.user.as_ref().map(|u| u.email.as_str()),
        Some("returning-uid@example.com")
    );
}

#[tokio::test]
async fn test_logout_clears_token_and_user() {
    let (app, state) = common::create_token_app();
    let token = common::create_test_id_token(&state.config, "leaving-uid");
    let base = common::spawn_server(app).await;

    let storage = LocalStorage::in_memory();
    let mut ctx = AuthContext::new(&base, storage.clone()).unwrap();
    ctx.login_with_id_token(&token).await.unwrap();
    assert!(ctx.user().is_some());

    ctx.logout().await;

    assert!(ctx.user().is_none());
    assert!(!storage.contains(TOKEN_KEY));
    assert!(!storage.contains(USER_KEY));

    ctx.check_auth().await;
    assert!(ctx.user().is_none());
}

#[tokio::test]
async fn test_expired_token_leaves_user_unset() {
    let (app, state) = common::create_token_app();
    let mut claims = common::id_token_claims(&state.config, "stale-uid");
    claims.iat -= 7200;
    claims.auth_time -= 7200;
    claims.exp -= 7200;
    let token = common::sign_id_token(&claims, common::TEST_KID);
    let base = common::spawn_server(app).await;

    let mut ctx = AuthContext::new(&base, LocalStorage::in_memory()).unwrap();
    ctx.login_with_id_token(&token).await.unwrap();

    assert!(ctx.user().is_none());
    assert!(!ctx.state().loading);
    assert_eq!(state.users.len(), Some(0));
}

#[tokio::test]
async fn test_session_logout_calls_server() {
    let (app, state) = common::create_session_app(common::spawn_mock_google().await);
    let base = common::spawn_server(app).await;

    let mut ctx = AuthContext::new(&base, LocalStorage::in_memory()).unwrap();
    ctx.mount().await;
    assert!(ctx.user().is_none());

    // Without a session cookie the server still answers the logout redirect.
    ctx.logout().await;
    assert!(ctx.user().is_none());
    assert_eq!(state.sessions.len(), 0);
}
