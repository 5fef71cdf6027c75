// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    extract::Form,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chat_assistant_api::config::{AuthMode, Config};
use chat_assistant_api::db::UserDirectory;
use chat_assistant_api::routes::create_router;
use chat_assistant_api::services::{
    FirebaseTokenVerifier, GoogleEndpoints, GoogleOAuthClient, IdentityVerifier, SessionStore,
};
use chat_assistant_api::AppState;
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_KID: &str = "test-kid";
pub const GOOD_CODE: &str = "4/good-code";
pub const MOCK_ACCESS_TOKEN: &str = "ya29.mock-access-token";

const PRIVATE_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_private.pem");
const PUBLIC_KEY_PEM: &[u8] = include_bytes!("../fixtures/test_rsa_public.pem");
const PUBLIC_JWK: &str = include_str!("../fixtures/test_rsa_public_jwk.json");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_directory() -> UserDirectory {
    UserDirectory::connect("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Build app state for a config and verifier with an in-memory directory.
#[allow(dead_code)]
pub fn build_app(config: Config, identity: IdentityVerifier) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config,
        users: UserDirectory::in_memory(),
        identity,
        sessions: SessionStore::default(),
    });
    (create_router(state.clone()), state)
}

/// Token-mode app verifying ID tokens against the fixture key.
#[allow(dead_code)]
pub fn create_token_app() -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.auth_mode = AuthMode::Token;

    let key = DecodingKey::from_rsa_pem(PUBLIC_KEY_PEM).expect("fixture public key");
    let verifier =
        FirebaseTokenVerifier::new_with_static_key(&config.firebase_project_id, TEST_KID, key)
            .unwrap();

    build_app(config, IdentityVerifier::FirebaseToken(verifier))
}

/// Token-mode app that fetches signing keys from `jwks_url`.
#[allow(dead_code)]
pub fn create_jwks_token_app(jwks_url: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.auth_mode = AuthMode::Token;

    let verifier =
        FirebaseTokenVerifier::with_jwks_url(&config.firebase_project_id, jwks_url).unwrap();

    build_app(config, IdentityVerifier::FirebaseToken(verifier))
}

/// Session-mode app talking to the given (mock) Google endpoints.
#[allow(dead_code)]
pub fn create_session_app(endpoints: GoogleEndpoints) -> (Router, Arc<AppState>) {
    create_session_app_with_config(Config::test_default(), endpoints)
}

#[allow(dead_code)]
pub fn create_session_app_with_config(
    config: Config,
    endpoints: GoogleEndpoints,
) -> (Router, Arc<AppState>) {
    let google = GoogleOAuthClient::with_endpoints(&config, endpoints).unwrap();
    build_app(config, IdentityVerifier::GoogleOAuth(google))
}

/// Firebase-style ID token claims.
#[derive(Debug, Clone, Serialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub user_id: String,
    pub iat: u64,
    pub exp: u64,
    pub auth_time: u64,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Valid claims for `uid` under the test config's Firebase project.
#[allow(dead_code)]
pub fn id_token_claims(config: &Config, uid: &str) -> IdTokenClaims {
    let now = now_secs();
    IdTokenClaims {
        iss: format!(
            "https://securetoken.google.com/{}",
            config.firebase_project_id
        ),
        aud: config.firebase_project_id.clone(),
        sub: uid.to_string(),
        user_id: uid.to_string(),
        iat: now,
        exp: now + 3600,
        auth_time: now,
        email: Some(format!("{uid}@example.com")),
        name: Some("Test User".to_string()),
        picture: Some("https://example.com/avatar.png".to_string()),
    }
}

/// Sign claims with the fixture private key.
#[allow(dead_code)]
pub fn sign_id_token(claims: &IdTokenClaims, kid: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(PRIVATE_KEY_PEM).expect("fixture private key");
    encode(&header, claims, &key).expect("Failed to sign ID token")
}

/// A valid ID token for `uid`.
#[allow(dead_code)]
pub fn create_test_id_token(config: &Config, uid: &str) -> String {
    sign_id_token(&id_token_claims(config, uid), TEST_KID)
}

/// Serve `app` on an ephemeral localhost port; returns `http://127.0.0.1:port`.
#[allow(dead_code)]
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[derive(Deserialize)]
struct TokenForm {
    code: String,
    grant_type: String,
}

async fn mock_token(Form(form): Form<TokenForm>) -> impl IntoResponse {
    if form.code != GOOD_CODE || form.grant_type != "authorization_code" {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "invalid_grant" })),
        );
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "access_token": MOCK_ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3599
        })),
    )
}

async fn mock_userinfo(headers: HeaderMap) -> impl IntoResponse {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        == Some(format!("Bearer {MOCK_ACCESS_TOKEN}").as_str());
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(serde_json::json!({})));
    }
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "sub": "110248495921238986420",
            "name": "Ada Lovelace",
            "given_name": "Ada",
            "family_name": "Lovelace",
            "email": "ada@example.com",
            "picture": "https://lh3.googleusercontent.com/a/ada"
        })),
    )
}

/// Start a mock Google OAuth provider; returns endpoints pointing at it.
#[allow(dead_code)]
pub async fn spawn_mock_google() -> GoogleEndpoints {
    let app = Router::new()
        .route("/token", post(mock_token))
        .route("/userinfo", get(mock_userinfo));
    let base = spawn_server(app).await;

    GoogleEndpoints {
        authorize_url: format!("{base}/authorize"),
        token_url: format!("{base}/token"),
        userinfo_url: format!("{base}/userinfo"),
    }
}

/// The fixture public key as a JWKS entry under `kid`.
fn fixture_jwk(kid: &str) -> serde_json::Value {
    let mut jwk: serde_json::Value = serde_json::from_str(PUBLIC_JWK).unwrap();
    jwk["kid"] = serde_json::Value::String(kid.to_string());
    jwk
}

/// Serve a JWKS document that publishes the fixture key as `first_kid` on the
/// first fetch and as `later_kid` afterwards (a key rotation).
///
/// Returns the JWKS URL and a counter of fetches.
#[allow(dead_code)]
pub async fn spawn_mock_jwks(first_kid: &str, later_kid: &str) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let first = fixture_jwk(first_kid);
    let later = fixture_jwk(later_kid);

    let counter = hits.clone();
    let app = Router::new().route(
        "/jwks",
        get(move || {
            let key = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                first.clone()
            } else {
                later.clone()
            };
            async move {
                (
                    [(header::CACHE_CONTROL, "public, max-age=300")],
                    Json(serde_json::json!({ "keys": [key] })),
                )
            }
        }),
    );
    let base = spawn_server(app).await;

    (format!("{base}/jwks"), hits)
}

/// Serve a JWKS document containing no usable RSA signing keys.
#[allow(dead_code)]
pub async fn spawn_unusable_jwks() -> String {
    let app = Router::new().route(
        "/jwks",
        get(|| async {
            Json(serde_json::json!({
                "keys": [{ "kid": "ec-key", "kty": "EC", "n": "", "e": "" }]
            }))
        }),
    );
    format!("{}/jwks", spawn_server(app).await)
}

/// Extract query parameters from a redirect Location header.
#[allow(dead_code)]
pub fn location_query(location: &str) -> HashMap<String, String> {
    let query = location.split_once('?').map(|(_, q)| q).unwrap_or("");
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            (
                k.to_string(),
                urlencoding::decode(v).unwrap().into_owned(),
            )
        })
        .collect()
}
