// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Which variables are required depends on the authentication mode: the
//! session flow needs Google OAuth client credentials and a session secret,
//! the token flow only needs the Firebase project ID.

use std::env;
use std::str::FromStr;

/// Minimum length of the secret used to sign OAuth state parameters.
const MIN_SESSION_SECRET_LEN: usize = 32;

/// How callers prove their identity to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Google OAuth2 code flow, then a server-side session cookie.
    Session,
    /// Firebase ID token sent as a bearer token on every request.
    Token,
}

impl FromStr for AuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" | "passport" => Ok(AuthMode::Session),
            "token" | "firebase" => Ok(AuthMode::Token),
            _ => Err(ConfigError::Invalid("AUTH_MODE", s.to_string())),
        }
    }
}

/// Which user directory backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Firestore,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl FromStr for DatabaseKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(DatabaseKind::Firestore),
            "memory" => Ok(DatabaseKind::Memory),
            _ => Err(ConfigError::Invalid("DATABASE", s.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub auth_mode: AuthMode,
    /// Frontend origin, used for CORS and post-login redirects
    pub client_url: String,
    /// Server port
    pub port: u16,
    /// `true` when running behind HTTPS in production (secure cookies, HSTS)
    pub production: bool,
    pub database: DatabaseKind,
    /// GCP project hosting the Firestore database
    pub gcp_project_id: String,

    // --- Session mode ---
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Absolute URL Google redirects back to after consent
    pub google_callback_url: String,
    /// Key for signing the OAuth `state` parameter (raw bytes)
    pub session_secret: Vec<u8>,

    // --- Token mode ---
    pub firebase_project_id: String,
}

impl Config {
    /// Deterministic configuration for tests (session mode, in-memory store).
    pub fn test_default() -> Self {
        Self {
            auth_mode: AuthMode::Session,
            client_url: "http://localhost:5173".to_string(),
            port: 5000,
            production: false,
            database: DatabaseKind::Memory,
            gcp_project_id: "test-project".to_string(),
            google_client_id: "test-client-id.apps.googleusercontent.com".to_string(),
            google_client_secret: "test_client_secret".to_string(),
            google_callback_url: "http://localhost:5000/api/auth/google/callback".to_string(),
            session_secret: b"test_session_secret_32_bytes_min!!".to_vec(),
            firebase_project_id: "test-firebase-project".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let auth_mode = match env::var("AUTH_MODE") {
            Ok(v) => v.parse()?,
            Err(_) => AuthMode::Session,
        };
        let database = match env::var("DATABASE") {
            Ok(v) => v.parse()?,
            Err(_) => DatabaseKind::Firestore,
        };
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .unwrap_or(5000);
        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let gcp_project_id = match database {
            DatabaseKind::Firestore => required("GCP_PROJECT_ID")?,
            DatabaseKind::Memory => env::var("GCP_PROJECT_ID").unwrap_or_default(),
        };

        let (google_client_id, google_client_secret, session_secret) = match auth_mode {
            AuthMode::Session => {
                let secret = required("SESSION_SECRET")?.into_bytes();
                if secret.len() < MIN_SESSION_SECRET_LEN {
                    return Err(ConfigError::Invalid(
                        "SESSION_SECRET",
                        format!("must be at least {MIN_SESSION_SECRET_LEN} bytes"),
                    ));
                }
                (
                    required("GOOGLE_CLIENT_ID")?,
                    required("GOOGLE_CLIENT_SECRET")?,
                    secret,
                )
            }
            AuthMode::Token => (String::new(), String::new(), Vec::new()),
        };

        let firebase_project_id = match auth_mode {
            AuthMode::Token => required("FIREBASE_PROJECT_ID")?,
            AuthMode::Session => env::var("FIREBASE_PROJECT_ID").unwrap_or_default(),
        };

        Ok(Self {
            auth_mode,
            client_url: env::var("CLIENT_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port,
            production,
            database,
            gcp_project_id,
            google_client_id,
            google_client_secret,
            google_callback_url: env::var("GOOGLE_CALLBACK_URL").unwrap_or_else(|_| {
                format!("http://localhost:{port}/api/auth/google/callback")
            }),
            session_secret,
            firebase_project_id,
        })
    }
}

/// Read a required variable, trimming stray whitespace from secret bindings.
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
