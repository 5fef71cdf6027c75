// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - identity and session logic.

pub mod firebase;
pub mod google_oauth;
pub mod identity;
pub mod oauth_state;
pub mod session;

pub use firebase::{FirebaseTokenVerifier, TokenError};
pub use google_oauth::{GoogleEndpoints, GoogleOAuthClient};
pub use identity::{Credential, IdentityVerifier};
pub use session::{SessionStore, SESSION_COOKIE};
