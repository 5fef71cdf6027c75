// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side login sessions for the OAuth session flow.
//!
//! The browser only holds an opaque random session ID in an HttpOnly cookie;
//! the mapping to a user lives here, so logout takes effect immediately.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};

use crate::time_utils::now_unix_secs;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "assistant_session";

/// Sessions expire 24 hours after login.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A live login session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Directory key of the logged-in user
    pub user_key: String,
    pub created_at: u64,
    pub expires_at: u64,
}

/// In-process session store shared by all request handlers.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
    rng: SystemRandom,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            rng: SystemRandom::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session for `user_key` and return its ID.
    pub fn create(&self, user_key: &str) -> anyhow::Result<String> {
        let mut bytes = [0u8; 32];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| anyhow::anyhow!("system RNG failure"))?;
        let id = hex::encode(bytes);

        let now = now_unix_secs();
        self.sessions.insert(
            id.clone(),
            Session {
                user_key: user_key.to_string(),
                created_at: now,
                expires_at: now + self.ttl.as_secs(),
            },
        );

        // Opportunistic sweep so abandoned sessions don't accumulate.
        if self.sessions.len() % 100 == 0 {
            self.purge_expired();
        }

        Ok(id)
    }

    /// Look up a live session. Expired sessions are evicted and reported absent.
    pub fn get(&self, id: &str) -> Option<Session> {
        let session = self.sessions.get(id)?.value().clone();
        if session.expires_at <= now_unix_secs() {
            self.sessions.remove(id);
            tracing::debug!("Evicted expired session");
            return None;
        }
        Some(session)
    }

    /// End a session. Returns `true` if it existed.
    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Drop every expired session; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = now_unix_secs();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
