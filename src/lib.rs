// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Chat assistant API: Google sign-in and user profiles.
//!
//! This crate provides the backend API that authenticates users with Google
//! (either an OAuth session or a Firebase ID token), keeps one profile
//! record per identity, and a small client library mirroring the frontend's
//! auth and preference state.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserDirectory;
use services::{IdentityVerifier, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: UserDirectory,
    pub identity: IdentityVerifier,
    pub sessions: SessionStore,
}
