// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod identity;
pub mod user;

pub use identity::{ExternalIdentity, IdentityProvider};
pub use user::{User, UserResponse};
