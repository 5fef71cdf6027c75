// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).

pub mod directory;

pub use directory::UserDirectory;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}
