// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed OAuth `state` parameter.
//!
//! Format before base64url: `"return_to|timestamp_hex|signature_hex"` where
//! the signature is HMAC-SHA256 over `"return_to|timestamp_hex"`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// A login must complete within this window.
pub const STATE_MAX_AGE: Duration = Duration::from_secs(10 * 60);

/// Sign `return_to` (a frontend path) into an opaque state string.
pub fn sign_state(return_to: &str, secret: &[u8]) -> anyhow::Result<String> {
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
    sign_state_at(return_to, timestamp, secret)
}

fn sign_state_at(return_to: &str, timestamp_ms: u128, secret: &[u8]) -> anyhow::Result<String> {
    if return_to.contains('|') {
        anyhow::bail!("return path must not contain '|'");
    }

    let payload = format!("{}|{:x}", return_to, timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| anyhow::anyhow!("HMAC init failed: {}", e))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify signature and age; return the embedded return path.
pub fn verify_state(state: &str, secret: &[u8]) -> Option<String> {
    let now_ms = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_millis();
    verify_state_at(state, secret, now_ms)
}

fn verify_state_at(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    let [return_to, timestamp_hex, signature_hex] = parts[..] else {
        return None;
    };

    let payload = format!("{}|{}", return_to, timestamp_hex);
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued_ms = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(issued_ms) > STATE_MAX_AGE.as_millis() {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(return_to.to_string())
}
