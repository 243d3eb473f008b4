// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Browser client cookie middleware.
//!
//! The cookie carries a random client id and an HMAC-SHA256 signature over
//! it: `<id>.<signature_hex>`. Requests without a valid cookie get a new
//! client and a fresh cookie on the response.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const CLIENT_COOKIE: &str = "clinic_client";

/// New random client id (32 bytes, base64url).
pub fn new_client_id() -> Result<String> {
    let mut bytes = [0u8; 32];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn signature(id: &str, key: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(id.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Cookie value for `id`.
pub fn sign_client_id(id: &str, key: &[u8]) -> Result<String> {
    Ok(format!("{}.{}", id, hex::encode(signature(id, key)?)))
}

/// Client id from a cookie value, if the signature checks out.
pub fn verify_client_cookie(value: &str, key: &[u8]) -> Option<String> {
    let (id, signature_hex) = value.split_once('.')?;
    if id.is_empty() {
        return None;
    }
    let given = hex::decode(signature_hex).ok()?;
    let expected = signature(id, key).ok()?;

    if bool::from(given.ct_eq(&expected)) {
        Some(id.to_string())
    } else {
        tracing::warn!("Client cookie signature mismatch");
        None
    }
}

fn is_local_host(host: &str) -> bool {
    host.contains("localhost") || host.contains("127.0.0.1")
}

/// Resolve the browser's [`ClientState`] and put it in the request
/// extensions.
///
/// [`ClientState`]: crate::client::ClientState
pub async fn attach_client(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let key = &state.config.cookie_signing_key;
    let existing = jar
        .get(CLIENT_COOKIE)
        .and_then(|cookie| verify_client_cookie(cookie.value(), key));

    let (id, fresh) = match existing {
        Some(id) => (id, false),
        None => (new_client_id()?, true),
    };

    let secure = !request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(is_local_host)
        .unwrap_or(false);

    let client = state.clients.get_or_create(&id, &state.backend, &state.config);
    client.touch();
    request.extensions_mut().insert(client);

    let response = next.run(request).await;
    if !fresh {
        return Ok(response);
    }

    let cookie = Cookie::build((CLIENT_COOKIE, sign_client_id(&id, key)?))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), response).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_cookie_key_32_bytes_minimum!";

    #[test]
    fn test_sign_and_verify() {
        let id = new_client_id().unwrap();
        assert_eq!(id.len(), 43);
        let value = sign_client_id(&id, KEY).unwrap();
        assert_eq!(verify_client_cookie(&value, KEY), Some(id));
    }

    #[test]
    fn test_tampered_or_foreign_cookie_rejected() {
        let value = sign_client_id("abc", KEY).unwrap();
        let tampered = value.replacen("abc", "abd", 1);
        assert_eq!(verify_client_cookie(&tampered, KEY), None);
        assert_eq!(
            verify_client_cookie(&value, b"another_key_that_is_long_enough!!"),
            None
        );
        assert_eq!(verify_client_cookie("no-signature", KEY), None);
        assert_eq!(verify_client_cookie(".deadbeef", KEY), None);
        assert_eq!(verify_client_cookie("abc.not-hex", KEY), None);
    }
}
