use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use headers::HeaderMapExt;
use hmac::{Hmac, Mac};
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::IS_PRODUCTION;

type HmacSha256 = Hmac<Sha256>;

pub(crate) fn base64url_decode(input: &str) -> Result<Vec<u8>, UtilError> {
    let decoded = URL_SAFE_NO_PAD
        .decode(input)
        .map_err(|_| UtilError::Format("Failed to decode base64url".to_string()))?;
    Ok(decoded)
}

pub(crate) fn base64url_encode(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

/// Generates `len` bytes from the system CSPRNG, base64url encoded
pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
    Ok(base64url_encode(&bytes))
}

/// Compares two byte strings in constant time with respect to their content
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Signs `payload` with HMAC-SHA256 and returns the base64url signature
pub(crate) fn hmac_sign(payload: &str, secret: &[u8]) -> Result<String, UtilError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| UtilError::Crypto("Invalid HMAC key".to_string()))?;
    mac.update(payload.as_bytes());
    Ok(base64url_encode(&mac.finalize().into_bytes()))
}

/// Verifies a base64url HMAC-SHA256 signature in constant time
pub(crate) fn hmac_verify(payload: &str, signature: &str, secret: &[u8]) -> bool {
    let Ok(decoded) = base64url_decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&decoded).is_ok()
}

/// Appends a `Set-Cookie` header with the attributes every cookie in this crate shares
pub(crate) fn header_set_cookie(
    headers: &mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<(), UtilError> {
    let secure = if *IS_PRODUCTION { "; Secure" } else { "" };
    let cookie =
        format!("{name}={value}; SameSite=Strict; HttpOnly; Path=/; Max-Age={max_age}{secure}");
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(())
}

pub(crate) fn header_clear_cookie(headers: &mut HeaderMap, name: &str) -> Result<(), UtilError> {
    header_set_cookie(headers, name, "", 0)
}

/// Reads a cookie value from the request headers
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .typed_get::<headers::Cookie>()
        .and_then(|cookies| cookies.get(name).map(|v| v.to_string()))
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Invalid format: {0}")]
    Format(String),
}
