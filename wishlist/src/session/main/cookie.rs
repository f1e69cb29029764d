use crate::session::config::SESSION_SECRET;
use crate::session::errors::SessionError;
use crate::utils::{hmac_sign, hmac_verify};

/// Builds the `id.signature` cookie value for a session id
pub(super) fn sign_session_id(session_id: &str) -> Result<String, SessionError> {
    sign_session_id_with(session_id, &SESSION_SECRET)
}

/// Returns the session id when the cookie signature is valid
pub(super) fn unsign_session_cookie(value: &str) -> Option<&str> {
    unsign_session_cookie_with(value, &SESSION_SECRET)
}

fn sign_session_id_with(session_id: &str, secret: &[u8]) -> Result<String, SessionError> {
    let signature = hmac_sign(session_id, secret)?;
    Ok(format!("{session_id}.{signature}"))
}

fn unsign_session_cookie_with<'a>(value: &'a str, secret: &[u8]) -> Option<&'a str> {
    let (id, signature) = value.rsplit_once('.')?;
    if id.is_empty() || signature.is_empty() {
        return None;
    }
    hmac_verify(id, signature, secret).then_some(id)
}

/// Whether `host` (a `Host` header value, port optional) names the loopback interface
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim();
    let name = if let Some(rest) = host.strip_prefix('[') {
        // [::1]:3001
        match rest.split_once(']') {
            Some((inner, _)) => inner,
            None => return false,
        }
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or_default()
    } else {
        host
    };

    let name = name.to_ascii_lowercase();
    name == "localhost" || name == "127.0.0.1" || name == "::1"
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"unit-test-secret";

    #[test]
    fn test_signed_cookie_round_trip() {
        let cookie = sign_session_id_with("abc123", SECRET).unwrap();
        assert!(cookie.starts_with("abc123."));
        assert_eq!(unsign_session_cookie_with(&cookie, SECRET), Some("abc123"));
    }

    #[test]
    fn test_altered_signature_character_is_rejected() {
        let cookie = sign_session_id_with("abc123", SECRET).unwrap();
        let last = cookie.chars().last().unwrap();
        let replacement = if last == 'A' { 'B' } else { 'A' };
        let mut tampered = cookie[..cookie.len() - 1].to_string();
        tampered.push(replacement);

        assert_eq!(unsign_session_cookie_with(&tampered, SECRET), None);
    }

    #[test]
    fn test_altered_id_is_rejected() {
        let cookie = sign_session_id_with("abc123", SECRET).unwrap();
        let tampered = cookie.replacen("abc123", "abc124", 1);
        assert_eq!(unsign_session_cookie_with(&tampered, SECRET), None);
    }

    #[test]
    fn test_malformed_cookie_values() {
        assert_eq!(unsign_session_cookie_with("", SECRET), None);
        assert_eq!(unsign_session_cookie_with("no-dot", SECRET), None);
        assert_eq!(unsign_session_cookie_with(".sig", SECRET), None);
        assert_eq!(unsign_session_cookie_with("id.", SECRET), None);
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let cookie = sign_session_id_with("abc123", SECRET).unwrap();
        assert_eq!(unsign_session_cookie_with(&cookie, b"another"), None);
    }

    #[test]
    fn test_is_local_host() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("localhost:3001"));
        assert!(is_local_host("LOCALHOST"));
        assert!(is_local_host("127.0.0.1:8080"));
        assert!(is_local_host("[::1]:3001"));
        assert!(is_local_host("::1"));

        assert!(!is_local_host("example.com"));
        assert!(!is_local_host("localhost.example.com"));
        assert!(!is_local_host("127.0.0.2"));
        assert!(!is_local_host("[::2]:3001"));
        assert!(!is_local_host("[::1"));
        assert!(!is_local_host(""));
    }
}
