use std::{env, sync::LazyLock};

pub(crate) static ORIGIN: LazyLock<String> =
    LazyLock::new(|| env::var("ORIGIN").expect("ORIGIN must be set"));

/// Relying-party id: the host part of `ORIGIN`
pub(super) static PASSKEY_RP_ID: LazyLock<String> =
    LazyLock::new(|| rp_id_from_origin(&ORIGIN).expect("Could not extract RP ID from ORIGIN"));

pub(super) static PASSKEY_RP_NAME: LazyLock<String> =
    LazyLock::new(|| env::var("PASSKEY_RP_NAME").unwrap_or_else(|_| ORIGIN.clone()));

/// Ceremony timeout handed to the browser, in seconds
pub(super) static PASSKEY_TIMEOUT: LazyLock<u32> =
    LazyLock::new(|| seconds_from_env("PASSKEY_TIMEOUT", 60));

/// Lifetime of a stored challenge and of its cookie, in seconds
pub(crate) static PASSKEY_CHALLENGE_TIMEOUT: LazyLock<u32> =
    LazyLock::new(|| seconds_from_env("PASSKEY_CHALLENGE_TIMEOUT", 300));

pub(super) static PASSKEY_USER_VERIFICATION: LazyLock<UserVerification> = LazyLock::new(|| {
    env::var("PASSKEY_USER_VERIFICATION")
        .map(|v| UserVerification::parse(&v))
        .unwrap_or_default()
});

/// Secret that unlocks enrollment of the first passkey
pub(super) static ADMIN_SETUP_TOKEN: LazyLock<Option<String>> = LazyLock::new(|| {
    env::var("ADMIN_SETUP_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
});

/// WebAuthn `userVerification` requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(super) enum UserVerification {
    Required,
    #[default]
    Preferred,
    Discouraged,
}

impl UserVerification {
    fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "required" => Self::Required,
            "preferred" => Self::Preferred,
            "discouraged" => Self::Discouraged,
            _ => {
                tracing::warn!(
                    "Invalid user verification: {}. Using default 'preferred'",
                    value
                );
                Self::Preferred
            }
        }
    }

    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Discouraged => "discouraged",
        }
    }
}

fn rp_id_from_origin(origin: &str) -> Option<String> {
    url::Url::parse(origin)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

fn seconds_from_env(key: &str, default: u32) -> u32 {
    match env::var(key).map(|v| v.parse::<u32>()) {
        Ok(Ok(secs)) if secs > 0 => secs,
        Ok(_) => {
            tracing::warn!("Invalid {}. Using default {}s", key, default);
            default
        }
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rp_id_from_origin() {
        let cases = [
            ("https://wishlist.example.com", "wishlist.example.com"),
            ("http://localhost:3001", "localhost"),
            ("https://example.com:8443/", "example.com"),
        ];
        for (origin, expected) in cases {
            assert_eq!(rp_id_from_origin(origin).as_deref(), Some(expected));
        }
        assert_eq!(rp_id_from_origin("not a url"), None);
    }

    #[test]
    fn test_user_verification_parse() {
        assert_eq!(UserVerification::parse("REQUIRED"), UserVerification::Required);
        assert_eq!(
            UserVerification::parse(" discouraged "),
            UserVerification::Discouraged
        );
        assert_eq!(UserVerification::parse("always"), UserVerification::Preferred);
        assert_eq!(UserVerification::default().as_str(), "preferred");
    }
}
