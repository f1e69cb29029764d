//! Table naming shared by every store

use std::{env, sync::LazyLock};

/// Prefix prepended to every default table name
static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "wl_".to_string()));

/// Resolves a table name: an explicit `env_key` override wins, otherwise
/// `DB_TABLE_PREFIX` followed by `suffix`.
pub(crate) fn table_name(env_key: &str, suffix: &str) -> String {
    resolve_table_name(env::var(env_key).ok(), &DB_TABLE_PREFIX, suffix)
}

fn resolve_table_name(explicit: Option<String>, prefix: &str, suffix: &str) -> String {
    match explicit.map(|name| name.trim().to_string()) {
        Some(name) if !name.is_empty() => name,
        _ => format!("{prefix}{suffix}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_applies_without_override() {
        assert_eq!(resolve_table_name(None, "wl_", "items"), "wl_items");
        assert_eq!(resolve_table_name(None, "", "bans"), "bans");
    }

    #[test]
    fn test_explicit_name_wins() {
        assert_eq!(
            resolve_table_name(Some("gifts".to_string()), "wl_", "items"),
            "gifts"
        );
        // Blank overrides are ignored
        assert_eq!(
            resolve_table_name(Some("  ".to_string()), "wl_", "items"),
            "wl_items"
        );
    }
}
