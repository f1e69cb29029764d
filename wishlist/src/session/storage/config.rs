use std::sync::LazyLock;

use crate::storage::table_name;

/// Admin sessions table name
pub(super) static DB_TABLE_ADMIN_SESSIONS: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_ADMIN_SESSIONS", "admin_sessions"));
