use std::sync::LazyLock;

use crate::storage::table_name;

/// Admin passkey credentials table name
pub(super) static DB_TABLE_ADMIN_CREDENTIALS: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_ADMIN_CREDENTIALS", "admin_credentials"));
