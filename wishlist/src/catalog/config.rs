use std::sync::LazyLock;

use crate::storage::table_name;

pub(super) static DB_TABLE_ITEMS: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_ITEMS", "items"));

pub(super) static DB_TABLE_RESERVATIONS: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_RESERVATIONS", "reservations"));

pub(super) static DB_TABLE_BANS: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_BANS", "bans"));

pub(super) static DB_TABLE_EXCHANGE_RATES: LazyLock<String> =
    LazyLock::new(|| table_name("DB_TABLE_EXCHANGE_RATES", "exchange_rates"));
