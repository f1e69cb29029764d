use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::storage::validate_postgres_table_schema;

use crate::catalog::config::{
    DB_TABLE_BANS, DB_TABLE_EXCHANGE_RATES, DB_TABLE_ITEMS, DB_TABLE_RESERVATIONS,
};
use crate::catalog::errors::{CatalogError, is_foreign_key_violation, is_unique_violation};
use crate::catalog::types::{
    Ban, BanRow, ExchangeRate, ItemFields, ItemRow, NewBan, NewReservation, Reservation,
    ReservationRow, ReservationStatus, ReserveOutcome, WishlistItem, join_categories,
};

const ITEM_COLUMNS: &str = "id, title, title_localized, price, image, description, \
    description_localized, category, priority, received, weight, created_at";

const RESERVATION_COLUMNS: &str =
    "id, item_id, reserved_by, ip, reserved_at, reservation_token, status";

const BAN_COLUMNS: &str = "id, visitor_id, ip, reason, expires_at, created_at";

pub(super) async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), CatalogError> {
    let items = DB_TABLE_ITEMS.as_str();
    let reservations = DB_TABLE_RESERVATIONS.as_str();
    let bans = DB_TABLE_BANS.as_str();
    let rates = DB_TABLE_EXCHANGE_RATES.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {items} (
            id BIGSERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            title_localized TEXT,
            price TEXT NOT NULL DEFAULT '',
            image TEXT,
            description TEXT NOT NULL DEFAULT '',
            description_localized TEXT,
            category TEXT NOT NULL DEFAULT '',
            priority TEXT,
            received BOOLEAN NOT NULL DEFAULT FALSE,
            weight BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
    ))
    .execute(pool)
    .await?;

    // UNIQUE(item_id) keeps an item to at most one reservation
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {reservations} (
            id BIGSERIAL PRIMARY KEY,
            item_id BIGINT NOT NULL UNIQUE REFERENCES {items}(id),
            reserved_by TEXT NOT NULL,
            ip TEXT,
            reserved_at TIMESTAMPTZ NOT NULL,
            reservation_token TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'reserved'
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {bans} (
            id BIGSERIAL PRIMARY KEY,
            visitor_id TEXT,
            ip TEXT,
            reason TEXT NOT NULL,
            expires_at TIMESTAMPTZ,
            created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_visitor_id ON {bans}(visitor_id)",
        bans.replace(".", "_")
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS idx_{}_ip ON {bans}(ip)",
        bans.replace(".", "_")
    ))
    .execute(pool)
    .await?;

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {rates} (
            from_currency TEXT NOT NULL,
            to_currency TEXT NOT NULL,
            rate DOUBLE PRECISION NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (from_currency, to_currency)
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_catalog_tables_postgres(
    pool: &Pool<Postgres>,
) -> Result<(), CatalogError> {
    validate_postgres_table_schema(
        pool,
        DB_TABLE_ITEMS.as_str(),
        &[
            ("id", "bigint"),
            ("title", "text"),
            ("title_localized", "text"),
            ("price", "text"),
            ("image", "text"),
            ("description", "text"),
            ("description_localized", "text"),
            ("category", "text"),
            ("priority", "text"),
            ("received", "boolean"),
            ("weight", "bigint"),
            ("created_at", "timestamp with time zone"),
        ],
        CatalogError::Storage,
    )
    .await?;

    validate_postgres_table_schema(
        pool,
        DB_TABLE_RESERVATIONS.as_str(),
        &[
            ("id", "bigint"),
            ("item_id", "bigint"),
            ("reserved_by", "text"),
            ("ip", "text"),
            ("reserved_at", "timestamp with time zone"),
            ("reservation_token", "text"),
            ("status", "text"),
        ],
        CatalogError::Storage,
    )
    .await?;

    validate_postgres_table_schema(
        pool,
        DB_TABLE_BANS.as_str(),
        &[
            ("id", "bigint"),
            ("visitor_id", "text"),
            ("ip", "text"),
            ("reason", "text"),
            ("expires_at", "timestamp with time zone"),
            ("created_at", "timestamp with time zone"),
        ],
        CatalogError::Storage,
    )
    .await?;

    validate_postgres_table_schema(
        pool,
        DB_TABLE_EXCHANGE_RATES.as_str(),
        &[
            ("from_currency", "text"),
            ("to_currency", "text"),
            ("rate", "double precision"),
            ("updated_at", "timestamp with time zone"),
        ],
        CatalogError::Storage,
    )
    .await
}

pub(super) async fn list_items_postgres(
    pool: &Pool<Postgres>,
) -> Result<Vec<WishlistItem>, CatalogError> {
    let rows = sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM {} ORDER BY id",
        DB_TABLE_ITEMS.as_str()
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(WishlistItem::try_from).collect()
}

pub(super) async fn get_item_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<Option<WishlistItem>, CatalogError> {
    sqlx::query_as::<_, ItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM {} WHERE id = $1",
        DB_TABLE_ITEMS.as_str()
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .map(WishlistItem::try_from)
    .transpose()
}

pub(super) async fn insert_item_postgres(
    pool: &Pool<Postgres>,
    fields: &ItemFields,
    created_at: DateTime<Utc>,
) -> Result<WishlistItem, CatalogError> {
    let row = sqlx::query_as::<_, ItemRow>(&format!(
        r#"
        INSERT INTO {} (title, title_localized, price, image, description,
            description_localized, category, priority, received, weight, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {ITEM_COLUMNS}
        "#,
        DB_TABLE_ITEMS.as_str()
    ))
    .bind(&fields.title)
    .bind(&fields.title_localized)
    .bind(&fields.price)
    .bind(&fields.image)
    .bind(&fields.description)
    .bind(&fields.description_localized)
    .bind(join_categories(&fields.category))
    .bind(fields.priority.map(|p| p.as_str()))
    .bind(fields.received)
    .bind(fields.weight)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    WishlistItem::try_from(row)
}

pub(super) async fn update_item_postgres(
    pool: &Pool<Postgres>,
    id: i64,
    fields: &ItemFields,
) -> Result<Option<WishlistItem>, CatalogError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ItemRow>(&format!(
        r#"
        UPDATE {} SET title = $1, title_localized = $2, price = $3, image = $4,
            description = $5, description_localized = $6, category = $7, priority = $8,
            received = $9, weight = $10
        WHERE id = $11
        RETURNING {ITEM_COLUMNS}
        "#,
        DB_TABLE_ITEMS.as_str()
    ))
    .bind(&fields.title)
    .bind(&fields.title_localized)
    .bind(&fields.price)
    .bind(&fields.image)
    .bind(&fields.description)
    .bind(&fields.description_localized)
    .bind(join_categories(&fields.category))
    .bind(fields.priority.map(|p| p.as_str()))
    .bind(fields.received)
    .bind(fields.weight)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if fields.received {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE item_id = $1",
            DB_TABLE_RESERVATIONS.as_str()
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    WishlistItem::try_from(row).map(Some)
}

pub(super) async fn set_received_postgres(
    pool: &Pool<Postgres>,
    id: i64,
    received: bool,
) -> Result<Option<WishlistItem>, CatalogError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, ItemRow>(&format!(
        "UPDATE {} SET received = $1 WHERE id = $2 RETURNING {ITEM_COLUMNS}",
        DB_TABLE_ITEMS.as_str()
    ))
    .bind(received)
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    if received {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE item_id = $1",
            DB_TABLE_RESERVATIONS.as_str()
        ))
        .bind(id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    WishlistItem::try_from(row).map(Some)
}

pub(super) async fn delete_item_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<bool, CatalogError> {
    let mut tx = pool.begin().await?;

    sqlx::query(&format!(
        "DELETE FROM {} WHERE item_id = $1",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", DB_TABLE_ITEMS.as_str()))
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn set_weights_postgres(
    pool: &Pool<Postgres>,
    updates: &[(i64, i64)],
) -> Result<Vec<i64>, CatalogError> {
    let mut tx = pool.begin().await?;
    let mut missing = Vec::new();

    for (id, weight) in updates {
        let result = sqlx::query(&format!(
            "UPDATE {} SET weight = $1 WHERE id = $2",
            DB_TABLE_ITEMS.as_str()
        ))
        .bind(weight)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            missing.push(*id);
        }
    }

    if missing.is_empty() {
        tx.commit().await?;
    } else {
        tx.rollback().await?;
    }
    Ok(missing)
}

pub(super) async fn insert_reservation_if_available_postgres(
    pool: &Pool<Postgres>,
    reservation: &NewReservation<'_>,
) -> Result<ReserveOutcome, CatalogError> {
    let items = DB_TABLE_ITEMS.as_str();
    let reservations = DB_TABLE_RESERVATIONS.as_str();

    let result = sqlx::query(&format!(
        r#"
        INSERT INTO {reservations} (item_id, reserved_by, ip, reserved_at, reservation_token, status)
        SELECT $1, $2, $3, $4, $5, $6
        WHERE EXISTS (SELECT 1 FROM {items} WHERE id = $7 AND received = FALSE)
          AND NOT EXISTS (SELECT 1 FROM {reservations} WHERE item_id = $8)
        "#
    ))
    .bind(reservation.item_id)
    .bind(reservation.reserved_by)
    .bind(reservation.ip)
    .bind(reservation.reserved_at)
    .bind(reservation.reservation_token)
    .bind(ReservationStatus::Reserved.as_str())
    .bind(reservation.item_id)
    .bind(reservation.item_id)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 1 => Ok(ReserveOutcome::Inserted),
        Ok(_) => Ok(ReserveOutcome::Rejected),
        Err(e) if is_unique_violation(&e) || is_foreign_key_violation(&e) => {
            Ok(ReserveOutcome::Rejected)
        }
        Err(e) => Err(e.into()),
    }
}

pub(super) async fn get_reservation_postgres(
    pool: &Pool<Postgres>,
    item_id: i64,
) -> Result<Option<Reservation>, CatalogError> {
    sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM {} WHERE item_id = $1",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .bind(item_id)
    .fetch_optional(pool)
    .await?
    .map(Reservation::try_from)
    .transpose()
}

pub(super) async fn list_reservations_postgres(
    pool: &Pool<Postgres>,
) -> Result<Vec<Reservation>, CatalogError> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {RESERVATION_COLUMNS} FROM {} ORDER BY reserved_at DESC",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Reservation::try_from).collect()
}

pub(super) async fn delete_reservation_postgres(
    pool: &Pool<Postgres>,
    item_id: i64,
) -> Result<bool, CatalogError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE item_id = $1",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .bind(item_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn delete_reservation_with_token_postgres(
    pool: &Pool<Postgres>,
    item_id: i64,
    token: &str,
) -> Result<bool, CatalogError> {
    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE item_id = $1 AND reservation_token = $2",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .bind(item_id)
    .bind(token)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn set_reservation_status_postgres(
    pool: &Pool<Postgres>,
    item_id: i64,
    status: ReservationStatus,
) -> Result<bool, CatalogError> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET status = $1 WHERE item_id = $2",
        DB_TABLE_RESERVATIONS.as_str()
    ))
    .bind(status.as_str())
    .bind(item_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn insert_ban_postgres(
    pool: &Pool<Postgres>,
    ban: &NewBan,
    created_at: DateTime<Utc>,
) -> Result<Ban, CatalogError> {
    let row = sqlx::query_as::<_, BanRow>(&format!(
        r#"
        INSERT INTO {} (visitor_id, ip, reason, expires_at, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {BAN_COLUMNS}
        "#,
        DB_TABLE_BANS.as_str()
    ))
    .bind(&ban.visitor_id)
    .bind(&ban.ip)
    .bind(ban.reason.as_str())
    .bind(ban.expires_at)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ban::try_from(row)
}

pub(super) async fn list_bans_postgres(pool: &Pool<Postgres>) -> Result<Vec<Ban>, CatalogError> {
    let rows = sqlx::query_as::<_, BanRow>(&format!(
        "SELECT {BAN_COLUMNS} FROM {} ORDER BY created_at DESC, id DESC",
        DB_TABLE_BANS.as_str()
    ))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Ban::try_from).collect()
}

pub(super) async fn delete_ban_postgres(
    pool: &Pool<Postgres>,
    id: i64,
) -> Result<bool, CatalogError> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", DB_TABLE_BANS.as_str()))
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub(super) async fn find_bans_postgres(
    pool: &Pool<Postgres>,
    visitor_id: Option<&str>,
    ip: Option<&str>,
) -> Result<Vec<Ban>, CatalogError> {
    let rows = sqlx::query_as::<_, BanRow>(&format!(
        r#"
        SELECT {BAN_COLUMNS} FROM {}
        WHERE (visitor_id IS NOT NULL AND visitor_id = $1)
           OR (ip IS NOT NULL AND ip = $2)
        "#,
        DB_TABLE_BANS.as_str()
    ))
    .bind(visitor_id)
    .bind(ip)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(Ban::try_from).collect()
}

pub(super) async fn upsert_exchange_rate_postgres(
    pool: &Pool<Postgres>,
    rate: &ExchangeRate,
) -> Result<(), CatalogError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {} (from_currency, to_currency, rate, updated_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (from_currency, to_currency)
        DO UPDATE SET rate = excluded.rate, updated_at = excluded.updated_at
        "#,
        DB_TABLE_EXCHANGE_RATES.as_str()
    ))
    .bind(&rate.from_currency)
    .bind(&rate.to_currency)
    .bind(rate.rate)
    .bind(rate.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn list_exchange_rates_postgres(
    pool: &Pool<Postgres>,
) -> Result<Vec<ExchangeRate>, CatalogError> {
    let rates = sqlx::query_as::<_, ExchangeRate>(&format!(
        "SELECT from_currency, to_currency, rate, updated_at FROM {} ORDER BY from_currency, to_currency",
        DB_TABLE_EXCHANGE_RATES.as_str()
    ))
    .fetch_all(pool)
    .await?;

    Ok(rates)
}
