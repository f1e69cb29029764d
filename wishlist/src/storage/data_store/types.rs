use sqlx::{PgPool, SqlitePool};

/// Connection pool of the configured row store
#[derive(Clone, Debug)]
pub(crate) enum DataStore {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl DataStore {
    pub(crate) fn as_sqlite(&self) -> Option<&SqlitePool> {
        match self {
            Self::Sqlite(pool) => Some(pool),
            Self::Postgres(_) => None,
        }
    }

    pub(crate) fn as_postgres(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(pool) => Some(pool),
            Self::Sqlite(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Postgres(_) => "postgres",
        }
    }
}
