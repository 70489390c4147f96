//! Database access for submissions and prices
//!
//! Statements are built with sea-query and rendered for whichever backend the
//! store was opened against. SQLite is the default; PostgreSQL is selected by a
//! `postgres://` url.

use sea_query::{PostgresQueryBuilder, QueryStatementWriter, SqliteQueryBuilder};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{FromRow, Postgres, Sqlite};
use std::path::Path;
use std::str::FromStr;

use crate::queries::ddl;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// SQL dialect of an open store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl Backend {
    /// Pick the backend from a connection url scheme
    pub fn from_url(url: &str) -> Result<Self, DynError> {
        if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else {
            Err(format!(
                "Unsupported database url '{}': expected sqlite: or postgres://",
                url
            )
            .into())
        }
    }

    /// Render a statement with this backend's query builder
    pub fn render<S: QueryStatementWriter>(self, statement: &S) -> String {
        match self {
            Backend::Sqlite => statement.to_string(SqliteQueryBuilder),
            Backend::Postgres => statement.to_string(PostgresQueryBuilder),
        }
    }
}

/// Connection pool over either backend
#[derive(Clone)]
pub enum Store {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl Store {
    /// Connect using a `sqlite:` or `postgres://` url
    pub async fn connect(url: &str) -> Result<Self, DynError> {
        match Backend::from_url(url)? {
            Backend::Sqlite => {
                let options = SqliteConnectOptions::from_str(url)?
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal);
                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await?;
                Ok(Store::Sqlite(pool))
            }
            Backend::Postgres => {
                let options = PgConnectOptions::from_str(url)?;
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await?;
                Ok(Store::Postgres(pool))
            }
        }
    }

    /// Open (creating if needed) a SQLite database file
    /// Enables WAL mode
    pub async fn open_sqlite(db_path: &Path) -> Result<Self, DynError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Store::Sqlite(pool))
    }

    pub fn backend(&self) -> Backend {
        match self {
            Store::Sqlite(_) => Backend::Sqlite,
            Store::Postgres(_) => Backend::Postgres,
        }
    }

    /// Create tables and indexes if they do not exist
    pub async fn init_schema(&self) -> Result<(), DynError> {
        let statements = match self.backend() {
            Backend::Sqlite => [
                ddl::create_submissions_table(),
                ddl::create_submissions_date_index(),
                ddl::create_scrap_prices_table(),
                ddl::create_scrap_prices_pair_index(),
            ],
            Backend::Postgres => [
                ddl::create_submissions_table_pg(),
                ddl::create_submissions_date_index_pg(),
                ddl::create_scrap_prices_table_pg(),
                ddl::create_scrap_prices_pair_index_pg(),
            ],
        };
        for sql in &statements {
            self.execute_sql(sql).await?;
        }
        Ok(())
    }

    /// Execute a raw SQL statement, returning the affected row count
    pub async fn execute_sql(&self, sql: &str) -> Result<u64, DynError> {
        let result = match self {
            Store::Sqlite(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
            Store::Postgres(pool) => sqlx::query(sql).execute(pool).await?.rows_affected(),
        };
        Ok(result)
    }

    /// Execute a built statement, returning the affected row count
    pub async fn execute<S: QueryStatementWriter>(&self, statement: &S) -> Result<u64, DynError> {
        let sql = self.backend().render(statement);
        self.execute_sql(&sql).await
    }

    /// Fetch every row produced by a statement
    pub async fn fetch_all<T, S>(&self, statement: &S) -> Result<Vec<T>, DynError>
    where
        S: QueryStatementWriter,
        T: for<'r> FromRow<'r, SqliteRow> + for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.backend().render(statement);
        let rows = match self {
            Store::Sqlite(pool) => sqlx::query_as::<Sqlite, T>(&sql).fetch_all(pool).await?,
            Store::Postgres(pool) => sqlx::query_as::<Postgres, T>(&sql).fetch_all(pool).await?,
        };
        Ok(rows)
    }

    /// Fetch at most one row produced by a statement
    pub async fn fetch_optional<T, S>(&self, statement: &S) -> Result<Option<T>, DynError>
    where
        S: QueryStatementWriter,
        T: for<'r> FromRow<'r, SqliteRow> + for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.backend().render(statement);
        let row = match self {
            Store::Sqlite(pool) => sqlx::query_as::<Sqlite, T>(&sql).fetch_optional(pool).await?,
            Store::Postgres(pool) => sqlx::query_as::<Postgres, T>(&sql).fetch_optional(pool).await?,
        };
        Ok(row)
    }

    /// Fetch the first column of every row produced by a statement
    pub async fn fetch_column<T, S>(&self, statement: &S) -> Result<Vec<T>, DynError>
    where
        S: QueryStatementWriter,
        T: for<'r> sqlx::Decode<'r, Sqlite>
            + sqlx::Type<Sqlite>
            + for<'r> sqlx::Decode<'r, Postgres>
            + sqlx::Type<Postgres>
            + Send
            + Unpin,
    {
        let sql = self.backend().render(statement);
        let values = match self {
            Store::Sqlite(pool) => sqlx::query_scalar::<Sqlite, T>(&sql).fetch_all(pool).await?,
            Store::Postgres(pool) => sqlx::query_scalar::<Postgres, T>(&sql).fetch_all(pool).await?,
        };
        Ok(values)
    }

    /// Fetch the single value produced by a statement (COUNT, RETURNING id, ...)
    pub async fn fetch_scalar<T, S>(&self, statement: &S) -> Result<T, DynError>
    where
        S: QueryStatementWriter,
        T: for<'r> sqlx::Decode<'r, Sqlite>
            + sqlx::Type<Sqlite>
            + for<'r> sqlx::Decode<'r, Postgres>
            + sqlx::Type<Postgres>
            + Send
            + Unpin,
    {
        let sql = self.backend().render(statement);
        let value = match self {
            Store::Sqlite(pool) => sqlx::query_scalar::<Sqlite, T>(&sql).fetch_one(pool).await?,
            Store::Postgres(pool) => sqlx::query_scalar::<Postgres, T>(&sql).fetch_one(pool).await?,
        };
        Ok(value)
    }

    /// Run statements inside one transaction, returning the summed affected rows
    /// Any failure rolls the whole batch back
    pub async fn execute_in_transaction(&self, statements: &[String]) -> Result<u64, DynError> {
        match self {
            Store::Sqlite(pool) => {
                let mut tx = pool.begin().await?;
                let mut affected = 0;
                for sql in statements {
                    match sqlx::query(sql).execute(&mut *tx).await {
                        Ok(result) => affected += result.rows_affected(),
                        Err(err) => {
                            tx.rollback().await?;
                            return Err(err.into());
                        }
                    }
                }
                tx.commit().await?;
                Ok(affected)
            }
            Store::Postgres(pool) => {
                let mut tx = pool.begin().await?;
                let mut affected = 0;
                for sql in statements {
                    match sqlx::query(sql).execute(&mut *tx).await {
                        Ok(result) => affected += result.rows_affected(),
                        Err(err) => {
                            tx.rollback().await?;
                            return Err(err.into());
                        }
                    }
                }
                tx.commit().await?;
                Ok(affected)
            }
        }
    }

    /// Liveness check used by the health endpoint
    pub async fn ping(&self) -> bool {
        self.execute_sql("SELECT 1").await.is_ok()
    }
}

/// Insert a postgres password into a url like `postgres://user@host:5432/db?sslmode=require`
pub fn build_postgres_url(base_url: &str, password: &str) -> Result<String, DynError> {
    let url = url::Url::parse(base_url)?;

    let user = url.username();
    let host = url.host_str().ok_or("Missing host in database url")?;
    let port = url.port().unwrap_or(5432);
    let database = url.path().trim_start_matches('/');

    let mut full_url = format!(
        "postgres://{}:{}@{}:{}/{}",
        user,
        urlencoding::encode(password),
        host,
        port,
        database
    );
    if let Some(query) = url.query() {
        full_url.push('?');
        full_url.push_str(query);
    }

    Ok(full_url)
}

/// Create a SQLite database in a fresh temporary directory for testing
/// Returns (store, guard) - keep the guard alive for the lifetime of the store
pub async fn create_test_connection_in_temporary_file(
) -> Result<(Store, tempfile::TempDir), DynError> {
    let guard = tempfile::tempdir()?;
    let store = Store::open_sqlite(&guard.path().join("test.sqlite")).await?;
    Ok((store, guard))
}
