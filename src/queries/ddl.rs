use sea_query::{ColumnDef, Index, PostgresQueryBuilder, SqliteQueryBuilder, Table};

use crate::schema::{ScrapPrices, Submissions};

/// CREATE TABLE IF NOT EXISTS submissions (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     material_type, title, description, quantity, name, location,
///     contact, email, photos, submission_date TEXT NOT NULL
/// )
pub fn create_submissions_table() -> String {
    Table::create()
        .table(Submissions::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Submissions::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Submissions::MaterialType).string().not_null())
        .col(ColumnDef::new(Submissions::Title).string().not_null())
        .col(ColumnDef::new(Submissions::Description).text().not_null())
        .col(ColumnDef::new(Submissions::Quantity).string().not_null())
        .col(ColumnDef::new(Submissions::Name).string().not_null())
        .col(ColumnDef::new(Submissions::Location).string().not_null())
        .col(ColumnDef::new(Submissions::Contact).string().not_null())
        .col(ColumnDef::new(Submissions::Email).string().not_null())
        .col(
            ColumnDef::new(Submissions::Photos)
                .text()
                .not_null()
                .default(""),
        )
        .col(ColumnDef::new(Submissions::SubmissionDate).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS scrap_prices (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     category TEXT NOT NULL,
///     subcategory TEXT NOT NULL,
///     price REAL NOT NULL,
///     unit TEXT NOT NULL,
///     last_updated TEXT NOT NULL
/// )
pub fn create_scrap_prices_table() -> String {
    Table::create()
        .table(ScrapPrices::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(ScrapPrices::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(ScrapPrices::Category).string().not_null())
        .col(ColumnDef::new(ScrapPrices::Subcategory).string().not_null())
        .col(ColumnDef::new(ScrapPrices::Price).double().not_null())
        .col(ColumnDef::new(ScrapPrices::Unit).string().not_null())
        .col(ColumnDef::new(ScrapPrices::LastUpdated).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE UNIQUE INDEX IF NOT EXISTS idx_scrap_prices_pair ON scrap_prices(category, subcategory)
pub fn create_scrap_prices_pair_index() -> String {
    Index::create()
        .if_not_exists()
        .unique()
        .name("idx_scrap_prices_pair")
        .table(ScrapPrices::Table)
        .col(ScrapPrices::Category)
        .col(ScrapPrices::Subcategory)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_submissions_date ON submissions(submission_date)
pub fn create_submissions_date_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_submissions_date")
        .table(Submissions::Table)
        .col(Submissions::SubmissionDate)
        .to_string(SqliteQueryBuilder)
}

// ============================================================================
// PostgreSQL variants
// ============================================================================

/// CREATE TABLE IF NOT EXISTS submissions - PostgreSQL
/// Note: Uses BIGSERIAL instead of INTEGER AUTOINCREMENT
pub fn create_submissions_table_pg() -> String {
    Table::create()
        .table(Submissions::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Submissions::Id)
                .big_integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Submissions::MaterialType).string().not_null())
        .col(ColumnDef::new(Submissions::Title).string().not_null())
        .col(ColumnDef::new(Submissions::Description).text().not_null())
        .col(ColumnDef::new(Submissions::Quantity).string().not_null())
        .col(ColumnDef::new(Submissions::Name).string().not_null())
        .col(ColumnDef::new(Submissions::Location).string().not_null())
        .col(ColumnDef::new(Submissions::Contact).string().not_null())
        .col(ColumnDef::new(Submissions::Email).string().not_null())
        .col(
            ColumnDef::new(Submissions::Photos)
                .text()
                .not_null()
                .default(""),
        )
        .col(ColumnDef::new(Submissions::SubmissionDate).string().not_null())
        .to_string(PostgresQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS scrap_prices - PostgreSQL
pub fn create_scrap_prices_table_pg() -> String {
    Table::create()
        .table(ScrapPrices::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(ScrapPrices::Id)
                .big_integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(ScrapPrices::Category).string().not_null())
        .col(ColumnDef::new(ScrapPrices::Subcategory).string().not_null())
        .col(ColumnDef::new(ScrapPrices::Price).double().not_null()) // DOUBLE PRECISION
        .col(ColumnDef::new(ScrapPrices::Unit).string().not_null())
        .col(ColumnDef::new(ScrapPrices::LastUpdated).string().not_null())
        .to_string(PostgresQueryBuilder)
}

/// CREATE UNIQUE INDEX IF NOT EXISTS idx_scrap_prices_pair - PostgreSQL
pub fn create_scrap_prices_pair_index_pg() -> String {
    Index::create()
        .if_not_exists()
        .unique()
        .name("idx_scrap_prices_pair")
        .table(ScrapPrices::Table)
        .col(ScrapPrices::Category)
        .col(ScrapPrices::Subcategory)
        .to_string(PostgresQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_submissions_date - PostgreSQL
pub fn create_submissions_date_index_pg() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_submissions_date")
        .table(Submissions::Table)
        .col(Submissions::SubmissionDate)
        .to_string(PostgresQueryBuilder)
}
