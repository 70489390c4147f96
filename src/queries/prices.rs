use sea_query::{Expr, Func, InsertStatement, OnConflict, Order, Query, SelectStatement};

use crate::schema::ScrapPrices;

/// SELECT * FROM scrap_prices ORDER BY category, subcategory
pub fn select_all() -> SelectStatement {
    Query::select()
        .columns([
            ScrapPrices::Id,
            ScrapPrices::Category,
            ScrapPrices::Subcategory,
            ScrapPrices::Price,
            ScrapPrices::Unit,
            ScrapPrices::LastUpdated,
        ])
        .from(ScrapPrices::Table)
        .order_by(ScrapPrices::Category, Order::Asc)
        .order_by(ScrapPrices::Subcategory, Order::Asc)
        .to_owned()
}

/// INSERT INTO scrap_prices (...) VALUES (...)
/// ON CONFLICT (category, subcategory) DO UPDATE SET price, unit, last_updated
pub fn upsert(
    category: &str,
    subcategory: &str,
    price: f64,
    unit: &str,
    last_updated: &str,
) -> InsertStatement {
    Query::insert()
        .into_table(ScrapPrices::Table)
        .columns([
            ScrapPrices::Category,
            ScrapPrices::Subcategory,
            ScrapPrices::Price,
            ScrapPrices::Unit,
            ScrapPrices::LastUpdated,
        ])
        .values_panic([
            category.into(),
            subcategory.into(),
            price.into(),
            unit.into(),
            last_updated.into(),
        ])
        .on_conflict(
            OnConflict::columns([ScrapPrices::Category, ScrapPrices::Subcategory])
                .update_columns([
                    ScrapPrices::Price,
                    ScrapPrices::Unit,
                    ScrapPrices::LastUpdated,
                ])
                .to_owned(),
        )
        .to_owned()
}

/// INSERT INTO scrap_prices (...) VALUES (...)
/// ON CONFLICT (category, subcategory) DO NOTHING
pub fn insert_if_absent(
    category: &str,
    subcategory: &str,
    price: f64,
    unit: &str,
    last_updated: &str,
) -> InsertStatement {
    Query::insert()
        .into_table(ScrapPrices::Table)
        .columns([
            ScrapPrices::Category,
            ScrapPrices::Subcategory,
            ScrapPrices::Price,
            ScrapPrices::Unit,
            ScrapPrices::LastUpdated,
        ])
        .values_panic([
            category.into(),
            subcategory.into(),
            price.into(),
            unit.into(),
            last_updated.into(),
        ])
        .on_conflict(
            OnConflict::columns([ScrapPrices::Category, ScrapPrices::Subcategory])
                .do_nothing()
                .to_owned(),
        )
        .to_owned()
}

/// SELECT COUNT(id) FROM scrap_prices
pub fn count_all() -> SelectStatement {
    Query::select()
        .expr(Func::count(Expr::col(ScrapPrices::Id)))
        .from(ScrapPrices::Table)
        .to_owned()
}
