//! Scrap price list: admin endpoints plus the default seed list.

use axum::{extract::State, Json};
use bytes::Bytes;
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::constants::{DEFAULT_PRICES, DEFAULT_PRICE_UNIT, PRICE_TIMESTAMP_FORMAT};
use crate::db::{DynError, Store};
use crate::error::AppError;
use crate::models::ScrapPrice;
use crate::queries::prices;
use crate::serve::AppState;

/// One validated entry of a price update payload
#[derive(Debug, Clone, PartialEq)]
pub struct PriceUpdate {
    pub category: String,
    pub subcategory: String,
    pub price: f64,
    pub unit: String,
}

impl PriceUpdate {
    /// Parse `{"prices": {category: {subcategory: {price, unit}}}}`
    ///
    /// Entries with a missing, non-numeric or negative price are skipped and a
    /// missing unit becomes `kg`. A payload whose nesting is not made of
    /// objects is rejected as a whole.
    pub fn parse_payload(payload: &Value) -> Result<Vec<PriceUpdate>, String> {
        let categories = match payload.get("prices") {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(categories)) => categories,
            Some(_) => return Err("'prices' must be an object".to_string()),
        };

        let mut updates = Vec::new();
        for (category, subcategories) in categories {
            let subcategories = subcategories
                .as_object()
                .ok_or_else(|| format!("Category '{}' must map to an object", category))?;
            for (subcategory, info) in subcategories {
                let info = info.as_object().ok_or_else(|| {
                    format!("Price for '{}/{}' must be an object", category, subcategory)
                })?;
                let price = match info.get("price").and_then(Value::as_f64) {
                    Some(price) if price >= 0.0 => price,
                    _ => {
                        warn!(
                            "Skipping price for {}/{}: missing, non-numeric or negative",
                            category, subcategory
                        );
                        continue;
                    }
                };
                let unit = info
                    .get("unit")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_PRICE_UNIT);
                updates.push(PriceUpdate {
                    category: category.clone(),
                    subcategory: subcategory.clone(),
                    price,
                    unit: unit.to_string(),
                });
            }
        }
        Ok(updates)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceEntry {
    pub price: f64,
    pub unit: String,
    pub last_updated: String,
}

/// category -> subcategory -> entry
pub type PriceTable = BTreeMap<String, BTreeMap<String, PriceEntry>>;

fn now_timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format(PRICE_TIMESTAMP_FORMAT)
        .to_string()
}

/// Load every stored price grouped by category
pub async fn load_price_table(store: &Store) -> Result<PriceTable, DynError> {
    let rows: Vec<ScrapPrice> = store.fetch_all(&prices::select_all()).await?;
    let mut table = PriceTable::new();
    for row in rows {
        table.entry(row.category).or_default().insert(
            row.subcategory,
            PriceEntry {
                price: row.price,
                unit: row.unit,
                last_updated: row.last_updated,
            },
        );
    }
    Ok(table)
}

/// Upsert every update in a single transaction, returning how many were applied
pub async fn apply_price_updates(store: &Store, updates: &[PriceUpdate]) -> Result<usize, DynError> {
    if updates.is_empty() {
        return Ok(0);
    }
    let last_updated = now_timestamp();
    let backend = store.backend();
    let statements: Vec<String> = updates
        .iter()
        .map(|update| {
            backend.render(&prices::upsert(
                &update.category,
                &update.subcategory,
                update.price,
                &update.unit,
                &last_updated,
            ))
        })
        .collect();
    store.execute_in_transaction(&statements).await?;
    Ok(updates.len())
}

/// Insert the default price list where a (category, subcategory) pair is absent
/// Returns the number of rows actually added
pub async fn initialize_default_prices(store: &Store) -> Result<u64, DynError> {
    let last_updated = now_timestamp();
    let backend = store.backend();
    let statements: Vec<String> = DEFAULT_PRICES
        .iter()
        .map(|(category, subcategory, price, unit)| {
            backend.render(&prices::insert_if_absent(
                category,
                subcategory,
                *price,
                unit,
                &last_updated,
            ))
        })
        .collect();
    store.execute_in_transaction(&statements).await
}

#[derive(Serialize)]
pub struct PricesResponse {
    success: bool,
    prices: PriceTable,
}

#[derive(Serialize)]
pub struct UpdatePricesResponse {
    success: bool,
    message: String,
    updated_count: usize,
}

#[derive(Serialize)]
pub struct InitializePricesResponse {
    success: bool,
    message: String,
    added_count: u64,
}

pub async fn get_prices_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PricesResponse>, AppError> {
    let prices = load_price_table(&state.store)
        .await
        .map_err(AppError::failed("Error fetching prices"))?;
    Ok(Json(PricesResponse {
        success: true,
        prices,
    }))
}

pub async fn update_prices_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<UpdatePricesResponse>, AppError> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(AppError::failed("Error updating prices"))?;
    let updates =
        PriceUpdate::parse_payload(&payload).map_err(AppError::failed("Error updating prices"))?;
    let updated_count = apply_price_updates(&state.store, &updates)
        .await
        .map_err(AppError::failed("Error updating prices"))?;

    info!("Updated {} prices", updated_count);
    Ok(Json(UpdatePricesResponse {
        success: true,
        message: format!("Successfully updated {} prices", updated_count),
        updated_count,
    }))
}

pub async fn initialize_prices_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<InitializePricesResponse>, AppError> {
    let added_count = initialize_default_prices(&state.store)
        .await
        .map_err(AppError::failed("Error initializing prices"))?;

    info!("Initialized {} default prices", added_count);
    Ok(Json(InitializePricesResponse {
        success: true,
        message: format!("Initialized {} default prices", added_count),
        added_count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_connection_in_temporary_file;
    use serde_json::json;

    #[test]
    fn test_parse_payload_skips_bad_prices_and_defaults_unit() {
        let payload = json!({
            "prices": {
                "metal": {
                    "iron": {"price": 27.5},
                    "copper": {"price": -1, "unit": "kg"},
                    "brass": {"price": "cheap"},
                    "lead": {"unit": "kg"}
                },
                "electronics": {
                    "laptops": {"price": 1800, "unit": "piece"}
                }
            }
        });
        let mut updates = PriceUpdate::parse_payload(&payload).unwrap();
        updates.sort_by(|a, b| a.subcategory.cmp(&b.subcategory));

        assert_eq!(
            updates,
            vec![
                PriceUpdate {
                    category: "metal".to_string(),
                    subcategory: "iron".to_string(),
                    price: 27.5,
                    unit: "kg".to_string(),
                },
                PriceUpdate {
                    category: "electronics".to_string(),
                    subcategory: "laptops".to_string(),
                    price: 1800.0,
                    unit: "piece".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_payload_structure() {
        assert!(PriceUpdate::parse_payload(&json!({})).unwrap().is_empty());
        assert!(PriceUpdate::parse_payload(&json!({"prices": [1, 2]})).is_err());
        assert!(PriceUpdate::parse_payload(&json!({"prices": {"metal": 5}})).is_err());
        assert!(PriceUpdate::parse_payload(&json!({"prices": {"metal": {"iron": 5}}})).is_err());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (store, _guard) = create_test_connection_in_temporary_file().await.unwrap();
        store.init_schema().await.unwrap();

        assert_eq!(initialize_default_prices(&store).await.unwrap(), 17);
        assert_eq!(initialize_default_prices(&store).await.unwrap(), 0);

        let count: i64 = store.fetch_scalar(&prices::count_all()).await.unwrap();
        assert_eq!(count, 17);
    }

    #[tokio::test]
    async fn test_update_existing_pair_keeps_single_row() {
        let (store, _guard) = create_test_connection_in_temporary_file().await.unwrap();
        store.init_schema().await.unwrap();
        initialize_default_prices(&store).await.unwrap();

        let update = PriceUpdate {
            category: "metal".to_string(),
            subcategory: "iron".to_string(),
            price: 31.0,
            unit: "ton".to_string(),
        };
        assert_eq!(apply_price_updates(&store, &[update]).await.unwrap(), 1);

        let table = load_price_table(&store).await.unwrap();
        let iron = &table["metal"]["iron"];
        assert_eq!(iron.price, 31.0);
        assert_eq!(iron.unit, "ton");

        let count: i64 = store.fetch_scalar(&prices::count_all()).await.unwrap();
        assert_eq!(count, 17);
    }
}
