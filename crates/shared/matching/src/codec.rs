//! Mapping between domain records and their stored form.
//!
//! Resting orders are hashes of string fields; trades are JSON documents.

use chrono::{DateTime, SecondsFormat};
use matchbook_core::{OrderId, Price, Quantity, RestingOrder, Side, Trade};
use matchbook_ports::{StorageError, StorageResult};
use std::collections::HashMap;
use std::str::FromStr;

pub(crate) const FIELD_SIDE: &str = "side";
pub(crate) const FIELD_QUANTITY: &str = "qty";
pub(crate) const FIELD_PRICE: &str = "price";
pub(crate) const FIELD_TRADER: &str = "trader_id";
pub(crate) const FIELD_TIMESTAMP: &str = "timestamp";
pub(crate) const FIELD_ORDER_ID: &str = "order_id";

pub(crate) fn encode_order(order: &RestingOrder) -> Vec<(String, String)> {
    vec![
        (FIELD_SIDE.to_string(), order.side.as_str().to_string()),
        (FIELD_QUANTITY.to_string(), order.quantity.to_string()),
        (FIELD_PRICE.to_string(), order.price.to_key()),
        (FIELD_TRADER.to_string(), order.trader_id.clone()),
        (
            FIELD_TIMESTAMP.to_string(),
            order.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
        (FIELD_ORDER_ID.to_string(), order.order_id.to_string()),
    ]
}

/// Rebuild a resting order from its hash record stored at `key`
pub(crate) fn decode_order(key: &str, fields: &HashMap<String, String>) -> StorageResult<RestingOrder> {
    let field = |name: &str| {
        fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| StorageError::corrupted(key, format!("missing field {name}")))
    };
    let parse_err = |name: &str, err: &dyn std::fmt::Display| {
        StorageError::corrupted(key, format!("invalid {name}: {err}"))
    };

    let side = Side::try_from(field(FIELD_SIDE)?).map_err(|e| parse_err(FIELD_SIDE, &e))?;
    let quantity =
        Quantity::from_str(field(FIELD_QUANTITY)?).map_err(|e| parse_err(FIELD_QUANTITY, &e))?;
    let price = Price::from_str(field(FIELD_PRICE)?).map_err(|e| parse_err(FIELD_PRICE, &e))?;
    let timestamp = DateTime::parse_from_rfc3339(field(FIELD_TIMESTAMP)?)
        .map_err(|e| parse_err(FIELD_TIMESTAMP, &e))?
        .to_utc();
    let order_id =
        OrderId::from_str(field(FIELD_ORDER_ID)?).map_err(|e| parse_err(FIELD_ORDER_ID, &e))?;

    Ok(RestingOrder {
        order_id,
        side,
        quantity,
        price,
        trader_id: field(FIELD_TRADER)?.to_string(),
        timestamp,
    })
}

pub(crate) fn encode_trade(key: &str, trade: &Trade) -> StorageResult<String> {
    serde_json::to_string(trade)
        .map_err(|e| StorageError::corrupted(key, format!("cannot encode trade: {e}")))
}

pub(crate) fn decode_trade(key: &str, raw: &str) -> StorageResult<Trade> {
    serde_json::from_str(raw)
        .map_err(|e| StorageError::corrupted(key, format!("cannot decode trade: {e}")))
}
