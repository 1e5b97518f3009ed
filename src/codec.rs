//! Wire codec for suppliers and items.
//!
//! Decoding is explicit field-by-field extraction: every required key is
//! looked up in a fixed order and the first one missing is reported before
//! any value's type is checked. Decoding never assigns an id; that is the
//! store's job.

use crate::errors::{DataValidationError, EntityKind};
use crate::models::{item::normalize_price, Item, Supplier};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use validator::{Validate, ValidationError};

const ITEM_FIELDS: [&str; 5] = ["supplier_id", "sku", "name", "quantity", "price"];
const SUPPLIER_FIELDS: [&str; 4] = ["name", "email", "phone_number", "date_joined"];

/// `NUMERIC(10,2)` leaves eight integral digits
const PRICE_LIMIT: i64 = 100_000_000;

pub fn encode_item(item: &Item) -> Value {
    json!({
        "id": item.id,
        "supplier_id": item.supplier_id,
        "sku": item.sku,
        "name": item.name,
        "quantity": item.quantity,
        "price": normalize_price(item.price).to_string(),
    })
}

pub fn encode_supplier(supplier: &Supplier) -> Value {
    json!({
        "id": supplier.id,
        "name": supplier.name,
        "email": supplier.email,
        "phone_number": supplier.phone_number,
        "date_joined": supplier.date_joined.format("%Y-%m-%d").to_string(),
        "items": supplier.items.iter().map(encode_item).collect::<Vec<_>>(),
    })
}

/// Builds an unsaved Item from its wire form
pub fn decode_item(value: &Value) -> Result<Item, DataValidationError> {
    const ENTITY: EntityKind = EntityKind::Item;
    let data = as_object(ENTITY, value)?;

    let [supplier_id, sku, name, quantity, price_value] =
        require_all(ENTITY, data, ITEM_FIELDS)?;

    let supplier_id = match supplier_id {
        Value::Null => None,
        other => Some(integer(ENTITY, "supplier_id", other)?),
    };
    let sku = string(ENTITY, "sku", sku)?;
    let name = string(ENTITY, "name", name)?;
    let quantity = integer(ENTITY, "quantity", quantity)?;
    let price = price(price_value)?;

    let item = Item {
        id: None,
        supplier_id,
        sku,
        name,
        quantity,
        price,
    };
    check_constraints(ENTITY, &item, &ITEM_FIELDS)?;
    Ok(item)
}

/// Builds an unsaved Supplier, with any nested items, from its wire form
pub fn decode_supplier(value: &Value) -> Result<Supplier, DataValidationError> {
    const ENTITY: EntityKind = EntityKind::Supplier;
    let data = as_object(ENTITY, value)?;

    let [name, email, date_joined] =
        require_all(ENTITY, data, ["name", "email", "date_joined"])?;

    let name = string(ENTITY, "name", name)?;
    let email = string(ENTITY, "email", email)?;
    let date_joined = date(date_joined)?;
    let phone_number = match data.get("phone_number") {
        None | Some(Value::Null) => None,
        Some(other) => Some(string(ENTITY, "phone_number", other)?),
    };

    let items = match data.get("items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(elements)) => elements
            .iter()
            .map(decode_item)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(DataValidationError::InvalidField {
                entity: ENTITY,
                field: "items",
                reason: "must be an array".into(),
            })
        }
    };

    let mut supplier = Supplier::new(name, email, phone_number, Some(date_joined));
    supplier.items = items;
    check_constraints(ENTITY, &supplier, &SUPPLIER_FIELDS)?;
    Ok(supplier)
}

fn as_object(entity: EntityKind, value: &Value) -> Result<&Map<String, Value>, DataValidationError> {
    value
        .as_object()
        .ok_or(DataValidationError::MalformedBody { entity })
}

fn require<'a>(
    entity: EntityKind,
    data: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a Value, DataValidationError> {
    data.get(field)
        .ok_or(DataValidationError::MissingField { entity, field })
}

/// Looks up every required key before any value is inspected
fn require_all<'a, const N: usize>(
    entity: EntityKind,
    data: &'a Map<String, Value>,
    fields: [&'static str; N],
) -> Result<[&'a Value; N], DataValidationError> {
    let mut found = [&Value::Null; N];
    for (slot, field) in found.iter_mut().zip(fields) {
        *slot = require(entity, data, field)?;
    }
    Ok(found)
}

fn string(entity: EntityKind, field: &'static str, value: &Value) -> Result<String, DataValidationError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| invalid(entity, field, "must be a string"))
}

fn integer(entity: EntityKind, field: &'static str, value: &Value) -> Result<i32, DataValidationError> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| invalid(entity, field, "must be a 32-bit integer"))
}

fn price(value: &Value) -> Result<Decimal, DataValidationError> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return Err(invalid(EntityKind::Item, "price", "must be a number")),
    };

    let parsed = parse_decimal(&raw)
        .ok_or_else(|| invalid(EntityKind::Item, "price", "must be a decimal number"))?;

    let price = normalize_price(parsed);
    if price.abs() >= Decimal::from(PRICE_LIMIT) {
        return Err(invalid(
            EntityKind::Item,
            "price",
            "must be less than 100000000 in absolute value",
        ));
    }
    Ok(price)
}

/// Parses JSON number syntax. Scaling stops once the price limit is reached,
/// so oversized exponents cannot overflow.
fn parse_decimal(raw: &str) -> Option<Decimal> {
    let (mantissa, exponent) = match raw.find(|c: char| c == 'e' || c == 'E') {
        Some(at) => (&raw[..at], raw[at + 1..].parse::<i32>().ok()?),
        None => (raw, 0),
    };
    if !is_plain_decimal(mantissa) {
        return None;
    }

    let mut value = Decimal::from_str(mantissa).ok()?;
    let limit = Decimal::from(PRICE_LIMIT);
    if exponent > 0 {
        for _ in 0..exponent {
            if value.abs() >= limit {
                break;
            }
            value *= Decimal::TEN;
        }
    } else {
        for _ in 0..exponent.unsigned_abs().min(64) {
            if value.is_zero() {
                break;
            }
            value /= Decimal::TEN;
        }
    }
    Some(value)
}

fn is_plain_decimal(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    match unsigned.split_once('.') {
        Some((whole, fraction)) => digits(whole) && digits(fraction),
        None => digits(unsigned),
    }
}

fn date(value: &Value) -> Result<NaiveDate, DataValidationError> {
    let invalid_date = || DataValidationError::InvalidDate {
        entity: EntityKind::Supplier,
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    };

    value
        .as_str()
        .ok_or_else(invalid_date)?
        .parse::<NaiveDate>()
        .map_err(|_| invalid_date())
}

fn invalid(entity: EntityKind, field: &'static str, reason: &str) -> DataValidationError {
    DataValidationError::InvalidField {
        entity,
        field,
        reason: reason.to_owned(),
    }
}

/// Runs the record's `validator` rules and reports the first failing field in `order`
fn check_constraints<T: Validate>(
    entity: EntityKind,
    record: &T,
    order: &[&'static str],
) -> Result<(), DataValidationError> {
    let Err(errors) = record.validate() else {
        return Ok(());
    };
    let field_errors = errors.field_errors();
    let field = order
        .iter()
        .copied()
        .find(|field| field_errors.contains_key(field))
        .or_else(|| field_errors.keys().next().copied())
        .unwrap_or("record");
    let reason = field_errors
        .get(field)
        .and_then(|errs| errs.first())
        .map(describe)
        .unwrap_or_else(|| "is invalid".to_owned());

    Err(DataValidationError::InvalidField {
        entity,
        field,
        reason,
    })
}

fn describe(error: &ValidationError) -> String {
    match (&*error.code, error.params.get("max")) {
        ("length", Some(max)) => format!("must be at most {} characters", max),
        (code, _) => format!("is invalid ({})", code),
    }
}
