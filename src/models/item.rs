use crate::entities::item;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Fractional digits kept for prices (`NUMERIC(10,2)`)
pub const PRICE_SCALE: u32 = 2;

/// An Item a supplier stocks
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Item {
    pub id: Option<i32>,
    /// `None` until the item is attached to a persisted supplier
    pub supplier_id: Option<i32>,
    #[validate(length(max = 12))]
    pub sku: String,
    #[validate(length(max = 64))]
    pub name: String,
    /// Minimum order quantity
    pub quantity: i32,
    pub price: Decimal,
}

impl Item {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, quantity: i32, price: Decimal) -> Self {
        Self {
            id: None,
            supplier_id: None,
            sku: sku.into(),
            name: name.into(),
            quantity,
            price: normalize_price(price),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// Rounds half away from zero to two places and pins the scale so `12.5` and `12.50` render alike.
pub fn normalize_price(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(PRICE_SCALE);
    rounded
}

impl From<item::Model> for Item {
    fn from(model: item::Model) -> Self {
        Self {
            id: Some(model.id),
            supplier_id: Some(model.supplier_id),
            sku: model.sku,
            name: model.name,
            quantity: model.quantity,
            price: normalize_price(model.price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_item_is_unsaved_and_unattached() {
        let item = Item::new("ABC0001", "Hat", 10, Decimal::from_str("12.5").unwrap());
        assert!(!item.is_persisted());
        assert_eq!(item.supplier_id, None);
        assert_eq!(item.price.to_string(), "12.50");
    }

    #[test]
    fn prices_round_half_away_from_zero() {
        assert_eq!(normalize_price(Decimal::from_str("1.005").unwrap()).to_string(), "1.01");
        assert_eq!(normalize_price(Decimal::from_str("-1.005").unwrap()).to_string(), "-1.01");
        assert_eq!(normalize_price(Decimal::from_str("3").unwrap()).to_string(), "3.00");
    }

    #[test]
    fn sku_longer_than_column_fails_validation() {
        let item = Item::new("ABCDEFGHIJKLM", "Hat", 1, Decimal::ONE);
        let errors = item.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("sku"));
    }
}
