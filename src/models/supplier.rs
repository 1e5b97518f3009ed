use super::Item;
use crate::entities::{item, supplier};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A Supplier and the items it owns, in append order
#[derive(Clone, Debug, Eq, Serialize, Deserialize, Validate)]
pub struct Supplier {
    pub id: Option<i32>,
    #[validate(length(max = 64))]
    pub name: String,
    #[validate(length(max = 64))]
    pub email: String,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    pub date_joined: NaiveDate,
    pub items: Vec<Item>,
    /// Items as last read from or written to the store
    #[serde(skip)]
    loaded_items: Vec<Item>,
}

impl PartialEq for Supplier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.email == other.email
            && self.phone_number == other.phone_number
            && self.date_joined == other.date_joined
            && self.items == other.items
    }
}

impl Supplier {
    /// Builds an unsaved supplier; `date_joined` defaults to today (UTC).
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: Option<String>,
        date_joined: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            phone_number,
            date_joined: date_joined.unwrap_or_else(|| Utc::now().date_naive()),
            items: Vec::new(),
            loaded_items: Vec::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Appends `item` and links it to this supplier.
    ///
    /// Nothing is written until the supplier is created or updated.
    pub fn add_item(&mut self, mut item: Item) {
        item.supplier_id = self.id;
        self.items.push(item);
    }

    /// Assembles a supplier from its row and its item rows
    pub fn from_parts(model: supplier::Model, mut items: Vec<item::Model>) -> Self {
        items.sort_by_key(|item| item.id);
        let items: Vec<Item> = items.into_iter().map(Item::from).collect();
        Self {
            id: Some(model.id),
            name: model.name,
            email: model.email,
            phone_number: model.phone_number,
            date_joined: model.date_joined,
            loaded_items: items.clone(),
            items,
        }
    }

    /// Whether `item` differs from the copy last seen in the store
    pub(crate) fn item_changed(&self, item: &Item) -> bool {
        item.id.is_none() || !self.loaded_items.iter().any(|loaded| loaded == item)
    }

    /// Records the current items as the store's state
    pub(crate) fn mark_items_loaded(&mut self) {
        self.loaded_items = self.items.clone();
    }
}
