//! In-memory Supplier and Item records.
//!
//! These are the shapes the codec produces and the entity store persists.
//! A record with `id == None` has never been stored.

pub mod item;
pub mod supplier;

pub use item::Item;
pub use supplier::Supplier;
