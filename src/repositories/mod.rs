use sea_orm::DatabaseConnection;

pub mod entity_store;

pub use entity_store::{EntityStore, Persistent};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}
