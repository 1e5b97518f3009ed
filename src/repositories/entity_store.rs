use async_trait::async_trait;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::entities::{item, supplier};
use crate::errors::{EntityKind, ServiceError};
use crate::models::{Item, Supplier};
use crate::repositories::Repository;

const STORE_WRITES: &str = "supplier_service_store_writes_total";

/// A record type the [`EntityStore`] knows how to persist.
///
/// Write methods receive the connection to run on, which is a transaction
/// when called from the store. Implementations must not touch any other
/// connection while it is open.
#[async_trait]
pub trait Persistent: Clone + Send + Sync + Sized {
    const KIND: EntityKind;

    fn id(&self) -> Option<i32>;

    /// Inserts the record, ignoring any id it carries, and writes the new ids back into `self`
    async fn insert<C>(&mut self, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait;

    /// Writes the in-memory state over the row identified by `id`
    async fn save<C>(&mut self, id: i32, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait;

    /// Deletes the row; returns how many rows went away
    async fn remove<C>(id: i32, conn: &C) -> Result<u64, ServiceError>
    where
        C: ConnectionTrait;

    async fn fetch(db: &DatabaseConnection, id: i32) -> Result<Option<Self>, ServiceError>;

    async fn fetch_all(db: &DatabaseConnection) -> Result<Vec<Self>, ServiceError>;
}

/// Persistent home of suppliers and their items
#[derive(Debug, Clone)]
pub struct EntityStore {
    db: Arc<DatabaseConnection>,
}

impl Repository for EntityStore {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl EntityStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persists a new record and assigns its id.
    ///
    /// A supplier's pre-populated items go in the same transaction. `record`
    /// only receives ids once the transaction has committed.
    #[instrument(skip(self, record), fields(entity = T::KIND.as_str()))]
    pub async fn create<T: Persistent>(&self, record: &mut T) -> Result<(), ServiceError> {
        info!("Creating {}", T::KIND);
        let mut staged = record.clone();

        let txn = self.db.begin().await?;
        staged.insert(&txn).await?;
        txn.commit().await?;

        *record = staged;
        counter!(STORE_WRITES, 1, "op" => "create", "entity" => T::KIND.as_str());
        info!(id = ?record.id(), "{} created", T::KIND);
        Ok(())
    }

    /// Flushes an already-created record, inserting children appended since the last write
    #[instrument(skip(self, record), fields(entity = T::KIND.as_str(), id = ?record.id()))]
    pub async fn update<T: Persistent>(&self, record: &mut T) -> Result<(), ServiceError> {
        let id = record.id().ok_or(ServiceError::NotPersisted(T::KIND))?;
        info!("Updating {} {}", T::KIND, id);
        let mut staged = record.clone();

        let txn = self.db.begin().await?;
        staged.save(id, &txn).await?;
        txn.commit().await?;

        *record = staged;
        counter!(STORE_WRITES, 1, "op" => "update", "entity" => T::KIND.as_str());
        Ok(())
    }

    /// Removes the record; a supplier's items go with it through the foreign-key cascade
    #[instrument(skip(self, record), fields(entity = T::KIND.as_str(), id = ?record.id()))]
    pub async fn delete<T: Persistent>(&self, record: &T) -> Result<(), ServiceError> {
        let id = record.id().ok_or(ServiceError::NotPersisted(T::KIND))?;
        info!("Deleting {} {}", T::KIND, id);

        let removed = T::remove(id, self.get_db()).await?;
        if removed == 0 {
            debug!("{} {} was already gone", T::KIND, id);
        }
        counter!(STORE_WRITES, 1, "op" => "delete", "entity" => T::KIND.as_str());
        Ok(())
    }

    #[instrument(skip(self), fields(entity = T::KIND.as_str()))]
    pub async fn find_by_id<T: Persistent>(&self, id: i32) -> Result<Option<T>, ServiceError> {
        debug!("Processing lookup for id {}", id);
        T::fetch(self.get_db(), id).await
    }

    #[instrument(skip(self), fields(entity = T::KIND.as_str()))]
    pub async fn all<T: Persistent>(&self) -> Result<Vec<T>, ServiceError> {
        debug!("Processing all {} records", T::KIND);
        T::fetch_all(self.get_db()).await
    }

    /// Suppliers whose name matches exactly, with their items
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Vec<Supplier>, ServiceError> {
        debug!("Processing name query for {}", name);
        let rows = supplier::Entity::find()
            .filter(supplier::Column::Name.eq(name))
            .order_by_asc(supplier::Column::Id)
            .find_with_related(item::Entity)
            .all(self.get_db())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(model, items)| Supplier::from_parts(model, items))
            .collect())
    }

    /// Items owned by `supplier_id`, in append order
    #[instrument(skip(self))]
    pub async fn items_of(&self, supplier_id: i32) -> Result<Vec<Item>, ServiceError> {
        let rows = item_rows_of(self.get_db(), supplier_id).await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }
}

async fn item_rows_of<C: ConnectionTrait>(
    conn: &C,
    supplier_id: i32,
) -> Result<Vec<item::Model>, DbErr> {
    item::Entity::find()
        .filter(item::Column::SupplierId.eq(supplier_id))
        .order_by_asc(item::Column::Id)
        .all(conn)
        .await
}

/// `RecordNotUpdated` means the row vanished underneath us
fn missing_row(kind: EntityKind, id: i32) -> impl FnOnce(DbErr) -> ServiceError {
    move |err| match err {
        DbErr::RecordNotUpdated => ServiceError::NotFound(format!("{} with id {}", kind, id)),
        other => ServiceError::DatabaseError(other),
    }
}

async fn ensure_supplier_exists<C: ConnectionTrait>(
    conn: &C,
    supplier_id: Option<i32>,
) -> Result<i32, ServiceError> {
    let supplier_id = supplier_id.ok_or_else(|| {
        ServiceError::InvalidReference("Item is not attached to a supplier".to_string())
    })?;
    if supplier::Entity::find_by_id(supplier_id)
        .one(conn)
        .await?
        .is_none()
    {
        return Err(ServiceError::InvalidReference(format!(
            "Supplier with id {} does not exist",
            supplier_id
        )));
    }
    Ok(supplier_id)
}

fn item_active_model(item: &Item, supplier_id: i32) -> item::ActiveModel {
    item::ActiveModel {
        id: item.id.map(Set).unwrap_or(NotSet),
        supplier_id: Set(supplier_id),
        sku: Set(item.sku.clone()),
        name: Set(item.name.clone()),
        quantity: Set(item.quantity),
        price: Set(item.price),
    }
}

async fn insert_item_row<C: ConnectionTrait>(
    conn: &C,
    item: &mut Item,
    supplier_id: i32,
) -> Result<(), ServiceError> {
    item.id = None;
    let model = item_active_model(item, supplier_id).insert(conn).await?;
    item.id = Some(model.id);
    item.supplier_id = Some(supplier_id);
    Ok(())
}

async fn update_item_row<C: ConnectionTrait>(
    conn: &C,
    item: &mut Item,
    id: i32,
    supplier_id: i32,
) -> Result<(), ServiceError> {
    item.id = Some(id);
    item.supplier_id = Some(supplier_id);
    item_active_model(item, supplier_id)
        .update(conn)
        .await
        .map_err(missing_row(EntityKind::Item, id))?;
    Ok(())
}

#[async_trait]
impl Persistent for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> Option<i32> {
        self.id
    }

    async fn insert<C>(&mut self, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let supplier_id = ensure_supplier_exists(conn, self.supplier_id).await?;
        insert_item_row(conn, self, supplier_id).await
    }

    async fn save<C>(&mut self, id: i32, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let supplier_id = ensure_supplier_exists(conn, self.supplier_id).await?;
        update_item_row(conn, self, id, supplier_id).await
    }

    async fn remove<C>(id: i32, conn: &C) -> Result<u64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = item::Entity::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected)
    }

    async fn fetch(db: &DatabaseConnection, id: i32) -> Result<Option<Self>, ServiceError> {
        let row = item::Entity::find_by_id(id).one(db).await?;
        Ok(row.map(Item::from))
    }

    async fn fetch_all(db: &DatabaseConnection) -> Result<Vec<Self>, ServiceError> {
        let rows = item::Entity::find()
            .order_by_asc(item::Column::Id)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }
}

#[async_trait]
impl Persistent for Supplier {
    const KIND: EntityKind = EntityKind::Supplier;

    fn id(&self) -> Option<i32> {
        self.id
    }

    async fn insert<C>(&mut self, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let model = supplier::ActiveModel {
            id: NotSet,
            name: Set(self.name.clone()),
            email: Set(self.email.clone()),
            phone_number: Set(self.phone_number.clone()),
            date_joined: Set(self.date_joined),
        }
        .insert(conn)
        .await?;

        self.id = Some(model.id);
        for item in self.items.iter_mut() {
            insert_item_row(conn, item, model.id).await?;
        }
        self.mark_items_loaded();
        debug!(items = self.items.len(), "supplier rows written");
        Ok(())
    }

    async fn save<C>(&mut self, id: i32, conn: &C) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        supplier::ActiveModel {
            id: Set(id),
            name: Set(self.name.clone()),
            email: Set(self.email.clone()),
            phone_number: Set(self.phone_number.clone()),
            date_joined: Set(self.date_joined),
        }
        .update(conn)
        .await
        .map_err(missing_row(EntityKind::Supplier, id))?;

        let mut written = 0;
        for index in 0..self.items.len() {
            if !self.item_changed(&self.items[index]) {
                continue;
            }
            let item = &mut self.items[index];
            match item.id {
                Some(item_id) => update_item_row(conn, item, item_id, id).await?,
                None => insert_item_row(conn, item, id).await?,
            }
            written += 1;
        }
        self.mark_items_loaded();
        debug!(items = written, "supplier item rows written");
        Ok(())
    }

    async fn remove<C>(id: i32, conn: &C) -> Result<u64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = supplier::Entity::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected)
    }

    async fn fetch(db: &DatabaseConnection, id: i32) -> Result<Option<Self>, ServiceError> {
        let Some(model) = supplier::Entity::find_by_id(id).one(db).await? else {
            return Ok(None);
        };
        let items = item_rows_of(db, id).await?;
        Ok(Some(Supplier::from_parts(model, items)))
    }

    async fn fetch_all(db: &DatabaseConnection) -> Result<Vec<Self>, ServiceError> {
        let rows = supplier::Entity::find()
            .order_by_asc(supplier::Column::Id)
            .find_with_related(item::Entity)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(model, items)| Supplier::from_parts(model, items))
            .collect())
    }
}
