use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Entry, EntryFilter, NewEntry, EngineError, ResultEngine, entries};

use super::{Engine, unit_prices::upsert_unit_price, with_tx};

impl Engine {
    /// Stores a new entry for `owner_id`.
    ///
    /// When the entry carries a unit price, the owner's last-used price for
    /// that utility type is updated in the same transaction.
    pub async fn create_entry(&self, owner_id: &str, new: NewEntry) -> ResultEngine<Entry> {
        let entry = Entry::new(owner_id, new);
        with_tx!(self, |db_tx| {
            entries::ActiveModel::from(&entry).insert(&db_tx).await?;
            if let Some(price) = entry.unit_price {
                upsert_unit_price(&db_tx, owner_id, entry.kind, price).await?;
            }
            tracing::debug!(owner_id, entry_id = %entry.id, kind = %entry.kind, "entry created");
            Ok(entry)
        })
    }

    /// Lists the owner's entries, newest date first. Ties are broken by
    /// creation time, newest first.
    pub async fn list_entries(
        &self,
        owner_id: &str,
        filter: &EntryFilter,
    ) -> ResultEngine<Vec<Entry>> {
        let mut query =
            entries::Entity::find().filter(entries::Column::OwnerId.eq(owner_id.to_string()));
        if let Some(kind) = filter.kind {
            query = query.filter(entries::Column::Kind.eq(kind.as_str()));
        }
        if let Some(from) = filter.from {
            query = query.filter(entries::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(entries::Column::Date.lte(to));
        }

        let models = query
            .order_by_desc(entries::Column::Date)
            .order_by_desc(entries::Column::CreatedAt)
            .all(self.db()?)
            .await?;
        models.into_iter().map(Entry::try_from).collect()
    }

    /// Deletes an entry owned by `owner_id` and returns it.
    ///
    /// An id that does not exist and an id owned by someone else are both
    /// reported as not found.
    pub async fn delete_entry(&self, owner_id: &str, entry_id: Uuid) -> ResultEngine<Entry> {
        with_tx!(self, |db_tx| {
            let model = entries::Entity::find_by_id(entry_id)
                .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("Entry".to_string()))?;

            let res = entries::Entity::delete_many()
                .filter(entries::Column::Id.eq(entry_id))
                .filter(entries::Column::OwnerId.eq(owner_id.to_string()))
                .exec(&db_tx)
                .await?;
            if res.rows_affected != 1 {
                return Err(EngineError::KeyNotFound("Entry".to_string()));
            }

            tracing::debug!(owner_id, %entry_id, "entry deleted");
            Entry::try_from(model)
        })
    }
}
