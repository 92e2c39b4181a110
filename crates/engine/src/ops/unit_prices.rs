use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, prelude::*, sea_query::OnConflict};

use crate::{EngineError, ResultEngine, UnitPriceSetting, UtilityType, money, unit_prices};

use super::Engine;

/// Inserts or replaces the owner's unit price for `kind`.
pub(super) async fn upsert_unit_price<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    kind: UtilityType,
    unit_price: Decimal,
) -> ResultEngine<()> {
    let model = unit_prices::ActiveModel {
        owner_id: ActiveValue::Set(owner_id.to_string()),
        kind: ActiveValue::Set(kind.as_str().to_string()),
        unit_price: ActiveValue::Set(money::to_stored(unit_price)),
        updated_at: ActiveValue::Set(Utc::now()),
    };
    unit_prices::Entity::insert(model)
        .on_conflict(
            OnConflict::columns([unit_prices::Column::OwnerId, unit_prices::Column::Kind])
                .update_columns([unit_prices::Column::UnitPrice, unit_prices::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

impl Engine {
    /// Returns the owner's last-used unit price for `kind`, if any.
    pub async fn unit_price(
        &self,
        owner_id: &str,
        kind: UtilityType,
    ) -> ResultEngine<Option<UnitPriceSetting>> {
        unit_prices::Entity::find()
            .filter(unit_prices::Column::OwnerId.eq(owner_id.to_string()))
            .filter(unit_prices::Column::Kind.eq(kind.as_str()))
            .one(self.db()?)
            .await?
            .map(UnitPriceSetting::try_from)
            .transpose()
    }

    /// Stores `unit_price` as the owner's price for `kind`, replacing any
    /// previous value.
    pub async fn set_unit_price(
        &self,
        owner_id: &str,
        kind: UtilityType,
        unit_price: Decimal,
    ) -> ResultEngine<UnitPriceSetting> {
        let db = self.db()?;
        upsert_unit_price(db, owner_id, kind, unit_price).await?;
        let key = (owner_id.to_string(), kind.as_str().to_string());
        let model = unit_prices::Entity::find_by_id(key)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("unit price".to_string()))?;
        UnitPriceSetting::try_from(model)
    }
}
