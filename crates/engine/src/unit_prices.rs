//! Last-used unit price per owner and utility type.
//!
//! Used to prefill the entry form. The table has one row per
//! `(owner_id, type)`; writes are upserts against that key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::{EngineError, UtilityType, money};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitPriceSetting {
    pub owner_id: String,
    pub kind: UtilityType,
    pub unit_price: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "utility_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "type")]
    pub kind: String,
    pub unit_price: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for UnitPriceSetting {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: UtilityType::try_from(model.kind.as_str())?,
            unit_price: money::from_stored("unit_price", &model.unit_price)?,
            owner_id: model.owner_id,
            updated_at: model.updated_at,
        })
    }
}
