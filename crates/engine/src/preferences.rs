//! Per-owner display preferences.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::{Currency, EngineError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrencyPreference {
    pub owner_id: String,
    pub currency: Currency,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub owner_id: String,
    pub currency: String,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for CurrencyPreference {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let currency = Currency::try_from(model.currency.as_str()).map_err(|_| {
            EngineError::CorruptedRow(format!("invalid currency: {}", model.currency))
        })?;
        Ok(Self {
            owner_id: model.owner_id,
            currency,
            updated_at: model.updated_at,
        })
    }
}
