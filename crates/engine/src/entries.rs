//! Utility usage entries.
//!
//! An [`Entry`] records how much of a utility was consumed on a given day and
//! what it cost. Entries are created once and never edited; the only other
//! lifecycle step is an owner-scoped hard delete.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, UtilityType, ValidationError,
    money::{self, cost_of},
};

/// A validated entry that has not been stored yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewEntry {
    pub kind: UtilityType,
    pub usage_amount: Decimal,
    pub unit_price: Option<Decimal>,
    pub cost_amount: Decimal,
    pub unit: String,
    pub date: NaiveDate,
}

impl NewEntry {
    /// Builds an entry whose cost is derived from `usage_amount * unit_price`.
    pub fn priced(
        kind: UtilityType,
        usage_amount: Decimal,
        unit_price: Decimal,
        unit: String,
        date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let cost_amount = cost_of(usage_amount, unit_price)
            .ok_or_else(|| ValidationError::new("unit_price", "cost_amount is too large"))?;
        Ok(Self {
            kind,
            usage_amount,
            unit_price: Some(unit_price),
            cost_amount,
            unit,
            date,
        })
    }

    /// Builds an entry with an explicitly supplied cost.
    pub fn costed(
        kind: UtilityType,
        usage_amount: Decimal,
        cost_amount: Decimal,
        unit: String,
        date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            usage_amount,
            unit_price: None,
            cost_amount,
            unit,
            date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub id: Uuid,
    pub owner_id: String,
    pub kind: UtilityType,
    pub usage_amount: Decimal,
    pub unit_price: Option<Decimal>,
    pub cost_amount: Decimal,
    pub unit: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(owner_id: &str, new: NewEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            kind: new.kind,
            usage_amount: new.usage_amount,
            unit_price: new.unit_price,
            cost_amount: new.cost_amount,
            unit: new.unit,
            date: new.date,
            created_at: Utc::now(),
        }
    }
}

/// Listing filters. Both date bounds are inclusive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub kind: Option<UtilityType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "utility_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub usage_amount: String,
    pub unit_price: Option<String>,
    pub cost_amount: String,
    pub unit: String,
    pub date: Date,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entry> for ActiveModel {
    fn from(entry: &Entry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id),
            owner_id: ActiveValue::Set(entry.owner_id.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            usage_amount: ActiveValue::Set(money::to_stored(entry.usage_amount)),
            unit_price: ActiveValue::Set(entry.unit_price.map(money::to_stored)),
            cost_amount: ActiveValue::Set(money::to_stored(entry.cost_amount)),
            unit: ActiveValue::Set(entry.unit.clone()),
            date: ActiveValue::Set(entry.date),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for Entry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: UtilityType::try_from(model.kind.as_str())?,
            usage_amount: money::from_stored("usage_amount", &model.usage_amount)?,
            unit_price: model
                .unit_price
                .as_deref()
                .map(|price| money::from_stored("unit_price", price))
                .transpose()?,
            cost_amount: money::from_stored("cost_amount", &model.cost_amount)?,
            owner_id: model.owner_id,
            unit: model.unit,
            date: model.date,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn priced_entry_derives_cost() {
        let entry = NewEntry::priced(
            UtilityType::Water,
            Decimal::new(12, 0),
            Decimal::new(25, 1),
            "m³".to_string(),
            march_15(),
        )
        .unwrap();

        assert_eq!(entry.cost_amount, Decimal::new(3000, 2));
        assert_eq!(entry.unit_price, Some(Decimal::new(25, 1)));
    }

    #[test]
    fn model_round_trip_keeps_every_field() {
        let entry = Entry::new(
            "alice",
            NewEntry::costed(
                UtilityType::Fuel,
                Decimal::new(4012, 2),
                Decimal::new(7133, 2),
                "L".to_string(),
                march_15(),
            ),
        );

        let active = ActiveModel::from(&entry);
        let model = Model {
            id: active.id.unwrap(),
            owner_id: active.owner_id.unwrap(),
            kind: active.kind.unwrap(),
            usage_amount: active.usage_amount.unwrap(),
            unit_price: active.unit_price.unwrap(),
            cost_amount: active.cost_amount.unwrap(),
            unit: active.unit.unwrap(),
            date: active.date.unwrap(),
            created_at: active.created_at.unwrap(),
        };

        assert_eq!(Entry::try_from(model).unwrap(), entry);
    }

    #[test]
    fn unknown_stored_type_is_reported() {
        let model = Model {
            id: Uuid::new_v4(),
            owner_id: "alice".to_string(),
            kind: "gas".to_string(),
            usage_amount: "1".to_string(),
            unit_price: None,
            cost_amount: "1".to_string(),
            unit: "m³".to_string(),
            date: march_15(),
            created_at: Utc::now(),
        };

        assert!(matches!(
            Entry::try_from(model),
            Err(EngineError::CorruptedRow(_))
        ));
    }
}
