//! Storage, validation and statistics for utility usage entries.
//!
//! The [`Engine`] owns the store connection. Handlers validate raw input with
//! the [`validation`] module, call into the engine, and read results as the
//! typed records from [`stats`].

pub use currency::Currency;
pub use entries::{Entry, EntryFilter, NewEntry};
pub use error::{EngineError, ValidationError};
pub use ops::{Engine, EngineBuilder};
pub use preferences::CurrencyPreference;
pub use stats::{
    Breakdown, MonthlyRow, MonthlySeries, PeriodTotal, SortOrder, Statistics, Totals, TypeStat,
};
pub use unit_prices::UnitPriceSetting;
pub use utility_type::{TypeSet, UtilityType};

mod currency;
mod entries;
mod error;
pub mod money;
mod ops;
mod preferences;
pub mod stats;
mod unit_prices;
mod utility_type;
pub mod validation;

pub use rust_decimal::Decimal;

type ResultEngine<T> = Result<T, EngineError>;
