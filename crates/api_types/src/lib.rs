//! JSON bodies exchanged with the HTTP API.
//!
//! Amounts travel as JSON numbers; dates as `YYYY-MM-DD` strings.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Chf,
    Pln,
    Czk,
    Sek,
    Nok,
    Dkk,
    Huf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilityType {
    Electricity,
    Water,
    Fuel,
}

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod entry {
    use super::*;

    /// Create request. Send either `unit_price` or `cost_amount`; when both
    /// are present the cost is derived from the unit price.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryNew {
        #[serde(rename = "type")]
        pub kind: UtilityType,
        pub usage_amount: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub unit_price: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub cost_amount: Option<Decimal>,
        pub unit: String,
        pub date: NaiveDate,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Entry {
        pub id: Uuid,
        pub owner_id: String,
        #[serde(rename = "type")]
        pub kind: UtilityType,
        pub usage_amount: Decimal,
        pub unit_price: Option<Decimal>,
        pub cost_amount: Decimal,
        pub unit: String,
        pub date: NaiveDate,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntryDeleted {
        pub message: String,
    }
}

pub mod stats {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Totals {
        pub entry_count: u64,
        pub total_usage: Decimal,
        pub total_cost: Decimal,
        pub avg_usage: Decimal,
        pub avg_cost: Decimal,
        pub first_entry: Option<NaiveDate>,
        pub last_entry: Option<NaiveDate>,
    }

    /// Totals of one utility type; the totals fields sit beside `type`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TypeTotals {
        #[serde(rename = "type")]
        pub kind: UtilityType,
        #[serde(flatten)]
        pub totals: Totals,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MonthlyRow {
        pub month: String,
        pub entry_count: u64,
        pub total_cost: Decimal,
        pub total_usage: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Statistics {
        pub totals: Totals,
        #[serde(rename = "byType")]
        pub by_type: Vec<TypeTotals>,
        pub monthly: Vec<MonthlyRow>,
    }

    /// Ordering of the monthly series, `asc` by default.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Order {
        #[default]
        #[serde(rename = "asc")]
        Ascending,
        #[serde(rename = "desc")]
        Descending,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatsQuery {
        #[serde(default)]
        pub order: Order,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MonthTotal {
        /// `YYYY-MM`
        pub month: String,
        pub total: Decimal,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct DayTotal {
        /// `YYYY-MM-DD`
        pub date: String,
        pub total: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Breakdown {
        pub monthly: Vec<MonthTotal>,
        pub daily: Vec<DayTotal>,
    }
}

pub mod settings {
    use super::*;

    /// Last-used unit price for a type, `null` when never set.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnitPrice {
        pub unit_price: Option<Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnitPriceUpdate {
        pub unit_price: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnitPriceSetting {
        pub owner_id: String,
        #[serde(rename = "type")]
        pub kind: UtilityType,
        pub unit_price: Decimal,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod preferences {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyChoice {
        pub currency: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyPreference {
        pub owner_id: String,
        pub currency: Currency,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod user {
    use super::*;

    /// Register and login request.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct User {
        pub id: String,
        pub email: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Session {
        pub user: User,
        pub token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Me {
        pub user: User,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
        /// `connected` or `not configured`
        pub database: String,
    }
}

pub mod rates {
    use std::collections::BTreeMap;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RatesQuery {
        #[serde(default)]
        pub base: Currency,
    }

    /// Units of each quoted currency per one unit of `base`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Rates {
        pub base: Currency,
        pub fetched_at: DateTime<Utc>,
        pub rates: BTreeMap<String, Decimal>,
    }

    /// `amount` stays text in the query string and is parsed by the server.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConvertQuery {
        pub amount: String,
        #[serde(default)]
        pub from: Currency,
        pub to: Currency,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Conversion {
        pub from: Currency,
        pub to: Currency,
        pub amount: Decimal,
        pub converted: Decimal,
        pub fetched_at: DateTime<Utc>,
    }
}
