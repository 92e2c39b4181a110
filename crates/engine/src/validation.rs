//! Request validation shared by every endpoint that writes or filters data.
//!
//! Validation is a short-circuiting pipeline: fields are checked in a fixed
//! order and the first failing one is reported as a [`ValidationError`].
//! For entry creation the order is `type`, `usage_amount`,
//! `unit_price`/`cost_amount`, `unit`, `date`.
//!
//! Inputs are kept as raw JSON values so that a wrongly typed field is
//! reported against that field, in order, instead of failing the whole body.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{Currency, EntryFilter, NewEntry, TypeSet, UtilityType, ValidationError, money};

static DATE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").ok());
static YEAR_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[0-9]{4}$").ok());
static MONTH_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{1,2}$").ok());

fn matches(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

type Validated<T> = Result<T, ValidationError>;

/// Body of an entry creation request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntryInput {
    #[serde(rename = "type")]
    pub kind: Option<Value>,
    pub usage_amount: Option<Value>,
    pub unit_price: Option<Value>,
    pub cost_amount: Option<Value>,
    pub unit: Option<Value>,
    pub date: Option<Value>,
}

impl EntryInput {
    /// Checks every field in order and derives the cost when a unit price is
    /// given. `unit_price` wins over `cost_amount` when both are present.
    pub fn validate(&self, types: &TypeSet) -> Validated<NewEntry> {
        let kind = utility_type(types, "type", present(&self.kind))?;
        let usage_amount = amount("usage_amount", present(&self.usage_amount))?;

        enum Cost {
            Derived(Decimal),
            Given(Decimal),
        }
        let cost = match (present(&self.unit_price), present(&self.cost_amount)) {
            (Some(price), _) => Cost::Derived(money::non_negative("unit_price", price)?),
            (None, Some(cost)) => Cost::Given(money::non_negative("cost_amount", cost)?),
            (None, None) => {
                return Err(ValidationError::new(
                    "unit_price",
                    "unit_price or cost_amount is required",
                ));
            }
        };

        let unit = unit(present(&self.unit))?;
        let date = date_value("date", present(&self.date))?;

        match cost {
            Cost::Derived(price) => NewEntry::priced(kind, usage_amount, price, unit, date),
            Cost::Given(cost) => Ok(NewEntry::costed(kind, usage_amount, cost, unit, date)),
        }
    }
}

/// Query string of an entry listing request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl EntryQuery {
    /// Each filter is optional and validated on its own; empty values count
    /// as absent. `from` must not be after `to`.
    pub fn validate(&self, types: &TypeSet) -> Validated<EntryFilter> {
        let kind = non_empty(&self.kind)
            .map(|label| types.parse("type", label))
            .transpose()?;
        let from = non_empty(&self.from)
            .map(|value| parse_date("from", value))
            .transpose()?;
        let to = non_empty(&self.to)
            .map(|value| parse_date("to", value))
            .transpose()?;

        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(ValidationError::new("from", "from must not be after to"));
        }

        Ok(EntryFilter { kind, from, to })
    }
}

/// Query string of a yearly breakdown request.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BreakdownQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

/// A validated breakdown request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BreakdownRequest {
    pub kind: UtilityType,
    pub year: i32,
    pub month: Option<u32>,
}

impl BreakdownQuery {
    pub fn validate(&self, types: &TypeSet, kind: &str) -> Validated<BreakdownRequest> {
        let kind = types.parse("type", kind)?;

        let year = self
            .year
            .as_deref()
            .filter(|year| matches(&YEAR_PATTERN, year))
            .and_then(|year| year.parse::<i32>().ok())
            .ok_or_else(|| {
                ValidationError::new("year", "year is required and must be a valid 4-digit year")
            })?;

        let month = non_empty(&self.month).map(parse_month).transpose()?;

        Ok(BreakdownRequest { kind, year, month })
    }
}

/// Body of a unit price update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct UnitPriceInput {
    pub unit_price: Option<Value>,
}

impl UnitPriceInput {
    pub fn validate(&self) -> Validated<Decimal> {
        amount("unit_price", present(&self.unit_price))
    }
}

/// Body of a currency preference update.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CurrencyInput {
    pub currency: Option<Value>,
}

impl CurrencyInput {
    pub fn validate(&self) -> Validated<Currency> {
        match present(&self.currency) {
            Some(Value::String(code)) => Currency::try_from(code.as_str()),
            // reuse the enumerated-set message for missing or non-string values
            _ => Currency::try_from(""),
        }
    }
}

/// Parses a path type label against the deployment's set.
pub fn path_type(types: &TypeSet, label: &str) -> Validated<UtilityType> {
    types.parse("type", label)
}

/// Accepts only the canonical hyphenated UUID form.
pub fn entry_id(value: &str) -> Validated<Uuid> {
    let invalid = || ValidationError::new("id", "Entry ID must be a valid UUID");
    if value.len() != 36 {
        return Err(invalid());
    }
    Uuid::parse_str(value).map_err(|_| invalid())
}

/// `YYYY-MM-DD` that is also a real calendar date.
pub fn parse_date(field: &'static str, value: &str) -> Validated<NaiveDate> {
    let invalid = || {
        ValidationError::new(field, format!("{field} must be a valid date in YYYY-MM-DD format"))
    };
    if !matches(&DATE_PATTERN, value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())
}

fn parse_month(value: &str) -> Validated<u32> {
    Some(value)
        .filter(|month| matches(&MONTH_PATTERN, month))
        .and_then(|month| month.parse::<u32>().ok())
        .filter(|month| (1..=12).contains(month))
        .ok_or_else(|| ValidationError::new("month", "month must be a number between 1 and 12"))
}

/// `null` is treated like a missing field.
fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn utility_type(
    types: &TypeSet,
    field: &'static str,
    value: Option<&Value>,
) -> Validated<UtilityType> {
    match value {
        Some(Value::String(label)) => types.parse(field, label),
        _ => types.parse(field, ""),
    }
}

fn amount(field: &'static str, value: Option<&Value>) -> Validated<Decimal> {
    let value = value.ok_or_else(|| ValidationError::new(field, format!("{field} is required")))?;
    money::non_negative(field, value)
}

fn unit(value: Option<&Value>) -> Validated<String> {
    match value {
        Some(Value::String(unit)) if !unit.trim().is_empty() => Ok(unit.trim().to_string()),
        _ => Err(ValidationError::new("unit", "unit must be a non-empty string")),
    }
}

fn date_value(field: &'static str, value: Option<&Value>) -> Validated<NaiveDate> {
    match value {
        Some(Value::String(date)) => parse_date(field, date),
        _ => Err(ValidationError::new(
            field,
            format!("{field} must be a valid date in YYYY-MM-DD format"),
        )),
    }
}
