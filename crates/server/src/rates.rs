//! Exchange rates for displaying amounts in the preferred currency.
//!
//! Rates come from the Frankfurter API and are cached per base currency for a
//! fixed max age. Stored amounts are never converted; conversion is a display
//! concern.

use std::{
    collections::{BTreeMap, HashMap},
    str::FromStr,
    sync::Arc,
    time::Duration,
};

use api_types::rates::{Conversion, ConvertQuery, Rates, RatesQuery};
use axum::{
    Extension, Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use engine::{
    Currency, Decimal, ValidationError,
    money::{COST_SCALE, MAX_AMOUNT},
};
use reqwest::Url;
use rust_decimal::RoundingStrategy;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    HTTP_TIMEOUT, ServerError, currency_from_api, currency_to_api, identity::AuthUser,
    server::ServerState,
};

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate provider unreachable: {0}")]
    Unavailable(String),
    #[error("rate provider returned an invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for RateError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::InvalidResponse(value.to_string())
        } else {
            Self::Unavailable(value.to_string())
        }
    }
}

/// Units of each quoted currency per one unit of `base`.
#[derive(Clone, Debug, PartialEq)]
pub struct RateTable {
    pub base: Currency,
    pub fetched_at: DateTime<Utc>,
    pub rates: BTreeMap<String, Decimal>,
}

impl RateTable {
    /// Converts `amount` in the base currency into `to`.
    ///
    /// Returns `None` when the table has no quote for `to`.
    pub fn convert(&self, amount: Decimal, to: Currency) -> Option<Decimal> {
        if to == self.base {
            return Some(amount);
        }
        self.rates
            .get(to.code())
            .and_then(|rate| amount.checked_mul(*rate))
    }
}

#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    async fn latest(&self, base: Currency) -> Result<RateTable, RateError>;
}

/// <https://frankfurter.dev> client.
#[derive(Clone, Debug)]
pub struct Frankfurter {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct LatestResponse {
    rates: BTreeMap<String, Decimal>,
}

impl Frankfurter {
    pub fn new(base_url: &str) -> Result<Self, RateError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| RateError::InvalidResponse(format!("invalid base_url: {err}")))?;
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { base_url, http })
    }
}

#[async_trait::async_trait]
impl RateProvider for Frankfurter {
    async fn latest(&self, base: Currency) -> Result<RateTable, RateError> {
        let mut endpoint = self
            .base_url
            .join("v1/latest")
            .map_err(|err| RateError::InvalidResponse(format!("invalid base_url: {err}")))?;
        endpoint.set_query(Some(&format!("base={}", base.code())));

        let res = self.http.get(endpoint).send().await?;
        if !res.status().is_success() {
            return Err(RateError::Unavailable(format!(
                "latest rates returned {}",
                res.status()
            )));
        }
        let body = res.json::<LatestResponse>().await?;
        tracing::debug!(base = %base, quotes = body.rates.len(), "exchange rates fetched");

        Ok(RateTable {
            base,
            fetched_at: Utc::now(),
            rates: body.rates,
        })
    }
}

/// Serves tables younger than `max_age` from memory and asks the inner
/// provider otherwise.
pub struct RateCache {
    inner: Arc<dyn RateProvider>,
    max_age: Duration,
    tables: Mutex<HashMap<Currency, RateTable>>,
}

impl RateCache {
    pub fn new(inner: Arc<dyn RateProvider>, max_age: Duration) -> Self {
        Self {
            inner,
            max_age,
            tables: Mutex::new(HashMap::new()),
        }
    }

    fn is_fresh(&self, table: &RateTable, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(table.fetched_at)
            .to_std()
            .map(|age| age < self.max_age)
            .unwrap_or(true)
    }
}

#[async_trait::async_trait]
impl RateProvider for RateCache {
    async fn latest(&self, base: Currency) -> Result<RateTable, RateError> {
        if let Some(table) = self.tables.lock().await.get(&base)
            && self.is_fresh(table, Utc::now())
        {
            return Ok(table.clone());
        }

        // The cache lock is not held across the fetch.
        let table = self.inner.latest(base).await?;
        self.tables.lock().await.insert(base, table.clone());
        Ok(table)
    }
}

/// Latest rates for `?base=` (EUR when omitted).
pub async fn get_rates(
    Extension(_user): Extension<AuthUser>,
    State(state): State<ServerState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> Result<Json<Rates>, ServerError> {
    let Query(query) = query?;
    let table = state.rates.latest(currency_from_api(query.base)).await?;
    Ok(Json(Rates {
        base: currency_to_api(table.base),
        fetched_at: table.fetched_at,
        rates: table.rates,
    }))
}

/// `?amount=&from=&to=` converted with the latest `from` table, rounded to
/// cents.
pub async fn convert(
    Extension(_user): Extension<AuthUser>,
    State(state): State<ServerState>,
    query: Result<Query<ConvertQuery>, QueryRejection>,
) -> Result<Json<Conversion>, ServerError> {
    let Query(query) = query?;
    let amount = Decimal::from_str(query.amount.trim())
        .ok()
        .filter(|amount| !amount.is_sign_negative() || amount.is_zero())
        .ok_or_else(|| ValidationError::new("amount", "amount must be a non-negative number"))?;
    if amount > MAX_AMOUNT {
        return Err(ValidationError::new("amount", "amount is too large").into());
    }
    let to = currency_from_api(query.to);

    let table = state.rates.latest(currency_from_api(query.from)).await?;
    let converted = table
        .convert(amount, to)
        .ok_or_else(|| ValidationError::new("to", format!("No exchange rate for {to}")))?
        .round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointAwayFromZero);

    Ok(Json(Conversion {
        from: currency_to_api(table.base),
        to: query.to,
        amount: amount.abs(),
        converted,
        fetched_at: table.fetched_at,
    }))
}
