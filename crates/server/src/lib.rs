use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, ValidationError};
use std::time::Duration;

use serde::Serialize;
pub use identity::{
    AuthSession, AuthUser, IdentityError, IdentityProvider, StaticIdentity, SupabaseIdentity,
};
pub use rates::{Frankfurter, RateCache, RateError, RateProvider, RateTable};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod entries;
mod health;
mod identity;
mod preferences;
mod rates;
mod server;
mod settings;
mod statistics;
mod user;

pub mod types {
    pub mod entry {
        pub use api_types::entry::{Entry, EntryDeleted, EntryNew};
    }

    pub mod stats {
        pub use api_types::stats::{
            Breakdown, DayTotal, MonthTotal, MonthlyRow, Order, Statistics, StatsQuery, Totals,
            TypeTotals,
        };
    }

    pub mod settings {
        pub use api_types::settings::{UnitPrice, UnitPriceSetting, UnitPriceUpdate};
    }

    pub mod preferences {
        pub use api_types::preferences::{CurrencyChoice, CurrencyPreference};
    }

    pub mod user {
        pub use api_types::user::{Credentials, Me, Session, User};
    }

    pub mod rates {
        pub use api_types::rates::{Conversion, ConvertQuery, Rates, RatesQuery};
    }
}

/// Upper bound for each call to the identity and rate providers.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub enum ServerError {
    Engine(EngineError),
    Identity(IdentityError),
    Rates(RateError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::BAD_REQUEST,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidConfig(_)
        | EngineError::CorruptedRow(_)
        | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Unavailable(reason) => {
            tracing::warn!("store unavailable: {reason}");
            "Database unavailable".to_string()
        }
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InvalidConfig(_) | EngineError::CorruptedRow(_) => {
            tracing::error!("engine error: {err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

fn status_for_identity_error(err: &IdentityError) -> StatusCode {
    match err {
        IdentityError::MissingToken
        | IdentityError::InvalidToken
        | IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        IdentityError::AlreadyRegistered => StatusCode::CONFLICT,
        IdentityError::NotConfigured
        | IdentityError::Unavailable(_)
        | IdentityError::Provider(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn message_for_identity_error(err: IdentityError) -> String {
    match err {
        IdentityError::Unavailable(_) | IdentityError::Provider(_) => {
            tracing::error!("identity provider error: {err}");
            "Authentication service unavailable".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Identity(err) => {
                (status_for_identity_error(&err), message_for_identity_error(err))
            }
            ServerError::Rates(err) => {
                tracing::error!("rate provider error: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Exchange rates unavailable".to_string(),
                )
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<ValidationError> for ServerError {
    fn from(value: ValidationError) -> Self {
        Self::Engine(EngineError::Validation(value))
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<RateError> for ServerError {
    fn from(value: RateError) -> Self {
        Self::Rates(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

/// Engine labels to wire labels.
fn utility_type(kind: engine::UtilityType) -> api_types::UtilityType {
    match kind {
        engine::UtilityType::Electricity => api_types::UtilityType::Electricity,
        engine::UtilityType::Water => api_types::UtilityType::Water,
        engine::UtilityType::Fuel => api_types::UtilityType::Fuel,
    }
}

fn currency_to_api(currency: engine::Currency) -> api_types::Currency {
    match currency {
        engine::Currency::Eur => api_types::Currency::Eur,
        engine::Currency::Usd => api_types::Currency::Usd,
        engine::Currency::Gbp => api_types::Currency::Gbp,
        engine::Currency::Chf => api_types::Currency::Chf,
        engine::Currency::Pln => api_types::Currency::Pln,
        engine::Currency::Czk => api_types::Currency::Czk,
        engine::Currency::Sek => api_types::Currency::Sek,
        engine::Currency::Nok => api_types::Currency::Nok,
        engine::Currency::Dkk => api_types::Currency::Dkk,
        engine::Currency::Huf => api_types::Currency::Huf,
    }
}

fn currency_from_api(currency: api_types::Currency) -> engine::Currency {
    match currency {
        api_types::Currency::Eur => engine::Currency::Eur,
        api_types::Currency::Usd => engine::Currency::Usd,
        api_types::Currency::Gbp => engine::Currency::Gbp,
        api_types::Currency::Chf => engine::Currency::Chf,
        api_types::Currency::Pln => engine::Currency::Pln,
        api_types::Currency::Czk => engine::Currency::Czk,
        api_types::Currency::Sek => engine::Currency::Sek,
        api_types::Currency::Nok => engine::Currency::Nok,
        api_types::Currency::Dkk => engine::Currency::Dkk,
        api_types::Currency::Huf => engine::Currency::Huf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_validation_maps_to_400() {
        let err = ValidationError::new("unit", "unit must be a non-empty string");
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("Entry".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_unavailable_maps_to_503() {
        let err = EngineError::Unavailable("Database not configured".to_string());
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn corrupted_row_maps_to_500() {
        let res = ServerError::from(EngineError::CorruptedRow("type".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn identity_errors_map_to_401_409_503() {
        let res = ServerError::from(IdentityError::InvalidToken).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = ServerError::from(IdentityError::AlreadyRegistered).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = ServerError::from(IdentityError::NotConfigured).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn rate_errors_map_to_503() {
        let res = ServerError::from(RateError::Unavailable("timeout".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn currency_conversions_agree() {
        for currency in engine::Currency::ALL {
            assert_eq!(currency_from_api(currency_to_api(currency)), currency);
        }
    }
}
