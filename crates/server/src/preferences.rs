//! Currency preference API endpoints

use api_types::preferences::{CurrencyChoice, CurrencyPreference};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use engine::validation::CurrencyInput;

use crate::{ServerError, currency_to_api, identity::AuthUser, server::ServerState};

/// Handle requests for the caller's display currency (EUR when unset)
pub async fn get_currency(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<CurrencyChoice>, ServerError> {
    let currency = state.engine.currency(&user.id).await?;
    Ok(Json(CurrencyChoice {
        currency: currency_to_api(currency),
    }))
}

/// Handle requests for changing the caller's display currency
pub async fn put_currency(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    payload: Result<Json<CurrencyInput>, JsonRejection>,
) -> Result<Json<CurrencyPreference>, ServerError> {
    let Json(input) = payload?;
    let currency = input.validate()?;

    let preference = state.engine.set_currency(&user.id, currency).await?;
    Ok(Json(CurrencyPreference {
        owner_id: preference.owner_id,
        currency: currency_to_api(preference.currency),
        updated_at: preference.updated_at,
    }))
}
