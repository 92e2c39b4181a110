//! Unit price settings API endpoints

use api_types::settings::{UnitPrice, UnitPriceSetting};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use engine::validation::{self, UnitPriceInput};

use crate::{ServerError, identity::AuthUser, server::ServerState, utility_type};

/// Handle requests for the last-used unit price of a type
pub async fn get_unit_price(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(kind): Path<String>,
) -> Result<Json<UnitPrice>, ServerError> {
    let kind = validation::path_type(&state.types, &kind)?;
    let setting = state.engine.unit_price(&user.id, kind).await?;
    Ok(Json(UnitPrice {
        unit_price: setting.map(|s| s.unit_price),
    }))
}

/// Handle requests for replacing the unit price of a type
pub async fn put_unit_price(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(kind): Path<String>,
    payload: Result<Json<UnitPriceInput>, JsonRejection>,
) -> Result<Json<UnitPriceSetting>, ServerError> {
    let kind = validation::path_type(&state.types, &kind)?;
    let Json(input) = payload?;
    let unit_price = input.validate()?;

    let setting = state.engine.set_unit_price(&user.id, kind, unit_price).await?;
    Ok(Json(UnitPriceSetting {
        owner_id: setting.owner_id,
        kind: utility_type(setting.kind),
        unit_price: setting.unit_price,
        updated_at: setting.updated_at,
    }))
}
