//! Entries API endpoints

use api_types::entry::{Entry as EntryView, EntryDeleted};
use axum::{
    Extension, Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{
    Entry,
    validation::{self, EntryInput, EntryQuery},
};

use crate::{ServerError, identity::AuthUser, server::ServerState, utility_type};

pub(crate) fn entry_view(entry: Entry) -> EntryView {
    EntryView {
        id: entry.id,
        owner_id: entry.owner_id,
        kind: utility_type(entry.kind),
        usage_amount: entry.usage_amount,
        unit_price: entry.unit_price,
        cost_amount: entry.cost_amount,
        unit: entry.unit,
        date: entry.date,
        created_at: entry.created_at,
    }
}

/// Handle requests for creating an entry
pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    payload: Result<Json<EntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<EntryView>), ServerError> {
    let Json(input) = payload?;
    let new = input.validate(&state.types)?;
    let entry = state.engine.create_entry(&user.id, new).await?;
    Ok((StatusCode::CREATED, Json(entry_view(entry))))
}

/// Handle requests for listing entries, newest first
pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    query: Result<Query<EntryQuery>, QueryRejection>,
) -> Result<Json<Vec<EntryView>>, ServerError> {
    let Query(query) = query?;
    let filter = query.validate(&state.types)?;
    let entries = state.engine.list_entries(&user.id, &filter).await?;
    Ok(Json(entries.into_iter().map(entry_view).collect()))
}

/// Handle requests for deleting one of the caller's entries
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<EntryDeleted>, ServerError> {
    let id = validation::entry_id(&id)?;
    state.engine.delete_entry(&user.id, id).await?;
    Ok(Json(EntryDeleted {
        message: "Entry deleted".to_string(),
    }))
}
