//! Statistics API endpoints

use api_types::stats::{
    Breakdown, DayTotal, MonthTotal, MonthlyRow, Order, Statistics, StatsQuery, Totals, TypeTotals,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use engine::{SortOrder, validation::BreakdownQuery};

use crate::{ServerError, identity::AuthUser, server::ServerState, utility_type};

fn totals_view(totals: engine::Totals) -> Totals {
    Totals {
        entry_count: totals.entry_count,
        total_usage: totals.total_usage,
        total_cost: totals.total_cost,
        avg_usage: totals.avg_usage,
        avg_cost: totals.avg_cost,
        first_entry: totals.first_entry,
        last_entry: totals.last_entry,
    }
}

/// Handle requests for the caller's totals, per-type totals and monthly series
pub async fn get_stats(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> Result<Json<Statistics>, ServerError> {
    let Query(query) = query?;
    let order = match query.order {
        Order::Ascending => SortOrder::Ascending,
        Order::Descending => SortOrder::Descending,
    };

    let stats = state.engine.statistics(&user.id).await?;
    let monthly = stats
        .monthly
        .rows(order)
        .into_iter()
        .map(|row| MonthlyRow {
            month: row.month,
            entry_count: row.entry_count,
            total_cost: row.total_cost,
            total_usage: row.total_usage,
        })
        .collect();

    Ok(Json(Statistics {
        totals: totals_view(stats.totals),
        by_type: stats
            .by_type
            .into_iter()
            .map(|stat| TypeTotals {
                kind: utility_type(stat.kind),
                totals: totals_view(stat.totals),
            })
            .collect(),
        monthly,
    }))
}

/// Handle requests for the monthly (and optionally daily) cost of one type
pub async fn breakdown(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(kind): Path<String>,
    query: Result<Query<BreakdownQuery>, QueryRejection>,
) -> Result<Json<Breakdown>, ServerError> {
    let Query(query) = query?;
    let request = query.validate(&state.types, &kind)?;
    let breakdown = state.engine.breakdown(&user.id, request).await?;

    Ok(Json(Breakdown {
        monthly: breakdown
            .monthly
            .into_iter()
            .map(|p| MonthTotal {
                month: p.period,
                total: p.total,
            })
            .collect(),
        daily: breakdown
            .daily
            .into_iter()
            .map(|p| DayTotal {
                date: p.period,
                total: p.total,
            })
            .collect(),
    }))
}
