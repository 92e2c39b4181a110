//! Aggregation over an owner's entries.
//!
//! Everything here is pure computation over already fetched [`Entry`] rows:
//!
//! - [`totals`]: count, sums, averages and date span of a set of entries.
//! - [`by_type`]: the same figures grouped by [`UtilityType`].
//! - [`monthly`]: count, cost and usage per `YYYY-MM` bucket.
//! - [`yearly_breakdown`]: cost per month of a year for one type, optionally
//!   with a per-day series for one month.
//!
//! Sums and averages are exact [`Decimal`] arithmetic over the stored values.
//! No rounding happens here; the only rounding in the system is when a cost is
//! derived from a unit price.
//!
//! Buckets are keyed by their `YYYY-MM` / `YYYY-MM-DD` text, whose
//! lexicographic order is the chronological order.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::{Entry, UtilityType};

/// Aggregate figures over a set of entries.
///
/// An empty set yields zero for every number and `None` for both dates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub entry_count: u64,
    pub total_usage: Decimal,
    pub total_cost: Decimal,
    pub avg_usage: Decimal,
    pub avg_cost: Decimal,
    pub first_entry: Option<NaiveDate>,
    pub last_entry: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeStat {
    pub kind: UtilityType,
    pub totals: Totals,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyRow {
    /// `YYYY-MM`
    pub month: String,
    pub entry_count: u64,
    pub total_cost: Decimal,
    pub total_usage: Decimal,
}

/// Cost summed over one bucket: a month (`YYYY-MM`) or a day (`YYYY-MM-DD`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodTotal {
    pub period: String,
    pub total: Decimal,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Per-month aggregates, independent of any presentation order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonthlySeries {
    months: BTreeMap<String, MonthlyRow>,
}

impl MonthlySeries {
    /// Rows in the requested month order.
    pub fn rows(&self, order: SortOrder) -> Vec<MonthlyRow> {
        match order {
            SortOrder::Ascending => self.months.values().cloned().collect(),
            SortOrder::Descending => self.months.values().rev().cloned().collect(),
        }
    }
}

/// Result of [`yearly_breakdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Breakdown {
    pub monthly: Vec<PeriodTotal>,
    pub daily: Vec<PeriodTotal>,
}

/// Everything the statistics view needs in one pass over the entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    pub totals: Totals,
    pub by_type: Vec<TypeStat>,
    pub monthly: MonthlySeries,
}

#[derive(Default)]
struct Accumulator {
    count: u64,
    usage: Decimal,
    cost: Decimal,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl Accumulator {
    fn push(&mut self, entry: &Entry) {
        self.count += 1;
        self.usage += entry.usage_amount;
        self.cost += entry.cost_amount;
        self.first = Some(self.first.map_or(entry.date, |d| d.min(entry.date)));
        self.last = Some(self.last.map_or(entry.date, |d| d.max(entry.date)));
    }

    fn finish(self) -> Totals {
        let (avg_usage, avg_cost) = if self.count == 0 {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let count = Decimal::from(self.count);
            (self.usage / count, self.cost / count)
        };

        Totals {
            entry_count: self.count,
            total_usage: self.usage,
            total_cost: self.cost,
            avg_usage,
            avg_cost,
            first_entry: self.first,
            last_entry: self.last,
        }
    }
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn totals<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Totals {
    let mut acc = Accumulator::default();
    for entry in entries {
        acc.push(entry);
    }
    acc.finish()
}

/// One row per type that has at least one entry, ordered by type name.
pub fn by_type<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<TypeStat> {
    let mut groups: BTreeMap<&'static str, (UtilityType, Accumulator)> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(entry.kind.as_str())
            .or_insert_with(|| (entry.kind, Accumulator::default()))
            .1
            .push(entry);
    }

    groups
        .into_values()
        .map(|(kind, acc)| TypeStat {
            kind,
            totals: acc.finish(),
        })
        .collect()
}

pub fn monthly<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> MonthlySeries {
    let mut months: BTreeMap<String, MonthlyRow> = BTreeMap::new();
    for entry in entries {
        let key = month_key(entry.date);
        let row = months.entry(key.clone()).or_insert_with(|| MonthlyRow {
            month: key,
            entry_count: 0,
            total_cost: Decimal::ZERO,
            total_usage: Decimal::ZERO,
        });
        row.entry_count += 1;
        row.total_cost += entry.cost_amount;
        row.total_usage += entry.usage_amount;
    }
    MonthlySeries { months }
}

pub fn statistics(entries: &[Entry]) -> Statistics {
    Statistics {
        totals: totals(entries),
        by_type: by_type(entries),
        monthly: monthly(entries),
    }
}

/// Cost per month of `year` for entries of `kind`, ascending.
///
/// When `month` is given, also returns the cost per day of that month,
/// ascending. Entries of other types or years are ignored, so the caller may
/// pass a superset.
pub fn yearly_breakdown<'a>(
    entries: impl IntoIterator<Item = &'a Entry>,
    kind: UtilityType,
    year: i32,
    month: Option<u32>,
) -> Breakdown {
    let mut monthly: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut daily: BTreeMap<String, Decimal> = BTreeMap::new();

    for entry in entries {
        if entry.kind != kind || entry.date.year() != year {
            continue;
        }
        *monthly.entry(month_key(entry.date)).or_default() += entry.cost_amount;
        if month == Some(entry.date.month()) {
            *daily.entry(day_key(entry.date)).or_default() += entry.cost_amount;
        }
    }

    let into_rows = |map: BTreeMap<String, Decimal>| -> Vec<PeriodTotal> {
        map.into_iter()
            .map(|(period, total)| PeriodTotal { period, total })
            .collect()
    };

    Breakdown {
        monthly: into_rows(monthly),
        daily: into_rows(daily),
    }
}
