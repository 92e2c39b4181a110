use chrono::NaiveDate;

use crate::{
    Breakdown, EntryFilter, ResultEngine, Statistics, ValidationError, stats,
    validation::BreakdownRequest,
};

use super::Engine;

impl Engine {
    /// Aggregates every entry the owner has recorded.
    pub async fn statistics(&self, owner_id: &str) -> ResultEngine<Statistics> {
        let entries = self.list_entries(owner_id, &EntryFilter::default()).await?;
        Ok(stats::statistics(&entries))
    }

    /// Monthly (and optionally daily) cost of one utility type over a year.
    pub async fn breakdown(
        &self,
        owner_id: &str,
        request: BreakdownRequest,
    ) -> ResultEngine<Breakdown> {
        let year_bound = |month, day| {
            NaiveDate::from_ymd_opt(request.year, month, day)
                .ok_or_else(|| ValidationError::new("year", "year is out of range"))
        };
        let filter = EntryFilter {
            kind: Some(request.kind),
            from: Some(year_bound(1, 1)?),
            to: Some(year_bound(12, 31)?),
        };
        let entries = self.list_entries(owner_id, &filter).await?;
        Ok(stats::yearly_breakdown(
            &entries,
            request.kind,
            request.year,
            request.month,
        ))
    }
}
