//! Processing date-range construction
//!
//! The runner never reads the wall clock. Callers build a [`HarvestPlan`] from
//! configuration (and, for backfills, from whatever "today" means to them), so
//! tests can pin fully deterministic ranges.

use chrono::NaiveDate;

/// The set of processing dates for one run, plus the optional deployment-date
/// filter applied during accumulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestPlan {
    dates: Vec<NaiveDate>,
    date_filter: Option<NaiveDate>,
}

impl HarvestPlan {
    /// Plan a single deployment date: one processing day, with accumulation
    /// filtered to observations effective on that calendar day
    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            dates: vec![date],
            date_filter: Some(date),
        }
    }

    /// Plan a full backfill: every calendar day from `start` through `today`
    /// inclusive, ascending, with no date filter
    ///
    /// An empty plan results when `start` is after `today`.
    pub fn backfill(start: NaiveDate, today: NaiveDate) -> Self {
        let mut dates = Vec::new();
        let mut current = start;
        while current <= today {
            dates.push(current);
            current = current.succ_opt().expect("date range stays in bounds");
        }
        Self {
            dates,
            date_filter: None,
        }
    }

    /// Processing days in ascending order
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Calendar-date filter for accumulation, if any
    pub fn date_filter(&self) -> Option<NaiveDate> {
        self.date_filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_single_day_plan() {
        let plan = HarvestPlan::single_day(day(2026, 1, 10));
        assert_eq!(plan.dates(), &[day(2026, 1, 10)]);
        assert_eq!(plan.date_filter(), Some(day(2026, 1, 10)));
    }

    #[test]
    fn test_backfill_is_inclusive_and_ascending() {
        let plan = HarvestPlan::backfill(day(2026, 1, 30), day(2026, 2, 2));
        assert_eq!(
            plan.dates(),
            &[
                day(2026, 1, 30),
                day(2026, 1, 31),
                day(2026, 2, 1),
                day(2026, 2, 2),
            ]
        );
        assert_eq!(plan.date_filter(), None);
    }

    #[test]
    fn test_backfill_single_day_range() {
        let plan = HarvestPlan::backfill(day(2026, 1, 10), day(2026, 1, 10));
        assert_eq!(plan.dates(), &[day(2026, 1, 10)]);
    }

    #[test]
    fn test_backfill_empty_when_start_after_today() {
        let plan = HarvestPlan::backfill(day(2026, 1, 11), day(2026, 1, 10));
        assert!(plan.dates().is_empty());
    }
}
