use crate::entry::WatchlistEntry;
use chrono::{Datelike, NaiveDate};

/// Earliest parseable `Created` date across all entries.
pub fn oldest_created(entries: &[WatchlistEntry]) -> Option<NaiveDate> {
    entries.iter().filter_map(|e| e.created).min()
}

/// Whole years since the oldest entry was added, or `None` when no entry
/// carries a usable `Created` date.
pub fn watchlist_age_years(entries: &[WatchlistEntry], today: NaiveDate) -> Option<i64> {
    oldest_created(entries).map(|oldest| age_between(oldest, today))
}

/// Years between `oldest` and `today`.
///
/// The calendar year difference is reduced by one when the anniversary has
/// not been reached yet, then shifted by `months / 12 + days / 365` and
/// rounded half up. The month/day shift is applied on top of the anniversary
/// adjustment and uses a flat 365-day year; results near an anniversary can
/// therefore be off by one compared to an exact elapsed-time calculation.
pub fn age_between(oldest: NaiveDate, today: NaiveDate) -> i64 {
    let mut years = i64::from(today.year()) - i64::from(oldest.year());

    let (t_month, o_month) = (i64::from(today.month()), i64::from(oldest.month()));
    let (t_day, o_day) = (i64::from(today.day()), i64::from(oldest.day()));

    if t_month < o_month || (t_month == o_month && t_day < o_day) {
        years -= 1;
    }

    let exact = years as f64 + (t_month - o_month) as f64 / 12.0 + (t_day - o_day) as f64 / 365.0;

    (exact + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry_created(created: Option<NaiveDate>) -> WatchlistEntry {
        WatchlistEntry {
            title_type: "Movie".into(),
            year: None,
            imdb_rating: None,
            your_rating: None,
            genres: vec![],
            directors: vec![],
            runtime_minutes: None,
            created,
        }
    }

    #[test]
    fn test_oldest_date_is_used() {
        let entries = vec![
            entry_created(Some(date(2020, 1, 1))),
            entry_created(Some(date(2019, 6, 15))),
            entry_created(None),
        ];
        assert_eq!(oldest_created(&entries), Some(date(2019, 6, 15)));
        assert_eq!(watchlist_age_years(&entries, date(2024, 6, 15)), Some(5));
    }

    #[test]
    fn test_no_dates_is_unknown() {
        let entries = vec![entry_created(None), entry_created(None)];
        assert_eq!(watchlist_age_years(&entries, date(2024, 6, 15)), None);
        assert_eq!(watchlist_age_years(&[], date(2024, 6, 15)), None);
    }

    #[test]
    fn test_partial_year_rounds() {
        // 4 + 5/12 + 14/365 = 4.455
        assert_eq!(age_between(date(2020, 1, 1), date(2024, 6, 15)), 4);
        // 0 + 6/12 rounds half up
        assert_eq!(age_between(date(2020, 1, 1), date(2020, 7, 1)), 1);
        // 4 - 5/365 = 3.986
        assert_eq!(age_between(date(2019, 6, 20), date(2024, 6, 15)), 4);
    }

    #[test]
    fn test_month_shift_applies_after_anniversary_adjustment() {
        // 3 (anniversary not reached) - 11/12 = 2.083
        assert_eq!(age_between(date(2020, 12, 1), date(2024, 1, 1)), 2);
    }

    #[test]
    fn test_same_day_is_zero() {
        assert_eq!(age_between(date(2024, 6, 15), date(2024, 6, 15)), 0);
    }
}
