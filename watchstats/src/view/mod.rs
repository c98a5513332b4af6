use crate::age;
use crate::entry::WatchlistEntry;
use crate::error::{Result, WatchStatsError};
use crate::genre::GenreTaxonomy;
use crate::schema::{RangeTable, RatingCategory, TitleType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// How many directors the ranking keeps by default.
pub const DEFAULT_DIRECTOR_LIMIT: usize = 15;

/// Lowest and highest community-rating bucket.
const IMDB_BUCKETS: std::ops::RangeInclusive<i64> = 1..=10;

/// Counts per rating category, serialized with the category labels as keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingBreakdown {
    #[serde(rename = "Boring")]
    pub boring: u64,
    #[serde(rename = "Average")]
    pub average: u64,
    #[serde(rename = "Good")]
    pub good: u64,
    #[serde(rename = "Masterpiece")]
    pub masterpiece: u64,
    #[serde(rename = "Not rated")]
    pub not_rated: u64,
}

impl RatingBreakdown {
    pub fn record(&mut self, category: RatingCategory) {
        *self.slot(category) += 1;
    }

    pub fn get(&self, category: RatingCategory) -> u64 {
        match category {
            RatingCategory::Boring => self.boring,
            RatingCategory::Average => self.average,
            RatingCategory::Good => self.good,
            RatingCategory::Masterpiece => self.masterpiece,
            RatingCategory::NotRated => self.not_rated,
        }
    }

    pub fn total(&self) -> u64 {
        RatingCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    fn slot(&mut self, category: RatingCategory) -> &mut u64 {
        match category {
            RatingCategory::Boring => &mut self.boring,
            RatingCategory::Average => &mut self.average,
            RatingCategory::Good => &mut self.good,
            RatingCategory::Masterpiece => &mut self.masterpiece,
            RatingCategory::NotRated => &mut self.not_rated,
        }
    }
}

/// One `label -> count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: u64,
}

/// One `label -> rating breakdown` row. `total` is the breakdown's sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTabRow {
    pub label: String,
    pub total: u64,
    pub ratings: RatingBreakdown,
}

impl CrossTabRow {
    fn new(label: impl Into<String>, ratings: RatingBreakdown) -> Self {
        CrossTabRow {
            label: label.into(),
            total: ratings.total(),
            ratings,
        }
    }
}

/// A single computed view, in the order the renderer should draw it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AggregateView {
    Counts(Vec<CountRow>),
    CrossTab(Vec<CrossTabRow>),
    Scalar(Option<i64>),
}

/// Addressable view names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewName {
    TitleTypes,
    MovieRatings,
    OtherRatings,
    YearRanges,
    ImdbRatings,
    Yearly,
    GenreTotals,
    GenreRatings,
    Directors,
    Runtimes,
    WatchlistAge,
}

impl ViewName {
    pub const ALL: [ViewName; 11] = [
        ViewName::TitleTypes,
        ViewName::MovieRatings,
        ViewName::OtherRatings,
        ViewName::YearRanges,
        ViewName::ImdbRatings,
        ViewName::Yearly,
        ViewName::GenreTotals,
        ViewName::GenreRatings,
        ViewName::Directors,
        ViewName::Runtimes,
        ViewName::WatchlistAge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ViewName::TitleTypes => "title_types",
            ViewName::MovieRatings => "movie_ratings",
            ViewName::OtherRatings => "other_ratings",
            ViewName::YearRanges => "year_ranges",
            ViewName::ImdbRatings => "imdb_ratings",
            ViewName::Yearly => "yearly",
            ViewName::GenreTotals => "genre_totals",
            ViewName::GenreRatings => "genre_ratings",
            ViewName::Directors => "directors",
            ViewName::Runtimes => "runtimes",
            ViewName::WatchlistAge => "watchlist_age",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ViewName::TitleTypes => "Entries per title type",
            ViewName::MovieRatings => "Your ratings of movies",
            ViewName::OtherRatings => "Your ratings of recognized non-movie titles",
            ViewName::YearRanges => "Release-year range x your rating",
            ViewName::ImdbRatings => "IMDb rating bucket x your rating",
            ViewName::Yearly => "Release year x your rating, ascending",
            ViewName::GenreTotals => "Entries per main genre category",
            ViewName::GenreRatings => "Main genre category x your rating",
            ViewName::Directors => "Top directors x your rating",
            ViewName::Runtimes => "Runtime range x your rating",
            ViewName::WatchlistAge => "Years since the oldest entry was added",
        }
    }
}

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewName {
    type Err = WatchStatsError;

    fn from_str(s: &str) -> Result<Self> {
        ViewName::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| WatchStatsError::NotFound {
                kind: "view".into(),
                name: s.to_string(),
            })
    }
}

/// Every view computed from one entry collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub entries: usize,
    pub today: NaiveDate,
    pub watchlist_age: Option<i64>,
    pub title_types: Vec<CountRow>,
    pub movie_ratings: Vec<CountRow>,
    pub other_ratings: Vec<CountRow>,
    pub year_ranges: Vec<CrossTabRow>,
    pub imdb_ratings: Vec<CrossTabRow>,
    pub yearly: Vec<CrossTabRow>,
    pub genre_totals: Vec<CountRow>,
    pub genre_ratings: Vec<CrossTabRow>,
    pub directors: Vec<CrossTabRow>,
    pub runtimes: Vec<CrossTabRow>,
}

impl Report {
    /// Pull a single view out of the report.
    pub fn view(&self, name: ViewName) -> AggregateView {
        match name {
            ViewName::TitleTypes => AggregateView::Counts(self.title_types.clone()),
            ViewName::MovieRatings => AggregateView::Counts(self.movie_ratings.clone()),
            ViewName::OtherRatings => AggregateView::Counts(self.other_ratings.clone()),
            ViewName::YearRanges => AggregateView::CrossTab(self.year_ranges.clone()),
            ViewName::ImdbRatings => AggregateView::CrossTab(self.imdb_ratings.clone()),
            ViewName::Yearly => AggregateView::CrossTab(self.yearly.clone()),
            ViewName::GenreTotals => AggregateView::Counts(self.genre_totals.clone()),
            ViewName::GenreRatings => AggregateView::CrossTab(self.genre_ratings.clone()),
            ViewName::Directors => AggregateView::CrossTab(self.directors.clone()),
            ViewName::Runtimes => AggregateView::CrossTab(self.runtimes.clone()),
            ViewName::WatchlistAge => AggregateView::Scalar(self.watchlist_age),
        }
    }
}

/// The aggregation engine: categorization tables plus the reducers that turn
/// an entry collection into views. Reducers are independent single passes and
/// never see each other's output.
#[derive(Debug, Clone)]
pub struct ViewEngine {
    year_ranges: RangeTable,
    runtime_ranges: RangeTable,
    genres: GenreTaxonomy,
    director_limit: usize,
}

impl ViewEngine {
    /// Build the engine. The year table's last bucket ends at `current_year`.
    pub fn new(genres: GenreTaxonomy, current_year: i64) -> Result<Self> {
        Ok(ViewEngine {
            year_ranges: RangeTable::years(current_year)?,
            runtime_ranges: RangeTable::runtimes()?,
            genres,
            director_limit: DEFAULT_DIRECTOR_LIMIT,
        })
    }

    pub fn with_director_limit(mut self, limit: usize) -> Self {
        self.director_limit = limit;
        self
    }

    pub fn genres(&self) -> &GenreTaxonomy {
        &self.genres
    }

    /// Swap in a reloaded taxonomy.
    pub fn set_genres(&mut self, genres: GenreTaxonomy) {
        self.genres = genres;
    }

    pub fn director_limit(&self) -> usize {
        self.director_limit
    }

    pub fn year_range_of(&self, year: i64) -> Option<&str> {
        self.year_ranges.resolve(year)
    }

    pub fn runtime_range_of(&self, minutes: i64) -> Option<&str> {
        self.runtime_ranges.resolve(minutes)
    }

    pub fn main_category_of(&self, genre: &str) -> Option<&str> {
        self.genres.main_category_of(genre)
    }

    /// Count of entries per recognized title type, all seven listed.
    pub fn title_type_counts(&self, entries: &[WatchlistEntry]) -> Vec<CountRow> {
        let mut counts = [0u64; TitleType::ALL.len()];
        for entry in entries {
            if let Some(t) = entry.known_title_type() {
                if let Some(pos) = TitleType::ALL.iter().position(|x| *x == t) {
                    counts[pos] += 1;
                }
            }
        }

        TitleType::ALL
            .iter()
            .zip(counts)
            .map(|(t, count)| CountRow {
                label: t.label().to_string(),
                count,
            })
            .collect()
    }

    /// Rating distribution of movies.
    pub fn movie_ratings(&self, entries: &[WatchlistEntry]) -> Vec<CountRow> {
        rating_distribution(entries.iter().filter(|e| e.is_movie()))
    }

    /// Rating distribution of recognized title types other than movies.
    pub fn other_ratings(&self, entries: &[WatchlistEntry]) -> Vec<CountRow> {
        rating_distribution(
            entries
                .iter()
                .filter(|e| e.known_title_type().is_some() && !e.is_movie()),
        )
    }

    /// Release-year range x rating, every range listed in table order.
    pub fn year_ranges(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut buckets = vec![RatingBreakdown::default(); self.year_ranges.len()];
        for entry in entries {
            let Some(pos) = entry.year.and_then(|y| self.year_ranges.position(y)) else {
                continue;
            };
            buckets[pos].record(RatingCategory::of(entry.your_rating));
        }

        self.year_ranges
            .labels()
            .zip(buckets)
            .map(|(label, ratings)| CrossTabRow::new(label, ratings))
            .collect()
    }

    /// Floored community rating 1-10 x rating, every bucket listed.
    pub fn imdb_ratings(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut buckets = [RatingBreakdown::default(); 10];
        for entry in entries {
            let Some(bucket) = entry.imdb_bucket().filter(|b| IMDB_BUCKETS.contains(b)) else {
                continue;
            };
            buckets[(bucket - 1) as usize].record(RatingCategory::of(entry.your_rating));
        }

        IMDB_BUCKETS
            .zip(buckets)
            .map(|(bucket, ratings)| CrossTabRow::new(bucket.to_string(), ratings))
            .collect()
    }

    /// Per-year time series keyed by the `Year` field, ascending.
    pub fn yearly(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut years: BTreeMap<i64, RatingBreakdown> = BTreeMap::new();
        for entry in entries {
            let Some(year) = entry.year else {
                continue;
            };
            years
                .entry(year)
                .or_default()
                .record(RatingCategory::of(entry.your_rating));
        }

        years
            .into_iter()
            .map(|(year, ratings)| CrossTabRow::new(year.to_string(), ratings))
            .collect()
    }

    /// Hits per main genre category among recognized title types. An entry
    /// counts once per mapped genre. Only categories with hits are listed.
    pub fn genre_totals(&self, entries: &[WatchlistEntry]) -> Vec<CountRow> {
        self.genre_ratings(entries)
            .into_iter()
            .filter(|row| row.total > 0)
            .map(|row| CountRow {
                label: row.label,
                count: row.total,
            })
            .collect()
    }

    /// Main genre category x rating among recognized title types, every
    /// taxonomy category listed in taxonomy order.
    pub fn genre_ratings(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut buckets = vec![RatingBreakdown::default(); self.genres.len()];
        for entry in entries {
            if entry.known_title_type().is_none() {
                continue;
            }
            let category = RatingCategory::of(entry.your_rating);
            for genre in &entry.genres {
                if let Some(pos) = self.genres.category_position(genre) {
                    buckets[pos].record(category);
                }
            }
        }

        self.genres
            .categories()
            .zip(buckets)
            .map(|(label, ratings)| CrossTabRow::new(label, ratings))
            .collect()
    }

    /// Directors ranked by entry count, truncated to the director limit.
    /// Equal totals keep the order in which directors first appear.
    pub fn directors(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut order: Vec<(&str, RatingBreakdown)> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for entry in entries {
            let category = RatingCategory::of(entry.your_rating);
            for director in &entry.directors {
                let pos = *seen.entry(director.as_str()).or_insert_with(|| {
                    order.push((director.as_str(), RatingBreakdown::default()));
                    order.len() - 1
                });
                order[pos].1.record(category);
            }
        }

        let mut rows: Vec<CrossTabRow> = order
            .into_iter()
            .map(|(name, ratings)| CrossTabRow::new(name, ratings))
            .collect();
        // stable: ties stay in first-seen order
        rows.sort_by(|a, b| b.total.cmp(&a.total));
        rows.truncate(self.director_limit);
        rows
    }

    /// Runtime range x rating for entries with a parseable runtime.
    pub fn runtimes(&self, entries: &[WatchlistEntry]) -> Vec<CrossTabRow> {
        let mut buckets = vec![RatingBreakdown::default(); self.runtime_ranges.len()];
        for entry in entries {
            let Some(pos) = entry
                .runtime_minutes
                .and_then(|m| self.runtime_ranges.position(m))
            else {
                continue;
            };
            buckets[pos].record(RatingCategory::of(entry.your_rating));
        }

        self.runtime_ranges
            .labels()
            .zip(buckets)
            .map(|(label, ratings)| CrossTabRow::new(label, ratings))
            .collect()
    }

    /// Compute a single view.
    pub fn compute(
        &self,
        name: ViewName,
        entries: &[WatchlistEntry],
        today: NaiveDate,
    ) -> AggregateView {
        match name {
            ViewName::TitleTypes => AggregateView::Counts(self.title_type_counts(entries)),
            ViewName::MovieRatings => AggregateView::Counts(self.movie_ratings(entries)),
            ViewName::OtherRatings => AggregateView::Counts(self.other_ratings(entries)),
            ViewName::YearRanges => AggregateView::CrossTab(self.year_ranges(entries)),
            ViewName::ImdbRatings => AggregateView::CrossTab(self.imdb_ratings(entries)),
            ViewName::Yearly => AggregateView::CrossTab(self.yearly(entries)),
            ViewName::GenreTotals => AggregateView::Counts(self.genre_totals(entries)),
            ViewName::GenreRatings => AggregateView::CrossTab(self.genre_ratings(entries)),
            ViewName::Directors => AggregateView::CrossTab(self.directors(entries)),
            ViewName::Runtimes => AggregateView::CrossTab(self.runtimes(entries)),
            ViewName::WatchlistAge => {
                AggregateView::Scalar(age::watchlist_age_years(entries, today))
            }
        }
    }

    /// Compute every view.
    pub fn report(&self, entries: &[WatchlistEntry], today: NaiveDate) -> Report {
        Report {
            entries: entries.len(),
            today,
            watchlist_age: age::watchlist_age_years(entries, today),
            title_types: self.title_type_counts(entries),
            movie_ratings: self.movie_ratings(entries),
            other_ratings: self.other_ratings(entries),
            year_ranges: self.year_ranges(entries),
            imdb_ratings: self.imdb_ratings(entries),
            yearly: self.yearly(entries),
            genre_totals: self.genre_totals(entries),
            genre_ratings: self.genre_ratings(entries),
            directors: self.directors(entries),
            runtimes: self.runtimes(entries),
        }
    }
}

/// Count entries per rating category, all five listed in fixed order.
pub fn rating_distribution<'a>(entries: impl Iterator<Item = &'a WatchlistEntry>) -> Vec<CountRow> {
    let mut breakdown = RatingBreakdown::default();
    for entry in entries {
        breakdown.record(RatingCategory::of(entry.your_rating));
    }

    RatingCategory::ALL
        .iter()
        .map(|c| CountRow {
            label: c.label().to_string(),
            count: breakdown.get(*c),
        })
        .collect()
}
