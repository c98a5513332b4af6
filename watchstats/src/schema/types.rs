use serde::Serialize;
use std::fmt;

/// Column headers of an IMDb list export that the engine reads.
pub mod columns {
    pub const TITLE_TYPE: &str = "Title Type";
    pub const YEAR: &str = "Year";
    pub const IMDB_RATING: &str = "IMDb Rating";
    pub const YOUR_RATING: &str = "Your Rating";
    pub const GENRES: &str = "Genres";
    pub const DIRECTORS: &str = "Directors";
    pub const RUNTIME: &str = "Runtime (mins)";
    pub const CREATED: &str = "Created";
}

/// Every column that must be present in the first row of an export.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    columns::TITLE_TYPE,
    columns::YEAR,
    columns::IMDB_RATING,
    columns::YOUR_RATING,
    columns::GENRES,
    columns::DIRECTORS,
    columns::RUNTIME,
    columns::CREATED,
];

/// The recognized title types. Anything else in the `Title Type` column is
/// unrecognized and drops out of the views that filter on this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TitleType {
    #[serde(rename = "Movie")]
    Movie,
    #[serde(rename = "Short")]
    Short,
    #[serde(rename = "TV Movie")]
    TvMovie,
    #[serde(rename = "TV Short")]
    TvShort,
    #[serde(rename = "TV Series")]
    TvSeries,
    #[serde(rename = "TV Mini Series")]
    TvMiniSeries,
    #[serde(rename = "TV Special")]
    TvSpecial,
}

impl TitleType {
    pub const ALL: [TitleType; 7] = [
        TitleType::Movie,
        TitleType::Short,
        TitleType::TvMovie,
        TitleType::TvShort,
        TitleType::TvSeries,
        TitleType::TvMiniSeries,
        TitleType::TvSpecial,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TitleType::Movie => "Movie",
            TitleType::Short => "Short",
            TitleType::TvMovie => "TV Movie",
            TitleType::TvShort => "TV Short",
            TitleType::TvSeries => "TV Series",
            TitleType::TvMiniSeries => "TV Mini Series",
            TitleType::TvSpecial => "TV Special",
        }
    }

    /// Exact, case-sensitive match against the export labels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for TitleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket for a personal 1-10 rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RatingCategory {
    #[serde(rename = "Boring")]
    Boring,
    #[serde(rename = "Average")]
    Average,
    #[serde(rename = "Good")]
    Good,
    #[serde(rename = "Masterpiece")]
    Masterpiece,
    #[serde(rename = "Not rated")]
    NotRated,
}

impl RatingCategory {
    /// Output order for every rating breakdown.
    pub const ALL: [RatingCategory; 5] = [
        RatingCategory::Boring,
        RatingCategory::Average,
        RatingCategory::Good,
        RatingCategory::Masterpiece,
        RatingCategory::NotRated,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RatingCategory::Boring => "Boring",
            RatingCategory::Average => "Average",
            RatingCategory::Good => "Good",
            RatingCategory::Masterpiece => "Masterpiece",
            RatingCategory::NotRated => "Not rated",
        }
    }

    /// The ratings that belong to this category. `NotRated` is the catch-all
    /// and owns no explicit value.
    pub fn members(self) -> &'static [i64] {
        match self {
            RatingCategory::Boring => &[1, 2, 3],
            RatingCategory::Average => &[4, 5, 6],
            RatingCategory::Good => &[7, 8, 9],
            RatingCategory::Masterpiece => &[10],
            RatingCategory::NotRated => &[],
        }
    }

    /// Categorize an already-parsed rating.
    pub fn of(rating: Option<i64>) -> Self {
        let Some(rating) = rating else {
            return RatingCategory::NotRated;
        };
        Self::ALL
            .into_iter()
            .find(|c| c.members().contains(&rating))
            .unwrap_or(RatingCategory::NotRated)
    }

    /// Categorize a raw `Your Rating` cell.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Self::of(parse_int_prefix(s)),
            _ => RatingCategory::NotRated,
        }
    }
}

impl fmt::Display for RatingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lenient base-10 integer parse: leading whitespace, an optional sign and the
/// longest run of digits. Trailing garbage is ignored, so `"1994 "` and
/// `"7.5"` parse as 1994 and 7. No digits means `None`.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Lenient decimal parse with the same prefix rules as [`parse_int_prefix`],
/// accepting one fractional part and an exponent (`"7.8/10"` parses as 7.8,
/// `"1e1"` as 10).
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let mantissa = s[..end].trim_end_matches('.');
    let exponent = &s[end..end + exponent_len(&s[end..])];
    format!("{mantissa}{exponent}").parse().ok()
}

/// Length of a leading `e[+-]digits` run, or 0 when there is none.
fn exponent_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if !matches!(bytes.first(), Some(b'e' | b'E')) {
        return 0;
    }
    let sign = usize::from(matches!(bytes.get(1), Some(b'+' | b'-')));
    let digits = bytes[1 + sign..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        0
    } else {
        1 + sign + digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_type_labels_round_trip() {
        for t in TitleType::ALL {
            assert_eq!(TitleType::from_label(t.label()), Some(t));
        }
        assert_eq!(TitleType::from_label("Podcast Episode"), None);
        assert_eq!(TitleType::from_label("movie"), None);
    }

    #[test]
    fn test_rating_categories_partition_one_to_ten() {
        for rating in 1..=10 {
            let owners: Vec<_> = RatingCategory::ALL
                .into_iter()
                .filter(|c| c.members().contains(&rating))
                .collect();
            assert_eq!(owners.len(), 1, "rating {rating} owned by {owners:?}");
            assert_eq!(RatingCategory::of(Some(rating)), owners[0]);
        }
    }

    #[test]
    fn test_rating_category_fallbacks() {
        assert_eq!(RatingCategory::of(None), RatingCategory::NotRated);
        assert_eq!(RatingCategory::of(Some(0)), RatingCategory::NotRated);
        assert_eq!(RatingCategory::of(Some(11)), RatingCategory::NotRated);
        assert_eq!(RatingCategory::of(Some(-3)), RatingCategory::NotRated);
        assert_eq!(RatingCategory::from_raw(None), RatingCategory::NotRated);
        assert_eq!(RatingCategory::from_raw(Some("")), RatingCategory::NotRated);
        assert_eq!(RatingCategory::from_raw(Some("abc")), RatingCategory::NotRated);
    }

    #[test]
    fn test_rating_category_from_raw_truncates() {
        assert_eq!(RatingCategory::from_raw(Some("10")), RatingCategory::Masterpiece);
        assert_eq!(RatingCategory::from_raw(Some(" 8")), RatingCategory::Good);
        assert_eq!(RatingCategory::from_raw(Some("6.9")), RatingCategory::Average);
        assert_eq!(RatingCategory::from_raw(Some("3stars")), RatingCategory::Boring);
    }

    #[test]
    fn test_parse_int_prefix() {
        assert_eq!(parse_int_prefix("1994"), Some(1994));
        assert_eq!(parse_int_prefix("  42abc"), Some(42));
        assert_eq!(parse_int_prefix("-5"), Some(-5));
        assert_eq!(parse_int_prefix("+7"), Some(7));
        assert_eq!(parse_int_prefix(""), None);
        assert_eq!(parse_int_prefix("-"), None);
        assert_eq!(parse_int_prefix("n/a"), None);
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("7.8"), Some(7.8));
        assert_eq!(parse_float_prefix("9"), Some(9.0));
        assert_eq!(parse_float_prefix("6.5/10"), Some(6.5));
        assert_eq!(parse_float_prefix("8."), Some(8.0));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix(""), None);
        assert_eq!(parse_float_prefix("."), None);
    }

    #[test]
    fn test_parse_float_prefix_exponent() {
        assert_eq!(parse_float_prefix("1e1"), Some(10.0));
        assert_eq!(parse_float_prefix("7.5E-1"), Some(0.75));
        assert_eq!(parse_float_prefix("2.e+1"), Some(20.0));
        // an exponent marker without digits is trailing garbage
        assert_eq!(parse_float_prefix("8e"), Some(8.0));
        assert_eq!(parse_float_prefix("8e-x"), Some(8.0));
    }
}
