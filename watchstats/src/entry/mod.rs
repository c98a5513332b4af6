// Entry ingestion - CSV export rows and their typed form

use crate::error::{Result, WatchStatsError};
use crate::schema::{columns, parse_float_prefix, parse_int_prefix, TitleType};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// One header-keyed CSV row. Ragged rows only carry the keys they had cells
/// for, so a missing column is simply an absent key.
pub type RawRow = HashMap<String, String>;

/// A single watched title, parsed from one export row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchlistEntry {
    pub title_type: String,
    pub year: Option<i64>,
    pub imdb_rating: Option<f64>,
    pub your_rating: Option<i64>,
    pub genres: Vec<String>,
    pub directors: Vec<String>,
    pub runtime_minutes: Option<i64>,
    pub created: Option<NaiveDate>,
}

impl WatchlistEntry {
    /// Build an entry from a raw row. Never fails: unparseable cells become
    /// `None` and only drop the entry from views keyed by that field.
    pub fn from_row(row: &RawRow) -> Self {
        let cell = |name: &str| row.get(name).map(String::as_str);

        WatchlistEntry {
            title_type: cell(columns::TITLE_TYPE).unwrap_or_default().to_string(),
            year: cell(columns::YEAR).and_then(parse_int_prefix),
            imdb_rating: cell(columns::IMDB_RATING).and_then(parse_float_prefix),
            your_rating: cell(columns::YOUR_RATING).and_then(parse_int_prefix),
            genres: cell(columns::GENRES).map(split_list).unwrap_or_default(),
            directors: cell(columns::DIRECTORS).map(split_list).unwrap_or_default(),
            runtime_minutes: cell(columns::RUNTIME).and_then(parse_int_prefix),
            created: cell(columns::CREATED).and_then(parse_created),
        }
    }

    /// The recognized title type, if the raw label is one of the fixed set.
    pub fn known_title_type(&self) -> Option<TitleType> {
        TitleType::from_label(&self.title_type)
    }

    pub fn is_movie(&self) -> bool {
        self.known_title_type() == Some(TitleType::Movie)
    }

    /// Community rating floored to an integer bucket.
    pub fn imdb_bucket(&self) -> Option<i64> {
        self.imdb_rating
            .filter(|r| r.is_finite())
            .map(|r| r.floor() as i64)
    }
}

/// Split a comma-separated cell into trimmed, non-empty names.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a `Created` cell (`YYYY-MM-DD`).
pub fn parse_created(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Read header-keyed rows from any CSV source. Blank lines are skipped and
/// rows with a different cell count than the header are kept. Cells that are
/// not valid UTF-8 are decoded lossily instead of failing the whole export.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    let mut rows = Vec::new();

    let mut record = csv::ByteRecord::new();
    while csv_reader.read_byte_record(&mut record)? {
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), String::from_utf8_lossy(v).into_owned()))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Read header-keyed rows from a CSV string.
pub fn parse_rows_str(content: &str) -> Result<Vec<RawRow>> {
    read_rows(content.as_bytes())
}

/// Reject files whose name does not end in `.csv`.
pub fn ensure_csv_extension(path: &Path) -> Result<()> {
    let is_csv = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".csv"));
    if is_csv {
        Ok(())
    } else {
        Err(WatchStatsError::Validation(format!(
            "{} is not a .csv file",
            path.display()
        )))
    }
}

/// Read header-keyed rows from a CSV file.
pub fn read_rows_from_path(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(std::io::BufReader::new(file))
}

/// Convert validated rows into entries.
pub fn entries_from_rows(rows: &[RawRow]) -> Vec<WatchlistEntry> {
    rows.iter().map(WatchlistEntry::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER: &str =
        "Const,Title,Title Type,Year,IMDb Rating,Your Rating,Genres,Directors,Runtime (mins),Created";

    #[test]
    fn test_read_rows_keys_by_header() {
        let csv = format!(
            "{HEADER}\ntt0111161,The Shawshank Redemption,Movie,1994,9.3,10,\"Drama\",Frank Darabont,142,2019-06-15\n"
        );
        let rows = parse_rows_str(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Title"], "The Shawshank Redemption");
        assert_eq!(rows[0]["Runtime (mins)"], "142");
    }

    #[test]
    fn test_read_rows_skips_blank_lines() {
        let csv = format!("{HEADER}\n\ntt1,A,Movie,2000,7,8,Drama,X,90,2020-01-01\n\n");
        let rows = parse_rows_str(&csv).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_ragged_row_has_missing_keys() {
        let csv = format!("{HEADER}\ntt1,A,Movie,2000\n");
        let rows = parse_rows_str(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains_key("Year"));
        assert!(!rows[0].contains_key("Genres"));

        let entry = WatchlistEntry::from_row(&rows[0]);
        assert_eq!(entry.year, Some(2000));
        assert!(entry.genres.is_empty());
        assert_eq!(entry.created, None);
    }

    #[test]
    fn test_invalid_utf8_cell_is_decoded_lossily() {
        let mut csv = format!("{HEADER}\n").into_bytes();
        csv.extend_from_slice(b"tt0211915,Am\xe9lie,Movie,2001,8.3,9,\"Comedy, Romance\",Jean-Pierre Jeunet,122,2020-05-01\n");
        csv.extend_from_slice(b"tt0111161,The Shawshank Redemption,Movie,1994,9.3,10,Drama,Frank Darabont,142,2019-06-15\n");

        let rows = read_rows(csv.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Title"], "Am\u{FFFD}lie");
        assert_eq!(rows[0]["Year"], "2001");
        assert_eq!(rows[1]["Title"], "The Shawshank Redemption");

        let entries = entries_from_rows(&rows);
        assert_eq!(entries[0].your_rating, Some(9));
        assert_eq!(entries[0].directors, vec!["Jean-Pierre Jeunet".to_string()]);
    }

    #[test]
    fn test_entry_from_row_parses_fields() {
        let csv = format!(
            "{HEADER}\ntt1,Heat,Movie,1995,8.3,9,\"Action, Crime, Drama\",Michael Mann,170,2018-03-04\n"
        );
        let rows = parse_rows_str(&csv).unwrap();
        let entry = WatchlistEntry::from_row(&rows[0]);

        assert_eq!(
            entry,
            WatchlistEntry {
                title_type: "Movie".into(),
                year: Some(1995),
                imdb_rating: Some(8.3),
                your_rating: Some(9),
                genres: vec!["Action".into(), "Crime".into(), "Drama".into()],
                directors: vec!["Michael Mann".into()],
                runtime_minutes: Some(170),
                created: NaiveDate::from_ymd_opt(2018, 3, 4),
            }
        );
        assert!(entry.is_movie());
        assert_eq!(entry.imdb_bucket(), Some(8));
    }

    #[test]
    fn test_unparseable_cells_become_none() {
        let mut row = RawRow::new();
        row.insert("Title Type".into(), "TV Series".into());
        row.insert("Year".into(), "unknown".into());
        row.insert("IMDb Rating".into(), "".into());
        row.insert("Your Rating".into(), "".into());
        row.insert("Runtime (mins)".into(), "".into());
        row.insert("Created".into(), "yesterday".into());

        let entry = WatchlistEntry::from_row(&row);
        assert_eq!(entry.year, None);
        assert_eq!(entry.imdb_rating, None);
        assert_eq!(entry.your_rating, None);
        assert_eq!(entry.runtime_minutes, None);
        assert_eq!(entry.created, None);
        assert!(!entry.is_movie());
        assert_eq!(entry.known_title_type(), Some(TitleType::TvSeries));
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" Joel Coen,  Ethan Coen ,"),
            vec!["Joel Coen".to_string(), "Ethan Coen".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_csv_extension_required() {
        assert!(ensure_csv_extension(Path::new("exports/watchlist.csv")).is_ok());
        assert!(matches!(
            ensure_csv_extension(Path::new("exports/watchlist.xlsx")),
            Err(WatchStatsError::Validation(_))
        ));
        assert!(ensure_csv_extension(Path::new("watchlist")).is_err());
        assert!(ensure_csv_extension(Path::new("watchlist.CSV")).is_err());
    }

    #[test]
    fn test_parse_created() {
        assert_eq!(parse_created("2020-01-01"), NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(parse_created("2020-02-30"), None);
        assert_eq!(parse_created(""), None);
    }
}
