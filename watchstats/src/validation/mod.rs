use crate::entry::RawRow;
use crate::error::{Result, WatchStatsError};
use crate::schema::REQUIRED_COLUMNS;

/// Result of validating an ingested row collection
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Check that the first row carries every required column.
/// Later rows are not consulted.
pub fn validate(rows: &[RawRow]) -> bool {
    match rows.first() {
        Some(first) => REQUIRED_COLUMNS.iter().all(|c| first.contains_key(*c)),
        None => false,
    }
}

/// Validate a row collection and report what is wrong with it.
///
/// Only the first row decides acceptance. Later rows missing a required
/// column are reported as warnings; they still flow into the aggregates
/// with the missing cells treated as absent.
pub fn validate_rows(rows: &[RawRow]) -> ValidationResult {
    let mut result = ValidationResult::default();

    let Some(first) = rows.first() else {
        result.errors.push("Export contains no rows".into());
        return result;
    };

    for column in REQUIRED_COLUMNS {
        if !first.contains_key(column) {
            result
                .errors
                .push(format!("Required column '{column}' is missing"));
        }
    }

    for (idx, row) in rows.iter().enumerate().skip(1) {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !row.contains_key(*c))
            .collect();
        if !missing.is_empty() {
            // +2: one for the header line, one for 1-based numbering
            result.warnings.push(format!(
                "Row {} is missing column(s): {}",
                idx + 2,
                missing.join(", ")
            ));
        }
    }

    result
}

/// Validate and return the warnings. Returns an error if the first row is
/// unusable, in which case nothing may be aggregated.
pub fn validate_and_prepare(rows: &[RawRow]) -> Result<Vec<String>> {
    let result = validate_rows(rows);

    if !result.is_ok() {
        return Err(WatchStatsError::Validation(format!(
            "Export is not a compatible watchlist:\n  - {}",
            result.errors.join("\n  - ")
        )));
    }

    for warning in &result.warnings {
        log::warn!("{warning}");
    }

    Ok(result.warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::parse_rows_str;

    const HEADER: &str =
        "Const,Title Type,Year,IMDb Rating,Your Rating,Genres,Directors,Runtime (mins),Created";

    #[test]
    fn test_valid_export() {
        let rows = parse_rows_str(&format!(
            "{HEADER}\ntt1,Movie,1994,9.3,10,Drama,Frank Darabont,142,2019-06-15\n"
        ))
        .unwrap();
        assert!(validate(&rows));
        let result = validate_rows(&rows);
        assert!(result.is_ok(), "Errors: {:?}", result.errors);
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_missing_column_rejected() {
        let rows = parse_rows_str(
            "Const,Title Type,Year,IMDb Rating,Your Rating,Genres,Runtime (mins),Created\n\
             tt1,Movie,1994,9.3,10,Drama,142,2019-06-15\n",
        )
        .unwrap();
        assert!(!validate(&rows));
        let result = validate_rows(&rows);
        assert!(!result.is_ok());
        assert!(result.errors.iter().any(|e| e.contains("Directors")));
    }

    #[test]
    fn test_empty_export_rejected() {
        assert!(!validate(&[]));
        assert!(validate_and_prepare(&[]).is_err());
    }

    #[test]
    fn test_header_only_export_rejected() {
        let rows = parse_rows_str(&format!("{HEADER}\n")).unwrap();
        assert!(rows.is_empty());
        assert!(!validate(&rows));
    }

    #[test]
    fn test_only_first_row_decides() {
        let rows = parse_rows_str(&format!(
            "{HEADER}\ntt1,Movie,1994,9.3,10,Drama,Frank Darabont,142,2019-06-15\ntt2,Movie\n"
        ))
        .unwrap();
        assert!(validate(&rows));

        let warnings = validate_and_prepare(&rows).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Row 3"));
        assert!(warnings[0].contains("Created"));
    }

    #[test]
    fn test_ragged_first_row_rejected() {
        let rows = parse_rows_str(&format!(
            "{HEADER}\ntt1,Movie,1994\ntt2,Movie,1994,9.3,10,Drama,Frank Darabont,142,2019-06-15\n"
        ))
        .unwrap();
        assert!(!validate(&rows));
        let err = validate_and_prepare(&rows).unwrap_err();
        assert!(err.to_string().contains("not a compatible watchlist"));
    }
}
