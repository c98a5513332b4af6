use crate::error::{Result, WatchStatsError};
use std::collections::HashMap;
use std::path::Path;

/// Mapping from main genre category to the free-text subgenres it covers.
///
/// Categories keep the order of the source document. Lookups go through an
/// inverted index built once at load time; when a subgenre is listed under
/// more than one category the earliest category wins.
#[derive(Debug, Clone, Default)]
pub struct GenreTaxonomy {
    categories: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
    shadowed: Vec<String>,
}

impl GenreTaxonomy {
    /// An empty taxonomy. Genre views come out empty with it.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(categories: Vec<(String, Vec<String>)>) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut shadowed = Vec::new();

        for (pos, (category, subgenres)) in categories.iter().enumerate() {
            for subgenre in subgenres {
                match index.get(subgenre).copied() {
                    Some(owner) if owner != pos => {
                        let kept = &categories[owner].0;
                        log::warn!(
                            "Genre '{subgenre}' is listed under both '{kept}' and '{category}'; keeping '{kept}'"
                        );
                        shadowed.push(subgenre.clone());
                    }
                    Some(_) => {}
                    None => {
                        index.insert(subgenre.clone(), pos);
                    }
                }
            }
        }

        GenreTaxonomy {
            categories,
            index,
            shadowed,
        }
    }

    /// Parse a JSON object of `{ "Main": ["Sub", ...], ... }`.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let object = value.as_object().ok_or_else(|| {
            WatchStatsError::Taxonomy("Genre taxonomy must be a JSON object".into())
        })?;

        let mut categories = Vec::with_capacity(object.len());
        for (category, subgenres) in object {
            let list = subgenres.as_array().ok_or_else(|| {
                WatchStatsError::Taxonomy(format!(
                    "Genre category '{category}' must map to a list of strings"
                ))
            })?;
            let names = list
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_string).ok_or_else(|| {
                        WatchStatsError::Taxonomy(format!(
                            "Genre category '{category}' contains a non-string entry"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            categories.push((category.clone(), names));
        }

        Ok(Self::new(categories))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load the taxonomy, degrading to an empty one if it cannot be read.
    pub fn load_or_empty(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::info!("No genre taxonomy configured; genre views will be empty");
            return Self::empty();
        };

        match Self::from_path(path) {
            Ok(taxonomy) => {
                log::info!(
                    "Loaded genre taxonomy from {} ({} categories)",
                    path.display(),
                    taxonomy.len()
                );
                taxonomy
            }
            Err(e) => {
                log::warn!("Error loading genre taxonomy from {}: {e}", path.display());
                Self::empty()
            }
        }
    }

    /// Main category for an exact subgenre string.
    pub fn main_category_of(&self, genre: &str) -> Option<&str> {
        self.index
            .get(genre)
            .map(|&pos| self.categories[pos].0.as_str())
    }

    /// Position of the main category for `genre` in [`Self::categories`].
    pub fn category_position(&self, genre: &str) -> Option<usize> {
        self.index.get(genre).copied()
    }

    /// Main category names in document order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Subgenres that were listed under more than one category.
    pub fn shadowed(&self) -> &[String] {
        &self.shadowed
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolves_exact_subgenre() {
        let taxonomy =
            GenreTaxonomy::from_json_str(r#"{"Drama": ["Drama", "Romance"], "Action": ["Action"]}"#)
                .unwrap();
        assert_eq!(taxonomy.main_category_of("Romance"), Some("Drama"));
        assert_eq!(taxonomy.main_category_of("Action"), Some("Action"));
        assert_eq!(taxonomy.main_category_of("Comedy"), None);
        assert_eq!(taxonomy.main_category_of("romance"), None);
    }

    #[test]
    fn test_keeps_document_order() {
        let taxonomy =
            GenreTaxonomy::from_json_str(r#"{"Zeta": ["Z"], "Alpha": ["A"], "Mid": ["M"]}"#)
                .unwrap();
        let names: Vec<_> = taxonomy.categories().collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_duplicate_subgenre_first_category_wins() {
        let taxonomy = GenreTaxonomy::from_json_str(
            r#"{"Thriller": ["Crime", "Mystery"], "Drama": ["Crime", "Drama"]}"#,
        )
        .unwrap();
        assert_eq!(taxonomy.main_category_of("Crime"), Some("Thriller"));
        assert_eq!(taxonomy.category_position("Crime"), Some(0));
        assert_eq!(taxonomy.shadowed(), &["Crime".to_string()]);
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(GenreTaxonomy::from_json_str("[1, 2]").is_err());
        assert!(GenreTaxonomy::from_json_str(r#"{"Drama": "Drama"}"#).is_err());
        assert!(GenreTaxonomy::from_json_str(r#"{"Drama": [1]}"#).is_err());
    }

    #[test]
    fn test_load_or_empty_degrades() {
        let tmp = TempDir::new().unwrap();

        let missing = tmp.path().join("missing.json");
        assert!(GenreTaxonomy::load_or_empty(Some(&missing)).is_empty());

        let broken = tmp.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(GenreTaxonomy::load_or_empty(Some(&broken)).is_empty());

        assert!(GenreTaxonomy::load_or_empty(None).is_empty());

        let good = tmp.path().join("genre.json");
        std::fs::write(&good, r#"{"Drama": ["Drama"]}"#).unwrap();
        assert_eq!(GenreTaxonomy::load_or_empty(Some(&good)).len(), 1);
    }
}
