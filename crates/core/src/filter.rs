//! Filter predicate applied to the company listing
//!
//! Pure functions for updating and encoding the search/category/size/location
//! constraint. An empty value always means "no constraint".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::company::CompanyRecord;

/// Which part of the predicate a user input targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Search,
    Category,
    Size,
    Location,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Search,
        FilterField::Category,
        FilterField::Size,
        FilterField::Location,
    ];

    /// Query-string key understood by the backend
    pub fn query_key(&self) -> &'static str {
        match self {
            FilterField::Search => "search",
            FilterField::Category => "category",
            FilterField::Size => "size",
            FilterField::Location => "location",
        }
    }
}

impl fmt::Display for FilterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_key())
    }
}

impl FromStr for FilterField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "search" | "q" => Ok(FilterField::Search),
            "category" => Ok(FilterField::Category),
            "size" => Ok(FilterField::Size),
            "location" => Ok(FilterField::Location),
            other => Err(format!(
                "Invalid filter field: {other}. Valid fields: search, category, size, location"
            )),
        }
    }
}

/// Combined search/category/size/location constraint
///
/// Compared structurally to decide whether a user input actually changed the
/// listing query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterPredicate {
    pub search_term: String,
    pub category: Option<String>,
    pub size: Option<String>,
    pub location: Option<String>,
}

impl FilterPredicate {
    /// Return a copy with `field` set to `value`
    ///
    /// Blank values clear every field. A non-blank search term is kept exactly as
    /// typed and sent that way.
    pub fn with(&self, field: FilterField, value: &str) -> FilterPredicate {
        let mut next = self.clone();
        match field {
            FilterField::Search if value.trim().is_empty() => next.search_term.clear(),
            FilterField::Search => next.search_term = value.to_string(),
            FilterField::Category => next.category = non_blank(value),
            FilterField::Size => next.size = non_blank(value),
            FilterField::Location => next.location = non_blank(value),
        }
        next
    }

    /// Current value of `field`, if constrained
    pub fn get(&self, field: FilterField) -> Option<&str> {
        match field {
            FilterField::Search => {
                (!self.search_term.trim().is_empty()).then_some(self.search_term.as_str())
            }
            FilterField::Category => self.category.as_deref(),
            FilterField::Size => self.size.as_deref(),
            FilterField::Location => self.location.as_deref(),
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        FilterField::ALL.iter().all(|field| self.get(*field).is_none())
    }

    /// Encode as backend query parameters
    ///
    /// All four keys are always present; an absent constraint is sent as an
    /// empty string, which the backend treats as a wildcard.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        FilterField::ALL
            .iter()
            .map(|field| (field.query_key(), self.get(*field).unwrap_or("").to_string()))
            .collect()
    }

    /// Command line flags reproducing this predicate
    pub fn cli_args(&self) -> String {
        FilterField::ALL
            .iter()
            .filter_map(|field| {
                self.get(*field)
                    .map(|value| format!(" --{} {}", field.query_key(), quote_arg(value)))
            })
            .collect()
    }

    /// Client-side evaluation used by the in-memory data source
    ///
    /// Search is a case-insensitive substring match on the company name; the other
    /// fields require exact equality.
    pub fn matches(&self, record: &CompanyRecord) -> bool {
        let name_match = match self.get(FilterField::Search) {
            Some(term) => record
                .name
                .as_deref()
                .unwrap_or("")
                .to_lowercase()
                .contains(&term.to_lowercase()),
            None => true,
        };

        name_match
            && field_matches(self.category.as_deref(), record.category.as_deref())
            && field_matches(self.size.as_deref(), record.size.as_deref())
            && field_matches(self.location.as_deref(), record.location.as_deref())
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn field_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        Some(wanted) => actual == Some(wanted),
        None => true,
    }
}

fn quote_arg(value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, category: &str, size: &str, location: &str) -> CompanyRecord {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": name,
            "category": category,
            "size": size,
            "location": location,
        }))
        .unwrap()
    }

    #[test]
    fn test_default_is_unconstrained() {
        let filter = FilterPredicate::default();
        assert!(filter.is_unconstrained());
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("search", String::new()),
                ("category", String::new()),
                ("size", String::new()),
                ("location", String::new()),
            ]
        );
    }

    #[test]
    fn test_empty_select_value_is_wildcard() {
        let filter = FilterPredicate::default().with(FilterField::Category, "Technology");
        assert_eq!(filter.category.as_deref(), Some("Technology"));

        let cleared = filter.with(FilterField::Category, "");
        assert_eq!(cleared.category, None);
        assert_eq!(cleared, FilterPredicate::default());
    }

    #[test]
    fn test_structural_equality_detects_no_change() {
        let filter = FilterPredicate::default().with(FilterField::Size, "51 - 100 employees");
        let same = filter.with(FilterField::Size, "51 - 100 employees");
        assert_eq!(filter, same);
    }

    #[test]
    fn test_blank_search_encodes_as_empty() {
        let filter = FilterPredicate::default().with(FilterField::Search, "   ");
        assert_eq!(filter, FilterPredicate::default());
        assert!(filter.is_unconstrained());
        assert_eq!(filter.query_pairs()[0], ("search", String::new()));
    }

    #[test]
    fn test_search_term_is_sent_as_typed() {
        let filter = FilterPredicate::default().with(FilterField::Search, "acme ");
        assert_eq!(filter.get(FilterField::Search), Some("acme "));
        assert_eq!(filter.query_pairs()[0], ("search", "acme ".to_string()));
        assert_ne!(filter, filter.with(FilterField::Search, "acme"));
    }

    #[test]
    fn test_query_pairs_carry_every_constraint() {
        let filter = FilterPredicate::default()
            .with(FilterField::Search, "acme")
            .with(FilterField::Category, "Retail")
            .with(FilterField::Location, "Canada");

        assert_eq!(
            filter.query_pairs(),
            vec![
                ("search", "acme".to_string()),
                ("category", "Retail".to_string()),
                ("size", String::new()),
                ("location", "Canada".to_string()),
            ]
        );
    }

    #[test]
    fn test_cli_args_quote_values_with_spaces() {
        let filter = FilterPredicate::default()
            .with(FilterField::Category, "Health Care")
            .with(FilterField::Location, "Japan");
        assert_eq!(
            filter.cli_args(),
            " --category \"Health Care\" --location Japan"
        );
    }

    #[test]
    fn test_matches_search_is_case_insensitive() {
        let company = record("Tech Innovators Inc.", "Technology", "Small", "London, UK");
        let filter = FilterPredicate::default().with(FilterField::Search, "innovators");
        assert!(filter.matches(&company));

        let filter = filter.with(FilterField::Category, "Retail");
        assert!(!filter.matches(&company));
    }

    #[test]
    fn test_matches_requires_exact_field_values() {
        let company = record("Company 1", "Technology", "Small", "New York, NY");
        let filter = FilterPredicate::default().with(FilterField::Location, "New York");
        assert!(!filter.matches(&company));

        let filter = FilterPredicate::default().with(FilterField::Location, "New York, NY");
        assert!(filter.matches(&company));
    }

    #[test]
    fn test_parse_filter_field() {
        assert_eq!("Category".parse::<FilterField>(), Ok(FilterField::Category));
        assert_eq!("q".parse::<FilterField>(), Ok(FilterField::Search));
        assert!("color".parse::<FilterField>().is_err());
    }
}
