//! Deterministic in-memory company data
//!
//! Generates sample companies and answers listing queries against them, so the
//! listing can be exercised without a backend.

use serde_json::{json, Map, Value};

use crate::company::{CompanyDetails, CompanyId, CompanyRecord, ContentItem};
use crate::listing::{ListingQuery, Page};

pub const SAMPLE_CATEGORIES: [&str; 10] = [
    "Technology",
    "Food & Beverage",
    "Environmental",
    "Healthcare",
    "Finance",
    "Retail",
    "Education",
    "Manufacturing",
    "Energy",
    "Transportation",
];

const SAMPLE_SIZES: [&str; 3] = ["Small", "Medium", "Large"];
const SAMPLE_LOCATIONS: [&str; 3] = ["San Francisco, CA", "New York, NY", "London, UK"];
const SAMPLE_HEADQUARTERS: [&str; 4] = ["San Francisco", "New York", "London", "Tokyo"];

/// Sample company number `index + 1`
pub fn generate_company(index: usize) -> CompanyRecord {
    let number = index + 1;
    let mut extra = Map::new();
    extra.insert("employees".into(), json!((index * 37 + 12) % 1000));
    extra.insert("revenue".into(), json!((index * 7919 + 1000) % 1_000_000));
    extra.insert(
        "description".into(),
        Value::String(format!("Company {number} is a dynamic organization.")),
    );
    extra.insert("logo".into(), Value::String(format!("logos/{}.jpg", index % 5 + 1)));
    extra.insert(
        "website".into(),
        Value::String(format!("https://company{number}.com")),
    );

    CompanyRecord {
        id: CompanyId(number.to_string()),
        name: Some(format!("Company {number}")),
        category: Some(SAMPLE_CATEGORIES[index % SAMPLE_CATEGORIES.len()].to_string()),
        size: Some(SAMPLE_SIZES[index % SAMPLE_SIZES.len()].to_string()),
        location: Some(SAMPLE_LOCATIONS[index % SAMPLE_LOCATIONS.len()].to_string()),
        extra,
    }
}

pub fn generate_companies(count: usize) -> Vec<CompanyRecord> {
    (0..count).map(generate_company).collect()
}

/// Answer a listing query: filter, then window by skip/limit
pub fn local_page(records: &[CompanyRecord], query: &ListingQuery) -> Page {
    let matching: Vec<&CompanyRecord> = records
        .iter()
        .filter(|record| query.filter.matches(record))
        .collect();

    Page {
        total: Some(matching.len()),
        items: matching
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .cloned()
            .collect(),
    }
}

/// Detail document for a generated company
pub fn local_details(record: &CompanyRecord) -> CompanyDetails {
    let index = record
        .id
        .0
        .parse::<usize>()
        .map(|n| n.saturating_sub(1))
        .unwrap_or(0);

    let item = |key: &str, value: String| ContentItem {
        key: key.to_string(),
        value,
        file: None,
    };

    CompanyDetails {
        id: Some(record.id.clone()),
        name: record.name.clone(),
        logo: record.field_text("logo"),
        website: record.field_text("website"),
        description: record.field_text("description"),
        category: record.category.clone(),
        size: record.size.clone(),
        founded: Some(format!("{}-01-01", 1980 + index % 40)),
        headquarters: Some(SAMPLE_HEADQUARTERS[index % SAMPLE_HEADQUARTERS.len()].to_string()),
        location: record.location.clone(),
        employees: record.extra.get("employees").cloned(),
        mission: Some("Our mission is to lead innovation.".to_string()),
        company_values: ["Integrity", "Innovation", "Excellence", "Collaboration"]
            .iter()
            .map(|v| v.to_string())
            .collect(),
        financial_statement: Some(vec![
            item("Revenue", record.field_text("revenue").unwrap_or_default()),
            item("Profit", ((index * 4099 + 500) % 500_000).to_string()),
        ]),
        portfolio: None,
        assessment: None,
        investors: None,
        dynamic_sections: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterField, FilterPredicate};

    fn query(filter: FilterPredicate, skip: usize, limit: usize) -> ListingQuery {
        ListingQuery {
            filter,
            skip,
            limit,
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate_company(4), generate_company(4));
        let first = generate_company(0);
        assert_eq!(first.id.to_string(), "1");
        assert_eq!(first.name.as_deref(), Some("Company 1"));
        assert_eq!(first.category.as_deref(), Some("Technology"));
        assert_eq!(first.size.as_deref(), Some("Small"));
        assert_eq!(first.location.as_deref(), Some("San Francisco, CA"));
    }

    #[test]
    fn test_local_page_windows_results() {
        let records = generate_companies(25);
        let page = local_page(&records, &query(FilterPredicate::default(), 18, 9));
        assert_eq!(page.total, Some(25));
        assert_eq!(page.items.len(), 7);
        assert_eq!(page.items[0].id.to_string(), "19");
    }

    #[test]
    fn test_local_page_filters_before_windowing() {
        let records = generate_companies(100);
        let filter = FilterPredicate::default().with(FilterField::Category, "Technology");
        let page = local_page(&records, &query(filter, 0, 9));

        assert_eq!(page.total, Some(10));
        assert_eq!(page.items.len(), 9);
        assert!(page
            .items
            .iter()
            .all(|r| r.category.as_deref() == Some("Technology")));
    }

    #[test]
    fn test_local_page_past_end_is_empty() {
        let records = generate_companies(5);
        let page = local_page(&records, &query(FilterPredicate::default(), 10, 9));
        assert!(page.items.is_empty());
        assert_eq!(page.total, Some(5));
    }

    #[test]
    fn test_local_details() {
        let record = generate_company(2);
        let details = local_details(&record);
        assert_eq!(details.id, Some(record.id.clone()));
        assert_eq!(details.founded.as_deref(), Some("1982-01-01"));
        assert_eq!(details.headquarters.as_deref(), Some("London"));
        assert_eq!(details.financial_statement.as_ref().map(Vec::len), Some(2));
    }
}
