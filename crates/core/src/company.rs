//! Company records and the tabbed detail view model
//!
//! The listing only depends on a stable identifier; everything else is kept as
//! loosely-typed JSON and interpreted here for rendering.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// Backend identifier, either numeric or a document id string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

impl<'de> Deserialize<'de> for CompanyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => CompanyId(text),
            Raw::Number(number) => CompanyId(number.to_string()),
        })
    }
}

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CompanyId {
    fn from(value: &str) -> Self {
        CompanyId(value.to_string())
    }
}

/// One entry of the listing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(alias = "_id")]
    pub id: CompanyId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Logo, revenue, description and whatever else the backend sends
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Characters of a description shown in listing rows
pub const DESCRIPTION_PREVIEW_LENGTH: usize = 150;

impl CompanyRecord {
    /// Display text for a field the listing does not model
    pub fn field_text(&self, key: &str) -> Option<String> {
        self.extra
            .get(key)
            .map(value_text)
            .filter(|text| !text.is_empty())
    }

    /// Single-line plain-text description, cut at [`DESCRIPTION_PREVIEW_LENGTH`]
    pub fn description_preview(&self) -> Option<String> {
        let text = strip_html(&self.field_text("description")?)
            .lines()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() {
            return None;
        }

        if text.chars().count() <= DESCRIPTION_PREVIEW_LENGTH {
            Some(text)
        } else {
            let cut: String = text.chars().take(DESCRIPTION_PREVIEW_LENGTH).collect();
            Some(format!("{}...", cut.trim_end()))
        }
    }
}

/// Downloadable file attached to a content item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// A `{key, value, file?}` entry of a detail section; `value` is rich text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default)]
    pub file: Option<Attachment>,
}

/// Server-defined extra tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSection {
    #[serde(default, deserialize_with = "lenient_string")]
    pub key: String,
    #[serde(default)]
    pub value: Vec<ContentItem>,
}

/// Full company document from the detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetails {
    #[serde(default, alias = "_id")]
    pub id: Option<CompanyId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub founded: Option<String>,
    #[serde(default)]
    pub headquarters: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employees: Option<Value>,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default, alias = "values")]
    pub company_values: Vec<String>,
    #[serde(
        default,
        rename = "financialStatement",
        deserialize_with = "content_items"
    )]
    pub financial_statement: Option<Vec<ContentItem>>,
    #[serde(default, deserialize_with = "content_items")]
    pub portfolio: Option<Vec<ContentItem>>,
    #[serde(default, deserialize_with = "content_items")]
    pub assessment: Option<Vec<ContentItem>>,
    #[serde(default, deserialize_with = "content_items")]
    pub investors: Option<Vec<ContentItem>>,
    #[serde(default, rename = "dynamicSections")]
    pub dynamic_sections: Vec<DynamicSection>,
}

// =============================================================================
// Output Types (Serialization)
// =============================================================================

/// Labelled fact shown in the About tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFact {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutSection {
    pub description: Option<String>,
    pub key_information: Vec<KeyFact>,
    pub financial_highlights: Vec<ContentItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TabContent {
    About(AboutSection),
    Items(Vec<ContentItem>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub label: String,
    pub content: TabContent,
}

// =============================================================================
// Pure Transformation Functions
// =============================================================================

/// Build the detail view tabs
///
/// About is always first. Portfolio, Financial Highlights, Assessment and
/// Investors follow when the backend sent them, then one tab per dynamic section
/// in server order.
pub fn build_tabs(details: &CompanyDetails) -> Vec<Tab> {
    let mut tabs = vec![Tab {
        label: "About Us".to_string(),
        content: TabContent::About(about_section(details)),
    }];

    let fixed = [
        ("Portfolio", &details.portfolio),
        ("Financial Highlights", &details.financial_statement),
        ("Assessment", &details.assessment),
        ("Investors", &details.investors),
    ];

    for (label, items) in fixed {
        if let Some(items) = items {
            tabs.push(Tab {
                label: label.to_string(),
                content: TabContent::Items(items.clone()),
            });
        }
    }

    for section in &details.dynamic_sections {
        tabs.push(Tab {
            label: section.key.clone(),
            content: TabContent::Items(section.value.clone()),
        });
    }

    tabs
}

/// Find a tab by case-insensitive label or by 1-based position
pub fn find_tab<'a>(tabs: &'a [Tab], selector: &str) -> Option<&'a Tab> {
    let selector = selector.trim();
    if let Ok(position) = selector.parse::<usize>() {
        return position.checked_sub(1).and_then(|index| tabs.get(index));
    }
    tabs.iter()
        .find(|tab| tab.label.eq_ignore_ascii_case(selector))
}

fn about_section(details: &CompanyDetails) -> AboutSection {
    let mut facts = Vec::new();
    let mut push = |label: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            facts.push(KeyFact {
                label: label.to_string(),
                value,
            });
        }
    };

    push("Category", details.category.clone());
    push("Size", details.size.clone());
    push("Founded", details.founded.as_deref().map(format_founded));
    push("Headquarters", details.headquarters.clone());
    push("Location", details.location.clone());
    push("Employees", details.employees.as_ref().map(value_text));
    push("Mission", details.mission.as_deref().map(strip_html));
    push(
        "Values",
        (!details.company_values.is_empty()).then(|| details.company_values.join(", ")),
    );

    AboutSection {
        description: details
            .description
            .as_deref()
            .map(strip_html)
            .filter(|d| !d.is_empty()),
        key_information: facts,
        financial_highlights: details.financial_statement.clone().unwrap_or_default(),
    }
}

/// Render a founding date as `YYYY-MM-DD`, falling back to the raw text
pub fn format_founded(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    raw.to_string()
}

/// Strip HTML tags and decode HTML entities from server rich text
pub fn strip_html(text: &str) -> String {
    let breaks = Regex::new(r"(?i)<br\s*/?>|</p>|</li>").unwrap();
    let tags = Regex::new(r"<[^>]*>").unwrap();

    let with_breaks = breaks.replace_all(text, "\n");
    let stripped = tags.replace_all(&with_breaks, "");
    let decoded = html_escape::decode_html_entities(&stripped);

    decoded
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain text for a loosely-typed JSON value
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_text(&Value::deserialize(deserializer)?))
}

/// Accept either an array of items or a plain `{key: value}` object
fn content_items<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<ContentItem>>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Value::Object(map) => Ok(Some(
            map.into_iter()
                .map(|(key, value)| ContentItem {
                    key,
                    value: value_text(&value),
                    file: None,
                })
                .collect(),
        )),
        other => Err(serde::de::Error::custom(format!(
            "expected a list of sections, got {other}"
        ))),
    }
}
