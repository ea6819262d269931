use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use directory_core::company::CompanyRecord;
use directory_core::cursor::{validate_page, LoadMode, DEFAULT_PAGE_SIZE};
use directory_core::filter::{FilterField, FilterPredicate};
use directory_core::listing::{build_list_output, ListOutput};

use crate::coordinator::{self, CoordinatorOptions};
use crate::source::CompanySource;

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ListOptions {
    /// Case-insensitive match on the company name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Exact category (e.g. "Technology")
    #[arg(long)]
    pub category: Option<String>,

    /// Exact size (Small, Medium, Large)
    #[arg(long)]
    pub size: Option<String>,

    /// Exact location (e.g. "London, UK")
    #[arg(long)]
    pub location: Option<String>,

    /// Number of companies per page
    #[arg(short, long, env = "DIRECTORY_LIMIT", default_value_t = DEFAULT_PAGE_SIZE)]
    pub limit: usize,

    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListOptions {
    pub fn filter(&self) -> FilterPredicate {
        [
            (FilterField::Search, &self.search),
            (FilterField::Category, &self.category),
            (FilterField::Size, &self.size),
            (FilterField::Location, &self.location),
        ]
        .into_iter()
        .fold(FilterPredicate::default(), |filter, (field, value)| match value {
            Some(value) => filter.with(field, value),
            None => filter,
        })
    }
}

pub async fn run(options: ListOptions, global: crate::Global) -> Result<()> {
    let config = global.config()?;
    let source = global.company_source(&config)?;

    if global.verbose {
        eprintln!("Fetching page {} of companies...", options.page);
    }

    let spinner = (!options.json).then(|| new_spinner("Fetching companies..."));
    let output = list_companies_data(source, &options, config.timeout).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let output = output?;

    if options.json {
        println!("{}", format_list_json(&output)?);
    } else {
        println!("{}", format_list_text(&output));
    }

    Ok(())
}

/// Fetch one page of companies through the listing coordinator
pub async fn list_companies_data<S: CompanySource>(
    source: S,
    options: &ListOptions,
    timeout: Option<std::time::Duration>,
) -> Result<ListOutput> {
    if options.limit == 0 {
        return Err(Error::InvalidInput("--limit must be at least 1".to_string()).into());
    }
    validate_page(options.page, options.limit, None).map_err(|e| eyre!("{}", e))?;

    let (handle, task) = coordinator::spawn(
        source,
        CoordinatorOptions {
            mode: LoadMode::Replace,
            page_size: options.limit,
            filter: options.filter(),
            timeout,
            ..Default::default()
        },
    );

    handle.mount()?;
    let mut snapshot = handle.settled().await?;

    if options.page > 1 && snapshot.view.error.is_none() {
        validate_page(options.page, options.limit, snapshot.view.page_count).map_err(|e| eyre!("{}", e))?;
        handle.set_page(options.page)?;
        snapshot = handle.settled().await?;
    }

    drop(handle);
    task.await
        .map_err(|e| eyre!("Listing coordinator failed: {}", e))?;

    if let Some(err) = snapshot.view.error {
        return Err(Error::from(err)).wrap_err("Failed to fetch companies");
    }

    Ok(build_list_output(&snapshot.view, options.limit))
}

/// Convert list output to JSON string
fn format_list_json(output: &ListOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn record_row(record: &CompanyRecord) -> prettytable::Row {
    prettytable::row![
        record.id,
        cell(record.name.as_deref()),
        cell(record.category.as_deref()),
        cell(record.size.as_deref()),
        cell(record.location.as_deref()),
        record.field_text("revenue").unwrap_or_else(|| "-".to_string()),
        record.description_preview().unwrap_or_else(|| "-".to_string())
    ]
}

/// Convert list output to formatted text with colors
fn format_list_text(output: &ListOutput) -> String {
    let mut result = String::new();
    let pagination = &output.pagination;
    let total_pages = pagination
        .total_pages
        .map(|pages| pages.to_string())
        .unwrap_or_else(|| "?".to_string());

    // Header
    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n",
        format!(
            "COMPANY DIRECTORY (Page {} of {})",
            pagination.current_page, total_pages
        )
        .bright_cyan()
        .bold()
    ));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));

    let active: Vec<String> = FilterField::ALL
        .iter()
        .filter_map(|field| {
            output
                .filter
                .get(*field)
                .map(|value| format!("{}: {}", field.to_string().green(), value.bright_white()))
        })
        .collect();
    if !active.is_empty() {
        result.push_str(&format!("{}\n", active.join(" | ")));
    }

    if output.items.is_empty() {
        result.push_str(&format!(
            "\n{}\n",
            "No companies match the current filters.".yellow()
        ));
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row![
            "ID",
            "Name",
            "Category",
            "Size",
            "Location",
            "Revenue",
            "Description"
        ]);
        for record in &output.items {
            table.add_row(record_row(record));
        }
        result.push('\n');
        result.push_str(&table.to_string());
    }

    // Navigation only makes sense when there is more than one page.
    let paginated = pagination
        .total_items
        .is_some_and(|total| total > pagination.limit)
        || (pagination.total_items.is_none() && pagination.next_page_command.is_some());
    if paginated {
        result.push_str(&format!("\n{}\n", "=".repeat(80).bright_yellow()));
        result.push_str(&format!("{}\n", "NAVIGATION".bright_yellow().bold()));
        result.push_str(&format!("{}\n", "=".repeat(80).bright_yellow()));

        if let Some(total) = pagination.total_items {
            result.push_str(&format!(
                "\n{} {} {} {} ({} {})\n",
                "Showing page".bright_white(),
                pagination.current_page.to_string().bright_cyan().bold(),
                "of".bright_white(),
                total_pages.bright_cyan().bold(),
                total.to_string().bright_cyan().bold(),
                "matching companies".bright_white()
            ));
        }

        result.push_str(&format!("\n{}:\n", "To navigate".bright_white().bold()));
        if let Some(next) = &pagination.next_page_command {
            result.push_str(&format!("  {}: {}\n", "Next page".green(), next.cyan()));
        }
        if let Some(prev) = &pagination.prev_page_command {
            result.push_str(&format!("  {}: {}\n", "Previous page".green(), prev.cyan()));
        }
    }

    result.push_str(&format!("\n{}:\n", "To view a company".bright_white().bold()));
    result.push_str(&format!("  {}\n", "directory show <id>".cyan()));
    if let Some(first) = output.items.first() {
        result.push_str(&format!(
            "  {}: {}\n",
            "Example".green(),
            format!("directory show {}", first.id).cyan()
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalSource;

    fn options(page: usize) -> ListOptions {
        ListOptions {
            search: None,
            category: None,
            size: None,
            location: None,
            limit: 9,
            page,
            json: false,
        }
    }

    #[test]
    fn test_filter_from_flags() {
        let filter = ListOptions {
            search: Some("acme".to_string()),
            category: Some("Technology".to_string()),
            location: Some("".to_string()),
            ..options(1)
        }
        .filter();

        assert_eq!(filter.get(FilterField::Search), Some("acme"));
        assert_eq!(filter.get(FilterField::Category), Some("Technology"));
        assert_eq!(filter.get(FilterField::Size), None);
        assert_eq!(filter.get(FilterField::Location), None);
    }

    #[tokio::test]
    async fn test_lists_requested_page() {
        let output = list_companies_data(LocalSource::new(25), &options(2), None)
            .await
            .unwrap();

        assert_eq!(output.items.len(), 9);
        assert_eq!(output.items[0].id.to_string(), "10");
        assert_eq!(output.pagination.current_page, 2);
        assert_eq!(output.pagination.total_pages, Some(3));
        assert_eq!(
            output.pagination.next_page_command.as_deref(),
            Some("directory list --limit 9 --page 3")
        );
        assert_eq!(
            output.pagination.prev_page_command.as_deref(),
            Some("directory list --limit 9 --page 1")
        );
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_an_error() {
        let err = list_companies_data(LocalSource::new(25), &options(4), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Page 4 is out of range. Only 3 pages available."
        );
    }

    #[tokio::test]
    async fn test_unaddressable_page_is_an_error() {
        let page = usize::MAX / 2;
        let err = list_companies_data(LocalSource::new(25), &options(page), None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Page {page} is out of range for 9 companies per page")
        );
    }

    #[tokio::test]
    async fn test_zero_limit_is_rejected() {
        let options = ListOptions {
            limit: 0,
            ..options(1)
        };
        let err = list_companies_data(LocalSource::new(25), &options, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--limit"));
    }

    #[tokio::test]
    async fn test_single_page_has_no_navigation() {
        let output = list_companies_data(
            LocalSource::new(90),
            &ListOptions {
                category: Some("Technology".to_string()),
                ..options(1)
            },
            None,
        )
        .await
        .unwrap();

        assert_eq!(output.items.len(), 9);
        assert_eq!(output.pagination.next_page_command, None);

        colored::control::set_override(false);
        let text = format_list_text(&output);
        assert!(!text.contains("NAVIGATION"));
        assert!(text.contains("category: Technology"));
        assert!(text.contains("directory show 1"));
        assert!(text.contains("Description"));
        assert!(text.contains("Company 1 is a dynamic organization."));
    }

    #[tokio::test]
    async fn test_filtered_navigation_keeps_flags() {
        let output = list_companies_data(
            LocalSource::new(200),
            &ListOptions {
                size: Some("Large".to_string()),
                location: Some("London, UK".to_string()),
                ..options(1)
            },
            None,
        )
        .await
        .unwrap();

        assert!(output
            .items
            .iter()
            .all(|r| r.location.as_deref() == Some("London, UK")));
        assert_eq!(
            output.pagination.next_page_command.as_deref(),
            Some("directory list --size Large --location \"London, UK\" --limit 9 --page 2")
        );
    }
}
