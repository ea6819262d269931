//! Interactive infinite-scroll listing
//!
//! Each Enter stands for the end-of-list sentinel scrolling fully into view.
//! Filters can be changed between pages; a change restarts the list from the
//! first page.

use crate::prelude::{println, *};
use anstream::print;
use colored::Colorize;
use directory_core::company::CompanyRecord;
use directory_core::cursor::{LoadMode, DEFAULT_PAGE_SIZE};
use directory_core::filter::{FilterField, FilterPredicate};
use directory_core::listing::ListingView;
use directory_core::trigger::FULL_VISIBILITY;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::coordinator::{self, CoordinatorHandle, CoordinatorOptions, Snapshot};

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct BrowseOptions {
    /// Initial name search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Initial category
    #[arg(long)]
    pub category: Option<String>,

    /// Initial size
    #[arg(long)]
    pub size: Option<String>,

    /// Initial location
    #[arg(long)]
    pub location: Option<String>,

    /// Companies fetched per batch
    #[arg(short, long, env = "DIRECTORY_LIMIT", default_value_t = DEFAULT_PAGE_SIZE)]
    pub limit: usize,
}

impl BrowseOptions {
    fn filter(&self) -> FilterPredicate {
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

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseInput {
    More,
    Search(String),
    Filter(FilterField, String),
    /// Explicit page numbers only exist in the paged listing
    Page(String),
    Retry,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_browse_input(line: &str) -> BrowseInput {
    let line = line.trim();

    if let Some(term) = line.strip_prefix('/') {
        return BrowseInput::Search(term.trim().to_string());
    }

    match line.to_lowercase().as_str() {
        "" | "m" | "more" | "n" => return BrowseInput::More,
        "r" | "retry" => return BrowseInput::Retry,
        "?" | "h" | "help" => return BrowseInput::Help,
        "q" | "quit" | "exit" => return BrowseInput::Quit,
        _ => {}
    }

    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if head.eq_ignore_ascii_case("page") {
        return BrowseInput::Page(rest.trim().to_string());
    }
    match head.parse::<FilterField>() {
        Ok(field) => BrowseInput::Filter(field, rest.trim().to_string()),
        Err(_) => BrowseInput::Unknown(line.to_string()),
    }
}

const HELP: &str = "[Enter] more | /text search by name | category|size|location <value> set a filter (no value clears) | retry | q quit";

/// Turns successive listing views into incremental terminal output
#[derive(Debug, Default)]
pub struct Renderer {
    filter: Option<FilterPredicate>,
    shown: usize,
    announced_end: bool,
}

impl Renderer {
    pub fn render(&mut self, view: &ListingView) -> String {
        let mut result = String::new();

        if self.filter.as_ref() != Some(&view.filter) || view.results.len() < self.shown {
            self.filter = Some(view.filter.clone());
            self.shown = 0;
            self.announced_end = false;
            result.push_str(&format_header(&view.filter));
        }

        for (index, record) in view.results.iter().enumerate().skip(self.shown) {
            result.push_str(&format_record(index + 1, record));
        }
        self.shown = view.results.len();

        if let Some(err) = &view.error {
            result.push_str(&format!(
                "{} {}\n",
                f!("Failed to load companies: {err}.").red(),
                "Type `retry` to try again.".yellow()
            ));
        } else if !view.has_more && !self.announced_end {
            self.announced_end = true;
            let message = if view.results.is_empty() {
                "No companies match the current filters.".to_string()
            } else {
                f!("End of results ({} companies).", view.results.len())
            };
            result.push_str(&format!("{}\n", message.yellow()));
        }

        result
    }
}

fn format_header(filter: &FilterPredicate) -> String {
    let active: Vec<String> = FilterField::ALL
        .iter()
        .filter_map(|field| {
            filter
                .get(*field)
                .map(|value| format!("{}: {}", field.to_string().green(), value))
        })
        .collect();
    let title = if active.is_empty() {
        "ALL COMPANIES".to_string()
    } else {
        active.join(" | ")
    };

    format!(
        "\n{}\n{}\n{}\n",
        "=".repeat(80).bright_cyan(),
        title.bright_cyan().bold(),
        "=".repeat(80).bright_cyan()
    )
}

fn format_record(position: usize, record: &CompanyRecord) -> String {
    let details: Vec<&str> = [&record.category, &record.size, &record.location]
        .into_iter()
        .filter_map(|value| value.as_deref())
        .collect();

    let mut line = format!(
        "{} {} {} {}\n",
        format!("[{position}]").yellow().bold(),
        record.name.as_deref().unwrap_or("(No name)").white().bold(),
        details.join(" | ").bright_black(),
        format!("(id {})", record.id).cyan()
    );
    if let Some(description) = record.description_preview() {
        line.push_str(&format!("    {}\n", description));
    }
    line
}

pub async fn run(options: BrowseOptions, global: crate::Global) -> Result<()> {
    let config = global.config()?;
    let source = global.company_source(&config)?;

    if options.limit == 0 {
        return Err(Error::InvalidInput("--limit must be at least 1".to_string()).into());
    }

    let (handle, task) = coordinator::spawn(
        source,
        CoordinatorOptions {
            mode: LoadMode::Append,
            page_size: options.limit,
            filter: options.filter(),
            timeout: config.timeout,
            ..Default::default()
        },
    );

    let mut renderer = Renderer::default();
    handle.mount()?;
    let snapshot = wait(&handle).await?;
    println!("{}", renderer.render(&snapshot.view));
    println!("{}", HELP.bright_black());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_browse_input(&line) {
            BrowseInput::More => {
                // The sentinel is off screen again once new rows are printed.
                handle.sentinel(0.0)?;
                handle.sentinel(FULL_VISIBILITY)?;
            }
            BrowseInput::Search(term) => handle.set_search_term(term)?,
            BrowseInput::Filter(field, value) => match field {
                FilterField::Search => handle.set_search_term(value)?,
                FilterField::Category => handle.set_category(value)?,
                FilterField::Size => handle.set_size(value)?,
                FilterField::Location => handle.set_location(value)?,
            },
            BrowseInput::Retry => handle.reload()?,
            BrowseInput::Help => {
                println!("{}", HELP);
                continue;
            }
            BrowseInput::Page(_) => {
                println!(
                    "{} {}",
                    "Pages are not available while browsing.".yellow(),
                    "Use `directory list --page <n>` instead.".cyan()
                );
                continue;
            }
            BrowseInput::Quit => break,
            BrowseInput::Unknown(input) => {
                println!("{} {}", "Unknown command:".red(), input);
                println!("{}", HELP.bright_black());
                continue;
            }
        }

        let snapshot = wait(&handle).await?;
        log::debug!(
            "{} requests issued, {} companies shown",
            snapshot.requests_issued,
            snapshot.view.results.len()
        );
        print!("{}", renderer.render(&snapshot.view));
    }

    drop(handle);
    task.await
        .map_err(|e| eyre!("Listing coordinator failed: {}", e))?;

    Ok(())
}

async fn wait(handle: &CoordinatorHandle) -> Result<Snapshot> {
    let spinner = new_spinner("Loading companies...");
    let snapshot = handle.settled().await;
    spinner.finish_and_clear();
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalSource;
    use directory_core::error::FetchError;

    #[test]
    fn test_parse_browse_input() {
        assert_eq!(parse_browse_input(""), BrowseInput::More);
        assert_eq!(parse_browse_input("  more "), BrowseInput::More);
        assert_eq!(
            parse_browse_input("/ acme corp"),
            BrowseInput::Search("acme corp".to_string())
        );
        assert_eq!(
            parse_browse_input("category Food & Beverage"),
            BrowseInput::Filter(FilterField::Category, "Food & Beverage".to_string())
        );
        assert_eq!(
            parse_browse_input("Location"),
            BrowseInput::Filter(FilterField::Location, String::new())
        );
        assert_eq!(
            parse_browse_input("page 3"),
            BrowseInput::Page("3".to_string())
        );
        assert_eq!(parse_browse_input("retry"), BrowseInput::Retry);
        assert_eq!(parse_browse_input("Q"), BrowseInput::Quit);
        assert_eq!(parse_browse_input("?"), BrowseInput::Help);
        assert_eq!(
            parse_browse_input("sort name"),
            BrowseInput::Unknown("sort name".to_string())
        );
    }

    fn view(results: Vec<CompanyRecord>, has_more: bool) -> ListingView {
        ListingView {
            mode: LoadMode::Append,
            filter: FilterPredicate::default(),
            results,
            total: None,
            loading: false,
            error: None,
            page: None,
            page_count: None,
            pagination_visible: false,
            has_more,
        }
    }

    #[test]
    fn test_renderer_prints_only_new_rows() {
        colored::control::set_override(false);
        let records = directory_core::local::generate_companies(4);
        let mut renderer = Renderer::default();

        let first = renderer.render(&view(records[..2].to_vec(), true));
        assert!(first.contains("ALL COMPANIES"));
        assert!(first.contains("[1] Company 1"));
        assert!(first.contains("[2] Company 2"));
        assert!(first.contains("\n    Company 2 is a dynamic organization.\n"));

        let second = renderer.render(&view(records.clone(), false));
        assert!(!second.contains("ALL COMPANIES"));
        assert!(!second.contains("Company 1 "));
        assert!(second.contains("[3] Company 3"));
        assert!(second.contains("End of results (4 companies)."));

        let third = renderer.render(&view(records, false));
        assert!(third.is_empty());
    }

    #[test]
    fn test_renderer_restarts_on_filter_change_and_shows_errors() {
        colored::control::set_override(false);
        let records = directory_core::local::generate_companies(3);
        let mut renderer = Renderer::default();
        renderer.render(&view(records.clone(), true));

        let mut filtered = view(records[..1].to_vec(), true);
        filtered.filter = FilterPredicate::default().with(FilterField::Size, "Small");
        filtered.error = Some(FetchError::Http(503));
        let text = renderer.render(&filtered);

        assert!(text.contains("size: Small"));
        assert!(text.contains("[1] Company 1"));
        assert!(text.contains("Failed to load companies: HTTP error: 503"));
    }

    #[tokio::test]
    async fn test_scrolling_appends_batches() {
        colored::control::set_override(false);
        let (handle, _task) = coordinator::spawn(
            LocalSource::new(12),
            CoordinatorOptions {
                mode: LoadMode::Append,
                page_size: 9,
                ..Default::default()
            },
        );
        let mut renderer = Renderer::default();

        handle.mount().unwrap();
        let text = renderer.render(&handle.settled().await.unwrap().view);
        assert!(text.contains("[9] Company 9"));
        assert!(!text.contains("End of results"));

        handle.sentinel(0.0).unwrap();
        handle.sentinel(FULL_VISIBILITY).unwrap();
        let text = renderer.render(&handle.settled().await.unwrap().view);
        assert!(!text.contains("[9]"));
        assert!(text.contains("[12] Company 12"));
        assert!(text.contains("End of results (12 companies)."));
    }
}
