use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use directory_core::company::{
    build_tabs, find_tab, strip_html, AboutSection, CompanyDetails, CompanyId, ContentItem, Tab,
    TabContent,
};
use serde::Serialize;

use crate::source::CompanySource;

#[derive(Debug, clap::Args, serde::Serialize, serde::Deserialize, Clone)]
pub struct ShowOptions {
    /// Company ID
    #[clap(env = "DIRECTORY_COMPANY")]
    pub id: String,

    /// Tab to display, by label (e.g. "Portfolio") or 1-based position
    #[arg(short, long, default_value = "1")]
    pub tab: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct ShowOutput {
    pub company: CompanyDetails,
    pub tabs: Vec<String>,
    pub selected: Tab,
}

pub async fn run(options: ShowOptions, global: crate::Global) -> Result<()> {
    let config = global.config()?;
    let source = global.company_source(&config)?;

    if global.verbose {
        eprintln!("Fetching company {}...", options.id);
    }

    let spinner = (!options.json).then(|| new_spinner("Fetching company..."));
    let output = show_company_data(&source, &options).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let output = output?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_company_text(&output, config.api_base()));
    }

    Ok(())
}

/// Fetch a company and select one of its tabs
pub async fn show_company_data<S: CompanySource>(
    source: &S,
    options: &ShowOptions,
) -> Result<ShowOutput> {
    let id = options.id.trim();
    if id.is_empty() {
        return Err(Error::InvalidInput("Company ID must not be empty".to_string()).into());
    }

    let company = source
        .fetch_company(&CompanyId::from(id))
        .await
        .map_err(Error::from)
        .wrap_err_with(|| f!("Failed to fetch company {id}"))?;

    let tabs = build_tabs(&company);
    let selected = find_tab(&tabs, &options.tab).cloned().ok_or_else(|| {
        eyre!(
            "Unknown tab: {}. Available tabs: {}",
            options.tab,
            tabs.iter()
                .map(|tab| tab.label.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    Ok(ShowOutput {
        tabs: tabs.into_iter().map(|tab| tab.label).collect(),
        company,
        selected,
    })
}

/// Absolute link for an attachment; relative paths live on the backend
fn resolve_file_url(base: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("{}/{}", base, url.trim_start_matches('/'))
    }
}

fn format_about(about: &AboutSection, result: &mut String) {
    if let Some(description) = &about.description {
        result.push_str(&format!("\n{}\n", description));
    }

    if !about.key_information.is_empty() {
        result.push_str(&format!("\n{}\n", "Key Information".bright_white().bold()));
        let mut table = new_table();
        for fact in &about.key_information {
            table.add_row(prettytable::row![fact.label, fact.value]);
        }
        result.push_str(&table.to_string());
    }

    if !about.financial_highlights.is_empty() {
        result.push_str(&format!(
            "\n{}\n",
            "Financial Highlights".bright_white().bold()
        ));
        let mut table = new_table();
        for item in &about.financial_highlights {
            table.add_row(prettytable::row![item.key, strip_html(&item.value)]);
        }
        result.push_str(&table.to_string());
    }
}

fn format_items(items: &[ContentItem], base: &str, result: &mut String) {
    if items.is_empty() {
        result.push_str(&format!("\n{}\n", "Nothing listed yet.".yellow()));
        return;
    }

    for item in items {
        result.push_str(&format!("\n{}\n", item.key.bright_white().bold()));
        let value = strip_html(&item.value);
        if !value.is_empty() {
            for line in value.lines() {
                result.push_str(&format!("  {}\n", line));
            }
        }
        if let Some(url) = item.file.as_ref().and_then(|file| file.file_url.as_deref()) {
            let name = item
                .file
                .as_ref()
                .and_then(|file| file.filename.as_deref())
                .unwrap_or("Download");
            result.push_str(&format!(
                "  {}: {}\n",
                name.green(),
                resolve_file_url(base, url).cyan().underline()
            ));
        }
    }
}

/// Convert the company view to formatted text with colors
fn format_company_text(output: &ShowOutput, base: &str) -> String {
    let mut result = String::new();
    let company = &output.company;

    result.push_str(&format!("\n{}\n", "=".repeat(80).bright_cyan()));
    result.push_str(&format!(
        "{}\n",
        company
            .name
            .as_deref()
            .unwrap_or("(No name)")
            .bright_cyan()
            .bold()
    ));
    result.push_str(&format!("{}\n", "=".repeat(80).bright_cyan()));
    if let Some(website) = &company.website {
        result.push_str(&format!("{}: {}\n", "Website".green(), website.cyan().underline()));
    }

    let tabs: Vec<String> = output
        .tabs
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let entry = f!("{} {}", index + 1, label);
            if *label == output.selected.label {
                f!("[{}]", entry).yellow().bold().to_string()
            } else {
                entry.bright_black().to_string()
            }
        })
        .collect();
    result.push_str(&format!("\n{}\n", tabs.join("  ")));

    result.push_str(&format!(
        "\n{}\n{}\n",
        output.selected.label.to_uppercase().bright_yellow().bold(),
        "-".repeat(80).bright_yellow()
    ));

    match &output.selected.content {
        TabContent::About(about) => format_about(about, &mut result),
        TabContent::Items(items) => format_items(items, base, &mut result),
    }

    if let Some(id) = &company.id {
        result.push_str(&format!(
            "\n{}: {}\n",
            "Other tabs".bright_white().bold(),
            format!("directory show {} --tab <label|number>", id).cyan()
        ));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LocalSource;
    use directory_core::company::Attachment;
    use directory_core::error::FetchError;

    fn options(id: &str, tab: &str) -> ShowOptions {
        ShowOptions {
            id: id.to_string(),
            tab: tab.to_string(),
            json: false,
        }
    }

    #[tokio::test]
    async fn test_shows_about_tab_by_default() {
        let output = show_company_data(&LocalSource::new(5), &options("3", "1"))
            .await
            .unwrap();

        assert_eq!(output.tabs[0], "About Us");
        assert_eq!(output.selected.label, "About Us");
        assert_eq!(output.company.name.as_deref(), Some("Company 3"));

        colored::control::set_override(false);
        let text = format_company_text(&output, "http://localhost");
        assert!(text.contains("Company 3"));
        assert!(text.contains("Key Information"));
        assert!(text.contains("Founded"));
        assert!(text.contains("1982-01-01"));
        assert!(text.contains("[1 About Us]"));
    }

    #[tokio::test]
    async fn test_selects_tab_by_label() {
        let output = show_company_data(&LocalSource::new(5), &options("2", "financial highlights"))
            .await
            .unwrap();

        assert_eq!(output.selected.label, "Financial Highlights");
        match &output.selected.content {
            TabContent::Items(items) => assert_eq!(items[0].key, "Revenue"),
            other => panic!("unexpected tab content: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_tab_lists_available_tabs() {
        let err = show_company_data(&LocalSource::new(5), &options("2", "Reviews"))
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Unknown tab: Reviews"));
        assert!(message.contains("About Us"));
    }

    #[tokio::test]
    async fn test_missing_company_keeps_fetch_error() {
        let err = show_company_data(&LocalSource::new(5), &options("99", "1"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch company 99");
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Fetch(FetchError::Http(404)))
        ));
    }

    #[test]
    fn test_items_render_plain_text_and_links() {
        colored::control::set_override(false);
        let items = vec![ContentItem {
            key: "Rockets".to_string(),
            value: "<p>Fast &amp; reusable</p><p>Orbital</p>".to_string(),
            file: Some(Attachment {
                filename: Some("deck.pdf".to_string()),
                file_url: Some("/uploads/deck.pdf".to_string()),
            }),
        }];
        let mut text = String::new();
        format_items(&items, "https://backend.example", &mut text);

        assert!(text.contains("Rockets"));
        assert!(text.contains("  Fast & reusable\n  Orbital\n"));
        assert!(text.contains("deck.pdf: https://backend.example/uploads/deck.pdf"));
    }

    #[test]
    fn test_resolve_file_url() {
        assert_eq!(
            resolve_file_url("https://b.example", "https://cdn.example/a.pdf"),
            "https://cdn.example/a.pdf"
        );
        assert_eq!(
            resolve_file_url("https://b.example", "files/a.pdf"),
            "https://b.example/files/a.pdf"
        );
    }
}
