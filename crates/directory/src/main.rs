use crate::prelude::{eprintln, *};
use clap::Parser;
use std::time::Duration;

mod browse;
mod config;
mod coordinator;
mod error;
mod list;
mod prelude;
mod show;
mod source;

use crate::config::DirectoryConfig;
use crate::source::{AnySource, SourceKind};

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Browse, filter and inspect the company directory"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Where companies come from
    #[clap(
        long,
        value_enum,
        env = "DIRECTORY_SOURCE",
        global = true,
        default_value = "remote"
    )]
    source: SourceKind,

    /// Admin backend base URL (overrides DIRECTORY_BASE_URL)
    #[clap(long, global = true)]
    base_url: Option<String>,

    /// Basic auth username (overrides DIRECTORY_USERNAME)
    #[clap(long, global = true)]
    username: Option<String>,

    /// Basic auth password (overrides DIRECTORY_PASSWORD)
    #[clap(long, global = true)]
    password: Option<String>,

    /// Request timeout in seconds, 0 disables it (overrides DIRECTORY_TIMEOUT_SECS)
    #[clap(long, global = true)]
    timeout: Option<u64>,

    /// Number of generated companies for the local source
    #[clap(
        long,
        env = "DIRECTORY_LOCAL_COUNT",
        global = true,
        default_value = "500"
    )]
    local_count: usize,

    /// Simulated latency for the local source, in milliseconds
    #[clap(
        long,
        env = "DIRECTORY_LOCAL_LATENCY_MS",
        global = true,
        default_value = "0"
    )]
    local_latency_ms: u64,

    /// Whether to display additional information.
    #[clap(long, env = "DIRECTORY_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

impl Global {
    /// Environment configuration with the command line applied on top
    pub fn config(&self) -> Result<DirectoryConfig> {
        Ok(DirectoryConfig::from_env()?.with_overrides(
            self.base_url.clone(),
            self.username.clone(),
            self.password.clone(),
            self.timeout,
        ))
    }

    pub fn company_source(&self, config: &DirectoryConfig) -> Result<AnySource> {
        if self.verbose {
            match self.source {
                SourceKind::Remote => eprintln!("Backend: {}", config.api_base()),
                SourceKind::Local => eprintln!(
                    "Local source: {} companies, {}ms latency",
                    self.local_count, self.local_latency_ms
                ),
            }
        }

        AnySource::from_options(
            self.source,
            config,
            self.local_count,
            Duration::from_millis(self.local_latency_ms),
        )
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List one page of companies
    List(crate::list::ListOptions),

    /// Scroll through companies interactively, loading more as you go
    Browse(crate::browse::BrowseOptions),

    /// Show a company's detail tabs
    Show(crate::show::ShowOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::List(options) => crate::list::run(options, app.global).await,
        SubCommands::Browse(options) => crate::browse::run(options, app.global).await,
        SubCommands::Show(options) => crate::show::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
