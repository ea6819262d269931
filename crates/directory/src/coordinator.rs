//! Fetch coordinator runtime
//!
//! A single task owns the [`ListingState`] and is the only writer. User input
//! arrives on one channel, request completions on another; both become
//! [`ListingEvent`]s fed through the pure reducer. Requests the reducer issues
//! are spawned and report back into the completion channel, so the state is
//! never touched from more than one place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use directory_core::cursor::LoadMode;
use directory_core::error::FetchError;
use directory_core::filter::{FilterField, FilterPredicate};
use directory_core::listing::{reduce, FetchRequest, ListingEvent, ListingState, ListingView, Page};
use directory_core::trigger::BoundaryTrigger;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::prelude::*;
use crate::source::CompanySource;

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    pub mode: LoadMode,
    pub page_size: usize,
    /// Filter in place before the first request
    pub filter: FilterPredicate,
    /// Deadline applied to every listing request
    pub timeout: Option<Duration>,
    /// Visibility ratio at which the sentinel counts as reached
    pub threshold: f64,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            mode: LoadMode::Replace,
            page_size: directory_core::cursor::DEFAULT_PAGE_SIZE,
            filter: FilterPredicate::default(),
            timeout: None,
            threshold: directory_core::trigger::FULL_VISIBILITY,
        }
    }
}

/// Everything the presentation layer gets after each processed event
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Commands processed so far, used to wait for a command's effects
    pub handled: u64,
    /// Listing requests started so far
    pub requests_issued: u64,
    pub view: ListingView,
}

#[derive(Debug)]
enum Command {
    Event(ListingEvent),
    Sentinel(f64),
}

#[derive(Debug)]
struct Completion {
    request: FetchRequest,
    outcome: Result<Page, FetchError>,
}

/// Sending side handed to the presentation layer
///
/// Dropping every handle stops the coordinator once its channel drains.
#[derive(Debug)]
pub struct CoordinatorHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    sent: AtomicU64,
}

impl CoordinatorHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| eyre!("Listing coordinator has stopped"))?;
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn mount(&self) -> Result<()> {
        self.send(Command::Event(ListingEvent::Mounted))
    }

    fn set_filter(&self, field: FilterField, value: impl Into<String>) -> Result<()> {
        self.send(Command::Event(ListingEvent::FilterChanged(
            field,
            value.into(),
        )))
    }

    pub fn set_search_term(&self, term: impl Into<String>) -> Result<()> {
        self.set_filter(FilterField::Search, term)
    }

    pub fn set_category(&self, category: impl Into<String>) -> Result<()> {
        self.set_filter(FilterField::Category, category)
    }

    pub fn set_size(&self, size: impl Into<String>) -> Result<()> {
        self.set_filter(FilterField::Size, size)
    }

    pub fn set_location(&self, location: impl Into<String>) -> Result<()> {
        self.set_filter(FilterField::Location, location)
    }

    pub fn set_page(&self, page: usize) -> Result<()> {
        self.send(Command::Event(ListingEvent::PageRequested(page)))
    }

    pub fn reload(&self) -> Result<()> {
        self.send(Command::Event(ListingEvent::Reload))
    }

    /// Report the sentinel's current visibility ratio
    pub fn sentinel(&self, ratio: f64) -> Result<()> {
        self.send(Command::Sentinel(ratio))
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Wait until every command sent so far is processed and nothing is in flight
    pub async fn settled(&self) -> Result<Snapshot> {
        let sent = self.sent.load(Ordering::SeqCst);
        let mut snapshots = self.snapshots.clone();
        let snapshot = snapshots
            .wait_for(|s| s.handled >= sent && !s.view.loading)
            .await
            .map_err(|_| eyre!("Listing coordinator has stopped"))?;
        Ok(snapshot.clone())
    }
}

/// Owner of the listing state
struct Coordinator<S> {
    state: ListingState,
    trigger: BoundaryTrigger,
    source: Arc<S>,
    timeout: Option<Duration>,
    completions: mpsc::UnboundedSender<Completion>,
    snapshots: watch::Sender<Snapshot>,
    handled: u64,
    requests_issued: u64,
}

/// Start a coordinator task for `source`
pub fn spawn<S: CompanySource>(
    source: S,
    options: CoordinatorOptions,
) -> (CoordinatorHandle, JoinHandle<ListingState>) {
    let mut state = ListingState::new(options.mode, options.page_size);
    state.filter = options.filter;
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();
    let (snapshots_tx, snapshots_rx) = watch::channel(Snapshot {
        handled: 0,
        requests_issued: 0,
        view: state.view(),
    });

    let coordinator = Coordinator {
        state,
        trigger: BoundaryTrigger::new(options.threshold),
        source: Arc::new(source),
        timeout: options.timeout,
        completions: completions_tx,
        snapshots: snapshots_tx,
        handled: 0,
        requests_issued: 0,
    };

    let task = tokio::spawn(coordinator.run(commands_rx, completions_rx));
    let handle = CoordinatorHandle {
        commands: commands_tx,
        snapshots: snapshots_rx,
        sent: AtomicU64::new(0),
    };

    (handle, task)
}

impl<S: CompanySource> Coordinator<S> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) -> ListingState {
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.handled += 1;
                    match command {
                        Command::Event(event) => self.apply(event),
                        Command::Sentinel(ratio) => self.sentinel(ratio),
                    }
                }
                Some(Completion { request, outcome }) = completions.recv() => {
                    log::debug!(
                        "request {} (epoch {}) completed: {}",
                        request.tag.id,
                        request.tag.epoch,
                        match &outcome {
                            Ok(page) => f!("{} companies", page.items.len()),
                            Err(err) => err.to_string(),
                        }
                    );
                    self.apply(ListingEvent::FetchCompleted { request, outcome });
                }
            }
        }

        log::debug!("listing coordinator stopped");
        self.state
    }

    /// A crossing only counts while another page could actually be requested
    fn sentinel(&mut self, ratio: f64) {
        let ready = self.state.fetch.is_idle() && self.state.has_more();
        if self.trigger.reaches(ratio) && !ready {
            log::debug!("sentinel visible while not ready to load (ratio {ratio:.2})");
            self.publish();
        } else if self.trigger.observe(ratio) {
            log::debug!("sentinel reached (ratio {ratio:.2})");
            self.apply(ListingEvent::LoadMore);
        } else {
            self.publish();
        }
    }

    fn apply(&mut self, event: ListingEvent) {
        let completion = match &event {
            ListingEvent::FetchCompleted { request, .. } => Some(request.clone()),
            _ => None,
        };
        let epoch_before = self.state.epoch;

        let transition = reduce(std::mem::take(&mut self.state), event);
        self.state = transition.state;

        if let Some(request) = &completion {
            let merged = self.state.epoch == request.tag.epoch;
            if let Some(err) = self.state.fetch.error().filter(|_| merged) {
                log::warn!("request {} failed: {}", request.tag.id, err);
            } else if request.tag.epoch != self.state.epoch {
                log::debug!(
                    "discarded stale response for request {} (epoch {} < {})",
                    request.tag.id,
                    request.tag.epoch,
                    self.state.epoch
                );
            }
        }

        // The sentinel moves whenever the list is reset or a response lands.
        if self.state.epoch != epoch_before || completion.is_some() {
            self.trigger.rearm();
        }

        if let Some(request) = transition.request {
            self.issue(request);
        }

        self.publish();
    }

    fn issue(&mut self, request: FetchRequest) {
        self.requests_issued += 1;
        log::info!(
            "request {} (epoch {}): skip={} limit={} filter={:?}",
            request.tag.id,
            request.tag.epoch,
            request.query.skip,
            request.query.limit,
            request.query.filter
        );

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let fetch = source.fetch_page(&request.query);
            let outcome = match timeout {
                Some(limit) => tokio::time::timeout(limit, fetch)
                    .await
                    .unwrap_or(Err(FetchError::Timeout)),
                None => fetch.await,
            };
            // The coordinator may already be gone; nothing left to update then.
            let _ = completions.send(Completion { request, outcome });
        });
    }

    fn publish(&self) {
        self.snapshots.send_replace(Snapshot {
            handled: self.handled,
            requests_issued: self.requests_issued,
            view: self.state.view(),
        });
    }
}
