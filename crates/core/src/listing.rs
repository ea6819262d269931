//! Listing controller state machine
//!
//! Owns the filter, the page cursor, the visible result set and the fetch
//! state. Every change goes through [`reduce`], a pure function from a state
//! and an event to the next state plus at most one request for the shell to
//! perform. Completions come back as [`ListingEvent::FetchCompleted`], which
//! makes async interleavings ordinary, replayable input.
//!
//! Invariants maintained here:
//!
//! - At most one request is in flight. The guard is set when the request is
//!   *described*, before the shell starts any I/O.
//! - Every filter change bumps the epoch and resets the cursor. A completion
//!   issued under an older epoch, or for a cursor position that is no longer
//!   current, is discarded instead of merged.
//! - Filter and page changes made while a request is in flight are coalesced
//!   into a single pending reload (latest wins). `LoadMore` while in flight is
//!   dropped.

use serde::{Deserialize, Serialize};

use crate::company::CompanyRecord;
use crate::cursor::{self, LoadMode, PageCursor};
use crate::error::FetchError;
use crate::filter::{FilterField, FilterPredicate};

/// Counter bumped on every filter change
pub type Epoch = u64;

/// Identity of an issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTag {
    pub id: u64,
    pub epoch: Epoch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum FetchState {
    #[default]
    Idle,
    InFlight(RequestTag),
    Failed(FetchError),
}

impl FetchState {
    pub fn is_idle(&self) -> bool {
        matches!(self, FetchState::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, FetchState::InFlight(_))
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// What to ask the backend for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub filter: FilterPredicate,
    pub skip: usize,
    pub limit: usize,
}

impl ListingQuery {
    /// Full query string: filter constraints followed by the pagination window
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.filter.query_pairs();
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("skip", self.skip.to_string()));
        pairs
    }
}

/// A request the shell must perform and report back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub tag: RequestTag,
    pub query: ListingQuery,
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<CompanyRecord>,
    /// Total matching companies, when the backend reports it
    pub total: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingEvent {
    /// The view was shown; load the first page
    Mounted,
    /// A filter input changed (empty string = no constraint)
    FilterChanged(FilterField, String),
    /// Explicit page selection, replace mode only
    PageRequested(usize),
    /// The sentinel was reached, append mode only
    LoadMore,
    /// Re-issue the current cursor after a failure
    Reload,
    /// A previously issued request finished
    FetchCompleted {
        request: FetchRequest,
        outcome: Result<Page, FetchError>,
    },
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ListingState,
    pub request: Option<FetchRequest>,
}

/// Complete listing state, serializable for inspection and tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingState {
    pub mode: LoadMode,
    pub page_size: usize,
    pub filter: FilterPredicate,
    pub epoch: Epoch,
    pub cursor: PageCursor,
    pub results: Vec<CompanyRecord>,
    pub total: Option<usize>,
    pub fetch: FetchState,
    /// A reload was requested while a fetch was in flight
    pub pending: bool,
    /// Append mode reached the end of the matching companies
    pub exhausted: bool,
    next_request_id: u64,
}

impl Default for ListingState {
    fn default() -> Self {
        Self::new(LoadMode::default(), cursor::DEFAULT_PAGE_SIZE)
    }
}

impl ListingState {
    pub fn new(mode: LoadMode, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            mode,
            page_size,
            filter: FilterPredicate::default(),
            epoch: 0,
            cursor: PageCursor::initial(mode, page_size),
            results: Vec::new(),
            total: None,
            fetch: FetchState::Idle,
            pending: false,
            exhausted: false,
            next_request_id: 1,
        }
    }

    pub fn set_search_term(self, term: &str) -> Transition {
        reduce(self, ListingEvent::FilterChanged(FilterField::Search, term.to_string()))
    }

    pub fn set_category(self, category: &str) -> Transition {
        reduce(
            self,
            ListingEvent::FilterChanged(FilterField::Category, category.to_string()),
        )
    }

    pub fn set_size(self, size: &str) -> Transition {
        reduce(self, ListingEvent::FilterChanged(FilterField::Size, size.to_string()))
    }

    pub fn set_location(self, location: &str) -> Transition {
        reduce(
            self,
            ListingEvent::FilterChanged(FilterField::Location, location.to_string()),
        )
    }

    pub fn set_page(self, page: usize) -> Transition {
        reduce(self, ListingEvent::PageRequested(page))
    }

    pub fn load_more(self) -> Transition {
        reduce(self, ListingEvent::LoadMore)
    }

    /// Query for the current filter and cursor
    pub fn current_query(&self) -> ListingQuery {
        ListingQuery {
            filter: self.filter.clone(),
            skip: self.cursor.skip(),
            limit: self.cursor.limit(),
        }
    }

    pub fn page_count(&self) -> Option<usize> {
        self.total
            .map(|total| cursor::page_count(total, self.page_size))
    }

    pub fn has_more(&self) -> bool {
        self.mode == LoadMode::Append && !self.exhausted
    }

    /// Snapshot for the presentation layer
    pub fn view(&self) -> ListingView {
        let (page, page_count, pagination_visible) = match self.mode {
            LoadMode::Replace => (
                self.cursor.page(),
                self.page_count(),
                self.total
                    .is_some_and(|total| cursor::pagination_visible(total, self.page_size)),
            ),
            LoadMode::Append => (None, None, false),
        };

        ListingView {
            mode: self.mode,
            filter: self.filter.clone(),
            results: self.results.clone(),
            total: self.total,
            loading: self.fetch.is_in_flight(),
            error: self.fetch.error().cloned(),
            page,
            page_count,
            pagination_visible,
            has_more: self.has_more(),
        }
    }

    /// Describe a request for the current cursor, or defer it behind the
    /// in-flight one
    fn request_current(&mut self) -> Option<FetchRequest> {
        if self.fetch.is_in_flight() {
            self.pending = true;
            return None;
        }

        let tag = RequestTag {
            id: self.next_request_id,
            epoch: self.epoch,
        };
        self.next_request_id += 1;
        self.fetch = FetchState::InFlight(tag);
        self.pending = false;

        Some(FetchRequest {
            tag,
            query: self.current_query(),
        })
    }

    fn is_current(&self, request: &FetchRequest) -> bool {
        request.tag.epoch == self.epoch
            && request.query.skip == self.cursor.skip()
            && request.query.filter == self.filter
    }

    fn merge(&mut self, page: Page) {
        match self.mode {
            LoadMode::Replace => {
                self.results = page.items;
                self.total = page.total;
            }
            LoadMode::Append => {
                let returned = page.items.len();
                if self.cursor.is_initial() {
                    self.results = page.items;
                } else {
                    self.results.extend(page.items);
                }
                if page.total.is_some() {
                    self.total = page.total;
                }

                let count = self.results.len();
                self.cursor = PageCursor::Accumulated {
                    count,
                    limit: self.page_size,
                };
                self.exhausted =
                    returned < self.page_size || self.total.is_some_and(|total| count >= total);
            }
        }
    }
}

/// Presentation-facing snapshot of the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    pub mode: LoadMode,
    pub filter: FilterPredicate,
    pub results: Vec<CompanyRecord>,
    pub total: Option<usize>,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub page: Option<usize>,
    pub page_count: Option<usize>,
    pub pagination_visible: bool,
    pub has_more: bool,
}

/// Header carrying the total number of matching companies
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Parse the total-count header value
pub fn parse_total_count(value: Option<&str>) -> Option<usize> {
    value.and_then(|v| v.trim().parse::<usize>().ok())
}

/// Decode a listing response body
///
/// The backend answers with a bare JSON array and reports the total in a
/// header. An `{items|data, total}` envelope is accepted as well; its total
/// wins over the header.
pub fn decode_page(body: &str, header_total: Option<usize>) -> Result<Page, FetchError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Body {
        Bare(Vec<CompanyRecord>),
        Envelope {
            #[serde(alias = "data")]
            items: Vec<CompanyRecord>,
            #[serde(default)]
            total: Option<usize>,
        },
    }

    let body: Body =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    Ok(match body {
        Body::Bare(items) => Page {
            items,
            total: header_total,
        },
        Body::Envelope { items, total } => Page {
            items,
            total: total.or(header_total),
        },
    })
}

/// Pagination metadata with ready-to-run navigation commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPaginationInfo {
    pub current_page: usize,
    pub total_pages: Option<usize>,
    pub total_items: Option<usize>,
    pub limit: usize,
    pub next_page_command: Option<String>,
    pub prev_page_command: Option<String>,
}

/// Replace-mode listing output for JSON rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListOutput {
    pub filter: FilterPredicate,
    pub items: Vec<CompanyRecord>,
    pub pagination: ListPaginationInfo,
}

/// Build the listing output for the page currently shown
///
/// An unknown total allows a next page only while pages come back full.
pub fn build_list_output(view: &ListingView, limit: usize) -> ListOutput {
    let page = view.page.unwrap_or(1);
    let has_next = match view.page_count {
        Some(total_pages) => page < total_pages,
        None => view.results.len() >= limit,
    };
    let command = |target: usize| {
        format!(
            "directory list{} --limit {} --page {}",
            view.filter.cli_args(),
            limit,
            target
        )
    };

    ListOutput {
        filter: view.filter.clone(),
        items: view.results.clone(),
        pagination: ListPaginationInfo {
            current_page: page,
            total_pages: view.page_count,
            total_items: view.total,
            limit,
            next_page_command: has_next.then(|| command(page + 1)),
            prev_page_command: (page > 1).then(|| command(page - 1)),
        },
    }
}

/// Apply one event to the listing
pub fn reduce(mut state: ListingState, event: ListingEvent) -> Transition {
    let request = match event {
        ListingEvent::Mounted => state.request_current(),

        ListingEvent::FilterChanged(field, value) => {
            let next = state.filter.with(field, &value);
            if next == state.filter {
                None
            } else {
                state.filter = next;
                state.epoch += 1;
                state.cursor = PageCursor::initial(state.mode, state.page_size);
                state.total = None;
                state.exhausted = false;
                state.request_current()
            }
        }

        ListingEvent::PageRequested(page) => {
            let unchanged = state.cursor.page() == Some(page) && state.fetch.error().is_none();
            if state.mode != LoadMode::Replace
                || unchanged
                || cursor::validate_page(page, state.page_size, state.page_count()).is_err()
            {
                None
            } else {
                state.cursor = PageCursor::Page {
                    page,
                    limit: state.page_size,
                };
                state.request_current()
            }
        }

        ListingEvent::LoadMore => {
            if state.mode != LoadMode::Append || state.exhausted || !state.fetch.is_idle() {
                None
            } else {
                state.request_current()
            }
        }

        ListingEvent::Reload => {
            if state.fetch.error().is_some() {
                state.fetch = FetchState::Idle;
                state.request_current()
            } else {
                None
            }
        }

        ListingEvent::FetchCompleted { request, outcome } => {
            if state.fetch != FetchState::InFlight(request.tag) {
                // Not the request we are waiting for: a duplicate report.
                None
            } else {
                state.fetch = FetchState::Idle;
                let current = state.is_current(&request);
                if current {
                    match outcome {
                        Ok(page) => state.merge(page),
                        Err(err) => state.fetch = FetchState::Failed(err),
                    }
                }

                // A pending change that led back to the answered query needs no request.
                if state.pending && !current {
                    state.request_current()
                } else {
                    state.pending = false;
                    None
                }
            }
        }
    };

    Transition { state, request }
}
