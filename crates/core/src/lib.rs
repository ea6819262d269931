//! Core library for the company directory client
//!
//! This crate implements the **Functional Core** of the directory application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! The project uses a two-crate architecture to enforce separation of concerns:
//!
//! - **`directory_core`** (this crate): filter state, pagination arithmetic and the
//!   listing state machine, with zero I/O
//! - **`directory`**: HTTP access, the event loop that drives the state machine, and
//!   the command line presentation layer (the Imperative Shell)
//!
//! ## Functional Core Principles
//!
//! - **Pure transitions**: every listing change is `reduce(state, event) -> Transition`
//! - **No side effects**: a transition *describes* the request to issue, the shell
//!   performs it and feeds the outcome back as another event
//! - **Deterministic**: async completions are ordinary events, so any interleaving
//!   can be replayed in a unit test
//!
//! # Module Organization
//!
//! - [`filter`]: the search/category/size/location predicate
//! - [`cursor`]: page cursors and page-count arithmetic
//! - [`listing`]: the listing controller state machine (epochs, in-flight guard, merging)
//! - [`trigger`]: edge-triggered boundary detection for infinite scroll
//! - [`company`]: company records and the tabbed detail view model
//! - [`local`]: a deterministic in-memory data source
//! - [`error`]: the fetch error taxonomy
//!
//! # Example Usage
//!
//! ```rust
//! use directory_core::cursor::LoadMode;
//! use directory_core::filter::FilterField;
//! use directory_core::listing::{reduce, ListingEvent, ListingState};
//!
//! let state = ListingState::new(LoadMode::Replace, 9);
//! let mounted = reduce(state, ListingEvent::Mounted);
//! let first = mounted.request.expect("mount issues the first page");
//! assert_eq!(first.query.skip, 0);
//!
//! // A filter change while the first page is in flight is coalesced.
//! let changed = reduce(
//!     mounted.state,
//!     ListingEvent::FilterChanged(FilterField::Category, "Technology".into()),
//! );
//! assert!(changed.request.is_none());
//! assert_eq!(changed.state.epoch, 1);
//! ```

pub mod company;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod listing;
pub mod local;
pub mod trigger;
