//! Search session: term, page and type filter of the results view.
//!
//! Provider hits are filtered locally. People and other non-playable kinds
//! are dropped, as is anything without a poster or backdrop, before the type
//! filter applies. Pagination totals are the provider's unfiltered counts.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use cinescope_catalog::{
    CatalogError, CatalogProvider, MediaSummary, MediaType, SearchHit, SearchPage,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::generation::{RequestGeneration, Resolution};

/// Which media types the results view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TypeFilter {
    #[default]
    All,
    Movie,
    Series,
}

impl TypeFilter {
    pub fn matches(self, media_type: MediaType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Movie => media_type == MediaType::Movie,
            TypeFilter::Series => media_type == MediaType::Series,
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => write!(f, "all"),
            TypeFilter::Movie => write!(f, "movie"),
            TypeFilter::Series => write!(f, "series"),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TypeFilter::All),
            "movie" => Ok(TypeFilter::Movie),
            "series" | "tv" => Ok(TypeFilter::Series),
            _ => Err(format!("Invalid type filter: {s}")),
        }
    }
}

/// Query position of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQueryState {
    pub term: String,
    pub page: u32,
    pub type_filter: TypeFilter,
    /// Provider page count of the last successful query
    pub total_pages: u32,
    /// Provider result count of the last successful query
    pub total_results: u32,
}

impl Default for SearchQueryState {
    fn default() -> Self {
        Self {
            term: String::new(),
            page: 1,
            type_filter: TypeFilter::All,
            total_pages: 0,
            total_results: 0,
        }
    }
}

/// One filtered results page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub items: Vec<MediaSummary>,
    pub page: u32,
    pub total_results: u32,
    pub total_pages: u32,
}

impl SearchResults {
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// Applies local filtering to a raw provider page.
    pub fn from_page(page: SearchPage, type_filter: TypeFilter) -> Self {
        let items = page
            .results
            .into_iter()
            .filter(SearchHit::has_image)
            .filter_map(SearchHit::into_summary)
            .filter(|summary| type_filter.matches(summary.identity.media_type))
            .collect();

        Self {
            items,
            page: page.page,
            total_results: page.total_results,
            total_pages: page.total_pages,
        }
    }
}

/// Result of a query that was still current when it completed.
///
/// A provider failure yields empty results plus the error, with pagination
/// left where it was so the same page can be retried.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub results: SearchResults,
    pub error: Option<CatalogError>,
}

#[derive(Debug, Default)]
struct SessionState {
    query: SearchQueryState,
    /// Set by the first non-empty term, kept across clears
    queried: bool,
}

/// Coordinates queries of the results view.
#[derive(Debug)]
pub struct SearchSession {
    catalog: Arc<dyn CatalogProvider>,
    generation: RequestGeneration,
    state: Mutex<SessionState>,
}

impl SearchSession {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self {
            catalog,
            generation: RequestGeneration::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Runs a query, superseding any query in flight.
    ///
    /// Once a term has been queried, changing the term or type filter resets
    /// the page to 1 and `page` is only honoured when both stay the same. An
    /// empty term returns empty results without calling the provider.
    pub fn query<'a>(
        &'a self,
        term: &str,
        page: u32,
        type_filter: TypeFilter,
    ) -> impl Future<Output = Resolution<SearchOutcome>> + Send + use<'a> {
        let term = term.trim().to_string();

        let (ticket, page) = {
            let mut guard = self.state.lock();
            let changed = guard.queried
                && (guard.query.term != term || guard.query.type_filter != type_filter);
            let page = if changed { 1 } else { page.max(1) };
            guard.queried |= !term.is_empty();

            let state = &mut guard.query;
            if state.term != term {
                state.total_pages = 0;
                state.total_results = 0;
            }
            state.term = term.clone();
            state.type_filter = type_filter;
            state.page = page;
            (self.generation.begin(), page)
        };

        async move {
            if term.is_empty() {
                let _state = self.state.lock();
                if !self.generation.is_current(ticket) {
                    debug!("Discarding superseded empty search");
                    return Resolution::Stale;
                }
                debug!("Empty search term, skipping provider");
                return Resolution::Current(SearchOutcome {
                    results: SearchResults::empty(page),
                    error: None,
                });
            }

            info!(term = %term, page, filter = %type_filter, "Searching catalog");
            let fetched = self.catalog.search_media(&term, page).await;

            let mut guard = self.state.lock();
            if !self.generation.is_current(ticket) {
                debug!(term = %term, page, "Discarding stale search response");
                return Resolution::Stale;
            }

            match fetched {
                Ok(raw) => {
                    let results = SearchResults::from_page(raw, type_filter);
                    guard.query.total_pages = results.total_pages;
                    guard.query.total_results = results.total_results;
                    debug!(
                        shown = results.items.len(),
                        total = results.total_results,
                        "Search page loaded"
                    );
                    Resolution::Current(SearchOutcome {
                        results,
                        error: None,
                    })
                }
                Err(error) => {
                    warn!(term = %term, page, %error, "Search failed");
                    Resolution::Current(SearchOutcome {
                        results: SearchResults::empty(page),
                        error: Some(error),
                    })
                }
            }
        }
    }

    /// Next page, clamped to the last known page.
    pub fn next_page(&self) -> impl Future<Output = Resolution<SearchOutcome>> + Send + '_ {
        let state = self.state();
        let page = (state.page + 1).min(state.total_pages.max(1));
        self.query(&state.term, page, state.type_filter)
    }

    /// Previous page, never below 1.
    pub fn previous_page(&self) -> impl Future<Output = Resolution<SearchOutcome>> + Send + '_ {
        let state = self.state();
        self.query(&state.term, state.page.saturating_sub(1), state.type_filter)
    }

    /// Re-runs the current term with another filter, from page 1.
    pub fn set_type_filter(
        &self,
        type_filter: TypeFilter,
    ) -> impl Future<Output = Resolution<SearchOutcome>> + Send + '_ {
        let state = self.state();
        self.query(&state.term, 1, type_filter)
    }

    /// Re-runs the current term, page and filter.
    pub fn retry(&self) -> impl Future<Output = Resolution<SearchOutcome>> + Send + '_ {
        let state = self.state();
        self.query(&state.term, state.page, state.type_filter)
    }

    /// Snapshot of the query position.
    pub fn state(&self) -> SearchQueryState {
        self.state.lock().query.clone()
    }
}
