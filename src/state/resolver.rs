/// Filter/search resolution
///
/// Turns what the user asked for into exactly one query mode, runs the
/// matching backend call, and merges the result into the store. Results
/// from two modes are never blended.
use serde::Deserialize;
use tracing::{debug, warn};

use super::data::{Concern, ConcernStatus, Page};
use super::store::{ConcernStore, Generation};
use crate::api::ConcernApi;
use crate::error::ApiError;

/// The single active strategy for what the window shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    AllPaged,
    LocationFiltered,
    StatusFiltered,
    Search,
    LocalSubstring,
}

impl QueryMode {
    /// Whether the window shows the whole result set instead of a server page
    pub fn is_full_set(&self) -> bool {
        !matches!(self, QueryMode::AllPaged)
    }
}

/// Where free-text search runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// `GET /concerns/search`
    #[default]
    Server,
    /// Fetch everything and match substrings locally
    Local,
}

/// Raw user input that may select a query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryIntent {
    pub location: Option<String>,
    pub status: Option<ConcernStatus>,
    pub search_term: String,
    pub page: usize,
}

/// A resolved backend query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Page { page: usize, size: usize },
    Location(String),
    Status(ConcernStatus),
    Search(String),
    LocalSubstring(String),
}

/// Successful query payload before it is merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPayload {
    Page(Page),
    Items(Vec<Concern>),
}

/// What happened when a query response came back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Applied,
    /// A newer query has been dispatched since; the response was dropped
    Stale,
    /// The failure message to show the user
    Failed(String),
}

const GENERIC_LOAD_FAILURE: &str = "Failed to load concerns. Please try again.";
const GENERIC_LOCATION_FAILURE: &str = "Failed to load concerns for this location.";
const GENERIC_STATUS_FAILURE: &str = "Failed to load concerns for this status.";
const GENERIC_SEARCH_FAILURE: &str = "Search failed. Please try again.";

/// Pick exactly one query for the intent.
///
/// Priority: location, then status, then a non-empty search term, then the
/// paged listing. An all-whitespace search term counts as no search.
pub fn resolve(intent: &QueryIntent, page_size: usize, strategy: SearchStrategy) -> Query {
    if let Some(location) = intent.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        return Query::Location(location.to_owned());
    }
    if let Some(status) = intent.status {
        return Query::Status(status);
    }
    let term = intent.search_term.trim();
    if !term.is_empty() {
        return match strategy {
            SearchStrategy::Server => Query::Search(term.to_owned()),
            SearchStrategy::Local => Query::LocalSubstring(term.to_owned()),
        };
    }
    Query::Page {
        page: intent.page,
        size: page_size,
    }
}

impl Query {
    pub fn mode(&self) -> QueryMode {
        match self {
            Query::Page { .. } => QueryMode::AllPaged,
            Query::Location(_) => QueryMode::LocationFiltered,
            Query::Status(_) => QueryMode::StatusFiltered,
            Query::Search(_) => QueryMode::Search,
            Query::LocalSubstring(_) => QueryMode::LocalSubstring,
        }
    }

    /// Run the backend call for this query
    pub async fn fetch(&self, api: &dyn ConcernApi) -> Result<QueryPayload, ApiError> {
        match self {
            Query::Page { page, size } => api.fetch_page(*page, *size).await.map(QueryPayload::Page),
            Query::Location(location) => api.by_location(location).await.map(QueryPayload::Items),
            Query::Status(status) => api.by_status(*status).await.map(QueryPayload::Items),
            Query::Search(keyword) => api.search(keyword).await.map(QueryPayload::Items),
            Query::LocalSubstring(term) => {
                let mut items = api.fetch_all().await?;
                items.retain(|concern| concern.matches_term(term));
                Ok(QueryPayload::Items(items))
            }
        }
    }
}

/// Merge a query response into the store.
///
/// Paged responses replace the page; everything else replaces the full set.
/// Failures follow the per-mode policy: a failed page load keeps the old
/// window only if it was showing a page, any failed filter or search clears it.
pub fn apply_result(
    store: &mut ConcernStore,
    generation: Generation,
    query: &Query,
    result: Result<QueryPayload, ApiError>,
) -> QueryOutcome {
    if !store.is_current(generation) {
        debug!(?query, "discarding stale query response");
        return QueryOutcome::Stale;
    }

    match (query, result) {
        (Query::Page { page, size }, Ok(QueryPayload::Page(payload))) => {
            store.apply_page(generation, *page, *size, payload);
            QueryOutcome::Applied
        }
        (_, Ok(QueryPayload::Items(items))) => {
            store.apply_full_set(generation, items);
            QueryOutcome::Applied
        }
        (_, Ok(QueryPayload::Page(payload))) => {
            // Only the paged query produces pages; treat a mismatch as a full set.
            store.apply_full_set(generation, payload.content);
            QueryOutcome::Applied
        }
        (Query::Page { page, .. }, Err(error)) => {
            warn!(page, %error, "failed to load concern page");
            // Another page may stay up; a filter or search result must not pose as one
            if store.shown_mode() != Some(QueryMode::AllPaged) {
                store.clear();
            }
            QueryOutcome::Failed(GENERIC_LOAD_FAILURE.to_owned())
        }
        (Query::Location(location), Err(ApiError::NotFound { message })) => {
            debug!(%location, "no concerns at location");
            store.clear();
            QueryOutcome::Failed(message)
        }
        (Query::Location(location), Err(error)) => {
            warn!(%location, %error, "location filter failed");
            store.clear();
            QueryOutcome::Failed(GENERIC_LOCATION_FAILURE.to_owned())
        }
        (Query::Status(status), Err(error)) => {
            warn!(%status, %error, "status filter failed");
            store.clear();
            QueryOutcome::Failed(GENERIC_STATUS_FAILURE.to_owned())
        }
        (Query::Search(term) | Query::LocalSubstring(term), Err(error)) => {
            warn!(%term, %error, "search failed");
            store.clear();
            QueryOutcome::Failed(GENERIC_SEARCH_FAILURE.to_owned())
        }
    }
}
