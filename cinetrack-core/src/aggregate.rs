//! Fetch-until-enough aggregation over a paginated upstream source.
//!
//! Pages are fetched sequentially, results already marked by the user are
//! dropped, and the loop ends on the first of: enough unmarked items,
//! upstream pages exhausted, attempt budget spent. A mid-loop fetch failure
//! abandons the loop and returns whatever accumulated.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::tmdb::{SearchItem, SearchPage, TmdbClient, MAX_UPSTREAM_PAGE};

/// Page-attempt budget for interactive search requests.
pub const SEARCH_PAGE_BUDGET: u32 = 5;
/// Page-attempt budget everywhere else.
pub const DEFAULT_PAGE_BUDGET: u32 = 10;
/// Results a single aggregation call delivers at most.
pub const TARGET_COUNT: usize = 20;

/// A paginated listing that can be fetched one page at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PagedSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> Result<SearchPage>;
}

/// A concrete upstream listing: endpoint path plus pre-built filter params.
#[derive(Debug)]
pub struct TmdbListing<'a> {
    client: &'a TmdbClient,
    path: String,
    params: Vec<(String, String)>,
}

impl<'a> TmdbListing<'a> {
    pub fn new(client: &'a TmdbClient, path: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            client,
            path: path.into(),
            params,
        }
    }
}

#[async_trait]
impl PagedSource for TmdbListing<'_> {
    async fn fetch_page(&self, page: u32) -> Result<SearchPage> {
        self.client.fetch_page(&self.path, &self.params, page).await
    }
}

/// Outcome of an aggregation run. `total_pages`/`total_results` are the
/// first-observed upstream totals, not recomputed after filtering.
#[derive(Debug, Clone)]
pub struct Aggregated {
    pub items: Vec<SearchItem>,
    pub total_pages: u32,
    pub total_results: u64,
}

/// Collect up to `target` results whose IDs are not in `marked`, starting at
/// `start_page` and spending at most `max_pages` upstream fetches.
pub async fn collect_unmarked<S: PagedSource + ?Sized>(
    source: &S,
    start_page: u32,
    target: usize,
    marked: &HashSet<i64>,
    max_pages: u32,
) -> Aggregated {
    let mut items: Vec<SearchItem> = Vec::new();
    let mut total_pages: u32 = 1;
    let mut total_results: u64 = 0;

    // Client-supplied start pages can be arbitrarily large; clamp to the
    // upstream page cap before computing the attempt window.
    let start_page = start_page.min(MAX_UPSTREAM_PAGE);
    let last_page = start_page
        .saturating_add(max_pages)
        .min(MAX_UPSTREAM_PAGE + 1);
    for page in start_page..last_page {
        let fetched = match source.fetch_page(page).await {
            Ok(page) => page,
            Err(err) => {
                warn!(page, error = %err, "page fetch failed, returning partial results");
                break;
            }
        };

        if page == start_page {
            total_pages = fetched.total_pages;
            total_results = fetched.total_results;
        }

        items.extend(
            fetched
                .results
                .into_iter()
                .filter(|item| !marked.contains(&item.id)),
        );

        if items.len() >= target || page >= total_pages {
            break;
        }
    }

    items.truncate(target);
    Aggregated {
        items,
        total_pages,
        total_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use mockall::predicate::eq;

    fn page_of(ids: &[i64], page: u32, total_pages: u32, total_results: u64) -> SearchPage {
        SearchPage {
            page,
            total_pages,
            total_results,
            results: ids
                .iter()
                .map(|&id| SearchItem {
                    id,
                    title: Some(format!("title-{id}")),
                    name: None,
                    media_type: None,
                    genre_ids: vec![],
                    extra: serde_json::Map::new(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn stops_once_target_reached_and_excludes_marked() {
        let marked: HashSet<i64> = (0..10).collect();
        let mut source = MockPagedSource::new();
        // Page 1: ids 0..20, ten of them marked; page 2 fills the rest.
        source
            .expect_fetch_page()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(page_of(&(0..20).collect::<Vec<_>>(), 1, 50, 1000)));
        source
            .expect_fetch_page()
            .with(eq(2))
            .times(1)
            .returning(|_| Ok(page_of(&(20..40).collect::<Vec<_>>(), 2, 50, 1000)));
        // Page 3 must never be requested.

        let out = collect_unmarked(&source, 1, 20, &marked, 5).await;
        assert_eq!(out.items.len(), 20);
        assert!(out.items.iter().all(|i| !marked.contains(&i.id)));
        assert_eq!(out.total_pages, 50);
        assert_eq!(out.total_results, 1000);
    }

    #[tokio::test]
    async fn reports_first_observed_totals() {
        let marked = HashSet::from([1, 2, 3]);
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .with(eq(4))
            .times(1)
            .returning(|_| Ok(page_of(&[1, 2, 3, 4], 4, 9, 170)));
        source
            .expect_fetch_page()
            .with(eq(5))
            .times(1)
            // Upstream totals drift mid-run; the first observation wins.
            .returning(|_| Ok(page_of(&[5, 6], 5, 12, 230)));

        let out = collect_unmarked(&source, 4, 3, &marked, 10).await;
        assert_eq!(
            out.items.iter().map(|i| i.id).collect::<Vec<_>>(),
            vec![4, 5, 6]
        );
        assert_eq!(out.total_pages, 9);
        assert_eq!(out.total_results, 170);
    }

    #[tokio::test]
    async fn fetch_failure_returns_partial_buffer() {
        let marked = HashSet::new();
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(page_of(&[1, 2], 1, 10, 200)));
        source
            .expect_fetch_page()
            .with(eq(2))
            .times(1)
            .returning(|_| Err(CoreError::Internal("boom".into())));

        let out = collect_unmarked(&source, 1, 20, &marked, 5).await;
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.total_pages, 10);
    }

    #[tokio::test]
    async fn stops_when_upstream_pages_exhausted() {
        let marked = HashSet::new();
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(page_of(&[1, 2, 3], 1, 1, 3)));

        let out = collect_unmarked(&source, 1, 20, &marked, 5).await;
        assert_eq!(out.items.len(), 3);
    }

    #[tokio::test]
    async fn attempt_budget_bounds_the_loop() {
        let marked: HashSet<i64> = (0..1000).collect();
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .times(3)
            .returning(|page| Ok(page_of(&[i64::from(page)], page, 400, 8000)));

        let out = collect_unmarked(&source, 1, 20, &marked, 3).await;
        assert!(out.items.is_empty());
    }

    #[tokio::test]
    async fn truncates_overfull_final_page() {
        let marked = HashSet::new();
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(page_of(&(0..30).collect::<Vec<_>>(), 1, 5, 150)));

        let out = collect_unmarked(&source, 1, 20, &marked, 5).await;
        assert_eq!(out.items.len(), 20);
    }

    #[tokio::test]
    async fn huge_start_page_is_clamped_not_overflowed() {
        let marked = HashSet::new();
        let mut source = MockPagedSource::new();
        source
            .expect_fetch_page()
            .with(eq(MAX_UPSTREAM_PAGE))
            .times(1)
            .returning(|page| Ok(page_of(&[9], page, MAX_UPSTREAM_PAGE, 10_000)));

        let out = collect_unmarked(&source, u32::MAX - 2, 20, &marked, 5).await;
        assert_eq!(out.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![9]);
        assert_eq!(out.total_pages, MAX_UPSTREAM_PAGE);
    }
}
