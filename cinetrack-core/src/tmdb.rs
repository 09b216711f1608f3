//! Thin REST client for the upstream movie/TV metadata service.
//!
//! Every request carries the API key and `language=zh-CN` as query
//! parameters. Non-200 responses become typed errors so callers can decide
//! between soft-failure (skip and continue) and hard-failure paths.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credits::{Credits, MediaKind};
use crate::error::{CoreError, Result};
use crate::locale::{Genre, ProductionCountry};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Upstream hard-caps paginated listings at 500 pages.
pub const MAX_UPSTREAM_PAGE: u32 = 500;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of a search/discover/popular results page. The fields the
/// enrichment pipeline touches are typed; everything else is passed through
/// untouched via the flattened map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchItem {
    /// Search results from the multi endpoint mix movies and TV shows; a
    /// missing `title` with a present `name` marks a TV entry.
    pub fn inferred_kind(&self) -> MediaKind {
        if self.media_type.as_deref() == Some("tv")
            || (self.title.is_none() && self.name.is_some())
        {
            MediaKind::Tv
        } else {
            MediaKind::Movie
        }
    }
}

/// One page of paginated upstream results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page")]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<SearchItem>,
}

fn default_page() -> u32 {
    1
}

/// Detail payload for a movie or TV show. Typed fields feed reconciliation;
/// the flattened remainder keeps detail endpoints lossless for clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Details {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub production_countries: Vec<ProductionCountry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "zh-CN"),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::UpstreamStatus { status, url });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// Fetch one page of a search/discover/popular listing. `path` is the
    /// endpoint path (e.g. `/discover/movie`), `params` the caller-built
    /// filter set; the page number is appended last.
    pub async fn fetch_page(
        &self,
        path: &str,
        params: &[(String, String)],
        page: u32,
    ) -> Result<SearchPage> {
        let mut query = params.to_vec();
        query.push(("page".into(), page.to_string()));
        self.get_json(path, &query).await
    }

    pub async fn details(&self, kind: MediaKind, id: i64) -> Result<Details> {
        self.get_json(&format!("/{}/{id}", kind.as_str()), &[]).await
    }

    pub async fn credits(&self, kind: MediaKind, id: i64) -> Result<Credits> {
        self.get_json(&format!("/{}/{id}/credits", kind.as_str()), &[])
            .await
    }

    pub async fn genres(&self, kind: MediaKind) -> Result<Vec<Genre>> {
        let list: GenreList = self
            .get_json(&format!("/genre/{}/list", kind.as_str()), &[])
            .await?;
        Ok(list.genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_page_parses_results_and_totals() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/search/movie")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("api_key".into(), "k".into()),
                mockito::Matcher::UrlEncoded("language".into(), "zh-CN".into()),
                mockito::Matcher::UrlEncoded("query".into(), "dune".into()),
                mockito::Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{
                    "page": 2,
                    "total_pages": 7,
                    "total_results": 130,
                    "results": [
                        {"id": 438631, "title": "沙丘", "genre_ids": [878, 12],
                         "poster_path": "/x.jpg"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let client = TmdbClient::new(server.url(), "k").unwrap();
        let page = client
            .fetch_page(
                "/search/movie",
                &[("query".to_string(), "dune".to_string())],
                2,
            )
            .await
            .unwrap();

        assert_eq!(page.total_pages, 7);
        assert_eq!(page.total_results, 130);
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, 438631);
        assert_eq!(page.results[0].genre_ids, vec![878, 12]);
        assert_eq!(
            page.results[0].extra.get("poster_path"),
            Some(&serde_json::json!("/x.jpg"))
        );
    }

    #[tokio::test]
    async fn non_200_becomes_upstream_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/movie/42")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"status_message": "not found"}"#)
            .create_async()
            .await;

        let client = TmdbClient::new(server.url(), "k").unwrap();
        let err = client.details(MediaKind::Movie, 42).await.unwrap_err();
        match err {
            CoreError::UpstreamStatus { status, .. } => assert_eq!(status.as_u16(), 404),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn details_keeps_unknown_fields_in_extra() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/tv/99")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "id": 99,
                    "name": "人生切割术",
                    "first_air_date": "2022-02-18",
                    "genres": [{"id": 18, "name": "剧情"}],
                    "production_countries": [
                        {"iso_3166_1": "US", "name": "United States of America"}
                    ],
                    "number_of_seasons": 2
               }"#,
            )
            .create_async()
            .await;

        let client = TmdbClient::new(server.url(), "k").unwrap();
        let details = client.details(MediaKind::Tv, 99).await.unwrap();
        assert_eq!(details.name.as_deref(), Some("人生切割术"));
        assert_eq!(details.genres[0].id, 18);
        assert_eq!(
            details.extra.get("number_of_seasons"),
            Some(&serde_json::json!(2))
        );
    }

    #[test]
    fn search_item_kind_inference() {
        let movie: SearchItem =
            serde_json::from_str(r#"{"id": 1, "title": "t"}"#).unwrap();
        let tv: SearchItem = serde_json::from_str(r#"{"id": 2, "name": "n"}"#).unwrap();
        let flagged: SearchItem =
            serde_json::from_str(r#"{"id": 3, "title": "t", "media_type": "tv"}"#).unwrap();
        assert_eq!(movie.inferred_kind(), MediaKind::Movie);
        assert_eq!(tv.inferred_kind(), MediaKind::Tv);
        assert_eq!(flagged.inferred_kind(), MediaKind::Tv);
    }
}
