//! Free-games catalog client and normalization.
//!
//! The upstream catalog lists free-to-play titles. Entries are normalized
//! into the app's game shape with their IDs offset so they never collide
//! with the built-in showcase list, which is served even when the catalog
//! is unreachable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_BASE_URL: &str = "https://www.freetogame.com/api";

/// Catalog IDs are shifted by this offset in the app's game namespace.
pub const CATALOG_ID_OFFSET: i64 = 2000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One raw catalog entry.
#[derive(Debug, Clone, Deserialize)]
pub struct FreeGame {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub game_url: Option<String>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub freetogame_profile_url: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl NamedRef {
    /// Catalog refs keep the upstream's plain lowercase slugging.
    fn catalog(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            slug: name.to_lowercase(),
        }
    }

    fn slugged(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            slug: slugify(name),
        }
    }
}

/// "Action RPG" -> "action-rpg", "Xbox Series X/S" -> "xbox-series-x-s".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformRef {
    pub platform: NamedRef,
}

/// A game in the shape the frontend consumes, for both built-in and catalog
/// titles.
#[derive(Debug, Clone, Serialize)]
pub struct GameEntry {
    pub id: i64,
    pub name: String,
    pub background_image: String,
    pub rating: f64,
    pub rating_top: u8,
    pub ratings_count: u64,
    pub released: String,
    pub genres: Vec<NamedRef>,
    pub platforms: Vec<PlatformRef>,
    pub developers: Vec<NamedRef>,
    pub publishers: Vec<NamedRef>,
    pub description_raw: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freetogame_profile_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<serde_json::Value>>,
    pub is_free: bool,
}

impl GameEntry {
    /// Normalize a catalog entry into the app namespace.
    pub fn from_catalog(game: FreeGame) -> Self {
        let description = game
            .description
            .clone()
            .unwrap_or_else(|| game.short_description.clone());
        Self {
            id: game.id + CATALOG_ID_OFFSET,
            name: game.title,
            background_image: game.thumbnail,
            rating: 4.0,
            rating_top: 5,
            ratings_count: 1000,
            released: game.release_date,
            genres: vec![NamedRef::catalog(1, &game.genre)],
            platforms: vec![PlatformRef {
                platform: NamedRef::catalog(1, &game.platform),
            }],
            developers: vec![NamedRef::catalog(1, &game.developer)],
            publishers: vec![NamedRef::catalog(1, &game.publisher)],
            description_raw: game.short_description,
            description,
            metacritic: None,
            game_url: game.game_url,
            freetogame_profile_url: game.freetogame_profile_url,
            screenshots: if game.screenshots.is_empty() {
                None
            } else {
                Some(game.screenshots)
            },
            is_free: true,
        }
    }

    fn showcase(
        id: i64,
        name: &str,
        image: &str,
        rating: f64,
        ratings_count: u64,
        released: &str,
        genre: (i64, &str),
        developer: (i64, &str),
        publisher: (i64, &str),
        description: &str,
        metacritic: i32,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            background_image: image.to_string(),
            rating,
            rating_top: 5,
            ratings_count,
            released: released.to_string(),
            genres: vec![NamedRef::slugged(genre.0, genre.1)],
            platforms: vec![
                PlatformRef {
                    platform: NamedRef::slugged(1, "PC"),
                },
                PlatformRef {
                    platform: NamedRef::slugged(2, "PlayStation 5"),
                },
                PlatformRef {
                    platform: NamedRef::slugged(3, "Xbox Series X/S"),
                },
            ],
            developers: vec![NamedRef::slugged(developer.0, developer.1)],
            publishers: vec![NamedRef::slugged(publisher.0, publisher.1)],
            description_raw: description.to_string(),
            description: description.to_string(),
            metacritic: Some(metacritic),
            game_url: None,
            freetogame_profile_url: None,
            screenshots: None,
            is_free: false,
        }
    }
}

/// Built-in non-free titles served ahead of the catalog.
pub fn showcase_games() -> Vec<GameEntry> {
    vec![
        GameEntry::showcase(
            1001,
            "赛博朋克2077",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co2lbd.webp",
            4.1,
            125_000,
            "2020-12-10",
            (1, "Action RPG"),
            (1, "CD Projekt Red"),
            (1, "CD Projekt"),
            "赛博朋克2077是一款开放世界动作冒险RPG，故事发生在夜之城。",
            86,
        ),
        GameEntry::showcase(
            1002,
            "艾尔登法环",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co4jni.webp",
            4.6,
            200_000,
            "2022-02-25",
            (1, "Action RPG"),
            (2, "FromSoftware"),
            (2, "Bandai Namco"),
            "由宫崎英高与乔治·R·R·马丁合作打造的开放世界动作RPG。",
            96,
        ),
        GameEntry::showcase(
            1003,
            "黑神话：悟空",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co87c5.webp",
            4.4,
            89_000,
            "2024-08-20",
            (1, "Action RPG"),
            (3, "游戏科学"),
            (3, "游戏科学"),
            "基于中国古典名著《西游记》的单人动作RPG游戏。",
            81,
        ),
        GameEntry::showcase(
            1004,
            "巫师3：狂猎",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co1wyy.webp",
            4.7,
            300_000,
            "2015-05-19",
            (1, "Action RPG"),
            (1, "CD Projekt Red"),
            (1, "CD Projekt"),
            "开放世界RPG，讲述巫师杰洛特寻找养女希里的史诗故事。",
            93,
        ),
        GameEntry::showcase(
            1005,
            "Grand Theft Auto V",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co2lbw.webp",
            4.5,
            400_000,
            "2013-09-17",
            (2, "Action Adventure"),
            (4, "Rockstar North"),
            (4, "Rockstar Games"),
            "洛圣都和布雷恩县的世界提供了前所未有的自由度。",
            96,
        ),
        GameEntry::showcase(
            1006,
            "荒野大镖客：救赎2",
            "https://images.igdb.com/igdb/image/upload/t_1080p/co1q1f.webp",
            4.6,
            250_000,
            "2018-10-26",
            (2, "Action Adventure"),
            (4, "Rockstar Studios"),
            (4, "Rockstar Games"),
            "美国，1899年。法外之徒的时代即将落下帷幕。",
            97,
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct FreeToGameClient {
    http: reqwest::Client,
    base_url: String,
}

impl FreeToGameClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// List the catalog, optionally filtered by category or platform. The
    /// upstream accepts at most one of the two filters; category wins.
    pub async fn games(
        &self,
        category: Option<&str>,
        platform: Option<&str>,
    ) -> Result<Vec<FreeGame>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(category) = category {
            params.push(("category", category));
        } else if let Some(platform) = platform {
            params.push(("platform", platform));
        }

        let url = format!("{}/games", self.base_url);
        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::UpstreamStatus { status, url });
        }
        response
            .json::<Vec<FreeGame>>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// Fetch one catalog entry by its raw (un-offset) ID.
    pub async fn game(&self, id: i64) -> Result<FreeGame> {
        let url = format!("{}/game", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("id", id.to_string())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::UpstreamStatus { status, url });
        }
        response
            .json::<FreeGame>()
            .await
            .map_err(|e| CoreError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entry_is_offset_and_flagged_free() {
        let entry = GameEntry::from_catalog(FreeGame {
            id: 540,
            title: "Overwatch 2".into(),
            thumbnail: "https://img/ow2.jpg".into(),
            short_description: "Team shooter".into(),
            description: None,
            game_url: Some("https://play".into()),
            genre: "Shooter".into(),
            platform: "PC (Windows)".into(),
            publisher: "Blizzard".into(),
            developer: "Blizzard".into(),
            release_date: "2022-10-04".into(),
            freetogame_profile_url: None,
            screenshots: vec![],
        });
        assert_eq!(entry.id, 2540);
        assert!(entry.is_free);
        assert_eq!(entry.genres[0].slug, "shooter");
        assert_eq!(entry.description, "Team shooter");
        assert!(entry.screenshots.is_none());
    }

    #[test]
    fn showcase_ids_stay_below_catalog_offset() {
        for game in showcase_games() {
            assert!(game.id < CATALOG_ID_OFFSET);
            assert!(!game.is_free);
        }
    }

    #[test]
    fn slugify_hyphenates() {
        assert_eq!(slugify("Action RPG"), "action-rpg");
        assert_eq!(slugify("Xbox Series X/S"), "xbox-series-x-s");
        assert_eq!(slugify("MMORPG"), "mmorpg");
    }

    #[tokio::test]
    async fn games_passes_category_filter() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/games")
            .match_query(mockito::Matcher::UrlEncoded(
                "category".into(),
                "mmorpg".into(),
            ))
            .with_status(200)
            .with_body(
                r#"[{"id": 1, "title": "T", "thumbnail": "u", "short_description": "d",
                     "genre": "MMORPG", "platform": "PC", "publisher": "p",
                     "developer": "dv", "release_date": "2020-01-01"}]"#,
            )
            .create_async()
            .await;

        let client = FreeToGameClient::new(server.url()).unwrap();
        let games = client.games(Some("mmorpg"), None).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].genre, "MMORPG");
    }
}
