//! Static genre and country localization tables.
//!
//! These are pure finite mappings: an unmapped genre ID renders as an
//! id-embedded fallback (`类型{id}`), an unmapped country name passes
//! through unchanged.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// A TMDB genre object as it appears in detail payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// A TMDB production country entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCountry {
    #[serde(default)]
    pub iso_3166_1: Option<String>,
    pub name: String,
}

pub const NO_GENRES: &str = "暂无分类";
pub const NO_COUNTRIES: &str = "暂无出品信息";
pub const NO_OVERVIEW: &str = "暂无简介";
pub const NO_DIRECTOR: &str = "暂无导演信息";
pub const NO_CAST: &str = "暂无主演信息";

static GENRE_NAMES: LazyLock<HashMap<i64, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        (28, "动作"),
        (12, "冒险"),
        (16, "动画"),
        (35, "喜剧"),
        (80, "犯罪"),
        (99, "纪录片"),
        (18, "剧情"),
        (10751, "家庭"),
        (14, "奇幻"),
        (36, "历史"),
        (27, "恐怖"),
        (10402, "音乐"),
        (9648, "悬疑"),
        (10749, "爱情"),
        (878, "科幻"),
        (10770, "电视电影"),
        (53, "惊悚"),
        (10752, "战争"),
        (37, "西部"),
        (10759, "动作冒险"),
        (10762, "儿童"),
        (10763, "新闻"),
        (10764, "真人秀"),
        (10765, "科幻奇幻"),
        (10766, "肥皂剧"),
        (10767, "脱口秀"),
        (10768, "战争政治"),
    ])
});

static COUNTRY_NAMES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("United States of America", "美国"),
        ("United Kingdom", "英国"),
        ("China", "中国大陆"),
        ("Japan", "日本"),
        ("South Korea", "韩国"),
        ("France", "法国"),
        ("Germany", "德国"),
        ("Italy", "意大利"),
        ("Spain", "西班牙"),
        ("Canada", "加拿大"),
        ("Australia", "澳大利亚"),
        ("India", "印度"),
        ("Russia", "俄罗斯"),
        ("Hong Kong", "中国香港"),
        ("Taiwan", "中国台湾"),
        ("Thailand", "泰国"),
        ("Philippines", "菲律宾"),
        ("Singapore", "新加坡"),
        ("Malaysia", "马来西亚"),
        ("Indonesia", "印度尼西亚"),
        ("Vietnam", "越南"),
        ("Mexico", "墨西哥"),
        ("Brazil", "巴西"),
        ("Argentina", "阿根廷"),
        ("Sweden", "瑞典"),
        ("Norway", "挪威"),
        ("Denmark", "丹麦"),
        ("Netherlands", "荷兰"),
        ("Belgium", "比利时"),
        ("Switzerland", "瑞士"),
        ("Austria", "奥地利"),
        ("Poland", "波兰"),
        ("Czech Republic", "捷克"),
        ("Hungary", "匈牙利"),
        ("Greece", "希腊"),
        ("Turkey", "土耳其"),
        ("Iran", "伊朗"),
        ("Egypt", "埃及"),
        ("South Africa", "南非"),
        ("Israel", "以色列"),
        ("New Zealand", "新西兰"),
    ])
});

/// Localized display name for a genre ID; unmapped IDs keep the ID visible.
pub fn genre_name(id: i64) -> String {
    match GENRE_NAMES.get(&id) {
        Some(name) => (*name).to_string(),
        None => format!("类型{id}"),
    }
}

/// Build `{id, name}` genre objects from a raw `genre_ids` list.
pub fn genres_from_ids(ids: &[i64]) -> Vec<Genre> {
    ids.iter()
        .map(|&id| Genre {
            id,
            name: genre_name(id),
        })
        .collect()
}

/// Localized country name; unmapped names are returned unchanged.
pub fn country_name(english: &str) -> &str {
    COUNTRY_NAMES.get(english).copied().unwrap_or(english)
}

/// ISO 3166-1 code to English country name, unmapped codes pass through.
pub fn country_name_from_code(code: &str) -> &str {
    match code {
        "US" => "United States of America",
        "CN" => "China",
        "JP" => "Japan",
        "KR" => "South Korea",
        "GB" => "United Kingdom",
        "FR" => "France",
        "DE" => "Germany",
        "IT" => "Italy",
        "HK" => "Hong Kong",
        "TW" => "Taiwan",
        "TH" => "Thailand",
        "IN" => "India",
        other => other,
    }
}

/// Comma-joined genre names for storage, with a localized placeholder for
/// an empty list.
pub fn genres_display(genres: &[Genre]) -> String {
    if genres.is_empty() {
        return NO_GENRES.to_string();
    }
    genres
        .iter()
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Comma-joined localized production countries for storage.
pub fn countries_display(countries: &[ProductionCountry]) -> String {
    if countries.is_empty() {
        return NO_COUNTRIES.to_string();
    }
    countries
        .iter()
        .map(|c| country_name(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_genre_ids_resolve_to_names() {
        assert_eq!(genre_name(28), "动作");
        assert_eq!(genre_name(10767), "脱口秀");
    }

    #[test]
    fn unmapped_genre_id_embeds_the_id() {
        assert_eq!(genre_name(999999), "类型999999");
    }

    #[test]
    fn genres_from_ids_preserves_order() {
        let genres = genres_from_ids(&[18, 35]);
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[0].name, "剧情");
        assert_eq!(genres[1].name, "喜剧");
    }

    #[test]
    fn unmapped_country_passes_through() {
        assert_eq!(country_name("Atlantis"), "Atlantis");
        assert_eq!(country_name("Japan"), "日本");
    }

    #[test]
    fn country_code_lookup_falls_back_to_code() {
        assert_eq!(country_name_from_code("US"), "United States of America");
        assert_eq!(country_name_from_code("ZZ"), "ZZ");
    }

    #[test]
    fn empty_lists_render_placeholders() {
        assert_eq!(genres_display(&[]), NO_GENRES);
        assert_eq!(countries_display(&[]), NO_COUNTRIES);
    }

    #[test]
    fn countries_display_translates_and_joins() {
        let countries = vec![
            ProductionCountry {
                iso_3166_1: Some("US".into()),
                name: "United States of America".into(),
            },
            ProductionCountry {
                iso_3166_1: None,
                name: "Wakanda".into(),
            },
        ];
        assert_eq!(countries_display(&countries), "美国, Wakanda");
    }
}
