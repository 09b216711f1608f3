//! Director and cast extraction from upstream credits payloads.
//!
//! Movies take crew entries whose job is exactly "Director". TV shows scan a
//! fixed job-priority table because the credits endpoint rarely labels a
//! single "Director" for a series. Both cap at two names; cast keeps the
//! first five billed actors.

use serde::{Deserialize, Serialize};

use crate::locale::{NO_CAST, NO_DIRECTOR};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    #[serde(default)]
    pub name: Option<String>,
}

/// Credits payload for one title: `crew` carries job labels, `cast` is the
/// upstream billing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

const MAX_DIRECTORS: usize = 2;
const MAX_CAST: usize = 5;

/// Jobs that stand in for a director on TV credits, highest priority first.
const TV_DIRECTOR_JOBS: [&str; 4] = ["Creator", "Showrunner", "Executive Producer", "Director"];

impl Credits {
    /// Movie directors: first two crew entries with job "Director", in
    /// upstream order. `None` when there are none.
    pub fn movie_director(&self) -> Option<String> {
        let names: Vec<&str> = self
            .crew
            .iter()
            .filter(|p| p.job.as_deref() == Some("Director"))
            .filter_map(|p| p.name.as_deref())
            .filter(|n| !n.is_empty())
            .take(MAX_DIRECTORS)
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// TV "director": scan the priority jobs in order, take up to two people
    /// per job, and stop once two have been collected overall. Lower-priority
    /// jobs are never consulted after the cap is reached.
    pub fn tv_director(&self) -> Option<String> {
        let mut names: Vec<&str> = Vec::new();
        for job in TV_DIRECTOR_JOBS {
            let mut matched = self
                .crew
                .iter()
                .filter(|p| p.job.as_deref() == Some(job))
                .filter_map(|p| p.name.as_deref())
                .filter(|n| !n.is_empty())
                .take(MAX_DIRECTORS);
            names.extend(&mut matched);
            if names.len() >= MAX_DIRECTORS {
                break;
            }
        }
        names.truncate(MAX_DIRECTORS);
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// Director string for the given media kind.
    pub fn director_for(&self, kind: MediaKind) -> Option<String> {
        match kind {
            MediaKind::Movie => self.movie_director(),
            MediaKind::Tv => self.tv_director(),
        }
    }

    /// First five billed cast names, entries without a name dropped.
    pub fn top_cast(&self) -> Option<String> {
        let names: Vec<&str> = self
            .cast
            .iter()
            .take(MAX_CAST)
            .filter_map(|p| p.name.as_deref())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.join(", "))
        }
    }

    /// Display variant with the localized placeholder for missing data.
    pub fn director_display(&self, kind: MediaKind) -> String {
        self.director_for(kind)
            .unwrap_or_else(|| NO_DIRECTOR.to_string())
    }

    /// Display variant with the localized placeholder for missing data.
    pub fn cast_display(&self) -> String {
        self.top_cast().unwrap_or_else(|| NO_CAST.to_string())
    }
}

/// The two upstream media namespaces a title ID can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    /// The opposite namespace, used by the one-shot retry on detail fetches.
    pub fn flip(self) -> Self {
        match self {
            MediaKind::Movie => MediaKind::Tv,
            MediaKind::Tv => MediaKind::Movie,
        }
    }

    /// Parse a stored `media_type` column, defaulting to movie.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("tv") => MediaKind::Tv,
            _ => MediaKind::Movie,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crew(entries: &[(&str, &str)]) -> Vec<CrewMember> {
        entries
            .iter()
            .map(|(name, job)| CrewMember {
                name: Some((*name).to_string()),
                job: Some((*job).to_string()),
            })
            .collect()
    }

    fn cast(names: &[&str]) -> Vec<CastMember> {
        names
            .iter()
            .map(|n| CastMember {
                name: Some((*n).to_string()),
            })
            .collect()
    }

    #[test]
    fn movie_director_caps_at_two_in_order() {
        let credits = Credits {
            crew: crew(&[
                ("Anna", "Director"),
                ("Ben", "Director"),
                ("Cleo", "Producer"),
                ("Dana", "Director"),
            ]),
            cast: vec![],
        };
        assert_eq!(credits.movie_director().as_deref(), Some("Anna, Ben"));
    }

    #[test]
    fn movie_director_none_without_directors() {
        let credits = Credits {
            crew: crew(&[("Cleo", "Producer")]),
            cast: vec![],
        };
        assert!(credits.movie_director().is_none());
        assert_eq!(credits.director_display(MediaKind::Movie), NO_DIRECTOR);
    }

    #[test]
    fn tv_director_prefers_creator_over_lower_jobs() {
        // A Creator and a Showrunner outrank an explicit Director credit.
        let credits = Credits {
            crew: crew(&[
                ("C", "Director"),
                ("B", "Showrunner"),
                ("A", "Creator"),
            ]),
            cast: vec![],
        };
        assert_eq!(credits.tv_director().as_deref(), Some("A, B"));
    }

    #[test]
    fn tv_director_stops_after_two_within_one_job() {
        let credits = Credits {
            crew: crew(&[
                ("A", "Creator"),
                ("B", "Creator"),
                ("C", "Creator"),
                ("D", "Executive Producer"),
            ]),
            cast: vec![],
        };
        assert_eq!(credits.tv_director().as_deref(), Some("A, B"));
    }

    #[test]
    fn tv_director_fills_from_lower_priority_jobs() {
        let credits = Credits {
            crew: crew(&[("E", "Executive Producer"), ("D", "Director")]),
            cast: vec![],
        };
        assert_eq!(credits.tv_director().as_deref(), Some("E, D"));
    }

    #[test]
    fn top_cast_takes_first_five_and_drops_nameless() {
        let mut members = cast(&["1", "2", "3"]);
        members.push(CastMember { name: None });
        members.extend(cast(&["5", "6"]));
        let credits = Credits {
            crew: vec![],
            cast: members,
        };
        // The nameless fourth slot is dropped after the five-entry window.
        assert_eq!(credits.top_cast().as_deref(), Some("1, 2, 3, 5"));
    }

    #[test]
    fn empty_cast_uses_placeholder_in_display() {
        let credits = Credits::default();
        assert_eq!(credits.cast_display(), NO_CAST);
        assert!(credits.top_cast().is_none());
    }

    #[test]
    fn media_kind_flip_and_parse() {
        assert_eq!(MediaKind::Movie.flip(), MediaKind::Tv);
        assert_eq!(MediaKind::from_stored(Some("tv")), MediaKind::Tv);
        assert_eq!(MediaKind::from_stored(None), MediaKind::Movie);
        assert_eq!(MediaKind::from_stored(Some("")), MediaKind::Movie);
    }
}
