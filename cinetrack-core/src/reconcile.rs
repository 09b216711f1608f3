//! Metadata reconciliation for a stored watch-status record.
//!
//! The upstream fetch retries once with the opposite media type, and always
//! re-attempts detail and credits together so a record is never merged from
//! mixed-namespace responses. The merge itself is pure: it mutates a record
//! in memory and reports an old/new diff; persistence happens afterwards in
//! one statement, or not at all.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::credits::{Credits, MediaKind};
use crate::error::Result;
use crate::locale::{countries_display, genres_display, NO_OVERVIEW};
use crate::models::WatchStatusRecord;
use crate::tmdb::{Details, TmdbClient};

/// An old/new pair for one reconciled field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Detail and credits for one title, fetched under a single media type.
#[derive(Debug)]
pub struct TitleSnapshot {
    pub kind: MediaKind,
    pub details: Details,
    pub credits: Credits,
}

/// Fetch detail + credits for `kind`; when either call fails, flip the media
/// type once and re-attempt both calls together.
pub async fn fetch_title_snapshot(
    client: &TmdbClient,
    id: i64,
    kind: MediaKind,
) -> Result<TitleSnapshot> {
    match fetch_both(client, id, kind).await {
        Ok((details, credits)) => Ok(TitleSnapshot {
            kind,
            details,
            credits,
        }),
        Err(err) => {
            let flipped = kind.flip();
            debug!(id, from = %kind, to = %flipped, error = %err, "retrying with flipped media type");
            let (details, credits) = fetch_both(client, id, flipped).await?;
            Ok(TitleSnapshot {
                kind: flipped,
                details,
                credits,
            })
        }
    }
}

async fn fetch_both(
    client: &TmdbClient,
    id: i64,
    kind: MediaKind,
) -> Result<(Details, Credits)> {
    let details = client.details(kind, id).await?;
    let credits = client.credits(kind, id).await?;
    Ok((details, credits))
}

/// Merge a fetched snapshot into a stored record, updating only fields that
/// differ and returning the diff map. `updated_at` is always refreshed.
pub fn apply_refresh(
    record: &mut WatchStatusRecord,
    snapshot: &TitleSnapshot,
) -> BTreeMap<&'static str, FieldChange> {
    let mut changes = BTreeMap::new();
    let TitleSnapshot {
        kind,
        details,
        credits,
    } = snapshot;

    let new_director = credits.director_display(*kind);
    if record.director.as_deref() != Some(new_director.as_str()) {
        changes.insert(
            "director",
            FieldChange {
                old: json!(record.director),
                new: json!(new_director),
            },
        );
        record.director = Some(new_director);
    }

    let new_cast = credits.cast_display();
    if record.cast_names.as_deref() != Some(new_cast.as_str()) {
        changes.insert(
            "cast",
            FieldChange {
                old: json!(record.cast_names),
                new: json!(new_cast),
            },
        );
        record.cast_names = Some(new_cast);
    }

    let new_genres = genres_display(&details.genres);
    if record.genres.as_deref() != Some(new_genres.as_str()) {
        changes.insert(
            "genres",
            FieldChange {
                old: json!(record.genres),
                new: json!(new_genres),
            },
        );
        record.genres = Some(new_genres);
    }

    let new_countries = countries_display(&details.production_countries);
    if record.production_countries.as_deref() != Some(new_countries.as_str()) {
        changes.insert(
            "production_countries",
            FieldChange {
                old: json!(record.production_countries),
                new: json!(new_countries),
            },
        );
        record.production_countries = Some(new_countries);
    }

    let new_vote = details.vote_average.unwrap_or(0.0);
    if record.vote_average != Some(new_vote) {
        changes.insert(
            "vote_average",
            FieldChange {
                old: json!(record.vote_average),
                new: json!(new_vote),
            },
        );
        record.vote_average = Some(new_vote);
    }

    // Overview is only replaced by a real upstream synopsis.
    if let Some(overview) = details.overview.as_deref() {
        if !overview.is_empty()
            && overview != NO_OVERVIEW
            && record.overview.as_deref() != Some(overview)
        {
            changes.insert(
                "overview",
                FieldChange {
                    old: json!(record.overview),
                    new: json!(overview),
                },
            );
            record.overview = Some(overview.to_string());
        }
    }

    match kind {
        MediaKind::Tv => {
            if let Some(date) = details.first_air_date.as_deref() {
                if !date.is_empty() && record.first_air_date.as_deref() != Some(date) {
                    changes.insert(
                        "first_air_date",
                        FieldChange {
                            old: json!(record.first_air_date),
                            new: json!(date),
                        },
                    );
                    record.first_air_date = Some(date.to_string());
                }
            }
        }
        MediaKind::Movie => {
            if let Some(date) = details.release_date.as_deref() {
                if !date.is_empty() && record.release_date.as_deref() != Some(date) {
                    changes.insert(
                        "release_date",
                        FieldChange {
                            old: json!(record.release_date),
                            new: json!(date),
                        },
                    );
                    record.release_date = Some(date.to_string());
                }
            }
        }
    }

    if record.media_type.as_deref() != Some(kind.as_str()) {
        changes.insert(
            "media_type",
            FieldChange {
                old: json!(record.media_type),
                new: json!(kind.as_str()),
            },
        );
        record.media_type = Some(kind.as_str().to_string());
    }

    changes
}
