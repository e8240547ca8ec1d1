use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::Value;

/// One entry of the dataset snapshot. Loaded once per run and treated as
/// immutable; every score field is optional and degrades to "missing"
/// rather than failing the load.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AnimeItem {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) english_title: Option<String>,
    pub(crate) episode: Option<u32>,
    pub(crate) release_date_raw: Option<String>,
    pub(crate) next_airing_date_raw: Option<String>,
    pub(crate) next_episode_number: Option<u32>,
    pub(crate) streaming_links: Vec<StreamingLink>,
    pub(crate) site_url: Option<String>,
    pub(crate) overall_score: Option<f64>,
    pub(crate) mal_score: Option<f64>,
    pub(crate) mal_members: Option<u64>,
    pub(crate) anilist_rank: Option<u32>,
    pub(crate) anilist_score: Option<f64>,
    pub(crate) anitrendz_rank: Option<u32>,
    pub(crate) weekly_score: Option<f64>,
    pub(crate) popularity_rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StreamingLink {
    pub(crate) site: String,
    pub(crate) url: String,
    pub(crate) icon: Option<String>,
}

impl AnimeItem {
    pub(crate) fn release_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(self.release_date_raw.as_deref()?)
    }

    pub(crate) fn next_airing_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(self.next_airing_date_raw.as_deref()?)
    }

    /// "Episode N / Airs: date" pair for detail views, preferring the
    /// upcoming episode when both fields are present.
    pub(crate) fn episode_line(&self) -> String {
        match (self.next_episode_number, self.next_airing_date_raw.as_deref()) {
            (Some(next), Some(date)) => format!("Episode {next}, airs {date}"),
            _ => {
                let episode = self
                    .episode
                    .map(|ep| ep.to_string())
                    .unwrap_or_else(|| "?".to_string());
                let airs = self.release_date_raw.as_deref().unwrap_or("Ongoing");
                format!("Episode {episode}, airs {airs}")
            }
        }
    }
}

/// Sentinel-aware date parse: `TBD`, `Ongoing`, and anything that is not
/// a `YYYY-MM-DD` calendar date all mean "no concrete date". Keys stay
/// plain calendar dates; no timezone is ever involved.
pub(crate) fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "TBD" || trimmed == "Ongoing" {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// Merge the two snapshots the site serves: `anime_data.json` (a plain
/// array) followed by the `other_anime` list of `other_anime_sorted.json`.
/// Duplicate ids are kept as-is; callers that index by id see the first.
pub(crate) fn load_dataset(seasonal_path: &Path, other_path: &Path) -> Result<Vec<AnimeItem>> {
    let mut items = Vec::new();
    let mut found_any = false;

    if seasonal_path.exists() {
        found_any = true;
        let raw = std::fs::read_to_string(seasonal_path)
            .with_context(|| format!("failed to read {}", seasonal_path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", seasonal_path.display()))?;
        items.extend(items_from_array(&value));
    }

    if other_path.exists() {
        found_any = true;
        let raw = std::fs::read_to_string(other_path)
            .with_context(|| format!("failed to read {}", other_path.display()))?;
        let value: Value = serde_json::from_str(&raw)
            .with_context(|| format!("invalid JSON in {}", other_path.display()))?;
        if let Some(other) = value.get("other_anime") {
            items.extend(items_from_array(other));
        }
    }

    if !found_any {
        bail!(
            "no dataset snapshots found (expected {} or {})",
            seasonal_path.display(),
            other_path.display()
        );
    }
    Ok(items)
}

pub(crate) fn items_from_array(value: &Value) -> Vec<AnimeItem> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };
    entries.iter().filter_map(item_from_value).collect()
}

/// Lenient per-record extraction. A record without an id cannot be
/// favorited or indexed and is skipped; everything else is optional.
pub(crate) fn item_from_value(value: &Value) -> Option<AnimeItem> {
    let id = string_field(value, "id")?;
    Some(AnimeItem {
        id,
        name: string_field(value, "name").unwrap_or_default(),
        english_title: string_field(value, "english_title"),
        episode: u32_field(value, "episode"),
        release_date_raw: string_field(value, "release_date"),
        next_airing_date_raw: string_field(value, "next_airing_date"),
        next_episode_number: u32_field(value, "next_episode_number"),
        streaming_links: streaming_links_from_value(value.get("streaming_links")),
        site_url: string_field(value, "site_url"),
        overall_score: f64_field(value, "overall_score"),
        mal_score: f64_field(value, "mal_score"),
        mal_members: u64_field(value, "mal_members"),
        anilist_rank: u32_field(value, "anilist_rank"),
        anilist_score: f64_field(value, "anilist_score"),
        anitrendz_rank: u32_field(value, "anitrendz_rank"),
        weekly_score: f64_field(value, "weekly_score"),
        popularity_rank: u32_field(value, "popularity_rank"),
    })
}

fn streaming_links_from_value(value: Option<&Value>) -> Vec<StreamingLink> {
    let Some(entries) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            Some(StreamingLink {
                site: string_field(entry, "site")?,
                url: string_field(entry, "url")?,
                icon: string_field(entry, "icon"),
            })
        })
        .collect()
}

/// Ids appear as both numbers and strings across the two snapshots; the
/// string form is canonical everywhere (favorites matching depends on it).
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn f64_field(value: &Value, key: &str) -> Option<f64> {
    match value.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn u32_field(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(number) => number.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(text) => text.trim().trim_start_matches('#').parse::<u32>().ok(),
        _ => None,
    }
}

fn u64_field(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().replace(',', "").parse::<u64>().ok(),
        _ => None,
    }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
