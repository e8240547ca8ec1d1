use std::collections::HashSet;

use chrono::{NaiveDate, Weekday};
use serde_json::json;

use super::calendar::*;
use super::data::*;
use super::favorites;
use super::links::*;
use super::rankings::*;

fn item(id: &str, name: &str) -> AnimeItem {
    AnimeItem {
        id: id.to_string(),
        name: name.to_string(),
        english_title: None,
        episode: None,
        release_date_raw: None,
        next_airing_date_raw: None,
        next_episode_number: None,
        streaming_links: Vec::new(),
        site_url: None,
        overall_score: None,
        mal_score: None,
        mal_members: None,
        anilist_rank: None,
        anilist_score: None,
        anitrendz_rank: None,
        weekly_score: None,
        popularity_rank: None,
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("test date should parse")
}

fn ids<'a>(ordered: &[&'a AnimeItem]) -> Vec<&'a str> {
    ordered.iter().map(|item| item.id.as_str()).collect()
}

#[test]
fn sort_by_overall_is_descending_with_missing_scores_last() {
    let mut a = item("1", "A");
    a.overall_score = Some(8.5);
    let mut b = item("2", "B");
    b.overall_score = Some(9.0);
    let c = item("3", "C");

    let records = vec![a, b, c];
    let ordered = sort_rankings(&records, Some(SortKey::Overall));
    assert_eq!(ids(&ordered), vec!["2", "1", "3"]);

    let ranked = assign_display_ranks(&ordered, |_| true);
    assert_eq!(ranked[0].rank, Some(1));
    assert_eq!(ranked[0].rank_text(), "🥇");
    assert_eq!(ranked[1].rank_text(), "🥈");
    assert_eq!(ranked[2].rank_text(), "🥉");
}

#[test]
fn sort_by_anilist_is_ascending_with_missing_ranks_last() {
    let mut a = item("1", "A");
    a.anilist_rank = Some(12);
    let b = item("2", "B");
    let mut c = item("3", "C");
    c.anilist_rank = Some(3);

    let records = vec![a, b, c];
    let ordered = sort_rankings(&records, Some(SortKey::Anilist));
    assert_eq!(ids(&ordered), vec!["3", "1", "2"]);
}

#[test]
fn missing_mal_score_sorts_below_every_scored_record() {
    let unscored = item("1", "A");
    let mut low = item("2", "B");
    low.mal_score = Some(0.1);

    let records = vec![unscored, low];
    let ordered = sort_rankings(&records, Some(SortKey::Mal));
    assert_eq!(ids(&ordered), vec!["2", "1"]);
}

#[test]
fn sort_is_stable_and_idempotent_for_equal_values() {
    let mut records = Vec::new();
    for id in ["1", "2", "3", "4"] {
        let mut entry = item(id, id);
        entry.weekly_score = Some(7.0);
        records.push(entry);
    }

    let once = sort_rankings(&records, Some(SortKey::Weekly));
    assert_eq!(ids(&once), vec!["1", "2", "3", "4"]);

    let reordered: Vec<AnimeItem> = once.into_iter().cloned().collect();
    let twice = sort_rankings(&reordered, Some(SortKey::Weekly));
    assert_eq!(ids(&twice), vec!["1", "2", "3", "4"]);
}

#[test]
fn sort_output_is_a_permutation_of_input() {
    let mut a = item("1", "A");
    a.overall_score = Some(5.0);
    let mut b = item("2", "B");
    b.overall_score = Some(9.9);
    let c = item("3", "C");
    let records = vec![a, b, c];

    let ordered = sort_rankings(&records, Some(SortKey::Overall));
    assert_eq!(ordered.len(), records.len());
    let mut sorted_ids = ids(&ordered);
    sorted_ids.sort();
    assert_eq!(sorted_ids, vec!["1", "2", "3"]);

    let empty: Vec<AnimeItem> = Vec::new();
    assert!(sort_rankings(&empty, Some(SortKey::Overall)).is_empty());
}

#[test]
fn unknown_sort_key_keeps_input_order() {
    assert_eq!(SortKey::parse("bogus"), None);

    let mut a = item("1", "A");
    a.overall_score = Some(1.0);
    let mut b = item("2", "B");
    b.overall_score = Some(9.0);
    let records = vec![a, b];

    let ordered = sort_rankings(&records, None);
    assert_eq!(ids(&ordered), vec!["1", "2"]);
}

#[test]
fn sort_key_parse_accepts_known_names_case_insensitively() {
    assert_eq!(SortKey::parse("overall"), Some(SortKey::Overall));
    assert_eq!(SortKey::parse("AniList"), Some(SortKey::Anilist));
    assert_eq!(SortKey::parse(" MAL "), Some(SortKey::Mal));
    assert_eq!(SortKey::parse("anitrendz"), Some(SortKey::Anitrendz));
    assert_eq!(SortKey::parse("weekly"), Some(SortKey::Weekly));
}

#[test]
fn display_ranks_renumber_over_visible_records_only() {
    let one_piece = item("21", "One Piece");
    let a = item("1", "A");
    let b = item("2", "B");
    let records = vec![one_piece, a, b];
    let ordered: Vec<&AnimeItem> = records.iter().collect();

    let ranked = assign_display_ranks(&ordered, |entry| entry.name != "One Piece");
    assert_eq!(ranked[0].rank, None);
    assert_eq!(ranked[0].rank_text(), "-");
    assert_eq!(ranked[1].rank, Some(1));
    assert_eq!(ranked[1].medal, Some("🥇"));
    assert_eq!(ranked[2].rank, Some(2));
}

#[test]
fn day_index_buckets_item_under_both_distinct_dates() {
    let mut entry = item("1", "A");
    entry.release_date_raw = Some("2025-03-01".to_string());
    entry.next_airing_date_raw = Some("2025-03-08".to_string());
    let items = vec![entry];

    let index = build_day_index(&items, false, &HashSet::new());
    assert_eq!(index.get(&date("2025-03-01")).map(Vec::len), Some(1));
    assert_eq!(index.get(&date("2025-03-08")).map(Vec::len), Some(1));
}

#[test]
fn day_index_counts_item_once_when_dates_coincide() {
    let mut entry = item("1", "A");
    entry.release_date_raw = Some("2025-03-01".to_string());
    entry.next_airing_date_raw = Some("2025-03-01".to_string());
    let items = vec![entry];

    let index = build_day_index(&items, false, &HashSet::new());
    assert_eq!(index.get(&date("2025-03-01")).map(Vec::len), Some(1));
    assert_eq!(index.len(), 1);
}

#[test]
fn day_index_preserves_dataset_order_within_buckets() {
    let mut a = item("A", "A");
    a.release_date_raw = Some("2025-06-01".to_string());
    let mut b = item("B", "B");
    b.release_date_raw = Some("2025-06-01".to_string());
    b.next_airing_date_raw = Some("2025-06-08".to_string());
    let items = vec![a, b];

    let index = build_day_index(&items, false, &HashSet::new());
    assert_eq!(ids(index.get(&date("2025-06-01")).expect("bucket")), vec!["A", "B"]);
    assert_eq!(ids(index.get(&date("2025-06-08")).expect("bucket")), vec!["B"]);
}

#[test]
fn day_index_skips_sentinel_dates() {
    let mut tbd = item("1", "A");
    tbd.release_date_raw = Some("TBD".to_string());
    let mut ongoing = item("2", "B");
    ongoing.release_date_raw = Some("Ongoing".to_string());
    ongoing.next_airing_date_raw = Some("2025-07-04".to_string());
    let dateless = item("3", "C");
    let items = vec![tbd, ongoing, dateless];

    let index = build_day_index(&items, false, &HashSet::new());
    assert_eq!(index.len(), 1);
    assert_eq!(ids(index.get(&date("2025-07-04")).expect("bucket")), vec!["2"]);
}

#[test]
fn day_index_favorites_filter_drops_non_favorites() {
    let mut a = item("1", "A");
    a.release_date_raw = Some("2025-06-01".to_string());
    let mut b = item("2", "B");
    b.release_date_raw = Some("2025-06-01".to_string());
    let items = vec![a, b];

    let favorite_set: HashSet<String> = ["2".to_string()].into_iter().collect();
    let index = build_day_index(&items, true, &favorite_set);
    assert_eq!(ids(index.get(&date("2025-06-01")).expect("bucket")), vec!["2"]);
}

#[test]
fn calendar_date_parsing_never_shifts_the_day() {
    // Plain calendar date, no timezone conversion anywhere.
    assert_eq!(parse_calendar_date("2025-01-31"), Some(date("2025-01-31")));
    assert_eq!(parse_calendar_date("TBD"), None);
    assert_eq!(parse_calendar_date("Ongoing"), None);
    assert_eq!(parse_calendar_date("not a date"), None);
}

#[test]
fn month_grid_computes_leading_blanks_and_month_length() {
    // June 2025 starts on a Sunday.
    let today = date("2025-06-15");
    let grid = month_grid(2025, 5, today, Weekday::Sun, &DayIndex::new()).expect("grid");
    assert_eq!(grid.leading_blanks, 0);
    assert_eq!(grid.weeks.len(), 5);
    assert_eq!(grid.label(), "June 2025");

    let last_cell = grid
        .weeks
        .iter()
        .flatten()
        .flatten()
        .last()
        .expect("last day");
    assert_eq!(last_cell.date, date("2025-06-30"));
}

#[test]
fn month_grid_handles_leap_february() {
    let today = date("2024-02-01");
    let grid = month_grid(2024, 1, today, Weekday::Sun, &DayIndex::new()).expect("grid");
    let last_cell = grid
        .weeks
        .iter()
        .flatten()
        .flatten()
        .last()
        .expect("last day");
    assert_eq!(last_cell.date, date("2024-02-29"));
}

#[test]
fn month_grid_flags_today_and_weekends_from_caller_clock() {
    let today = date("2025-06-14"); // a Saturday
    let grid = month_grid(2025, 5, today, Weekday::Sun, &DayIndex::new()).expect("grid");
    let cells: Vec<_> = grid.weeks.iter().flatten().flatten().collect();

    let saturday = cells.iter().find(|cell| cell.date == today).expect("cell");
    assert!(saturday.is_today);
    assert!(saturday.is_weekend);

    let monday = cells
        .iter()
        .find(|cell| cell.date == date("2025-06-16"))
        .expect("cell");
    assert!(!monday.is_today);
    assert!(!monday.is_weekend);
}

#[test]
fn month_grid_respects_week_start_convention() {
    // June 2025 starts on a Sunday: six blanks under a Monday-start week.
    let today = date("2025-06-15");
    let grid = month_grid(2025, 5, today, Weekday::Mon, &DayIndex::new()).expect("grid");
    assert_eq!(grid.leading_blanks, 6);
}

#[test]
fn month_grid_rejects_out_of_range_month() {
    let today = date("2025-06-15");
    assert!(month_grid(2025, 12, today, Weekday::Sun, &DayIndex::new()).is_none());
}

#[test]
fn navigate_month_wraps_december_and_january() {
    assert_eq!(navigate_month(2025, 11, 1), Some((2026, 0)));
    assert_eq!(navigate_month(2025, 0, -1), Some((2024, 11)));
    assert_eq!(navigate_month(2025, 5, 1), Some((2025, 6)));
    assert_eq!(navigate_month(2025, 5, -1), Some((2025, 4)));
}

#[test]
fn navigate_month_rejects_invalid_input() {
    assert_eq!(navigate_month(2025, 5, 0), None);
    assert_eq!(navigate_month(2025, 5, 2), None);
    assert_eq!(navigate_month(2025, 12, 1), None);
}

#[test]
fn favorites_round_trip_through_serialized_form() {
    let empty = favorites::load(Some("[]"));
    let toggled = favorites::toggle(&empty, "42");
    let reloaded = favorites::load(Some(&favorites::serialize(&toggled)));
    assert!(reloaded.contains("42"));
}

#[test]
fn favorites_double_toggle_restores_original_set() {
    let original = favorites::load(Some("[\"7\"]"));
    let once = favorites::toggle(&original, "42");
    assert!(once.contains("42"));
    let twice = favorites::toggle(&once, "42");
    assert_eq!(twice, original);
}

#[test]
fn favorites_load_tolerates_malformed_input() {
    assert!(favorites::load(None).is_empty());
    assert!(favorites::load(Some("not json")).is_empty());
    assert!(favorites::load(Some("{\"a\":1}")).is_empty());
    assert!(favorites::load(Some("")).is_empty());
}

#[test]
fn favorites_load_stringifies_numeric_ids() {
    let set = favorites::load(Some("[21, \"170577\"]"));
    assert!(set.contains("21"));
    assert!(set.contains("170577"));
}

#[test]
fn favorites_serialize_is_deterministic() {
    let set = favorites::load(Some("[\"b\",\"a\",\"c\"]"));
    assert_eq!(favorites::serialize(&set), "[\"a\",\"b\",\"c\"]");
}

#[test]
fn sanitize_link_rejects_non_https_urls() {
    assert_eq!(sanitize_link("http://sketchy.example"), "https://www.google.com");
    assert_eq!(sanitize_link("javascript:alert(1)"), "https://www.google.com");
    assert_eq!(
        sanitize_link("  https://watch.example/show  "),
        "https://watch.example/show"
    );
}

#[test]
fn default_site_links_clear_the_override() {
    assert!(is_default_link("https://anilist.co/anime/21"));
    assert!(!is_default_link("https://watch.example/show"));
}

#[test]
fn effective_link_prefers_sanitized_override() {
    let mut entry = item("1", "A");
    entry.site_url = Some("https://anilist.co/anime/1".to_string());

    assert_eq!(
        effective_link(&entry, Some("https://watch.example/a")),
        Some("https://watch.example/a".to_string())
    );
    assert_eq!(
        effective_link(&entry, Some("ftp://bad")),
        Some("https://www.google.com".to_string())
    );
    assert_eq!(
        effective_link(&entry, None),
        Some("https://anilist.co/anime/1".to_string())
    );
}

#[test]
fn item_from_value_stringifies_numeric_ids() {
    let value = json!({"id": 170577, "name": "Show"});
    let parsed = item_from_value(&value).expect("record should parse");
    assert_eq!(parsed.id, "170577");
    assert_eq!(parsed.name, "Show");
    assert_eq!(parsed.overall_score, None);
}

#[test]
fn item_from_value_accepts_stringified_numbers() {
    let value = json!({
        "id": "21",
        "name": "One Piece",
        "anilist_rank": "#5",
        "mal_members": "1,234,567",
        "mal_score": "8.71",
        "episode": 1100,
    });
    let parsed = item_from_value(&value).expect("record should parse");
    assert_eq!(parsed.anilist_rank, Some(5));
    assert_eq!(parsed.mal_members, Some(1_234_567));
    assert_eq!(parsed.mal_score, Some(8.71));
    assert_eq!(parsed.episode, Some(1100));
}

#[test]
fn items_from_array_skips_records_without_id() {
    let value = json!([
        {"id": 1, "name": "Kept"},
        {"name": "No id"},
        {"id": "2", "name": "Also kept"},
    ]);
    let parsed = items_from_array(&value);
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[0].id, "1");
    assert_eq!(parsed[1].id, "2");

    assert!(items_from_array(&json!({"not": "an array"})).is_empty());
}

#[test]
fn item_parses_streaming_links_leniently() {
    let value = json!({
        "id": 1,
        "name": "Show",
        "streaming_links": [
            {"site": "Crunchyroll", "url": "https://cr.example", "icon": "cr.png"},
            {"site": "Broken"},
            {"site": "HIDIVE", "url": "https://hd.example"},
        ],
    });
    let parsed = item_from_value(&value).expect("record should parse");
    assert_eq!(parsed.streaming_links.len(), 2);
    assert_eq!(parsed.streaming_links[0].site, "Crunchyroll");
    assert_eq!(parsed.streaming_links[1].icon, None);
}

#[test]
fn episode_line_prefers_upcoming_episode_when_known() {
    let mut entry = item("1", "A");
    entry.episode = Some(7);
    entry.release_date_raw = Some("2025-06-01".to_string());
    assert_eq!(entry.episode_line(), "Episode 7, airs 2025-06-01");

    entry.next_episode_number = Some(8);
    entry.next_airing_date_raw = Some("2025-06-08".to_string());
    assert_eq!(entry.episode_line(), "Episode 8, airs 2025-06-08");
}
