mod calendar;
mod data;
mod favorites;
mod links;
mod rankings;
mod tui;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use chrono::{Datelike, Local, Weekday};

use crate::cli::{Cli, Command};
use crate::db::Store;
use crate::http::{extract_status_lines, stream_text_with_retries};
use crate::paths::{data_dir_path, dataset_file_paths, store_file_path};

use self::calendar::{build_day_index, month_grid};
use self::data::{AnimeItem, load_dataset, truncate};
use self::rankings::{SortKey, assign_display_ranks, format_rank, format_score, sort_rankings};

pub fn run(cli: Cli) -> Result<()> {
    let data_dir = data_dir_path(cli.data_dir.as_deref())?;
    let store = open_store(&data_dir)?;

    match cli.command {
        Some(Command::Rankings {
            sort,
            limit,
            favorites,
            hide,
        }) => run_rankings(&store, &data_dir, sort.as_deref(), limit, favorites, hide)?,
        Some(Command::Calendar {
            year,
            month,
            favorites,
        }) => run_calendar(&store, &data_dir, year, month, favorites)?,
        Some(Command::Favorites { toggle }) => run_favorites(&store, &data_dir, toggle.as_deref())?,
        Some(Command::Link { id, url, clear }) => {
            run_link(&store, &data_dir, &id, url.as_deref(), clear)?
        }
        Some(Command::Refresh { url }) => run_refresh(&url)?,
        Some(Command::Tui) | None => {
            let items = load_items(&data_dir)?;
            tui::run_tui(&store, &items)?;
        }
    }

    Ok(())
}

fn open_store(data_dir: &Path) -> Result<Store> {
    let store = Store::open(&store_file_path(data_dir))?;
    store.migrate()?;
    Ok(store)
}

fn load_items(data_dir: &Path) -> Result<Vec<AnimeItem>> {
    let (seasonal_path, other_path) = dataset_file_paths(data_dir);
    load_dataset(&seasonal_path, &other_path)
}

fn load_favorites(store: &Store) -> Result<HashSet<String>> {
    Ok(favorites::load(
        store.get(favorites::FAVORITES_KEY)?.as_deref(),
    ))
}

fn run_rankings(
    store: &Store,
    data_dir: &Path,
    sort: Option<&str>,
    limit: Option<usize>,
    favorites_only: bool,
    hide: Option<String>,
) -> Result<()> {
    let items = load_items(data_dir)?;
    let favorite_set = load_favorites(store)?;

    let key = match sort {
        Some(raw) => {
            let parsed = SortKey::parse(raw);
            if parsed.is_none() {
                println!("Unknown sort key '{raw}', keeping dataset order.");
            }
            parsed
        }
        None => Some(SortKey::Overall),
    };

    let ordered = sort_rankings(&items, key);
    let ranked = assign_display_ranks(&ordered, |item| {
        (!favorites_only || favorite_set.contains(&item.id))
            && hide.as_deref() != Some(item.name.as_str())
    });

    let limit = limit.unwrap_or(usize::MAX);
    let mut shown = 0_usize;
    println!(
        "{:<6} {:<44} {:>8} {:>8} {:>6} {:>10} {:>7}",
        "RANK", "TITLE", "OVERALL", "ANILIST", "MAL", "ANITRENDZ", "WEEKLY"
    );
    for entry in &ranked {
        let Some(rank) = entry.rank else {
            continue;
        };
        if rank > limit {
            break;
        }
        shown += 1;
        let item = entry.item;
        let heart = if favorite_set.contains(&item.id) { " ♥" } else { "" };
        println!(
            "{:<6} {:<44} {:>8} {:>8} {:>6} {:>10} {:>7}",
            entry.rank_text(),
            truncate(&format!("{}{heart}", item.name), 44),
            format_score(item.overall_score),
            format_rank(item.anilist_rank),
            format_score(item.mal_score),
            format_rank(item.anitrendz_rank),
            format_score(item.weekly_score),
        );
    }

    if shown == 0 {
        println!("Nothing to show. Check the dataset or the favorites filter.");
    }
    Ok(())
}

fn run_calendar(
    store: &Store,
    data_dir: &Path,
    year: Option<i32>,
    month: Option<u32>,
    favorites_only: bool,
) -> Result<()> {
    let items = load_items(data_dir)?;
    let favorite_set = load_favorites(store)?;
    let today = Local::now().date_naive();

    let year = year.unwrap_or_else(|| today.year());
    let month0 = match month {
        Some(m @ 1..=12) => m - 1,
        Some(m) => bail!("month must be 1-12, got {m}"),
        None => today.month0(),
    };

    let index = build_day_index(&items, favorites_only, &favorite_set);
    let grid = month_grid(year, month0, today, Weekday::Sun, &index)
        .ok_or_else(|| anyhow!("invalid calendar month {year}-{}", month0 + 1))?;

    println!("{:^41}", grid.label());
    println!(
        "{:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
        "Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"
    );
    for week in &grid.weeks {
        let row: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                Some(cell) => {
                    let day = cell.date.day();
                    let marker = if cell.is_today { "*" } else { "" };
                    if cell.items.is_empty() {
                        format!("{day}{marker}")
                    } else {
                        format!("{day}{marker}({})", cell.items.len())
                    }
                }
                None => String::new(),
            })
            .collect();
        println!(
            "{:>5} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
            row[0], row[1], row[2], row[3], row[4], row[5], row[6]
        );
    }

    println!();
    let mut any = false;
    for week in &grid.weeks {
        for cell in week.iter().flatten() {
            if cell.items.is_empty() {
                continue;
            }
            any = true;
            let names: Vec<String> = cell
                .items
                .iter()
                .map(|item| truncate(&item.name, 40))
                .collect();
            println!("{}  {}", cell.date, names.join(", "));
        }
    }
    if !any {
        println!(
            "No airing dates this month{}.",
            if favorites_only { " among favorites" } else { "" }
        );
    }
    Ok(())
}

fn run_favorites(store: &Store, data_dir: &Path, toggle_id: Option<&str>) -> Result<()> {
    let favorite_set = load_favorites(store)?;

    if let Some(id) = toggle_id {
        let next = favorites::toggle(&favorite_set, id);
        store.set(
            favorites::FAVORITES_KEY,
            &favorites::serialize(&next),
            favorites::FAVORITES_TTL_DAYS,
        )?;
        if next.contains(id) {
            println!("Added {id} to favorites.");
        } else {
            println!("Removed {id} from favorites.");
        }
        return Ok(());
    }

    if favorite_set.is_empty() {
        println!("No favorites yet. Run `aniview favorites <id>` to add one.");
        return Ok(());
    }

    // Dataset is only needed to show titles next to the ids.
    let items = load_items(data_dir).unwrap_or_default();
    let mut ids: Vec<&String> = favorite_set.iter().collect();
    ids.sort();
    for id in ids {
        let name = items
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.name.as_str())
            .unwrap_or("(not in dataset)");
        println!("{id:<12} {name}");
    }
    Ok(())
}

fn run_link(
    store: &Store,
    data_dir: &Path,
    id: &str,
    url: Option<&str>,
    clear: bool,
) -> Result<()> {
    let key = links::link_key(id);

    if clear {
        if store.delete(&key)? {
            println!("Cleared custom link for {id}.");
        } else {
            println!("No custom link stored for {id}.");
        }
        return Ok(());
    }

    if let Some(url) = url {
        let sanitized = links::sanitize_link(url);
        if links::is_default_link(&sanitized) {
            store.delete(&key)?;
            println!("Link points at the default site; override removed for {id}.");
        } else {
            store.set(&key, &sanitized, links::LINK_TTL_DAYS)?;
            println!("Custom link for {id}: {sanitized}");
        }
        return Ok(());
    }

    let stored = store.get(&key)?;
    let items = load_items(data_dir).unwrap_or_default();
    let item = items.iter().find(|item| item.id == id);
    match (&stored, item) {
        (Some(link), _) => println!("Custom link for {id}: {link}"),
        (None, Some(item)) => println!(
            "No override for {id}; default link: {}",
            item.site_url.as_deref().unwrap_or("-")
        ),
        (None, None) => println!("No custom link stored for {id}."),
    }
    Ok(())
}

fn run_refresh(url: &str) -> Result<()> {
    println!("Starting update from {url} ...");
    let mut printed = 0_usize;
    let result = stream_text_with_retries(
        url,
        url,
        Duration::from_secs(5),
        Duration::from_secs(300),
        3,
        Duration::from_millis(500),
        &mut |body_so_far| {
            let lines = extract_status_lines(body_so_far);
            for line in lines.iter().skip(printed) {
                println!("  {line}");
            }
            printed = lines.len();
        },
    );

    match result {
        Ok(body) => {
            // Flush any status lines that only completed with the final chunk.
            let lines = extract_status_lines(&body);
            for line in lines.iter().skip(printed) {
                println!("  {line}");
            }
            println!("Update complete. Refreshed snapshots are read on the next command.");
            Ok(())
        }
        Err(err) => Err(anyhow!("update failed: {err}")),
    }
}
