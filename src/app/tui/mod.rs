mod render;
mod session;

use std::collections::HashSet;
use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, Weekday};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::TableState;

use crate::db::Store;

use super::calendar::{build_day_index, month_grid, navigate_month};
use super::data::{AnimeItem, truncate};
use super::favorites;
use super::links;
use super::rankings::{RankedItem, SortKey, assign_display_ranks, format_rank, format_score, sort_rankings};

use self::render::draw_tui;
use self::session::TuiSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Rankings,
    Calendar,
}

impl Tab {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Rankings => "RANKINGS",
            Self::Calendar => "CALENDAR",
        }
    }

    fn toggle(self) -> Self {
        match self {
            Self::Rankings => Self::Calendar,
            Self::Calendar => Self::Rankings,
        }
    }
}

/// Item detail popup, built when the user presses Enter on a row.
#[derive(Debug, Clone)]
pub(super) struct PendingDetail {
    pub(super) title: String,
    pub(super) message: String,
}

pub(crate) fn run_tui(store: &Store, items: &[AnimeItem]) -> Result<()> {
    let mut session = TuiSession::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))
        .context("failed to initialize terminal backend")?;
    terminal.clear()?;

    let mut favorite_set = favorites::load(store.get(favorites::FAVORITES_KEY)?.as_deref());
    let today = Local::now().date_naive();

    let mut tab = Tab::Rankings;
    let mut sort_key = SortKey::Overall;
    let mut favorites_only = false;
    let mut cursor = (today.year(), today.month0());
    let mut table_state = TableState::default();
    let mut detail = None::<PendingDetail>;
    let mut status = if items.is_empty() {
        status_info("Dataset is empty. Run `aniview refresh <url>` and try again.")
    } else {
        status_info("Ready.")
    };

    loop {
        let ordered = sort_rankings(items, Some(sort_key));
        let visible: Vec<RankedItem> = assign_display_ranks(&ordered, |item| {
            !favorites_only || favorite_set.contains(&item.id)
        })
        .into_iter()
        .filter(|entry| entry.rank.is_some())
        .collect();

        if visible.is_empty() {
            table_state.select(None);
        } else {
            match table_state.selected() {
                Some(selected) => table_state.select(Some(selected.min(visible.len() - 1))),
                None => table_state.select(Some(0)),
            }
        }

        let index = build_day_index(items, favorites_only, &favorite_set);
        let grid = month_grid(cursor.0, cursor.1, today, Weekday::Sun, &index);

        terminal.draw(|frame| {
            draw_tui(
                frame,
                tab,
                sort_key,
                favorites_only,
                &visible,
                grid.as_ref(),
                &favorite_set,
                &status,
                detail.as_ref(),
                &mut table_state,
            )
        })?;

        if !event::poll(Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if detail.is_some() {
            detail = None;
            continue;
        }

        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Tab => tab = tab.toggle(),
            KeyCode::Char('1') => tab = Tab::Rankings,
            KeyCode::Char('2') => tab = Tab::Calendar,
            KeyCode::Char('v') => {
                favorites_only = !favorites_only;
                status = status_info(if favorites_only {
                    "Showing favorites only."
                } else {
                    "Showing everything."
                });
            }
            KeyCode::Up if tab == Tab::Rankings => {
                if let Some(selected) = table_state.selected() {
                    table_state.select(Some(selected.saturating_sub(1)));
                }
            }
            KeyCode::Down if tab == Tab::Rankings => {
                if let Some(selected) = table_state.selected()
                    && !visible.is_empty()
                {
                    let next = (selected + 1).min(visible.len().saturating_sub(1));
                    table_state.select(Some(next));
                }
            }
            KeyCode::Left => match tab {
                Tab::Rankings => sort_key = sort_key.previous(),
                Tab::Calendar => {
                    if let Some(previous) = navigate_month(cursor.0, cursor.1, -1) {
                        cursor = previous;
                    }
                }
            },
            KeyCode::Right => match tab {
                Tab::Rankings => sort_key = sort_key.next(),
                Tab::Calendar => {
                    if let Some(next) = navigate_month(cursor.0, cursor.1, 1) {
                        cursor = next;
                    }
                }
            },
            KeyCode::Char('f') if tab == Tab::Rankings => {
                let Some(entry) = table_state.selected().and_then(|idx| visible.get(idx)) else {
                    status = status_error("Nothing selected.");
                    continue;
                };
                let id = entry.item.id.clone();
                let name = entry.item.name.clone();
                let next = favorites::toggle(&favorite_set, &id);
                match store.set(
                    favorites::FAVORITES_KEY,
                    &favorites::serialize(&next),
                    favorites::FAVORITES_TTL_DAYS,
                ) {
                    Ok(()) => {
                        let added = next.contains(&id);
                        favorite_set = next;
                        status = status_info(&if added {
                            format!("Favorited {}", truncate(&name, 48))
                        } else {
                            format!("Unfavorited {}", truncate(&name, 48))
                        });
                    }
                    Err(err) => status = status_error(&format!("Could not save favorites: {err}")),
                }
            }
            KeyCode::Enter if tab == Tab::Rankings => {
                let Some(entry) = table_state.selected().and_then(|idx| visible.get(idx)) else {
                    continue;
                };
                let stored_link = store.get(&links::link_key(&entry.item.id)).unwrap_or(None);
                detail = Some(build_detail(
                    entry.item,
                    &favorite_set,
                    stored_link.as_deref(),
                ));
            }
            _ => {}
        }
    }

    terminal.show_cursor()?;
    session.leave()?;
    Ok(())
}

pub(super) fn status_info(msg: &str) -> String {
    format!("INFO: {msg}")
}

pub(super) fn status_error(msg: &str) -> String {
    format!("ERROR: {msg}")
}

fn build_detail(
    item: &AnimeItem,
    favorite_set: &HashSet<String>,
    stored_link: Option<&str>,
) -> PendingDetail {
    let mut lines = Vec::new();
    if let Some(english) = &item.english_title {
        lines.push(english.clone());
    }
    lines.push(item.episode_line());
    lines.push(String::new());
    let anilist = match (item.anilist_rank, item.anilist_score) {
        (rank, Some(score)) => format!("{} ({score:.0}/100)", format_rank(rank)),
        (rank, None) => format_rank(rank),
    };
    lines.push(format!(
        "Overall {}   AniList {anilist}   MAL {}",
        format_score(item.overall_score),
        format_score(item.mal_score),
    ));
    lines.push(format!(
        "AniTrendz {}   Weekly {}   Popularity {}",
        format_rank(item.anitrendz_rank),
        format_score(item.weekly_score),
        format_rank(item.popularity_rank),
    ));
    if let Some(members) = item.mal_members {
        lines.push(format!("MAL members {members}"));
    }
    lines.push(String::new());
    if item.streaming_links.is_empty() {
        lines.push("No streaming links.".to_string());
    } else {
        lines.push("Streaming:".to_string());
        for link in item.streaming_links.iter().take(5) {
            lines.push(format!("  {}  {}", link.site, truncate(&link.url, 48)));
        }
        if item.streaming_links.len() > 5 {
            lines.push(format!("  +{} more", item.streaming_links.len() - 5));
        }
    }
    if let Some(link) = links::effective_link(item, stored_link) {
        let marker = if stored_link.is_some() { " (custom)" } else { "" };
        lines.push(format!("Link: {link}{marker}"));
    }
    lines.push(String::new());
    lines.push(if favorite_set.contains(&item.id) {
        "♥ Favorited".to_string()
    } else {
        "♡ Not favorited".to_string()
    });
    lines.push(String::new());
    lines.push("Press any key to close.".to_string());

    PendingDetail {
        title: truncate(&item.name, 56),
        message: lines.join("\n"),
    }
}
