use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use super::data::AnimeItem;

/// Day buckets keyed by plain calendar date, in dataset order within each
/// bucket.
pub(crate) type DayIndex<'a> = BTreeMap<NaiveDate, Vec<&'a AnimeItem>>;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The dates an item shows up under: its release date when concrete, and
/// its next airing date when concrete and different from the release date
/// (an item whose two stamps coincide appears once).
pub(crate) fn relevant_dates(item: &AnimeItem) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(2);
    let release = item.release_date();
    if let Some(date) = release {
        dates.push(date);
    }
    if let Some(date) = item.next_airing_date()
        && Some(date) != release
    {
        dates.push(date);
    }
    dates
}

/// Bucket `items` by calendar date. When `favorites_only` is set, items
/// whose id is not in `favorites` contribute nothing. Items with no
/// concrete date contribute nothing.
pub(crate) fn build_day_index<'a>(
    items: &'a [AnimeItem],
    favorites_only: bool,
    favorites: &HashSet<String>,
) -> DayIndex<'a> {
    let mut index = DayIndex::new();
    for item in items {
        if favorites_only && !favorites.contains(&item.id) {
            continue;
        }
        for date in relevant_dates(item) {
            index.entry(date).or_default().push(item);
        }
    }
    index
}

#[derive(Debug, Clone)]
pub(crate) struct DayCell<'a> {
    pub(crate) date: NaiveDate,
    pub(crate) is_today: bool,
    pub(crate) is_weekend: bool,
    pub(crate) items: Vec<&'a AnimeItem>,
}

#[derive(Debug, Clone)]
pub(crate) struct MonthGrid<'a> {
    pub(crate) year: i32,
    pub(crate) month0: u32,
    pub(crate) leading_blanks: u32,
    /// Rows of seven cells; `None` pads before the 1st and after the last
    /// day of the month.
    pub(crate) weeks: Vec<Vec<Option<DayCell<'a>>>>,
}

impl MonthGrid<'_> {
    pub(crate) fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[self.month0 as usize], self.year)
    }
}

/// Lay out one month as calendar rows. `today` is caller-supplied so the
/// highlight is testable; `week_start` picks the leading-weekday
/// convention (the site uses Sunday). Months are 0-based to match
/// `navigate_month`. Returns `None` for an out-of-range month.
pub(crate) fn month_grid<'a>(
    year: i32,
    month0: u32,
    today: NaiveDate,
    week_start: Weekday,
    index: &DayIndex<'a>,
) -> Option<MonthGrid<'a>> {
    let first = NaiveDate::from_ymd_opt(year, month0.checked_add(1)?, 1)?;
    let (next_year, next_month0) = navigate_month(year, month0, 1)?;
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month0 + 1, 1)?;
    let days_in_month = next_first.signed_duration_since(first).num_days() as u32;

    let leading_blanks = first.weekday().days_since(week_start);
    let mut cells: Vec<Option<DayCell<'a>>> = Vec::new();
    cells.resize(leading_blanks as usize, None);

    for day in 1..=days_in_month {
        let date = NaiveDate::from_ymd_opt(year, month0 + 1, day)?;
        let weekday = date.weekday();
        cells.push(Some(DayCell {
            date,
            is_today: date == today,
            is_weekend: weekday == Weekday::Sat || weekday == Weekday::Sun,
            items: index.get(&date).cloned().unwrap_or_default(),
        }));
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    let mut weeks = Vec::with_capacity(cells.len() / 7);
    let mut row = Vec::with_capacity(7);
    for cell in cells {
        row.push(cell);
        if row.len() == 7 {
            weeks.push(std::mem::take(&mut row));
            row = Vec::with_capacity(7);
        }
    }

    Some(MonthGrid {
        year,
        month0,
        leading_blanks,
        weeks,
    })
}

/// Step one month forward or back. Months are 0-based (0 = January) and
/// wrap with a year carry; any direction other than `1`/`-1`, or an
/// out-of-range month, is rejected rather than corrupting the cursor.
pub(crate) fn navigate_month(year: i32, month0: u32, direction: i32) -> Option<(i32, u32)> {
    if month0 > 11 {
        return None;
    }
    match direction {
        1 => {
            if month0 == 11 {
                Some((year + 1, 0))
            } else {
                Some((year, month0 + 1))
            }
        }
        -1 => {
            if month0 == 0 {
                Some((year - 1, 11))
            } else {
                Some((year, month0 - 1))
            }
        }
        _ => None,
    }
}
