use std::cmp::Ordering;

use super::data::AnimeItem;

/// Rank sentinel for records missing a rank-like field; sorts after any
/// real rank under ascending order.
const MISSING_RANK: u32 = 999;

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SortKey {
    Overall,
    Anilist,
    Mal,
    Anitrendz,
    Weekly,
}

impl SortKey {
    pub(crate) const ALL: [SortKey; 5] = [
        Self::Overall,
        Self::Anilist,
        Self::Mal,
        Self::Anitrendz,
        Self::Weekly,
    ];

    /// Unknown names parse to `None`; sorting with `None` keeps the input
    /// order rather than failing.
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "overall" => Some(Self::Overall),
            "anilist" => Some(Self::Anilist),
            "mal" => Some(Self::Mal),
            "anitrendz" => Some(Self::Anitrendz),
            "weekly" => Some(Self::Weekly),
            _ => None,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Overall => "OVERALL",
            Self::Anilist => "ANILIST",
            Self::Mal => "MAL",
            Self::Anitrendz => "ANITRENDZ",
            Self::Weekly => "WEEKLY",
        }
    }

    pub(crate) fn next(self) -> Self {
        match self {
            Self::Overall => Self::Anilist,
            Self::Anilist => Self::Mal,
            Self::Mal => Self::Anitrendz,
            Self::Anitrendz => Self::Weekly,
            Self::Weekly => Self::Overall,
        }
    }

    pub(crate) fn previous(self) -> Self {
        match self {
            Self::Overall => Self::Weekly,
            Self::Anilist => Self::Overall,
            Self::Mal => Self::Anilist,
            Self::Anitrendz => Self::Mal,
            Self::Weekly => Self::Anitrendz,
        }
    }

    fn compare(self, a: &AnimeItem, b: &AnimeItem) -> Ordering {
        match self {
            // Score keys: descending, missing reads as 0.0 and sorts last.
            Self::Overall => score_descending(a.overall_score, b.overall_score),
            Self::Mal => score_descending(a.mal_score, b.mal_score),
            Self::Weekly => score_descending(a.weekly_score, b.weekly_score),
            // Rank keys: ascending, missing reads as 999 and sorts last.
            Self::Anilist => rank_ascending(a.anilist_rank, b.anilist_rank),
            Self::Anitrendz => rank_ascending(a.anitrendz_rank, b.anitrendz_rank),
        }
    }
}

fn score_descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(0.0).total_cmp(&a.unwrap_or(0.0))
}

fn rank_ascending(a: Option<u32>, b: Option<u32>) -> Ordering {
    a.unwrap_or(MISSING_RANK).cmp(&b.unwrap_or(MISSING_RANK))
}

/// Reorder `records` for `key`. Stable: equal values keep their input
/// order, so sorting twice is a no-op. The input is never mutated and the
/// output is always a permutation of it; `None` (unrecognized key) is the
/// identity order.
pub(crate) fn sort_rankings<'a>(
    records: &'a [AnimeItem],
    key: Option<SortKey>,
) -> Vec<&'a AnimeItem> {
    let mut ordered: Vec<&AnimeItem> = records.iter().collect();
    if let Some(key) = key {
        ordered.sort_by(|a, b| key.compare(a, b));
    }
    ordered
}

pub(crate) fn format_score(score: Option<f64>) -> String {
    score
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn format_rank(rank: Option<u32>) -> String {
    rank.map(|v| format!("#{v}"))
        .unwrap_or_else(|| "-".to_string())
}

#[derive(Debug, Clone)]
pub(crate) struct RankedItem<'a> {
    pub(crate) item: &'a AnimeItem,
    /// 1-based position among visible records; hidden records carry none.
    pub(crate) rank: Option<usize>,
    pub(crate) medal: Option<&'static str>,
}

impl RankedItem<'_> {
    /// Medal replaces the rank number for the top three, matching the
    /// rankings table's rank column.
    pub(crate) fn rank_text(&self) -> String {
        match (self.medal, self.rank) {
            (Some(medal), _) => medal.to_string(),
            (None, Some(rank)) => rank.to_string(),
            (None, None) => "-".to_string(),
        }
    }
}

/// Number visible records 1..N in the order given, independent of how the
/// order was produced; the predicate expresses any filter (top-N limit,
/// favorites-only, a hidden title). Hidden records are passed through
/// unranked so callers can still address them.
pub(crate) fn assign_display_ranks<'a>(
    records: &[&'a AnimeItem],
    visible: impl Fn(&AnimeItem) -> bool,
) -> Vec<RankedItem<'a>> {
    let mut next_rank = 0_usize;
    records
        .iter()
        .map(|&item| {
            if visible(item) {
                next_rank += 1;
                RankedItem {
                    item,
                    rank: Some(next_rank),
                    medal: MEDALS.get(next_rank - 1).copied(),
                }
            } else {
                RankedItem {
                    item,
                    rank: None,
                    medal: None,
                }
            }
        })
        .collect()
}
