use super::data::AnimeItem;

pub(crate) const LINK_TTL_DAYS: i64 = 30;

const FALLBACK_LINK: &str = "https://www.google.com";
const DEFAULT_LINK_PREFIX: &str = "https://anilist.co";

pub(crate) fn link_key(id: &str) -> String {
    format!("link_{id}")
}

/// Overrides must be https URLs; anything else falls back to a safe
/// default instead of being stored verbatim.
pub(crate) fn sanitize_link(link: &str) -> String {
    let trimmed = link.trim();
    if !trimmed.starts_with("https://") {
        return FALLBACK_LINK.to_string();
    }
    trimmed.to_string()
}

/// Pointing an item back at its anilist.co page means "no override":
/// the stored key is removed rather than kept in sync with the default.
pub(crate) fn is_default_link(link: &str) -> bool {
    link.starts_with(DEFAULT_LINK_PREFIX)
}

/// The link an item opens with: the sanitized override when one is
/// stored, the item's canonical site URL otherwise.
pub(crate) fn effective_link(item: &AnimeItem, stored_override: Option<&str>) -> Option<String> {
    match stored_override {
        Some(link) => Some(sanitize_link(link)),
        None => item.site_url.clone(),
    }
}
