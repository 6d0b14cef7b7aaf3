use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::{
    fetcher::FeedSource,
    model::{NormalizedPost, RawFeedEntry},
    util::{html::strip_html, image::resolve_image_url},
};

pub const EXCERPT_LIMIT: usize = 200;
const WORDS_PER_MINUTE: usize = 200;
const ELLIPSIS: &str = "...";

const UNTITLED: &str = "Untitled";
const NO_EXCERPT: &str = "No excerpt available";
const DEFAULT_CATEGORY: &str = "Article";
const DEFAULT_TAG: &str = "Medium";
const DEFAULT_URL: &str = "#";
const DEFAULT_AUTHOR: &str = "Author";

/// Fetch and normalize the posts for `handle`. One post per retrieved entry.
pub async fn load_posts(source: &dyn FeedSource, handle: &str) -> Vec<NormalizedPost> {
    let entries = source.retrieve(handle).await;
    let posts: Vec<NormalizedPost> = entries.iter().map(normalize).collect();
    tracing::info!(handle, count = posts.len(), "posts normalized");
    posts
}

pub fn normalize(entry: &RawFeedEntry) -> NormalizedPost {
    normalize_at(entry, Utc::now())
}

/// Same as [`normalize`], with `now` standing in for a missing or
/// unparseable publish date.
pub fn normalize_at(entry: &RawFeedEntry, now: DateTime<Utc>) -> NormalizedPost {
    let raw_content = select_content(entry);
    let clean = strip_html(raw_content);
    let image = resolve_image_url(entry, raw_content);
    let minutes = read_time_minutes(&clean);

    tracing::debug!(
        title = entry.title.as_deref().unwrap_or_default(),
        raw_len = raw_content.len(),
        clean_len = clean.len(),
        minutes,
        has_image = image.is_some(),
        "entry normalized"
    );

    let categories = entry
        .categories
        .as_ref()
        .filter(|list| !list.is_empty());

    NormalizedPost {
        title: present(&entry.title).unwrap_or(UNTITLED).to_string(),
        excerpt: excerpt(&clean),
        date: format_date(entry.published.as_deref(), now),
        read_time: format!("{minutes} min read"),
        category: categories
            .and_then(|list| list.first())
            .map(String::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string(),
        tags: categories
            .cloned()
            .unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]),
        image,
        url: present(&entry.link).unwrap_or(DEFAULT_URL).to_string(),
        author: present(&entry.creator)
            .or_else(|| present(&entry.author))
            .unwrap_or(DEFAULT_AUTHOR)
            .to_string(),
    }
}

/// Full encoded content, then generic content, snippet and description.
fn select_content(entry: &RawFeedEntry) -> &str {
    [
        &entry.content_encoded,
        &entry.content,
        &entry.content_snippet,
        &entry.description,
    ]
    .into_iter()
    .find_map(present)
    .unwrap_or("")
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

pub fn excerpt(clean: &str) -> String {
    if clean.is_empty() {
        return NO_EXCERPT.to_string();
    }

    let mut chars = clean.chars();
    let head: String = chars.by_ref().take(EXCERPT_LIMIT).collect();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}

pub fn read_time_minutes(clean: &str) -> usize {
    let words = clean.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

pub fn format_date(raw: Option<&str>, now: DateTime<Utc>) -> String {
    raw.and_then(parse_timestamp)
        .unwrap_or(now)
        .format("%B %-d, %Y")
        .to_string()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
