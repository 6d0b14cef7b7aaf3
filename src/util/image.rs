use std::sync::OnceLock;

use regex::Regex;

use crate::model::RawFeedEntry;

const DENIED_FRAGMENTS: &[&str] = &["1*1", "tracking", "pixel", "logo", "icon"];
const ALLOWED_FRAGMENTS: &[&str] = &[
    "miro.medium.com",
    "cdn-images",
    "unsplash",
    "jpeg",
    "jpg",
    "png",
];

fn img_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<img[^>]+src="([^">]+)""#).expect("img tag pattern is valid")
    })
}

fn src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"src="([^">]+)""#).expect("src pattern is valid"))
}

/// Pick the best image for an entry: explicit media fields first, then the
/// first plausible `<img>` inside the unsanitized content.
pub fn resolve_image_url(entry: &RawFeedEntry, raw_content: &str) -> Option<String> {
    [
        &entry.enclosure_url,
        &entry.media_thumbnail,
        &entry.alt_media_thumbnail,
        &entry.thumbnail,
    ]
    .into_iter()
    .find_map(|field| field.as_deref().filter(|url| !url.is_empty()))
    .map(str::to_string)
    .or_else(|| scan_content_images(raw_content))
}

pub fn scan_content_images(raw_content: &str) -> Option<String> {
    img_tag_pattern()
        .find_iter(raw_content)
        .filter_map(|tag| {
            // The src is re-read from the matched tag so the first attribute wins.
            src_pattern()
                .captures(tag.as_str())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        })
        .find(|url| is_content_image(url))
        .map(str::to_string)
}

fn is_content_image(url: &str) -> bool {
    !DENIED_FRAGMENTS.iter().any(|fragment| url.contains(fragment))
        && ALLOWED_FRAGMENTS.iter().any(|fragment| url.contains(fragment))
}
