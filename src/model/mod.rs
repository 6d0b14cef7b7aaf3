use serde::{Deserialize, Serialize};

/// One feed item as delivered by the producer. Every field is optional and
/// producers fill different subsets of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    pub content_encoded: Option<String>,
    pub content: Option<String>,
    pub content_snippet: Option<String>,
    pub description: Option<String>,
    pub published: Option<String>,
    pub categories: Option<Vec<String>>,
    pub link: Option<String>,
    pub creator: Option<String>,
    pub author: Option<String>,
    pub enclosure_url: Option<String>,
    pub media_thumbnail: Option<String>,
    pub alt_media_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
}

/// Display-ready post derived from a [`RawFeedEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPost {
    pub title: String,
    pub excerpt: String,
    pub date: String,
    pub read_time: String,
    pub category: String,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub url: String,
    pub author: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PostsQuery {
    pub handle: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostsOut {
    pub handle: String,
    pub posts: Vec<NormalizedPost>,
}
