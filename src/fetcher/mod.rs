use async_trait::async_trait;
use feed_rs::{
    model::{Entry, FeedType},
    parser,
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::RelayConfig, error::FeedError, model::RawFeedEntry};

/// Upper bound on entries handed to the normalizer per fetch.
pub const MAX_FEED_ENTRIES: usize = 6;

/// Anything that can turn an author handle into raw feed entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Best entries available for `handle`, or empty. Never fails.
    async fn retrieve(&self, handle: &str) -> Vec<RawFeedEntry>;
}

#[derive(Debug, Deserialize)]
struct RelayEnvelope {
    contents: Option<String>,
}

pub struct FeedRetriever {
    client: Client,
    relay_base: String,
    feed_host: String,
}

impl FeedRetriever {
    pub fn new(config: &RelayConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            relay_base: config.base_url.clone(),
            feed_host: config.feed_host.clone(),
        })
    }

    pub fn feed_address(&self, handle: &str) -> String {
        format!("https://{}/feed/@{}", self.feed_host, handle)
    }

    pub fn relay_url(&self, handle: &str) -> Result<Url, FeedError> {
        let mut url = Url::parse(&self.relay_base)?;
        url.query_pairs_mut()
            .append_pair("url", &self.feed_address(handle))
            .append_pair("disableCache", "true");
        Ok(url)
    }

    pub async fn try_retrieve(&self, handle: &str) -> Result<Vec<RawFeedEntry>, FeedError> {
        let url = self.relay_url(handle)?;
        debug!(%url, "requesting feed through relay");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "relay responded");

        let envelope: RelayEnvelope = serde_json::from_str(&body)?;
        let Some(contents) = envelope.contents.filter(|c| !c.is_empty()) else {
            debug!(handle, "relay envelope has no contents");
            return Ok(Vec::new());
        };

        let mut entries = parse_feed(&contents)?;
        entries.truncate(MAX_FEED_ENTRIES);
        Ok(entries)
    }
}

#[async_trait]
impl FeedSource for FeedRetriever {
    async fn retrieve(&self, handle: &str) -> Vec<RawFeedEntry> {
        match self.try_retrieve(handle).await {
            Ok(entries) => {
                info!(handle, count = entries.len(), "feed retrieved");
                entries
            }
            Err(err) => {
                warn!(error = %err, handle, "feed retrieval failed");
                Vec::new()
            }
        }
    }
}

pub fn parse_feed(contents: &str) -> Result<Vec<RawFeedEntry>, FeedError> {
    let feed = parser::parse(contents.as_bytes())?;
    let rss = matches!(
        feed.feed_type,
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2
    );

    Ok(feed
        .entries
        .iter()
        .map(|entry| convert_entry(entry, rss))
        .collect())
}

fn convert_entry(entry: &Entry, rss: bool) -> RawFeedEntry {
    let body = entry.content.as_ref().and_then(|c| non_empty(c.body.as_deref()));
    let summary = entry
        .summary
        .as_ref()
        .and_then(|s| non_empty(Some(s.content.as_str())));

    // RSS puts full markup in content:encoded and the teaser in <description>;
    // Atom and JSON Feed use content + summary.
    let (content_encoded, content, content_snippet, description) = if rss {
        (body, None, None, summary)
    } else {
        (None, body, summary, None)
    };

    let categories: Vec<String> = entry
        .categories
        .iter()
        .filter_map(|c| non_empty(Some(c.term.as_str())))
        .collect();

    let link = entry
        .links
        .iter()
        .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .and_then(|link| non_empty(Some(link.href.as_str())));

    let enclosure_url = entry
        .media
        .iter()
        .flat_map(|media| media.content.iter())
        .find_map(|content| content.url.as_ref().map(|u| u.to_string()));

    let media_thumbnail = entry
        .media
        .first()
        .and_then(|media| media.thumbnails.first())
        .and_then(|thumb| non_empty(Some(thumb.image.uri.as_str())));

    let alt_media_thumbnail = entry
        .media
        .iter()
        .skip(1)
        .flat_map(|media| media.thumbnails.iter())
        .find_map(|thumb| non_empty(Some(thumb.image.uri.as_str())));

    let thumbnail = entry
        .links
        .iter()
        .filter(|link| {
            link.media_type
                .as_deref()
                .is_some_and(|mime| mime.starts_with("image/"))
        })
        .find_map(|link| non_empty(Some(link.href.as_str())));

    RawFeedEntry {
        title: entry
            .title
            .as_ref()
            .and_then(|t| non_empty(Some(t.content.as_str()))),
        content_encoded,
        content,
        content_snippet,
        description,
        published: entry
            .published
            .or(entry.updated)
            .map(|dt| dt.to_rfc3339()),
        categories: (!categories.is_empty()).then_some(categories),
        link,
        creator: entry
            .authors
            .iter()
            .find_map(|p| non_empty(Some(p.name.as_str()))),
        author: entry
            .contributors
            .iter()
            .find_map(|p| non_empty(Some(p.name.as_str()))),
        enclosure_url,
        media_thumbnail,
        alt_media_thumbnail,
        thumbnail,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn rss_with_items(count: usize) -> String {
        let items: String = (1..=count)
            .map(|i| {
                format!(
                    "<item><title>Post {i}</title><link>https://medium.com/@jane/post-{i}</link>\
                     <description><![CDATA[<p>Body {i}</p>]]></description></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Jane on Medium</title><link>https://medium.com/@jane</link>
<description>Stories</description>{items}</channel></rss>"#
        )
    }

    fn retriever_for(server: &mockito::Server) -> FeedRetriever {
        FeedRetriever::new(&RelayConfig {
            base_url: format!("{}/get", server.url()),
            feed_host: "medium.com".to_string(),
            user_agent: "test-agent".to_string(),
        })
        .unwrap()
    }

    fn relay_query(handle: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("url".into(), format!("https://medium.com/feed/@{handle}")),
            Matcher::UrlEncoded("disableCache".into(), "true".into()),
        ])
    }

    #[test]
    fn relay_url_carries_encoded_feed_address_and_cache_directive() {
        let retriever = FeedRetriever::new(&RelayConfig::default()).unwrap();
        assert_eq!(
            retriever.feed_address("jane"),
            "https://medium.com/feed/@jane"
        );
        let url = retriever.relay_url("jane").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.allorigins.win/get?url=https%3A%2F%2Fmedium.com%2Ffeed%2F%40jane&disableCache=true"
        );
    }

    #[tokio::test]
    async fn truncates_to_first_six_in_feed_order() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({ "contents": rss_with_items(10) }).to_string();
        let mock = server
            .mock("GET", "/get")
            .match_query(relay_query("jane"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let entries = retriever_for(&server).retrieve("jane").await;
        mock.assert_async().await;

        let titles: Vec<_> = entries.iter().filter_map(|e| e.title.clone()).collect();
        assert_eq!(
            titles,
            vec!["Post 1", "Post 2", "Post 3", "Post 4", "Post 5", "Post 6"]
        );
    }

    #[tokio::test]
    async fn envelope_without_contents_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get")
            .match_query(Matcher::Any)
            .with_body(r#"{"status":{"http_code":404}}"#)
            .create_async()
            .await;

        let retriever = retriever_for(&server);
        assert!(retriever.try_retrieve("jane").await.unwrap().is_empty());
        assert!(retriever.retrieve("jane").await.is_empty());
    }

    #[tokio::test]
    async fn malformed_envelope_collapses_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/get")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("<html>Bad gateway</html>")
            .create_async()
            .await;

        let retriever = retriever_for(&server);
        assert!(matches!(
            retriever.try_retrieve("jane").await,
            Err(FeedError::Envelope(_))
        ));
        assert!(retriever.retrieve("jane").await.is_empty());
    }

    #[tokio::test]
    async fn unparseable_feed_collapses_to_empty() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({ "contents": "this is not a feed" }).to_string();
        let _mock = server
            .mock("GET", "/get")
            .match_query(Matcher::Any)
            .with_body(body)
            .create_async()
            .await;

        let retriever = retriever_for(&server);
        assert!(matches!(
            retriever.try_retrieve("jane").await,
            Err(FeedError::Parse(_))
        ));
        assert!(retriever.retrieve("jane").await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_relay_collapses_to_empty() {
        let retriever = FeedRetriever::new(&RelayConfig {
            base_url: "http://127.0.0.1:1/get".to_string(),
            ..RelayConfig::default()
        })
        .unwrap();
        assert!(retriever.retrieve("jane").await.is_empty());
    }

    #[test]
    fn rss_items_map_to_raw_entries() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel><title>Feed</title><link>https://medium.com/@jane</link><description>d</description>
<item>
  <title>Testing 101</title>
  <link>https://medium.com/@jane/testing-101</link>
  <category>qa</category>
  <category>testing</category>
  <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate>
  <description><![CDATA[<p>Short teaser</p>]]></description>
  <content:encoded><![CDATA[<p>Full body</p>]]></content:encoded>
</item>
<item><title>Second</title></item>
</channel></rss>"#;

        let entries = parse_feed(rss).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title.as_deref(), Some("Testing 101"));
        assert_eq!(
            first.link.as_deref(),
            Some("https://medium.com/@jane/testing-101")
        );
        assert_eq!(
            first.categories,
            Some(vec!["qa".to_string(), "testing".to_string()])
        );
        assert!(first
            .content_encoded
            .as_deref()
            .is_some_and(|c| c.contains("Full body")));
        assert!(first
            .description
            .as_deref()
            .is_some_and(|d| d.contains("Short teaser")));
        assert!(first.content.is_none());
        assert!(first.published.is_some());

        let second = &entries[1];
        assert_eq!(second.title.as_deref(), Some("Second"));
        assert_eq!(second.categories, None);
        assert_eq!(second.link, None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_feed("plain text, no markup"),
            Err(FeedError::Parse(_))
        ));
    }

    #[test]
    fn rss_media_and_dublin_core_fields_are_mapped() {
        let rss = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:dc="http://purl.org/dc/elements/1.1/">
<channel><title>Feed</title><link>https://medium.com/@jane</link><description>d</description>
<item>
  <title>With media</title>
  <link>https://medium.com/@jane/with-media</link>
  <dc:creator>Jane Doe</dc:creator>
  <enclosure url="https://cdn.example.com/enc.jpg" type="image/jpeg" length="1024"/>
  <media:thumbnail url="https://cdn.example.com/thumb.jpg"/>
</item>
<item>
  <title>Bare media content</title>
  <media:content url="https://cdn.example.com/cover.png" medium="image"/>
</item>
</channel></rss>"#;

        let entries = parse_feed(rss).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.creator.as_deref(), Some("Jane Doe"));
        assert_eq!(first.author, None);
        assert_eq!(
            first.enclosure_url.as_deref(),
            Some("https://cdn.example.com/enc.jpg")
        );
        assert_eq!(
            first.media_thumbnail.as_deref(),
            Some("https://cdn.example.com/thumb.jpg")
        );

        let second = &entries[1];
        assert_eq!(
            second.enclosure_url.as_deref(),
            Some("https://cdn.example.com/cover.png")
        );
        assert_eq!(second.media_thumbnail, None);
    }

    #[test]
    fn atom_entries_fill_content_and_snippet() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Jane on Medium</title>
  <id>urn:uuid:feed</id>
  <updated>2024-01-02T00:00:00Z</updated>
  <entry>
    <title>Atom post</title>
    <id>urn:uuid:entry-1</id>
    <updated>2024-01-02T00:00:00Z</updated>
    <link rel="alternate" href="https://medium.com/@jane/atom-post"/>
    <link rel="enclosure" type="image/png" href="https://cdn.example.com/atom.png"/>
    <summary>Short teaser</summary>
    <content type="html">&lt;p&gt;Full body&lt;/p&gt;</content>
  </entry>
</feed>"#;

        let entries = parse_feed(atom).unwrap();
        let entry = &entries[0];
        assert!(entry
            .content
            .as_deref()
            .is_some_and(|c| c.contains("Full body")));
        assert_eq!(entry.content_snippet.as_deref(), Some("Short teaser"));
        assert_eq!(entry.content_encoded, None);
        assert_eq!(entry.description, None);
        assert_eq!(
            entry.link.as_deref(),
            Some("https://medium.com/@jane/atom-post")
        );
        assert_eq!(
            entry.thumbnail.as_deref(),
            Some("https://cdn.example.com/atom.png")
        );
        assert!(entry.published.is_some());
    }

    #[test]
    fn later_media_objects_supply_the_alternate_thumbnail() {
        use feed_rs::model::{Image, MediaObject, MediaThumbnail};

        fn thumb(uri: &str) -> MediaThumbnail {
            MediaThumbnail {
                image: Image {
                    uri: uri.to_string(),
                    title: None,
                    link: None,
                    width: None,
                    height: None,
                    description: None,
                },
                time: None,
            }
        }

        let entry = Entry {
            media: vec![
                MediaObject {
                    thumbnails: vec![thumb("https://cdn.example.com/primary.jpg")],
                    ..Default::default()
                },
                MediaObject::default(),
                MediaObject {
                    thumbnails: vec![thumb(""), thumb("https://cdn.example.com/group.jpg")],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let raw = convert_entry(&entry, true);
        assert_eq!(
            raw.media_thumbnail.as_deref(),
            Some("https://cdn.example.com/primary.jpg")
        );
        assert_eq!(
            raw.alt_media_thumbnail.as_deref(),
            Some("https://cdn.example.com/group.jpg")
        );
        assert_eq!(raw.enclosure_url, None);
        assert_eq!(raw.thumbnail, None);
    }
}
