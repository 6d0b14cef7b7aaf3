//! HTML fragment for the blog section.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::model::NormalizedPost;

use super::SectionState;

const MAX_CARD_TAGS: usize = 3;

pub fn render_section(state: &SectionState, handle: &str, feed_host: &str) -> String {
    let mut buf = String::new();

    buf.push_str("<section id=\"blog\" class=\"blog\">\n");
    buf.push_str("<header>\n<h2>Insights &amp; Articles</h2>\n");
    buf.push_str(
        "<p>Sharing knowledge and experiences from the intersection of design, development, and quality assurance</p>\n",
    );
    buf.push_str("</header>\n");

    match state {
        SectionState::Loading => {
            buf.push_str("<div class=\"blog-loading\" aria-busy=\"true\">\n");
            buf.push_str("<p>Loading latest articles...</p>\n");
            buf.push_str("</div>\n");
        }
        SectionState::Ready(posts) => {
            buf.push_str(&format!(
                "<div class=\"blog-grid\" data-count=\"{}\">\n",
                posts.len()
            ));
            for post in posts {
                buf.push_str(&render_card(post));
            }
            buf.push_str("</div>\n");
        }
        SectionState::Empty => {
            buf.push_str("<div class=\"blog-empty\">\n");
            buf.push_str("<h3>No Posts Yet</h3>\n");
            buf.push_str("<p>Articles will appear here once they&#39;re published.</p>\n");
            buf.push_str("</div>\n");
        }
    }

    buf.push_str(&format!(
        "<a class=\"blog-all\" href=\"https://{}/@{}\" target=\"_blank\" rel=\"noopener noreferrer\">View all articles</a>\n",
        attr(feed_host),
        attr(handle)
    ));
    buf.push_str("</section>\n");

    buf
}

fn render_card(post: &NormalizedPost) -> String {
    let mut buf = String::new();
    buf.push_str("<article class=\"blog-card\">\n");

    // Missing images get a placeholder box, never an empty src.
    match &post.image {
        Some(image) => buf.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\">\n",
            attr(image),
            attr(&post.title)
        )),
        None => buf.push_str("<div class=\"blog-card-image-placeholder\">IMG</div>\n"),
    }

    buf.push_str(&format!(
        "<span class=\"blog-card-category\">{}</span>\n",
        text(&post.category)
    ));
    buf.push_str(&format!("<h3>{}</h3>\n", text(&post.title)));
    buf.push_str(&format!("<p>{}</p>\n", text(&post.excerpt)));
    buf.push_str(&format!(
        "<div class=\"blog-card-meta\"><span>{}</span> &bull; <span>{}</span></div>\n",
        text(&post.date),
        text(&post.read_time)
    ));

    buf.push_str("<ul class=\"blog-card-tags\">");
    for tag in post.tags.iter().take(MAX_CARD_TAGS) {
        buf.push_str(&format!("<li>{}</li>", text(tag)));
    }
    buf.push_str("</ul>\n");

    buf.push_str(&format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Read article</a>\n",
        attr(&post.url)
    ));
    buf.push_str("</article>\n");
    buf
}
