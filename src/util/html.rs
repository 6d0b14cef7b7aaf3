/// Entities decoded after tag removal, applied one after another in this order.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#x27;", "'"),
    ("&#39;", "'"),
];

/// Small HTML cleaner turning feed markup into plain excerpt text.
/// - Removes entire <script> and <style> blocks (case-insensitive, across lines)
/// - Strips other tags like <p>, <br>, etc.
/// - Decodes a handful of common entities
/// - Collapses whitespace and trims ends
pub fn strip_html(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let mut buf = input.to_string();
    for tag in ["script", "style"] {
        buf = remove_blocks(&buf, tag);
    }

    let text = strip_tags(&buf);
    let decoded = decode_entities(&text);

    collapse_whitespace(&decoded)
}

pub fn decode_entities(input: &str) -> String {
    ENTITIES
        .iter()
        .fold(input.to_string(), |acc, (entity, replacement)| {
            acc.replace(entity, replacement)
        })
}

// Only complete `<tag ...>...</tag>` blocks go; an unterminated opening tag is
// left for `strip_tags`.
fn remove_blocks(input: &str, tag: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(rel) = lower[cursor..].find(&open) {
        let start = cursor + rel;
        let after_open = start + open.len();

        let at_boundary = lower[after_open..]
            .chars()
            .next()
            .map_or(true, |ch| !(ch.is_ascii_alphanumeric() || ch == '_'));
        if !at_boundary {
            out.push_str(&input[cursor..after_open]);
            cursor = after_open;
            continue;
        }

        match lower[after_open..].find(&close) {
            Some(end_rel) => {
                out.push_str(&input[cursor..start]);
                cursor = after_open + end_rel + close.len();
            }
            None => break,
        }
    }

    out.push_str(&input[cursor..]);
    out
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close_rel) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close_rel + 1..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

fn collapse_whitespace(input: &str) -> String {
    let mut collapsed = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space {
                collapsed.push(' ');
                last_space = true;
            }
        } else {
            collapsed.push(ch);
            last_space = false;
        }
    }

    collapsed.trim().to_string()
}
