//! Lightweight HTML scanning for listing pages.
//!
//! There is no DOM. An element runs from its opening tag to the first
//! matching closing tag, which is enough for the flat markup of programme
//! pages. Tag and attribute names match ASCII case-insensitively.

use quick_xml::escape::{resolve_predefined_entity, unescape_with};
use regex::Regex;
use std::sync::LazyLock;

static OPEN_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").expect("valid open tag regex")
});

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("valid attribute regex")
});

const VOID_TAGS: [&str; 8] = ["area", "br", "hr", "img", "input", "link", "meta", "source"];

/// One element found by [`elements`]
#[derive(Debug, Clone)]
pub struct Element<'a> {
    /// Lowercased tag name
    pub name: String,
    /// Byte offset of the opening tag in the scanned text
    pub start: usize,
    attrs: &'a str,
    inner: &'a str,
}

impl<'a> Element<'a> {
    /// Entity-decoded value of attribute `name`
    pub fn attr(&self, name: &str) -> Option<String> {
        ATTR_RE.captures_iter(self.attrs).find_map(|caps| {
            if !caps[1].eq_ignore_ascii_case(name) {
                return None;
            }
            let raw = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            Some(decode_entities(raw))
        })
    }

    /// Whether the class attribute contains `fragment` anywhere
    pub fn class_contains(&self, fragment: &str) -> bool {
        self.attr("class").is_some_and(|class| class.contains(fragment))
    }

    /// Markup between the opening and closing tag
    pub fn inner_html(&self) -> &'a str {
        self.inner
    }

    /// Text content with tags removed, entities decoded and whitespace
    /// (non-breaking spaces included) collapsed
    pub fn text(&self) -> String {
        normalize_ws(&decode_entities(&strip_tags(self.inner)))
    }
}

/// Elements named in `tags`, in document order, starting at byte `from`
pub fn elements<'a>(html: &'a str, tags: &[&str], from: usize) -> Vec<Element<'a>> {
    let Some(haystack) = html.get(from..) else {
        return Vec::new();
    };
    let lower = to_lowercase_fast(html);

    OPEN_TAG_RE
        .captures_iter(haystack)
        .filter_map(|caps| {
            let name = caps[1].to_ascii_lowercase();
            if !tags.contains(&name.as_str()) {
                return None;
            }
            let whole = caps.get(0)?;
            let start = from + whole.start();
            let open_end = from + whole.end();
            let attrs = caps.get(2).map_or("", |m| m.as_str());

            let inner = if VOID_TAGS.contains(&name.as_str()) || attrs.trim_end().ends_with('/') {
                ""
            } else {
                let close = format!("</{name}");
                match lower[open_end..].find(&close) {
                    Some(offset) => &html[open_end..open_end + offset],
                    None => &html[open_end..],
                }
            };

            Some(Element {
                name,
                start,
                attrs,
                inner,
            })
        })
        .collect()
}

/// Remove all `<...>` tags, keeping a space where each tag was
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode character references and the XML entities plus `&nbsp;`.
///
/// Text with a bare `&` or an unknown entity only gets `&nbsp;` and `&amp;`
/// replaced.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    unescape_with(s, |entity| match entity {
        "nbsp" => Some("\u{a0}"),
        other => resolve_predefined_entity(other),
    })
    .map(|decoded| decoded.into_owned())
    .unwrap_or_else(|_| s.replace("&nbsp;", "\u{a0}").replace("&amp;", "&"))
}

/// Collapse runs of whitespace into a single space and trim
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ASCII-only lowercasing; byte offsets stay valid against the original
fn to_lowercase_fast(s: &str) -> String {
    s.chars().map(|c| c.to_ascii_lowercase()).collect()
}
