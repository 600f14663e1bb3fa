//! Structured view of an implementor description.
//!
//! Descriptions are HTML lines such as
//!
//! ```text
//! <a class='stability Unstable' title='Unstable: module was recently redesigned'></a>
//! impl&lt;S&gt; <a class='trait' href='...' title='core::hash::Hash'>Hash</a>
//! for <a class='struct' href='...' title='unicase::UniCase'>UniCase</a>&lt;S&gt;
//! ```
//!
//! The registry never looks inside them; this module is used only when
//! presenting or searching implementors.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<a\s+([^>]*)>(.*?)</a>"#).expect("valid anchor regex")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([a-zA-Z-]+)\s*=\s*(?:'([^']*)'|"([^"]*)")"#).expect("valid attribute regex")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex")
});

/// Kinds of linked item that can stand in the `Self` position of an impl.
const SELF_KINDS: &[&str] = &["struct", "enum", "union", "type", "primitive"];

/// Stability marker attached to a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stability {
    /// Level as written in the class list, e.g. `Unstable`.
    pub level: String,
    /// Explanation from the marker's title, if any.
    pub note: Option<String>,
}

/// A linked item mentioned in a description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    /// First class of the anchor (`trait`, `struct`, ...), if present.
    pub kind: Option<String>,
    pub text: String,
    pub href: Option<String>,
    /// Fully qualified path taken from the anchor's title.
    pub path: Option<String>,
}

/// Parsed form of one implementor description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Implementor {
    /// Plain-text signature with markup removed and entities decoded.
    pub signature: String,
    pub stability: Option<Stability>,
    /// Path of the implementing type, when it is linked.
    pub self_type: Option<String>,
    pub links: Vec<Link>,
}

impl Implementor {
    /// Parse a description. Unknown markup is ignored, so this never fails.
    pub fn parse(description: &str) -> Self {
        let mut stability = None;
        let mut links = Vec::new();
        let mut self_candidate = None;
        let for_offset = description.rfind(" for ");

        for anchor in ANCHOR.captures_iter(description) {
            let (Some(whole), Some(attrs), Some(body)) = (anchor.get(0), anchor.get(1), anchor.get(2))
            else {
                continue;
            };
            let attrs = attributes(attrs.as_str());
            let class = attrs.class.as_deref().unwrap_or_default();

            if let Some(level) = class.strip_prefix("stability") {
                let level = level.trim();
                if !level.is_empty() && stability.is_none() {
                    stability = Some(Stability {
                        level: level.to_string(),
                        note: attrs.title.map(|t| decode_entities(&t)),
                    });
                }
                continue;
            }

            let kind = class.split_whitespace().next().map(str::to_string);
            let link = Link {
                text: plain_text(body.as_str()),
                path: attrs.title.map(|t| decode_entities(&t)),
                href: attrs.href,
                kind,
            };

            let after_for = for_offset.is_some_and(|offset| whole.start() > offset);
            if after_for && link.kind.as_deref().is_some_and(|k| SELF_KINDS.contains(&k)) {
                self_candidate = Some(link.path.clone().unwrap_or_else(|| link.text.clone()));
            }
            links.push(link);
        }

        Self {
            signature: plain_text(description),
            stability,
            self_type: self_candidate,
            links,
        }
    }

    /// Last segment of the implementing type, e.g. `UniCase`.
    pub fn self_type_name(&self) -> Option<&str> {
        self.self_type
            .as_deref()
            .map(|path| path.rsplit("::").next().unwrap_or(path))
    }
}

#[derive(Default)]
struct Attributes {
    class: Option<String>,
    href: Option<String>,
    title: Option<String>,
}

fn attributes(raw: &str) -> Attributes {
    let mut attrs = Attributes::default();
    for capture in ATTRIBUTE.captures_iter(raw) {
        let value = capture
            .get(2)
            .or_else(|| capture.get(3))
            .map(|m| m.as_str().to_string());
        match capture.get(1).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("class") => attrs.class = value,
            Some("href") => attrs.href = value,
            Some("title") => attrs.title = value,
            _ => {}
        }
    }
    attrs
}

/// Strip tags, decode entities and collapse whitespace.
pub fn plain_text(html: &str) -> String {
    let stripped = TAG.replace_all(html, "");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode the named and numeric entities rustdoc emits.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => entity.strip_prefix('#').and_then(|num| {
                    let code = match num.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => num.parse().ok()?,
                    };
                    char::from_u32(code)
                }),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}
