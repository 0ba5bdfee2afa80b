//! Minimal XML reader for the analytics feed
//!
//! Builds a small element tree and answers slash-separated path queries
//! (`result/project/name`) relative to an element. Handles attributes,
//! self-closing tags, CDATA, comments, processing instructions and the
//! predefined/numeric entities. No namespaces, no DTDs.

use regex::{Captures, Regex};
use std::sync::OnceLock;

static TOKEN: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();
static ENTITY: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN.get_or_init(|| {
        Regex::new(
            r#"(?s)<!\[CDATA\[(.*?)\]\]>|<!--.*?-->|<\?.*?\?>|<!DOCTYPE[^>]*>|<(/?)([A-Za-z_][\w:.\-]*)((?:\s+[^\s=/>]+\s*=\s*(?:"[^"]*"|'[^']*'))*)\s*(/?)>"#,
        )
        .expect("valid regex")
    })
}

fn attribute_pattern() -> &'static Regex {
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"([^\s=/>]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
    })
}

fn entity_pattern() -> &'static Regex {
    ENTITY.get_or_init(|| {
        Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|amp|quot|apos);").expect("valid regex")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated character data directly inside this element
    pub content: String,
    pub children: Vec<Element>,
}

impl Element {
    fn new(name: &str, raw_attributes: &str) -> Self {
        let attributes = attribute_pattern()
            .captures_iter(raw_attributes)
            .map(|c| {
                let value = c.get(2).or_else(|| c.get(3)).map_or("", |m| m.as_str());
                (c[1].to_string(), unescape(value))
            })
            .collect();
        Self {
            name: name.to_string(),
            attributes,
            ..Default::default()
        }
    }

    /// Trimmed character data.
    pub fn text(&self) -> &str {
        self.content.trim()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// First descendant matching the path.
    pub fn find(&self, path: &str) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// All descendants matching the path, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&Element> {
        let mut current: Vec<&Element> = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|e| e.children.iter().filter(|c| c.name == segment))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }
}

/// Parse a document and return its root element.
pub fn parse(document: &str) -> Result<Element, String> {
    let mut stack: Vec<Element> = vec![Element::default()];
    let mut last_end = 0;

    for caps in token_pattern().captures_iter(document) {
        let whole = caps.get(0).expect("group 0 always present");
        push_text(&mut stack, &document[last_end..whole.start()]);
        last_end = whole.end();

        if let Some(cdata) = caps.get(1) {
            if let Some(top) = stack.last_mut() {
                top.content.push_str(cdata.as_str());
            }
            continue;
        }
        let Some(name) = caps.get(3) else {
            // comment, processing instruction or doctype
            continue;
        };

        if is_closing(&caps) {
            let element = stack
                .pop()
                .filter(|e| e.name == name.as_str())
                .ok_or_else(|| format!("unexpected closing tag </{}>", name.as_str()))?;
            attach(&mut stack, element)?;
        } else {
            let element = Element::new(name.as_str(), caps.get(4).map_or("", |m| m.as_str()));
            if caps.get(5).is_some_and(|m| m.as_str() == "/") {
                attach(&mut stack, element)?;
            } else {
                stack.push(element);
            }
        }
    }
    push_text(&mut stack, &document[last_end..]);

    if stack.len() != 1 {
        let open = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(format!("unclosed element <{}>", open));
    }
    let mut document_node = stack.pop().unwrap_or_default();
    match document_node.children.len() {
        1 => Ok(document_node.children.remove(0)),
        0 => Err("no root element".to_string()),
        n => Err(format!("{} root elements", n)),
    }
}

fn is_closing(caps: &Captures<'_>) -> bool {
    caps.get(2).is_some_and(|m| m.as_str() == "/")
}

fn push_text(stack: &mut [Element], raw: &str) {
    if raw.is_empty() {
        return;
    }
    if let Some(top) = stack.last_mut() {
        top.content.push_str(&unescape(raw));
    }
}

fn attach(stack: &mut [Element], element: Element) -> Result<(), String> {
    // The document node sits at the bottom and is never popped here
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None => Err(format!("stray element <{}>", element.name)),
    }
}

/// Resolve predefined and numeric character references.
pub fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    entity_pattern()
        .replace_all(raw, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let resolved = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => {
                    let code = if let Some(hex) = entity.strip_prefix("#x") {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        entity[1..].parse::<u32>().ok()
                    };
                    code.and_then(char::from_u32)
                }
            };
            resolved.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}
