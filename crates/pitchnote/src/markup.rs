//! Typed markup tree for the HTML subset found in pitch accent fields.
//!
//! Fields arrive as raw HTML text, for example:
//!
//! ```text
//! シ<span class="pitchoverline">ン<span class="nopron">シ</span>ュツキボツ</span>
//! ```
//!
//! This module parses such text into a tree of typed nodes which the
//! resolver and span builder walk, replacing the live-DOM traversal of the
//! original card template. Parsing is lenient the way a browser is: an
//! unmatched close tag is ignored, an unclosed element closes at end of
//! input, and a stray `<` is plain text. Parsing never fails.
//!
//! Text is kept literal; no entity decoding is performed. The only entity
//! this pipeline ever sees is the downstep glyph reference, which
//! [`crate::ajt::normalize`] removes before parsing.

use std::fmt;

/// Single node of a parsed markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Run of plain text.
    Text(String),
    /// Tagged element, possibly with children.
    Element(Element),
}

/// Tagged element of a parsed markup tree.
///
/// Only the attributes this pipeline reads are retained: `class` and the
/// `data-details` dictionary name of position groups. All others are
/// dropped at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name, lowercased.
    pub name: String,
    /// Raw `class` attribute value, if present.
    pub class: Option<String>,
    /// Raw `data-details` attribute value, if present.
    pub data_details: Option<String>,
    /// Child nodes in source order.
    pub children: Vec<Node>,
}

/// Tags which never have content or a closing tag.
const VOID_TAGS: &[&str] = &["br", "hr", "img", "wbr"];

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Checks whether this element's `class` attribute contains the given
    /// class name.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class
            .as_deref()
            .is_some_and(|value| value.split_whitespace().any(|part| part == class))
    }

    /// Iterates over the direct element children, skipping text nodes - the
    /// analogue of a DOM `children` collection.
    pub fn element_children(&self) -> impl Iterator<Item = &Element> {
        element_children(&self.children)
    }

    /// Checks whether any descendant element has the given tag name.
    #[must_use]
    pub fn has_descendant_named(&self, name: &str) -> bool {
        self.element_children()
            .any(|child| child.name == name || child.has_descendant_named(name))
    }
}

/// Iterates over the elements among `nodes`, skipping text nodes.
pub fn element_children(nodes: &[Node]) -> impl Iterator<Item = &Element> {
    nodes.iter().filter_map(|node| match node {
        Node::Element(element) => Some(element),
        Node::Text(_) => None,
    })
}

/// Concatenates all text runs under `nodes` - the analogue of a DOM
/// `innerText`.
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    fn collect(nodes: &[Node], out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => collect(&element.children, out),
            }
        }
    }

    let mut out = String::new();
    collect(nodes, &mut out);
    out
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Element(element) => write!(f, "{element}"),
        }
    }
}

impl fmt::Display for Element {
    /// Writes the element back out as markup - the analogue of a DOM
    /// `outerHTML`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        if let Some(class) = &self.class {
            write!(f, r#" class="{class}""#)?;
        }
        if let Some(details) = &self.data_details {
            write!(f, r#" data-details="{details}""#)?;
        }
        write!(f, ">")?;
        if VOID_TAGS.contains(&self.name.as_str()) {
            return Ok(());
        }

        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.name)
    }
}

/// Parses markup text into a tree of [`Node`]s.
#[must_use]
pub fn parse(input: &str) -> Vec<Node> {
    // stack[0] is a synthetic root; open elements are pushed above it
    let mut stack = vec![Element::default()];

    let push_text = |stack: &mut Vec<Element>, text: &str| {
        let parent = &mut stack
            .last_mut()
            .expect("stack always contains the root")
            .children;
        if let Some(Node::Text(last)) = parent.last_mut() {
            last.push_str(text);
        } else {
            parent.push(Node::Text(text.to_owned()));
        }
    };

    let mut rest = input;
    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push_text(&mut stack, rest);
            break;
        };
        if lt > 0 {
            push_text(&mut stack, &rest[..lt]);
            rest = &rest[lt..];
        }

        match read_tag(rest) {
            Some((Tag::Open { element, childless }, consumed)) => {
                rest = &rest[consumed..];
                if childless || VOID_TAGS.contains(&element.name.as_str()) {
                    stack
                        .last_mut()
                        .expect("stack always contains the root")
                        .children
                        .push(Node::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Some((Tag::Close(name), consumed)) => {
                rest = &rest[consumed..];
                // close everything down to the matching open element;
                // an unmatched close tag is ignored
                if let Some(depth) = stack.iter().rposition(|open| open.name == name) {
                    if depth > 0 {
                        while stack.len() > depth {
                            let closed = stack.pop().expect("depth > 0");
                            stack
                                .last_mut()
                                .expect("stack always contains the root")
                                .children
                                .push(Node::Element(closed));
                        }
                    }
                }
            }
            None => {
                // stray `<` with no well-formed tag after it
                push_text(&mut stack, "<");
                rest = &rest[1..];
            }
        }
    }

    // unclosed elements close at end of input
    while stack.len() > 1 {
        let closed = stack.pop().expect("len > 1");
        stack
            .last_mut()
            .expect("stack always contains the root")
            .children
            .push(Node::Element(closed));
    }
    stack
        .pop()
        .expect("stack always contains the root")
        .children
}

enum Tag {
    Open { element: Element, childless: bool },
    Close(String),
}

/// Attempts to read one tag at the start of `input` (which begins with `<`),
/// returning the tag and the number of bytes consumed.
fn read_tag(input: &str) -> Option<(Tag, usize)> {
    let body = input.strip_prefix('<')?;
    let (body, closing) = match body.strip_prefix('/') {
        Some(body) => (body, true),
        None => (body, false),
    };

    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(body.len());
    if name_len == 0 {
        return None;
    }
    let name = body[..name_len].to_ascii_lowercase();
    let mut rest = &body[name_len..];

    let mut element = Element::named(name.clone());
    loop {
        rest = rest.trim_start();
        let self_closed = rest.strip_prefix("/>").map(|after| (after, true));
        let open = rest.strip_prefix('>').map(|after| (after, false));
        if let Some((after, childless)) = self_closed.or(open) {
            let consumed = input.len() - after.len();
            let tag = if closing {
                Tag::Close(name)
            } else {
                Tag::Open { element, childless }
            };
            return Some((tag, consumed));
        }
        if rest.is_empty() || rest.starts_with('<') {
            // never reached a `>`: not a tag
            return None;
        }

        let (attr_name, attr_value, after) = read_attribute(rest)?;
        match attr_name.as_str() {
            "class" => element.class = Some(attr_value),
            "data-details" => element.data_details = Some(attr_value),
            _ => {}
        }
        rest = after;
    }
}

/// Reads one `name` or `name="value"` attribute, returning the lowercased
/// name, the value (empty for bare attributes) and the remaining input.
fn read_attribute(input: &str) -> Option<(String, String, &str)> {
    let name_len = input
        .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
        .unwrap_or(input.len());
    if name_len == 0 {
        return None;
    }
    let name = input[..name_len].to_ascii_lowercase();
    let rest = input[name_len..].trim_start();

    let Some(rest) = rest.strip_prefix('=') else {
        return Some((name, String::new(), rest));
    };
    let rest = rest.trim_start();

    if let Some(quote) = rest.chars().next().filter(|&c| c == '"' || c == '\'') {
        let body = &rest[quote.len_utf8()..];
        let end = body.find(quote)?;
        let value = body[..end].to_owned();
        Some((name, value, &body[end + quote.len_utf8()..]))
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        let value = rest[..end].to_owned();
        Some((name, value, &rest[end..]))
    }
}

#[cfg(test)]
mod tests {
    use super::{Node, element_children, parse, plain_text};

    fn text(s: &str) -> Node {
        Node::Text(s.to_owned())
    }

    #[test]
    fn parses_text_and_spans() {
        let nodes = parse(r#"シ<span class="pitchoverline">ンシュツ</span>キ"#);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], text("シ"));
        let Node::Element(span) = &nodes[1] else {
            panic!("expected element");
        };
        assert_eq!(span.name, "span");
        assert!(span.has_class("pitchoverline"));
        assert_eq!(span.children, vec![text("ンシュツ")]);
        assert_eq!(nodes[2], text("キ"));
    }

    #[test]
    fn parses_nested_elements() {
        let nodes = parse(
            r#"<div class="pa-positions__group" data-details="NHK"><ol><li><b>1</b></li></ol></div>"#,
        );
        let Node::Element(group) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(group.data_details.as_deref(), Some("NHK"));
        let ol = group.element_children().next().expect("has ol");
        let li = ol.element_children().next().expect("has li");
        assert!(li.has_descendant_named("b"));
        assert_eq!(plain_text(&group.children), "1");
    }

    #[test]
    fn lenient_on_malformed_input() {
        // stray `<` is text
        assert_eq!(parse("a < b"), vec![text("a < b")]);
        // unmatched close tag is ignored, surrounding text runs coalesce
        assert_eq!(parse("ab</span>cd"), vec![text("abcd")]);
        // unclosed element closes at end of input
        let nodes = parse(r#"<span class="nasal">°"#);
        let Node::Element(span) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(span.children, vec![text("°")]);
    }

    #[test]
    fn roundtrips_outer_html() {
        let source = r#"ネ<span class="nasal">°</span>コ"#;
        let rendered = parse(source)
            .iter()
            .map(ToString::to_string)
            .collect::<String>();
        assert_eq!(rendered, source);
    }

    #[test]
    fn plain_text_skips_tags() {
        let nodes = parse(
            r#"トマト・ネ<span class="nasal">°</span>コ・<span class="pitchoverline">イヌ</span>"#,
        );
        assert_eq!(plain_text(&nodes), "トマト・ネ°コ・イヌ");
        assert_eq!(element_children(&nodes).count(), 2);
    }

    #[test]
    fn ignores_unknown_attributes() {
        let nodes = parse(r#"<span style="display: inline;">[1]</span>"#);
        let Node::Element(span) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(span.class, None);
        assert_eq!(plain_text(&nodes), "[1]");
    }
}
