//! Markup parsing and serialization.
//!
//! Parsing goes through `tl` and converts its arena into detached [`Node`]s.
//! The whole input is parsed before anything is returned, so a failure never
//! leaves a partial tree behind.

use thiserror::Error;

use super::node::Node;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("markup is empty")]
    Empty,

    #[error("markup contains no element")]
    NoRootElement,

    #[error("malformed markup: {0}")]
    Malformed(String),
}

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose whitespace is content.
const PREFORMATTED: &[&str] = &["pre", "textarea"];

/// Phrasing elements. Whitespace between two of these is visible.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i",
    "img", "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong",
    "sub", "sup", "textarea", "time", "u", "var",
];

/// Parse markup into detached top-level nodes.
///
/// Comments are dropped. Whitespace-only text is kept inside `pre` and
/// `textarea` and between inline siblings, and dropped elsewhere. Tag and
/// attribute names are lowercased and the basic entities are decoded.
pub fn parse_fragment(markup: &str) -> Result<Vec<Node>, ParseError> {
    let source = markup.trim();
    if source.is_empty() {
        return Err(ParseError::Empty);
    }
    if let Some(open) = source.rfind('<') {
        if !source[open..].contains('>') {
            return Err(ParseError::Malformed(format!(
                "unterminated tag at byte {open}"
            )));
        }
    }

    let dom = tl::parse(source, tl::ParserOptions::default())
        .map_err(|err| ParseError::Malformed(format!("{err:?}")))?;
    Ok(convert_all(dom.children(), dom.parser(), false))
}

/// Parse markup and return its first top-level element.
pub fn parse_element(markup: &str) -> Result<Node, ParseError> {
    parse_fragment(markup)?
        .into_iter()
        .find(Node::is_element)
        .ok_or(ParseError::NoRootElement)
}

enum Parsed {
    Node(Node),
    Space(String),
}

fn convert_all(handles: &[tl::NodeHandle], parser: &tl::Parser<'_>, preformatted: bool) -> Vec<Node> {
    let parsed: Vec<Parsed> = handles
        .iter()
        .filter_map(|handle| convert(*handle, parser, preformatted))
        .collect();

    let mut nodes = Vec::with_capacity(parsed.len());
    for (index, item) in parsed.iter().enumerate() {
        match item {
            Parsed::Node(node) => nodes.push(node.clone()),
            Parsed::Space(text) => {
                let between_inline = index > 0
                    && is_inline(parsed.get(index - 1))
                    && is_inline(parsed.get(index + 1));
                if preformatted || between_inline {
                    nodes.push(Node::text(text.as_str()));
                }
            }
        }
    }
    nodes
}

fn is_inline(item: Option<&Parsed>) -> bool {
    match item {
        Some(Parsed::Node(node)) => match node.tag_name() {
            // Custom elements render inline unless styled otherwise.
            Some(tag) => INLINE_ELEMENTS.contains(&tag) || tag.contains('-'),
            None => true,
        },
        _ => false,
    }
}

fn convert(handle: tl::NodeHandle, parser: &tl::Parser<'_>, preformatted: bool) -> Option<Parsed> {
    match handle.get(parser)? {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str();
            // Doctype and processing instructions.
            if name.starts_with('!') || name.starts_with('?') {
                return None;
            }
            let element = Node::element(&name);
            for (key, value) in start_tag_attributes(&tag.raw().as_utf8_str()) {
                element.set_attribute(&key, &value);
            }

            let preformatted = preformatted || element.tag_name().is_some_and(|t| PREFORMATTED.contains(&t));
            for child in convert_all(tag.children().top().as_slice(), parser, preformatted) {
                element.append_child(&child);
            }
            Some(Parsed::Node(element))
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            if text.trim().is_empty() {
                Some(Parsed::Space(text.into_owned()))
            } else {
                Some(Parsed::Node(Node::text(decode_entities(&text))))
            }
        }
        tl::Node::Comment(_) => None,
    }
}

/// Attributes of the start tag that opens `raw`, in source order.
///
/// `tl` loses the first character of an attribute name that follows a
/// valueless attribute (`<span data-watch class="a">` yields `lass`), and
/// the marker attribute is always valueless, so the start tag is tokenized
/// here instead. The first occurrence of a repeated name wins.
fn start_tag_attributes(raw: &str) -> Vec<(String, String)> {
    let bytes = raw.as_bytes();
    let is_space = |b: u8| b.is_ascii_whitespace();

    // Skip `<` and the tag name.
    let mut pos = 1;
    while pos < bytes.len() && !is_space(bytes[pos]) && !matches!(bytes[pos], b'>' | b'/') {
        pos += 1;
    }

    let mut attributes: Vec<(String, String)> = Vec::new();
    loop {
        while pos < bytes.len() && (is_space(bytes[pos]) || bytes[pos] == b'/') {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] == b'>' {
            break;
        }

        let start = pos;
        while pos < bytes.len() && !is_space(bytes[pos]) && !matches!(bytes[pos], b'=' | b'>' | b'/') {
            pos += 1;
        }
        let name = raw[start..pos].to_ascii_lowercase();
        while pos < bytes.len() && is_space(bytes[pos]) {
            pos += 1;
        }

        let mut value = String::new();
        if pos < bytes.len() && bytes[pos] == b'=' {
            pos += 1;
            while pos < bytes.len() && is_space(bytes[pos]) {
                pos += 1;
            }
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let begin = pos + 1;
                    let end = raw[begin..]
                        .find(quote as char)
                        .map_or(raw.len(), |offset| begin + offset);
                    value = decode_entities(&raw[begin..end]);
                    pos = (end + 1).min(bytes.len());
                }
                _ => {
                    let begin = pos;
                    while pos < bytes.len() && !is_space(bytes[pos]) && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    value = decode_entities(&raw[begin..pos]);
                }
            }
        }

        if !name.is_empty() && !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }
    attributes
}

pub(crate) fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            _ => out.push(c),
        }
    }
}

pub(crate) fn write_node(node: &Node, out: &mut String) {
    let Some(tag) = node.tag_name() else {
        escape_text(&node.text_content(), out);
        return;
    };

    out.push('<');
    out.push_str(tag);
    for (name, value) in node.attributes() {
        out.push(' ');
        out.push_str(&name);
        if !value.is_empty() {
            out.push_str("=\"");
            escape_attribute(&value, out);
            out.push('"');
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&tag) {
        return;
    }
    for child in node.children() {
        write_node(&child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
