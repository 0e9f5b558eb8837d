//! Compound selectors.
//!
//! Enough of CSS for event delegation and lookups: `*`, `tag`, `#id`,
//! `.class`, `[attr]` and `[attr=value]`, combined without whitespace.
//! Combinators are rejected.

use std::fmt;
use std::str::FromStr;

use super::node::Node;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: String| Error::Selector {
            selector: source.to_string(),
            reason,
        };

        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(invalid("selector is empty".into()));
        }

        let mut selector = Selector {
            source: trimmed.to_string(),
            tag: None,
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
        };

        let chars: Vec<char> = trimmed.chars().collect();
        let ident = |start: usize| -> (String, usize) {
            let end = chars[start..]
                .iter()
                .position(|c| !is_ident_char(*c))
                .map_or(chars.len(), |offset| start + offset);
            (chars[start..end].iter().collect(), end)
        };

        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                '*' if i == 0 => i += 1,
                '#' | '.' => {
                    let (name, end) = ident(i + 1);
                    if name.is_empty() {
                        return Err(invalid(format!("expected a name after `{}`", chars[i])));
                    }
                    if chars[i] == '#' {
                        selector.id = Some(name);
                    } else {
                        selector.classes.push(name);
                    }
                    i = end;
                }
                '[' => {
                    let close = chars[i..]
                        .iter()
                        .position(|c| *c == ']')
                        .ok_or_else(|| invalid("unclosed `[`".into()))?;
                    let body: String = chars[i + 1..i + close].iter().collect();
                    selector.attributes.push(parse_attribute(&body).map_err(invalid)?);
                    i += close + 1;
                }
                c if i == 0 && is_ident_char(c) => {
                    let (name, end) = ident(0);
                    selector.tag = Some(name.to_ascii_lowercase());
                    i = end;
                }
                c => return Err(invalid(format!("unsupported `{c}` at position {i}"))),
            }
        }

        Ok(selector)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, node: &Node) -> bool {
        if !node.is_element() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !node.has_tag(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if node.attribute("id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class = node.attribute("class").unwrap_or_default();
            let present: Vec<&str> = class.split_whitespace().collect();
            if !self.classes.iter().all(|c| present.contains(&c.as_str())) {
                return false;
            }
        }
        self.attributes.iter().all(|(name, expected)| match expected {
            Some(expected) => node.attribute(name).as_deref() == Some(expected.as_str()),
            None => node.has_attribute(name),
        })
    }

    /// Nearest ancestor-or-self of `start` that matches, not looking above
    /// `boundary` when one is given.
    pub fn closest(&self, start: &Node, boundary: Option<&Node>) -> Option<Node> {
        let mut current = Some(start.clone());
        while let Some(node) = current {
            if self.matches(&node) {
                return Some(node);
            }
            if boundary.is_some_and(|b| b.ptr_eq(&node)) {
                return None;
            }
            current = node.parent();
        }
        None
    }

    /// Matching descendants of `root` in document order.
    pub fn select_all(&self, root: &Node) -> Vec<Node> {
        root.descendants()
            .into_iter()
            .filter(|node| self.matches(node))
            .collect()
    }
}

fn parse_attribute(body: &str) -> std::result::Result<(String, Option<String>), String> {
    let (name, value) = match body.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(unquoted.to_string()))
        }
        None => (body.trim(), None),
    };
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(format!("invalid attribute name `{name}`"));
    }
    Ok((name.to_ascii_lowercase(), value))
}

impl FromStr for Selector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Node {
    /// Nearest ancestor-or-self matching `selector`.
    pub fn closest(&self, selector: &str) -> Result<Option<Node>> {
        Ok(Selector::parse(selector)?.closest(self, None))
    }

    /// Matching descendants in document order.
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<Node>> {
        Ok(Selector::parse(selector)?.select_all(self))
    }

    pub fn query_selector(&self, selector: &str) -> Result<Option<Node>> {
        Ok(self.query_selector_all(selector)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;

    fn form() -> Node {
        parse_element(
            r#"<form id="login"><input name="user" class="field wide"><button class="btn primary" type="submit">Go</button></form>"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_compound_parts() {
        let selector = Selector::parse("button.btn.primary[type=submit]").unwrap();
        assert_eq!(selector.tag.as_deref(), Some("button"));
        assert_eq!(selector.classes, vec!["btn", "primary"]);
        assert_eq!(
            selector.attributes,
            vec![("type".to_string(), Some("submit".to_string()))]
        );
    }

    #[test]
    fn matches_by_each_part() {
        let form = form();
        assert_eq!(form.query_selector_all("*").unwrap().len(), 2);
        assert_eq!(form.query_selector_all(".field").unwrap().len(), 1);
        assert_eq!(form.query_selector_all("[name='user']").unwrap().len(), 1);
        assert_eq!(form.query_selector_all("[name]").unwrap().len(), 1);
        assert!(form.query_selector("button.missing").unwrap().is_none());
    }

    #[test]
    fn closest_walks_up_to_boundary() {
        let form = form();
        let button = form.query_selector("button").unwrap().unwrap();
        let text = button.children()[0].clone();

        assert_eq!(text.closest("button").unwrap(), Some(button.clone()));
        assert_eq!(text.closest("#login").unwrap(), Some(form.clone()));

        let outer = Selector::parse("#login").unwrap();
        assert_eq!(outer.closest(&text, Some(&button)), None);
    }

    #[test]
    fn rejects_combinators() {
        assert!(Selector::parse("form button").is_err());
        assert!(Selector::parse("form > button").is_err());
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("[unterminated").is_err());
        assert!("#".parse::<Selector>().is_err());
    }
}
