//! Tag names.
//!
//! Custom element names must contain a `-` and start with a letter. Names
//! that don't are corrected rather than rejected, and the correction is a
//! pure function of the input:
//!
//! | input          | name            |
//! |----------------|-----------------|
//! | `card`         | `s-card`        |
//! | `MiniCounter`  | `mini-counter`  |
//! | `todo-list`    | `todo-list`     |
//! | `2-up`         | `s-2-up`        |
//! | ``             | `s-component`   |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix added to names that need correcting.
const PREFIX: &str = "s-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagName(String);

impl TagName {
    /// Derive a valid custom element name from `input`.
    pub fn normalize(input: &str) -> Self {
        let mut name = String::with_capacity(input.len() + PREFIX.len());
        let mut previous: Option<char> = None;
        for c in input.trim().chars() {
            if c.is_ascii_uppercase() {
                if previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                    name.push('-');
                }
                name.push(c.to_ascii_lowercase());
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                name.push(c);
            } else if !name.ends_with('-') {
                // Whitespace and punctuation become a single separator.
                name.push('-');
            }
            previous = Some(c);
        }

        let mut name = name.trim_end_matches('-').to_string();
        if name.is_empty() {
            name.push_str("component");
        }
        if !name.contains('-') {
            name.insert_str(0, PREFIX);
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            name.insert_str(0, PREFIX);
        }
        Self(name)
    }

    /// Whether `name` is already a valid name, i.e. normalizing it is a no-op.
    pub fn is_valid(name: &str) -> bool {
        Self::normalize(name).0 == name
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `markup` already opens with this tag.
    pub fn opens(&self, markup: &str) -> bool {
        let Some(rest) = markup.trim_start().strip_prefix('<') else {
            return false;
        };
        let Some(rest) = rest
            .get(..self.0.len())
            .filter(|head| head.eq_ignore_ascii_case(&self.0))
            .map(|_| &rest[self.0.len()..])
        else {
            return false;
        };
        rest.starts_with(|c: char| c.is_whitespace() || c == '>' || c == '/')
    }

    /// Wrap `markup` in this tag unless it already opens with it.
    pub fn wrap(&self, markup: &str) -> String {
        let markup = markup.trim();
        if self.opens(markup) {
            markup.to_string()
        } else {
            format!("<{0}>{1}</{0}>", self.0, markup)
        }
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TagName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TagName {
    fn from(input: &str) -> Self {
        Self::normalize(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_names_without_separator() {
        assert_eq!(TagName::normalize("card").as_str(), "s-card");
        assert_eq!(TagName::normalize("card"), TagName::normalize("card"));
    }

    #[test]
    fn kebab_cases_camel_case() {
        assert_eq!(TagName::normalize("MiniCounter").as_str(), "mini-counter");
        assert_eq!(TagName::normalize("Counter").as_str(), "s-counter");
        assert_eq!(TagName::normalize("todoList2Item").as_str(), "todo-list2-item");
    }

    #[test]
    fn keeps_valid_names() {
        assert_eq!(TagName::normalize("todo-list").as_str(), "todo-list");
        assert!(TagName::is_valid("todo-list"));
        assert!(!TagName::is_valid("card"));
    }

    #[test]
    fn fixes_leading_digits_and_junk() {
        assert_eq!(TagName::normalize("2-up").as_str(), "s-2-up");
        assert_eq!(TagName::normalize("  my card! ").as_str(), "my-card");
        assert_eq!(TagName::normalize("").as_str(), "s-component");
        assert_eq!(TagName::normalize("-x").as_str(), "s--x");
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        for input in ["card", "MiniCounter", "2-up", "", "a b c"] {
            let once = TagName::normalize(input);
            assert_eq!(TagName::normalize(once.as_str()), once);
        }
    }

    #[test]
    fn wraps_unless_already_wrapped() {
        let name = TagName::normalize("s-card");
        assert_eq!(name.wrap("<p>hi</p>"), "<s-card><p>hi</p></s-card>");
        assert_eq!(
            name.wrap(r#"  <s-card class="x"><p>hi</p></s-card>"#),
            r#"<s-card class="x"><p>hi</p></s-card>"#
        );
        // A longer tag that merely starts with the name still gets wrapped.
        assert_eq!(
            name.wrap("<s-cards></s-cards>"),
            "<s-card><s-cards></s-cards></s-card>"
        );
        assert_eq!(name.wrap(""), "<s-card></s-card>");
    }
}
