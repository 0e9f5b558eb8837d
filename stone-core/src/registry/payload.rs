//! Handoff payload.
//!
//! The server embeds the list of rendered components in the page as
//!
//! ```html
//! <script type="module">window.__STONE__ = {"componentsToRegister":["s-counter"]};</script>
//! ```
//!
//! and the client reads it back from the same global once at startup. A bare
//! JSON array of names is accepted as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dom::Document;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffPayload {
    #[serde(default)]
    pub components_to_register: Vec<String>,
}

impl HandoffPayload {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            components_to_register: names,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.components_to_register
    }

    pub fn is_empty(&self) -> bool {
        self.components_to_register.is_empty()
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "componentsToRegister": self.components_to_register })
    }

    /// Read a payload from either accepted JSON form.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(_) => serde_json::from_value(value).ok().map(Self::new),
            Value::Object(_) => serde_json::from_value(value).ok(),
            _ => None,
        }
    }

    /// Inline script assigning the payload to `window.<global>`.
    ///
    /// The object form `{"componentsToRegister": [...]}` is always written.
    /// On read, [`extract`](Self::extract) and [`take`](Self::take) also
    /// accept a bare JSON array of names.
    pub fn to_script(&self, global: &str) -> String {
        // `</` inside the JSON would end the script element early.
        let json = self.to_value().to_string().replace("</", "<\\/");
        format!(r#"<script type="module">window.{global} = {json};</script>"#)
    }

    /// Find the assignment to `window.<global>` in page markup and parse it.
    pub fn extract(markup: &str, global: &str) -> Option<Self> {
        let needle = format!("window.{global}");
        let start = markup.find(&needle)? + needle.len();
        let rest = markup[start..].trim_start().strip_prefix('=')?;

        let value = serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()?
            .ok()?;
        Self::from_value(value)
    }

    /// Store the payload in the document's global bag.
    pub fn install(&self, document: &Document, global: &str) {
        document.set_global(global, self.to_value());
    }

    /// Remove the payload from the document's global bag. It can be taken
    /// once; later calls return `None`.
    pub fn take(document: &Document, global: &str) -> Option<Self> {
        let value = document.take_global(global)?;
        let payload = Self::from_value(value);
        if payload.is_none() {
            debug!(global, "global does not hold a registration payload");
        }
        payload
    }
}
