//! Diff/Patch Engine
//!
//! Brings a live subtree in line with freshly rendered markup using the
//! cheapest strategy that is sufficient.
//!
//! # Tiers
//!
//! | Tier            | Applies when                           | Mutates                     |
//! |-----------------|----------------------------------------|-----------------------------|
//! | `TemplateAware` | marked nodes account for every change  | text/attributes of marked nodes |
//! | `Text`          | same shape, only text differs          | leaf text                   |
//! | `Attributes`    | same shape, attributes differ          | attributes and leaf text    |
//! | `Structure`     | child count or tag differs anywhere    | inserts, removes, replaces  |
//!
//! # Pass order
//!
//! 1. Parse the candidate completely. A parse error returns before any
//!    mutation.
//! 2. Equal trees: report `None`.
//! 3. Shapes differ: structural reconciliation, with focus recorded before
//!    and restored after.
//! 4. Otherwise run the marked tier. If that made the trees equal the pass
//!    is `TemplateAware`; else the rest is applied in place and the pass is
//!    `Attributes` or `Text`.
//!
//! The candidate's first top-level element stands for the live root. Its
//! tag is never replaced.

mod attributes;
mod compare;
mod focus;
mod marked;
mod structural;

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::dom::{parse_element, Document, Node, WeakDocument};
use crate::error::Result;

pub use compare::{same_shape, trees_equal};
pub use focus::FocusPath;

/// Tier that a patch pass ended up using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatchKind {
    TemplateAware,
    Text,
    Attributes,
    Structure,
    None,
}

impl PatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatchKind::TemplateAware => "template-aware",
            PatchKind::Text => "text",
            PatchKind::Attributes => "attributes",
            PatchKind::Structure => "structure",
            PatchKind::None => "none",
        }
    }
}

impl fmt::Display for PatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one patch pass.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchResult {
    #[serde(rename = "type")]
    pub kind: PatchKind,
    #[serde(rename = "changesCount")]
    pub changes: usize,
    #[serde(skip)]
    pub started: Instant,
    pub duration: Duration,
}

impl PatchResult {
    fn finish(kind: PatchKind, changes: usize, started: Instant) -> Self {
        Self {
            kind,
            changes,
            started,
            duration: started.elapsed(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.kind == PatchKind::None
    }
}

/// Knobs of a patch pass.
#[derive(Debug, Clone)]
pub struct PatchOptions {
    pub marker_attribute: String,
    pub preserve_focus: bool,
    /// Document that owns the root. Needed for focus and for the lifecycle
    /// of components inserted or removed by a structural pass.
    pub document: Option<WeakDocument>,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self::from_config(&RuntimeConfig::default())
    }
}

impl PatchOptions {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            marker_attribute: config.marker_attribute.clone(),
            preserve_focus: config.preserve_focus,
            document: None,
        }
    }

    pub fn from_document(document: &Document) -> Self {
        Self {
            document: Some(document.downgrade()),
            ..Self::from_config(document.config())
        }
    }

    fn document(&self) -> Option<Document> {
        self.document.as_ref().and_then(WeakDocument::upgrade)
    }
}

/// Patch `root` to match `markup`.
pub fn patch(root: &Node, markup: &str, options: &PatchOptions) -> Result<PatchResult> {
    let started = Instant::now();
    let candidate = parse_element(markup)?;
    Ok(run(root, &candidate, options, started))
}

/// Patch `root` to match an already parsed candidate. Nodes may be moved out
/// of `candidate`.
pub fn patch_tree(root: &Node, candidate: &Node, options: &PatchOptions) -> PatchResult {
    run(root, candidate, options, Instant::now())
}

fn run(root: &Node, candidate: &Node, options: &PatchOptions, started: Instant) -> PatchResult {
    let result = if trees_equal(root, candidate) {
        PatchResult::finish(PatchKind::None, 0, started)
    } else if !same_shape(root, candidate) {
        let changes = structural_pass(root, candidate, options);
        PatchResult::finish(PatchKind::Structure, changes, started)
    } else {
        let marker = options.marker_attribute.as_str();
        let marked = marked::apply_marked(root, candidate, marker);
        if marked > 0 && trees_equal(root, candidate) {
            PatchResult::finish(PatchKind::TemplateAware, marked, started)
        } else {
            let kind = if compare::attributes_differ(root, candidate) {
                PatchKind::Attributes
            } else {
                PatchKind::Text
            };
            let changes = marked + attributes::apply_in_place(root, candidate);
            PatchResult::finish(kind, changes, started)
        }
    };

    debug!(
        root = %root.id(),
        kind = %result.kind,
        changes = result.changes,
        elapsed_us = result.duration.as_micros() as u64,
        "patched"
    );
    result
}

fn structural_pass(root: &Node, candidate: &Node, options: &PatchOptions) -> usize {
    let document = options.document();

    let focus = match (&document, options.preserve_focus) {
        (Some(document), true) => document
            .active_element()
            .and_then(|focused| FocusPath::record(root, &focused)),
        _ => None,
    };

    let changes = structural::reconcile(root, candidate, document.as_ref());

    if let (Some(path), Some(document)) = (focus, &document) {
        // Only a focused element that left the tree is moved.
        if document.active_element().is_none() {
            match path.resolve(root) {
                Some(target) => {
                    document.focus(&target);
                    debug!(path = %path, "restored focus");
                }
                None => debug!(path = %path, "focus path no longer exists"),
            }
        }
    }
    changes
}
