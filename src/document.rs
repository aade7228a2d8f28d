//! A parsed HTML document with an edit overlay.
//!
//! The tree produced by `scraper` is never mutated. Removals, attribute
//! rewrites and injected elements are recorded by [`NodeId`] and applied when
//! the document is serialized, so one parse serves every pass.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Selector, node::Element, node::Node};

use crate::serialize::{self, Format};

/// An element created by a pass rather than parsed from the source.
///
/// `text` is written verbatim, so it must only carry raw-text content such as
/// CSS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Injected {
    pub name: String,
    pub text: String,
    pub children: Vec<Injected>,
}

impl Injected {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Injected) -> Self {
        self.children.push(child);
        self
    }
}

/// One HTML file, parsed permissively, plus the pending edits of every pass
/// that has run over it.
pub struct Document {
    html: Html,
    removed: HashSet<NodeId>,
    attrs: HashMap<NodeId, Vec<(String, String)>>,
    injected: HashMap<NodeId, Vec<Injected>>,
}

impl Document {
    /// Parse a complete HTML document. Malformed markup is recovered by the
    /// HTML5 tree builder and never fails.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            removed: HashSet::new(),
            attrs: HashMap::new(),
            injected: HashMap::new(),
        }
    }

    pub(crate) fn root(&self) -> NodeRef<'_, Node> {
        self.html.tree.root()
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id)?.value().as_element()
    }

    /// Returns `true` if the node, or any of its ancestors, has been removed.
    pub fn is_removed(&self, id: NodeId) -> bool {
        let Some(node) = self.node(id) else {
            return true;
        };
        std::iter::once(node)
            .chain(node.ancestors())
            .any(|n| self.removed.contains(&n.id()))
    }

    /// Returns `true` if this exact node was removed.
    pub(crate) fn is_detached(&self, id: NodeId) -> bool {
        self.removed.contains(&id)
    }

    /// Live elements matching `selector`, in document order.
    ///
    /// Matching runs against the parsed attributes, not against overlay edits.
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html
            .select(selector)
            .map(|el| el.id())
            .filter(|id| !self.is_removed(*id))
            .collect()
    }

    /// Every live element, in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.root()
            .descendants()
            .filter(|n| n.value().is_element())
            .map(|n| n.id())
            .filter(|id| !self.is_removed(*id))
            .collect()
    }

    /// Every live comment with its text, in document order.
    pub fn comments(&self) -> Vec<(NodeId, &str)> {
        self.root()
            .descendants()
            .filter_map(|n| match n.value() {
                Node::Comment(comment) => Some((n.id(), &**comment)),
                _ => None,
            })
            .filter(|(id, _)| !self.is_removed(*id))
            .collect()
    }

    /// First live element with the given tag name.
    pub fn first_element(&self, name: &str) -> Option<NodeId> {
        self.root()
            .descendants()
            .filter(|n| n.value().as_element().is_some_and(|el| el.name() == name))
            .map(|n| n.id())
            .find(|id| !self.is_removed(*id))
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name())
    }

    /// Concatenated text of every descendant text node.
    pub fn text(&self, id: NodeId) -> String {
        let Some(node) = self.node(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|n| n.value().as_text().map(|t| &**t))
            .collect()
    }

    /// Drop the node and its whole subtree. Returns `false` if it was already
    /// gone.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if self.is_removed(id) {
            return false;
        }
        self.removed.insert(id)
    }

    /// Current attribute list of an element, overlay edits included.
    ///
    /// Names keep their namespace prefix (`xlink:href`, `xml:lang`).
    pub fn attributes(&self, id: NodeId) -> Vec<(Cow<'_, str>, &str)> {
        if let Some(list) = self.attrs.get(&id) {
            return list
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_str()), v.as_str()))
                .collect();
        }
        self.element(id)
            .map(|el| {
                el.attrs
                    .iter()
                    .map(|(name, value)| {
                        (qualified_name(name.prefix.as_deref(), &name.local), &**value)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value of the attribute `name`, which may carry a prefix.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match self.attrs.get(&id) {
            Some(list) => list
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            None => self
                .element(id)?
                .attrs
                .iter()
                .find(|(qual, _)| qualified_name(qual.prefix.as_deref(), &qual.local) == name)
                .map(|(_, value)| &**value),
        }
    }

    fn attrs_mut(&mut self, id: NodeId) -> Option<&mut Vec<(String, String)>> {
        self.element(id)?;
        if !self.attrs.contains_key(&id) {
            let list = self
                .attributes(id)
                .into_iter()
                .map(|(k, v)| (k.into_owned(), v.to_string()))
                .collect();
            self.attrs.insert(id, list);
        }
        self.attrs.get_mut(&id)
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        let Some(list) = self.attrs_mut(id) else {
            return false;
        };
        let value = value.into();
        match list.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => list.push((name.to_string(), value)),
        }
        true
    }

    /// Remove an attribute. Returns `true` if it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        if self.attr(id, name).is_none() {
            return false;
        }
        let Some(list) = self.attrs_mut(id) else {
            return false;
        };
        let before = list.len();
        list.retain(|(k, _)| k != name);
        list.len() != before
    }

    /// Insert `element` before the existing children of `parent`. Successive
    /// calls keep their call order.
    pub fn prepend(&mut self, parent: NodeId, element: Injected) {
        self.injected.entry(parent).or_default().push(element);
    }

    pub(crate) fn injected(&self, id: NodeId) -> &[Injected] {
        self.injected.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn serialize(&self, format: Format) -> String {
        serialize::to_html(self, format)
    }
}

/// `prefix:local`, or just `local` for attributes outside a namespace.
fn qualified_name<'a>(prefix: Option<&str>, local: &'a str) -> Cow<'a, str> {
    match prefix {
        Some(prefix) => Cow::Owned(format!("{prefix}:{local}")),
        None => Cow::Borrowed(local),
    }
}
