use slotmap::SlotMap;

use crate::common::collections::{HashMap, HashSet};

slotmap::new_key_type! {
    /// A rendered element. Identities are throwaway: a hard refresh of a
    /// layout root replaces its rendered subtree wholesale.
    pub struct ElementId;
}

#[derive(Default)]
struct ElementNode {
    tag: String,
    attrs: HashMap<String, String>,
    classes: HashSet<String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    /// Set on the root of an isolated rendered subtree; points at the
    /// element hosting it. Hit paths cross this boundary, plain parent
    /// walks do not.
    host: Option<ElementId>,
}

/// Host-independent element tree: the minimal view of the rendered document
/// the locator and namer need. Real hosts mirror their DOM into this shape;
/// tests build it directly.
#[derive(Default)]
pub struct ElementTree {
    nodes: SlotMap<ElementId, ElementNode>,
}

impl ElementTree {
    pub fn new() -> Self { Self::default() }

    pub fn element(&mut self, tag: &str) -> ElementId {
        self.nodes.insert(ElementNode {
            tag: tag.to_owned(),
            ..Default::default()
        })
    }

    pub fn contains(&self, el: ElementId) -> bool { self.nodes.contains_key(el) }

    pub fn tag(&self, el: ElementId) -> &str {
        self.nodes.get(el).map(|n| n.tag.as_str()).unwrap_or_default()
    }

    pub fn set_attr(&mut self, el: ElementId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(el) {
            node.attrs.insert(name.to_owned(), value.to_owned());
        }
    }

    pub fn attr(&self, el: ElementId, name: &str) -> Option<&str> {
        self.nodes.get(el).and_then(|n| n.attrs.get(name)).map(String::as_str)
    }

    pub fn has_attr(&self, el: ElementId, name: &str) -> bool { self.attr(el, name).is_some() }

    pub fn add_class(&mut self, el: ElementId, class: &str) {
        if let Some(node) = self.nodes.get_mut(el) {
            node.classes.insert(class.to_owned());
        }
    }

    pub fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.nodes.get(el).map(|n| n.classes.contains(class)).unwrap_or(false)
    }

    pub fn set_text(&mut self, el: ElementId, text: &str) {
        if let Some(node) = self.nodes.get_mut(el) {
            node.text = text.to_owned();
        }
    }

    pub fn text(&self, el: ElementId) -> &str {
        self.nodes.get(el).map(|n| n.text.as_str()).unwrap_or_default()
    }

    /// Marks `root` as an isolated subtree hosted by `host`. The subtree
    /// root keeps no parent; composed walks jump to the host instead.
    pub fn set_host(&mut self, root: ElementId, host: ElementId) {
        if let Some(node) = self.nodes.get_mut(root) {
            debug_assert!(node.parent.is_none(), "hosted subtree root must be parentless");
            node.host = Some(host);
        }
    }

    pub fn host(&self, el: ElementId) -> Option<ElementId> {
        self.nodes.get(el).and_then(|n| n.host)
    }

    pub fn parent(&self, el: ElementId) -> Option<ElementId> {
        self.nodes.get(el).and_then(|n| n.parent)
    }

    pub fn children(&self, el: ElementId) -> &[ElementId] {
        self.nodes.get(el).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn append(&mut self, parent: ElementId, child: ElementId) {
        if child == parent || !self.contains(parent) || !self.contains(child) {
            return;
        }
        if self.ancestors(parent).any(|a| a == child) {
            return;
        }
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    pub fn detach(&mut self, el: ElementId) {
        let Some(parent) = self.parent(el) else { return };
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.retain(|&c| c != el);
        }
        self.nodes[el].parent = None;
    }

    pub fn remove_subtree(&mut self, el: ElementId) {
        self.detach(el);
        let mut stack = vec![el];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.remove(cur) {
                stack.extend(node.children);
            }
        }
    }

    /// Ancestors of `el` including itself, following plain parent links only.
    pub fn ancestors(&self, el: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut next = self.contains(el).then_some(el);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| self.parent(n));
            node
        })
    }

    /// Ancestors of `el` including itself, crossing hosted-subtree
    /// boundaries the way a composed event path does.
    pub fn composed_ancestors(&self, el: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut next = self.contains(el).then_some(el);
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| self.parent(n).or_else(|| self.host(n)));
            node
        })
    }

    /// The hit path of an event targeting `el`: innermost-first, composed.
    pub fn composed_path(&self, el: ElementId) -> Vec<ElementId> {
        self.composed_ancestors(el).collect()
    }

    /// Preorder traversal of the subtree below `el`, not crossing hosted
    /// subtree boundaries (hosted roots are parentless and never children).
    pub fn descendants(&self, el: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        let mut stack: Vec<ElementId> = self.children(el).iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(self.children(node).iter().rev());
            Some(node)
        })
    }

    /// Concatenated text of `el` and its descendants, in document order.
    pub fn text_content(&self, el: ElementId) -> String {
        let mut out = String::new();
        out.push_str(self.text(el));
        for child in self.descendants(el) {
            let text = self.text(child);
            if !text.is_empty() {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
                out.push_str(text);
            }
        }
        out.trim().to_owned()
    }
}
