#![forbid(unsafe_code)]

//! Arena-backed element tree.
//!
//! # Invariants
//!
//! 1. A removed node's slot is recycled, but every reuse bumps the slot's
//!    generation. A stale id therefore stays dead instead of aliasing the
//!    newer node, and the arena grows only with the peak live node count.
//!    A slot whose generation is exhausted is retired, never reused.
//! 2. Every live node has at most one parent and appears exactly once in
//!    that parent's child list.
//! 3. The body (`Tree::body()`) is the root. A node is *connected* when its
//!    parent chain reaches the body.
//! 4. Traversal is depth-first pre-order, which is document order.
//!
//! # Failure Modes
//!
//! | Operation | Cause | Behavior |
//! |-----------|-------|----------|
//! | Any lookup | Dead or unknown id | Returns `None` / `false` |
//! | `append_child` | Child is an ancestor of parent | Refused, returns `false` |
//! | `remove` | Called on the body | Refused, returns `false` |

use std::fmt::Write as _;

use ahash::AHashMap;
use veil_a11y::{AccessNode, FocusPolicy};

/// Stable handle to a node: arena slot plus the slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot, for diagnostics.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: AHashMap<String, String>,
    },
    Text(String),
}

/// A node and its links.
#[derive(Debug, Clone)]
pub struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element { .. })
    }
}

impl AccessNode for Node {
    fn tag(&self) -> &str {
        match &self.kind {
            NodeKind::Element { tag, .. } => tag,
            NodeKind::Text(_) => "#text",
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        match &self.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }
}

/// The element tree rooted at `body`.
#[derive(Debug, Clone)]
pub struct Tree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// A tree containing only an empty body.
    #[must_use]
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
        };
        tree.body = tree.insert(NodeKind::Element {
            tag: "body".to_owned(),
            attrs: AHashMap::new(),
        });
        tree
    }

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len();
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Arena slots allocated so far, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live nodes, attached or not.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free.len() - self.retired()
    }

    fn retired(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.node.is_none() && s.generation == u32::MAX)
            .count()
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs: AHashMap::new(),
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Text(text.into()))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    /// Whether the id refers to a live node (attached or not).
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).filter(|n| n.is_element()).map(AccessNode::tag)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attr(name))
    }

    /// Set an attribute on an element. Returns `false` for text or dead nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        match self.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attrs, .. }) => {
                attrs.insert(name.to_owned(), value.into());
                true
            }
            _ => false,
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        match self.get_mut(id).map(|n| &mut n.kind) {
            Some(NodeKind::Element { attrs, .. }) => attrs.remove(name),
            _ => None,
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if !self.contains(id) {
                return false;
            }
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    /// Whether the node's parent chain reaches the body.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.body, id)
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    /// elsewhere.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent)
            || !self.get(parent).is_some_and(Node::is_element)
            || !self.contains(child)
            || self.is_inclusive_ancestor(child, parent)
        {
            return false;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Unlink a node from its parent, keeping the subtree alive.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.parent(id) else {
            return false;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&c| c != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
        true
    }

    /// Detach and destroy a node and its whole subtree.
    ///
    /// Returns the ids that were destroyed, root first.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        if id == self.body || !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let mut doomed = vec![id];
        doomed.extend(self.descendants(id));
        for &dead in &doomed {
            if let Some(slot) = self.slots.get_mut(dead.index) {
                slot.node = None;
                if slot.generation < u32::MAX {
                    slot.generation += 1;
                    self.free.push(dead.index);
                }
            }
        }
        doomed
    }

    /// Descendants of `root` in document order, excluding `root`.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Descendants of `root` that `policy` marks as sequentially focusable,
    /// in document order.
    pub fn focusable_descendants(&self, root: NodeId, policy: &FocusPolicy) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| {
                self.get(id)
                    .is_some_and(|n| n.is_element() && policy.is_focusable(n))
            })
            .collect()
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            if let Some(Node {
                kind: NodeKind::Text(text),
                ..
            }) = self.get(node)
            {
                out.push_str(text);
            }
        }
        out
    }

    /// First descendant of `root` (document order) matching `pred`.
    pub fn find(&self, root: NodeId, mut pred: impl FnMut(NodeId, &Node) -> bool) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|n| pred(id, n)))
    }

    /// First connected element whose attribute `name` equals `value`.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find(self.body, |_, n| n.attr(name) == Some(value))
    }

    /// Innermost connected element whose own text children equal `text`.
    pub fn find_by_text(&self, text: &str) -> Option<NodeId> {
        self.find(self.body, |_, n| {
            n.is_element()
                && n.children().iter().any(|&c| {
                    matches!(
                        self.get(c).map(Node::kind),
                        Some(NodeKind::Text(t)) if t == text
                    )
                })
        })
    }

    /// Indented outline of a subtree, for snapshots and debugging.
    ///
    /// Attributes are sorted by name so output is stable.
    pub fn outline(&self, root: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(root, 0, &mut out);
        out
    }

    fn outline_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        let indent = "  ".repeat(depth);
        match &node.kind {
            NodeKind::Text(text) => {
                let _ = writeln!(out, "{indent}\"{text}\"");
            }
            NodeKind::Element { tag, attrs } => {
                let mut pairs: Vec<_> = attrs.iter().collect();
                pairs.sort();
                let _ = write!(out, "{indent}<{tag}");
                for (name, value) in pairs {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                let _ = writeln!(out, ">");
                for &child in &node.children {
                    self.outline_into(child, depth + 1, out);
                }
            }
        }
    }
}
