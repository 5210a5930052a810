//! Simple in-memory labelled tree for tests and quick prototypes.
//!
//! Focus:
//! - Ergonomic builder for quick test tree creation
//! - Handle identity via `Arc` pointer equality
//! - Implements both [`TreeNode`] and [`TreeEdit`], so compiled paths can
//!   evaluate against it and expand it
//!
//! Example:
//! ```
//! use treepath::{TreeNode, leaf, root, tree};
//!
//! // (r (a "1") (b "2") (a (c)))
//! let r = root()
//!     .child(leaf("a", "1"))
//!     .child(leaf("b", "2"))
//!     .child(tree("a").child(tree("c")))
//!     .build();
//!
//! assert_eq!(r.first_child().unwrap().label().as_deref(), Some("a"));
//! assert_eq!(r.first_child().unwrap().value().as_deref(), Some("1"));
//! ```

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use crate::model::{TreeEdit, TreeNode};

#[derive(Debug)]
struct Inner {
    label: Option<String>,
    value: RwLock<Option<String>>,
    parent: RwLock<Option<Weak<Inner>>>,
    children: RwLock<Vec<SimpleNode>>,
}

/// An `Arc`-backed node of a labelled tree.
#[derive(Clone)]
pub struct SimpleNode(Arc<Inner>);

impl PartialEq for SimpleNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for SimpleNode {}

impl std::hash::Hash for SimpleNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as *const Inner).hash(state)
    }
}

impl fmt::Debug for SimpleNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleNode")
            .field("label", &self.0.label)
            .field("value", &self.0.value)
            .finish()
    }
}

impl SimpleNode {
    fn new(label: Option<String>, value: Option<String>) -> Self {
        SimpleNode(Arc::new(Inner {
            label,
            value: RwLock::new(value),
            parent: RwLock::new(None),
            children: RwLock::new(Vec::new()),
        }))
    }

    pub fn set_value(&self, value: Option<&str>) {
        if let Ok(mut slot) = self.0.value.write() {
            *slot = value.map(str::to_string);
        }
    }

    /// Snapshot of the child list.
    pub fn children(&self) -> Vec<SimpleNode> {
        self.0.children.read().map(|c| c.clone()).unwrap_or_default()
    }

    fn attach(&self, child: &SimpleNode) {
        if let (Ok(mut children), Ok(mut parent)) =
            (self.0.children.write(), child.0.parent.write())
        {
            *parent = Some(Arc::downgrade(&self.0));
            children.push(child.clone());
        }
    }
}

/// Chainable builder returned by [`tree`] and [`root`].
pub struct SimpleNodeBuilder {
    node: SimpleNode,
    pending: Vec<SimpleNode>,
}

impl SimpleNodeBuilder {
    fn new(label: Option<String>) -> Self {
        SimpleNodeBuilder { node: SimpleNode::new(label, None), pending: Vec::new() }
    }

    pub fn value(self, value: &str) -> Self {
        self.node.set_value(Some(value));
        self
    }

    pub fn child(mut self, child: impl Into<SimpleNodeOrBuilder>) -> Self {
        match child.into() {
            SimpleNodeOrBuilder::Built(node) => self.pending.push(node),
            SimpleNodeOrBuilder::Builder(builder) => self.pending.push(builder.build()),
        }
        self
    }

    pub fn build(self) -> SimpleNode {
        for child in &self.pending {
            self.node.attach(child);
        }
        self.node
    }
}

pub enum SimpleNodeOrBuilder {
    Built(SimpleNode),
    Builder(SimpleNodeBuilder),
}

impl From<SimpleNode> for SimpleNodeOrBuilder {
    fn from(node: SimpleNode) -> Self {
        SimpleNodeOrBuilder::Built(node)
    }
}

impl From<SimpleNodeBuilder> for SimpleNodeOrBuilder {
    fn from(builder: SimpleNodeBuilder) -> Self {
        SimpleNodeOrBuilder::Builder(builder)
    }
}

// Convenience helper functions for concise test code

/// A labelled node builder.
pub fn tree(label: &str) -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(Some(label.to_string()))
}

/// An unlabelled root builder.
pub fn root() -> SimpleNodeBuilder {
    SimpleNodeBuilder::new(None)
}

/// A labelled node carrying a value and no children.
pub fn leaf(label: &str, value: &str) -> SimpleNode {
    SimpleNode::new(Some(label.to_string()), Some(value.to_string()))
}

impl TreeNode for SimpleNode {
    fn label(&self) -> Option<String> {
        self.0.label.clone()
    }

    fn value(&self) -> Option<String> {
        self.0.value.read().ok().and_then(|v| v.clone())
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent.read().ok()?.as_ref().and_then(Weak::upgrade).map(SimpleNode)
    }

    fn first_child(&self) -> Option<Self> {
        self.0.children.read().ok()?.first().cloned()
    }

    fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let siblings = parent.0.children.read().ok()?;
        let at = siblings.iter().position(|s| s == self)?;
        siblings.get(at + 1).cloned()
    }
}

impl TreeEdit for SimpleNode {
    fn make_child(&self, label: &str) -> Option<Self> {
        let child = SimpleNode::new(Some(label.to_string()), None);
        self.attach(&child);
        Some(child)
    }

    fn remove_child(&self, child: &Self) {
        if let Ok(mut children) = self.0.children.write() {
            children.retain(|c| c != child);
        }
    }
}
