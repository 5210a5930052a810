use core::fmt;

/// Read capability the engine requires from a host tree.
///
/// Implementations are cheap-to-clone handles (an `Arc`, an index into an
/// arena, ...); `PartialEq` is node identity, not structural equality. The
/// engine never stores raw references into the tree, only handles, so the
/// host is free to back nodes however it likes as long as handles stay
/// valid while a compiled path is alive.
pub trait TreeNode: Clone + PartialEq + fmt::Debug {
    /// The node's label; `None` for unlabelled nodes. An absent label and
    /// an empty label compare equal everywhere in the engine.
    fn label(&self) -> Option<String>;

    /// The node's value, if any.
    fn value(&self) -> Option<String>;

    /// The parent node; `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// Head of the child list.
    fn first_child(&self) -> Option<Self>;

    /// Next sibling in the parent's child list.
    fn next_sibling(&self) -> Option<Self>;
}

/// Mutation capability needed by [`TreePath::expand_tree`].
///
/// [`TreePath::expand_tree`]: crate::TreePath::expand_tree
pub trait TreeEdit: TreeNode {
    /// Append a new child with the given label and return its handle, or
    /// `None` if the host refuses the creation.
    fn make_child(&self, label: &str) -> Option<Self>;

    /// Unlink a direct child. The child's subtree is released once the
    /// last handle to it is dropped.
    fn remove_child(&self, child: &Self);
}
