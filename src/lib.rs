//! Path expressions over labelled in-memory trees, modelled on XPath.
//!
//! An expression is compiled with [`TreePath::parse`] against an origin
//! node of any tree implementing [`TreeNode`], then evaluated lazily into
//! an ordered node-set. [`TreePath::expand_tree`] additionally creates the
//! missing branches a path implies, for trees that implement [`TreeEdit`].

pub mod ast;
pub mod error;
pub mod model;
pub mod path;
pub mod simple_tree;

mod evaluator;
mod parser;
mod typecheck;

pub use error::{ErrorCode, PathError};
pub use model::{TreeEdit, TreeNode};
pub use path::{ExpandError, Match, TreePath};
pub use simple_tree::{SimpleNode, SimpleNodeBuilder, leaf, root, tree};
