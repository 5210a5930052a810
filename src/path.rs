//! Compiled path expressions.
//!
//! [`TreePath::parse`] compiles an expression against an origin node;
//! evaluation is lazy and cached, triggered by the first call that needs
//! results. A compiled path owns its value pool and AST and borrows the
//! tree through node handles.

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{Axis, Expr, ExprKind, LocPath, Type};
use crate::error::{ErrorCode, PathError};
use crate::evaluator::{self, Search, State, Value};
use crate::model::{TreeEdit, TreeNode};
use crate::parser::Parser;
use crate::typecheck;

/// Result of [`TreePath::find_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match<N> {
    /// No node matched.
    None,
    /// Exactly one node matched.
    One(N),
    /// More than one node matched.
    Many,
}

/// A failure while materialising missing tree branches.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The longest matching prefix ends at more than one node, so there is
    /// no unique anchor to expand from.
    #[error("path matches more than one node")]
    Ambiguous,
    /// A remaining step is not a named child step and cannot be created.
    #[error("step `{0}` cannot be created")]
    Uncreatable(String),
    /// The tree refused to create a child with this label.
    #[error("tree rejected new child `{0}`")]
    Rejected(String),
    /// Evaluating the path itself failed.
    #[error(transparent)]
    Path(#[from] PathError),
}

/// A compiled path expression, bound to the origin node it was parsed
/// against.
///
/// ```
/// use treepath::{TreeNode, TreePath, leaf, root};
///
/// let r = root()
///     .child(leaf("a", "1"))
///     .child(leaf("b", "2"))
///     .build();
/// let mut path = TreePath::parse(&r, "/a[. = \"1\"]").unwrap();
/// let first = path.first().unwrap().unwrap();
/// assert_eq!(first.label().as_deref(), Some("a"));
/// assert!(path.next().unwrap().is_none());
/// ```
pub struct TreePath<N: TreeNode> {
    state: State<N>,
    locpath: LocPath,
    text: String,
    results: Option<Vec<N>>,
    cursor: usize,
    origin: N,
}

impl<N: TreeNode> TreePath<N> {
    /// Parse and type-check `text` against `origin`.
    ///
    /// On failure the error carries the stable code, the expression text
    /// and the byte offset of the cursor at the point of failure.
    pub fn parse(origin: &N, text: &str) -> Result<Self, PathError> {
        let mut state = State::new();
        let mut exprs = Parser::new(text, &mut state).parse()?;
        if exprs.len() != 1 {
            return Err(PathError::internal(text));
        }
        let mut root = exprs.pop().ok_or_else(|| PathError::internal(text))?;
        typecheck::check_expr(&mut root, &state, text)?;

        // The only acceptable top-level shape is a node-set-typed
        // location path; a bare `42` or `"a" = "b"` is well-formed but
        // not a path.
        let locpath = match root {
            Expr { kind: ExprKind::LocPath(lp), ty: Some(Type::NodeSet) } => lp,
            _ => return Err(PathError::new(ErrorCode::Type, text, 0)),
        };

        trace!(steps = locpath.steps.len(), expr = text, "compiled path expression");
        Ok(TreePath {
            state,
            locpath,
            text: text.to_string(),
            results: None,
            cursor: 0,
            origin: origin.clone(),
        })
    }

    /// The expression this path was compiled from.
    pub fn expression(&self) -> &str {
        &self.text
    }

    /// The compiled location path, for inspection.
    pub fn locpath(&self) -> &LocPath {
        &self.locpath
    }

    fn evaluate(&mut self) -> Result<(), PathError> {
        if self.results.is_some() {
            return Ok(());
        }
        self.state.ctx = Some(self.origin.clone());
        self.state.ctx_pos = 1;
        self.state.ctx_len = 1;
        evaluator::eval_locpath(&self.locpath, &mut self.state, &self.text)?;
        if self.state.stack_len() != 1 {
            return Err(PathError::internal(&self.text));
        }
        let vind = self.state.pop(&self.text)?;
        let nodes = match self.state.value(vind, &self.text)? {
            Value::NodeSet(nodes) => nodes.clone(),
            _ => return Err(PathError::internal(&self.text)),
        };
        trace!(matches = nodes.len(), expr = self.text.as_str(), "evaluated path expression");
        self.results = Some(nodes);
        Ok(())
    }

    /// Evaluate if needed, rewind the cursor and return the first match.
    pub fn first(&mut self) -> Result<Option<N>, PathError> {
        self.evaluate()?;
        self.cursor = 0;
        let results = self.results.as_deref().unwrap_or(&[]);
        Ok(results.first().cloned())
    }

    /// Advance the cursor; `None` once the result set is exhausted.
    pub fn next(&mut self) -> Result<Option<N>, PathError> {
        self.evaluate()?;
        let results = self.results.as_deref().unwrap_or(&[]);
        if self.cursor + 1 < results.len() {
            self.cursor += 1;
            Ok(results.get(self.cursor).cloned())
        } else {
            Ok(None)
        }
    }

    /// All matches, in insertion order. Does not disturb the
    /// [`first`](Self::first)/[`next`](Self::next) cursor.
    pub fn nodes(&mut self) -> Result<impl Iterator<Item = N> + '_, PathError> {
        self.evaluate()?;
        Ok(self.results.as_deref().unwrap_or(&[]).iter().cloned())
    }

    /// Whether the path matches no node, exactly one, or several.
    pub fn find_one(&mut self) -> Result<Match<N>, PathError> {
        let Some(node) = self.first()? else {
            return Ok(Match::None);
        };
        if self.next()?.is_some() {
            return Ok(Match::Many);
        }
        Ok(Match::One(node))
    }
}

impl<N: TreeEdit> TreePath<N> {
    /// Materialise the branches of the tree implied by this path.
    ///
    /// Finds the unique node matching the longest prefix of the path, then
    /// creates one child per remaining step. Remaining steps must be named
    /// `child` steps. Returns the deepest node of the fully expanded path:
    /// the last created node, or the existing match when the whole path
    /// already resolves. On failure every node created by this call is
    /// unlinked again.
    pub fn expand_tree(&mut self) -> Result<N, ExpandError> {
        self.state.ctx = Some(self.origin.clone());
        self.state.ctx_pos = 1;
        self.state.ctx_len = 1;
        let search = evaluator::locpath_search(&self.locpath, &mut self.state, &self.text)?;
        let (anchor, next_step) = match search {
            Search::Ambiguous => return Err(ExpandError::Ambiguous),
            Search::Anchor { node, next_step } => (node, next_step),
        };
        if next_step == self.locpath.steps.len() {
            return Ok(anchor);
        }

        let mut parent = anchor;
        let mut first_created: Option<N> = None;
        for step in &self.locpath.steps[next_step..] {
            let label = match (&step.axis, step.name.as_deref()) {
                (Axis::Child, Some(label)) => label,
                _ => {
                    Self::unlink(&first_created);
                    return Err(ExpandError::Uncreatable(step.to_string()));
                }
            };
            match parent.make_child(label) {
                Some(child) => {
                    if first_created.is_none() {
                        first_created = Some(child.clone());
                    }
                    parent = child;
                }
                None => {
                    Self::unlink(&first_created);
                    return Err(ExpandError::Rejected(label.to_string()));
                }
            }
        }

        debug!(
            created = self.locpath.steps.len() - next_step,
            expr = self.text.as_str(),
            "expanded missing tree branches"
        );
        Ok(parent)
    }

    fn unlink(created: &Option<N>) {
        if let Some(node) = created
            && let Some(parent) = node.parent()
        {
            parent.remove_child(node);
        }
    }
}
