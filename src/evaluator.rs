//! Evaluation of checked expressions against a tree.
//!
//! Values live in a pool indexed by [`ValueId`]; the evaluator is a
//! post-order walk that pushes handles onto a value stack. Location paths
//! expand step by step through `step_first`/`step_next`, with predicate
//! filtering done in place over each working node-set.

use crate::ast::{Axis, BinaryOp, Builtin, Expr, ExprKind, LocPath, Step, Type, ValueId};
use crate::error::PathError;
use crate::model::TreeNode;

const VAL_FALSE: ValueId = 0;
const VAL_TRUE: ValueId = 1;

#[derive(Debug, Clone)]
pub(crate) enum Value<N> {
    Boolean(bool),
    Number(i32),
    Str(String),
    NodeSet(Vec<N>),
}

impl<N> Value<N> {
    pub(crate) fn type_of(&self) -> Type {
        match self {
            Value::Boolean(_) => Type::Boolean,
            Value::Number(_) => Type::Number,
            Value::Str(_) => Type::String,
            Value::NodeSet(_) => Type::NodeSet,
        }
    }
}

/// Shared state of one compiled path: the value pool, the evaluation stack
/// and the current context.
///
/// Pool slots 0 and 1 are the canonical booleans, so pushing a boolean
/// result is just a handle push and never allocates.
pub(crate) struct State<N> {
    pool: Vec<Value<N>>,
    values: Vec<ValueId>,
    pub(crate) ctx: Option<N>,
    pub(crate) ctx_pos: u32,
    pub(crate) ctx_len: u32,
}

impl<N: TreeNode> State<N> {
    pub(crate) fn new() -> Self {
        State {
            pool: vec![Value::Boolean(false), Value::Boolean(true)],
            values: Vec::new(),
            ctx: None,
            ctx_pos: 0,
            ctx_len: 0,
        }
    }

    /// Add a value to the pool and return its handle. Handles stay valid
    /// across later growth; only the handle is ever stored in the AST.
    pub(crate) fn intern(&mut self, value: Value<N>) -> ValueId {
        let vind = self.pool.len() as ValueId;
        self.pool.push(value);
        vind
    }

    pub(crate) fn value(&self, vind: ValueId, text: &str) -> Result<&Value<N>, PathError> {
        self.pool.get(vind as usize).ok_or_else(|| PathError::internal(text))
    }

    pub(crate) fn push(&mut self, vind: ValueId) {
        self.values.push(vind);
    }

    pub(crate) fn pop(&mut self, text: &str) -> Result<ValueId, PathError> {
        self.values.pop().ok_or_else(|| PathError::internal(text))
    }

    fn push_boolean(&mut self, b: bool) {
        self.push(if b { VAL_TRUE } else { VAL_FALSE });
    }

    pub(crate) fn stack_len(&self) -> usize {
        self.values.len()
    }
}

/// Absent strings and empty strings compare equal.
fn streq(a: Option<&str>, b: Option<&str>) -> bool {
    a.unwrap_or("") == b.unwrap_or("")
}

fn eval_expr<N: TreeNode>(
    expr: &Expr,
    state: &mut State<N>,
    text: &str,
) -> Result<(), PathError> {
    match &expr.kind {
        ExprKind::LocPath(lp) => eval_locpath(lp, state, text),
        ExprKind::Binary { op, left, right } => eval_binary(*op, left, right, state, text),
        ExprKind::Value(vind) => {
            state.push(*vind);
            Ok(())
        }
        ExprKind::App { func, args } => eval_app(*func, args, state, text),
    }
}

fn eval_binary<N: TreeNode>(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    state: &mut State<N>,
    text: &str,
) -> Result<(), PathError> {
    eval_expr(left, state, text)?;
    eval_expr(right, state, text)?;
    match op {
        BinaryOp::Eq => eval_eq(state, false, text),
        BinaryOp::Neq => eval_eq(state, true, text),
        BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Star => eval_arith(state, op, text),
    }
}

fn eq_nodeset_nodeset<N: TreeNode>(left: &[N], right: &[N], neq: bool) -> bool {
    left.iter().any(|l| {
        right.iter().any(|r| {
            let eq = streq(l.value().as_deref(), r.value().as_deref());
            if neq { !eq } else { eq }
        })
    })
}

fn eq_nodeset_string<N: TreeNode>(nodes: &[N], s: &str, neq: bool) -> bool {
    nodes.iter().any(|n| {
        let eq = streq(n.value().as_deref(), Some(s));
        if neq { !eq } else { eq }
    })
}

fn eval_eq<N: TreeNode>(state: &mut State<N>, neq: bool, text: &str) -> Result<(), PathError> {
    let rind = state.pop(text)?;
    let lind = state.pop(text)?;
    let res = match (state.value(lind, text)?, state.value(rind, text)?) {
        (Value::NodeSet(l), Value::NodeSet(r)) => eq_nodeset_nodeset(l, r, neq),
        (Value::NodeSet(ns), Value::Str(s)) | (Value::Str(s), Value::NodeSet(ns)) => {
            eq_nodeset_string(ns, s, neq)
        }
        (Value::Number(l), Value::Number(r)) => {
            if neq {
                l != r
            } else {
                l == r
            }
        }
        (Value::Str(l), Value::Str(r)) => {
            let eq = streq(Some(l), Some(r));
            if neq { !eq } else { eq }
        }
        _ => return Err(PathError::internal(text)),
    };
    state.push_boolean(res);
    Ok(())
}

fn eval_arith<N: TreeNode>(
    state: &mut State<N>,
    op: BinaryOp,
    text: &str,
) -> Result<(), PathError> {
    let rind = state.pop(text)?;
    let lind = state.pop(text)?;
    let (l, r) = match (state.value(lind, text)?, state.value(rind, text)?) {
        (Value::Number(l), Value::Number(r)) => (*l, *r),
        _ => return Err(PathError::internal(text)),
    };
    let res = match op {
        BinaryOp::Plus => l.wrapping_add(r),
        BinaryOp::Minus => l.wrapping_sub(r),
        BinaryOp::Star => l.wrapping_mul(r),
        BinaryOp::Eq | BinaryOp::Neq => return Err(PathError::internal(text)),
    };
    let vind = state.intern(Value::Number(res));
    state.push(vind);
    Ok(())
}

fn eval_app<N: TreeNode>(
    func: Builtin,
    args: &[Box<Expr>],
    state: &mut State<N>,
    text: &str,
) -> Result<(), PathError> {
    for arg in args {
        eval_expr(arg, state, text)?;
    }
    match func {
        Builtin::Last => {
            let vind = state.intern(Value::Number(state.ctx_len as i32));
            state.push(vind);
        }
        Builtin::Position => {
            let vind = state.intern(Value::Number(state.ctx_pos as i32));
            state.push(vind);
        }
    }
    Ok(())
}

/// A predicate keeps a candidate when its value is a true boolean, a
/// number equal to the context position, or a non-empty node-set.
fn eval_pred<N: TreeNode>(
    expr: &Expr,
    state: &mut State<N>,
    text: &str,
) -> Result<bool, PathError> {
    eval_expr(expr, state, text)?;
    let vind = state.pop(text)?;
    match state.value(vind, text)? {
        Value::Boolean(b) => Ok(*b),
        Value::Number(n) => Ok(i64::from(state.ctx_pos) == i64::from(*n)),
        Value::NodeSet(ns) => Ok(!ns.is_empty()),
        Value::Str(_) => Err(PathError::internal(text)),
    }
}

fn step_matches<N: TreeNode>(step: &Step, node: &N) -> bool {
    match &step.name {
        None => true,
        Some(name) => streq(Some(name), node.label().as_deref()),
    }
}

/// First candidate a step yields from a context node, or `None`. The
/// traversal is axis-native; the name test is applied as a post-filter.
fn step_first<N: TreeNode>(step: &Step, ctx: &N) -> Option<N> {
    let node = match step.axis {
        Axis::SelfAxis | Axis::DescendantOrSelf => Some(ctx.clone()),
        Axis::Child | Axis::Descendant => ctx.first_child(),
        Axis::Parent | Axis::Ancestor => ctx.parent(),
        Axis::Root => {
            let mut node = ctx.clone();
            while let Some(parent) = node.parent() {
                node = parent;
            }
            Some(node)
        }
    }?;
    if step_matches(step, &node) { Some(node) } else { step_next(step, ctx, &node) }
}

/// Candidate after `node`, or `None` when the axis is exhausted. The
/// descendant axes walk the subtree rooted at `ctx` in pre-order.
fn step_next<N: TreeNode>(step: &Step, ctx: &N, node: &N) -> Option<N> {
    let mut node = node.clone();
    loop {
        let next = match step.axis {
            Axis::SelfAxis | Axis::Parent | Axis::Root => None,
            Axis::Child => node.next_sibling(),
            Axis::Ancestor => node.parent(),
            Axis::Descendant | Axis::DescendantOrSelf => match node.first_child() {
                Some(child) => Some(child),
                None => {
                    let mut cursor = node.clone();
                    loop {
                        if cursor == *ctx {
                            break None;
                        }
                        if let Some(sibling) = cursor.next_sibling() {
                            break Some(sibling);
                        }
                        cursor = cursor.parent()?;
                    }
                }
            },
        }?;
        if step_matches(step, &next) {
            return Some(next);
        }
        node = next;
    }
}

/// Expand a location path into its working node-sets.
///
/// Returns one node-set per step plus the seed set: `sets[0]` holds the
/// context node and `sets[k]` the nodes matching the whole path. Context
/// node, position and length are restored on success, so a nested call
/// from a predicate leaves its caller's context intact.
fn ns_from_locpath<N: TreeNode>(
    lp: &LocPath,
    state: &mut State<N>,
    text: &str,
) -> Result<Vec<Vec<N>>, PathError> {
    let saved_ctx = state.ctx.clone();
    let saved_pos = state.ctx_pos;
    let saved_len = state.ctx_len;

    let mut sets: Vec<Vec<N>> = (0..=lp.steps.len()).map(|_| Vec::new()).collect();
    let seed = state.ctx.clone().ok_or_else(|| PathError::internal(text))?;
    sets[0].push(seed);

    for (i, step) in lp.steps.iter().enumerate() {
        {
            let (head, tail) = sets.split_at_mut(i + 1);
            let work = &head[i];
            let next = &mut tail[0];
            for w in work {
                let mut candidate = step_first(step, w);
                while let Some(node) = candidate {
                    next.push(node.clone());
                    candidate = step_next(step, w, &node);
                }
            }
        }
        // Working sets are not deduplicated, so overlapping subtrees can
        // contribute the same node more than once.
        for pred in &step.predicates {
            state.ctx_len = sets[i + 1].len() as u32;
            state.ctx_pos = 1;
            let mut idx = 0;
            // ctx_pos numbers the set as it stood before this predicate's
            // removals: it advances for removed entries too.
            while idx < sets[i + 1].len() {
                state.ctx = Some(sets[i + 1][idx].clone());
                if eval_pred(pred, state, text)? {
                    idx += 1;
                } else {
                    sets[i + 1].remove(idx);
                }
                state.ctx_pos += 1;
            }
        }
    }

    state.ctx = saved_ctx;
    state.ctx_pos = saved_pos;
    state.ctx_len = saved_len;
    Ok(sets)
}

/// Evaluate a location path: intermediate node-sets are dropped here, only
/// the final one is interned into the pool and pushed.
pub(crate) fn eval_locpath<N: TreeNode>(
    lp: &LocPath,
    state: &mut State<N>,
    text: &str,
) -> Result<(), PathError> {
    let mut sets = ns_from_locpath(lp, state, text)?;
    let last = sets.pop().ok_or_else(|| PathError::internal(text))?;
    let vind = state.intern(Value::NodeSet(last));
    state.push(vind);
    Ok(())
}

/// Outcome of a longest-prefix search along a location path.
pub(crate) enum Search<N> {
    /// More than one node matched the deepest non-empty prefix.
    Ambiguous,
    /// Exactly one node matched the prefix ending before `next_step`.
    /// `next_step == steps.len()` means the whole path matched.
    Anchor { node: N, next_step: usize },
}

/// Find the node matching the longest prefix of `lp` from the current
/// context node. Predicates participate in the prefix match.
pub(crate) fn locpath_search<N: TreeNode>(
    lp: &LocPath,
    state: &mut State<N>,
    text: &str,
) -> Result<Search<N>, PathError> {
    let sets = ns_from_locpath(lp, state, text)?;
    let mut last = sets.len() - 1;
    while last > 0 && sets[last].is_empty() {
        last -= 1;
    }
    // sets[0] holds the context node, so the search always bottoms out.
    let deepest = &sets[last];
    if deepest.len() > 1 {
        return Ok(Search::Ambiguous);
    }
    let node = deepest.first().cloned().ok_or_else(|| PathError::internal(text))?;
    Ok(Search::Anchor { node, next_step: last })
}
