//! Abstract syntax for path expressions.
//!
//! Expressions form a small tagged tree: location paths, binary operators,
//! interned values and built-in function applications. Literal values are
//! not stored inline; expressions carry [`ValueId`] handles into the
//! compiled path's value pool, which stays valid while the pool grows.

use core::fmt;

use smallvec::SmallVec;

/// Handle into the value pool of a compiled path.
pub type ValueId = u32;

/// Static type of an expression, assigned during the check phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    NodeSet,
    Boolean,
    Number,
    String,
}

/// Direction of traversal from a context node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    SelfAxis,
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    Root,
}

impl Axis {
    /// All axes, in the order the parser tries them.
    pub(crate) const ALL: [Axis; 7] = [
        Axis::SelfAxis,
        Axis::Child,
        Axis::Descendant,
        Axis::DescendantOrSelf,
        Axis::Parent,
        Axis::Ancestor,
        Axis::Root,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Axis::SelfAxis => "self",
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::DescendantOrSelf => "descendant-or-self",
            Axis::Parent => "parent",
            Axis::Ancestor => "ancestor",
            Axis::Root => "root",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One location step: axis, optional name test and predicates.
///
/// An absent name matches any label.
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub name: Option<String>,
    pub predicates: SmallVec<[Expr; 1]>,
}

impl Step {
    pub(crate) fn with_axis(axis: Axis) -> Self {
        Step { axis, name: None, predicates: SmallVec::new() }
    }

    /// The step inserted for `//`: `descendant-or-self::*`.
    pub(crate) fn abbreviated() -> Self {
        Step::with_axis(Axis::DescendantOrSelf)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.axis, self.name.as_deref().unwrap_or("*"))
    }
}

/// A location path: an ordered sequence of steps.
#[derive(Debug, Clone)]
pub struct LocPath {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
}

/// Built-in functions. A closed set: the parser only accepts names listed
/// here, and evaluation dispatches by variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Last,
    Position,
}

impl Builtin {
    pub(crate) const ALL: [Builtin; 2] = [Builtin::Last, Builtin::Position];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Last => "last",
            Builtin::Position => "position",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Last | Builtin::Position => 0,
        }
    }

    pub fn arg_types(self) -> &'static [Type] {
        match self {
            Builtin::Last | Builtin::Position => &[],
        }
    }

    pub fn return_type(self) -> Type {
        match self {
            Builtin::Last | Builtin::Position => Type::Number,
        }
    }
}

/// An expression node together with its checked type.
///
/// `ty` is `None` until the check phase has run; every accepted expression
/// ends up fully typed.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Option<Type>,
}

impl Expr {
    pub(crate) fn new(kind: ExprKind) -> Self {
        Expr { kind, ty: None }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    LocPath(LocPath),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Value(ValueId),
    App {
        func: Builtin,
        args: SmallVec<[Box<Expr>; 2]>,
    },
}
