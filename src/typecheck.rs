//! Static type checking.
//!
//! Walks the AST bottom-up, stores a [`Type`] on every expression and
//! rejects ill-typed operands. There are no implicit coercions; any
//! violation is a [`ErrorCode::Type`] error. Type errors report offset 0
//! since the parse cursor has already moved past the expression.

use crate::ast::{BinaryOp, Expr, ExprKind, Type};
use crate::error::{ErrorCode, PathError};
use crate::evaluator::State;
use crate::model::TreeNode;

fn type_error(text: &str) -> PathError {
    PathError::new(ErrorCode::Type, text, 0)
}

/// Check one expression, recording the type of it and of every
/// subexpression.
pub(crate) fn check_expr<N: TreeNode>(
    expr: &mut Expr,
    state: &State<N>,
    text: &str,
) -> Result<Type, PathError> {
    let ty = match &mut expr.kind {
        ExprKind::LocPath(lp) => {
            // A predicate acts as a filter, so any type with a keep rule
            // is allowed: boolean, position number, or node-set emptiness.
            for step in &mut lp.steps {
                for pred in &mut step.predicates {
                    let pred_ty = check_expr(pred, state, text)?;
                    if !matches!(pred_ty, Type::NodeSet | Type::Number | Type::Boolean) {
                        return Err(type_error(text));
                    }
                }
            }
            Type::NodeSet
        }
        ExprKind::Binary { op, left, right } => {
            let l = check_expr(left, state, text)?;
            let r = check_expr(right, state, text)?;
            match op {
                BinaryOp::Eq | BinaryOp::Neq => {
                    let comparable = (matches!(l, Type::NodeSet | Type::String)
                        && matches!(r, Type::NodeSet | Type::String))
                        || (l == Type::Number && r == Type::Number);
                    if !comparable {
                        return Err(type_error(text));
                    }
                    Type::Boolean
                }
                BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Star => {
                    if l != Type::Number || r != Type::Number {
                        return Err(type_error(text));
                    }
                    Type::Number
                }
            }
        }
        ExprKind::Value(vind) => state.value(*vind, text)?.type_of(),
        ExprKind::App { func, args } => {
            let func = *func;
            for (arg, expected) in args.iter_mut().zip(func.arg_types()) {
                if check_expr(arg, state, text)? != *expected {
                    return Err(type_error(text));
                }
            }
            func.return_type()
        }
    };
    expr.ty = Some(ty);
    Ok(ty)
}
