use thiserror::Error;

/// Stable error codes reported by parsing, type checking and evaluation.
///
/// The set and its messages are part of the external contract; callers may
/// match on codes or display the messages directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Empty or illegal name where one was required.
    Name,
    /// Illegal string literal.
    Str,
    /// Illegal or out-of-range integer literal.
    Number,
    /// Missing `'`, `"`, `)` or `,`.
    Delim,
    /// Unmatched `]` / missing `]`.
    Pred,
    /// Allocation failure. Unreached under infallible allocation; kept so
    /// the code set stays stable for callers.
    NoMem,
    /// Expected `/`. Kept for code-set stability; currently unreached.
    Slash,
    /// Invariant violation, i.e. a bug in the engine.
    Internal,
    /// Type-check failure.
    Type,
}

impl ErrorCode {
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::Name => "empty or illegal name",
            ErrorCode::Str => "illegal string literal",
            ErrorCode::Number => "illegal number",
            ErrorCode::Delim => "missing delimiter",
            ErrorCode::Pred => "unmatched ']'",
            ErrorCode::NoMem => "allocation failed",
            ErrorCode::Slash => "expected '/'",
            ErrorCode::Internal => "internal error",
            ErrorCode::Type => "type error",
        }
    }
}

/// A failure while compiling or evaluating a path expression.
///
/// Carries the stable [`ErrorCode`], the original expression text and the
/// zero-based byte offset of the cursor at the point of failure. Syntax
/// errors point at the offending byte; type errors report offset 0 (the
/// expression's start).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at offset {pos} in `{text}`", .code.message())]
pub struct PathError {
    code: ErrorCode,
    text: String,
    pos: usize,
}

impl PathError {
    pub(crate) fn new(code: ErrorCode, text: &str, pos: usize) -> Self {
        PathError { code, text: text.to_string(), pos }
    }

    pub(crate) fn internal(text: &str) -> Self {
        PathError::new(ErrorCode::Internal, text, 0)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The stable human-readable message for this error's code.
    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// The expression text the error refers to.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Zero-based byte offset into [`text`](Self::text).
    pub fn position(&self) -> usize {
        self.pos
    }
}
