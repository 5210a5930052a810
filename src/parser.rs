//! Recursive-descent parser for the path-expression grammar.
//!
//! One function per production. Every production pushes exactly one
//! expression onto the parser's expression stack; binary operators pop two
//! and push one, function calls pop arity-many and push one. Literals and
//! numbers are interned into the value pool as they are read, so the AST
//! only ever stores pool handles.
//!
//! The cursor is a byte offset into the input. All grammar delimiters are
//! ASCII, so byte-wise scanning never splits a multi-byte character; names
//! may contain arbitrary UTF-8.

use smallvec::SmallVec;

use crate::ast::{Axis, BinaryOp, Builtin, Expr, ExprKind, LocPath, Step};
use crate::error::{ErrorCode, PathError};
use crate::evaluator::{State, Value};
use crate::model::TreeNode;

pub(crate) struct Parser<'t, 's, N: TreeNode> {
    text: &'t str,
    pos: usize,
    exprs: Vec<Expr>,
    state: &'s mut State<N>,
}

impl<'t, 's, N: TreeNode> Parser<'t, 's, N> {
    pub(crate) fn new(text: &'t str, state: &'s mut State<N>) -> Self {
        Parser { text, pos: 0, exprs: Vec::new(), state }
    }

    /// Runs the whole grammar and hands back the expression stack. The
    /// caller checks that exactly one expression remains.
    pub(crate) fn parse(mut self) -> Result<Vec<Expr>, PathError> {
        self.parse_expr()?;
        Ok(self.exprs)
    }

    fn err(&self, code: ErrorCode) -> PathError {
        PathError::new(code, self.text, self.pos)
    }

    // Lexer primitives

    fn cur(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn cur_at(&self, offset: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + offset).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skipws(&mut self) {
        while self.cur().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skip whitespace, then consume `m` if it is the next byte.
    fn match_byte(&mut self, m: u8) -> bool {
        self.skipws();
        if self.cur() == Some(m) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// True if the next byte is one of `chars`. Does not skip whitespace
    /// and never matches at end of input.
    fn peek(&self, chars: &[u8]) -> bool {
        self.cur().is_some_and(|b| chars.contains(&b))
    }

    /// If the input continues with `token`, optional whitespace and
    /// `follow`, consume all of it and return true. Otherwise leave the
    /// cursor untouched.
    fn looking_at(&mut self, token: &str, follow: &str) -> bool {
        let bytes = self.text.as_bytes();
        if !bytes[self.pos..].starts_with(token.as_bytes()) {
            return false;
        }
        let mut p = self.pos + token.len();
        while bytes.get(p).is_some_and(|b| b.is_ascii_whitespace()) {
            p += 1;
        }
        if !bytes[p..].starts_with(follow.as_bytes()) {
            return false;
        }
        self.pos = p + follow.len();
        true
    }

    // Productions

    /// Name ::= one or more bytes outside `/ [ ] =` and whitespace;
    /// `\x` escapes the following byte.
    fn parse_name(&mut self) -> Result<String, PathError> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let mut name = Vec::new();
        while let Some(b) = bytes.get(self.pos).copied() {
            if matches!(b, b'/' | b'[' | b']' | b'=') || b.is_ascii_whitespace() {
                break;
            }
            if b == b'\\' {
                self.pos += 1;
                match bytes.get(self.pos).copied() {
                    Some(escaped) => {
                        name.push(escaped);
                        self.pos += 1;
                    }
                    None => return Err(self.err(ErrorCode::Name)),
                }
            } else {
                name.push(b);
                self.pos += 1;
            }
        }
        if self.pos == start {
            return Err(self.err(ErrorCode::Name));
        }
        // Escapes only ever drop ASCII backslashes out of valid UTF-8, so
        // this cannot fail unless an escape split a multi-byte character.
        String::from_utf8(name).map_err(|_| PathError::new(ErrorCode::Name, self.text, start))
    }

    /// Predicate ::= ('[' Expr ']')*
    ///
    /// Inner expressions accumulate on the expression stack; once the run
    /// of brackets ends, the top entries are drained into the predicate
    /// list in source order.
    fn parse_predicates(&mut self) -> Result<SmallVec<[Expr; 1]>, PathError> {
        let mut nexpr = 0usize;
        while self.match_byte(b'[') {
            self.parse_expr()?;
            nexpr += 1;
            if !self.match_byte(b']') {
                return Err(self.err(ErrorCode::Pred));
            }
            self.skipws();
        }
        if self.exprs.len() < nexpr {
            return Err(PathError::internal(self.text));
        }
        let split = self.exprs.len() - nexpr;
        Ok(self.exprs.drain(split..).collect())
    }

    /// Step ::= '.' | '..' | (AxisName '::')? (Name | '*') Predicate*
    fn parse_step(&mut self) -> Result<Step, PathError> {
        self.skipws();
        if self.cur() == Some(b'.') && self.cur_at(1) == Some(b'.') {
            self.pos += 2;
            return Ok(Step::with_axis(Axis::Parent));
        }
        if self.match_byte(b'.') {
            return Ok(Step::with_axis(Axis::SelfAxis));
        }

        let mut axis = Axis::Child;
        for candidate in Axis::ALL {
            if self.looking_at(candidate.name(), "::") {
                axis = candidate;
                break;
            }
        }

        let name = if self.match_byte(b'*') { None } else { Some(self.parse_name()?) };
        let predicates = self.parse_predicates()?;
        Ok(Step { axis, name, predicates })
    }

    /// RelativeLocationPath ::= Step (('/' | '//') Step)*
    ///
    /// `//` between steps expands to an inserted `descendant-or-self::*`
    /// step followed by the next step.
    fn parse_relative_location_path(&mut self) -> Result<LocPath, PathError> {
        let mut steps = vec![self.parse_step()?];
        while self.match_byte(b'/') {
            if self.cur() == Some(b'/') {
                self.pos += 1;
                steps.push(Step::abbreviated());
            }
            steps.push(self.parse_step()?);
        }
        Ok(LocPath { steps })
    }

    /// LocationPath ::= '//' RelativeLocationPath
    ///                | '/' RelativeLocationPath?
    ///                | RelativeLocationPath
    ///
    /// A leading `/` anchors the path with a synthetic `root` step; a
    /// leading `//` anchors it with `root` plus `descendant-or-self::*`.
    fn parse_location_path(&mut self) -> Result<(), PathError> {
        let locpath = if self.match_byte(b'/') {
            if self.cur() == Some(b'/') {
                self.pos += 1;
                let mut lp = self.parse_relative_location_path()?;
                lp.steps.insert(0, Step::abbreviated());
                lp.steps.insert(0, Step::with_axis(Axis::Root));
                lp
            } else if !self.at_end() {
                let mut lp = self.parse_relative_location_path()?;
                lp.steps.insert(0, Step::with_axis(Axis::Root));
                lp
            } else {
                LocPath { steps: vec![Step::with_axis(Axis::Root)] }
            }
        } else {
            self.parse_relative_location_path()?
        };
        self.exprs.push(Expr::new(ExprKind::LocPath(locpath)));
        Ok(())
    }

    /// Number ::= [0-9]+
    ///
    /// Values outside `0..=i32::MAX` are rejected; the cursor is not
    /// advanced on failure so the reported offset is the number's start.
    fn parse_number(&mut self) -> Result<(), PathError> {
        let bytes = self.text.as_bytes();
        let mut end = self.pos;
        while bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
        if end == self.pos {
            return Err(self.err(ErrorCode::Number));
        }
        let number = self.text[self.pos..end]
            .parse::<u64>()
            .ok()
            .and_then(|v| i32::try_from(v).ok())
            .ok_or_else(|| self.err(ErrorCode::Number))?;
        self.pos = end;

        let vind = self.state.intern(Value::Number(number));
        self.exprs.push(Expr::new(ExprKind::Value(vind)));
        Ok(())
    }

    /// Literal ::= '"' [^"]* '"' | '\'' [^']* '\''
    fn parse_literal(&mut self) -> Result<(), PathError> {
        let delim = match self.cur() {
            Some(b @ (b'"' | b'\'')) => b,
            _ => return Err(self.err(ErrorCode::Str)),
        };
        self.pos += 1;
        let start = self.pos;
        while self.cur().is_some_and(|b| b != delim) {
            self.pos += 1;
        }
        if self.cur() != Some(delim) {
            return Err(self.err(ErrorCode::Delim));
        }
        let literal = self.text[start..self.pos].to_string();
        self.pos += 1;

        let vind = self.state.intern(Value::Str(literal));
        self.exprs.push(Expr::new(ExprKind::Value(vind)));
        Ok(())
    }

    /// FunctionCall ::= Name '(' (Expr (',' Expr)*)? ')'
    ///
    /// Only built-in names are accepted. An arity mismatch surfaces as a
    /// delimiter error: the argument list ended too early or too late.
    fn parse_function_call(&mut self) -> Result<(), PathError> {
        let mut func = None;
        for candidate in Builtin::ALL {
            if self.looking_at(candidate.name(), "(") {
                func = Some(candidate);
            }
        }
        let Some(func) = func else {
            return Err(self.err(ErrorCode::Name));
        };

        let mut nargs = 0usize;
        if !self.match_byte(b')') {
            loop {
                nargs += 1;
                self.parse_expr()?;
                if !self.match_byte(b',') {
                    break;
                }
            }
            if !self.match_byte(b')') {
                return Err(self.err(ErrorCode::Delim));
            }
        }
        if nargs != func.arity() {
            return Err(self.err(ErrorCode::Delim));
        }

        if self.exprs.len() < nargs {
            return Err(PathError::internal(self.text));
        }
        let split = self.exprs.len() - nargs;
        let args: SmallVec<[Box<Expr>; 2]> = self.exprs.drain(split..).map(Box::new).collect();
        self.exprs.push(Expr::new(ExprKind::App { func, args }));
        Ok(())
    }

    /// PrimaryExpr ::= Literal | Number | FunctionCall
    fn parse_primary_expr(&mut self) -> Result<(), PathError> {
        if self.peek(b"'\"") {
            self.parse_literal()
        } else if self.peek(b"0123456789") {
            self.parse_number()
        } else {
            self.parse_function_call()
        }
    }

    /// A PathExpr is a PrimaryExpr iff the input continues with a quote, a
    /// digit, or letters followed by optional whitespace and `(`.
    fn looking_at_primary_expr(&self) -> bool {
        if self.peek(b"'\"0123456789") {
            return true;
        }
        let bytes = self.text.as_bytes();
        let mut p = self.pos;
        while bytes.get(p).is_some_and(|b| b.is_ascii_alphabetic()) {
            p += 1;
        }
        while bytes.get(p).is_some_and(|b| b.is_ascii_whitespace()) {
            p += 1;
        }
        bytes.get(p) == Some(&b'(')
    }

    /// PathExpr ::= LocationPath | PrimaryExpr
    ///
    /// The grammar is ambiguous here: `42` could be the number 42 or a
    /// step named `42`. A bare digit sequence always parses as a number;
    /// a numeric node name must be written as `./42` or `child::42`.
    fn parse_path_expr(&mut self) -> Result<(), PathError> {
        if self.looking_at_primary_expr() {
            self.parse_primary_expr()
        } else {
            self.parse_location_path()
        }
    }

    fn push_binary_op(&mut self, op: BinaryOp) -> Result<(), PathError> {
        let right = self.exprs.pop().ok_or_else(|| PathError::internal(self.text))?;
        let left = self.exprs.pop().ok_or_else(|| PathError::internal(self.text))?;
        self.exprs.push(Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }));
        Ok(())
    }

    /// MultiplicativeExpr ::= PathExpr ('*' PathExpr)*
    fn parse_multiplicative_expr(&mut self) -> Result<(), PathError> {
        self.parse_path_expr()?;
        while self.match_byte(b'*') {
            self.parse_path_expr()?;
            self.push_binary_op(BinaryOp::Star)?;
        }
        Ok(())
    }

    /// AdditiveExpr ::= MultiplicativeExpr (('+' | '-') MultiplicativeExpr)*
    fn parse_additive_expr(&mut self) -> Result<(), PathError> {
        self.parse_multiplicative_expr()?;
        while let Some(b @ (b'+' | b'-')) = self.cur() {
            self.pos += 1;
            self.skipws();
            self.parse_multiplicative_expr()?;
            self.push_binary_op(if b == b'+' { BinaryOp::Plus } else { BinaryOp::Minus })?;
        }
        Ok(())
    }

    /// EqualityExpr ::= AdditiveExpr (('=' | '!=') AdditiveExpr)?
    fn parse_equality_expr(&mut self) -> Result<(), PathError> {
        self.parse_additive_expr()?;
        let op = match (self.cur(), self.cur_at(1)) {
            (Some(b'='), _) => {
                self.pos += 1;
                BinaryOp::Eq
            }
            (Some(b'!'), Some(b'=')) => {
                self.pos += 2;
                BinaryOp::Neq
            }
            _ => return Ok(()),
        };
        self.skipws();
        self.parse_additive_expr()?;
        self.push_binary_op(op)
    }

    /// Expr ::= EqualityExpr
    fn parse_expr(&mut self) -> Result<(), PathError> {
        self.skipws();
        self.parse_equality_expr()
    }
}
