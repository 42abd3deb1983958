//! Expression parsing implementation
//!
//! Expressions are parsed by an operator-precedence automaton rather than by
//! recursive descent. The automaton keeps its own [`SymbolStack`] seeded with
//! a bottom sentinel and, at every step, looks up the relation between the
//! topmost terminal on the stack and the class of the current input token in
//! the static [`PRECEDENCE`] table:
//!
//! - [`Relation::Shift`]: mark the start of a new handle and push the input
//! - [`Relation::Equal`]: push the input into the current handle (`)` after `(`)
//! - [`Relation::Reduce`]: pop everything down to the handle marker and
//!   replace it with one expression
//! - [`Relation::Accept`]: the stack holds exactly one expression and the
//!   input cannot continue it
//! - [`Relation::Error`]: syntax error
//!
//! # Grammar
//!
//! ```text
//! E ::= i | ( E ) | # E | E op E
//! ```
//!
//! # Precedence (loosest first)
//!
//! | operators              | associativity |
//! |------------------------|---------------|
//! | `== ~= < <= > >=`      | none          |
//! | `..`                   | right         |
//! | `+ -`                  | left          |
//! | `* / //`               | left          |
//! | `#` (prefix)           | right         |
//!
//! # End of an expression
//!
//! The current token ends the expression (it is classed as [`TerminalClass::End`]
//! and left unconsumed) when it cannot appear in an expression, when it is a
//! `)` with no matching `(` in this expression, or when it is an operand, `(`
//! or `#` directly after an operand or `)`. The last rule is what separates
//! `x = a` from a following `y = b` in IFJ21, which has no statement
//! terminator.

use crate::parser::ast::*;
use crate::parser::errors::Diagnostic;
use crate::parser::lexer::{Keyword, Operator, Separator, Token, TokenKind};
use crate::parser::parse::{Bail, PResult, Parser};

/// Classes of terminals the precedence table is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalClass {
    /// `#`
    Length,
    /// `* / //`
    Multiplicative,
    /// `+ -`
    Additive,
    /// `..`
    Concat,
    /// `== ~= < <= > >=`
    Relational,
    LParen,
    RParen,
    /// identifier or literal
    Operand,
    /// stack bottom, or a token that ends the expression
    End,
}

impl TerminalClass {
    fn index(self) -> usize {
        self as usize
    }

    fn is_binary(self) -> bool {
        matches!(
            self,
            TerminalClass::Multiplicative
                | TerminalClass::Additive
                | TerminalClass::Concat
                | TerminalClass::Relational
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Shift,
    Reduce,
    Equal,
    Accept,
    Error,
}

const S: Relation = Relation::Shift;
const R: Relation = Relation::Reduce;
const Q: Relation = Relation::Equal;
const A: Relation = Relation::Accept;
const X: Relation = Relation::Error;

/// `PRECEDENCE[top][input]`, both indexed in [`TerminalClass`] order.
#[rustfmt::skip]
pub static PRECEDENCE: [[Relation; 9]; 9] = [
    //         #  mul add ..  rel  (   )   i   $
    /* #   */ [S,  R,  R,  R,  R,  S,  R,  S,  R],
    /* mul */ [S,  R,  R,  R,  R,  S,  R,  S,  R],
    /* add */ [S,  S,  R,  R,  R,  S,  R,  S,  R],
    /* ..  */ [S,  S,  S,  S,  R,  S,  R,  S,  R],
    /* rel */ [S,  S,  S,  S,  X,  S,  R,  S,  R],
    /* (   */ [S,  S,  S,  S,  S,  S,  Q,  S,  X],
    /* )   */ [X,  R,  R,  R,  R,  X,  R,  X,  R],
    /* i   */ [X,  R,  R,  R,  R,  X,  R,  X,  R],
    /* $   */ [S,  S,  S,  S,  S,  S,  X,  S,  A],
];

pub fn precedence(top: TerminalClass, input: TerminalClass) -> Relation {
    PRECEDENCE[top.index()][input.index()]
}

/// A shifted token together with its class.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminal {
    pub class: TerminalClass,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackSymbol {
    Bottom,
    /// Start of the handle that the next reduction will pop.
    HandleStart,
    Terminal(Terminal),
    Nonterminal(Expr),
}

/// Working stack of the precedence automaton.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolStack {
    items: Vec<StackSymbol>,
}

impl Default for SymbolStack {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolStack {
    pub fn new() -> Self {
        Self {
            items: vec![StackSymbol::Bottom],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn push(&mut self, symbol: StackSymbol) {
        self.items.push(symbol);
    }

    pub fn pop(&mut self) -> Option<StackSymbol> {
        self.items.pop()
    }

    /// Pop `count` symbols at once, oldest first. Leaves the stack untouched
    /// and returns `None` when it holds fewer than `count`.
    pub fn pop_many(&mut self, count: usize) -> Option<Vec<StackSymbol>> {
        let at = self.items.len().checked_sub(count)?;
        Some(self.items.split_off(at))
    }

    fn top_terminal_position(&self) -> Option<usize> {
        self.items
            .iter()
            .rposition(|sym| matches!(sym, StackSymbol::Terminal(_) | StackSymbol::Bottom))
    }

    /// Class of the topmost terminal; the bottom sentinel counts as `End`.
    pub fn top_terminal(&self) -> TerminalClass {
        match self.top_terminal_position().map(|i| &self.items[i]) {
            Some(StackSymbol::Terminal(term)) => term.class,
            _ => TerminalClass::End,
        }
    }

    /// Insert a handle marker directly above the topmost terminal, so that a
    /// nonterminal already sitting on top becomes part of the new handle.
    pub fn mark_handle(&mut self) {
        let at = self.top_terminal_position().map_or(0, |i| i + 1);
        self.items.insert(at, StackSymbol::HandleStart);
    }

    /// Pop the symbols above the topmost handle marker, and the marker.
    pub fn pop_handle(&mut self) -> Option<Vec<StackSymbol>> {
        let marker = self
            .items
            .iter()
            .rposition(|sym| matches!(sym, StackSymbol::HandleStart))?;
        let mut handle = self.pop_many(self.items.len() - marker)?;
        handle.remove(0);
        Some(handle)
    }

    /// The finished expression, if the stack is exactly `[bottom, E]`.
    pub fn into_expr(mut self) -> Option<Expr> {
        if self.items.len() != 2 {
            return None;
        }
        let top: [StackSymbol; 2] = self.pop_many(2)?.try_into().ok()?;
        match top {
            [StackSymbol::Bottom, StackSymbol::Nonterminal(expr)] => Some(expr),
            _ => None,
        }
    }
}

/// Right-hand sides the automaton knows how to reduce.
#[derive(Debug)]
enum Handle {
    Operand(Token),
    Group(Expr),
    Unary { op: Token, operand: Expr },
    Binary { left: Expr, op: Token, right: Expr },
}

impl Handle {
    fn recognise(symbols: Vec<StackSymbol>) -> Option<Handle> {
        use StackSymbol::{Nonterminal as N, Terminal as T};

        match symbols.len() {
            1 => {
                let [a]: [StackSymbol; 1] = symbols.try_into().ok()?;
                match a {
                    T(term) if term.class == TerminalClass::Operand => {
                        Some(Handle::Operand(term.token))
                    }
                    _ => None,
                }
            }
            2 => {
                let [a, b]: [StackSymbol; 2] = symbols.try_into().ok()?;
                match (a, b) {
                    (T(op), N(operand)) if op.class == TerminalClass::Length => Some(Handle::Unary {
                        op: op.token,
                        operand,
                    }),
                    _ => None,
                }
            }
            3 => {
                let [a, b, c]: [StackSymbol; 3] = symbols.try_into().ok()?;
                match (a, b, c) {
                    (T(open), N(inner), T(close))
                        if open.class == TerminalClass::LParen
                            && close.class == TerminalClass::RParen =>
                    {
                        Some(Handle::Group(inner))
                    }
                    (N(left), T(op), N(right)) if op.class.is_binary() => Some(Handle::Binary {
                        left,
                        op: op.token,
                        right,
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpressionStats {
    pub shifts: usize,
    pub reductions: usize,
}

/// A parsed expression plus the non-fatal errors found while parsing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    pub expr: Expr,
    /// Unresolved identifiers; the tree holds `Resolution::Unresolved` for each.
    pub errors: Vec<Diagnostic>,
    pub stats: ExpressionStats,
}

impl ExpressionResult {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Deepest expression tree the automaton will build. Trees are dropped,
/// printed and inspected recursively, so their height has to stay bounded.
pub const MAX_EXPRESSION_DEPTH: usize = 512;

/// Per-call state of one expression parse.
struct Automaton {
    stack: SymbolStack,
    errors: Vec<Diagnostic>,
    stats: ExpressionStats,
    /// Class of the most recently shifted terminal.
    last: Option<TerminalClass>,
    /// Open parentheses shifted and not yet closed.
    depth: usize,
    /// Tree height of every nonterminal on the stack, bottom first.
    heights: Vec<usize>,
}

/// Why the automaton stopped without an expression.
enum Abort {
    /// The parse is over; the reason is already recorded.
    Halt,
    /// A syntax error, plus the unresolved identifiers seen before it.
    Syntax {
        pending: Vec<Diagnostic>,
        diag: Diagnostic,
    },
}

impl From<Bail> for Abort {
    fn from(bail: Bail) -> Self {
        match bail {
            Bail::Halt => Abort::Halt,
            Bail::Error(diag) => Abort::Syntax {
                pending: Vec::new(),
                diag,
            },
        }
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    let TokenKind::Operator(op) = token.kind else {
        return None;
    };
    Some(match op {
        Operator::Plus => BinOp::Add,
        Operator::Minus => BinOp::Sub,
        Operator::Star => BinOp::Mul,
        Operator::Slash => BinOp::Div,
        Operator::SlashSlash => BinOp::IntDiv,
        Operator::DotDot => BinOp::Concat,
        Operator::EqEq => BinOp::Eq,
        Operator::NotEq => BinOp::Ne,
        Operator::Lt => BinOp::Lt,
        Operator::Le => BinOp::Le,
        Operator::Gt => BinOp::Gt,
        Operator::Ge => BinOp::Ge,
        Operator::Hash | Operator::Assign => return None,
    })
}

impl Parser {
    /// Parse one expression starting at the current token.
    ///
    /// Unresolved identifiers do not stop the parse; they come back in
    /// [`ExpressionResult::errors`]. A syntax error is returned as `Err`,
    /// and any unresolved identifiers seen before it are left in
    /// [`Parser::diagnostics`].
    ///
    /// When the parser has already stopped (for example after a lexical error
    /// under [`RecoveryPolicy::StopAtFirst`](crate::parser::RecoveryPolicy)),
    /// nothing is parsed and the most recent recorded diagnostic is returned.
    pub fn parse_expression(&mut self) -> Result<ExpressionResult, Diagnostic> {
        if self.should_stop() {
            return Err(self.halted());
        }
        match self.run_automaton() {
            Ok(result) => Ok(result),
            Err(Abort::Syntax { pending, diag }) => {
                self.record_all(pending);
                Err(diag)
            }
            Err(Abort::Halt) => Err(self.halted()),
        }
    }

    fn halted(&self) -> Diagnostic {
        self.diagnostics().last().cloned().unwrap_or_else(|| {
            Diagnostic::syntax(self.current_location(), "expression parsing halted")
        })
    }

    /// Expression followed by `, expression` repeats.
    pub(crate) fn parse_expression_list(&mut self) -> PResult<Vec<Expr>> {
        let mut exprs = vec![self.checked_expression()?];
        while self.eat_separator(Separator::Comma)? {
            exprs.push(self.checked_expression()?);
        }
        Ok(exprs)
    }

    /// Parse an expression and record its unresolved identifiers.
    pub(crate) fn checked_expression(&mut self) -> PResult<Expr> {
        let result = self.expression()?;
        self.report_all(result.errors)?;
        Ok(result.expr)
    }

    pub(crate) fn expression(&mut self) -> PResult<ExpressionResult> {
        match self.run_automaton() {
            Ok(result) => Ok(result),
            Err(Abort::Halt) => Err(Bail::Halt),
            Err(Abort::Syntax { pending, diag }) => Err(self.abandon(pending, diag)),
        }
    }

    fn run_automaton(&mut self) -> Result<ExpressionResult, Abort> {
        let start = self.current_location();
        let mut auto = Automaton {
            stack: SymbolStack::new(),
            errors: Vec::new(),
            stats: ExpressionStats::default(),
            last: None,
            depth: 0,
            heights: Vec::new(),
        };

        loop {
            let input = self.classify(auto.last, auto.depth);
            let top = auto.stack.top_terminal();

            match precedence(top, input) {
                Relation::Shift => {
                    auto.stack.mark_handle();
                    self.shift(&mut auto, input)?;
                }
                Relation::Equal => self.shift(&mut auto, input)?,
                Relation::Reduce => {
                    if let Err(diag) = self.reduce(&mut auto) {
                        return Err(Abort::Syntax {
                            pending: auto.errors,
                            diag,
                        });
                    }
                }
                Relation::Accept => {
                    let Automaton { stack, errors, stats, .. } = auto;
                    return match stack.into_expr() {
                        Some(expr) => {
                            tracing::trace!(%expr, shifts = stats.shifts, reductions = stats.reductions, "accept");
                            Ok(ExpressionResult { expr, errors, stats })
                        }
                        None => {
                            let diag = Diagnostic::syntax(
                                start,
                                format!("Expected expression, found {}", self.current),
                            );
                            Err(Abort::Syntax {
                                pending: errors,
                                diag,
                            })
                        }
                    };
                }
                Relation::Error => {
                    let message = match (top, input) {
                        (TerminalClass::Relational, TerminalClass::Relational) => {
                            "Comparison operators cannot be chained".to_string()
                        }
                        (TerminalClass::LParen, TerminalClass::End) => {
                            format!("Expected ')' in expression, found {}", self.current)
                        }
                        _ => format!("Unexpected {} in expression", self.current),
                    };
                    let diag = Diagnostic::syntax(self.current_location(), message)
                        .with_subject(self.current.to_string());
                    return Err(Abort::Syntax {
                        pending: auto.errors,
                        diag,
                    });
                }
            }
        }
    }

    /// Class of the current token in the current expression context.
    fn classify(&self, last: Option<TerminalClass>, depth: usize) -> TerminalClass {
        let class = match &self.current.kind {
            TokenKind::Ident(_)
            | TokenKind::Integer(_)
            | TokenKind::Number(_)
            | TokenKind::Str(_)
            | TokenKind::Keyword(Keyword::Nil) => TerminalClass::Operand,
            TokenKind::Operator(Operator::Hash) => TerminalClass::Length,
            TokenKind::Operator(Operator::Star | Operator::Slash | Operator::SlashSlash) => {
                TerminalClass::Multiplicative
            }
            TokenKind::Operator(Operator::Plus | Operator::Minus) => TerminalClass::Additive,
            TokenKind::Operator(Operator::DotDot) => TerminalClass::Concat,
            TokenKind::Operator(
                Operator::EqEq
                | Operator::NotEq
                | Operator::Lt
                | Operator::Le
                | Operator::Gt
                | Operator::Ge,
            ) => TerminalClass::Relational,
            TokenKind::Separator(Separator::LParen) => TerminalClass::LParen,
            TokenKind::Separator(Separator::RParen) if depth > 0 => TerminalClass::RParen,
            _ => TerminalClass::End,
        };

        let after_operand = matches!(last, Some(TerminalClass::Operand | TerminalClass::RParen));
        match class {
            TerminalClass::Operand | TerminalClass::LParen | TerminalClass::Length
                if after_operand =>
            {
                TerminalClass::End
            }
            other => other,
        }
    }

    fn shift(&mut self, auto: &mut Automaton, class: TerminalClass) -> PResult<()> {
        let token = self.advance()?;
        tracing::trace!(token = %token, ?class, "shift");
        match class {
            TerminalClass::LParen => auto.depth += 1,
            TerminalClass::RParen => auto.depth = auto.depth.saturating_sub(1),
            _ => {}
        }
        auto.last = Some(class);
        auto.stats.shifts += 1;
        auto.stack
            .push(StackSymbol::Terminal(Terminal { class, token }));
        Ok(())
    }

    fn reduce(&self, auto: &mut Automaton) -> Result<(), Diagnostic> {
        let incomplete = || {
            Diagnostic::syntax(
                self.current_location(),
                format!("Incomplete expression before {}", self.current),
            )
        };
        let symbols = auto.stack.pop_handle().ok_or_else(incomplete)?;
        let handle = Handle::recognise(symbols).ok_or_else(incomplete)?;

        let mut child = || auto.heights.pop().unwrap_or(1);
        let height = match &handle {
            Handle::Operand(_) => 1,
            Handle::Group(_) => child(),
            Handle::Unary { .. } => child() + 1,
            Handle::Binary { .. } => child().max(child()) + 1,
        };
        if height > MAX_EXPRESSION_DEPTH {
            return Err(Diagnostic::syntax(
                self.current_location(),
                format!(
                    "Expression too deeply nested (more than {} levels)",
                    MAX_EXPRESSION_DEPTH
                ),
            ));
        }

        let expr = match handle {
            Handle::Operand(token) => self.operand(token, &mut auto.errors),
            Handle::Group(inner) => inner,
            Handle::Unary { op, operand } => Expr::Unary {
                op: UnaryOp::Length,
                operand: Box::new(operand),
                location: op.location,
            },
            Handle::Binary { left, op, right } => {
                let bin = binary_op(&op).ok_or_else(incomplete)?;
                Expr::Binary {
                    op: bin,
                    left: Box::new(left),
                    right: Box::new(right),
                    location: op.location,
                }
            }
        };

        tracing::trace!(%expr, "reduce");
        auto.stats.reductions += 1;
        auto.stack.push(StackSymbol::Nonterminal(expr));
        auto.heights.push(height);
        Ok(())
    }

    /// Build a leaf. Identifiers are resolved here, variables before functions.
    fn operand(&self, token: Token, errors: &mut Vec<Diagnostic>) -> Expr {
        let location = token.location;
        let value = match token.kind {
            TokenKind::Integer(n) => Literal::Integer(n),
            TokenKind::Number(x) => Literal::Number(x),
            TokenKind::Str(s) => Literal::Str(s),
            TokenKind::Ident(name) => {
                let resolution = if let Some(handle) = self.symbols.find_variable(&name) {
                    match self.symbols.variable(handle) {
                        Some(var) => Resolution::Variable {
                            handle,
                            data_type: var.data_type,
                        },
                        None => Resolution::Unresolved,
                    }
                } else if let Some(handle) = self.symbols.find_function(&name) {
                    Resolution::Function(handle)
                } else {
                    errors.push(Diagnostic::undeclared(&name, location));
                    Resolution::Unresolved
                };
                return Expr::Name {
                    name,
                    resolution,
                    location,
                };
            }
            _ => Literal::Nil,
        };
        Expr::Literal { value, location }
    }

    /// Record the unresolved identifiers found so far, then hand back the
    /// syntax error that ended the expression.
    fn abandon(&mut self, pending: Vec<Diagnostic>, diag: Diagnostic) -> Bail {
        match self.report_all(pending) {
            Ok(()) => Bail::Error(diag),
            Err(halt) => halt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::errors::ErrorKind;
    use crate::parser::symtable::{ScopeKind, VariableRecord};

    fn parse(source: &str) -> Result<ExpressionResult, Diagnostic> {
        Parser::new(source).parse_expression()
    }

    fn render(source: &str) -> String {
        parse(source).unwrap().expr.to_string()
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(render("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(render("1 * 2 + 3"), "((1 * 2) + 3)");
    }

    #[test]
    fn test_left_associativity() {
        assert_eq!(render("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(render("8 // 2 / 2"), "((8 // 2) / 2)");
    }

    #[test]
    fn test_concat_is_right_associative() {
        assert_eq!(render("\"a\" .. \"b\" .. \"c\""), "(\"a\" .. (\"b\" .. \"c\"))");
    }

    #[test]
    fn test_relational_binds_loosest() {
        assert_eq!(render("1 + 2 < 3 * 4"), "((1 + 2) < (3 * 4))");
        assert_eq!(render("\"a\" .. \"b\" == \"ab\""), "((\"a\" .. \"b\") == \"ab\")");
    }

    #[test]
    fn test_relational_is_not_associative() {
        let err = parse("1 < 2 < 3").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_length_operator() {
        assert_eq!(render("#\"abc\" + 1"), "((#\"abc\") + 1)");
        assert_eq!(render("##\"x\""), "(#(#\"x\"))");
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(render("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(render("((nil))"), "nil");
    }

    #[test]
    fn test_expression_stops_before_next_statement() {
        let mut parser = Parser::new("1 + 2 y = 3");
        let result = parser.parse_expression().unwrap();
        assert_eq!(result.expr.to_string(), "(1 + 2)");
        assert!(matches!(&parser.current_token().kind, TokenKind::Ident(n) if n == "y"));
    }

    #[test]
    fn test_unmatched_rparen_ends_expression() {
        let mut parser = Parser::new("a_missing ) then");
        let result = parser.parse_expression().unwrap();
        assert!(parser.current_token().is_separator(Separator::RParen));
        assert!(result.has_errors());
    }

    #[test]
    fn test_undeclared_identifier_is_reported_but_parsed() {
        let result = parse("y + 1").unwrap();
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::UndeclaredSymbol);
        assert_eq!(result.errors[0].subject.as_deref(), Some("y"));
        assert!(result.expr.has_errors());
        assert_eq!(result.expr.to_string(), "(y + 1)");
    }

    #[test]
    fn test_every_undeclared_name_is_reported() {
        let result = parse("a * b + c").unwrap();
        let names: Vec<_> = result.errors.iter().filter_map(|e| e.subject.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_declared_variable_resolves() {
        let mut parser = Parser::new("x * 2");
        parser.symbols_mut().push_scope(ScopeKind::Function("main".to_string()));
        let handle = parser
            .symbols_mut()
            .insert_variable(VariableRecord::new("x", DataType::Number, SourceLocation::new(1, 1)))
            .unwrap();
        let result = parser.parse_expression().unwrap();
        assert!(result.errors.is_empty());
        match result.expr {
            Expr::Binary { left, .. } => assert_eq!(
                left.as_ref(),
                &Expr::Name {
                    name: "x".to_string(),
                    resolution: Resolution::Variable {
                        handle,
                        data_type: DataType::Number
                    },
                    location: SourceLocation::new(1, 1),
                }
            ),
            other => panic!("Expected binary expression, got {:?}", other),
        }
    }

    #[test]
    fn test_function_name_resolves_to_function() {
        let result = parse("readi").unwrap();
        assert!(matches!(
            result.expr,
            Expr::Name {
                resolution: Resolution::Function(_),
                ..
            }
        ));
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["1 +", "(1 + 2", "* 3", "", "then", "1 + )"] {
            let err = parse(source).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Syntax, "{source}");
        }
    }

    #[test]
    fn test_pending_undeclared_recorded_before_syntax_error() {
        let config = crate::parser::parse::ParserConfig::keep_going();
        let mut parser = Parser::with_config("z + (", config);
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].kind, ErrorKind::UndeclaredSymbol);
    }

    #[test]
    fn test_syntax_error_wins_over_pending_undeclared() {
        let mut parser = Parser::new("z + (");
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(parser.diagnostics().len(), 1);
        assert_eq!(parser.diagnostics()[0].kind, ErrorKind::UndeclaredSymbol);
    }

    #[test]
    fn test_lexical_error_in_first_token_stops_expression() {
        let mut parser = Parser::new("@ 1 + 2");
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(parser.diagnostics().len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = vec!["1"; MAX_EXPRESSION_DEPTH].join(" + ");
        assert!(parse(&at_limit).is_ok());

        let over = vec!["1"; MAX_EXPRESSION_DEPTH + 1].join(" + ");
        let err = parse(&over).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(err.message.contains("too deeply nested"));
    }

    #[test]
    fn test_stats_count_steps() {
        let result = parse("1 + 2").unwrap();
        assert_eq!(result.stats.shifts, 3);
        assert_eq!(result.stats.reductions, 3);
    }

    #[test]
    fn test_table_policy() {
        use TerminalClass::*;
        assert_eq!(precedence(Additive, Additive), Relation::Reduce);
        assert_eq!(precedence(Concat, Concat), Relation::Shift);
        assert_eq!(precedence(Relational, Relational), Relation::Error);
        assert_eq!(precedence(LParen, RParen), Relation::Equal);
        assert_eq!(precedence(End, End), Relation::Accept);
        assert_eq!(precedence(Length, Length), Relation::Shift);
    }

    #[test]
    fn test_stack_pop_many_is_atomic() {
        let mut stack = SymbolStack::new();
        stack.push(StackSymbol::HandleStart);
        assert!(stack.pop_many(3).is_none());
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop_many(2).map(|v| v.len()), Some(2));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_handle_marker_goes_below_nonterminal() {
        let mut stack = SymbolStack::new();
        stack.push(StackSymbol::Nonterminal(Expr::Literal {
            value: Literal::Nil,
            location: SourceLocation::new(1, 1),
        }));
        stack.mark_handle();
        assert_eq!(stack.top_terminal(), TerminalClass::End);
        let handle = stack.pop_handle().unwrap();
        assert_eq!(handle.len(), 1);
        assert!(matches!(handle[0], StackSymbol::Nonterminal(_)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_malformed_handle_is_rejected() {
        let token = Token::new(
            TokenKind::Operator(Operator::Plus),
            SourceLocation::new(1, 1),
        );
        let symbols = vec![StackSymbol::Terminal(Terminal {
            class: TerminalClass::Additive,
            token,
        })];
        assert!(Handle::recognise(symbols).is_none());
    }
}
