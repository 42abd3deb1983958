//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! token handling, diagnostics collection, error recovery and the program
//! entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a recursive descent driver over the statement grammar:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: global statements (`require`, `global`, `function`, calls)
//! - `statements`: statements inside function bodies and their scopes
//! - `expressions`: the operator-precedence (shift/reduce) expression engine
//!
//! Parser methods are split across those files using `impl Parser` blocks.
//!
//! # Error Recovery
//!
//! Lexical error tokens are skipped by [`Parser::advance`] and recorded as
//! diagnostics. Other errors travel up as [`Bail::Error`] to the enclosing
//! statement loop, which records them and resynchronises on the next token
//! that can start a statement. With [`RecoveryPolicy::StopAtFirst`], or once
//! `max_errors` diagnostics are recorded, recording an error turns into
//! [`Bail::Halt`] and the whole parse unwinds.

use crate::parser::ast::*;
use crate::parser::errors::{Diagnostic, ErrorKind, ParseErrors};
use crate::parser::lexer::{Keyword, Lexer, Operator, Separator, Token, TokenKind};
use crate::parser::symtable::{SymbolError, SymbolTable};

/// What to do after a non-fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Stop at the first diagnostic of any kind.
    #[default]
    StopAtFirst,
    /// Record the error, skip to the next statement and keep going.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub recovery: RecoveryPolicy,
    /// Stop once this many diagnostics have been recorded.
    pub max_errors: usize,
    /// Pre-declare the runtime functions (`write`, `reads`, ...).
    pub builtins: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            recovery: RecoveryPolicy::StopAtFirst,
            max_errors: 64,
            builtins: true,
        }
    }
}

impl ParserConfig {
    pub fn keep_going() -> Self {
        Self {
            recovery: RecoveryPolicy::Continue,
            ..Self::default()
        }
    }
}

/// Why a parsing routine gave up.
#[derive(Debug)]
pub(crate) enum Bail {
    /// Not yet recorded; the enclosing statement loop records it and recovers.
    Error(Diagnostic),
    /// Already recorded; unwind the whole parse.
    Halt,
}

impl From<Diagnostic> for Bail {
    fn from(diag: Diagnostic) -> Self {
        Bail::Error(diag)
    }
}

pub(crate) type PResult<T> = Result<T, Bail>;

/// Recursive descent parser for IFJ21 programs
pub struct Parser {
    lexer: Lexer,
    pub(crate) current: Token,
    pub(crate) previous_location: SourceLocation,
    pub(crate) symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    config: ParserConfig,
    /// Tokens consumed so far; lets recovery tell whether it made progress.
    pub(crate) consumed: usize,
    /// Name of the function whose body is being parsed.
    pub(crate) function: Option<String>,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Self::with_config(source, ParserConfig::default())
    }

    pub fn with_config(source: &str, config: ParserConfig) -> Self {
        let symbols = if config.builtins {
            SymbolTable::with_builtins()
        } else {
            SymbolTable::new()
        };
        let mut parser = Self {
            lexer: Lexer::new(source),
            current: Token::new(TokenKind::Eof, SourceLocation::new(1, 1)),
            previous_location: SourceLocation::new(1, 1),
            symbols,
            diagnostics: Vec::new(),
            config,
            consumed: 0,
            function: None,
        };
        parser.current = parser.next_valid_token();
        parser.consumed = 0;
        parser
    }

    /// Parse the entire program (global statements up to end of file)
    pub fn parse_program(&mut self) -> Result<Program, ParseErrors> {
        let mut program = Program::new();

        match self.parse_global_statements(&mut program) {
            Ok(()) | Err(Bail::Halt) => {}
            Err(Bail::Error(diag)) => self.diagnostics.push(diag),
        }

        if self.diagnostics.is_empty() {
            tracing::debug!(statements = program.body.len(), "program parsed");
            Ok(program)
        } else {
            tracing::debug!(errors = self.diagnostics.len(), "program rejected");
            Err(ParseErrors(self.diagnostics.clone()))
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTable {
        &mut self.symbols
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// The token the parser is looking at.
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    // ===== Token handling =====

    /// Pull the next token that is not a lexical error. Error tokens are
    /// recorded as diagnostics on the way.
    fn next_valid_token(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            match token.kind {
                TokenKind::Error(ref err) => {
                    let diag = Diagnostic::lexical(err, token.location);
                    tracing::debug!(%diag, "skipping invalid token");
                    self.diagnostics.push(diag);
                }
                _ => return token,
            }
        }
    }

    /// Move to the next token and return the one just consumed. Fails with
    /// [`Bail::Halt`] when a skipped lexical error ends the parse.
    pub(crate) fn advance(&mut self) -> PResult<Token> {
        let before = self.diagnostics.len();
        let next = self.next_valid_token();
        let token = std::mem::replace(&mut self.current, next);
        self.previous_location = token.location;
        self.consumed += 1;
        if self.diagnostics.len() > before && self.should_stop() {
            return Err(Bail::Halt);
        }
        Ok(token)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.is_eof()
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current.is_keyword(keyword)
    }

    pub(crate) fn check_separator(&self, separator: Separator) -> bool {
        self.current.is_separator(separator)
    }

    pub(crate) fn check_operator(&self, operator: Operator) -> bool {
        self.current.is_operator(operator)
    }

    pub(crate) fn eat_separator(&mut self, separator: Separator) -> PResult<bool> {
        if self.check_separator(separator) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> PResult<bool> {
        if self.check_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword, ctx: &str) -> PResult<()> {
        if self.eat_keyword(keyword)? {
            Ok(())
        } else {
            Err(self.unexpected(&format!("Expected '{}' {}", keyword.as_str(), ctx)))
        }
    }

    pub(crate) fn expect_separator(&mut self, separator: Separator, ctx: &str) -> PResult<()> {
        if self.eat_separator(separator)? {
            Ok(())
        } else {
            Err(self.unexpected(&format!("Expected '{}' {}", separator.as_str(), ctx)))
        }
    }

    pub(crate) fn expect_operator(&mut self, operator: Operator, ctx: &str) -> PResult<()> {
        if self.check_operator(operator) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.unexpected(&format!("Expected '{}' {}", operator.as_str(), ctx)))
        }
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> PResult<(String, SourceLocation)> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let name = name.clone();
            let location = self.current.location;
            self.advance()?;
            Ok((name, location))
        } else {
            Err(self.unexpected(&format!("Expected identifier {}", ctx)))
        }
    }

    pub(crate) fn expect_string(&mut self, ctx: &str) -> PResult<String> {
        if let TokenKind::Str(text) = &self.current.kind {
            let text = text.clone();
            self.advance()?;
            Ok(text)
        } else {
            Err(self.unexpected(&format!("Expected string literal {}", ctx)))
        }
    }

    /// `integer`, `number` or `string`.
    pub(crate) fn expect_type(&mut self, ctx: &str) -> PResult<DataType> {
        let declared = match &self.current.kind {
            TokenKind::Keyword(kw) if *kw != Keyword::Nil => kw.data_type(),
            _ => None,
        };
        match declared {
            Some(data_type) => {
                self.advance()?;
                Ok(data_type)
            }
            None => Err(self.unexpected(&format!("Expected type {}", ctx))),
        }
    }

    /// Syntax error pointing at the current token.
    pub(crate) fn unexpected(&self, message: &str) -> Bail {
        Bail::Error(
            Diagnostic::syntax(
                self.current_location(),
                format!("{}, found {}", message, self.current),
            )
            .with_subject(self.current.to_string()),
        )
    }

    // ===== Diagnostics and recovery =====

    /// Record a diagnostic. Fails with [`Bail::Halt`] when the parse has to stop.
    pub(crate) fn report(&mut self, diag: Diagnostic) -> PResult<()> {
        tracing::debug!(%diag, "reported");
        let fatal = diag.kind.is_fatal();
        self.diagnostics.push(diag);
        if fatal || self.should_stop() {
            Err(Bail::Halt)
        } else {
            Ok(())
        }
    }

    /// Record diagnostics without checking whether the parse has to stop.
    pub(crate) fn record_all(&mut self, diags: Vec<Diagnostic>) {
        self.diagnostics.extend(diags);
    }

    pub(crate) fn report_all(&mut self, diags: Vec<Diagnostic>) -> PResult<()> {
        for diag in diags {
            self.report(diag)?;
        }
        Ok(())
    }

    pub(crate) fn symbol_error(&self, err: SymbolError, location: SourceLocation) -> Bail {
        Bail::Error(Diagnostic::from_symbol_error(err, location))
    }

    pub(crate) fn should_stop(&self) -> bool {
        match self.config.recovery {
            RecoveryPolicy::StopAtFirst => !self.diagnostics.is_empty(),
            RecoveryPolicy::Continue => self.diagnostics.len() >= self.config.max_errors.max(1),
        }
    }

    /// Record a failure inside a statement that can still be parsed to its end.
    pub(crate) fn absorb(&mut self, bail: Bail) -> PResult<()> {
        match bail {
            Bail::Halt => Err(Bail::Halt),
            Bail::Error(diag) => self.report(diag),
        }
    }

    /// Handle a failed statement: halts propagate and errors are recorded.
    /// After a lexical or syntax error the parser skips ahead to something
    /// that can start a statement; other errors are raised once the statement
    /// is complete, so parsing resumes where it stands.
    pub(crate) fn recover(&mut self, bail: Bail, start: usize) -> PResult<()> {
        match bail {
            Bail::Halt => Err(Bail::Halt),
            Bail::Error(diag) => {
                let skip = matches!(diag.kind, ErrorKind::Lexical | ErrorKind::Syntax);
                self.report(diag)?;
                self.synchronize(start, skip)
            }
        }
    }

    /// Skip tokens until one can start or close a statement. Always consumes
    /// at least one token when the failed statement consumed none, so the
    /// statement loops cannot spin.
    fn synchronize(&mut self, start: usize, skip: bool) -> PResult<()> {
        if self.consumed == start && !self.is_at_end() {
            self.advance()?;
        }
        while skip && !self.is_at_end() && !self.at_sync_point() {
            self.advance()?;
        }
        tracing::trace!(token = %self.current, "resynchronised");
        Ok(())
    }

    fn at_sync_point(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Keyword(
                Keyword::Local
                    | Keyword::If
                    | Keyword::While
                    | Keyword::Return
                    | Keyword::End
                    | Keyword::Else
                    | Keyword::Function
                    | Keyword::Global
                    | Keyword::Require
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_program() {
        let mut parser = Parser::new("");
        let program = parser.parse_program().unwrap();
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_parse_simple_function() {
        let source = "require \"ifj21\"\nfunction main()\n  local x : integer = 1 + 2 * 3\nend\nmain()";
        let mut parser = Parser::new(source);
        let program = parser.parse_program().unwrap();

        assert_eq!(program.body.len(), 3);
        match &program.body[1] {
            Stmt::FunctionDef {
                name,
                params,
                returns,
                body,
                ..
            } => {
                assert_eq!(name, "main");
                assert!(params.is_empty());
                assert!(returns.is_empty());
                assert_eq!(body.len(), 1);
            }
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    #[test]
    fn test_lexical_error_stops_by_default() {
        let mut parser = Parser::new("require \"ifj21\" @ function f() end");
        let errors = parser.parse_program().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.exit_code(), 1);
    }

    #[test]
    fn test_keep_going_collects_several_errors() {
        let source = "function f()\n local a : integer = b\n local c : integer = d\nend";
        let mut parser = Parser::with_config(source, ParserConfig::keep_going());
        let errors = parser.parse_program().unwrap_err();
        let names: Vec<_> = errors.iter().filter_map(|d| d.subject.as_deref()).collect();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn test_max_errors_caps_collection() {
        let source = "function f()\n x = 1\n y = 2\n z = 3\nend";
        let config = ParserConfig {
            max_errors: 2,
            ..ParserConfig::keep_going()
        };
        let mut parser = Parser::with_config(source, config);
        let errors = parser.parse_program().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_builtins_can_be_disabled() {
        let config = ParserConfig {
            builtins: false,
            ..ParserConfig::default()
        };
        let mut parser = Parser::with_config("write(1)", config);
        let errors = parser.parse_program().unwrap_err();
        assert_eq!(errors.first().unwrap().kind, ErrorKind::UndeclaredSymbol);

        let mut parser = Parser::new("write(1)");
        assert!(parser.parse_program().is_ok());
    }
}
