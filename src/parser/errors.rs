//! Diagnostics produced while parsing
//!
//! Every problem the front end finds becomes a [`Diagnostic`]: an
//! [`ErrorKind`], a [`SourceLocation`], a message and optionally the offending
//! lexeme or name. The driver collects them into [`ParseErrors`].
//!
//! Exit statuses follow the IFJ21 conventions: 1 for lexical errors, 2 for
//! syntax errors, 3 for undefined or redefined identifiers and 99 for
//! internal errors.

use super::ast::SourceLocation;
use super::lexer::LexError;
use super::symtable::SymbolError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    DuplicateSymbol,
    UndeclaredSymbol,
    /// Function definition disagrees with its earlier `global` declaration.
    ConflictingDeclaration,
    /// Scope nesting bug; never recoverable.
    ScopeUnderflow,
}

impl ErrorKind {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Lexical => 1,
            ErrorKind::Syntax => 2,
            ErrorKind::DuplicateSymbol
            | ErrorKind::UndeclaredSymbol
            | ErrorKind::ConflictingDeclaration => 3,
            ErrorKind::ScopeUnderflow => 99,
        }
    }

    pub fn is_fatal(self) -> bool {
        matches!(self, ErrorKind::ScopeUnderflow)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::DuplicateSymbol => "duplicate symbol",
            ErrorKind::UndeclaredSymbol => "undeclared symbol",
            ErrorKind::ConflictingDeclaration => "conflicting declaration",
            ErrorKind::ScopeUnderflow => "scope underflow",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {location}: {message}")]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub location: SourceLocation,
    pub message: String,
    /// Offending lexeme or identifier.
    pub subject: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, location: SourceLocation, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
            subject: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn syntax(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, location, message)
    }

    pub fn lexical(err: &LexError, location: SourceLocation) -> Self {
        Self::new(ErrorKind::Lexical, location, err.message.clone()).with_subject(err.lexeme.clone())
    }

    pub fn undeclared(name: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::UndeclaredSymbol,
            location,
            format!("'{}' is not declared", name),
        )
        .with_subject(name)
    }

    pub fn from_symbol_error(err: SymbolError, location: SourceLocation) -> Self {
        match err {
            SymbolError::DuplicateSymbol { ref name } => {
                Self::new(ErrorKind::DuplicateSymbol, location, err.to_string())
                    .with_subject(name.clone())
            }
            SymbolError::ScopeUnderflow | SymbolError::UnknownScope(_) => {
                Self::new(ErrorKind::ScopeUnderflow, location, err.to_string())
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

/// All diagnostics of one parse, in the order they were reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors(pub Vec<Diagnostic>);

impl ParseErrors {
    pub fn first(&self) -> Option<&Diagnostic> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.0.iter().any(|d| d.kind == kind)
    }

    /// Exit status of the first reported error.
    pub fn exit_code(&self) -> i32 {
        self.first().map_or(99, Diagnostic::exit_code)
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorKind::Lexical.exit_code(), 1);
        assert_eq!(ErrorKind::Syntax.exit_code(), 2);
        assert_eq!(ErrorKind::UndeclaredSymbol.exit_code(), 3);
        assert_eq!(ErrorKind::ConflictingDeclaration.exit_code(), 3);
        assert_eq!(ErrorKind::ScopeUnderflow.exit_code(), 99);
        assert!(ErrorKind::ScopeUnderflow.is_fatal());
        assert!(!ErrorKind::DuplicateSymbol.is_fatal());
    }

    #[test]
    fn test_symbol_error_conversion() {
        let loc = SourceLocation::new(4, 2);
        let diag = Diagnostic::from_symbol_error(
            SymbolError::DuplicateSymbol {
                name: "x".to_string(),
            },
            loc,
        );
        assert_eq!(diag.kind, ErrorKind::DuplicateSymbol);
        assert_eq!(diag.subject.as_deref(), Some("x"));
        assert_eq!(
            diag.to_string(),
            "duplicate symbol at line 4, column 2: 'x' is already defined in this scope"
        );

        let fatal = Diagnostic::from_symbol_error(SymbolError::ScopeUnderflow, loc);
        assert!(fatal.kind.is_fatal());
    }

    #[test]
    fn test_parse_errors_report_first_exit_code() {
        let loc = SourceLocation::new(1, 1);
        let errors = ParseErrors(vec![
            Diagnostic::undeclared("y", loc),
            Diagnostic::syntax(loc, "unexpected 'end'"),
        ]);
        assert_eq!(errors.exit_code(), 3);
        assert!(errors.has_kind(ErrorKind::Syntax));
        assert_eq!(errors.to_string().lines().count(), 2);
    }
}
