//! Statement parsing implementation
//!
//! This module handles the statements allowed inside function bodies:
//!
//! - Variable declarations: `local x : integer = 42`
//! - Control flow: `if ... then ... else ... end`, `while ... do ... end`
//! - `return` with an optional expression list
//! - Function calls and (multiple) assignments
//!
//! # Grammar
//!
//! ```text
//! block    ::= local_st* ('return' exprs?)?
//! local_st ::= 'local' ID ':' type ('=' rvalue)?
//!            | 'if' expr 'then' block ('else' block)? 'end'
//!            | 'while' expr 'do' block 'end'
//!            | ID '(' args ')'
//!            | ID (',' ID)* '=' rvalue
//! rvalue   ::= ID '(' args ')' | expr (',' expr)*
//! ```
//!
//! Every `if` branch, `else` branch and `while` body gets its own scope,
//! opened and closed through [`Parser::in_scope`].
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::errors::{Diagnostic, ErrorKind};
use crate::parser::lexer::{Keyword, Operator, Separator, TokenKind};
use crate::parser::parse::{Bail, PResult, Parser};
use crate::parser::symtable::{ScopeKind, SymbolHandle, VariableRecord};

impl Parser {
    /// Run `body` inside a fresh scope. The scope is popped whether or not
    /// `body` succeeds.
    pub(crate) fn in_scope<T>(
        &mut self,
        kind: ScopeKind,
        body: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        let id = self.symbols.push_scope(kind);
        let result = body(self);
        match self.symbols.pop_scope() {
            Ok(scope) if scope.id() == id => result,
            Ok(scope) => {
                let diag = Diagnostic::new(
                    ErrorKind::ScopeUnderflow,
                    self.previous_location,
                    format!("closed scope {} while expecting scope {}", scope.id(), id),
                );
                self.report(diag)?;
                Err(Bail::Halt)
            }
            Err(err) => {
                self.report(Diagnostic::from_symbol_error(err, self.previous_location))?;
                Err(Bail::Halt)
            }
        }
    }

    /// Statements up to (not including) `end`, `else`, end of file or a
    /// global statement keyword. A `return` always ends the block.
    pub(crate) fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        let mut body = Vec::new();
        while !self.at_block_end() {
            let start = self.consumed;
            match self.parse_local_statement() {
                Ok(stmt) => {
                    let returned = matches!(stmt, Stmt::Return { .. });
                    body.push(stmt);
                    if returned {
                        break;
                    }
                }
                Err(bail) => self.recover(bail, start)?,
            }
        }
        Ok(body)
    }

    fn at_block_end(&self) -> bool {
        self.is_at_end()
            || matches!(
                self.current.kind,
                TokenKind::Keyword(
                    Keyword::End
                        | Keyword::Else
                        | Keyword::Function
                        | Keyword::Global
                        | Keyword::Require
                )
            )
    }

    fn parse_local_statement(&mut self) -> PResult<Stmt> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Local) => self.parse_local_declaration(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Ident(_) => self.parse_call_or_assignment(),
            _ => Err(self.unexpected("Expected statement")),
        }
    }

    /// `local name : type [= rvalue]`
    ///
    /// The initialiser is parsed before the name is declared, so it still
    /// sees any outer variable of the same name.
    fn parse_local_declaration(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let (name, name_location) = self.expect_identifier("after 'local'")?;
        self.expect_separator(Separator::Colon, "after variable name")?;
        let data_type = self.expect_type("in variable declaration")?;

        let init = if self.check_operator(Operator::Assign) {
            self.advance()?;
            Some(self.parse_rvalue()?)
        } else {
            None
        };

        let handle = self.declare_variable(&name, data_type, name_location, init.is_some())?;
        Ok(Stmt::Local {
            name,
            data_type,
            init,
            handle,
            location,
        })
    }

    /// Declare a variable in the innermost scope. Names of functions,
    /// including the one being defined, are off limits.
    pub(crate) fn declare_variable(
        &mut self,
        name: &str,
        data_type: DataType,
        location: SourceLocation,
        initialized: bool,
    ) -> PResult<SymbolHandle> {
        if self.symbols.find_function(name).is_some() || self.function.as_deref() == Some(name) {
            return Err(Diagnostic::new(
                ErrorKind::DuplicateSymbol,
                location,
                format!("'{}' is already the name of a function", name),
            )
            .with_subject(name)
            .into());
        }
        let mut record = VariableRecord::new(name, data_type, location);
        record.initialized = initialized;
        self.symbols
            .insert_variable(record)
            .map_err(|err| self.symbol_error(err, location))
    }

    fn parse_if_statement(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let condition = self.checked_expression()?;
        self.expect_keyword(Keyword::Then, "after if condition")?;
        let then_body = self.in_scope(ScopeKind::If, |p| p.parse_block())?;
        let else_body = if self.eat_keyword(Keyword::Else)? {
            Some(self.in_scope(ScopeKind::Else, |p| p.parse_block())?)
        } else {
            None
        };
        self.expect_keyword(Keyword::End, "to close if statement")?;
        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
            location,
        })
    }

    fn parse_while_statement(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let condition = self.checked_expression()?;
        self.expect_keyword(Keyword::Do, "after while condition")?;
        let body = self.in_scope(ScopeKind::While, |p| p.parse_block())?;
        self.expect_keyword(Keyword::End, "to close while loop")?;
        Ok(Stmt::While {
            condition,
            body,
            location,
        })
    }

    fn parse_return_statement(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let values = if self.starts_expression() {
            self.parse_expression_list()?
        } else {
            Vec::new()
        };
        Ok(Stmt::Return { values, location })
    }

    fn starts_expression(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Ident(_)
                | TokenKind::Integer(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::Keyword(Keyword::Nil)
                | TokenKind::Operator(Operator::Hash)
                | TokenKind::Separator(Separator::LParen)
        )
    }

    /// `name(args)` or `name {, name} = rvalue`
    fn parse_call_or_assignment(&mut self) -> PResult<Stmt> {
        let (name, location) = self.expect_identifier("at start of statement")?;
        if self.check_separator(Separator::LParen) {
            return Ok(Stmt::Call(self.parse_call(name, location)?));
        }

        let mut targets = vec![self.assignment_target(name, location)?];
        while self.eat_separator(Separator::Comma)? {
            let (name, location) = self.expect_identifier("in assignment target list")?;
            targets.push(self.assignment_target(name, location)?);
        }
        self.expect_operator(Operator::Assign, "in assignment")?;
        let value = self.parse_rvalue()?;

        for handle in targets.iter().filter_map(|(_, handle)| *handle) {
            self.symbols.mark_initialized(handle);
        }
        Ok(Stmt::Assign {
            targets,
            value,
            location,
        })
    }

    /// Resolve one assignment target. An unknown name is recorded and the
    /// statement is still parsed.
    fn assignment_target(
        &mut self,
        name: String,
        location: SourceLocation,
    ) -> PResult<(String, Option<SymbolHandle>)> {
        let handle = self.symbols.find_variable(&name);
        if handle.is_none() {
            self.report(Diagnostic::undeclared(&name, location))?;
        }
        Ok((name, handle))
    }

    /// A call to a known function, or an expression list.
    pub(crate) fn parse_rvalue(&mut self) -> PResult<RValue> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let is_call = self.symbols.find_variable(name).is_none()
                && self.symbols.find_function(name).is_some();
            if is_call {
                let (name, location) = self.expect_identifier("")?;
                return Ok(RValue::Call(self.parse_call(name, location)?));
            }
        }
        Ok(RValue::Exprs(self.parse_expression_list()?))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::errors::ErrorKind;
    use crate::parser::parse::{Parser, ParserConfig};

    fn body_of(source: &str) -> Vec<Stmt> {
        let source = format!("function main()\n{}\nend", source);
        let mut parser = Parser::new(&source);
        let mut program = parser.parse_program().expect("Parsing failed");
        match program.body.pop() {
            Some(Stmt::FunctionDef { body, .. }) => body,
            other => panic!("Expected function definition, got {:?}", other),
        }
    }

    fn first_error(source: &str) -> ErrorKind {
        let source = format!("function main()\n{}\nend", source);
        Parser::new(&source).parse_program().unwrap_err().first().unwrap().kind
    }

    #[test]
    fn test_local_with_initialiser() {
        let body = body_of("local x : integer = 1 + 2 * 3");
        match &body[0] {
            Stmt::Local {
                name,
                data_type,
                init: Some(RValue::Exprs(exprs)),
                ..
            } => {
                assert_eq!(name, "x");
                assert_eq!(*data_type, DataType::Integer);
                assert_eq!(exprs[0].to_string(), "(1 + (2 * 3))");
            }
            other => panic!("Expected local declaration, got {:?}", other),
        }
    }

    #[test]
    fn test_initialiser_sees_outer_variable() {
        let body = body_of("local x : integer = 1\nwhile x < 3 do\n local x : integer = x + 1\nend");
        match &body[1] {
            Stmt::While { body, .. } => match &body[0] {
                Stmt::Local {
                    init: Some(RValue::Exprs(exprs)),
                    ..
                } => match &exprs[0] {
                    Expr::Binary { left, .. } => {
                        assert!(matches!(
                            left.as_ref(),
                            Expr::Name {
                                resolution: Resolution::Variable { .. },
                                ..
                            }
                        ));
                    }
                    other => panic!("Expected binary, got {:?}", other),
                },
                other => panic!("Expected local, got {:?}", other),
            },
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_without_outer_is_undeclared() {
        assert_eq!(first_error("local y : integer = y"), ErrorKind::UndeclaredSymbol);
    }

    #[test]
    fn test_redeclaration_in_same_block() {
        assert_eq!(
            first_error("local a : string\nlocal a : string"),
            ErrorKind::DuplicateSymbol
        );
    }

    #[test]
    fn test_variable_named_like_function() {
        assert_eq!(first_error("local write : integer"), ErrorKind::DuplicateSymbol);
        assert_eq!(first_error("local main : integer"), ErrorKind::DuplicateSymbol);
    }

    #[test]
    fn test_if_branches_have_own_scopes() {
        let source = "function main()\n\
                      if 1 == 1 then local t : integer = 1 else local t : integer = 2 end\n\
                      t = 3\nend";
        let errors = Parser::new(source).parse_program().unwrap_err();
        let first = errors.first().unwrap();
        assert_eq!(first.kind, ErrorKind::UndeclaredSymbol);
        assert_eq!(first.subject.as_deref(), Some("t"));
    }

    #[test]
    fn test_multiple_assignment() {
        let body = body_of("local a : integer\nlocal b : integer\na, b = 1, 2");
        match &body[2] {
            Stmt::Assign { targets, value, .. } => {
                assert_eq!(targets.len(), 2);
                assert!(targets.iter().all(|(_, h)| h.is_some()));
                assert!(matches!(value, RValue::Exprs(v) if v.len() == 2));
            }
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_from_call() {
        let body = body_of("local s : string\ns = reads()");
        assert!(matches!(&body[1], Stmt::Assign { value: RValue::Call(c), .. } if c.name == "reads"));
    }

    #[test]
    fn test_statements_without_separators() {
        let body = body_of("local a : integer = 1 local b : integer = a a = b b = a");
        assert_eq!(body.len(), 4);
    }

    #[test]
    fn test_return_must_end_block() {
        assert_eq!(first_error("return 1\nwrite(1)"), ErrorKind::Syntax);
        let body = body_of("return");
        assert!(matches!(&body[0], Stmt::Return { values, .. } if values.is_empty()));
    }

    #[test]
    fn test_while_loop() {
        let body = body_of("local i : integer = 0\nwhile i < 10 do\n i = i + 1\nend");
        assert!(matches!(&body[1], Stmt::While { body, .. } if body.len() == 1));
    }

    #[test]
    fn test_scopes_balanced_after_errors() {
        let source = "function main()\n\
                      while 1 do local x : integer = ( end\n\
                      if x then end\nend";
        let mut parser = Parser::with_config(source, ParserConfig::keep_going());
        assert!(parser.parse_program().is_err());
        assert_eq!(parser.symbols().depth(), 0);
    }

    #[test]
    fn test_missing_then() {
        assert_eq!(first_error("if 1 < 2 write(1) end"), ErrorKind::Syntax);
    }
}
