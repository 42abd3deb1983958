//! Global statement parsing
//!
//! Handles everything that may appear at the top level of a program:
//!
//! ```text
//! global_st ::= 'require' STRING
//!             | 'function' ID '(' params ')' returns block 'end'
//!             | 'global' ID ':' 'function' '(' types? ')' returns
//!             | ID '(' args ')'
//! params    ::= (ID ':' type (',' ID ':' type)*)?
//! returns   ::= (':' type (',' type)*)?
//! ```
//!
//! Functions are entered into the global scope of the symbol table as soon as
//! their header is parsed, so a body may call its own function. A `global`
//! declaration may be followed by exactly one definition with the same
//! signature.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::errors::{Diagnostic, ErrorKind};
use crate::parser::lexer::{Keyword, Separator, TokenKind};
use crate::parser::parse::{Bail, PResult, Parser};
use crate::parser::symtable::{FunctionRecord, ScopeKind, Symbol, SymbolHandle};

/// What the symbol table knew about a function when its definition started.
#[derive(Debug, Clone, Copy)]
enum Prior {
    Unknown,
    Declared(SymbolHandle),
    /// Redefinition; already reported.
    Defined,
}

impl Parser {
    /// Parse global statements until end of file, recovering after errors.
    pub(crate) fn parse_global_statements(&mut self, program: &mut Program) -> PResult<()> {
        while !self.is_at_end() {
            if self.should_stop() {
                return Err(Bail::Halt);
            }
            let start = self.consumed;
            match self.parse_global_statement() {
                Ok(stmt) => program.body.push(stmt),
                Err(bail) => self.recover(bail, start)?,
            }
        }
        Ok(())
    }

    fn parse_global_statement(&mut self) -> PResult<Stmt> {
        match &self.current.kind {
            TokenKind::Keyword(Keyword::Require) => self.parse_require(),
            TokenKind::Keyword(Keyword::Function) => self.parse_function_definition(),
            TokenKind::Keyword(Keyword::Global) => self.parse_function_declaration(),
            TokenKind::Ident(_) => {
                let (name, location) = self.expect_identifier("")?;
                Ok(Stmt::Call(self.parse_call(name, location)?))
            }
            _ => Err(self.unexpected(
                "Expected 'require', 'function', 'global' or a function call",
            )),
        }
    }

    /// `require "module"`
    fn parse_require(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let module = self.expect_string("after 'require'")?;
        tracing::debug!(%module, "require");
        Ok(Stmt::Require { module, location })
    }

    /// `global name : function(types) : types`
    fn parse_function_declaration(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let (name, name_location) = self.expect_identifier("after 'global'")?;
        self.expect_separator(Separator::Colon, "after declared name")?;
        self.expect_keyword(Keyword::Function, "in function declaration")?;
        self.expect_separator(Separator::LParen, "before parameter types")?;
        let params = if self.check_separator(Separator::RParen) {
            Vec::new()
        } else {
            self.parse_type_list("in parameter types")?
        };
        self.expect_separator(Separator::RParen, "after parameter types")?;
        let returns = self.parse_return_types()?;

        let record =
            FunctionRecord::new(&name, params.clone(), returns.clone()).declared_at(name_location);
        self.symbols
            .insert_function(record)
            .map_err(|err| self.symbol_error(err, name_location))?;
        tracing::debug!(%name, "function declared");

        Ok(Stmt::FunctionDecl {
            name,
            params,
            returns,
            location,
        })
    }

    /// `function name(params) : types body end`
    fn parse_function_definition(&mut self) -> PResult<Stmt> {
        let location = self.current_location();
        self.advance()?;
        let (name, name_location) = self.expect_identifier("after 'function'")?;

        let declared = self.symbols.find_function(&name);
        let redefined = declared
            .and_then(|handle| self.symbols.function(handle))
            .is_some_and(|f| f.defined);
        if redefined {
            // The body is still parsed so later errors are found.
            self.report(
                Diagnostic::new(
                    ErrorKind::DuplicateSymbol,
                    name_location,
                    format!("function '{}' is already defined", name),
                )
                .with_subject(name.as_str()),
            )?;
        }

        self.in_scope(ScopeKind::Function(name.clone()), |p| {
            let outer = p.function.replace(name.clone());
            let prior = match declared {
                _ if redefined => Prior::Defined,
                Some(handle) => Prior::Declared(handle),
                None => Prior::Unknown,
            };
            let result = p.parse_function_rest(name, name_location, prior, location);
            p.function = outer;
            result
        })
    }

    fn parse_function_rest(
        &mut self,
        name: String,
        name_location: SourceLocation,
        prior: Prior,
        location: SourceLocation,
    ) -> PResult<Stmt> {
        self.expect_separator(Separator::LParen, "after function name")?;
        let params = self.parse_params()?;
        self.expect_separator(Separator::RParen, "after parameters")?;
        let returns = self.parse_return_types()?;
        let param_types: Vec<DataType> = params.iter().map(|p| p.data_type).collect();

        match prior {
            Prior::Defined => {}
            Prior::Declared(handle) => {
                let matches = self
                    .symbols
                    .function(handle)
                    .is_some_and(|f| f.signature_matches(&param_types, &returns));
                if matches {
                    if let Some(Symbol::Function(func)) = self.symbols.get_mut(handle) {
                        func.defined = true;
                    }
                } else {
                    self.report(
                        Diagnostic::new(
                            ErrorKind::ConflictingDeclaration,
                            name_location,
                            format!("definition of '{}' does not match its declaration", name),
                        )
                        .with_subject(name.as_str()),
                    )?;
                }
            }
            Prior::Unknown => {
                let record = FunctionRecord::new(&name, param_types, returns.clone())
                    .declared_at(name_location)
                    .defined();
                self.symbols
                    .insert_function(record)
                    .map_err(|err| self.symbol_error(err, name_location))?;
            }
        }
        tracing::debug!(%name, params = params.len(), "function defined");

        let body = self.parse_block()?;
        self.expect_keyword(Keyword::End, "to close function body")?;

        Ok(Stmt::FunctionDef {
            name,
            params,
            returns,
            body,
            location,
        })
    }

    /// Named, typed parameters. Each one is declared in the function scope.
    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        let mut params = Vec::new();
        if self.check_separator(Separator::RParen) {
            return Ok(params);
        }
        loop {
            let (name, location) = self.expect_identifier("in parameter list")?;
            self.expect_separator(Separator::Colon, "after parameter name")?;
            let data_type = self.expect_type("for parameter")?;
            if let Err(bail) = self.declare_variable(&name, data_type, location, true) {
                self.absorb(bail)?;
            }
            params.push(Param {
                name,
                data_type,
                location,
            });
            if !self.eat_separator(Separator::Comma)? {
                return Ok(params);
            }
        }
    }

    /// Optional `: type {, type}` after a parameter list.
    fn parse_return_types(&mut self) -> PResult<Vec<DataType>> {
        if self.eat_separator(Separator::Colon)? {
            self.parse_type_list("in return types")
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_type_list(&mut self, ctx: &str) -> PResult<Vec<DataType>> {
        let mut types = vec![self.expect_type(ctx)?];
        while self.eat_separator(Separator::Comma)? {
            types.push(self.expect_type(ctx)?);
        }
        Ok(types)
    }

    /// `( args )` after a function name that has already been consumed.
    pub(crate) fn parse_call(&mut self, name: String, location: SourceLocation) -> PResult<Call> {
        let function = self.symbols.find_function(&name);
        if function.is_none() {
            self.report(
                Diagnostic::new(
                    ErrorKind::UndeclaredSymbol,
                    location,
                    format!("function '{}' is not declared", name),
                )
                .with_subject(name.as_str()),
            )?;
        }

        self.expect_separator(Separator::LParen, "in function call")?;
        let args = if self.check_separator(Separator::RParen) {
            Vec::new()
        } else {
            self.parse_expression_list()?
        };
        self.expect_separator(Separator::RParen, "after call arguments")?;

        Ok(Call {
            name,
            function,
            args,
            location,
        })
    }
}
