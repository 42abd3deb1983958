//! # Introduction
//!
//! tealfront is the front end of a compiler for IFJ21, a statically typed
//! subset of the Teal language. It scans source text, tracks declarations in
//! a scoped symbol table and parses programs into a syntax tree whose
//! identifiers are already resolved.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Parser ⇄ Symbol table → Program
//!                    └→ Expression automaton
//! ```
//!
//! 1. [`parser::lexer`]: a finite-state scanner that produces tokens on demand.
//! 2. [`parser::parse`]: the recursive descent driver. It owns the symbol
//!    table, opens and closes scopes and collects diagnostics.
//! 3. [`parser::expressions`]: an operator-precedence automaton the driver
//!    calls at every expression position.
//! 4. [`parser::symtable`]: scopes, records and index-based handles.
//!
//! ## Example
//!
//! ```
//! use tealfront::parser::Parser;
//!
//! let source = r#"
//! require "ifj21"
//! function main()
//!     local greeting : string = "hello"
//!     write(greeting, "\n")
//! end
//! main()
//! "#;
//! let program = Parser::new(source).parse_program().unwrap();
//! assert_eq!(program.body.len(), 3);
//! ```

pub mod parser;
