//! IFJ21 front end
//!
//! This module turns IFJ21 source text into a checked syntax tree:
//! - [`lexer`]: finite-state scanner (source text → tokens)
//! - [`symtable`]: stack of scopes mapping names to variable and function records
//! - [`expressions`]: operator-precedence (shift/reduce) expression parser
//! - [`parse`]: recursive descent driver for statements, with error recovery
//! - [`errors`]: diagnostics and exit statuses
//! - [`ast`]: syntax tree definitions
//!
//! # Supported language
//!
//! - Types: `integer`, `number`, `string` and the `nil` literal
//! - Global statements: `require`, `global` function declarations, function
//!   definitions and calls
//! - Statements: `local` declarations, `if/else`, `while`, `return`, calls and
//!   multiple assignment
//! - Expressions: `+ - * / // .. #` and the comparisons `== ~= < <= > >=`
//!
//! Beyond scoping and declaration tracking no semantic checks are made.

pub mod ast;
mod declarations;
pub mod errors;
pub mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod symtable;

pub use errors::{Diagnostic, ErrorKind, ParseErrors};
pub use parse::{Parser, ParserConfig, RecoveryPolicy};
