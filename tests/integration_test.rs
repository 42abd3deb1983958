// End-to-end tests for the IFJ21 front end

use std::fs;
use std::path::Path;

use tealfront::parser::ast::{DataType, RValue, Stmt};
use tealfront::parser::symtable::Symbol;
use tealfront::parser::{ErrorKind, Parser, ParserConfig};

fn read_demo(name: &str) -> String {
    let path = Path::new("demos").join(name);
    fs::read_to_string(path).expect("Failed to read demo file")
}

#[test]
fn test_factorial_program() {
    let source = read_demo("factorial.tl");
    let mut parser = Parser::new(&source);
    let program = parser.parse_program().expect("Parsing failed");

    assert_eq!(program.body.len(), 6);
    let names: Vec<&str> = program.function_names().collect();
    assert_eq!(names, vec!["factorial_iter", "factorial_rec", "main"]);

    let table = parser.symbols();
    assert_eq!(table.depth(), 0);
    let user: Vec<&str> = table
        .global_scope()
        .iter()
        .filter_map(|(name, sym)| match sym {
            Symbol::Function(f) if !f.builtin => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(user, vec!["factorial_rec", "factorial_iter", "main"]);

    let rec = table.find_function("factorial_rec").unwrap();
    let rec = table.function(rec).unwrap();
    assert!(rec.defined);
    assert_eq!(rec.params, vec![DataType::Integer]);
}

#[test]
fn test_recursive_initialiser_is_a_call() {
    let source = read_demo("factorial.tl");
    let program = Parser::new(&source).parse_program().unwrap();
    let body = program
        .body
        .iter()
        .find_map(|stmt| match stmt {
            Stmt::FunctionDef { name, body, .. } if name == "factorial_rec" => Some(body),
            _ => None,
        })
        .unwrap();
    let Stmt::If {
        else_body: Some(else_body),
        ..
    } = &body[0]
    else {
        panic!("Expected if statement, got {:?}", body[0]);
    };
    assert!(matches!(
        &else_body[0],
        Stmt::Local { init: Some(RValue::Call(call)), .. }
            if call.name == "factorial_rec" && call.function.is_some()
    ));
}

#[test]
fn test_nested_scopes_program() {
    let source = read_demo("scopes.tl");
    let mut parser = Parser::new(&source);
    let program = parser.parse_program().expect("Parsing failed");

    let Stmt::FunctionDef { body, .. } = &program.body[1] else {
        panic!("Expected main, got {:?}", program.body[1]);
    };
    assert_eq!(body.len(), 5);
    match &body[2] {
        Stmt::If {
            then_body,
            else_body: Some(else_body),
            ..
        } => {
            assert!(matches!(
                &then_body[0],
                Stmt::Local { name, data_type: DataType::Number, .. } if name == "x"
            ));
            assert_eq!(else_body.len(), 1);
        }
        other => panic!("Expected if statement, got {:?}", other),
    }

    // Locals are gone once their blocks close.
    assert_eq!(parser.symbols().depth(), 0);
    assert!(parser.symbols().find_variable("x").is_none());
}

#[test]
fn test_first_error_stops_by_default() {
    let source = read_demo("errors.tl");
    let errors = Parser::new(&source).parse_program().unwrap_err();
    assert_eq!(errors.len(), 1);
    let first = errors.first().unwrap();
    assert_eq!(first.kind, ErrorKind::UndeclaredSymbol);
    assert_eq!(first.subject.as_deref(), Some("b"));
    assert_eq!((first.location.line, first.location.column), (4, 5));
    assert_eq!(errors.exit_code(), 3);
}

#[test]
fn test_keep_going_reports_every_error() {
    let source = read_demo("errors.tl");
    let mut parser = Parser::with_config(&source, ParserConfig::keep_going());
    let errors = parser.parse_program().unwrap_err();

    let found: Vec<_> = errors
        .iter()
        .map(|d| (d.kind, d.subject.as_deref(), d.location.line))
        .collect();
    assert_eq!(
        found,
        vec![
            (ErrorKind::UndeclaredSymbol, Some("b"), 4),
            (ErrorKind::DuplicateSymbol, Some("a"), 6),
            (ErrorKind::DuplicateSymbol, Some("main"), 10),
            (ErrorKind::UndeclaredSymbol, Some("missing"), 13),
        ]
    );
    assert_eq!(parser.symbols().depth(), 0);
}

#[test]
fn test_exit_codes() {
    let code = |source: &str| Parser::new(source).parse_program().unwrap_err().exit_code();

    assert_eq!(code("function main()\n local x : number = 1.\nend"), 1);
    assert_eq!(code("function main()\n if end"), 2);
    assert_eq!(code("function main()\n local x : integer = y\nend"), 3);
    assert_eq!(code("global f : function(integer)\nfunction f(a : string)\nend"), 3);
}

#[test]
fn test_lexical_errors_do_not_stop_keep_going() {
    let source = "function main()\n local a : integer = 1 @\n b = 2\nend";
    let mut parser = Parser::with_config(source, ParserConfig::keep_going());
    let errors = parser.parse_program().unwrap_err();
    let kinds: Vec<ErrorKind> = errors.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::Lexical, ErrorKind::UndeclaredSymbol]);
    assert_eq!(errors.exit_code(), 1);
}

#[test]
fn test_syntax_recovery_resumes_at_next_statement() {
    let source = "function main()\n local a : integer = (1 +\n local b : integer = c\nend\nmain()";
    let mut parser = Parser::with_config(source, ParserConfig::keep_going());
    let errors = parser.parse_program().unwrap_err();
    let kinds: Vec<ErrorKind> = errors.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![ErrorKind::Syntax, ErrorKind::UndeclaredSymbol]);
    assert_eq!(errors.iter().nth(1).unwrap().subject.as_deref(), Some("c"));
}

#[test]
fn test_diagnostic_display() {
    let errors = Parser::new("nope()").parse_program().unwrap_err();
    assert_eq!(
        errors.to_string(),
        "undeclared symbol at line 1, column 1: function 'nope' is not declared"
    );
}
