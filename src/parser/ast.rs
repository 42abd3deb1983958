// Syntax tree definitions for IFJ21 programs

use crate::parser::symtable::SymbolHandle;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Value types of the language. `Nil` is only ever the type of the `nil`
/// literal; it cannot be written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Number,
    String,
    Nil,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Number => "number",
            DataType::String => "string",
            DataType::Nil => "nil",
        };
        f.write_str(name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    // String
    Concat,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::IntDiv => "//",
            BinOp::Concat => "..",
            BinOp::Eq => "==",
            BinOp::Ne => "~=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `#s`, string length
    Length,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Number(f64),
    Str(String),
    Nil,
}

/// What an identifier operand was bound to when its handle was reduced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Variable {
        handle: SymbolHandle,
        data_type: DataType,
    },
    Function(SymbolHandle),
    /// Not visible in any scope; an `UndeclaredSymbol` diagnostic was raised.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        value: Literal,
        location: SourceLocation,
    },
    Name {
        name: String,
        resolution: Resolution,
        location: SourceLocation,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        location: SourceLocation,
    },
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Literal { location, .. }
            | Expr::Name { location, .. }
            | Expr::Unary { location, .. }
            | Expr::Binary { location, .. } => *location,
        }
    }

    /// True when some identifier inside this tree failed to resolve.
    pub fn has_errors(&self) -> bool {
        match self {
            Expr::Literal { .. } => false,
            Expr::Name { resolution, .. } => {
                matches!(resolution, Resolution::Unresolved)
            }
            Expr::Unary { operand, .. } => operand.has_errors(),
            Expr::Binary { left, right, .. } => {
                left.has_errors() || right.has_errors()
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal { value, .. } => match value {
                Literal::Integer(n) => write!(f, "{}", n),
                Literal::Number(x) => write!(f, "{:?}", x),
                Literal::Str(s) => write!(f, "{:?}", s),
                Literal::Nil => f.write_str("nil"),
            },
            Expr::Name { name, .. } => f.write_str(name),
            Expr::Unary { operand, .. } => write!(f, "(#{})", operand),
            Expr::Binary {
                op, left, right, ..
            } => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}

/// A call to a user or built-in function.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub function: Option<SymbolHandle>,
    pub args: Vec<Expr>,
    pub location: SourceLocation,
}

/// Right-hand side of an assignment or `local` initialiser.
#[derive(Debug, Clone, PartialEq)]
pub enum RValue {
    Exprs(Vec<Expr>),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub data_type: DataType,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Require {
        module: String,
        location: SourceLocation,
    },
    /// `global f : function(types) : types`
    FunctionDecl {
        name: String,
        params: Vec<DataType>,
        returns: Vec<DataType>,
        location: SourceLocation,
    },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        returns: Vec<DataType>,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Local {
        name: String,
        data_type: DataType,
        init: Option<RValue>,
        handle: SymbolHandle,
        location: SourceLocation,
    },
    Assign {
        targets: Vec<(String, Option<SymbolHandle>)>,
        value: RValue,
        location: SourceLocation,
    },
    Call(Call),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    Return {
        values: Vec<Expr>,
        location: SourceLocation,
    },
}

/// Top-level program: the global statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program { body: Vec::new() }
    }

    /// Functions defined (with a body) in this program, in source order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.body.iter().filter_map(|stmt| match stmt {
            Stmt::FunctionDef { name, .. } => Some(name.as_str()),
            _ => None,
        })
    }
}
