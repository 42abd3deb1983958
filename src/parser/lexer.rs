//! Lexer (tokenizer) for IFJ21 source code
//!
//! Converts raw source text into [`Token`]s on demand. The lexer is an explicit
//! finite-state machine: [`Lexer::next_token`] starts in [`State::Start`] and
//! feeds one character at a time into the current state until a state emits a
//! token. No state ever looks more than one character ahead.
//!
//! Malformed input never stops the stream. Bad literals and stray characters
//! come out as [`TokenKind::Error`] tokens and scanning resumes right after
//! them, so the parser decides what to do with lexical errors.
//!
//! Once the input is exhausted every call returns [`TokenKind::Eof`].

use super::ast::{DataType, SourceLocation};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::LazyLock;

/// Reserved words. Matching is case-sensitive: `While` is an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Do,
    Else,
    End,
    Function,
    Global,
    If,
    Integer,
    Local,
    Nil,
    Number,
    Require,
    Return,
    String,
    Then,
    While,
}

impl Keyword {
    pub const ALL: [Keyword; 15] = [
        Keyword::Do,
        Keyword::Else,
        Keyword::End,
        Keyword::Function,
        Keyword::Global,
        Keyword::If,
        Keyword::Integer,
        Keyword::Local,
        Keyword::Nil,
        Keyword::Number,
        Keyword::Require,
        Keyword::Return,
        Keyword::String,
        Keyword::Then,
        Keyword::While,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Function => "function",
            Keyword::Global => "global",
            Keyword::If => "if",
            Keyword::Integer => "integer",
            Keyword::Local => "local",
            Keyword::Nil => "nil",
            Keyword::Number => "number",
            Keyword::Require => "require",
            Keyword::Return => "return",
            Keyword::String => "string",
            Keyword::Then => "then",
            Keyword::While => "while",
        }
    }

    /// The type named by this keyword in a declaration, if any.
    pub fn data_type(self) -> Option<DataType> {
        match self {
            Keyword::Integer => Some(DataType::Integer),
            Keyword::Number => Some(DataType::Number),
            Keyword::String => Some(DataType::String),
            Keyword::Nil => Some(DataType::Nil),
            _ => None,
        }
    }
}

static KEYWORDS: LazyLock<FxHashMap<&'static str, Keyword>> =
    LazyLock::new(|| Keyword::ALL.iter().map(|kw| (kw.as_str(), *kw)).collect());

/// Looks up a fully scanned identifier in the keyword table.
pub fn lookup_keyword(lexeme: &str) -> Option<Keyword> {
    KEYWORDS.get(lexeme).copied()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    SlashSlash, // //
    Hash,       // #
    DotDot,     // ..
    EqEq,       // ==
    NotEq,      // ~=
    Lt,         // <
    Le,         // <=
    Gt,         // >
    Ge,         // >=
    Assign,     // =
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::SlashSlash => "//",
            Operator::Hash => "#",
            Operator::DotDot => "..",
            Operator::EqEq => "==",
            Operator::NotEq => "~=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Assign => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
    LParen,
    RParen,
    Comma,
    Colon,
}

impl Separator {
    pub fn as_str(self) -> &'static str {
        match self {
            Separator::LParen => "(",
            Separator::RParen => ")",
            Separator::Comma => ",",
            Separator::Colon => ":",
        }
    }
}

/// Payload of an error token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    /// Raw source text the error covers.
    pub lexeme: String,
}

/// Token classes with their payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    Integer(i64),
    Number(f64),
    Str(String),
    Operator(Operator),
    Separator(Separator),
    Eof,
    Error(LexError),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::Integer(n) => write!(f, "integer literal {}", n),
            TokenKind::Number(x) => write!(f, "number literal {:?}", x),
            TokenKind::Str(s) => write!(f, "string literal {:?}", s),
            TokenKind::Operator(op) => write!(f, "'{}'", op.as_str()),
            TokenKind::Separator(sep) => write!(f, "'{}'", sep.as_str()),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Error(err) => write!(f, "invalid token '{}'", err.lexeme),
        }
    }
}

/// A classified lexeme and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind, TokenKind::Keyword(kw) if kw == keyword)
    }

    pub fn is_operator(&self, operator: Operator) -> bool {
        matches!(self.kind, TokenKind::Operator(op) if op == operator)
    }

    pub fn is_separator(&self, separator: Separator) -> bool {
        matches!(self.kind, TokenKind::Separator(sep) if sep == separator)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// Scanner states. Each variant is the set of inputs seen so far that still
/// need more characters to decide the token.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Start,
    Identifier,
    Integer,
    /// After `digits.`
    FractionStart,
    Fraction,
    /// After `e`/`E`
    ExponentStart,
    /// After `e+`/`e-`
    ExponentSign,
    Exponent,
    Str,
    StrEscape,
    StrEscapeCode { digits: u8, value: u32 },
    /// A string that is already known to be bad; skip to its end.
    StrInvalid(String),
    Minus,
    /// After `--`
    CommentStart,
    /// After `--[`
    CommentBracket,
    LineComment,
    BlockComment,
    /// Saw `]` inside a block comment
    BlockCommentClose,
    Slash,
    Dot,
    Tilde,
    Assign,
    Less,
    Greater,
}

/// Lexer for IFJ21 source code
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Lexeme under construction; moved into the token when it is emitted.
    buffer: String,
    /// Iterator only: set once `Eof` has been yielded.
    exhausted: bool,
}

impl Lexer {
    /// Create a new lexer for the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            buffer: String::new(),
            exhausted: false,
        }
    }

    /// Scan the whole input, up to and including the first `Eof` token.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    /// Produce the next token. Never fails: errors are tokens too.
    pub fn next_token(&mut self) -> Token {
        let token = self.scan();
        tracing::trace!(line = token.location.line, column = token.location.column, "token {}", token);
        token
    }

    fn scan(&mut self) -> Token {
        let mut state = State::Start;
        let mut start = self.current_location();
        let mut start_pos = self.position;
        self.buffer.clear();

        loop {
            let ch = self.peek();
            state = match state {
                State::Start => match ch {
                    None => return Token::new(TokenKind::Eof, self.current_location()),
                    Some(c) if c.is_whitespace() => {
                        self.advance();
                        State::Start
                    }
                    Some(c) => {
                        start = self.current_location();
                        start_pos = self.position;
                        self.advance();
                        match c {
                            'a'..='z' | 'A'..='Z' | '_' => {
                                self.buffer.push(c);
                                State::Identifier
                            }
                            '0'..='9' => {
                                self.buffer.push(c);
                                State::Integer
                            }
                            '"' => State::Str,
                            '-' => State::Minus,
                            '/' => State::Slash,
                            '.' => State::Dot,
                            '~' => State::Tilde,
                            '=' => State::Assign,
                            '<' => State::Less,
                            '>' => State::Greater,
                            '+' => return self.operator(Operator::Plus, start),
                            '*' => return self.operator(Operator::Star, start),
                            '#' => return self.operator(Operator::Hash, start),
                            '(' => return self.separator(Separator::LParen, start),
                            ')' => return self.separator(Separator::RParen, start),
                            ',' => return self.separator(Separator::Comma, start),
                            ':' => return self.separator(Separator::Colon, start),
                            other => {
                                return self.error(
                                    format!("unexpected character '{}'", other.escape_default()),
                                    start_pos,
                                    start,
                                )
                            }
                        }
                    }
                },

                State::Identifier => match ch {
                    Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                        self.push_advance(c);
                        State::Identifier
                    }
                    _ => {
                        let text = std::mem::take(&mut self.buffer);
                        let kind = match lookup_keyword(&text) {
                            Some(kw) => TokenKind::Keyword(kw),
                            None => TokenKind::Ident(text),
                        };
                        return Token::new(kind, start);
                    }
                },

                State::Integer => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Integer
                    }
                    Some('.') => {
                        self.push_advance('.');
                        State::FractionStart
                    }
                    Some(c @ ('e' | 'E')) => {
                        self.push_advance(c);
                        State::ExponentStart
                    }
                    _ => return self.finish_integer(start_pos, start),
                },

                State::FractionStart => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Fraction
                    }
                    _ => {
                        return self.error(
                            "expected digit after decimal point".to_string(),
                            start_pos,
                            start,
                        )
                    }
                },

                State::Fraction => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Fraction
                    }
                    Some(c @ ('e' | 'E')) => {
                        self.push_advance(c);
                        State::ExponentStart
                    }
                    _ => return self.finish_number(start_pos, start),
                },

                State::ExponentStart => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Exponent
                    }
                    Some(c @ ('+' | '-')) => {
                        self.push_advance(c);
                        State::ExponentSign
                    }
                    _ => {
                        return self.error(
                            "expected digit in exponent".to_string(),
                            start_pos,
                            start,
                        )
                    }
                },

                State::ExponentSign => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Exponent
                    }
                    _ => {
                        return self.error(
                            "expected digit in exponent".to_string(),
                            start_pos,
                            start,
                        )
                    }
                },

                State::Exponent => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.push_advance(c);
                        State::Exponent
                    }
                    _ => return self.finish_number(start_pos, start),
                },

                State::Str => match ch {
                    None | Some('\n') => {
                        return self.error(
                            "unterminated string literal".to_string(),
                            start_pos,
                            start,
                        )
                    }
                    Some('"') => {
                        self.advance();
                        let text = std::mem::take(&mut self.buffer);
                        return Token::new(TokenKind::Str(text), start);
                    }
                    Some('\\') => {
                        self.advance();
                        State::StrEscape
                    }
                    Some(c) if (c as u32) < 32 => {
                        self.advance();
                        State::StrInvalid(format!(
                            "control character '{}' in string literal",
                            c.escape_default()
                        ))
                    }
                    Some(c) => {
                        self.push_advance(c);
                        State::Str
                    }
                },

                State::StrEscape => match ch {
                    None | Some('\n') => {
                        return self.error(
                            "unterminated string literal".to_string(),
                            start_pos,
                            start,
                        )
                    }
                    Some(c @ ('"' | '\\' | 'n' | 't')) => {
                        self.advance();
                        self.buffer.push(match c {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                        State::Str
                    }
                    Some(c) if c.is_ascii_digit() => {
                        self.advance();
                        State::StrEscapeCode {
                            digits: 1,
                            value: c.to_digit(10).unwrap_or(0),
                        }
                    }
                    Some(c) => {
                        self.advance();
                        State::StrInvalid(format!(
                            "invalid escape sequence '\\{}'",
                            c.escape_default()
                        ))
                    }
                },

                State::StrEscapeCode { digits: 3, value } => match u8::try_from(value) {
                    Ok(byte) if byte != 0 => {
                        self.buffer.push(char::from(byte));
                        State::Str
                    }
                    _ => State::StrInvalid(format!(
                        "escape sequence '\\{:03}' out of range 001-255",
                        value
                    )),
                },

                State::StrEscapeCode { digits, value } => match ch {
                    Some(c) if c.is_ascii_digit() => {
                        self.advance();
                        State::StrEscapeCode {
                            digits: digits + 1,
                            value: value * 10 + c.to_digit(10).unwrap_or(0),
                        }
                    }
                    _ => State::StrInvalid(
                        "escape sequence '\\ddd' needs exactly three digits".to_string(),
                    ),
                },

                State::StrInvalid(message) => match ch {
                    None | Some('\n') => return self.error(message, start_pos, start),
                    Some('"') => {
                        self.advance();
                        return self.error(message, start_pos, start);
                    }
                    Some(_) => {
                        self.advance();
                        State::StrInvalid(message)
                    }
                },

                State::Minus => match ch {
                    Some('-') => {
                        self.advance();
                        State::CommentStart
                    }
                    _ => return self.operator(Operator::Minus, start),
                },

                State::CommentStart => match ch {
                    Some('[') => {
                        self.advance();
                        State::CommentBracket
                    }
                    _ => State::LineComment,
                },

                State::CommentBracket => match ch {
                    Some('[') => {
                        self.advance();
                        State::BlockComment
                    }
                    _ => State::LineComment,
                },

                State::LineComment => match ch {
                    None | Some('\n') => State::Start,
                    Some(_) => {
                        self.advance();
                        State::LineComment
                    }
                },

                // Unterminated block comments run to end of input.
                State::BlockComment => match ch {
                    None => State::Start,
                    Some(']') => {
                        self.advance();
                        State::BlockCommentClose
                    }
                    Some(_) => {
                        self.advance();
                        State::BlockComment
                    }
                },

                State::BlockCommentClose => match ch {
                    None => State::Start,
                    Some(']') => {
                        self.advance();
                        State::Start
                    }
                    Some(_) => State::BlockComment,
                },

                State::Slash => match ch {
                    Some('/') => {
                        self.advance();
                        return self.operator(Operator::SlashSlash, start);
                    }
                    _ => return self.operator(Operator::Slash, start),
                },

                State::Dot => match ch {
                    Some('.') => {
                        self.advance();
                        return self.operator(Operator::DotDot, start);
                    }
                    _ => {
                        return self.error(
                            "unexpected character '.'".to_string(),
                            start_pos,
                            start,
                        )
                    }
                },

                State::Tilde => match ch {
                    Some('=') => {
                        self.advance();
                        return self.operator(Operator::NotEq, start);
                    }
                    _ => {
                        return self.error(
                            "unexpected character '~'".to_string(),
                            start_pos,
                            start,
                        )
                    }
                },

                State::Assign => {
                    return self.one_or_two('=', Operator::EqEq, Operator::Assign, start)
                }
                State::Less => return self.one_or_two('=', Operator::Le, Operator::Lt, start),
                State::Greater => {
                    return self.one_or_two('=', Operator::Ge, Operator::Gt, start)
                }
            };
        }
    }

    /// Maximal munch for the two-character operators.
    fn one_or_two(
        &mut self,
        second: char,
        long: Operator,
        short: Operator,
        start: SourceLocation,
    ) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            self.operator(long, start)
        } else {
            self.operator(short, start)
        }
    }

    fn finish_integer(&mut self, start_pos: usize, start: SourceLocation) -> Token {
        match self.buffer.parse::<i64>() {
            Ok(value) => {
                self.buffer.clear();
                Token::new(TokenKind::Integer(value), start)
            }
            Err(_) => self.error("integer literal out of range".to_string(), start_pos, start),
        }
    }

    fn finish_number(&mut self, start_pos: usize, start: SourceLocation) -> Token {
        match self.buffer.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                self.buffer.clear();
                Token::new(TokenKind::Number(value), start)
            }
            _ => self.error("number literal out of range".to_string(), start_pos, start),
        }
    }

    fn operator(&self, op: Operator, start: SourceLocation) -> Token {
        Token::new(TokenKind::Operator(op), start)
    }

    fn separator(&self, sep: Separator, start: SourceLocation) -> Token {
        Token::new(TokenKind::Separator(sep), start)
    }

    fn error(&mut self, message: String, start_pos: usize, start: SourceLocation) -> Token {
        self.buffer.clear();
        let lexeme: String = self.input[start_pos..self.position].iter().collect();
        Token::new(TokenKind::Error(LexError { message, lexeme }), start)
    }

    fn push_advance(&mut self, c: char) {
        self.buffer.push(c);
        self.advance();
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}

/// Yields every token up to and including the first `Eof`, then stops.
impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        self.exhausted = token.is_eof();
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let toks = kinds("while While _x1 end");
        assert_eq!(toks[0], TokenKind::Keyword(Keyword::While));
        assert_eq!(toks[1], TokenKind::Ident("While".to_string()));
        assert_eq!(toks[2], TokenKind::Ident("_x1".to_string()));
        assert_eq!(toks[3], TokenKind::Keyword(Keyword::End));
        assert_eq!(toks[4], TokenKind::Eof);
    }

    #[test]
    fn test_every_keyword_is_recognised() {
        for kw in Keyword::ALL {
            assert_eq!(kinds(kw.as_str())[0], TokenKind::Keyword(kw));
        }
    }

    #[test]
    fn test_two_char_operators() {
        let toks = kinds("// / .. == = ~= <= < >= >");
        let ops: Vec<Operator> = toks
            .iter()
            .filter_map(|k| match k {
                TokenKind::Operator(op) => Some(*op),
                _ => None,
            })
            .collect();
        assert_eq!(
            ops,
            vec![
                Operator::SlashSlash,
                Operator::Slash,
                Operator::DotDot,
                Operator::EqEq,
                Operator::Assign,
                Operator::NotEq,
                Operator::Le,
                Operator::Lt,
                Operator::Ge,
                Operator::Gt,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42")[0], TokenKind::Integer(42));
        assert_eq!(kinds("007")[0], TokenKind::Integer(7));
        assert_eq!(kinds("1.5")[0], TokenKind::Number(1.5));
        assert_eq!(kinds("2e3")[0], TokenKind::Number(2000.0));
        assert_eq!(kinds("2.5E-1")[0], TokenKind::Number(0.25));
        assert_eq!(kinds("1e+2")[0], TokenKind::Number(100.0));
    }

    #[test]
    fn test_malformed_numbers_are_single_error_tokens() {
        for source in ["1.", "1e", "1e+", "3.e2"] {
            let toks = kinds(source);
            assert!(matches!(toks[0], TokenKind::Error(_)), "{source}: {:?}", toks);
        }
        let toks = kinds("1. x");
        assert!(matches!(&toks[0], TokenKind::Error(e) if e.lexeme == "1."));
        assert_eq!(toks[1], TokenKind::Ident("x".to_string()));
    }

    #[test]
    fn test_number_followed_by_letters_splits() {
        let toks = kinds("1a");
        assert_eq!(toks[0], TokenKind::Integer(1));
        assert_eq!(toks[1], TokenKind::Ident("a".to_string()));
    }

    #[test]
    fn test_string_escapes() {
        let toks = kinds(r#""a\"b\\c\n\t\065""#);
        assert_eq!(toks[0], TokenKind::Str("a\"b\\c\n\tA".to_string()));
    }

    #[test]
    fn test_bad_escape_yields_one_error() {
        let toks = kinds(r#""x\ay" 5"#);
        assert!(matches!(&toks[0], TokenKind::Error(e) if e.lexeme == r#""x\ay""#));
        assert_eq!(toks[1], TokenKind::Integer(5));
    }

    #[test]
    fn test_escape_code_range() {
        assert!(matches!(kinds(r#""\000""#)[0], TokenKind::Error(_)));
        assert!(matches!(kinds(r#""\256""#)[0], TokenKind::Error(_)));
        assert!(matches!(kinds(r#""\12""#)[0], TokenKind::Error(_)));
        assert_eq!(kinds(r#""\255""#)[0], TokenKind::Str("\u{ff}".to_string()));
    }

    #[test]
    fn test_string_stops_at_newline() {
        let toks = kinds("\"abc\nx");
        assert!(matches!(toks[0], TokenKind::Error(_)));
        assert_eq!(toks[1], TokenKind::Ident("x".to_string()));
    }

    #[test]
    fn test_comments() {
        let toks = kinds("a -- line\nb --[[ block\n ] ]] c --[ not block\nd");
        assert_eq!(
            toks,
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::Ident("b".to_string()),
                TokenKind::Ident("c".to_string()),
                TokenKind::Ident("d".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_reaches_eof() {
        assert_eq!(kinds("x --[[ never closed"), vec![
            TokenKind::Ident("x".to_string()),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_unexpected_characters_resume() {
        let toks = kinds("a @ ~ . b");
        assert!(matches!(&toks[1], TokenKind::Error(e) if e.lexeme == "@"));
        assert!(matches!(&toks[2], TokenKind::Error(e) if e.lexeme == "~"));
        assert!(matches!(&toks[3], TokenKind::Error(e) if e.lexeme == "."));
        assert_eq!(toks[4], TokenKind::Ident("b".to_string()));
    }

    #[test]
    fn test_locations() {
        let toks = Lexer::new("local x\n  = 1").tokenize();
        assert_eq!(toks[0].location, SourceLocation::new(1, 1));
        assert_eq!(toks[1].location, SourceLocation::new(1, 7));
        assert_eq!(toks[2].location, SourceLocation::new(2, 3));
        assert_eq!(toks[3].location, SourceLocation::new(2, 5));
    }

    #[test]
    fn test_iterator_stops_after_eof() {
        let toks: Vec<Token> = Lexer::new("a b").collect();
        assert_eq!(toks.len(), 3);
        assert!(toks[2].is_eof());
    }

    #[test]
    fn test_integer_overflow_is_error() {
        assert!(matches!(kinds("99999999999999999999")[0], TokenKind::Error(_)));
    }
}
