//! Token definitions for Glitteral

use std::fmt;

use crate::utils::Span;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Indent | TokenKind::Dedent | TokenKind::EndOfFile => {
                write!(f, "{:?}", self.kind)
            }
            _ => write!(f, "{:?} {:?}", self.kind, self.text),
        }
    }
}

/// Keywords that begin a keyword form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// if
    If,
    /// when
    When,
    /// :=
    Def,
    /// _:=
    SubscriptDef,
    /// :=λ
    DefLambda,
    /// do
    Do,
    /// for
    For,
    /// while
    While,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::If,
        Keyword::When,
        Keyword::Def,
        Keyword::SubscriptDef,
        Keyword::DefLambda,
        Keyword::Do,
        Keyword::For,
        Keyword::While,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::When => "when",
            Keyword::Def => ":=",
            Keyword::SubscriptDef => "_:=",
            Keyword::DefLambda => ":=λ",
            Keyword::Do => "do",
            Keyword::For => "for",
            Keyword::While => "while",
        }
    }
}

/// Type specifiers (`^int` and friends)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSpecifier {
    Integer,
    Float,
    String,
    Boolean,
    List,
    Dictionary,
    Void,
}

impl TypeSpecifier {
    pub const ALL: [TypeSpecifier; 7] = [
        TypeSpecifier::Integer,
        TypeSpecifier::Float,
        TypeSpecifier::String,
        TypeSpecifier::Boolean,
        TypeSpecifier::List,
        TypeSpecifier::Dictionary,
        TypeSpecifier::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeSpecifier::Integer => "^int",
            TypeSpecifier::Float => "^float",
            TypeSpecifier::String => "^str",
            TypeSpecifier::Boolean => "^bool",
            TypeSpecifier::List => "^list",
            TypeSpecifier::Dictionary => "^dict",
            TypeSpecifier::Void => "^void",
        }
    }
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ============ Identifiers and Literals ============
    Identifier,
    IntegerLiteral,
    FloatLiteral,
    StringLiteral,
    InternLiteral,
    /// Truth, Falsity
    BooleanLiteral,
    /// Void
    VoidLiteral,

    // ============ Reserved ============
    Keyword(Keyword),
    TypeSpecifier(TypeSpecifier),

    // ============ Delimiters ============
    /// (
    OpenParenthesis,
    /// )
    CloseParenthesis,
    /// [
    OpenBracket,
    /// ]
    CloseBracket,
    /// {
    OpenBrace,
    /// }
    CloseBrace,
    /// | (opens and closes)
    Pipe,
    /// ;
    Semicolon,
    /// →
    Arrow,
    /// —
    Dash,

    // ============ Significant whitespace ============
    Indent,
    Dedent,

    // ============ Special ============
    /// End of file (never emitted)
    EndOfFile,
    /// # commentary (never emitted)
    Comment,
}

impl TokenKind {
    /// Reserved words win ties against equally long non-reserved matches
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            TokenKind::Keyword(_)
                | TokenKind::TypeSpecifier(_)
                | TokenKind::BooleanLiteral
                | TokenKind::VoidLiteral
        )
    }

    pub fn is_open_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::OpenParenthesis
                | TokenKind::OpenBracket
                | TokenKind::OpenBrace
                | TokenKind::Pipe
        )
    }

    pub fn is_close_delimiter(&self) -> bool {
        matches!(
            self,
            TokenKind::CloseParenthesis
                | TokenKind::CloseBracket
                | TokenKind::CloseBrace
                | TokenKind::Pipe
        )
    }

    /// The structural opposite of a delimiter; pipes are their own opposite
    pub fn opposite(&self) -> Option<TokenKind> {
        match self {
            TokenKind::OpenParenthesis => Some(TokenKind::CloseParenthesis),
            TokenKind::CloseParenthesis => Some(TokenKind::OpenParenthesis),
            TokenKind::OpenBracket => Some(TokenKind::CloseBracket),
            TokenKind::CloseBracket => Some(TokenKind::OpenBracket),
            TokenKind::OpenBrace => Some(TokenKind::CloseBrace),
            TokenKind::CloseBrace => Some(TokenKind::OpenBrace),
            TokenKind::Pipe => Some(TokenKind::Pipe),
            _ => None,
        }
    }

    /// Fixed spelling, for kinds that have exactly one
    pub fn spelling(&self) -> Option<&'static str> {
        match self {
            TokenKind::Keyword(keyword) => Some(keyword.as_str()),
            TokenKind::TypeSpecifier(specifier) => Some(specifier.as_str()),
            TokenKind::VoidLiteral => Some("Void"),
            TokenKind::OpenParenthesis => Some("("),
            TokenKind::CloseParenthesis => Some(")"),
            TokenKind::OpenBracket => Some("["),
            TokenKind::CloseBracket => Some("]"),
            TokenKind::OpenBrace => Some("{"),
            TokenKind::CloseBrace => Some("}"),
            TokenKind::Pipe => Some("|"),
            TokenKind::Semicolon => Some(";"),
            TokenKind::Arrow => Some("→"),
            TokenKind::Dash => Some("—"),
            TokenKind::EndOfFile => Some("█"),
            _ => None,
        }
    }
}
