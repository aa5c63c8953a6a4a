//! Token definitions and the fixed keyword table.

use samt_core::Location;

/// A lexed token: kind plus the exact source window it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, location: Location) -> Self {
        Self { kind, location }
    }
}

/// The closed token set of the SAMT grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Structural punctuation
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    Period,
    DoublePeriod,
    Asterisk,
    AtSign,
    Equals,
    LessThan,
    GreaterThan,
    QuestionMark,
    ForwardSlash,

    // Keywords
    Record,
    Enum,
    Service,
    Typealias,
    Package,
    Import,
    Provide,
    Consume,
    Transport,
    Implements,
    Uses,
    Extends,
    As,
    Async,
    Oneway,
    Raises,
    True,
    False,

    // Literals
    Integer(i64),
    Float(f64),
    String(String),
    Identifier(String),

    /// End-of-file sentinel, emitted exactly once.
    End,
}

impl TokenKind {
    /// Keyword lookup for letter-led runs. Static and immutable; the lexer
    /// consults it for every identifier-shaped token.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word {
            "record" => TokenKind::Record,
            "enum" => TokenKind::Enum,
            "service" => TokenKind::Service,
            "typealias" => TokenKind::Typealias,
            "package" => TokenKind::Package,
            "import" => TokenKind::Import,
            "provide" => TokenKind::Provide,
            "consume" => TokenKind::Consume,
            "transport" => TokenKind::Transport,
            "implements" => TokenKind::Implements,
            "uses" => TokenKind::Uses,
            "extends" => TokenKind::Extends,
            "as" => TokenKind::As,
            "async" => TokenKind::Async,
            "oneway" => TokenKind::Oneway,
            "raises" => TokenKind::Raises,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Record
                | TokenKind::Enum
                | TokenKind::Service
                | TokenKind::Typealias
                | TokenKind::Package
                | TokenKind::Import
                | TokenKind::Provide
                | TokenKind::Consume
                | TokenKind::Transport
                | TokenKind::Implements
                | TokenKind::Uses
                | TokenKind::Extends
                | TokenKind::As
                | TokenKind::Async
                | TokenKind::Oneway
                | TokenKind::Raises
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Same-variant comparison, ignoring carried literal values.
    pub fn matches(&self, other: &TokenKind) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::OpenBrace => "'{'",
            TokenKind::CloseBrace => "'}'",
            TokenKind::OpenBracket => "'['",
            TokenKind::CloseBracket => "']'",
            TokenKind::OpenParen => "'('",
            TokenKind::CloseParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Period => "'.'",
            TokenKind::DoublePeriod => "'..'",
            TokenKind::Asterisk => "'*'",
            TokenKind::AtSign => "'@'",
            TokenKind::Equals => "'='",
            TokenKind::LessThan => "'<'",
            TokenKind::GreaterThan => "'>'",
            TokenKind::QuestionMark => "'?'",
            TokenKind::ForwardSlash => "'/'",
            TokenKind::Record => "'record'",
            TokenKind::Enum => "'enum'",
            TokenKind::Service => "'service'",
            TokenKind::Typealias => "'typealias'",
            TokenKind::Package => "'package'",
            TokenKind::Import => "'import'",
            TokenKind::Provide => "'provide'",
            TokenKind::Consume => "'consume'",
            TokenKind::Transport => "'transport'",
            TokenKind::Implements => "'implements'",
            TokenKind::Uses => "'uses'",
            TokenKind::Extends => "'extends'",
            TokenKind::As => "'as'",
            TokenKind::Async => "'async'",
            TokenKind::Oneway => "'oneway'",
            TokenKind::Raises => "'raises'",
            TokenKind::True => "'true'",
            TokenKind::False => "'false'",
            TokenKind::Integer(_) => "integer literal",
            TokenKind::Float(_) => "floating point literal",
            TokenKind::String(_) => "string literal",
            TokenKind::Identifier(_) => "identifier",
            TokenKind::End => "end of file",
        };
        f.write_str(text)
    }
}
