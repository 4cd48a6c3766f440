use compact_str::CompactString;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, Token>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("and", Token::And);
    map.insert("class", Token::Class);
    map.insert("def", Token::Def);
    map.insert("else", Token::Else);
    map.insert("False", Token::False);
    map.insert("if", Token::If);
    map.insert("None", Token::None);
    map.insert("not", Token::Not);
    map.insert("or", Token::Or);
    map.insert("print", Token::Print);
    map.insert("return", Token::Return);
    map.insert("True", Token::True);
    map
});

/// A single element of the materialized token sequence.
///
/// Tokens carry their value directly; the parser never goes back to the
/// source text. `Indent`/`Dedent` are synthetic layout tokens standing in
/// for braces, one per 2-space step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Valued tokens
    Number(i32),
    String(CompactString),
    Id(CompactString),
    /// A single punctuation character that is not part of a two-character
    /// operator, e.g. `:`, `(`, `+` or a lone `!`.
    Char(char),

    // Keywords
    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,

    // Two-character operators
    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(value) => write!(f, "`{value}`"),
            Token::String(_) => write!(f, "a string literal"),
            Token::Id(name) => write!(f, "`{name}`"),
            Token::Char(c) => write!(f, "`{c}`"),
            Token::Class => write!(f, "`class`"),
            Token::Return => write!(f, "`return`"),
            Token::If => write!(f, "`if`"),
            Token::Else => write!(f, "`else`"),
            Token::Def => write!(f, "`def`"),
            Token::Print => write!(f, "`print`"),
            Token::And => write!(f, "`and`"),
            Token::Or => write!(f, "`or`"),
            Token::Not => write!(f, "`not`"),
            Token::None => write!(f, "`None`"),
            Token::True => write!(f, "`True`"),
            Token::False => write!(f, "`False`"),
            Token::Eq => write!(f, "`==`"),
            Token::NotEq => write!(f, "`!=`"),
            Token::LessOrEq => write!(f, "`<=`"),
            Token::GreaterOrEq => write!(f, "`>=`"),
            Token::Newline => write!(f, "end of line"),
            Token::Indent => write!(f, "an indent"),
            Token::Dedent => write!(f, "a dedent"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
