use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum LexicalErrorKind {
    #[error("unrecognized character {0:?}")]
    Unrecognized(char),
    #[error("unterminated string literal")]
    UnclosedString,
    #[error("indentation changed by {delta} spaces which is not a multiple of the 2-space step")]
    UnevenIndent { delta: isize },
    #[error("integer literal `{0}` is out of range")]
    NumberOutOfRange(CompactString),
}

#[derive(Debug, Error, Clone)]
#[error("[line {line}] {kind}")]
pub struct LexicalError {
    #[source]
    pub kind: LexicalErrorKind,
    /// 1-based source line of the failure.
    pub line: u32,
    /// Byte offset of the failure, for diagnostics rendering.
    pub offset: usize,
}
