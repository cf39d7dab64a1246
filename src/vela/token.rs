//! Token definitions for the vela language.
//!
//! Two layers live here. `RawToken` is the flat logos-derived token set
//! produced by scanning source text; it still contains whitespace runs,
//! comments, and explicit line joins. The lexing pipeline transforms a
//! raw stream into final [`Token`] values whose [`TokenKind`] set also
//! carries the synthesized structural tokens (Indent/Dedent/Newline/
//! EndMarker) and the raw-block markers. Keywords are not part of the
//! logos layer; they are resolved from names through the grammar's
//! keyword table.

use logos::Logos;
use serde::{Deserialize, Serialize};

/// Raw tokens recognized by the logos scan.
///
/// Variants are unit-only; the literal text is sliced from the source by
/// span when the final stream is assembled.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Name,

    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+")]
    Float,

    // Triple-quoted forms span lines and may contain lone quotes; the
    // single-line forms stop at a newline so an unterminated literal is
    // caught on the line it starts.
    #[regex(r#""""([^"]|"[^"]|""[^"])*""""#)]
    #[regex(r"'''([^']|'[^']|''[^'])*'''")]
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    #[regex(r"'([^'\\\n]|\\[^\n])*'")]
    Str,

    #[regex(r"#[^\n]*")]
    Comment,

    #[regex(r"[ \t]+")]
    Space,

    #[regex(r"\r?\n")]
    Newline,

    // Backslash-newline joins two physical lines into one logical line.
    #[regex(r"\\\r?\n")]
    LineJoin,

    #[token("(")]
    LPar,
    #[token(")")]
    RPar,
    #[token("[")]
    LSqb,
    #[token("]")]
    RSqb,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("::")]
    DoubleColon,
    #[token(":=")]
    ColonEqual,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("=")]
    Assign,
    #[token("==")]
    EqEqual,
    #[token("!=")]
    NotEqual,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("<<")]
    LeftShift,
    #[token(">>")]
    RightShift,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    DoubleStar,
    #[token("/")]
    Slash,
    #[token("//")]
    DoubleSlash,
    #[token("%")]
    Percent,
    #[token("|")]
    VBar,
    #[token("^")]
    Circumflex,
    #[token("&")]
    Amper,
    #[token("~")]
    Tilde,
}

/// The final token kinds consumed by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals and names
    Name,
    Int,
    Float,
    Str,

    // Keywords (resolved from names via the grammar's keyword table)
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    For,
    Lambda,
    Import,
    From,
    As,
    Pass,

    // Punctuation and operators
    LPar,
    RPar,
    LSqb,
    RSqb,
    LBrace,
    RBrace,
    Comma,
    Colon,
    DoubleColon,
    ColonEqual,
    Dot,
    Ellipsis,
    Assign,
    EqEqual,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LeftShift,
    RightShift,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    VBar,
    Circumflex,
    Amper,
    Tilde,

    // Structure
    Newline,
    Indent,
    Dedent,
    EndMarker,

    // Raw code blocks
    BlockStart,
    BlockBody,
    BlockEnd,
}

impl TokenKind {
    /// Short human label used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Name => "name",
            TokenKind::Int | TokenKind::Float => "number",
            TokenKind::Str => "string",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::In => "'in'",
            TokenKind::Is => "'is'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::For => "'for'",
            TokenKind::Lambda => "'lambda'",
            TokenKind::Import => "'import'",
            TokenKind::From => "'from'",
            TokenKind::As => "'as'",
            TokenKind::Pass => "'pass'",
            TokenKind::LPar => "'('",
            TokenKind::RPar => "')'",
            TokenKind::LSqb => "'['",
            TokenKind::RSqb => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::DoubleColon => "'::'",
            TokenKind::ColonEqual => "':='",
            TokenKind::Dot => "'.'",
            TokenKind::Ellipsis => "'...'",
            TokenKind::Assign => "'='",
            TokenKind::EqEqual => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::LessEqual => "'<='",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::LeftShift => "'<<'",
            TokenKind::RightShift => "'>>'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::DoubleStar => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::DoubleSlash => "'//'",
            TokenKind::Percent => "'%'",
            TokenKind::VBar => "'|'",
            TokenKind::Circumflex => "'^'",
            TokenKind::Amper => "'&'",
            TokenKind::Tilde => "'~'",
            TokenKind::Newline => "end of line",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::EndMarker => "end of input",
            TokenKind::BlockStart => "':: code ::'",
            TokenKind::BlockBody => "code block",
            TokenKind::BlockEnd => "':: end ::'",
        }
    }

    /// True for the five binding-operator token kinds.
    pub fn is_binding_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Assign
                | TokenKind::ColonEqual
                | TokenKind::LeftShift
                | TokenKind::RightShift
                | TokenKind::DoubleColon
        )
    }
}

/// One token of the final stream: kind, literal text, 1-based line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
        }
    }
}

/// Byte-offset to 1-based line-number lookup over a source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        LineIndex { starts }
    }

    /// The 1-based line containing the byte at `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|&start| start <= offset)
    }

    /// Number of lines in the indexed text (at least 1).
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}
