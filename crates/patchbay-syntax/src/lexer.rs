//! # Lexer - Tokenizing Patch Text
//!
//! This module breaks patch source text into tokens using the [Logos] lexer
//! generator. It is the first stage of the splitter: tokens are grouped into
//! words and words into statements by [`crate::splitter`].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Lossless Tokens
//!
//! Every byte of a well-formed input appears in exactly one token, so the
//! concatenated token texts reproduce the input:
//!
//! ```
//! use patchbay_syntax::lexer::lex;
//!
//! let input = "#X obj 10 10 osc~ 440;\n";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Escapes
//!
//! The native format uses a backslash to take away the special meaning of a
//! delimiter (`\;`, `\,`, `\ `). Those pairs lex as
//! [`TokenKind::EscapedDelimiter`]. A backslash before anything else (most
//! often `\$1`) lexes as [`TokenKind::Escaped`] and is kept verbatim by the
//! splitter. A lone backslash at the very end of the input matches no rule
//! and surfaces as a lexer error.

use logos::Logos;

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Spaces, tabs and line endings
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    /// Statement terminator
    #[token(";")]
    Semi,

    /// Unescaped comma, used by the `, f <width>` suffix
    #[token(",")]
    Comma,

    /// Backslash followed by a delimiter character
    #[regex(r"\\[;, \t\r\n]")]
    EscapedDelimiter,

    /// Backslash followed by any other character (`\$1`)
    #[regex(r"\\[^;, \t\r\n]")]
    Escaped,

    /// A run of ordinary characters
    #[regex(r"[^ \t\r\n;,\\]+")]
    Text,
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: Option<TokenKind>,
    pub text: &'a str,
}

impl Token<'_> {
    /// True when the lexer could not classify this slice.
    pub fn is_error(&self) -> bool {
        self.kind.is_none()
    }
}

/// Lex the input into a sequence of tokens.
///
/// Unrecognized slices are kept with `kind: None` so the output still covers
/// every byte of the input.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        tokens.push(Token {
            kind: result.ok(),
            text: lexer.slice(),
        });
    }

    tokens
}
