//! # patchbay-syntax
//!
//! Splits Pure Data patch text into statements, using [Logos] for the
//! tokenizer.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Native Format
//!
//! A patch file is a flat sequence of statements. Each statement is a list
//! of whitespace-separated words terminated by an unescaped semicolon:
//!
//! ```text
//! #N canvas 0 50 450 300 12;
//! #X obj 10 10 osc~ 440;
//! #X msg 10 40 \; pd dsp 1;
//! ```
//!
//! A backslash in front of `;`, `,` or whitespace makes that character part
//! of the word instead of a delimiter. Pure Data calls one such statement a
//! *binbuf*, and so do we.
//!
//! ## Pipeline
//!
//! ```text
//! Source Text → Lexer → Tokens → Splitter → Binbufs
//!               (Logos)
//! ```
//!
//! The [`lexer`] classifies every byte. The [`splitter`] folds escapes into
//! words, tracks line numbers and yields [`Binbuf`]s lazily.
//!
//! ## Quick Start
//!
//! ```
//! use patchbay_syntax::{split, Word};
//!
//! let statements: Vec<_> = split("#X obj 10 10 osc~ 440;\n#X connect 0 0 1 0;")
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(statements.len(), 2);
//! assert_eq!(statements[0].words[4], Word::Text("osc~".into()));
//! assert_eq!(statements[1].keyword(), (Some("#X"), Some("connect")));
//! ```

pub mod lexer;
pub mod splitter;

pub use splitter::{Binbuf, SplitError, Splitter, Word, split};
