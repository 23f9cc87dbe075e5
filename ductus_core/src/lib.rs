//! `ductus_core` is the engine behind the [ductus] source rewriter. It scans
//! a text file for embedded directives and produces a transformed version of
//! the same file. All text that is not part of a directive is reproduced
//! byte for byte. Input is treated as raw bytes and need not be valid UTF-8.
//!
//! ## Directives
//!
//! ```text
//! #fl
//! int x
//! int y
//! #efl(#w(1) = 0;)
//! ```
//!
//! expands to
//!
//! ```text
//! x = 0;
//! y = 0;
//! ```
//!
//! - `#fl` … `#efl(<procedures>)` replays each body line through the
//!   procedure list: literal text, `#l` (the whole line), `#lc(a, b)` (the
//!   line without `a` leading and `b` trailing bytes) and `#w(n)` (the `n`-th
//!   identifier on the line, from 0).
//! - `#r target replacement` replaces every later occurrence of `target`
//!   up to the end of the enclosing `{ ... }` block, or the end of the file
//!   at top level.
//!
//! ## Processing Pipeline
//!
//! ```text
//! source bytes
//!   → Lexer (logos byte classes + line/column tracking)
//!   → Session (block walker tracking brace scopes)
//!       → loop expander (#fl / #efl)
//!       → replace engine (#r)
//!   → EditList (ordered source copies and synthesized fragments)
//!   → output bytes
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use ductus_core::Limits;
//! use ductus_core::rewrite;
//!
//! let output = rewrite(b"#fl\nfoo\nbar\n#efl(#l;)\n", Limits::default()).unwrap();
//! assert_eq!(output, b"foo;\nbar;\n");
//! ```
//!
//! [ductus]: https://docs.rs/ductus_cli

pub use config::*;
pub use edits::*;
pub use engine::*;
pub use error::*;
pub use expand::Procedure;
pub use lexer::Lexer;
pub use lexer::LexerState;
pub use lexer::tokenize;
pub use position::*;
pub use tokens::*;

pub mod config;
mod edits;
mod engine;
#[allow(unused_assignments)]
mod error;
mod expand;
mod lexer;
mod position;
mod replace;
mod session;
mod tokens;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
