use derive_more::Display;

use crate::Point;
use crate::Span;

/// The closed set of token kinds the lexer produces.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
	/// `[A-Za-z_][A-Za-z0-9_]*`
	#[display("identifier")]
	Identifier,
	/// A run of spaces and tabs.
	#[display("whitespace")]
	Whitespace,
	/// `\r\n` | `\n` | `\r`
	#[display("newline")]
	Newline,
	#[display("`(`")]
	ParenOpen,
	#[display("`)`")]
	ParenClose,
	#[display("`{{`")]
	BraceOpen,
	#[display("`}}`")]
	BraceClose,
	#[display("`,`")]
	Comma,
	#[display("`\"`")]
	Quote,
	#[display("`/`")]
	Slash,
	/// The two `//` marker bytes only. The rest of the line is lexed as usual.
	#[display("`//`")]
	Comment,
	#[display("integer")]
	Integer,
	#[display("float")]
	Float,
	/// A NUL byte or the physical end of input.
	#[display("end of file")]
	EndOfBuffer,
	/// A byte that starts no other token. Never fatal.
	#[display("invalid character")]
	Invalid,
	/// A `#` that does not start a directive keyword.
	#[display("`#`")]
	Pound,
	/// `#fl`
	#[display("`#fl`")]
	PoundFor,
	/// `#efl`
	#[display("`#efl`")]
	PoundEndFor,
	/// `#l`
	#[display("`#l`")]
	PoundLine,
	/// `#lc`
	#[display("`#lc`")]
	PoundLineClip,
	/// `#w`
	#[display("`#w`")]
	PoundWord,
	/// `#r`
	#[display("`#r`")]
	PoundReplace,
}

/// A token always points back into the original buffer, never into the
/// output being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
	pub kind: TokenKind,
	pub span: Span,
	/// Where the token starts.
	pub point: Point,
	/// Only whitespace precedes this token on its line.
	pub first_in_line: bool,
}

impl Token {
	/// The raw bytes this token covers.
	pub fn bytes<'a>(&self, source: &'a [u8]) -> &'a [u8] {
		&source[self.span.range()]
	}
}
