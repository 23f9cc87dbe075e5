use logos::Logos;
use tracing::debug;

use crate::Point;
use crate::Span;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Raw byte classes recognised by logos. The [`Lexer`] wraps this stream with
/// position tracking and the end-of-buffer sentinel. The source is raw bytes:
/// input does not have to be valid UTF-8.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(utf8 = false)]
enum RawToken {
	#[token("\r\n")]
	#[token("\n")]
	#[token("\r")]
	Newline,
	#[regex(r"[ \t]+")]
	Whitespace,
	#[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
	Identifier,
	#[regex(r"[0-9]+")]
	Integer,
	#[regex(r"[0-9]+\.[0-9]+")]
	Float,
	#[token("//")]
	Comment,
	#[token("/")]
	Slash,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token(",")]
	Comma,
	#[token("\"")]
	Quote,
	#[token("#")]
	Pound,
	#[token("#r")]
	PoundReplace,
	#[token("#l")]
	PoundLine,
	#[token("#lc")]
	PoundLineClip,
	#[token("#fl")]
	PoundFor,
	#[token("#efl")]
	PoundEndFor,
	#[token("#w")]
	PoundWord,
	#[token("\0")]
	Nul,
}

impl From<RawToken> for TokenKind {
	fn from(raw: RawToken) -> Self {
		match raw {
			RawToken::Newline => Self::Newline,
			RawToken::Whitespace => Self::Whitespace,
			RawToken::Identifier => Self::Identifier,
			RawToken::Integer => Self::Integer,
			RawToken::Float => Self::Float,
			RawToken::Comment => Self::Comment,
			RawToken::Slash => Self::Slash,
			RawToken::ParenOpen => Self::ParenOpen,
			RawToken::ParenClose => Self::ParenClose,
			RawToken::BraceOpen => Self::BraceOpen,
			RawToken::BraceClose => Self::BraceClose,
			RawToken::Comma => Self::Comma,
			RawToken::Quote => Self::Quote,
			RawToken::Pound => Self::Pound,
			RawToken::PoundReplace => Self::PoundReplace,
			RawToken::PoundLine => Self::PoundLine,
			RawToken::PoundLineClip => Self::PoundLineClip,
			RawToken::PoundFor => Self::PoundFor,
			RawToken::PoundEndFor => Self::PoundEndFor,
			RawToken::PoundWord => Self::PoundWord,
			RawToken::Nul => Self::EndOfBuffer,
		}
	}
}

/// Cursor bookkeeping carried between tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LexerState {
	/// Position of the next byte to lex.
	pub point: Point,
	/// No token other than whitespace has been produced on the current line.
	pub first_in_line: bool,
}

/// Produces one token per call over an immutable source buffer.
///
/// A byte that starts no other token (any non-ASCII byte included) becomes a
/// one-byte `Invalid` token and lexing continues.
///
/// Whitespace tokens are skipped by [`Lexer::next_token`] and
/// [`Lexer::peek`]. Once the end of the buffer (or a NUL byte) is reached the
/// same `EndOfBuffer` token is returned forever.
pub struct Lexer<'a> {
	source: &'a [u8],
	raw: logos::Lexer<'a, RawToken>,
	state: LexerState,
	peeked: Option<Token>,
	end: Option<Token>,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a [u8]) -> Self {
		Self {
			source,
			raw: RawToken::lexer(source),
			state: LexerState {
				point: Point::default(),
				first_in_line: true,
			},
			peeked: None,
			end: None,
		}
	}

	pub fn state(&self) -> LexerState {
		self.state
	}

	/// The next non-whitespace token.
	pub fn next_token(&mut self) -> Token {
		if let Some(token) = self.peeked.take() {
			return token;
		}

		loop {
			let token = self.lex_one();
			if token.kind != TokenKind::Whitespace {
				return token;
			}
		}
	}

	/// Look at the next non-whitespace token without consuming it.
	pub fn peek(&mut self) -> Token {
		if let Some(token) = self.peeked {
			return token;
		}

		let token = self.next_token();
		self.peeked = Some(token);
		token
	}

	/// Lex exactly one token, whitespace included.
	fn lex_one(&mut self) -> Token {
		if let Some(end) = self.end {
			return end;
		}

		let point = self.state.point;
		let first_in_line = self.state.first_in_line;

		let Some(result) = self.raw.next() else {
			return self.finish(Span::empty(self.source.len()), point, first_in_line);
		};

		let span = Span::from(self.raw.span());
		let kind = match result {
			Ok(RawToken::Nul) => return self.finish(Span::empty(span.start), point, first_in_line),
			Ok(raw) => TokenKind::from(raw),
			Err(()) => TokenKind::Invalid,
		};

		if kind == TokenKind::Invalid {
			debug!(
				line = point.line,
				column = point.column,
				"skipping invalid character"
			);
		}

		self.state.point.advance(&self.source[span.range()]);
		match kind {
			TokenKind::Newline => self.state.first_in_line = true,
			TokenKind::Whitespace => {}
			_ => self.state.first_in_line = false,
		}

		Token {
			kind,
			span,
			point,
			first_in_line,
		}
	}

	fn finish(&mut self, span: Span, point: Point, first_in_line: bool) -> Token {
		let token = Token {
			kind: TokenKind::EndOfBuffer,
			span,
			point,
			first_in_line,
		};
		self.end = Some(token);
		token
	}
}

/// Tokenize the whole buffer, whitespace included, up to and including the
/// terminating `EndOfBuffer` token.
pub fn tokenize(source: &[u8]) -> Vec<Token> {
	let mut lexer = Lexer::new(source);
	let mut tokens = Vec::new();

	loop {
		let token = lexer.lex_one();
		tokens.push(token);
		if token.kind == TokenKind::EndOfBuffer {
			return tokens;
		}
	}
}

/// Offset of the first byte of the line containing `offset`.
pub(crate) fn line_start(source: &[u8], offset: usize) -> usize {
	source[..offset]
		.iter()
		.rposition(|byte| matches!(byte, b'\n' | b'\r'))
		.map_or(0, |index| index + 1)
}

/// When only spaces and tabs follow `offset` on its line, the offset just
/// past the line break (or the end of input). `None` otherwise.
pub(crate) fn blank_line_end(source: &[u8], offset: usize) -> Option<usize> {
	let mut cursor = offset;
	while matches!(source.get(cursor), Some(b' ' | b'\t')) {
		cursor += 1;
	}

	match source.get(cursor) {
		None | Some(b'\0') => Some(cursor),
		Some(b'\r') if source.get(cursor + 1) == Some(&b'\n') => Some(cursor + 2),
		Some(b'\n' | b'\r') => Some(cursor + 1),
		Some(_) => None,
	}
}
