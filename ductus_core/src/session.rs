use tracing::trace;

use crate::DuctusError;
use crate::DuctusResult;
use crate::Limits;
use crate::edits::EditList;
use crate::lexer::Lexer;
use crate::replace::Replacement;
use crate::replace::substitute;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// All mutable state for rewriting one buffer: the lexer, the output ledger,
/// the read position (everything before it has been either copied or
/// deliberately dropped) and the replacements active in the enclosing
/// scopes. A session is used once and never shared.
pub(crate) struct Session<'a> {
	pub(crate) source: &'a [u8],
	pub(crate) lexer: Lexer<'a>,
	pub(crate) edits: EditList,
	pub(crate) read_pos: usize,
	pub(crate) replacements: Vec<Replacement<'a>>,
	pub(crate) limits: Limits,
}

impl<'a> Session<'a> {
	pub(crate) fn new(source: &'a [u8], limits: Limits) -> Self {
		Self {
			source,
			lexer: Lexer::new(source),
			edits: EditList::new(),
			read_pos: 0,
			replacements: Vec::new(),
			limits,
		}
	}

	/// Walk the whole buffer and return the finished edit list.
	pub(crate) fn run(mut self) -> DuctusResult<EditList> {
		self.walk_block(None, 0)?;
		self.flush_to(self.source.len());
		Ok(self.edits)
	}

	/// Walk tokens until the end of the buffer or, inside a block, until the
	/// `}` that closes it. The closing brace is left for the caller.
	/// `scope_start` is the offset just after the opening `{`, `None` at top
	/// level.
	fn walk_block(&mut self, scope_start: Option<usize>, depth: usize) -> DuctusResult<()> {
		loop {
			let token = self.lexer.peek();
			match token.kind {
				TokenKind::EndOfBuffer => return Ok(()),
				TokenKind::BraceClose if scope_start.is_some() => return Ok(()),
				_ => {}
			}
			self.lexer.next_token();

			match token.kind {
				TokenKind::BraceOpen => self.enter_block(token, depth)?,
				TokenKind::PoundFor => self.expand_loop(token)?,
				TokenKind::PoundEndFor => {
					return Err(DuctusError::UnmatchedEndFor {
						line: token.point.line,
						column: token.point.column,
					});
				}
				TokenKind::PoundReplace => self.begin_replace(token, scope_start)?,
				TokenKind::Quote => self.skip_string(),
				_ => {}
			}
		}
	}

	fn enter_block(&mut self, open: Token, depth: usize) -> DuctusResult<()> {
		if depth >= self.limits.max_nesting_depth {
			return Err(DuctusError::NestingTooDeep {
				line: open.point.line,
				column: open.point.column,
				limit: self.limits.max_nesting_depth,
			});
		}

		let outer_replacements = self.replacements.len();
		self.walk_block(Some(open.span.end), depth + 1)?;

		let close = self.lexer.peek();
		if close.kind == TokenKind::BraceClose {
			self.lexer.next_token();
			// Replacements made inside the block stop at its closing brace.
			if self.replacements.len() > outer_replacements {
				self.flush_to(close.span.start);
				self.replacements.truncate(outer_replacements);
			}
		}

		Ok(())
	}

	/// Skip to the next quote so quoted content is not read as directives.
	/// An unterminated string runs to the end of the buffer.
	fn skip_string(&mut self) {
		loop {
			let token = self.lexer.next_token();
			if matches!(token.kind, TokenKind::Quote | TokenKind::EndOfBuffer) {
				return;
			}
		}
	}

	/// Copy source bytes from the read position up to `end`, applying the
	/// active replacements on the way.
	pub(crate) fn flush_to(&mut self, end: usize) {
		if end <= self.read_pos {
			return;
		}

		let count = substitute(
			self.source,
			self.read_pos..end,
			&self.replacements,
			&mut self.edits,
		);
		if count > 0 {
			trace!(count, start = self.read_pos, end, "substituted");
		}
		self.read_pos = end;
	}

	/// Advance the read position without copying anything.
	pub(crate) fn skip_to(&mut self, end: usize) {
		self.read_pos = self.read_pos.max(end);
	}

	/// Consume the next token and require it to be of `kind`.
	pub(crate) fn expect(&mut self, kind: TokenKind, context: &str) -> DuctusResult<Token> {
		let token = self.lexer.next_token();

		if token.kind == kind {
			Ok(token)
		} else if token.kind == TokenKind::EndOfBuffer {
			Err(DuctusError::unexpected_eof(
				token.point,
				format!("expected {kind} {context}"),
			))
		} else {
			Err(DuctusError::syntax(
				token.point,
				format!("expected {kind} {context}, found {}", token.kind),
			))
		}
	}
}
