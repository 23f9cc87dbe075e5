use tracing::debug;

use crate::DuctusError;
use crate::DuctusResult;
use crate::Span;
use crate::lexer::blank_line_end;
use crate::lexer::line_start;
use crate::session::Session;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// One step of the recipe replayed for every captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
	/// Literal bytes from the procedure list, emitted as-is.
	Text(Span),
	/// `#l`: the line from its first to its last non-whitespace token.
	/// Leading indentation and trailing spaces or tabs are not included.
	Line,
	/// `#lc(front, back)`: the `#l` text minus `front` leading and `back`
	/// trailing bytes.
	LineClip { front: usize, back: usize },
	/// `#w(index)`: the `index`-th identifier on the line, from 0.
	Word(usize),
}

/// The tokens of one source line inside a `#fl` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CapturedLine {
	/// Offset of the first byte of the line, indentation included.
	pub start: usize,
	/// Non-whitespace tokens, line break excluded.
	pub tokens: Vec<Token>,
	/// The line break. Absent only for the text in front of `#efl`.
	pub terminator: Option<Token>,
}

impl CapturedLine {
	fn starting_at(start: usize) -> Self {
		Self {
			start,
			tokens: Vec::new(),
			terminator: None,
		}
	}

	/// Bytes from the first to the end of the last token. Trailing blanks
	/// are excluded.
	fn text<'a>(&self, source: &'a [u8]) -> &'a [u8] {
		match (self.tokens.first(), self.tokens.last()) {
			(Some(first), Some(last)) => &source[first.span.start..last.span.end],
			_ => &[],
		}
	}

	/// The whole source line, line break included.
	fn verbatim<'a>(&self, source: &'a [u8]) -> &'a [u8] {
		let end = self
			.terminator
			.or_else(|| self.tokens.last().copied())
			.map_or(self.start, |token| token.span.end);
		&source[self.start..end]
	}
}

impl Session<'_> {
	/// Handle `#fl` … `#efl(<procedures>)`.
	///
	/// The source before the directive is flushed, the whole construct is cut
	/// out, and a single synthesized block holding the replayed lines takes
	/// its place.
	pub(crate) fn expand_loop(&mut self, directive: Token) -> DuctusResult<()> {
		let cut = if directive.first_in_line {
			line_start(self.source, directive.span.start)
		} else {
			directive.span.start
		};
		self.flush_to(cut);

		let body_start = self.skip_directive_line(directive)?;
		let lines = self.capture_body(directive, body_start)?;
		let open = self.expect(TokenKind::ParenOpen, "after `#efl`")?;
		let (procedures, close) = self.parse_procedures(open)?;
		let expansion = self.replay(&lines, &procedures)?;

		debug!(
			line = directive.point.line,
			lines = lines.len(),
			procedures = procedures.len(),
			bytes = expansion.len(),
			"expanded loop"
		);

		self.edits.push_synthesized(expansion);
		let resume = blank_line_end(self.source, close.span.end).unwrap_or(close.span.end);
		self.skip_to(resume);

		Ok(())
	}

	/// Discard the rest of the `#fl` line and return where the body starts.
	fn skip_directive_line(&mut self, directive: Token) -> DuctusResult<usize> {
		loop {
			let token = self.lexer.next_token();
			match token.kind {
				TokenKind::Newline => return Ok(token.span.end),
				TokenKind::EndOfBuffer => {
					return Err(DuctusError::unexpected_eof(
						token.point,
						format!(
							"`#fl` opened at {}:{} has no body",
							directive.point.line, directive.point.column
						),
					));
				}
				_ => {}
			}
		}
	}

	/// Capture body lines up to and including the text in front of `#efl`.
	fn capture_body(
		&mut self,
		directive: Token,
		body_start: usize,
	) -> DuctusResult<Vec<CapturedLine>> {
		let limit = self.limits.max_captured_tokens;
		let mut lines = Vec::new();
		let mut current = CapturedLine::starting_at(body_start);
		let mut captured = 0usize;

		loop {
			let token = self.lexer.next_token();
			match token.kind {
				TokenKind::EndOfBuffer => {
					return Err(DuctusError::unexpected_eof(
						token.point,
						format!(
							"`#fl` opened at {}:{} is never closed by `#efl`",
							directive.point.line, directive.point.column
						),
					));
				}
				TokenKind::PoundFor => {
					return Err(DuctusError::NestedLoop {
						line: token.point.line,
						column: token.point.column,
					});
				}
				TokenKind::PoundEndFor => {
					lines.push(current);
					return Ok(lines);
				}
				_ => {}
			}

			captured += 1;
			if captured > limit {
				return Err(DuctusError::capacity(
					token.point,
					"tokens in a `#fl` body",
					"max_captured_tokens",
					limit,
				));
			}

			if token.kind == TokenKind::Newline {
				current.terminator = Some(token);
				let next = CapturedLine::starting_at(token.span.end);
				lines.push(std::mem::replace(&mut current, next));
			} else {
				current.tokens.push(token);
			}
		}
	}

	/// Parse the procedure list after `#efl(` up to its matching `)`. Literal
	/// text between procedures is kept byte for byte.
	fn parse_procedures(&mut self, open: Token) -> DuctusResult<(Vec<Procedure>, Token)> {
		let mut procedures = Vec::new();
		let mut depth = 1usize;
		let mut text_start = open.span.end;

		loop {
			let token = self.lexer.next_token();
			match token.kind {
				TokenKind::EndOfBuffer => {
					return Err(DuctusError::unexpected_eof(
						token.point,
						format!(
							"procedure list opened at {}:{} is never closed",
							open.point.line, open.point.column
						),
					));
				}
				TokenKind::ParenOpen => depth += 1,
				TokenKind::ParenClose => {
					depth -= 1;
					if depth == 0 {
						self.push_text(&mut procedures, text_start, token)?;
						return Ok((procedures, token));
					}
				}
				TokenKind::PoundLine | TokenKind::PoundLineClip | TokenKind::PoundWord => {
					self.push_text(&mut procedures, text_start, token)?;
					let (procedure, end) = self.parse_procedure(token)?;
					self.push_procedure(&mut procedures, procedure, token)?;
					text_start = end;
				}
				TokenKind::PoundFor | TokenKind::PoundEndFor | TokenKind::PoundReplace => {
					return Err(DuctusError::syntax(
						token.point,
						format!("{} is not allowed inside a procedure list", token.kind),
					));
				}
				_ => {}
			}
		}
	}

	/// Parse the arguments of `#l`, `#lc(a, b)` or `#w(i)`. Returns the
	/// procedure and the offset just past it.
	fn parse_procedure(&mut self, keyword: Token) -> DuctusResult<(Procedure, usize)> {
		match keyword.kind {
			TokenKind::PoundLineClip => {
				self.expect(TokenKind::ParenOpen, "after `#lc`")?;
				let front = self.expect_integer("as the first `#lc` argument")?;
				self.expect(TokenKind::Comma, "between `#lc` arguments")?;
				let back = self.expect_integer("as the second `#lc` argument")?;
				let close = self.expect(TokenKind::ParenClose, "to close `#lc(`")?;
				Ok((Procedure::LineClip { front, back }, close.span.end))
			}
			TokenKind::PoundWord => {
				self.expect(TokenKind::ParenOpen, "after `#w`")?;
				let index = self.expect_integer("as the `#w` argument")?;
				let close = self.expect(TokenKind::ParenClose, "to close `#w(`")?;
				Ok((Procedure::Word(index), close.span.end))
			}
			_ => Ok((Procedure::Line, keyword.span.end)),
		}
	}

	fn expect_integer(&mut self, context: &str) -> DuctusResult<usize> {
		let token = self.expect(TokenKind::Integer, context)?;
		let digits = String::from_utf8_lossy(token.bytes(self.source));
		digits.parse().map_err(|_| {
			DuctusError::syntax(
				token.point,
				format!("integer `{digits}` {context} is too large"),
			)
		})
	}

	fn push_text(
		&self,
		procedures: &mut Vec<Procedure>,
		start: usize,
		next: Token,
	) -> DuctusResult<()> {
		let span = Span::new(start, next.span.start);
		if span.is_empty() {
			return Ok(());
		}

		self.push_procedure(procedures, Procedure::Text(span), next)
	}

	fn push_procedure(
		&self,
		procedures: &mut Vec<Procedure>,
		procedure: Procedure,
		at: Token,
	) -> DuctusResult<()> {
		let limit = self.limits.max_procedures;
		if procedures.len() >= limit {
			return Err(DuctusError::capacity(
				at.point,
				"procedures in an `#efl` list",
				"max_procedures",
				limit,
			));
		}

		procedures.push(procedure);
		Ok(())
	}

	/// Run every procedure over every captured line.
	///
	/// Blank lines and lines starting with `//` are copied unchanged. Every
	/// other line is rebuilt from the procedures and ends with its own line
	/// break, or `\n` for the text in front of `#efl`.
	fn replay(&self, lines: &[CapturedLine], procedures: &[Procedure]) -> DuctusResult<Vec<u8>> {
		let mut output = Vec::new();

		for line in lines {
			let Some(first) = line.tokens.first() else {
				if line.terminator.is_some() {
					output.extend_from_slice(line.verbatim(self.source));
				}
				continue;
			};

			if first.kind == TokenKind::Comment {
				output.extend_from_slice(line.verbatim(self.source));
			} else {
				for procedure in procedures {
					self.apply(*procedure, line, &mut output)?;
				}
				if let Some(terminator) = line.terminator {
					output.extend_from_slice(terminator.bytes(self.source));
				}
			}

			if line.terminator.is_none() {
				output.push(b'\n');
			}
		}

		Ok(output)
	}

	fn apply(
		&self,
		procedure: Procedure,
		line: &CapturedLine,
		output: &mut Vec<u8>,
	) -> DuctusResult<()> {
		match procedure {
			Procedure::Text(span) => output.extend_from_slice(&self.source[span.range()]),
			Procedure::Line => output.extend_from_slice(line.text(self.source)),
			Procedure::LineClip { front, back } => {
				let text = line.text(self.source);
				if front.checked_add(back).is_none_or(|total| total > text.len()) {
					let point = line.tokens[0].point;
					return Err(DuctusError::LineClipOutOfRange {
						line: point.line,
						column: point.column,
						front,
						back,
						length: text.len(),
					});
				}
				output.extend_from_slice(&text[front..text.len() - back]);
			}
			Procedure::Word(index) => {
				let words: Vec<&Token> = line
					.tokens
					.iter()
					.filter(|token| token.kind == TokenKind::Identifier)
					.collect();
				let Some(word) = words.get(index) else {
					let point = line.tokens[0].point;
					return Err(DuctusError::WordIndexOutOfRange {
						line: point.line,
						column: point.column,
						index,
						available: words.len(),
					});
				};
				output.extend_from_slice(word.bytes(self.source));
			}
		}

		Ok(())
	}
}
