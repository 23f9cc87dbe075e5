use std::ops::Range;

use tracing::debug;

use crate::DuctusResult;
use crate::Point;
use crate::edits::EditList;
use crate::lexer::blank_line_end;
use crate::lexer::line_start;
use crate::session::Session;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// A `#r target replacement` directive in effect until the end of its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Replacement<'a> {
	pub target: &'a [u8],
	pub replacement: &'a [u8],
	/// Where the directive was written.
	pub point: Point,
}

impl Session<'_> {
	/// Handle `#r target replacement`.
	///
	/// The directive is removed (its whole line when nothing else is on it),
	/// the text before it is flushed untouched, and the replacement becomes
	/// active for the rest of the enclosing scope.
	pub(crate) fn begin_replace(
		&mut self,
		directive: Token,
		scope_start: Option<usize>,
	) -> DuctusResult<()> {
		let target = self.expect(TokenKind::Identifier, "as the `#r` target")?;
		let replacement = self.expect(TokenKind::Identifier, "as the `#r` replacement")?;

		let removal = match blank_line_end(self.source, replacement.span.end) {
			Some(end) if directive.first_in_line => line_start(self.source, directive.span.start)..end,
			_ => directive.span.start..replacement.span.end,
		};

		self.flush_to(removal.start);
		self.skip_to(removal.end);

		let active = Replacement {
			target: target.bytes(self.source),
			replacement: replacement.bytes(self.source),
			point: directive.point,
		};

		debug!(
			line = active.point.line,
			target = %String::from_utf8_lossy(active.target),
			replacement = %String::from_utf8_lossy(active.replacement),
			scope_start = ?scope_start,
			"replacement active"
		);

		self.replacements.push(active);
		Ok(())
	}
}

/// Copy `range` of `source` into `edits`, splicing in replacements.
///
/// Scans left to right; at each byte the active replacements are tried most
/// recent first. A match emits the unmatched prefix as a source fragment and
/// the replacement as a synthesized fragment, then resumes after the match,
/// so matches never overlap and replacement text is never rescanned.
/// Returns the number of substitutions made.
pub(crate) fn substitute(
	source: &[u8],
	range: Range<usize>,
	active: &[Replacement<'_>],
	edits: &mut EditList,
) -> usize {
	if active.is_empty() {
		edits.copy_source(source, range);
		return 0;
	}

	let mut count = 0;
	let mut segment_start = range.start;
	let mut cursor = range.start;

	while cursor < range.end {
		let window = &source[cursor..range.end];
		let Some(hit) = active
			.iter()
			.rev()
			.find(|replacement| window.starts_with(replacement.target))
		else {
			cursor += 1;
			continue;
		};

		edits.copy_source(source, segment_start..cursor);
		edits.push_synthesized(hit.replacement);
		cursor += hit.target.len();
		segment_start = cursor;
		count += 1;
	}

	edits.copy_source(source, segment_start..range.end);
	count
}
