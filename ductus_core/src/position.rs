use std::ops::Range;

/// A location in the source buffer. `line` and `column` are 1-indexed,
/// `offset` is the 0-indexed byte offset. Columns count bytes, not
/// characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

impl Default for Point {
	fn default() -> Self {
		Self::new(1, 1, 0)
	}
}

impl Point {
	pub const fn new(line: usize, column: usize, offset: usize) -> Self {
		Self {
			line,
			column,
			offset,
		}
	}

	/// Move the point past `bytes`. `\r\n`, `\n` and a lone `\r` each start a
	/// new line.
	pub fn advance(&mut self, bytes: &[u8]) {
		let mut iter = bytes.iter().peekable();

		while let Some(byte) = iter.next() {
			match byte {
				b'\r' if iter.peek() == Some(&&b'\n') => {
					self.offset += 1;
				}
				b'\n' | b'\r' => {
					self.line += 1;
					self.column = 1;
					self.offset += 1;
				}
				_ => {
					self.column += 1;
					self.offset += 1;
				}
			}
		}
	}
}

/// A half-open byte range into the immutable source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
	pub start: usize,
	pub end: usize,
}

impl Span {
	pub const fn new(start: usize, end: usize) -> Self {
		Self { start, end }
	}

	/// An empty span sitting at `offset`.
	pub const fn empty(offset: usize) -> Self {
		Self::new(offset, offset)
	}

	pub const fn len(&self) -> usize {
		self.end - self.start
	}

	pub const fn is_empty(&self) -> bool {
		self.start == self.end
	}

	pub const fn range(&self) -> Range<usize> {
		self.start..self.end
	}
}

impl From<Range<usize>> for Span {
	fn from(range: Range<usize>) -> Self {
		Self::new(range.start, range.end)
	}
}
