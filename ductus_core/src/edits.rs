use std::ops::Range;

use derive_more::Deref;
use tracing::trace;

/// Where the bytes of a fragment came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOrigin {
	/// A verbatim copy of this byte range of the source.
	Source(Range<usize>),
	/// Produced by a directive (loop expansion or replacement text).
	Synthesized,
}

/// An owned run of output bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFragment {
	pub origin: FragmentOrigin,
	pub bytes: Vec<u8>,
}

/// Append-only ledger of output fragments. Concatenating the fragments in
/// order yields the rewritten file. Source ranges are appended in strictly
/// increasing, non-overlapping order; any source range that never makes it
/// into the ledger is deleted from the output.
#[derive(Debug, Clone, Default, Deref)]
pub struct EditList {
	#[deref]
	fragments: Vec<EditFragment>,
	/// End of the last source range copied.
	source_end: usize,
}

impl EditList {
	pub fn new() -> Self {
		Self::default()
	}

	/// Copy `range` of `source` into the ledger. Empty ranges are ignored.
	pub fn copy_source(&mut self, source: &[u8], range: Range<usize>) {
		if range.is_empty() {
			return;
		}

		debug_assert!(
			range.start >= self.source_end,
			"source range {range:?} overlaps already copied bytes ending at {}",
			self.source_end
		);

		trace!(start = range.start, end = range.end, "copy source");
		self.source_end = range.end;
		self.fragments.push(EditFragment {
			bytes: source[range.clone()].to_vec(),
			origin: FragmentOrigin::Source(range),
		});
	}

	/// Append bytes that do not exist in the source. Empty input is ignored.
	pub fn push_synthesized(&mut self, bytes: impl Into<Vec<u8>>) {
		let bytes = bytes.into();
		if bytes.is_empty() {
			return;
		}

		trace!(len = bytes.len(), "push synthesized");
		self.fragments.push(EditFragment {
			origin: FragmentOrigin::Synthesized,
			bytes,
		});
	}

	/// Total number of output bytes.
	pub fn output_len(&self) -> usize {
		self.fragments.iter().map(|fragment| fragment.bytes.len()).sum()
	}

	/// Concatenate every fragment in append order.
	pub fn assemble(&self) -> Vec<u8> {
		let mut output = Vec::with_capacity(self.output_len());
		for fragment in &self.fragments {
			output.extend_from_slice(&fragment.bytes);
		}
		output
	}
}
