use miette::Diagnostic;
use thiserror::Error;

use crate::Point;

/// Every located variant renders as `ERROR[<line>:<column>] <message>`.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DuctusError {
	#[error(transparent)]
	#[diagnostic(code(ductus::io_error))]
	Io(#[from] std::io::Error),

	#[error("ERROR[{line}:{column}] {message}")]
	#[diagnostic(code(ductus::syntax))]
	Syntax {
		line: usize,
		column: usize,
		message: String,
	},

	#[error("ERROR[{line}:{column}] reached end of file unexpectedly: {context}")]
	#[diagnostic(code(ductus::unexpected_eof))]
	UnexpectedEndOfFile {
		line: usize,
		column: usize,
		context: String,
	},

	#[error("ERROR[{line}:{column}] cannot nest `#fl` loops")]
	#[diagnostic(
		code(ductus::nested_loop),
		help("close the enclosing loop with `#efl(...)` before opening another one")
	)]
	NestedLoop { line: usize, column: usize },

	#[error("ERROR[{line}:{column}] `#efl` without a matching `#fl`")]
	#[diagnostic(code(ductus::unmatched_end_for))]
	UnmatchedEndFor { line: usize, column: usize },

	#[error("ERROR[{line}:{column}] too many {what} (limit: {limit})")]
	#[diagnostic(
		code(ductus::capacity_exceeded),
		help("raise `limits.{setting}` in ductus.toml")
	)]
	CapacityExceeded {
		line: usize,
		column: usize,
		what: &'static str,
		setting: &'static str,
		limit: usize,
	},

	#[error(
		"ERROR[{line}:{column}] word index {index} is out of range: the line has {available} \
		 identifier(s)"
	)]
	#[diagnostic(
		code(ductus::word_index_out_of_range),
		help("`#w(n)` counts identifiers from 0")
	)]
	WordIndexOutOfRange {
		line: usize,
		column: usize,
		index: usize,
		available: usize,
	},

	#[error(
		"ERROR[{line}:{column}] cannot clip {front} byte(s) from the front and {back} from the \
		 back of a {length}-byte line"
	)]
	#[diagnostic(code(ductus::line_clip_out_of_range))]
	LineClipOutOfRange {
		line: usize,
		column: usize,
		front: usize,
		back: usize,
		length: usize,
	},

	#[error("ERROR[{line}:{column}] braces are nested deeper than {limit} levels")]
	#[diagnostic(
		code(ductus::nesting_too_deep),
		help("raise `limits.max_nesting_depth` in ductus.toml")
	)]
	NestingTooDeep {
		line: usize,
		column: usize,
		limit: usize,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(ductus::config_parse),
		help("check that ductus.toml only sets `max_file_size` and a `[limits]` table")
	)]
	ConfigParse(String),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(ductus::file_too_large),
		help("raise `max_file_size` in ductus.toml")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },
}

impl DuctusError {
	pub(crate) fn syntax(point: Point, message: impl Into<String>) -> Self {
		Self::Syntax {
			line: point.line,
			column: point.column,
			message: message.into(),
		}
	}

	pub(crate) fn unexpected_eof(point: Point, context: impl Into<String>) -> Self {
		Self::UnexpectedEndOfFile {
			line: point.line,
			column: point.column,
			context: context.into(),
		}
	}

	pub(crate) fn capacity(
		point: Point,
		what: &'static str,
		setting: &'static str,
		limit: usize,
	) -> Self {
		Self::CapacityExceeded {
			line: point.line,
			column: point.column,
			what,
			setting,
			limit,
		}
	}

	/// The 1-indexed `(line, column)` the error points at, if any.
	pub fn location(&self) -> Option<(usize, usize)> {
		match self {
			Self::Syntax { line, column, .. }
			| Self::UnexpectedEndOfFile { line, column, .. }
			| Self::NestedLoop { line, column }
			| Self::UnmatchedEndFor { line, column }
			| Self::CapacityExceeded { line, column, .. }
			| Self::WordIndexOutOfRange { line, column, .. }
			| Self::LineClipOutOfRange { line, column, .. }
			| Self::NestingTooDeep { line, column, .. } => Some((*line, *column)),
			Self::Io(_) | Self::ConfigParse(_) | Self::FileTooLarge { .. } => None,
		}
	}
}

pub type DuctusResult<T> = Result<T, DuctusError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
