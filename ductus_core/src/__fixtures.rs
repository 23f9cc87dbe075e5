use rstest::fixture;

use crate::DuctusResult;
use crate::Limits;
use crate::TokenKind;
use crate::rewrite;
use crate::tokenize;

/// Rewrite with default limits and decode the output as UTF-8.
pub(crate) fn rewrite_text(input: &str) -> DuctusResult<String> {
	rewrite_text_with(input, Limits::default())
}

pub(crate) fn rewrite_text_with(input: &str, limits: Limits) -> DuctusResult<String> {
	let output = rewrite(input.as_bytes(), limits)?;
	Ok(String::from_utf8(output).expect("test output is valid UTF-8"))
}

/// Token kinds for `source` with whitespace dropped.
pub(crate) fn kinds(source: &str) -> Vec<TokenKind> {
	tokenize(source.as_bytes())
		.into_iter()
		.map(|token| token.kind)
		.filter(|kind| *kind != TokenKind::Whitespace)
		.collect()
}

#[fixture]
pub(crate) fn tight_limits() -> Limits {
	Limits {
		max_captured_tokens: 8,
		max_procedures: 3,
		max_nesting_depth: 2,
	}
}
