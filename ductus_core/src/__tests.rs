use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;

#[rstest]
#[case::identifiers_and_numbers("foo _bar9 42 3.14", vec![
	TokenKind::Identifier,
	TokenKind::Identifier,
	TokenKind::Integer,
	TokenKind::Float,
	TokenKind::EndOfBuffer,
])]
#[case::directive_keywords("#r #l #lc #fl #efl #w #x", vec![
	TokenKind::PoundReplace,
	TokenKind::PoundLine,
	TokenKind::PoundLineClip,
	TokenKind::PoundFor,
	TokenKind::PoundEndFor,
	TokenKind::PoundWord,
	TokenKind::Pound,
	TokenKind::Identifier,
	TokenKind::EndOfBuffer,
])]
#[case::keyword_prefix_splits_identifier("#replace", vec![
	TokenKind::PoundReplace,
	TokenKind::Identifier,
	TokenKind::EndOfBuffer,
])]
#[case::punctuation("(){},\"/ //", vec![
	TokenKind::ParenOpen,
	TokenKind::ParenClose,
	TokenKind::BraceOpen,
	TokenKind::BraceClose,
	TokenKind::Comma,
	TokenKind::Quote,
	TokenKind::Slash,
	TokenKind::Comment,
	TokenKind::EndOfBuffer,
])]
#[case::line_endings("a\r\nb\rc\nd", vec![
	TokenKind::Identifier,
	TokenKind::Newline,
	TokenKind::Identifier,
	TokenKind::Newline,
	TokenKind::Identifier,
	TokenKind::Newline,
	TokenKind::Identifier,
	TokenKind::EndOfBuffer,
])]
#[case::invalid_bytes_recover("a;é b", vec![
	TokenKind::Identifier,
	TokenKind::Invalid,
	TokenKind::Invalid,
	TokenKind::Invalid,
	TokenKind::Identifier,
	TokenKind::EndOfBuffer,
])]
#[case::nul_ends_buffer("a\0b c", vec![TokenKind::Identifier, TokenKind::EndOfBuffer])]
fn lex_token_kinds(#[case] input: &str, #[case] expected: Vec<TokenKind>) {
	assert_eq!(kinds(input), expected);
}

#[test]
fn lexer_tracks_lines_and_columns() {
	let tokens: Vec<Token> = tokenize(b"ab  cd\r\n\tef")
		.into_iter()
		.filter(|token| token.kind == TokenKind::Identifier)
		.collect();

	let points: Vec<(usize, usize, usize)> = tokens
		.iter()
		.map(|token| (token.point.line, token.point.column, token.point.offset))
		.collect();
	assert_eq!(points, vec![(1, 1, 0), (1, 5, 4), (2, 2, 9)]);
}

#[test]
fn lexer_flags_first_token_in_line() {
	let flags: Vec<bool> = tokenize(b"  #r a b\nx #r")
		.into_iter()
		.filter(|token| token.kind == TokenKind::PoundReplace)
		.map(|token| token.first_in_line)
		.collect();

	assert_eq!(flags, vec![true, false]);
}

#[test]
fn lexer_end_of_buffer_is_sticky() {
	let mut lexer = Lexer::new(b"x");
	assert_eq!(lexer.next_token().kind, TokenKind::Identifier);

	let end = lexer.next_token();
	assert_eq!(end.kind, TokenKind::EndOfBuffer);
	assert_eq!(end.span, Span::empty(1));
	assert_eq!(lexer.next_token(), end);
	assert_eq!(lexer.peek(), end);
}

#[test]
fn lexer_peek_does_not_consume() {
	let mut lexer = Lexer::new(b"  a b");
	let peeked = lexer.peek();
	assert_eq!(peeked.kind, TokenKind::Identifier);
	assert_eq!(lexer.next_token(), peeked);
	assert_eq!(lexer.next_token().span, Span::new(4, 5));
}

#[test]
fn lexer_state_follows_consumed_tokens() {
	let mut lexer = Lexer::new(b"ab\n  c");
	assert_eq!(
		lexer.state(),
		LexerState {
			point: Point::default(),
			first_in_line: true,
		}
	);

	lexer.next_token();
	lexer.next_token();
	let state = lexer.state();
	assert_eq!(state.point, Point::new(2, 1, 3));
	assert!(state.first_in_line);

	lexer.next_token();
	assert_eq!(lexer.state().point, Point::new(2, 4, 6));
	assert!(!lexer.state().first_in_line);
}

#[test]
#[traced_test]
fn lexer_logs_invalid_characters() {
	assert_eq!(kinds("a$b")[1], TokenKind::Invalid);
	assert!(logs_contain("skipping invalid character"));
}

#[test]
fn point_advance_handles_line_breaks() {
	let mut point = Point::default();
	point.advance(b"ab\r\ncd\re\n");
	assert_eq!(point, Point::new(4, 1, 9));
}

#[rstest]
#[case::plain_text("int main() {\n\treturn 0; // \"ok\"\n}\n")]
#[case::empty("")]
#[case::unbalanced_braces("}\n{ {\nstill here\n")]
#[case::host_preprocessor("#include <stdio.h>\n#define X 1\n")]
#[case::stray_procedure_keywords("#l #lc #w are plain text here\n")]
#[case::unicode("let café = \"naïve\";\n")]
#[case::loop_keyword_in_string("\"#fl\" a\n")]
#[case::end_for_in_string("\"#efl(#l)\"\n")]
#[case::unterminated_string_hides_directives("x = \"open {\n#efl(#l)\n#fl\n")]
fn no_directives_round_trip(#[case] input: &str) -> DuctusResult<()> {
	assert_eq!(rewrite_text(input)?, input);

	Ok(())
}

#[rstest]
#[case::line_with_suffix("#fl\nfoo\nbar\n#efl(#l;)\n", "foo;\nbar;\n")]
#[case::word_selection("#fl\nint x\nint y\n#efl(#w(1))\n", "x\ny\n")]
#[case::words_and_text(
	"#fl\nint a\nfloat b\n#efl(#w(0) #w(1) = 0;)\n",
	"int a = 0;\nfloat b = 0;\n"
)]
#[case::line_clip("#fl\nfoo_bar;\n#efl(#lc(4, 1))\n", "bar\n")]
#[case::nested_parens_in_text("#fl\nx\ny\n#efl(f(#l);)\n", "f(x);\nf(y);\n")]
#[case::indented_directive_line_removed("\t#fl\n\tfoo\n\t#efl(<#l>)\n", "<foo>\n")]
#[case::blank_and_comment_lines(
	"#fl\na\n\n  // note\nb\n#efl(#l,)\n",
	"a,\n\n  // note\nb,\n"
)]
#[case::text_before_directive_kept("a #fl\nb\n#efl(#l)\n", "a b\n")]
#[case::text_after_list_kept("#fl\nb\n#efl(#l) tail\n", "b\n tail\n")]
#[case::crlf("#fl\r\nfoo\r\n#efl(#l;)\r\n", "foo;\r\n")]
#[case::line_before_end_for("#fl\nfoo\nbar #efl(#l;)\n", "foo;\nbar;\n")]
#[case::surrounding_text(
	"before\n#fl\none\n#efl(- #l)\nafter\n",
	"before\n- one\nafter\n"
)]
#[case::empty_procedure_list("#fl\na\nb\n#efl()\n", "\n\n")]
#[case::bare_pound_is_text("#fl\nX\n#efl(#define #l)\n", "#define X\n")]
#[case::line_excludes_trailing_blanks("#fl\n  foo bar \t\n#efl(<#l>)\n", "<foo bar>\n")]
fn expand_loops(#[case] input: &str, #[case] expected: &str) -> DuctusResult<()> {
	assert_eq!(rewrite_text(input)?, expected);

	Ok(())
}

#[rstest]
#[case::own_line_elided("#r foo bar\nfoo is great, foo wins\n", "bar is great, bar wins\n")]
#[case::inline_directive_keeps_line("x = 1; #r x y\nx + x\n", "x = 1; \ny + y\n")]
#[case::text_before_untouched("foo\n#r foo bar\nfoo\n", "foo\nbar\n")]
#[case::reaches_nested_blocks("#r a b\n{ a { a } }\na\n", "{ b { b } }\nb\n")]
#[case::several_in_one_scope("#r a b\n#r c d\na c\n", "b d\n")]
#[case::most_recent_tried_first("#r ab x\n#r a y\nab a\n", "yb y\n")]
#[case::leftmost_without_overlap("#r aa b\naaa\n", "ba\n")]
#[case::substring_match("#r foo bar\nfood\n", "bard\n")]
#[case::inside_quotes("#r a b\n\"a\"\n", "\"b\"\n")]
#[case::stray_close_brace("}\n#r a b\na\n", "}\nb\n")]
#[case::unclosed_block_runs_to_end("{\n#r a b\na\n", "{\nb\n")]
#[case::later_directives_still_run(
	"#r a b\n#fl\nx\n#efl(a#l)\na\n",
	"ax\nb\n"
)]
#[case::quoted_brace_keeps_scope_open("{ #r a b \"}\" a } a", "{  \"}\" b } a")]
#[case::unterminated_string_runs_to_end("#r a b\nx \"a #fl\n", "x \"b #fl\n")]
fn replace_in_scope(#[case] input: &str, #[case] expected: &str) -> DuctusResult<()> {
	assert_eq!(rewrite_text(input)?, expected);

	Ok(())
}

#[test]
fn replace_never_leaves_its_block() -> DuctusResult<()> {
	let before = "foo();\nvoid f() {\n";
	let after = "}\nfoo();\n";
	let input = format!("{before}\t#r foo bar\n\tfoo(foo);\n{after}");

	let output = rewrite_text(&input)?;
	assert_eq!(output, format!("{before}\tbar(bar);\n{after}"));
	assert!(output.starts_with(before));
	assert!(output.ends_with(after));

	Ok(())
}

#[rstest]
#[case::loop_output("#fl\nfoo\nbar\n#efl(#l;)\n")]
#[case::replace_output("#r foo bar\nfoo is great, foo wins\n")]
#[case::scoped_output("x {\n#r x y\nx\n} x\n")]
fn second_run_is_a_no_op(#[case] input: &str) -> DuctusResult<()> {
	let first = rewrite_text(input)?;
	assert_eq!(rewrite_text(&first)?, first);

	Ok(())
}

#[rstest]
#[case::latin1_comment(b"// caf\xE9\nint x;\n")]
#[case::stray_high_bytes(b"\xFF\xFE{ \x80 }\n")]
fn non_utf8_round_trip(#[case] input: &[u8]) -> DuctusResult<()> {
	assert_eq!(rewrite(input, Limits::default())?, input);

	Ok(())
}

#[rstest]
#[case::loop_after_latin1(b"caf\xE9 #fl\nx\n#efl(#l;)\n", b"caf\xE9 x;\n")]
#[case::latin1_inside_loop_line(b"#fl\nint\xE9 x\n#efl(#w(1) #l)\n", b"x int\xE9 x\n")]
#[case::replace_between_high_bytes(b"#r a b\n\xE9a\xFF\n", b"\xE9b\xFF\n")]
fn non_utf8_directives_expand(#[case] input: &[u8], #[case] expected: &[u8]) -> DuctusResult<()> {
	assert_eq!(rewrite(input, Limits::default())?, expected);

	Ok(())
}

#[test]
fn non_ascii_bytes_are_single_invalid_tokens() {
	let tokens: Vec<(TokenKind, Span)> = tokenize(b"a\xE9b")
		.into_iter()
		.map(|token| (token.kind, token.span))
		.collect();

	assert_eq!(
		tokens,
		vec![
			(TokenKind::Identifier, Span::new(0, 1)),
			(TokenKind::Invalid, Span::new(1, 2)),
			(TokenKind::Identifier, Span::new(2, 3)),
			(TokenKind::EndOfBuffer, Span::empty(3)),
		]
	);
}

#[test]
fn edit_list_records_fragment_origins() -> DuctusResult<()> {
	let source = "foo\n#r foo bar\nfoo foo\n";
	let edits = build_edits(source.as_bytes(), Limits::default())?;

	let origins: Vec<FragmentOrigin> = edits.iter().map(|fragment| fragment.origin.clone()).collect();
	assert_eq!(
		origins,
		vec![
			FragmentOrigin::Source(0..4),
			FragmentOrigin::Synthesized,
			FragmentOrigin::Source(18..19),
			FragmentOrigin::Synthesized,
			FragmentOrigin::Source(22..23),
		]
	);
	assert_eq!(edits.assemble(), b"foo\nbar bar\n");
	assert_eq!(edits.output_len(), 12);

	Ok(())
}

#[test]
fn edit_list_skips_empty_fragments() {
	let mut edits = EditList::new();
	edits.copy_source(b"abc", 1..1);
	edits.push_synthesized(Vec::<u8>::new());
	assert!(edits.is_empty());

	edits.copy_source(b"abc", 0..2);
	edits.push_synthesized(b"!".to_vec());
	edits.copy_source(b"abc", 2..3);
	assert_eq!(edits.len(), 3);
	assert_eq!(edits.assemble(), b"ab!c");
}

#[test]
fn line_clip_is_byte_based() -> DuctusResult<()> {
	let output = rewrite(b"#fl\nx\xC3\xA9\n#efl(#lc(0, 1))\n", Limits::default())?;
	assert_eq!(output, b"x\xC3\n");

	Ok(())
}

fn assert_error_at(error: &DuctusError, line: usize, column: usize) {
	assert_eq!(error.location(), Some((line, column)), "{error}");
	assert!(
		error.to_string().starts_with(&format!("ERROR[{line}:{column}] ")),
		"{error}"
	);
}

#[rstest]
#[case::unterminated_loop("#fl\nfoo\n", 3, 1)]
#[case::loop_without_body("#fl", 1, 4)]
#[case::unclosed_procedure_list("#fl\na\n#efl(#l\n", 4, 1)]
#[case::replace_at_end_of_file("#r foo", 1, 7)]
fn unexpected_end_of_file(
	#[case] input: &str,
	#[case] line: usize,
	#[case] column: usize,
) {
	let error = rewrite(input.as_bytes(), Limits::default()).unwrap_err();
	assert!(matches!(error, DuctusError::UnexpectedEndOfFile { .. }), "{error}");
	assert_error_at(&error, line, column);
}

#[rstest]
#[case::missing_paren("#fl\na\n#efl #l\n", 3, 6)]
#[case::replace_missing_argument("#r foo\nbar\n", 1, 7)]
#[case::replace_number_argument("#r foo 42\n", 1, 8)]
#[case::float_argument("#fl\na\n#efl(#lc(1.5, 0))\n", 3, 10)]
#[case::missing_comma("#fl\na\n#efl(#lc(1 0))\n", 3, 12)]
#[case::directive_in_list("#fl\na\n#efl(#r)\n", 3, 6)]
#[case::integer_overflow("#fl\na\n#efl(#w(99999999999999999999999))\n", 3, 9)]
fn syntax_errors(#[case] input: &str, #[case] line: usize, #[case] column: usize) {
	let error = rewrite(input.as_bytes(), Limits::default()).unwrap_err();
	assert!(matches!(error, DuctusError::Syntax { .. }), "{error}");
	assert_error_at(&error, line, column);
}

#[test]
fn nested_loops_are_rejected() {
	let error = rewrite(b"#fl\n#fl\n#efl(#l)\n", Limits::default()).unwrap_err();
	assert!(matches!(error, DuctusError::NestedLoop { .. }));
	insta::assert_snapshot!(error.to_string(), @"ERROR[2:1] cannot nest `#fl` loops");
}

#[test]
fn stray_end_for_is_rejected() {
	let error = rewrite(b"x\n#efl(#l)\n", Limits::default()).unwrap_err();
	assert!(matches!(error, DuctusError::UnmatchedEndFor { .. }));
	insta::assert_snapshot!(error.to_string(), @"ERROR[2:1] `#efl` without a matching `#fl`");
}

#[test]
fn word_index_out_of_range() {
	let error = rewrite(b"#fl\nint x\nfoo\n#efl(#w(1))\n", Limits::default()).unwrap_err();
	assert!(matches!(
		error,
		DuctusError::WordIndexOutOfRange {
			index: 1,
			available: 1,
			..
		}
	));
	assert_error_at(&error, 3, 1);
}

#[test]
fn line_clip_out_of_range() {
	let error = rewrite(b"#fl\n  ab\n#efl(#lc(2, 1))\n", Limits::default()).unwrap_err();
	assert!(matches!(
		error,
		DuctusError::LineClipOutOfRange {
			front: 2,
			back: 1,
			length: 2,
			..
		}
	));
	assert_error_at(&error, 2, 3);
	insta::assert_snapshot!(
		error.to_string(),
		@"ERROR[2:3] cannot clip 2 byte(s) from the front and 1 from the back of a 2-byte line"
	);
}

#[rstest]
fn captured_tokens_are_bounded(tight_limits: Limits) {
	let error = rewrite_text_with("#fl\na b c d e f g h i\n#efl(#l)\n", tight_limits).unwrap_err();
	assert!(matches!(
		error,
		DuctusError::CapacityExceeded {
			setting: "max_captured_tokens",
			limit: 8,
			..
		}
	));
	assert_error_at(&error, 2, 17);
}

#[rstest]
fn procedures_are_bounded(tight_limits: Limits) {
	let error = rewrite_text_with("#fl\na\n#efl(#l #l #l #l)\n", tight_limits).unwrap_err();
	assert!(matches!(
		error,
		DuctusError::CapacityExceeded {
			setting: "max_procedures",
			limit: 3,
			..
		}
	));
}

#[rstest]
fn nesting_depth_is_bounded(tight_limits: Limits) -> DuctusResult<()> {
	assert_eq!(rewrite_text_with("{{}}", tight_limits)?, "{{}}");

	let error = rewrite_text_with("{{{}}}", tight_limits).unwrap_err();
	assert!(matches!(error, DuctusError::NestingTooDeep { limit: 2, .. }));
	assert_error_at(&error, 1, 3);

	Ok(())
}

#[test]
fn config_defaults_match_limits() -> DuctusResult<()> {
	let config = DuctusConfig::from_toml("")?;
	assert_eq!(config, DuctusConfig::default());
	assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
	assert_eq!(config.limits.max_captured_tokens, 4096);
	assert_eq!(config.limits.max_procedures, 128);

	Ok(())
}

#[test]
fn config_partial_limits_keep_defaults() -> DuctusResult<()> {
	let config = DuctusConfig::from_toml("max_file_size = 64\n\n[limits]\nmax_procedures = 4\n")?;
	assert_eq!(config.max_file_size, 64);
	assert_eq!(config.limits.max_procedures, 4);
	assert_eq!(config.limits.max_captured_tokens, 4096);
	assert_eq!(config.limits.max_nesting_depth, 256);

	Ok(())
}

#[rstest]
#[case::unknown_top_level("max_size = 1\n")]
#[case::unknown_limit("[limits]\nmax_words = 1\n")]
#[case::wrong_type("max_file_size = \"big\"\n")]
fn config_rejects_invalid_toml(#[case] content: &str) {
	let error = DuctusConfig::from_toml(content).unwrap_err();
	assert!(matches!(error, DuctusError::ConfigParse(_)), "{error}");
}

#[test]
fn config_discovery_order() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	assert!(DuctusConfig::load(tmp.path())?.is_none());

	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(
		tmp.path().join(".config/ductus.toml"),
		"[limits]\nmax_procedures = 7\n",
	)?;
	std::fs::write(tmp.path().join(".ductus.toml"), "[limits]\nmax_procedures = 9\n")?;

	let config = DuctusConfig::load(tmp.path())?.expect("config is discovered");
	assert_eq!(config.limits.max_procedures, 9);

	Ok(())
}

#[test]
fn compute_and_write_rewrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("vec.c");
	std::fs::write(&path, "#fl\nx\ny\n#efl(float #l;)\n")?;

	let result = compute_rewrite(&path, &DuctusConfig::default())?;
	assert!(result.is_changed());
	assert_eq!(std::fs::read(&path)?, result.original);

	assert!(write_rewrite(&result)?);
	assert_eq!(std::fs::read_to_string(&path)?, "float x;\nfloat y;\n");

	let again = compute_rewrite(&path, &DuctusConfig::default())?;
	assert!(!again.is_changed());
	assert!(!write_rewrite(&again)?);

	Ok(())
}

#[test]
fn non_utf8_file_is_read_as_bytes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let plain = tmp.path().join("plain.c");
	let looped = tmp.path().join("looped.c");
	std::fs::write(&plain, b"// caf\xE9\nint x;\n")?;
	std::fs::write(&looped, b"caf\xE9 #fl\nx\n#efl(#l;)\n")?;

	let result = compute_rewrite(&plain, &DuctusConfig::default())?;
	assert!(!result.is_changed());
	assert!(!write_rewrite(&result)?);
	assert_eq!(std::fs::read(&plain)?, b"// caf\xE9\nint x;\n");

	let result = compute_rewrite(&looped, &DuctusConfig::default())?;
	assert!(write_rewrite(&result)?);
	assert_eq!(std::fs::read(&looped)?, b"caf\xE9 x;\n");

	Ok(())
}

#[rstest]
#[case::unmatched_for("#fl\nfoo\n")]
#[case::unmatched_end_for("foo\n#efl(#l)\n")]
#[case::missing_argument("#r foo\n")]
#[case::clip_out_of_range("#fl\nab\n#efl(#lc(3, 0))\n")]
#[case::word_out_of_range("#fl\nab\n#efl(#w(5))\n")]
fn failed_rewrite_leaves_file_untouched(#[case] content: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("input.txt");
	std::fs::write(&path, content)?;

	assert!(compute_rewrite(&path, &DuctusConfig::default()).is_err());
	assert_eq!(std::fs::read_to_string(&path)?, content);

	Ok(())
}

#[test]
fn oversized_files_are_rejected() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let path = tmp.path().join("big.txt");
	std::fs::write(&path, "0123456789")?;

	let config = DuctusConfig {
		max_file_size: 4,
		..DuctusConfig::default()
	};
	let error = compute_rewrite(&path, &config).unwrap_err();
	assert!(matches!(
		error,
		DuctusError::FileTooLarge {
			size: 10,
			limit: 4,
			..
		}
	));

	Ok(())
}
