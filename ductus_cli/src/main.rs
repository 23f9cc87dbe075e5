use std::io::Write;
use std::path::Path;
use std::process;

use clap::Parser;
use ductus_cli::DuctusCli;
use ductus_cli::FileOutcome;
use ductus_cli::RunSummary;
use ductus_core::DuctusConfig;
use ductus_core::DuctusError;
use ductus_core::RewriteResult;
use ductus_core::compute_rewrite;
use ductus_core::write_rewrite;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DuctusCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// `ERROR[line:column] message` must stay on one line.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.wrap_lines(false)
				.build(),
		)
	}))
	.ok();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| EnvFilter::new(args.default_log_filter())),
		)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.init();

	let config = match load_config(&args) {
		Ok(config) => config,
		Err(error) => {
			report_error(None, error);
			process::exit(2);
		}
	};

	let mut summary = RunSummary::default();
	for path in &args.files {
		let outcome = match process_file(&args, &config, path) {
			Ok(outcome) => outcome,
			Err(error) => {
				report_error(Some(path), error);
				FileOutcome::Failed
			}
		};
		summary.record(outcome);
	}

	print_summary(&args, &summary);
	process::exit(summary.exit_code(args.check));
}

fn load_config(args: &DuctusCli) -> Result<DuctusConfig, DuctusError> {
	if let Some(path) = &args.config {
		debug!(path = %path.display(), "loading explicit config");
		return DuctusConfig::load_from(path);
	}

	let root = std::env::current_dir()?;
	match DuctusConfig::load(&root)? {
		Some(config) => {
			debug!(root = %root.display(), "loaded discovered config");
			Ok(config)
		}
		None => Ok(DuctusConfig::default()),
	}
}

fn process_file(
	args: &DuctusCli,
	config: &DuctusConfig,
	path: &Path,
) -> Result<FileOutcome, DuctusError> {
	let result = compute_rewrite(path, config)?;
	let changed = result.is_changed();

	if args.dry_run {
		std::io::stdout().write_all(&result.output)?;
	}

	if args.is_read_only() {
		if changed {
			if args.check {
				eprintln!("{} {}", colored!("would rewrite:", yellow), path.display());
			}
			if args.diff {
				print_diff(&result);
			}
		}
	} else {
		write_rewrite(&result)?;
	}

	Ok(if changed {
		FileOutcome::Changed
	} else {
		FileOutcome::Unchanged
	})
}

/// Render through miette for rich diagnostics with help text and error
/// codes.
fn report_error(path: Option<&Path>, error: DuctusError) {
	if let Some(path) = path {
		eprintln!("{} {}", colored!("error:", red), path.display());
	}
	let report: miette::Report = error.into();
	eprintln!("{report:?}");
}

fn print_summary(args: &DuctusCli, summary: &RunSummary) {
	if args.check {
		if summary.changed == 0 && summary.failed == 0 {
			eprintln!("{}", colored!("All files are up to date.", green));
		} else if summary.changed > 0 {
			eprintln!(
				"{}",
				colored!(
					format!("{} file(s) contain directives to expand.", summary.changed),
					red
				)
			);
		}
	} else if args.verbose && !args.dry_run {
		eprintln!(
			"Rewrote {} file(s), {} unchanged, {} failed.",
			summary.changed, summary.unchanged, summary.failed
		);
	}
}

/// Print a unified diff between the current and rewritten content,
/// colorized.
fn print_diff(result: &RewriteResult) {
	let original = String::from_utf8_lossy(&result.original);
	let output = String::from_utf8_lossy(&result.output);
	let diff = TextDiff::from_lines(original.as_ref(), output.as_ref());
	eprintln!("--- {}", result.path.display());
	eprintln!("+++ {}", result.path.display());
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
		if change.missing_newline() {
			eprintln!();
		}
	}
}
