use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
	author,
	version,
	about = "Expand `#fl` loops and `#r` scoped replacements embedded in source files.",
	long_about = "ductus rewrites each given file in place, interpreting the directives embedded \
	              in it and reproducing every other byte unchanged.\n\nDirectives:\n  #fl ... \
	              #efl(<procedures>)  Replay each body line through a recipe of literal text, \
	              #l, #lc(a, b) and #w(n)\n  #r target replacement    Replace `target` up to the \
	              end of the enclosing `{ ... }` block\n\nA file that fails to parse is never \
	              written."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct DuctusCli {
	/// Files to rewrite in place. Processed one at a time, in order.
	#[arg(required = true, num_args = 1.., value_name = "FILES")]
	pub files: Vec<PathBuf>,

	/// Print the rewritten content to stdout instead of writing files.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Write nothing and exit with status 1 if any file would change.
	#[arg(long, default_value_t = false, conflicts_with = "dry_run")]
	pub check: bool,

	/// Show a unified diff for every file that would change. Only used
	/// together with `--check` or `--dry-run`.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Path to a config file. Defaults to the first of `ductus.toml`,
	/// `.ductus.toml` and `.config/ductus.toml` found in the working
	/// directory.
	#[arg(long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}

impl DuctusCli {
	/// True when no file may be written.
	pub fn is_read_only(&self) -> bool {
		self.dry_run || self.check
	}

	/// The default log filter, used when `RUST_LOG` is unset.
	pub fn default_log_filter(&self) -> &'static str {
		if self.verbose { "debug" } else { "warn" }
	}
}

/// How a single file fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
	/// No directives, nothing to do.
	Unchanged,
	/// The file was rewritten, or would be in a read-only run.
	Changed,
	/// Reading or interpreting the file failed. It was not written.
	Failed,
}

/// Tally of file outcomes for one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
	pub unchanged: usize,
	pub changed: usize,
	pub failed: usize,
}

impl RunSummary {
	pub fn record(&mut self, outcome: FileOutcome) {
		match outcome {
			FileOutcome::Unchanged => self.unchanged += 1,
			FileOutcome::Changed => self.changed += 1,
			FileOutcome::Failed => self.failed += 1,
		}
	}

	/// Process exit status: 2 if any file failed, 1 if `--check` found
	/// pending directives, 0 otherwise.
	pub fn exit_code(&self, check: bool) -> i32 {
		if self.failed > 0 {
			2
		} else if check && self.changed > 0 {
			1
		} else {
			0
		}
	}
}
