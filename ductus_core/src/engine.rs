use std::path::Path;
use std::path::PathBuf;

use tracing::info;
use tracing::instrument;

use crate::DuctusConfig;
use crate::DuctusError;
use crate::DuctusResult;
use crate::Limits;
use crate::edits::EditList;
use crate::session::Session;

/// The outcome of rewriting one file. Nothing has been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
	/// The file that was read.
	pub path: PathBuf,
	/// The file content before rewriting. Not necessarily valid UTF-8.
	pub original: Vec<u8>,
	/// The rewritten content. This is bytes rather than a string because
	/// `#lc` clips by byte count.
	pub output: Vec<u8>,
}

impl RewriteResult {
	/// Returns true if rewriting changed anything, i.e. the file contained
	/// directives.
	pub fn is_changed(&self) -> bool {
		self.original != self.output
	}
}

/// Interpret every directive in `source` and return the edit list that
/// rebuilds the rewritten text.
pub fn build_edits(source: &[u8], limits: Limits) -> DuctusResult<EditList> {
	Session::new(source, limits).run()
}

/// Interpret every directive in `source` and return the rewritten bytes.
/// Text outside directives is reproduced byte for byte.
pub fn rewrite(source: &[u8], limits: Limits) -> DuctusResult<Vec<u8>> {
	Ok(build_edits(source, limits)?.assemble())
}

/// Read `path` and compute its rewritten content without touching the file.
#[instrument(skip(config), fields(path = %path.display()))]
pub fn compute_rewrite(path: &Path, config: &DuctusConfig) -> DuctusResult<RewriteResult> {
	let size = std::fs::metadata(path)?.len();
	if size > config.max_file_size {
		return Err(DuctusError::FileTooLarge {
			path: path.display().to_string(),
			size,
			limit: config.max_file_size,
		});
	}

	let original = std::fs::read(path)?;
	let output = rewrite(&original, config.limits)?;

	Ok(RewriteResult {
		path: path.to_path_buf(),
		original,
		output,
	})
}

/// Write the rewritten content back to its file. Unchanged files are left
/// alone. Returns whether the file was written.
pub fn write_rewrite(result: &RewriteResult) -> DuctusResult<bool> {
	if !result.is_changed() {
		info!(path = %result.path.display(), "no directives, file left untouched");
		return Ok(false);
	}

	std::fs::write(&result.path, &result.output)?;
	info!(
		path = %result.path.display(),
		bytes = result.output.len(),
		"rewrote file"
	);
	Ok(true)
}
