use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DuctusError;
use crate::DuctusResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["ductus.toml", ".ductus.toml", ".config/ductus.toml"];

/// Configuration loaded from a `ductus.toml` file.
///
/// ```toml
/// max_file_size = 10485760
///
/// [limits]
/// max_captured_tokens = 4096
/// max_procedures = 128
/// max_nesting_depth = 256
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DuctusConfig {
	/// Files larger than this many bytes are rejected before reading.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// Bounds applied while interpreting directives.
	#[serde(default)]
	pub limits: Limits,
}

impl Default for DuctusConfig {
	fn default() -> Self {
		Self {
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			limits: Limits::default(),
		}
	}
}

/// Capacity limits for a single rewriting session. Exceeding any of them is
/// a `CapacityExceeded` (or `NestingTooDeep`) error rather than silent
/// truncation.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
	/// Tokens captured between `#fl` and `#efl`, newlines included.
	pub max_captured_tokens: usize,
	/// Steps in one `#efl(...)` procedure list, literal text included.
	pub max_procedures: usize,
	/// Brace levels the block walker descends into.
	pub max_nesting_depth: usize,
}

impl Default for Limits {
	fn default() -> Self {
		Self {
			max_captured_tokens: 4096,
			max_procedures: 128,
			max_nesting_depth: 256,
		}
	}
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl DuctusConfig {
	/// Return the first config file that exists under `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> DuctusResult<Option<DuctusConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_from(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_from(path: &Path) -> DuctusResult<DuctusConfig> {
		let content = std::fs::read_to_string(path)?;
		Self::from_toml(&content)
	}

	/// Parse a config from TOML text.
	pub fn from_toml(content: &str) -> DuctusResult<DuctusConfig> {
		toml::from_str(content).map_err(|e| DuctusError::ConfigParse(e.to_string()))
	}
}
