use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

/// A `ductus` command without colors, run from `dir` so config discovery
/// only sees files the test created.
pub fn ductus_cmd(dir: &Path) -> Command {
	let mut cmd = Command::new(get_cargo_bin("ductus"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG").current_dir(dir);
	cmd
}
