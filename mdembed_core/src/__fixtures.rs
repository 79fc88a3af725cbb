use std::path::Path;
use std::path::PathBuf;

use crate::EmbedOptions;

/// Four-line fixture used across extraction tests.
pub const FIXTURE_FILE: &str = "Hello\nline2\nline3\nline4\n";

/// Write `content` to `name` under `dir`, creating parent directories as
/// needed, and return the full path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).expect("create fixture directories");
	}
	std::fs::write(&path, content).expect("write fixture file");
	path
}

/// Default embed options rooted at `root`.
pub fn options_for(root: &Path) -> EmbedOptions {
	EmbedOptions::new(root)
}

/// A minimal document with a single annotated code block.
pub fn document_with_annotation(annotation: &str, body: &str) -> String {
	format!("# Title\n\n```js {annotation}\n{body}```\n")
}
