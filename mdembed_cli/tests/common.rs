use assert_cmd::Command;

pub fn mdembed_cmd() -> Command {
	let mut cmd = Command::cargo_bin("mdembed").expect("mdembed binary should build");
	cmd.env("NO_COLOR", "1");
	cmd
}

/// Four-line fixture mirrored from the core test suite.
pub const FIXTURE_FILE: &str = "Hello\nline2\nline3\nline4\n";

/// A minimal document with a single annotated code block.
pub fn document_with_annotation(annotation: &str, body: &str) -> String {
	format!("# Title\n\n```js {annotation}\n{body}```\n")
}
