use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Embed source files into markdown code blocks — and keep them in sync.",
	long_about = "mdembed keeps fenced code blocks synchronized with the source files they \
	              reference.\n\nA code block annotated with `file=./src/lib.rs#L10-L20` has its \
	              content replaced by lines 10–20 of that file whenever `mdembed update` runs, so \
	              documentation snippets never drift from the code they quote.\n\nQuick start:\n  \
	              mdembed init    Create a sample config file\n  mdembed update  Sync all annotated \
	              code blocks\n  mdembed check   Verify everything is up to date\n  mdembed list    \
	              Show every annotated block"
)]
pub struct EmbedCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize mdembed in a project by creating a sample config file.
	///
	/// Creates an `mdembed.toml` file in the project root with commented
	/// defaults. If the file already exists, this command is a no-op and
	/// exits successfully.
	Init,
	/// Check that all annotated code blocks are up to date.
	///
	/// Scans every markdown file for code blocks with a `file=` annotation
	/// and compares their current content against the referenced file
	/// region. Exits with a non-zero status code if any block is stale.
	///
	/// Ideal for CI pipelines. Use `--diff` to see exactly what changed and
	/// `--format` to control the output style.
	Check {
		/// Show a unified diff for each stale code block, highlighting the
		/// differences between current and expected content.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Watch for file changes and re-run checks automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// Update all annotated code blocks with the latest file content.
	///
	/// Resolves each `file=` reference, extracts the selected lines, and
	/// replaces the block content in every scanned markdown file.
	///
	/// Use `--dry-run` to preview changes without writing to disk, or
	/// `--watch` to automatically re-run whenever files change.
	Update {
		/// Preview changes without writing files. Prints which files would
		/// be modified.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Watch for file changes and re-run updates automatically.
		#[arg(long, default_value_t = false)]
		watch: bool,
	},
	/// List all annotated code blocks in the project.
	///
	/// Displays every code block that carries a `file=` annotation, along
	/// with its document, position, and line selection. Useful for auditing
	/// which documentation embeds which sources.
	List,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each stale entry includes
	/// the file path, annotation, and position.
	Json,
	/// GitHub Actions annotation format. Emits `::warning` annotations that
	/// appear inline on pull request diffs.
	Github,
}
