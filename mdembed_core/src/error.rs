use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum EmbedError {
	#[error(transparent)]
	#[diagnostic(code(mdembed::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(mdembed::markdown))]
	Markdown(String),

	#[error("malformed file reference: `{annotation}`")]
	#[diagnostic(
		code(mdembed::malformed_reference),
		help(
			"supported forms: `file=<path>`, `file=<path>#L<n>`, `file=<path>#L<n>-`, \
			 `file=<path>#L<n>-L<m>` (line numbers start at 1; a range must state its start)"
		)
	)]
	MalformedReference { annotation: String },

	#[error("`{path}` is outside the root directory `{root}`")]
	#[diagnostic(
		code(mdembed::outside_root),
		help("set `allow_importing_from_outside = true` in mdembed.toml to permit this")
	)]
	OutsideRoot { path: String, root: String },

	#[error("`root_dir` must be an absolute path, got `{0}`")]
	#[diagnostic(
		code(mdembed::configuration),
		help("use an absolute path for `root_dir` in mdembed.toml, or omit it to default to the project root")
	)]
	Configuration(String),

	#[error("failed to read `{path}` referenced by `{annotation}`: {reason}")]
	#[diagnostic(code(mdembed::file_access))]
	FileAccess {
		path: String,
		annotation: String,
		reason: String,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdembed::config_parse),
		help("check that mdembed.toml is valid TOML with optional [exclude] and [include] sections")
	)]
	ConfigParse(String),

	#[error("file too large: `{path}` is {size} bytes (limit: {limit} bytes)")]
	#[diagnostic(
		code(mdembed::file_too_large),
		help("increase the file size limit in mdembed.toml or exclude this file")
	)]
	FileTooLarge { path: String, size: u64, limit: u64 },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(mdembed::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },
}

pub type EmbedResult<T> = Result<T, EmbedError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
