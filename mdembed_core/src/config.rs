use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::EmbedError;
use crate::EmbedResult;

/// Default maximum file size in bytes (10 MB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["mdembed.toml", ".mdembed.toml", ".config/mdembed.toml"];

/// Configuration loaded from an `mdembed.toml` file.
///
/// ```toml
/// root_dir = "/home/user/project/docs"
/// allow_importing_from_outside = false
/// preserve_trailing_newline = false
/// remove_redundant_indentations = true
///
/// [exclude]
/// patterns = ["vendor/", "*.generated.md"]
///
/// [include]
/// patterns = ["guides/**/*.md"]
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct EmbedConfig {
	/// Directory that referenced files must live under. Must be an absolute
	/// path; defaults to the project root being processed. Also the value
	/// substituted for the `<rootDir>` placeholder in reference paths.
	#[serde(default)]
	pub root_dir: Option<PathBuf>,
	/// Permit references that resolve outside `root_dir`. Off by default —
	/// the containment check is a security boundary.
	#[serde(default)]
	pub allow_importing_from_outside: bool,
	/// Keep the trailing blank line when a referenced file ends with a
	/// newline and the selection is open-ended.
	#[serde(default)]
	pub preserve_trailing_newline: bool,
	/// Strip the minimum common indentation from whole-file extractions.
	#[serde(default)]
	pub remove_redundant_indentations: bool,
	/// Maximum markdown file size in bytes to scan. Files larger than this
	/// are an error. Defaults to 10 MB.
	#[serde(default = "default_max_file_size")]
	pub max_file_size: u64,
	/// When true, `.gitignore` files are not used for filtering. By default
	/// (`false`), mdembed respects `.gitignore` patterns and skips files
	/// that would be ignored by git.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// Inclusion configuration — additional glob patterns to scan.
	#[serde(default)]
	pub include: IncludeConfig,
}

/// Configuration for excluding files and directories from scanning.
///
/// Patterns follow gitignore syntax and are applied on top of any
/// `.gitignore` rules (unless `disable_gitignore` is set). Supports negation
/// (`!pattern`), directory markers (trailing `/`), and all standard
/// gitignore wildcards.
#[derive(Debug, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns for files and directories to skip during
	/// scanning. These are relative to the project root.
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// Configuration for including additional files in scanning.
#[derive(Debug, Default, Deserialize)]
pub struct IncludeConfig {
	/// Additional glob patterns for markdown files to scan.
	/// These are relative to the project root.
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_max_file_size() -> u64 {
	DEFAULT_MAX_FILE_SIZE
}

impl EmbedConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> EmbedResult<Option<EmbedConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: EmbedConfig =
			toml::from_str(&content).map_err(|e| EmbedError::ConfigParse(e.to_string()))?;

		Ok(Some(config))
	}
}
