use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tracing::debug;

use crate::EmbedError;
use crate::EmbedResult;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::config::EmbedConfig;
use crate::engine::CodeImport;
use crate::engine::EmbedOptions;
use crate::engine::collect_imports;
use crate::engine::embed_document;
use crate::engine::expected_content;

/// Options for controlling how a project is scanned.
///
/// Use [`ScanOptions::default()`] for sensible defaults or
/// [`ScanOptions::from_config`] to construct from an [`EmbedConfig`].
#[derive(Debug, Clone)]
pub struct ScanOptions {
	/// Gitignore-style patterns to exclude from scanning.
	pub exclude_patterns: Vec<String>,
	/// Glob patterns for additional files to scan.
	pub include_set: GlobSet,
	/// Maximum file size to scan in bytes.
	pub max_file_size: u64,
	/// Whether to disable `.gitignore` integration.
	pub disable_gitignore: bool,
}

impl Default for ScanOptions {
	fn default() -> Self {
		Self {
			exclude_patterns: Vec::new(),
			include_set: GlobSet::empty(),
			max_file_size: DEFAULT_MAX_FILE_SIZE,
			disable_gitignore: false,
		}
	}
}

impl ScanOptions {
	/// Construct [`ScanOptions`] from an [`EmbedConfig`].
	pub fn from_config(config: Option<&EmbedConfig>) -> Self {
		let exclude_patterns = config
			.map(|c| c.exclude.patterns.clone())
			.unwrap_or_default();
		let include_patterns = config.map(|c| &c.include.patterns[..]).unwrap_or_default();
		let max_file_size = config.map_or(DEFAULT_MAX_FILE_SIZE, |c| c.max_file_size);
		let disable_gitignore = config.is_some_and(|c| c.disable_gitignore);
		let include_set = build_glob_set(include_patterns);

		Self {
			exclude_patterns,
			include_set,
			max_file_size,
			disable_gitignore,
		}
	}
}

/// A markdown document together with its annotated code blocks.
#[derive(Debug, Clone)]
pub struct DocumentEntry {
	/// Absolute path of the document.
	pub file: PathBuf,
	/// Annotated code blocks found in the document, in source order.
	pub imports: Vec<CodeImport>,
}

impl DocumentEntry {
	/// The directory the document's relative references resolve against.
	pub fn directory(&self) -> &Path {
		self.file.parent().unwrap_or(Path::new(""))
	}
}

/// A scanned project: every markdown document that contains at least one
/// annotated code block.
#[derive(Debug, Clone, Default)]
pub struct Project {
	/// Documents with annotated blocks, sorted by path.
	pub documents: Vec<DocumentEntry>,
}

impl Project {
	/// Total number of annotated blocks across all documents.
	pub fn import_count(&self) -> usize {
		self.documents.iter().map(|doc| doc.imports.len()).sum()
	}
}

/// A scanned project together with its validated embed options.
///
/// This is the main entry point returned by [`scan_project_with_config`] and
/// consumed by [`check_project`] and [`compute_updates`].
#[derive(Debug)]
pub struct ProjectContext {
	/// The scanned project.
	pub project: Project,
	/// Options derived from `mdembed.toml` (or defaults).
	pub options: EmbedOptions,
}

/// An annotated block whose content is out of date.
#[derive(Debug)]
pub struct StaleEntry {
	/// Path to the document containing the stale block.
	pub file: PathBuf,
	/// The `file=` annotation of the block.
	pub annotation: String,
	/// 1-indexed line number of the opening fence.
	pub line: usize,
	/// 1-indexed column number of the opening fence.
	pub column: usize,
	/// The current content between the fences.
	pub current_content: String,
	/// The expected content after extraction.
	pub expected_content: String,
}

/// Result of checking a project for stale embedded blocks.
#[derive(Debug)]
pub struct CheckResult {
	/// Annotated blocks that are out of date.
	pub stale: Vec<StaleEntry>,
}

impl CheckResult {
	/// Returns true if every annotated block is up to date.
	pub fn is_ok(&self) -> bool {
		self.stale.is_empty()
	}
}

/// Result of computing updates for a project.
#[derive(Debug)]
pub struct UpdateResult {
	/// Files that would be modified and their new content.
	pub updated_files: HashMap<PathBuf, String>,
	/// Number of code blocks that were updated.
	pub updated_count: usize,
}

/// Scan a directory with default options and no config.
pub fn scan_project(root: &Path) -> EmbedResult<Project> {
	scan_project_with_options(root, &ScanOptions::default())
}

/// Scan a project with config — loads the discovered config file, validates
/// the embed options, and scans all markdown files. Option validation
/// happens before any document is read.
pub fn scan_project_with_config(root: &Path) -> EmbedResult<ProjectContext> {
	let config = EmbedConfig::load(root)?;
	let options = EmbedOptions::from_config(config.as_ref(), root)?;
	let scan_options = ScanOptions::from_config(config.as_ref());
	let project = scan_project_with_options(root, &scan_options)?;

	Ok(ProjectContext { project, options })
}

/// Scan a directory with the given [`ScanOptions`].
pub fn scan_project_with_options(root: &Path, options: &ScanOptions) -> EmbedResult<Project> {
	let files = collect_files(root, options)?;
	let mut documents = Vec::new();

	for file in files {
		let metadata = std::fs::metadata(&file)?;
		if metadata.len() > options.max_file_size {
			return Err(EmbedError::FileTooLarge {
				path: file.display().to_string(),
				size: metadata.len(),
				limit: options.max_file_size,
			});
		}

		let content = std::fs::read_to_string(&file)?;
		let imports = collect_imports(&content)?;
		if !imports.is_empty() {
			documents.push(DocumentEntry { file, imports });
		}
	}

	debug!(
		documents = documents.len(),
		"scanned project for annotated code blocks"
	);

	Ok(Project { documents })
}

/// Check whether every annotated block in the project is up to date. The
/// first resolution or read failure aborts the whole check.
pub fn check_project(ctx: &ProjectContext) -> EmbedResult<CheckResult> {
	ctx.options.validate()?;
	let mut stale = Vec::new();

	for document in &ctx.project.documents {
		for import in &document.imports {
			let expected = expected_content(import, document.directory(), &ctx.options)?;
			if import.content != expected {
				stale.push(StaleEntry {
					file: document.file.clone(),
					annotation: import.annotation.clone(),
					line: import.line,
					column: import.column,
					current_content: import.content.clone(),
					expected_content: expected,
				});
			}
		}
	}

	Ok(CheckResult { stale })
}

/// Compute the updated file contents for every document with stale blocks.
/// Documents are re-read and re-processed so replacements splice against
/// current on-disk content.
pub fn compute_updates(ctx: &ProjectContext) -> EmbedResult<UpdateResult> {
	ctx.options.validate()?;
	let mut updated_files = HashMap::new();
	let mut updated_count = 0;

	for document in &ctx.project.documents {
		let content = std::fs::read_to_string(&document.file)?;
		let update = embed_document(&content, document.directory(), &ctx.options)?;

		if update.updated_count > 0 {
			updated_count += update.updated_count;
			updated_files.insert(document.file.clone(), update.content);
		}
	}

	Ok(UpdateResult {
		updated_files,
		updated_count,
	})
}

/// Write the updated contents back to disk.
pub fn write_updates(updates: &UpdateResult) -> EmbedResult<()> {
	for (path, content) in &updates.updated_files {
		std::fs::write(path, content)?;
	}
	Ok(())
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> GlobSet {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		if let Ok(glob) = Glob::new(pattern) {
			builder.add(glob);
		}
	}
	builder.build().unwrap_or_else(|_| GlobSet::empty())
}

/// Collect all markdown files from a directory tree, honoring `.gitignore`
/// (unless disabled), `[exclude]` patterns, and `[include]` globs.
fn collect_files(root: &Path, options: &ScanOptions) -> EmbedResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, &options.exclude_patterns)?;

	walk_dir(
		root,
		root,
		&mut files,
		true,
		&gitignore,
		&custom_exclude,
		&options.include_set,
		&mut visited_dirs,
	)?;
	// Sort for deterministic ordering.
	files.sort();
	files.dedup();
	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn has_project_config(dir: &Path) -> bool {
	CONFIG_FILE_CANDIDATES
		.iter()
		.any(|candidate| dir.join(candidate).is_file())
}

#[allow(clippy::too_many_arguments)]
fn walk_dir(
	root: &Path,
	dir: &Path,
	files: &mut Vec<PathBuf>,
	is_root: bool,
	gitignore: &Gitignore,
	custom_exclude: &Gitignore,
	include_set: &GlobSet,
	visited_dirs: &mut HashSet<PathBuf>,
) -> EmbedResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	// Detect symlink cycles by tracking canonical paths.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		return Err(EmbedError::SymlinkCycle {
			path: dir.display().to_string(),
		});
	}

	let entries = std::fs::read_dir(dir)?;

	for entry in entries {
		let entry = entry?;
		let path = entry.path();

		// Skip hidden directories and common non-source directories.
		if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
			if is_ignored_directory_name(name) {
				continue;
			}
		}

		let is_dir = path.is_dir();

		if gitignore.matched(&path, is_dir).is_ignore() {
			continue;
		}
		if custom_exclude.matched(&path, is_dir).is_ignore() {
			continue;
		}

		if is_dir {
			// Skip subdirectories that have their own mdembed config file
			// (separate project scope).
			if !is_root && has_project_config(&path) {
				continue;
			}
			walk_dir(
				root,
				&path,
				files,
				false,
				gitignore,
				custom_exclude,
				include_set,
				visited_dirs,
			)?;
		} else if is_markdown_file(&path) || matches_include(root, &path, include_set) {
			files.push(path);
		}
	}

	Ok(())
}

fn matches_include(root: &Path, path: &Path, include_set: &GlobSet) -> bool {
	if include_set.is_empty() {
		return false;
	}
	path.strip_prefix(root)
		.is_ok_and(|rel_path| include_set.is_match(rel_path))
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `mdembed.toml` `[exclude]`. These follow `.gitignore` syntax and are
/// applied on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> EmbedResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			EmbedError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| EmbedError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Check if a file is a markdown file (parsed via the markdown AST).
fn is_markdown_file(path: &Path) -> bool {
	let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
		return false;
	};

	matches!(ext, "md" | "mdx" | "markdown")
}
