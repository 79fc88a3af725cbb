use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use tracing::debug;

use crate::EmbedError;
use crate::EmbedResult;
use crate::config::EmbedConfig;
use crate::extract::extract_lines;
use crate::extract::remove_common_indentation;
use crate::reference::FileReference;
use crate::reference::LineRange;
use crate::reference::find_file_annotation;
use crate::reference::parse_reference;
use crate::resolver::resolve_reference;

/// Validated runtime options consumed by resolution and extraction.
#[derive(Debug, Clone)]
pub struct EmbedOptions {
	/// Absolute directory that referenced files must live under, and the
	/// substitution value for the `<rootDir>` placeholder.
	pub root_dir: PathBuf,
	/// Permit references that resolve outside `root_dir`.
	pub allow_importing_from_outside: bool,
	/// Keep the trailing blank line of open-ended extractions.
	pub preserve_trailing_newline: bool,
	/// Strip the minimum common indentation from whole-file extractions.
	pub remove_redundant_indentations: bool,
}

impl EmbedOptions {
	/// Options with defaults for the given root directory.
	pub fn new(root_dir: impl Into<PathBuf>) -> Self {
		Self {
			root_dir: root_dir.into(),
			allow_importing_from_outside: false,
			preserve_trailing_newline: false,
			remove_redundant_indentations: false,
		}
	}

	/// Build options from a loaded config, defaulting `root_dir` to the
	/// project root. Fails before any document is processed when a
	/// configured `root_dir` is not absolute.
	pub fn from_config(config: Option<&EmbedConfig>, project_root: &Path) -> EmbedResult<Self> {
		let root_dir = match config.and_then(|c| c.root_dir.clone()) {
			Some(configured) => {
				if !configured.is_absolute() {
					return Err(EmbedError::Configuration(configured.display().to_string()));
				}
				configured
			}
			None => std::path::absolute(project_root)?,
		};

		Ok(Self {
			root_dir,
			allow_importing_from_outside: config.is_some_and(|c| c.allow_importing_from_outside),
			preserve_trailing_newline: config.is_some_and(|c| c.preserve_trailing_newline),
			remove_redundant_indentations: config.is_some_and(|c| c.remove_redundant_indentations),
		})
	}

	/// Check the `root_dir` invariant for options constructed directly.
	pub fn validate(&self) -> EmbedResult<()> {
		if self.root_dir.is_absolute() {
			Ok(())
		} else {
			Err(EmbedError::Configuration(
				self.root_dir.display().to_string(),
			))
		}
	}
}

/// An annotated fenced code block discovered in a document.
#[derive(Debug, Clone)]
pub struct CodeImport {
	/// The raw `file=...` token from the block's info string.
	pub annotation: String,
	/// The parsed reference.
	pub reference: FileReference,
	/// Byte range of the block's inner content in the document, including
	/// the newline that precedes the closing fence. Empty for empty blocks.
	pub span: Range<usize>,
	/// 1-indexed line of the opening fence.
	pub line: usize,
	/// 1-indexed column of the opening fence.
	pub column: usize,
	/// The current content between the fences, without the final newline.
	pub content: String,
}

/// Result of embedding all references in a single document.
#[derive(Debug)]
pub struct DocumentUpdate {
	/// The rewritten document content.
	pub content: String,
	/// Number of code blocks whose content changed.
	pub updated_count: usize,
}

/// Parse a markdown document and collect every fenced code block whose
/// metadata carries a `file=` annotation. A malformed annotation fails the
/// whole collection.
pub fn collect_imports(content: impl AsRef<str>) -> EmbedResult<Vec<CodeImport>> {
	let content = content.as_ref();
	let options = ParseOptions::gfm();
	let mdast =
		to_mdast(content, &options).map_err(|e| EmbedError::Markdown(e.to_string()))?;

	let mut imports = vec![];
	collect_from_node(&mdast, content, &mut imports)?;

	Ok(imports)
}

fn collect_from_node(
	node: &Node,
	source: &str,
	imports: &mut Vec<CodeImport>,
) -> EmbedResult<()> {
	if let Node::Code(code) = node {
		let Some(annotation) = code.meta.as_deref().and_then(find_file_annotation) else {
			return Ok(());
		};
		let reference = parse_reference(annotation)?;
		let Some(position) = &code.position else {
			return Ok(());
		};

		let span = inner_span(source, position.start.offset, position.end.offset);
		let raw = &source[span.clone()];
		imports.push(CodeImport {
			annotation: annotation.to_string(),
			reference,
			span: span.clone(),
			line: position.start.line,
			column: position.start.column,
			content: raw.strip_suffix('\n').unwrap_or(raw).to_string(),
		});

		return Ok(());
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_from_node(child, source, imports)?;
		}
	}

	Ok(())
}

/// Byte range of a fenced code block's inner content: everything after the
/// opening fence line, up to and including the newline that precedes the
/// closing fence. A block whose closing fence is missing extends to the end
/// of the node.
fn inner_span(source: &str, start: usize, end: usize) -> Range<usize> {
	let after_open = source[start..end]
		.find('\n')
		.map_or(end, |index| start + index + 1);

	// The node's end sits after the closing fence; back off a trailing
	// newline in case the parser included it.
	let mut fence_end = end.min(source.len());
	if source[..fence_end].ends_with('\n') {
		fence_end -= 1;
	}
	let last_line_start = source[..fence_end].rfind('\n').map_or(fence_end, |index| index + 1);

	let last_line = source[last_line_start..fence_end].trim_start();
	let span_end = if last_line.starts_with("```") || last_line.starts_with("~~~") {
		last_line_start
	} else {
		end
	};

	after_open..span_end.max(after_open)
}

/// Compute the replacement content for one import: resolve the reference,
/// read the file, and slice it. Read failures carry the annotation that
/// triggered them.
pub fn expected_content(
	import: &CodeImport,
	document_dir: &Path,
	options: &EmbedOptions,
) -> EmbedResult<String> {
	let resolved = resolve_reference(
		&import.reference,
		document_dir,
		&options.root_dir,
		options.allow_importing_from_outside,
	)?;

	let text = std::fs::read_to_string(&resolved.absolute_path).map_err(|e| {
		EmbedError::FileAccess {
			path: resolved.absolute_path.display().to_string(),
			annotation: import.annotation.clone(),
			reason: e.to_string(),
		}
	})?;

	let mut extracted = extract_lines(&text, &resolved.range, options.preserve_trailing_newline);
	if matches!(resolved.range, LineRange::Whole) && options.remove_redundant_indentations {
		extracted = remove_common_indentation(&extracted);
	}

	Ok(extracted)
}

/// Rewrite every annotated code block in a document. The first failing
/// block (malformed reference, containment violation, unreadable file)
/// aborts the whole document; there is no partial output.
pub fn embed_document(
	content: impl AsRef<str>,
	document_dir: &Path,
	options: &EmbedOptions,
) -> EmbedResult<DocumentUpdate> {
	options.validate()?;
	let content = content.as_ref();

	let mut imports = collect_imports(content)?;
	// Process in reverse offset order so earlier replacements don't shift
	// the spans of later ones.
	imports.sort_by(|a, b| b.span.start.cmp(&a.span.start));

	let mut result = content.to_string();
	let mut updated_count = 0;

	for import in &imports {
		let expected = expected_content(import, document_dir, options)?;
		if import.content != expected {
			// An empty extraction leaves the block empty; anything else is
			// terminated by the newline that precedes the closing fence.
			let mut replacement = expected;
			if !replacement.is_empty() {
				replacement.push('\n');
			}
			result.replace_range(import.span.clone(), &replacement);
			updated_count += 1;
		}
	}

	debug!(
		imports = imports.len(),
		updated = updated_count,
		"embedded document"
	);

	Ok(DocumentUpdate {
		content: result,
		updated_count,
	})
}
