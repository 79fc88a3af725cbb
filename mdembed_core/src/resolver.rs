use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::EmbedError;
use crate::EmbedResult;
use crate::reference::FileReference;
use crate::reference::LineRange;

/// Placeholder token at the start of a reference path that substitutes the
/// configured root directory, e.g. `file=<rootDir>/src/lib.rs`.
pub const ROOT_DIR_TOKEN: &str = "<rootDir>";

/// A reference resolved to an absolute on-disk path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedImport {
	/// The absolute, lexically normalized path of the referenced file.
	pub absolute_path: PathBuf,
	/// The selected lines, carried over from the reference.
	pub range: LineRange,
}

/// Resolve a parsed reference against the document's own directory and the
/// configured root directory.
///
/// This is a security boundary: unless `allow_outside` is set, the resolved
/// path must stay equal to or below `root_dir`, so a document cannot pull in
/// arbitrary filesystem content such as secrets outside a published root.
pub fn resolve_reference(
	reference: &FileReference,
	document_dir: &Path,
	root_dir: &Path,
	allow_outside: bool,
) -> EmbedResult<ResolvedImport> {
	let root = normalize(root_dir);
	let target = if let Some(below_root) = reference.path.strip_prefix(ROOT_DIR_TOKEN) {
		root.join(below_root.trim_start_matches(['/', '\\']))
	} else {
		document_dir.join(&reference.path)
	};
	let absolute_path = normalize(&target);

	if !allow_outside && !is_descendant_of(&absolute_path, &root) {
		return Err(EmbedError::OutsideRoot {
			path: absolute_path.display().to_string(),
			root: root.display().to_string(),
		});
	}

	Ok(ResolvedImport {
		absolute_path,
		range: reference.range,
	})
}

/// Component-wise containment check: true when `path` is `root` itself or
/// lies below it. Both paths must already be normalized. Comparison happens
/// per path component, never on raw strings, so `/root/dirty` is not a
/// descendant of `/root/dir`.
pub fn is_descendant_of(path: &Path, root: &Path) -> bool {
	path.starts_with(root)
}

/// Lexically normalize a path: drop `.` components and fold `..` into their
/// parent. No filesystem access and no symlink resolution, so the referenced
/// file does not need to exist for resolution to be decidable.
pub(crate) fn normalize(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				match normalized.components().next_back() {
					Some(Component::Normal(_)) => {
						normalized.pop();
					}
					// `..` at the filesystem root stays at the root.
					Some(Component::RootDir | Component::Prefix(_)) => {}
					_ => normalized.push(Component::ParentDir),
				}
			}
			other => normalized.push(other),
		}
	}

	normalized
}
