//! `mdembed_core` is the core library for the [mdembed](https://github.com/ifiokjr/mdembed) engine. It locates fenced code blocks in markdown documents that carry a `file=` reference, resolves the reference to a region of a file on disk, and replaces the block's content with the extracted text.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   → Reference parser (splits info-string metadata, parses `file=<path>#L<from>-L<to>`)
//!   → Path resolver (substitutes `<rootDir>`, normalizes, enforces containment)
//!   → Line extractor (slices file content by line range, normalizes newlines/indentation)
//!   → Engine (splices replacements back into the document)
//!   → Project scanner (walks the directory tree, checks or updates every document)
//! ```
//!
//! ## Modules
//!
//! - [`config`] — Configuration loading from `mdembed.toml`, including root directory, extraction flags, and exclude/include patterns.
//! - [`project`] — Project scanning and directory walking. Discovers annotated code blocks across all markdown files in a project.
//!
//! ## Key Types
//!
//! - [`FileReference`] — A parsed `file=` annotation: target path plus [`LineRange`].
//! - [`LineRange`] — The line selection: whole file, a single line, or a span.
//! - [`ResolvedImport`] — A reference resolved to an absolute, containment-checked path.
//! - [`CodeImport`] — An annotated code block located in a document.
//! - [`ProjectContext`] — A scanned project together with its validated options, ready for checking or updating.
//! - [`EmbedConfig`] — Configuration loaded from `mdembed.toml`.
//!
//! ## Annotation Syntax
//!
//! A fenced code block references a file in its info string:
//!
//! ````markdown
//! ```rust file=./src/lib.rs#L10-L20
//! (replaced with lines 10–20 of src/lib.rs)
//! ```
//! ````
//!
//! Supported forms: `file=<path>` (whole file), `file=<path>#L4` (one line),
//! `file=<path>#L4-` (from line 4 to the end), `file=<path>#L4-L9` (closed
//! span). Spaces in paths are escaped as `\ `, and a path starting with
//! `<rootDir>` resolves against the configured root directory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mdembed_core::project::scan_project_with_config;
//! use mdembed_core::project::{check_project, compute_updates, write_updates};
//!
//! let ctx = scan_project_with_config(Path::new(".")).unwrap();
//!
//! // Check for stale embedded blocks
//! let result = check_project(&ctx).unwrap();
//! if !result.is_ok() {
//! 	eprintln!("{} stale block(s) found", result.stale.len());
//! }
//!
//! // Update all embedded blocks
//! let updates = compute_updates(&ctx).unwrap();
//! write_updates(&updates).unwrap();
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use extract::*;
pub use project::*;
pub use reference::*;
pub use resolver::*;

pub mod config;
mod engine;
mod error;
mod extract;
pub mod project;
mod reference;
mod resolver;

#[cfg(test)]
mod __fixtures;
