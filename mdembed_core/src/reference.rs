use logos::Logos;
use serde::Deserialize;
use serde::Serialize;

use crate::EmbedError;
use crate::EmbedResult;

/// The literal prefix that marks a code block metadata token as a source-file
/// reference.
pub const FILE_PREFIX: &str = "file=";

/// The line selection carried by a [`FileReference`].
///
/// A reference is either the whole file, a single line, or a span. The
/// variants make the dash/no-dash distinction from the annotation grammar
/// explicit: `#L4` selects one line, `#L4-` selects from line 4 to the end
/// of the file, and `#L4-L9` selects a closed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum LineRange {
	/// No `#` fragment: the entire file, treated as an open range.
	Whole,
	/// `#L<n>` with no dash: exactly one line.
	Single(usize),
	/// `#L<n>-` (open-ended) or `#L<n>-L<m>` (closed). A span always states
	/// its start; `-L<m>` on its own is rejected by the parser.
	Span { from: usize, to: Option<usize> },
}

impl LineRange {
	/// Whether this selection is a range (anything other than a single line).
	pub fn is_range(&self) -> bool {
		!matches!(self, Self::Single(_))
	}

	/// The 1-indexed first selected line, if the reference names one.
	pub fn from_line(&self) -> Option<usize> {
		match self {
			Self::Whole => None,
			Self::Single(line) => Some(*line),
			Self::Span { from, .. } => Some(*from),
		}
	}

	/// The 1-indexed last selected line for closed spans.
	pub fn to_line(&self) -> Option<usize> {
		match self {
			Self::Whole | Self::Single(_) => None,
			Self::Span { to, .. } => *to,
		}
	}
}

impl std::fmt::Display for LineRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Whole => Ok(()),
			Self::Single(line) => write!(f, "#L{line}"),
			Self::Span { from, to: None } => write!(f, "#L{from}-"),
			Self::Span {
				from,
				to: Some(to),
			} => write!(f, "#L{from}-L{to}"),
		}
	}
}

/// A parsed `file=` annotation: the target path (unescaped) and the line
/// selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
	/// The referenced path, relative to the document or starting with the
	/// `<rootDir>` placeholder. Escaped spaces have been unescaped.
	pub path: String,
	/// The selected lines.
	pub range: LineRange,
}

/// Raw tokens for the `#` fragment of a reference, e.g. `L4-L9`.
#[derive(Logos, Debug, PartialEq)]
enum FragmentToken {
	#[regex("L[0-9]+")]
	Line,
	#[token("-")]
	Dash,
}

/// A recognized fragment token with its parsed line number.
#[derive(Clone, Copy)]
enum LineSpecToken {
	Line(usize),
	Dash,
}

/// Split code block metadata into tokens on unescaped spaces, so that a path
/// written as `my\ file.js` survives the split as a single token.
pub fn split_meta(meta: &str) -> Vec<&str> {
	let mut tokens = Vec::new();
	let bytes = meta.as_bytes();
	let mut token_start = 0;

	for (index, byte) in bytes.iter().enumerate() {
		if *byte == b' ' && (index == 0 || bytes[index - 1] != b'\\') {
			if index > token_start {
				tokens.push(&meta[token_start..index]);
			}
			token_start = index + 1;
		}
	}
	if token_start < meta.len() {
		tokens.push(&meta[token_start..]);
	}

	tokens
}

/// Find the `file=` annotation token in code block metadata, if present.
pub fn find_file_annotation(meta: &str) -> Option<&str> {
	split_meta(meta)
		.into_iter()
		.find(|token| token.starts_with(FILE_PREFIX))
}

/// Parse a `file=` annotation into a [`FileReference`].
///
/// The path capture is non-greedy: it ends at the first unescaped `#` whose
/// remainder is a complete, valid line spec. A `#` followed by something that
/// merely looks like a line spec (`#-L2`, `#L2x`, `#L0`) makes the whole
/// annotation malformed, while any other `#` is literal path content.
pub fn parse_reference(annotation: &str) -> EmbedResult<FileReference> {
	let malformed = || {
		EmbedError::MalformedReference {
			annotation: annotation.to_string(),
		}
	};

	let Some(rest) = annotation.strip_prefix(FILE_PREFIX) else {
		return Err(malformed());
	};
	if rest.is_empty() {
		return Err(malformed());
	}

	let mut attempted_line_spec = false;
	for (index, _) in rest.match_indices('#') {
		if index > 0 && rest.as_bytes()[index - 1] == b'\\' {
			continue;
		}

		let fragment = &rest[index + 1..];
		if let Some(range) = parse_line_spec(fragment) {
			let path = unescape_path(&rest[..index]);
			if path.is_empty() {
				return Err(malformed());
			}
			return Ok(FileReference { path, range });
		}
		if looks_like_line_spec(fragment) {
			attempted_line_spec = true;
		}
	}

	// No `#` introduced a valid line spec. A fragment that tried to be one is
	// an error; otherwise every `#` belongs to the path and the reference
	// covers the whole file.
	if attempted_line_spec {
		return Err(malformed());
	}

	Ok(FileReference {
		path: unescape_path(rest),
		range: LineRange::Whole,
	})
}

/// Parse a fragment as a complete line spec: `L<n>`, `L<n>-`, or `L<n>-L<m>`.
/// An empty fragment (a bare trailing `#`) selects the whole file. Returns
/// `None` for anything else, including line number zero.
fn parse_line_spec(fragment: &str) -> Option<LineRange> {
	if fragment.is_empty() {
		return Some(LineRange::Whole);
	}

	let mut tokens = Vec::new();
	for (token, span) in FragmentToken::lexer(fragment).spanned() {
		match token.ok()? {
			FragmentToken::Line => {
				let line: usize = fragment[span][1..].parse().ok()?;
				tokens.push(LineSpecToken::Line(line));
			}
			FragmentToken::Dash => tokens.push(LineSpecToken::Dash),
		}
	}

	match tokens[..] {
		[LineSpecToken::Line(line)] if line >= 1 => Some(LineRange::Single(line)),
		[LineSpecToken::Line(from), LineSpecToken::Dash] if from >= 1 => {
			Some(LineRange::Span { from, to: None })
		}
		[
			LineSpecToken::Line(from),
			LineSpecToken::Dash,
			LineSpecToken::Line(to),
		] if from >= 1 && to >= 1 => {
			Some(LineRange::Span {
				from,
				to: Some(to),
			})
		}
		_ => None,
	}
}

/// Whether a fragment was meant as a line spec: it starts with a dash or with
/// `L` followed by a digit. Fragments that fail this test are literal path
/// content.
fn looks_like_line_spec(fragment: &str) -> bool {
	let bytes = fragment.as_bytes();
	match bytes.first() {
		Some(b'-') => true,
		Some(b'L') => bytes.get(1).is_some_and(u8::is_ascii_digit),
		_ => false,
	}
}

/// Unescape `\ ` and `\#` sequences in a reference path.
fn unescape_path(path: &str) -> String {
	let mut unescaped = String::with_capacity(path.len());
	let mut chars = path.chars().peekable();

	while let Some(current) = chars.next() {
		if current == '\\' {
			if let Some(&next) = chars.peek() {
				if next == ' ' || next == '#' {
					unescaped.push(next);
					chars.next();
					continue;
				}
			}
		}
		unescaped.push(current);
	}

	unescaped
}
