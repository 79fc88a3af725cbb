use crate::reference::LineRange;

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Slice file content according to a [`LineRange`], joining the selected
/// lines with `\n` regardless of the input's original separator.
///
/// Splitting on the separator turns a file that ends with a newline into a
/// sequence with a final empty element. For open selections (whole file or
/// `#L<n>-`) that synthetic element is dropped unless
/// `preserve_trailing_newline` is set, so no extra blank line is emitted.
///
/// Out-of-range line numbers never fail: a start beyond the last line or an
/// end before the start yields an empty string.
pub fn extract_lines(content: &str, range: &LineRange, preserve_trailing_newline: bool) -> String {
	let content = normalize_line_endings(content);
	let lines: Vec<&str> = content.split('\n').collect();

	let start = range.from_line().unwrap_or(1);
	let end = match range {
		LineRange::Single(line) => *line,
		LineRange::Span { to: Some(to), .. } => *to,
		LineRange::Whole | LineRange::Span { to: None, .. } => {
			if lines.last().is_some_and(|line| line.is_empty()) && !preserve_trailing_newline {
				lines.len() - 1
			} else {
				lines.len()
			}
		}
	};

	if start > lines.len() || end < start {
		return String::new();
	}

	lines[start - 1..end.min(lines.len())].join("\n")
}

/// Strip the minimum leading whitespace shared by all non-blank lines.
///
/// Blank and whitespace-only lines neither contribute to the common prefix
/// nor keep their own (shorter) indentation from being trimmed.
pub fn remove_common_indentation(content: &str) -> String {
	let common = content
		.lines()
		.filter(|line| !line.trim().is_empty())
		.map(leading_whitespace_len)
		.min()
		.unwrap_or(0);

	if common == 0 {
		return content.to_string();
	}

	content
		.split('\n')
		.map(|line| {
			let cut = leading_whitespace_len(line).min(common);
			&line[cut..]
		})
		.collect::<Vec<_>>()
		.join("\n")
}

/// Length in bytes of the leading run of spaces and tabs.
fn leading_whitespace_len(line: &str) -> usize {
	line.len() - line.trim_start_matches([' ', '\t']).len()
}
