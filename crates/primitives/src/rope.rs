//! Rope utilities and extensions.

use std::borrow::Cow;

use ropey::RopeSlice;

/// Returns the text of a line without its terminator (`\n` or `\r\n`).
///
/// Borrows when the line lives in a single rope chunk.
pub fn line_text(line: RopeSlice<'_>) -> Cow<'_, str> {
	match Cow::<str>::from(line) {
		Cow::Borrowed(s) => Cow::Borrowed(trim_terminator(s)),
		Cow::Owned(mut s) => {
			let keep = trim_terminator(&s).len();
			s.truncate(keep);
			Cow::Owned(s)
		}
	}
}

fn trim_terminator(s: &str) -> &str {
	let s = s.strip_suffix('\n').unwrap_or(s);
	s.strip_suffix('\r').unwrap_or(s)
}

/// Returns the byte length of a line excluding its terminator.
pub fn line_content_len(line: RopeSlice<'_>) -> usize {
	let mut len = line.len_bytes();
	if len > 0 && line.byte(len - 1) == b'\n' {
		len -= 1;
		if len > 0 && line.byte(len - 1) == b'\r' {
			len -= 1;
		}
	}
	len
}
