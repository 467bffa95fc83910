use tarn_primitives::TextRange;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
	Error,
	Warning,
}

impl Severity {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Warning => "warning",
		}
	}
}

/// Diagnostic codes reported by the scanner and the structural compiler.
pub mod codes {
	pub const UNKNOWN_CHARACTER: &str = "BC0001";
	pub const UNTERMINATED_STRING: &str = "BC0002";
	pub const UNTERMINATED_COMMENT: &str = "BC0003";
	pub const UNTERMINATED_TRIPLE_STRING: &str = "BC0004";
	pub const UNMATCHED_BRACKET: &str = "BC0101";
	pub const MISMATCHED_BRACKET: &str = "BC0102";
	pub const EXPECTED_INDENTED_BLOCK: &str = "BC0201";
	pub const UNEXPECTED_INDENT: &str = "BC0202";
	pub const INCONSISTENT_DEDENT: &str = "BC0203";
	pub const EXPECTED_IDENTIFIER: &str = "BC0301";
	pub const DUPLICATE_DECLARATION: &str = "BC0302";
}

/// A message attached to a source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	pub range: TextRange,
	pub severity: Severity,
	pub message: String,
	pub code: &'static str,
}

impl Diagnostic {
	pub fn error(code: &'static str, range: TextRange, message: impl Into<String>) -> Self {
		Self {
			range,
			severity: Severity::Error,
			message: message.into(),
			code,
		}
	}

	pub fn warning(code: &'static str, range: TextRange, message: impl Into<String>) -> Self {
		Self {
			range,
			severity: Severity::Warning,
			message: message.into(),
			code,
		}
	}

	pub fn is_error(&self) -> bool {
		self.severity == Severity::Error
	}
}
