//! Token classifications.
//!
//! The discriminants double as indices into the colorable-item table in
//! [`crate::classification`], so the order here is part of the host contract.

/// Classification of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
	/// Plain text (reserved default entry).
	Text = 0,
	Keyword = 1,
	Identifier = 2,
	Comment = 3,
	String = 4,
	Number = 5,
	Operator = 6,
	Delimiter = 7,
	/// Identifier resolved to a declared type.
	TypeName = 8,
	/// Identifier resolved to a declared method.
	Function = 9,
	/// Span the scanner could not recognize.
	Unknown = 10,
}

impl TokenKind {
	/// All kinds in table order.
	pub const ALL: [TokenKind; 11] = [
		Self::Text,
		Self::Keyword,
		Self::Identifier,
		Self::Comment,
		Self::String,
		Self::Number,
		Self::Operator,
		Self::Delimiter,
		Self::TypeName,
		Self::Function,
		Self::Unknown,
	];

	/// Index into the colorable-item table.
	#[inline]
	pub const fn index(self) -> usize {
		self as usize
	}
}

/// Reserved words, sorted for binary search.
const KEYWORDS: &[&str] = &[
	"abstract",
	"and",
	"as",
	"break",
	"callable",
	"cast",
	"class",
	"constructor",
	"continue",
	"def",
	"destructor",
	"do",
	"elif",
	"else",
	"ensure",
	"enum",
	"event",
	"except",
	"failure",
	"false",
	"final",
	"for",
	"from",
	"get",
	"given",
	"goto",
	"if",
	"import",
	"in",
	"interface",
	"internal",
	"is",
	"isa",
	"macro",
	"namespace",
	"not",
	"null",
	"of",
	"or",
	"override",
	"partial",
	"pass",
	"private",
	"protected",
	"public",
	"raise",
	"ref",
	"retry",
	"return",
	"self",
	"set",
	"static",
	"struct",
	"success",
	"super",
	"then",
	"transient",
	"true",
	"try",
	"typeof",
	"unless",
	"virtual",
	"when",
	"while",
	"yield",
];

/// Returns true if `ident` is a reserved word.
pub fn is_keyword(ident: &str) -> bool {
	KEYWORDS.binary_search(&ident).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn keyword_table_is_sorted() {
		assert!(KEYWORDS.windows(2).all(|w| w[0] < w[1]));
	}

	#[test]
	fn index_follows_table_order() {
		for (i, kind) in TokenKind::ALL.iter().enumerate() {
			assert_eq!(kind.index(), i);
		}
	}

	#[test]
	fn recognizes_keywords() {
		assert!(is_keyword("def"));
		assert!(is_keyword("namespace"));
		assert!(!is_keyword("Def"));
		assert!(!is_keyword("print"));
	}
}
