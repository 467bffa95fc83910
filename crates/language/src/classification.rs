//! Static colorable-item table queried once by the host to build its color
//! table.
//!
//! Index 0 is the reserved default-text entry. It is addressable but not
//! counted by [`classification_kind_count`]; hosts iterate `1..=count`.

use bitflags::bitflags;

use crate::token::TokenKind;

/// Named colors understood by hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
	/// Host default for the slot.
	Automatic,
	Blue,
	DarkGreen,
	DarkCyan,
	Gray,
	Maroon,
	Purple,
	Red,
	Teal,
}

bitflags! {
	/// Font style applied to a colorable item.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct FontStyle: u8 {
		const BOLD = 1 << 0;
		const ITALIC = 1 << 1;
		const UNDERLINE = 1 << 2;
		const STRIKETHROUGH = 1 << 3;
	}
}

/// One row of the colorable-item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorableItem {
	pub name: &'static str,
	pub kind: TokenKind,
	pub foreground: Color,
	pub background: Color,
	pub style: FontStyle,
}

const fn item(name: &'static str, kind: TokenKind, foreground: Color, style: FontStyle) -> ColorableItem {
	ColorableItem {
		name,
		kind,
		foreground,
		background: Color::Automatic,
		style,
	}
}

/// Rows ordered by [`TokenKind::index`].
pub const COLORABLE_ITEMS: [ColorableItem; TokenKind::ALL.len()] = [
	item("Boo - Text", TokenKind::Text, Color::Automatic, FontStyle::empty()),
	item("Boo - Keyword", TokenKind::Keyword, Color::Blue, FontStyle::empty()),
	item("Boo - Identifier", TokenKind::Identifier, Color::Automatic, FontStyle::empty()),
	item("Boo - Comment", TokenKind::Comment, Color::DarkGreen, FontStyle::ITALIC),
	item("Boo - String", TokenKind::String, Color::Maroon, FontStyle::empty()),
	item("Boo - Number", TokenKind::Number, Color::DarkCyan, FontStyle::empty()),
	item("Boo - Operator", TokenKind::Operator, Color::Gray, FontStyle::empty()),
	item("Boo - Delimiter", TokenKind::Delimiter, Color::Automatic, FontStyle::empty()),
	item("Boo - Type Name", TokenKind::TypeName, Color::Teal, FontStyle::empty()),
	item("Boo - Function", TokenKind::Function, Color::Purple, FontStyle::empty()),
	item("Boo - Unknown", TokenKind::Unknown, Color::Red, FontStyle::UNDERLINE),
];

/// Number of host-visible classification kinds (excludes the reserved entry 0).
pub const fn classification_kind_count() -> usize {
	COLORABLE_ITEMS.len() - 1
}

/// Returns the table row at `index`; `0` is the reserved default-text entry.
pub fn classification_kind(index: usize) -> Option<&'static ColorableItem> {
	COLORABLE_ITEMS.get(index)
}

/// Returns the row describing `kind`.
pub fn colorable_item(kind: TokenKind) -> &'static ColorableItem {
	&COLORABLE_ITEMS[kind.index()]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_rows_follow_token_kind_order() {
		for (idx, row) in COLORABLE_ITEMS.iter().enumerate() {
			assert_eq!(row.kind.index(), idx, "{} out of order", row.name);
		}
	}

	#[test]
	fn count_excludes_reserved_entry() {
		assert_eq!(classification_kind_count(), 10);
		assert_eq!(classification_kind(0).map(|i| i.kind), Some(TokenKind::Text));
		assert_eq!(classification_kind(10).map(|i| i.kind), Some(TokenKind::Unknown));
		assert!(classification_kind(11).is_none());
	}

	#[test]
	fn names_are_unique() {
		let mut names: Vec<_> = COLORABLE_ITEMS.iter().map(|i| i.name).collect();
		names.sort_unstable();
		names.dedup();
		assert_eq!(names.len(), COLORABLE_ITEMS.len());
	}
}
