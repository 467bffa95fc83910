use std::ops::RangeInclusive;

use tarn_primitives::TextRange;

/// Index of a symbol in its [`SymbolTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
	Namespace,
	Import,
	Class,
	Struct,
	Interface,
	Enum,
	/// A `def`.
	Method,
}

impl SymbolKind {
	/// Maps a declaring keyword to its kind.
	pub fn from_keyword(word: &str) -> Option<Self> {
		Some(match word {
			"namespace" => Self::Namespace,
			"import" => Self::Import,
			"class" => Self::Class,
			"struct" => Self::Struct,
			"interface" => Self::Interface,
			"enum" => Self::Enum,
			"def" => Self::Method,
			_ => return None,
		})
	}

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Namespace => "namespace",
			Self::Import => "import",
			Self::Class => "class",
			Self::Struct => "struct",
			Self::Interface => "interface",
			Self::Enum => "enum",
			Self::Method => "def",
		}
	}

	/// Returns true for declarations that introduce a type name.
	pub const fn is_type(self) -> bool {
		matches!(self, Self::Class | Self::Struct | Self::Interface | Self::Enum)
	}

	/// Returns true for declarations that may own an indented body.
	pub const fn has_body(self) -> bool {
		self.is_type() || matches!(self, Self::Method)
	}

	/// Returns true if the name is dotted (`a.b.c`).
	pub(crate) const fn is_qualified(self) -> bool {
		matches!(self, Self::Namespace | Self::Import)
	}
}

/// One declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
	pub name: String,
	pub kind: SymbolKind,
	/// Range of the name.
	pub range: TextRange,
	/// Enclosing declaration, `None` at file level.
	pub scope: Option<SymbolId>,
	/// Lines spanned by the declaration and its body.
	pub extent: RangeInclusive<usize>,
}

impl Symbol {
	pub fn line(&self) -> usize {
		self.range.start.line
	}
}

/// Declarations of one document in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
	symbols: Vec<Symbol>,
}

impl SymbolTable {
	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
		self.symbols.get(id.0 as usize)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Symbol> + '_ {
		self.symbols.iter()
	}

	/// Returns the first declaration named `name`.
	pub fn find(&self, name: &str) -> Option<&Symbol> {
		self.symbols.iter().find(|s| s.name == name)
	}

	/// Declarations whose enclosing scope contains `line`.
	pub fn visible_at(&self, line: usize) -> impl Iterator<Item = &Symbol> + '_ {
		self.symbols.iter().filter(move |s| match s.scope {
			None => true,
			Some(scope) => self.get(scope).is_some_and(|owner| owner.extent.contains(&line)),
		})
	}

	/// Direct children of `scope`.
	pub fn children(&self, scope: SymbolId) -> impl Iterator<Item = &Symbol> + '_ {
		self.symbols.iter().filter(move |s| s.scope == Some(scope))
	}

	/// Finds an earlier declaration in the same scope that `name` would collide with.
	///
	/// Method overloads do not collide with each other; imports and namespaces
	/// never collide.
	pub(crate) fn conflicting(&self, scope: Option<SymbolId>, name: &str, kind: SymbolKind) -> Option<&Symbol> {
		if kind.is_qualified() {
			return None;
		}
		self.symbols.iter().find(|s| {
			s.scope == scope
				&& s.name == name
				&& !s.kind.is_qualified()
				&& !(s.kind == SymbolKind::Method && kind == SymbolKind::Method)
		})
	}

	pub(crate) fn push(&mut self, symbol: Symbol) -> SymbolId {
		let id = SymbolId(self.symbols.len() as u32);
		self.symbols.push(symbol);
		id
	}

	/// Extends a declaration's extent to end at `last_line`.
	pub(crate) fn close(&mut self, id: SymbolId, last_line: usize) {
		if let Some(sym) = self.symbols.get_mut(id.0 as usize) {
			let start = *sym.extent.start();
			sym.extent = start..=last_line.max(start);
		}
	}
}
