// Library crates report through tracing, never stderr.
#![deny(clippy::print_stderr)]

//! Boo language support.
//!
//! * [`scanner`]: resumable, line-oriented lexer used for colorization and as
//!   the first analysis stage
//! * [`classification`]: the static colorable-item table
//! * [`compiler`]: the [`Compiler`] seam and the [`StructuralCompiler`]
//! * [`preferences`]: language metadata and editing preferences

pub mod classification;
pub mod compiler;
pub mod diagnostic;
mod lexer;
pub mod preferences;
pub mod scanner;
pub mod token;

pub use classification::{
	Color, ColorableItem, FontStyle, classification_kind, classification_kind_count, colorable_item,
};
pub use compiler::{
	CompileFault, CompileOutput, Compiler, LineClassifications, StructuralCompiler, Symbol, SymbolId, SymbolKind,
	SymbolTable, lexical_diagnostics, refine_classifications,
};
pub use diagnostic::{Diagnostic, Severity};
pub use preferences::{FORMAT_FILTER_LIST, LANGUAGE_NAME, LanguagePreferences};
pub use scanner::{
	Classification, ClassifiedToken, ColorScanner, LexIssue, LexedDocument, LineState, LineStateCache, TokenInfo,
	Tokens, scan_line, tokenize, tokenize_from,
};
pub use token::TokenKind;
