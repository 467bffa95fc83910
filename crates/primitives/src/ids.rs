/// Opaque identity of an open source document.
///
/// Allocated by the language service when the host opens a document and never
/// reused for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u64);

impl std::fmt::Display for SourceId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "src#{}", self.0)
	}
}
