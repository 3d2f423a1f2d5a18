use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Severity level of a compiler message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Warning,
	Error,
}

impl fmt::Display for Severity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// A single warning or error reported by the compiler for one script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerMessage {
	/// 1-indexed line number, `0` when unknown.
	pub line: usize,
	/// 1-indexed column number, `0` when unknown.
	pub column: usize,
	pub message: String,
}

impl CompilerMessage {
	pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
		Self {
			line,
			column,
			message: message.into(),
		}
	}
}

/// Warnings and errors produced by compiling one script, in the order the
/// compiler reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationResult {
	pub warnings: Vec<CompilerMessage>,
	pub errors: Vec<CompilerMessage>,
}

impl CompilationResult {
	pub fn has_warnings(&self) -> bool {
		!self.warnings.is_empty()
	}

	pub fn has_errors(&self) -> bool {
		!self.errors.is_empty()
	}

	pub fn is_clean(&self) -> bool {
		self.warnings.is_empty() && self.errors.is_empty()
	}

	/// Convert the compiler messages into sink diagnostics, warnings first.
	pub fn diagnostics(&self) -> impl Iterator<Item = DiagnosticMessage> + '_ {
		let warnings = self
			.warnings
			.iter()
			.map(|message| DiagnosticMessage::warning(message.line, message.column, &message.message));
		let errors = self
			.errors
			.iter()
			.map(|message| DiagnosticMessage::error(message.line, message.column, &message.message));

		warnings.chain(errors)
	}
}

/// A diagnostic attached to a position in a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
	pub severity: Severity,
	/// 1-indexed line number, `0` when unknown.
	pub line: usize,
	/// 1-indexed column number, `0` when unknown.
	pub column: usize,
	pub text: String,
}

impl DiagnosticMessage {
	pub fn warning(line: usize, column: usize, text: &str) -> Self {
		Self {
			severity: Severity::Warning,
			line,
			column,
			text: text.to_string(),
		}
	}

	/// Error text is reported on a single line, so embedded line separators
	/// are removed.
	pub fn error(line: usize, column: usize, text: &str) -> Self {
		Self {
			severity: Severity::Error,
			line,
			column,
			text: strip_line_separators(text),
		}
	}
}

fn strip_line_separators(text: &str) -> String {
	text.replace(['\r', '\n'], "")
}

/// Per-file store of diagnostics, owned by whoever surfaces them to the
/// user.
pub trait DiagnosticSink {
	/// Remove every diagnostic previously recorded for `file`.
	fn clear(&mut self, file: &Path);

	/// Append one diagnostic for `file`.
	fn record(&mut self, file: &Path, message: DiagnosticMessage);

	/// Replace the diagnostics of `file` with `messages`. A file without new
	/// messages ends up with none.
	fn replace(&mut self, file: &Path, messages: impl IntoIterator<Item = DiagnosticMessage>)
	where
		Self: Sized,
	{
		self.clear(file);
		for message in messages {
			self.record(file, message);
		}
	}
}

/// A [`DiagnosticSink`] keeping diagnostics in memory, ordered by file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemorySink {
	files: BTreeMap<PathBuf, Vec<DiagnosticMessage>>,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Diagnostics currently recorded for `file`.
	pub fn get(&self, file: &Path) -> &[DiagnosticMessage] {
		self.files.get(file).map_or(&[], Vec::as_slice)
	}

	/// Iterate over files that have at least one diagnostic.
	pub fn iter(&self) -> impl Iterator<Item = (&Path, &[DiagnosticMessage])> {
		self.files
			.iter()
			.filter(|(_, messages)| !messages.is_empty())
			.map(|(file, messages)| (file.as_path(), messages.as_slice()))
	}

	/// Total number of diagnostics across all files.
	pub fn len(&self) -> usize {
		self.files.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl DiagnosticSink for MemorySink {
	fn clear(&mut self, file: &Path) {
		self.files.remove(file);
	}

	fn record(&mut self, file: &Path, message: DiagnosticMessage) {
		self.files.entry(file.to_path_buf()).or_default().push(message);
	}
}

impl<S: DiagnosticSink> DiagnosticSink for &mut S {
	fn clear(&mut self, file: &Path) {
		(**self).clear(file);
	}

	fn record(&mut self, file: &Path, message: DiagnosticMessage) {
		(**self).record(file, message);
	}
}
