use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use crate::TplResult;
use crate::matcher::CandidateFile;

/// The handle presented to a [`TemplateCompiler`](crate::TemplateCompiler)
/// for one script: the scanned root, the script, and an open reader over its
/// contents.
///
/// The reader is released exactly once, either by [`dispose`](Self::dispose)
/// or, when compilation bails out early, when the unit is dropped.
#[derive(Debug)]
pub struct CompilationUnit<'a> {
	root: &'a Path,
	file: &'a CandidateFile,
	reader: Option<BufReader<File>>,
}

impl<'a> CompilationUnit<'a> {
	/// Bind `file` below `root` and open it for reading.
	pub fn acquire(root: &'a Path, file: &'a CandidateFile) -> TplResult<Self> {
		let reader = BufReader::new(File::open(&file.path)?);
		tracing::trace!(file = %file.relative.display(), "acquired compilation unit");

		Ok(Self {
			root,
			file,
			reader: Some(reader),
		})
	}

	pub fn root(&self) -> &Path {
		self.root
	}

	pub fn file(&self) -> &CandidateFile {
		self.file
	}

	/// Name of the script relative to the root, with `/` separators.
	pub fn name(&self) -> String {
		self.file.relative.to_string_lossy().replace('\\', "/")
	}

	/// Read the remaining contents of the script.
	///
	/// The first call returns the whole script. Reading after the unit has
	/// been released yields an empty string.
	pub fn read_source(&mut self) -> TplResult<String> {
		let mut source = String::new();
		if let Some(reader) = self.reader.as_mut() {
			reader.read_to_string(&mut source)?;
		}

		Ok(source)
	}

	/// Release the underlying reader.
	pub fn dispose(mut self) {
		self.release();
	}

	fn release(&mut self) {
		if self.reader.take().is_some() {
			tracing::trace!(file = %self.file.relative.display(), "released compilation unit");
		}
	}
}

impl Drop for CompilationUnit<'_> {
	fn drop(&mut self) {
		self.release();
	}
}
