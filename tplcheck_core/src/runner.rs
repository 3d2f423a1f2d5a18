use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::TplError;
use crate::TplResult;
use crate::backend::ArtifactName;
use crate::backend::ImportFilter;
use crate::backend::RustBackend;
use crate::compiler::CodegenBackend;
use crate::compiler::TemplateCompiler;
use crate::diagnostics::CompilationResult;
use crate::matcher::CandidateFile;
use crate::unit::CompilationUnit;

/// Buffer size used when writing generated artifacts.
pub const WRITE_BUFFER_SIZE: usize = 16 * 1024;

/// What happens to each script once it has been bound to a
/// [`CompilationUnit`].
pub trait ScriptProcessor {
	fn process(
		&mut self,
		compiler: &dyn TemplateCompiler,
		unit: &mut CompilationUnit<'_>,
	) -> TplResult<CompilationResult>;
}

/// Compile each script for validation only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl ScriptProcessor for Validator {
	fn process(
		&mut self,
		compiler: &dyn TemplateCompiler,
		unit: &mut CompilationUnit<'_>,
	) -> TplResult<CompilationResult> {
		compiler.compile(unit)
	}
}

/// Compile each script and write the generated artifact below an output
/// directory, overwriting whatever was there.
///
/// Two scripts whose names sanitize to the same artifact, such as
/// `my-page.html` and `my_page.html`, abort the run instead of silently
/// overwriting each other.
#[derive(Debug, Clone)]
pub struct Transpiler {
	output_dir: PathBuf,
	filter: ImportFilter,
	written: Vec<PathBuf>,
	origins: BTreeMap<PathBuf, PathBuf>,
}

impl Transpiler {
	pub fn new(output_dir: impl Into<PathBuf>, filter: ImportFilter) -> Self {
		Self {
			output_dir: output_dir.into(),
			filter,
			written: Vec::new(),
			origins: BTreeMap::new(),
		}
	}

	pub fn output_dir(&self) -> &Path {
		&self.output_dir
	}

	/// Artifacts written so far, in processing order.
	pub fn written(&self) -> &[PathBuf] {
		&self.written
	}
}

impl ScriptProcessor for Transpiler {
	fn process(
		&mut self,
		compiler: &dyn TemplateCompiler,
		unit: &mut CompilationUnit<'_>,
	) -> TplResult<CompilationResult> {
		let script = &unit.file().relative;
		let name = ArtifactName::from_relative(script);
		let path = name.output_path(&self.output_dir);
		if let Some(first) = self.origins.get(&path) {
			return Err(TplError::DuplicateArtifact {
				path,
				first: first.clone(),
				second: script.clone(),
			});
		}
		self.origins.insert(path.clone(), script.clone());

		let mut backend = RustBackend::new(&self.filter);
		let result = compiler.compile_with_backend(unit, &mut backend)?;
		write_artifact(&path, &backend.render(&name))?;
		tracing::debug!(artifact = %name, path = %path.display(), "wrote generated artifact");

		self.written.push(path);
		Ok(result)
	}
}

fn write_artifact(path: &Path, content: &str) -> TplResult<()> {
	let write = || -> std::io::Result<()> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		let mut out = BufWriter::with_capacity(WRITE_BUFFER_SIZE, File::create(path)?);
		out.write_all(content.as_bytes())?;
		out.flush()
	};

	write().map_err(|source| {
		TplError::WriteArtifact {
			path: path.to_path_buf(),
			source,
		}
	})
}

/// Run `processor` over every file in order, returning one result per
/// file.
///
/// Each unit is released before the next file is acquired, including when
/// processing fails. The first failure aborts the loop and no partial
/// results are returned.
pub fn process_files<P: ScriptProcessor + ?Sized>(
	root: &Path,
	files: &[CandidateFile],
	compiler: &dyn TemplateCompiler,
	processor: &mut P,
) -> TplResult<Vec<(CandidateFile, CompilationResult)>> {
	let mut results = Vec::with_capacity(files.len());

	for file in files {
		let mut unit = CompilationUnit::acquire(root, file)?;
		let result = processor.process(compiler, &mut unit)?;
		unit.dispose();

		tracing::debug!(
			file = %file.relative.display(),
			warnings = result.warnings.len(),
			errors = result.errors.len(),
			"processed script"
		);
		results.push((file.clone(), result));
	}

	Ok(results)
}
