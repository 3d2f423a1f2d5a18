use std::collections::HashMap;
use std::path::Path;

use crate::CodegenBackend;
use crate::CompilationResult;
use crate::CompilationUnit;
use crate::CompilerMessage;
use crate::DeltaGate;
use crate::ResolvedConfig;
use crate::TemplateCompiler;
use crate::TplConfig;
use crate::TplResult;

/// A compiler returning canned results keyed by the script name relative to
/// the source directory. Unknown scripts compile cleanly.
#[derive(Debug, Default)]
pub(crate) struct ScriptedCompiler {
	results: HashMap<String, CompilationResult>,
	imports: HashMap<String, Vec<String>>,
	unreadable: Option<String>,
}

impl ScriptedCompiler {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	pub(crate) fn with_error(mut self, name: &str, line: usize, column: usize, text: &str) -> Self {
		self.results
			.entry(name.to_string())
			.or_default()
			.errors
			.push(CompilerMessage::new(line, column, text));
		self
	}

	pub(crate) fn with_warning(mut self, name: &str, line: usize, column: usize, text: &str) -> Self {
		self.results
			.entry(name.to_string())
			.or_default()
			.warnings
			.push(CompilerMessage::new(line, column, text));
		self
	}

	pub(crate) fn with_imports(mut self, name: &str, imports: &[&str]) -> Self {
		self.imports.insert(
			name.to_string(),
			imports.iter().map(ToString::to_string).collect(),
		);
		self
	}

	/// Fail with an I/O error when asked to compile `name`.
	pub(crate) fn with_unreadable(mut self, name: &str) -> Self {
		self.unreadable = Some(name.to_string());
		self
	}

	fn result_for(&self, unit: &mut CompilationUnit<'_>) -> TplResult<CompilationResult> {
		let name = unit.name();
		if self.unreadable.as_deref() == Some(name.as_str()) {
			return Err(std::io::Error::other(format!("cannot read {name}")).into());
		}
		unit.read_source()?;

		Ok(self.results.get(&name).cloned().unwrap_or_default())
	}
}

impl TemplateCompiler for ScriptedCompiler {
	fn compile(&self, unit: &mut CompilationUnit<'_>) -> TplResult<CompilationResult> {
		self.result_for(unit)
	}

	fn compile_with_backend(
		&self,
		unit: &mut CompilationUnit<'_>,
		backend: &mut dyn CodegenBackend,
	) -> TplResult<CompilationResult> {
		let name = unit.name();
		let result = self.result_for(unit)?;
		backend.set_source(&format!("source of {name}"));
		for import in self.imports.get(&name).into_iter().flatten() {
			backend.add_import(import);
		}

		Ok(result)
	}
}

/// A gate with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedGate(pub bool);

impl DeltaGate for FixedGate {
	fn has_pending_changes(&mut self, _root: &Path) -> TplResult<bool> {
		Ok(self.0)
	}
}

pub(crate) fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap();
	}
	std::fs::write(path, content).unwrap();
}

/// A resolved config with `templates` as the source directory below `base`.
pub(crate) fn config_in(base: &Path) -> ResolvedConfig {
	TplConfig {
		source_directory: Some("templates".into()),
		..TplConfig::default()
	}
	.resolve(base)
}
