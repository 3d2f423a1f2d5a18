use std::collections::BTreeSet;
use std::path::Path;

use minijinja::Environment;

use crate::TplResult;
use crate::backend::ArtifactName;
use crate::compiler::CodegenBackend;
use crate::compiler::TemplateCompiler;
use crate::diagnostics::CompilationResult;
use crate::diagnostics::CompilerMessage;
use crate::unit::CompilationUnit;

/// Statements whose first string argument names another template.
const REFERENCE_STATEMENTS: [&str; 4] = ["extends", "from", "import", "include"];

/// [`TemplateCompiler`] backed by [`minijinja`].
///
/// Syntax errors are reported with the line and column the engine points
/// at. When `globals` is non-empty, top-level variables that are neither
/// assigned in the template nor listed there are reported as warnings.
#[derive(Debug, Clone, Default)]
pub struct JinjaCompiler {
	globals: BTreeSet<String>,
}

impl JinjaCompiler {
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_globals(mut self, globals: impl IntoIterator<Item = String>) -> Self {
		self.globals = globals.into_iter().collect();
		self
	}

	fn check(&self, name: &str, source: &str) -> CompilationResult {
		let env = Environment::new();
		let mut result = CompilationResult::default();

		let template = match env.template_from_named_str(name, source) {
			Ok(template) => template,
			Err(err) => {
				let line = err.line().unwrap_or(0);
				let column = err
					.range()
					.map_or(0, |range| column_of(source, range.start));
				let message = match err.detail() {
					Some(detail) => format!("{}: {detail}", err.kind()),
					None => err.kind().to_string(),
				};
				result.errors.push(CompilerMessage::new(line, column, message));
				return result;
			}
		};

		if !self.globals.is_empty() {
			let mut undeclared: Vec<String> = template
				.undeclared_variables(false)
				.into_iter()
				.filter(|variable| !self.globals.contains(variable))
				.collect();
			undeclared.sort();

			for variable in undeclared {
				result.warnings.push(CompilerMessage::new(
					0,
					0,
					format!("variable `{variable}` is not declared"),
				));
			}
		}

		result
	}
}

impl TemplateCompiler for JinjaCompiler {
	fn compile(&self, unit: &mut CompilationUnit<'_>) -> TplResult<CompilationResult> {
		let source = unit.read_source()?;
		Ok(self.check(&unit.name(), &source))
	}

	fn compile_with_backend(
		&self,
		unit: &mut CompilationUnit<'_>,
		backend: &mut dyn CodegenBackend,
	) -> TplResult<CompilationResult> {
		let source = unit.read_source()?;
		let result = self.check(&unit.name(), &source);

		backend.set_source(&source);
		for reference in template_references(&source) {
			let name = ArtifactName::from_relative(Path::new(&reference));
			backend.add_import(&name.qualified_name());
		}

		Ok(result)
	}
}

/// 1-indexed column of the byte at `offset`.
fn column_of(source: &str, offset: usize) -> usize {
	let offset = offset.min(source.len());
	let line_start = source[..offset].rfind('\n').map_or(0, |index| index + 1);
	source[line_start..offset].chars().count() + 1
}

/// Names of the templates referenced by `extends`, `from`, `import` and
/// `include` statements, in order of appearance.
pub(crate) fn template_references(source: &str) -> Vec<String> {
	let mut references = Vec::new();
	let mut rest = source;

	while let Some(start) = rest.find("{%") {
		let after_open = &rest[start + 2..];
		let Some(end) = after_open.find("%}") else {
			break;
		};
		let statement = after_open[..end]
			.trim_matches(|c: char| c == '-' || c == '+' || c.is_whitespace());
		rest = &after_open[end + 2..];

		let Some(keyword) = statement.split_whitespace().next() else {
			continue;
		};
		if !REFERENCE_STATEMENTS.contains(&keyword) {
			continue;
		}

		if let Some(reference) = first_string_literal(&statement[keyword.len()..]) {
			if !references.contains(&reference) {
				references.push(reference);
			}
		}
	}

	references
}

fn first_string_literal(text: &str) -> Option<String> {
	let start = text.find(['"', '\''])?;
	let quote = text[start..].chars().next()?;
	let body = &text[start + 1..];
	let end = body.find(quote)?;
	Some(body[..end].to_string())
}
