use crate::TplResult;
use crate::backend::ArtifactName;
use crate::diagnostics::CompilationResult;
use crate::unit::CompilationUnit;

/// The external template compiler.
///
/// Grammar and semantic problems are reported through the returned
/// [`CompilationResult`]. An `Err` is reserved for failures to read the
/// unit and aborts the whole run.
pub trait TemplateCompiler {
	/// Compile a unit for validation only.
	fn compile(&self, unit: &mut CompilationUnit<'_>) -> TplResult<CompilationResult>;

	/// Compile a unit while feeding `backend` everything it needs to render a
	/// generated artifact.
	fn compile_with_backend(
		&self,
		unit: &mut CompilationUnit<'_>,
		backend: &mut dyn CodegenBackend,
	) -> TplResult<CompilationResult>;
}

/// Receives what the compiler learns about one script and renders the
/// generated source for it.
pub trait CodegenBackend {
	/// Record the script body the artifact is generated from.
	fn set_source(&mut self, source: &str);

	/// Record a dependency on another artifact, named by its qualified name.
	fn add_import(&mut self, qualified_name: &str);

	/// Render the final source text of the artifact.
	fn render(&self, name: &ArtifactName) -> String;
}
