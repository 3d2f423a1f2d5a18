use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::TplError;
use crate::TplResult;
use crate::backend::ImportFilter;
use crate::compiler::TemplateCompiler;
use crate::config::ResolvedConfig;
use crate::delta::AlwaysPending;
use crate::delta::DeltaGate;
use crate::diagnostics::DiagnosticSink;
use crate::jinja::JinjaCompiler;
use crate::matcher::PathMatcher;
use crate::runner::Transpiler;
use crate::runner::Validator;
use crate::runner::process_files;
use crate::verdict::Outcome;
use crate::verdict::SkipReason;
use crate::verdict::Verdict;
use crate::verdict::VerdictPolicy;
use crate::verdict::aggregate;

/// Runs one validation pass over a source directory.
///
/// By default the pipeline compiles with [`JinjaCompiler`], processes every
/// run (no delta gate), and is allowed to fail.
pub struct Pipeline {
	config: ResolvedConfig,
	compiler: Box<dyn TemplateCompiler>,
	gate: Box<dyn DeltaGate>,
	failure_permitted: bool,
	source_roots: Vec<PathBuf>,
}

impl Pipeline {
	pub fn new(config: ResolvedConfig) -> Self {
		let compiler = JinjaCompiler::new().with_globals(config.globals.iter().cloned());

		Self {
			config,
			compiler: Box::new(compiler),
			gate: Box::new(AlwaysPending),
			failure_permitted: true,
			source_roots: Vec::new(),
		}
	}

	#[must_use]
	pub fn with_compiler(mut self, compiler: impl TemplateCompiler + 'static) -> Self {
		self.compiler = Box::new(compiler);
		self
	}

	#[must_use]
	pub fn with_gate(mut self, gate: impl DeltaGate + 'static) -> Self {
		self.gate = Box::new(gate);
		self
	}

	/// Some hosts must never see a failed run. With `false`, diagnostics are
	/// still recorded but every completed run succeeds.
	#[must_use]
	pub fn with_failure_permitted(mut self, failure_permitted: bool) -> Self {
		self.failure_permitted = failure_permitted;
		self
	}

	pub fn config(&self) -> &ResolvedConfig {
		&self.config
	}

	/// Directories holding generated sources that the enclosing build should
	/// compile. Populated once the output directory has been prepared.
	pub fn source_roots(&self) -> &[PathBuf] {
		&self.source_roots
	}

	/// Run the pipeline, recording diagnostics for every processed file in
	/// `sink`.
	pub fn run<S: DiagnosticSink>(&mut self, sink: &mut S) -> TplResult<Outcome> {
		if self.config.skip {
			tracing::info!("Skipping validation.");
			return Ok(Outcome::Skipped {
				reason: SkipReason::Disabled,
			});
		}

		let start = Instant::now();
		let source_directory = self.config.source_directory.clone();

		if !source_directory.exists() {
			tracing::info!("Source directory does not exist, skipping.");
			return Ok(Outcome::Skipped {
				reason: SkipReason::MissingSourceDirectory,
			});
		}
		if !source_directory.is_dir() {
			return Err(TplError::NotADirectory {
				option: "source_directory",
				path: source_directory,
			});
		}

		let matcher = PathMatcher::new(&self.config.includes, &self.config.excludes)?;

		if self.config.generate {
			let output_directory = self.config.output_directory.clone();
			prepare_output_directory(&output_directory)?;
			if !self.source_roots.contains(&output_directory) {
				self.source_roots.push(output_directory);
			}
		}

		let pending = self
			.gate
			.has_pending_changes(&source_directory)
			.map_err(|e| self.execution_error(e))?;
		if !pending {
			tracing::info!("No files found to validate, skipping.");
			return Ok(Outcome::Succeeded {
				verdict: Verdict {
					elapsed: start.elapsed(),
					..Verdict::default()
				},
			});
		}

		let files = matcher
			.scan(&source_directory)
			.map_err(|e| self.execution_error(e))?;

		let processed = if self.config.generate {
			let filter = ImportFilter::new(&self.config.ignore_imports);
			let mut transpiler = Transpiler::new(&self.config.output_directory, filter);
			process_files(&source_directory, &files, self.compiler.as_ref(), &mut transpiler)
		} else {
			process_files(&source_directory, &files, self.compiler.as_ref(), &mut Validator)
		};
		let results = processed.map_err(|e| self.execution_error(e))?;

		let policy = VerdictPolicy {
			fail_on_warnings: self.config.fail_on_warnings,
			failure_permitted: self.failure_permitted,
		};
		let outcome = aggregate(&results, sink, policy, start.elapsed());

		if let Some(verdict) = outcome.verdict() {
			tracing::info!(
				"Processed {} files in {}ms",
				verdict.processed_count(),
				verdict.elapsed.as_millis()
			);

			// Dirty files must be revisited by the next run.
			if verdict.is_clean() {
				if let Err(err) = self.gate.commit() {
					tracing::warn!("failed to persist the delta cache: {err}");
				}
			}
		}

		Ok(outcome)
	}

	fn execution_error(&self, source: TplError) -> TplError {
		TplError::Execution {
			root: self.config.source_directory.clone(),
			includes: self.config.includes.clone(),
			excludes: self.config.excludes.clone(),
			source: Box::new(source),
		}
	}
}

fn prepare_output_directory(path: &Path) -> TplResult<()> {
	if path.exists() && !path.is_dir() {
		return Err(TplError::NotADirectory {
			option: "output_directory",
			path: path.to_path_buf(),
		});
	}

	if !path.exists() {
		std::fs::create_dir_all(path).map_err(|source| {
			TplError::CreateOutputDirectory {
				path: path.to_path_buf(),
				source,
			}
		})?;
	}

	Ok(())
}
