use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::diagnostics::CompilationResult;
use crate::diagnostics::DiagnosticSink;
use crate::matcher::CandidateFile;

/// Policy applied when turning per-file results into an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerdictPolicy {
	/// Treat warnings as a reason to fail.
	pub fail_on_warnings: bool,
	/// Whether the host allows the run to fail at all. When `false`,
	/// diagnostics are still recorded but the outcome is always a success.
	pub failure_permitted: bool,
}

impl Default for VerdictPolicy {
	fn default() -> Self {
		Self {
			fail_on_warnings: false,
			failure_permitted: true,
		}
	}
}

/// Summary of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
	pub has_warnings: bool,
	pub has_errors: bool,
	/// Absolute paths of every processed script, in processing order.
	pub processed_files: Vec<PathBuf>,
	#[serde(serialize_with = "serialize_millis")]
	pub elapsed: Duration,
}

impl Verdict {
	pub fn processed_count(&self) -> usize {
		self.processed_files.len()
	}

	/// No warnings and no errors.
	pub fn is_clean(&self) -> bool {
		!self.has_warnings && !self.has_errors
	}

	/// Fold one file's result into this verdict.
	pub fn observe(&mut self, file: &CandidateFile, result: &CompilationResult) {
		self.has_warnings |= result.has_warnings();
		self.has_errors |= result.has_errors();
		self.processed_files.push(file.path.clone());
	}

	/// Combine partial verdicts, e.g. one per worker. The elapsed time is the
	/// longest of the two.
	#[must_use]
	pub fn merge(mut self, other: Verdict) -> Verdict {
		self.has_warnings |= other.has_warnings;
		self.has_errors |= other.has_errors;
		self.processed_files.extend(other.processed_files);
		self.elapsed = self.elapsed.max(other.elapsed);
		self
	}
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: serde::Serializer>(
	elapsed: &Duration,
	serializer: S,
) -> Result<S::Ok, S::Error> {
	serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// Why a completed run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
	WarningsConfiguredToFail,
	SyntaxErrors,
}

impl fmt::Display for FailureCause {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::WarningsConfiguredToFail => write!(f, "warnings configured to fail the build"),
			Self::SyntaxErrors => write!(f, "syntax errors present"),
		}
	}
}

/// Why a run did not process anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
	/// Skipping was requested in the configuration.
	Disabled,
	/// The source directory does not exist.
	MissingSourceDirectory,
}

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Disabled => write!(f, "disabled by configuration"),
			Self::MissingSourceDirectory => write!(f, "source directory does not exist"),
		}
	}
}

/// Final result of a pipeline run. Fatal failures are reported as
/// [`TplError`](crate::TplError) instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
	Skipped { reason: SkipReason },
	Succeeded { verdict: Verdict },
	Failed { verdict: Verdict, cause: FailureCause },
}

impl Outcome {
	pub fn is_success(&self) -> bool {
		!matches!(self, Self::Failed { .. })
	}

	pub fn verdict(&self) -> Option<&Verdict> {
		match self {
			Self::Skipped { .. } => None,
			Self::Succeeded { verdict } | Self::Failed { verdict, .. } => Some(verdict),
		}
	}
}

/// Record every file's diagnostics in `sink` and decide the outcome.
///
/// Each file's previous diagnostics are cleared before its new ones are
/// recorded, so a file that became clean ends up with none.
pub fn aggregate<S: DiagnosticSink>(
	results: &[(CandidateFile, CompilationResult)],
	sink: &mut S,
	policy: VerdictPolicy,
	elapsed: Duration,
) -> Outcome {
	let mut verdict = Verdict::default();

	for (file, result) in results {
		sink.replace(&file.path, result.diagnostics());
		verdict.observe(file, result);
	}
	verdict.elapsed = elapsed;

	decide(verdict, policy)
}

/// Apply `policy` to a finished verdict.
pub fn decide(verdict: Verdict, policy: VerdictPolicy) -> Outcome {
	let cause = if !policy.failure_permitted {
		None
	} else if verdict.has_warnings && policy.fail_on_warnings {
		Some(FailureCause::WarningsConfiguredToFail)
	} else if verdict.has_errors {
		Some(FailureCause::SyntaxErrors)
	} else {
		None
	};

	match cause {
		Some(cause) => Outcome::Failed { verdict, cause },
		None => Outcome::Succeeded { verdict },
	}
}
