use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::TplError;
use crate::TplResult;

/// Include pattern used when none are configured: every template script
/// below the source directory.
pub const DEFAULT_INCLUDES: &str = "**/*.html";

/// Source directory used when none is configured, relative to the project
/// base directory.
pub const DEFAULT_SOURCE_DIRECTORY: &str = "src";

/// Output directory for generated artifacts, relative to the project base
/// directory.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "target/generated-sources/tplcheck";

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"tplcheck.toml",
	".tplcheck.toml",
	".config/tplcheck.toml",
];

/// Configuration loaded from a `tplcheck.toml` file.
///
/// ```toml
/// source_directory = "src/templates"
/// includes = ["**/*.html"]
/// excludes = ["vendor/**"]
/// fail_on_warnings = true
///
/// generate = true
/// output_directory = "target/generated-sources/tplcheck"
/// ignore_imports = ["partials"]
///
/// globals = ["user", "request"]
/// ```
///
/// Every option can also be supplied on the command line, in which case the
/// command line value wins. Relative paths are resolved against the
/// directory holding the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct TplConfig {
	/// Root folder holding the template scripts to validate.
	pub source_directory: Option<PathBuf>,
	/// Glob patterns, relative to the source directory, selecting the files
	/// to process. Defaults to [`DEFAULT_INCLUDES`].
	pub includes: Vec<String>,
	/// Glob patterns, relative to the source directory, removing files from
	/// the included set.
	pub excludes: Vec<String>,
	/// Fail the run when any compiler warning is reported.
	pub fail_on_warnings: bool,
	/// Generate a source artifact for every processed template.
	pub generate: bool,
	/// Folder receiving generated artifacts when `generate` is set.
	pub output_directory: Option<PathBuf>,
	/// Namespaces left out of the import list of generated artifacts. Every
	/// sub-namespace of an entry is ignored as well.
	pub ignore_imports: BTreeSet<String>,
	/// Skip the run entirely.
	pub skip: bool,
	/// Variable names the bundled compiler treats as always declared. When
	/// empty, undeclared variables are not reported.
	pub globals: BTreeSet<String>,
}

impl TplConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> TplResult<Option<TplConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse config from a TOML string.
	pub fn parse(content: &str) -> TplResult<TplConfig> {
		toml::from_str(content).map_err(|e| TplError::ConfigParse(e.to_string()))
	}

	/// Resolve every option against `base_dir`, filling in defaults. The
	/// returned configuration is immutable for the rest of the run.
	#[must_use]
	pub fn resolve(&self, base_dir: &Path) -> ResolvedConfig {
		let base_dir = absolute(base_dir, &current_dir());
		let source_directory = absolute(
			self.source_directory
				.as_deref()
				.unwrap_or(Path::new(DEFAULT_SOURCE_DIRECTORY)),
			&base_dir,
		);
		let output_directory = absolute(
			self.output_directory
				.as_deref()
				.unwrap_or(Path::new(DEFAULT_OUTPUT_DIRECTORY)),
			&base_dir,
		);
		let includes = if self.includes.is_empty() {
			vec![DEFAULT_INCLUDES.to_string()]
		} else {
			self.includes.clone()
		};

		ResolvedConfig {
			base_dir,
			source_directory,
			includes,
			excludes: self.excludes.clone(),
			fail_on_warnings: self.fail_on_warnings,
			generate: self.generate,
			output_directory,
			ignore_imports: self.ignore_imports.clone(),
			skip: self.skip,
			globals: self.globals.clone(),
		}
	}
}

/// Fully resolved, absolute configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResolvedConfig {
	/// Project base directory. Caches are stored below it.
	pub base_dir: PathBuf,
	pub source_directory: PathBuf,
	/// Never empty.
	pub includes: Vec<String>,
	pub excludes: Vec<String>,
	pub fail_on_warnings: bool,
	pub generate: bool,
	pub output_directory: PathBuf,
	pub ignore_imports: BTreeSet<String>,
	pub skip: bool,
	pub globals: BTreeSet<String>,
}

fn current_dir() -> PathBuf {
	std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn absolute(path: &Path, base: &Path) -> PathBuf {
	if path.is_absolute() {
		path.to_path_buf()
	} else {
		base.join(path)
	}
}
