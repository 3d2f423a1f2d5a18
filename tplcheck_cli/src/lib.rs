use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Validate template scripts incrementally and generate sources from them.",
	long_about = "tplcheck compiles every template script below a source directory, reports \
	              warnings and syntax errors per file, and fails the build when the configured \
	              policy says so.\n\nRuns are incremental: when nothing changed since the last \
	              clean run the scripts are not compiled again.\n\nQuick start:\n  tplcheck init      \
	              Create a tplcheck.toml file\n  tplcheck validate  Validate the configured \
	              templates"
)]
pub struct TplCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project base directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Initialize tplcheck in a project by creating a sample configuration.
	///
	/// Creates a `tplcheck.toml` file in the project root listing every
	/// option with its default value. If a configuration file already exists,
	/// this command is a no-op and exits successfully.
	Init,
	/// Validate the template scripts of the project.
	///
	/// Compiles every script selected by the include and exclude patterns
	/// below the source directory and reports warnings and syntax errors per
	/// file. Exits with status 1 when the run fails and 2 on configuration or
	/// I/O errors.
	///
	/// Scripts are only compiled again when something changed since the last
	/// clean run. Use `--force` to always compile them.
	Validate(ValidateArgs),
}

#[derive(Debug, Clone, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidateArgs {
	/// Directory containing the template scripts. Overrides
	/// `source_directory` from the configuration.
	#[arg(long)]
	pub source_dir: Option<PathBuf>,

	/// Glob pattern selecting scripts, relative to the source directory.
	/// Can be repeated. Replaces the configured includes.
	#[arg(long = "include", value_name = "PATTERN")]
	pub includes: Vec<String>,

	/// Glob pattern removing scripts from the selection. Can be repeated.
	/// Replaces the configured excludes.
	#[arg(long = "exclude", value_name = "PATTERN")]
	pub excludes: Vec<String>,

	/// Fail when any script produces a warning.
	#[arg(long, default_value_t = false)]
	pub fail_on_warnings: bool,

	/// Generate one source artifact per script below the output directory.
	#[arg(long, default_value_t = false)]
	pub generate: bool,

	/// Directory receiving generated artifacts. Overrides
	/// `output_directory` from the configuration.
	#[arg(long)]
	pub output_dir: Option<PathBuf>,

	/// Namespace whose imports are left out of generated artifacts. Can be
	/// repeated and is added to the configured list.
	#[arg(long = "ignore-import", value_name = "NAMESPACE")]
	pub ignore_imports: Vec<String>,

	/// Skip validation entirely.
	#[arg(long, default_value_t = false)]
	pub skip: bool,

	/// Compile every script even when nothing changed since the last clean
	/// run.
	#[arg(long, default_value_t = false)]
	pub force: bool,

	/// Report diagnostics but never fail the run.
	#[arg(long, default_value_t = false)]
	pub no_fail: bool,

	/// Output format for diagnostics. Use `text` for human-readable output,
	/// `json` for programmatic consumption, or `github` for GitHub Actions
	/// annotations that appear inline on PRs.
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	#[default]
	Text,
	/// JSON output for programmatic consumption. Contains the outcome and
	/// every diagnostic with its file, position, severity and message.
	Json,
	/// GitHub Actions annotation format. Emits `::warning` or `::error`
	/// annotations that appear inline on pull request diffs.
	Github,
}
