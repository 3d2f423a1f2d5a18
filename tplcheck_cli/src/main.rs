use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use tplcheck_cli::Commands;
use tplcheck_cli::OutputFormat;
use tplcheck_cli::TplCli;
use tplcheck_cli::ValidateArgs;
use tplcheck_core::AnyResult;
use tplcheck_core::CONFIG_FILE_CANDIDATES;
use tplcheck_core::FingerprintGate;
use tplcheck_core::MemorySink;
use tplcheck_core::Outcome;
use tplcheck_core::Pipeline;
use tplcheck_core::Severity;
use tplcheck_core::TplConfig;
use tplcheck_core::TplError;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV_VAR: &str = "TPLCHECK_LOG";

const SAMPLE_CONFIG: &str = "# tplcheck configuration\n\n# Directory containing the template \
                             scripts, relative to this file.\nsource_directory = \"src\"\n\n# \
                             Glob patterns selecting scripts below the source \
                             directory.\nincludes = [\"**/*.html\"]\nexcludes = []\n\n# Fail \
                             the build when a script produces warnings.\nfail_on_warnings = \
                             false\n\n# Generate one source artifact per script.\ngenerate = \
                             false\noutput_directory = \
                             \"target/generated-sources/tplcheck\"\n\n# Namespaces whose \
                             imports are left out of generated artifacts.\nignore_imports = \
                             []\n\n# Variables provided when templates are rendered. When \
                             set, any other undeclared variable\n# is reported as a \
                             warning.\nglobals = []\n";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = TplCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_logging(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Init) => run_init(&args).map(|()| true),
		Some(Commands::Validate(validate)) => run_validate(&args, validate),
		None => {
			eprintln!("No subcommand specified. Run `tplcheck --help` for usage.");
			process::exit(1);
		}
	};

	match result {
		Ok(true) => {}
		Ok(false) => process::exit(1),
		Err(e) => {
			// Try to render through miette for rich diagnostics with help text
			// and error codes.
			match e.downcast::<TplError>() {
				Ok(tpl_err) => {
					let report: miette::Report = (*tpl_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

/// Logs go to stderr so they never mix with machine readable output.
fn init_logging(verbose: bool, use_color: bool) {
	let default_level = if verbose { "info" } else { "warn" };
	let env_filter =
		EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_target(false)
		.with_ansi(use_color)
		.with_writer(std::io::stderr)
		.init();
}

fn resolve_root(args: &TplCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_init(args: &TplCli) -> AnyResult<()> {
	let root = resolve_root(args);

	if let Some(existing) = TplConfig::resolve_path(&root) {
		println!("Configuration file already exists: {}", existing.display());
		return Ok(());
	}

	let config_path = root.join(CONFIG_FILE_CANDIDATES[0]);
	std::fs::write(&config_path, SAMPLE_CONFIG)?;
	println!("Created {}", config_path.display());

	println!();
	println!("Next steps:");
	println!("  1. Point `source_directory` at your template scripts");
	println!("  2. Run `tplcheck validate` to check them");

	Ok(())
}

/// Command line values win over the configuration file. Repeated include and
/// exclude patterns replace the configured ones, ignored imports are added.
fn apply_overrides(config: &mut TplConfig, validate: &ValidateArgs) {
	if let Some(source_dir) = &validate.source_dir {
		config.source_directory = Some(source_dir.clone());
	}
	if !validate.includes.is_empty() {
		config.includes.clone_from(&validate.includes);
	}
	if !validate.excludes.is_empty() {
		config.excludes.clone_from(&validate.excludes);
	}
	if let Some(output_dir) = &validate.output_dir {
		config.output_directory = Some(output_dir.clone());
	}
	config
		.ignore_imports
		.extend(validate.ignore_imports.iter().cloned());
	config.fail_on_warnings |= validate.fail_on_warnings;
	config.generate |= validate.generate;
	config.skip |= validate.skip;
}

/// Run the pipeline once and return whether the run succeeded.
fn run_validate(args: &TplCli, validate: &ValidateArgs) -> AnyResult<bool> {
	let root = resolve_root(args);
	let mut config = TplConfig::load(&root)?.unwrap_or_default();
	apply_overrides(&mut config, validate);
	let resolved = config.resolve(&root);
	tracing::debug!(
		source_directory = %resolved.source_directory.display(),
		includes = ?resolved.includes,
		excludes = ?resolved.excludes,
		"resolved configuration"
	);

	let mut pipeline = Pipeline::new(resolved.clone()).with_failure_permitted(!validate.no_fail);
	if !validate.force && !resolved.skip {
		pipeline = pipeline.with_gate(FingerprintGate::new(&resolved)?);
	}

	let mut sink = MemorySink::new();
	let outcome = pipeline.run(&mut sink)?;

	if args.verbose {
		if let Some(verdict) = outcome.verdict() {
			for file in &verdict.processed_files {
				eprintln!("  processed {}", make_relative(file, &resolved.base_dir));
			}
		}
	}

	match validate.format {
		OutputFormat::Text => print_text(&outcome, &sink, &resolved.base_dir),
		OutputFormat::Json => print_json(&outcome, &sink, &resolved.base_dir),
		OutputFormat::Github => print_github(&outcome, &sink, &resolved.base_dir),
	}

	Ok(outcome.is_success())
}

fn print_text(outcome: &Outcome, sink: &MemorySink, root: &Path) {
	for (file, messages) in sink.iter() {
		let rel = make_relative(file, root);
		for message in messages {
			let severity = match message.severity {
				Severity::Error => colored!("error:", red),
				Severity::Warning => colored!("warning:", yellow),
			};
			eprintln!(
				"{}:{}:{}: {severity} {}",
				colored!(rel, bold),
				message.line,
				message.column,
				message.text
			);
		}
	}

	match outcome {
		Outcome::Skipped { reason } => println!("Validation skipped: {reason}."),
		Outcome::Succeeded { verdict } => {
			println!(
				"{} {} file(s) processed in {}ms.",
				colored!("Validation passed:", green),
				verdict.processed_count(),
				verdict.elapsed.as_millis()
			);
		}
		Outcome::Failed { verdict, cause } => {
			eprintln!();
			eprintln!(
				"{} {cause}. {} file(s) processed.",
				colored!("Validation failed:", red),
				verdict.processed_count()
			);
		}
	}
}

fn print_json(outcome: &Outcome, sink: &MemorySink, root: &Path) {
	let diagnostics: Vec<serde_json::Value> = sink
		.iter()
		.flat_map(|(file, messages)| {
			let rel = make_relative(file, root);
			messages.iter().map(move |message| {
				serde_json::json!({
					"file": rel,
					"severity": message.severity,
					"line": message.line,
					"column": message.column,
					"message": message.text,
				})
			})
		})
		.collect();

	let output = serde_json::json!({
		"ok": outcome.is_success(),
		"outcome": outcome,
		"diagnostics": diagnostics,
	});
	println!("{output}");
}

fn print_github(outcome: &Outcome, sink: &MemorySink, root: &Path) {
	for (file, messages) in sink.iter() {
		let rel = make_relative(file, root);
		for message in messages {
			println!(
				"::{} file={rel},line={},col={}::{}",
				message.severity,
				message.line,
				message.column,
				escape_annotation(&message.text)
			);
		}
	}

	match outcome {
		Outcome::Skipped { reason } => eprintln!("Validation skipped: {reason}."),
		Outcome::Succeeded { verdict } => {
			eprintln!(
				"Validation passed: {} file(s) processed.",
				verdict.processed_count()
			);
		}
		Outcome::Failed { verdict, cause } => {
			eprintln!(
				"Validation failed: {cause}. {} file(s) processed.",
				verdict.processed_count()
			);
		}
	}
}

/// Workflow commands end at the first line break, so multi-line messages are
/// percent encoded.
fn escape_annotation(text: &str) -> String {
	text.replace('%', "%25")
		.replace('\r', "%0D")
		.replace('\n', "%0A")
}

fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
