use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum TplError {
	#[error(transparent)]
	#[diagnostic(code(tplcheck::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(tplcheck::config_parse),
		help("check that tplcheck.toml is valid TOML and only uses known options")
	)]
	ConfigParse(String),

	#[error("invalid glob pattern `{pattern}`: {reason}")]
	#[diagnostic(code(tplcheck::invalid_pattern))]
	InvalidPattern { pattern: String, reason: String },

	#[error("configured {option}={{{}}} is not a directory", path.display())]
	#[diagnostic(
		code(tplcheck::not_a_directory),
		help("point `{option}` at a directory or remove the file occupying that path")
	)]
	NotADirectory { option: &'static str, path: PathBuf },

	#[error("unable to create output_directory={{{}}}", path.display())]
	#[diagnostic(code(tplcheck::create_output_directory))]
	CreateOutputDirectory {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write generated artifact `{}`", path.display())]
	#[diagnostic(code(tplcheck::write_artifact))]
	WriteArtifact {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error(
		"scripts `{}` and `{}` both generate `{}`",
		first.display(),
		second.display(),
		path.display()
	)]
	#[diagnostic(
		code(tplcheck::duplicate_artifact),
		help("rename one of the scripts so their artifact names differ")
	)]
	DuplicateArtifact {
		path: PathBuf,
		first: PathBuf,
		second: PathBuf,
	},

	#[error(
		"cannot filter files from {{{}}} with includes {includes:?} and excludes {excludes:?}",
		root.display()
	)]
	#[diagnostic(code(tplcheck::execution))]
	Execution {
		root: PathBuf,
		includes: Vec<String>,
		excludes: Vec<String>,
		#[source]
		source: Box<TplError>,
	},
}

pub type TplResult<T> = Result<T, TplError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
