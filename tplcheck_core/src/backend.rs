use std::collections::BTreeSet;
use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::compiler::CodegenBackend;

/// Separator between the segments of a qualified artifact name.
pub const QUALIFIER_SEPARATOR: &str = "::";

/// File extension of generated artifacts.
pub const ARTIFACT_EXTENSION: &str = "rs";

const RESERVED_WORDS: &[&str] = &[
	"as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
	"false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
	"ref", "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
	"where", "while",
];

/// Identity of a generated artifact, derived from the script path relative
/// to the source directory.
///
/// `a/b/Widget.html` becomes `a::b::Widget`: directories turn into
/// qualifier segments and the script extension is dropped. Every segment is
/// sanitized into a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactName {
	segments: Vec<String>,
}

impl ArtifactName {
	pub fn from_relative(relative: &Path) -> Self {
		let mut parts: Vec<String> = relative
			.components()
			.filter_map(|component| {
				match component {
					Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
					_ => None,
				}
			})
			.collect();

		if let Some(last) = parts.last_mut() {
			if let Some(stem) = Path::new(last.as_str()).file_stem() {
				*last = stem.to_string_lossy().into_owned();
			}
		}

		Self {
			segments: parts.iter().map(|part| sanitize_segment(part)).collect(),
		}
	}

	/// Parse a qualified name such as `a::b::Widget`. `.` and `/` are
	/// accepted as separators too.
	pub fn parse(qualified_name: &str) -> Self {
		Self {
			segments: split_qualified(qualified_name)
				.map(sanitize_segment)
				.collect(),
		}
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// The last segment, used as the generated type name.
	pub fn type_name(&self) -> &str {
		self.segments.last().map_or("", String::as_str)
	}

	/// Every segment except the last.
	pub fn module_path(&self) -> &[String] {
		self.segments
			.split_last()
			.map_or(&[][..], |(_, modules)| modules)
	}

	pub fn qualified_name(&self) -> String {
		self.segments.join(QUALIFIER_SEPARATOR)
	}

	/// Location of the artifact below `output_dir`: one directory per module
	/// segment and a file named after the type.
	pub fn output_path(&self, output_dir: &Path) -> PathBuf {
		let mut path = output_dir.to_path_buf();
		for segment in &self.segments {
			path.push(segment);
		}
		path.set_extension(ARTIFACT_EXTENSION);
		path
	}
}

impl fmt::Display for ArtifactName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.qualified_name())
	}
}

fn split_qualified(name: &str) -> impl Iterator<Item = &str> {
	name.split(QUALIFIER_SEPARATOR)
		.flat_map(|part| part.split(['.', '/', '\\']))
		.filter(|part| !part.is_empty())
}

fn sanitize_segment(segment: &str) -> String {
	let mut identifier: String = segment
		.chars()
		.map(|c| {
			if c.is_ascii_alphanumeric() || c == '_' {
				c
			} else {
				'_'
			}
		})
		.collect();

	if identifier.is_empty() || identifier.starts_with(|c: char| c.is_ascii_digit()) {
		identifier.insert(0, '_');
	}

	if RESERVED_WORDS.contains(&identifier.as_str()) {
		identifier.push('_');
	}

	identifier
}

/// Namespaces whose imports are left out of generated artifacts.
///
/// An entry ignores the namespace itself and every namespace below it:
/// `partials` ignores `partials::Nav` and `partials::menu::Item` but not
/// `partials_extra::Nav`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFilter {
	prefixes: BTreeSet<String>,
}

impl ImportFilter {
	pub fn new<I, S>(prefixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			prefixes: prefixes
				.into_iter()
				.map(|prefix| ArtifactName::parse(prefix.as_ref()).qualified_name())
				.filter(|prefix| !prefix.is_empty())
				.collect(),
		}
	}

	pub fn is_ignored(&self, qualified_name: &str) -> bool {
		self.prefixes.iter().any(|prefix| {
			qualified_name
				.strip_prefix(prefix.as_str())
				.is_some_and(|rest| rest.is_empty() || rest.starts_with(QUALIFIER_SEPARATOR))
		})
	}
}

/// Backend producing one Rust module per script. The module exposes a unit
/// struct carrying the script name and its source text.
#[derive(Debug, Clone)]
pub struct RustBackend<'a> {
	filter: &'a ImportFilter,
	imports: BTreeSet<String>,
	source: String,
}

impl<'a> RustBackend<'a> {
	pub fn new(filter: &'a ImportFilter) -> Self {
		Self {
			filter,
			imports: BTreeSet::new(),
			source: String::new(),
		}
	}

	/// Imports collected so far, after filtering.
	pub fn imports(&self) -> impl Iterator<Item = &str> {
		self.imports.iter().map(String::as_str)
	}
}

impl CodegenBackend for RustBackend<'_> {
	fn set_source(&mut self, source: &str) {
		source.clone_into(&mut self.source);
	}

	fn add_import(&mut self, qualified_name: &str) {
		let name = ArtifactName::parse(qualified_name).qualified_name();
		if name.is_empty() || self.filter.is_ignored(&name) {
			return;
		}

		self.imports.insert(name);
	}

	fn render(&self, name: &ArtifactName) -> String {
		let qualified_name = name.qualified_name();
		let type_name = name.type_name();
		let mut output = format!("// @generated by tplcheck from `{qualified_name}`. Do not edit.\n\n");

		let imports: Vec<&String> = self
			.imports
			.iter()
			.filter(|import| **import != qualified_name)
			.collect();
		if !imports.is_empty() {
			for import in &imports {
				output.push_str(&format!("#[allow(unused_imports)]\nuse crate::{import};\n"));
			}
			output.push('\n');
		}

		output.push_str(&format!("pub struct {type_name};\n\n"));
		output.push_str(&format!("impl {type_name} {{\n"));
		output.push_str(&format!(
			"\tpub const NAME: &'static str = {qualified_name:?};\n"
		));
		output.push_str(&format!(
			"\tpub const SOURCE: &'static str = {:?};\n",
			self.source
		));
		output.push_str("}\n");

		output
	}
}
