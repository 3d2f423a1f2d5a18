use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::WalkBuilder;

use crate::TplError;
use crate::TplResult;

/// A template script selected for processing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateFile {
	/// Absolute path of the script.
	pub path: PathBuf,
	/// Path of the script relative to the scanned root.
	pub relative: PathBuf,
}

impl CandidateFile {
	pub fn new(root: &Path, relative: impl Into<PathBuf>) -> Self {
		let relative = relative.into();
		Self {
			path: root.join(&relative),
			relative,
		}
	}
}

/// Resolves a root directory plus include/exclude glob patterns into the
/// files to process.
///
/// Patterns are matched against paths relative to the root and `*` never
/// crosses a directory separator, so `*.html` only selects files at the top
/// level while `**/*.html` selects them at any depth.
#[derive(Debug, Clone)]
pub struct PathMatcher {
	includes: GlobSet,
	excludes: GlobSet,
}

impl PathMatcher {
	pub fn new(includes: &[String], excludes: &[String]) -> TplResult<Self> {
		Ok(Self {
			includes: build_glob_set(includes)?,
			excludes: build_glob_set(excludes)?,
		})
	}

	/// Whether a root-relative path matches at least one include pattern and
	/// no exclude pattern.
	pub fn is_match(&self, relative: &Path) -> bool {
		self.includes.is_match(relative) && !self.excludes.is_match(relative)
	}

	/// Walk `root` and return every matching file, sorted by relative path.
	///
	/// The order is stable between runs over the same tree.
	pub fn scan(&self, root: &Path) -> TplResult<Vec<CandidateFile>> {
		if !root.is_dir() {
			return Err(TplError::NotADirectory {
				option: "source_directory",
				path: root.to_path_buf(),
			});
		}

		let walker = WalkBuilder::new(root)
			.standard_filters(false)
			.follow_links(true)
			.build();
		let mut relatives = BTreeSet::new();

		for entry in walker {
			let entry = match entry {
				Ok(entry) => entry,
				Err(err) => {
					let message = err.to_string();
					match err.into_io_error() {
						Some(io_error) => return Err(io_error.into()),
						// Symlink loops are reported without an underlying io error.
						None => {
							tracing::warn!(error = %message, "skipping entry in source directory");
							continue;
						}
					}
				}
			};

			if !entry.file_type().is_some_and(|file_type| file_type.is_file()) {
				continue;
			}

			let Ok(relative) = entry.path().strip_prefix(root) else {
				continue;
			};

			if self.is_match(relative) {
				relatives.insert(relative.to_path_buf());
			}
		}

		tracing::debug!(root = %root.display(), files = relatives.len(), "scanned source directory");

		Ok(relatives
			.into_iter()
			.map(|relative| CandidateFile::new(root, relative))
			.collect())
	}
}

/// Build a `GlobSet` from a list of glob pattern strings.
fn build_glob_set(patterns: &[String]) -> TplResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = GlobBuilder::new(pattern)
			.literal_separator(true)
			.build()
			.map_err(|e| {
				TplError::InvalidPattern {
					pattern: pattern.clone(),
					reason: e.kind().to_string(),
				}
			})?;
		builder.add(glob);
	}

	builder.build().map_err(|e| {
		TplError::InvalidPattern {
			pattern: patterns.join(", "),
			reason: e.to_string(),
		}
	})
}
