use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;

use crate::TplResult;
use crate::backend::ArtifactName;
use crate::config::ResolvedConfig;
use crate::matcher::PathMatcher;

pub(crate) const CACHE_SCHEMA_VERSION: u32 = 1;
const KEY_SEPARATOR: &str = "\u{1f}";
const CACHE_FILE_NAME: &str = "delta-v1.json";

/// Decides whether a source directory has changed since the last completed
/// run.
pub trait DeltaGate {
	/// Whether anything below `root` needs processing.
	fn has_pending_changes(&mut self, root: &Path) -> TplResult<bool>;

	/// Remember the state observed by the last
	/// [`has_pending_changes`](Self::has_pending_changes) call as processed.
	fn commit(&mut self) -> TplResult<()> {
		Ok(())
	}
}

/// A gate that always reports pending work.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPending;

impl DeltaGate for AlwaysPending {
	fn has_pending_changes(&mut self, _root: &Path) -> TplResult<bool> {
		Ok(true)
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct FileFingerprint {
	pub size: u64,
	pub modified_unix_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct DeltaCache {
	pub schema_version: u32,
	pub cache_key: String,
	pub files: BTreeMap<String, FileFingerprint>,
}

/// A gate comparing file sizes and modification times against the snapshot
/// stored by the previous successful run.
///
/// The snapshot lives at `<base>/.tplcheck/cache/delta-v1.json` and is keyed
/// by every option that changes the outcome of a run, so changing any of
/// them forces a full run. When artifacts are generated, a missing artifact
/// also counts as pending work.
#[derive(Debug, Clone)]
pub struct FingerprintGate {
	cache_dir: PathBuf,
	matcher: PathMatcher,
	cache_key: String,
	output_directory: Option<PathBuf>,
	observed: Option<DeltaCache>,
}

impl FingerprintGate {
	pub fn new(config: &ResolvedConfig) -> TplResult<Self> {
		Ok(Self {
			cache_dir: cache_dir(&config.base_dir),
			matcher: PathMatcher::new(&config.includes, &config.excludes)?,
			cache_key: build_cache_key(config),
			output_directory: config.generate.then(|| config.output_directory.clone()),
			observed: None,
		})
	}

	/// Key identifying the options the stored snapshot was taken with.
	pub fn cache_key(&self) -> &str {
		&self.cache_key
	}

	pub fn cache_path(&self) -> PathBuf {
		self.cache_dir.join(CACHE_FILE_NAME)
	}

	/// Fingerprint every matched file. The second value is whether an
	/// expected artifact is missing from the output directory.
	fn snapshot(&self, root: &Path) -> TplResult<(DeltaCache, bool)> {
		let mut files = BTreeMap::new();
		let mut artifact_missing = false;

		for file in self.matcher.scan(root)? {
			let metadata = std::fs::metadata(&file.path)?;
			files.insert(
				relative_file_key(&file.relative),
				build_file_fingerprint(&metadata),
			);

			if let Some(output_directory) = &self.output_directory {
				let artifact = ArtifactName::from_relative(&file.relative).output_path(output_directory);
				artifact_missing |= !artifact.is_file();
			}
		}

		let cache = DeltaCache {
			schema_version: CACHE_SCHEMA_VERSION,
			cache_key: self.cache_key.clone(),
			files,
		};

		Ok((cache, artifact_missing))
	}
}

impl DeltaGate for FingerprintGate {
	fn has_pending_changes(&mut self, root: &Path) -> TplResult<bool> {
		let (current, artifact_missing) = self.snapshot(root)?;
		if artifact_missing {
			tracing::debug!("generated artifacts are missing");
		}
		let pending =
			artifact_missing || load(&self.cache_path()).is_none_or(|previous| previous != current);
		self.observed = Some(current);

		Ok(pending)
	}

	fn commit(&mut self) -> TplResult<()> {
		let Some(observed) = self.observed.take() else {
			return Ok(());
		};

		save(&self.cache_dir, &self.cache_path(), &observed)
	}
}

pub(crate) fn cache_dir(base_dir: &Path) -> PathBuf {
	base_dir.join(".tplcheck").join("cache")
}

/// Plain text key over every option that influences diagnostics or
/// generated output. Pattern order does not matter.
fn build_cache_key(config: &ResolvedConfig) -> String {
	let mut includes = config.includes.clone();
	includes.sort();
	let mut excludes = config.excludes.clone();
	excludes.sort();
	let ignore_imports: Vec<&str> = config.ignore_imports.iter().map(String::as_str).collect();
	let globals: Vec<&str> = config.globals.iter().map(String::as_str).collect();
	let output_directory = if config.generate {
		config.output_directory.to_string_lossy().replace('\\', "/")
	} else {
		String::new()
	};

	format!(
		"delta-v{CACHE_SCHEMA_VERSION}|source={}|include={}|exclude={}|fail_on_warnings={}|\
		 generate={}|output={output_directory}|ignore_imports={}|globals={}",
		config.source_directory.to_string_lossy().replace('\\', "/"),
		includes.join(KEY_SEPARATOR),
		excludes.join(KEY_SEPARATOR),
		config.fail_on_warnings,
		config.generate,
		ignore_imports.join(KEY_SEPARATOR),
		globals.join(KEY_SEPARATOR),
	)
}

fn relative_file_key(relative: &Path) -> String {
	relative.to_string_lossy().replace('\\', "/")
}

fn build_file_fingerprint(metadata: &Metadata) -> FileFingerprint {
	let modified_unix_ms = metadata
		.modified()
		.ok()
		.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
		.and_then(|duration| duration.as_millis().try_into().ok())
		.unwrap_or(0);

	FileFingerprint {
		size: metadata.len(),
		modified_unix_ms,
	}
}

fn load(cache_path: &Path) -> Option<DeltaCache> {
	let bytes = std::fs::read(cache_path).ok()?;
	let cache: DeltaCache = serde_json::from_slice(&bytes).ok()?;

	if cache.schema_version != CACHE_SCHEMA_VERSION {
		return None;
	}

	Some(cache)
}

fn save(cache_dir: &Path, cache_path: &Path, cache: &DeltaCache) -> TplResult<()> {
	std::fs::create_dir_all(cache_dir)?;
	let payload = serde_json::to_vec_pretty(cache).map_err(std::io::Error::other)?;

	let temp_path = cache_path.with_extension(format!(
		"json.tmp-{}-{}",
		std::process::id(),
		SystemTime::now()
			.duration_since(UNIX_EPOCH)
			.map_or(0, |duration| duration.as_nanos())
	));

	std::fs::write(&temp_path, payload)?;
	if let Err(err) = std::fs::rename(&temp_path, cache_path) {
		let _ = std::fs::remove_file(temp_path);
		return Err(err.into());
	}

	Ok(())
}
