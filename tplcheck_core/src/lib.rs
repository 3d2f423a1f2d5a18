//! `tplcheck_core` is the core library for the `tplcheck` template validator.
//! It finds the template scripts that changed since the last run, compiles
//! each of them, records per-file diagnostics, optionally generates a source
//! artifact per script, and turns the results into a single pass/fail
//! outcome.
//!
//! ## Processing Pipeline
//!
//! ```text
//! tplcheck.toml + command line
//!   → Config (resolved to absolute paths)
//!   → Delta gate (stop early when nothing changed)
//!   → Path matcher (include/exclude globs below the source directory)
//!   → Runner (one compilation unit per script, validate or transpile)
//!   → Verdict (clear + record diagnostics per file, apply the failure policy)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `tplcheck.toml`.
//! - [`matcher`]: Glob based discovery of the scripts to process.
//! - [`delta`]: Pending-change detection backed by a fingerprint cache.
//! - [`compiler`]: The compiler and codegen backend boundary.
//! - [`runner`]: The per-file loop shared by validation and code generation.
//! - [`verdict`]: Aggregation of per-file results into an [`Outcome`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use tplcheck_core::MemorySink;
//! use tplcheck_core::Pipeline;
//! use tplcheck_core::TplConfig;
//!
//! let base = Path::new(".");
//! let config = TplConfig::load(base).unwrap().unwrap_or_default();
//! let mut sink = MemorySink::new();
//! let outcome = Pipeline::new(config.resolve(base)).run(&mut sink).unwrap();
//!
//! for (file, messages) in sink.iter() {
//! 	for message in messages {
//! 		eprintln!("{}:{}:{}: {}", file.display(), message.line, message.column, message.text);
//! 	}
//! }
//! assert!(outcome.is_success());
//! ```

pub use backend::*;
pub use compiler::*;
pub use config::*;
pub use delta::*;
pub use diagnostics::*;
pub use error::*;
pub use jinja::*;
pub use matcher::*;
pub use pipeline::*;
pub use runner::*;
pub use unit::*;
pub use verdict::*;

mod backend;
pub mod compiler;
pub mod config;
pub mod delta;
mod diagnostics;
#[allow(unused_assignments)]
mod error;
mod jinja;
pub mod matcher;
mod pipeline;
pub mod runner;
mod unit;
pub mod verdict;

#[cfg(test)]
mod __fixtures;
