//! `nix_rt` is the runtime support library for executing transpiled Nix
//! expressions.
//!
//! A separate ahead-of-time translator (out of scope for this crate)
//! converts each Nix source file into a Rust module that calls into
//! this library for every semantic primitive: constructing lazy
//! thunks, binding scopes, applying operators, invoking builtins,
//! importing other files and resolving path anchors. This crate
//! supplies that runtime plus the file-loading/import engine that
//! drives it.
//!
//! Nix has several language features that are inherently impure (such
//! as reading `NIX_PATH`, or reading files via `import`). These
//! features are gated behind the `impure` Cargo feature; without it,
//! only [`io::DummyIO`] is available, which is useful for embedding
//! contexts that want the language semantics without filesystem
//! access.

pub mod builtins;
pub mod errors;
pub mod facade;
pub mod import;
pub mod io;
pub mod nix_search_path;
pub mod ops;
pub mod scope;
pub mod value;

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

pub use crate::builtins::{global_builtins, Builtins};
pub use crate::errors::{Error, EvalResult, NixEvalError, RangeError, ScopeError, TypeError};
pub use crate::facade::{PathAnchor, RuntimeFacade};
pub use crate::import::{Importer, Module, Translate};
pub use crate::value::Value;

use crate::io::{DummyIO, EvalIO};
use crate::nix_search_path::NixSearchPath;

#[cfg(feature = "impure")]
use crate::io::StdIO;

/// Configuration for a [`Runtime`]: the I/O backend, search path
/// string and home directory override used to resolve anchor-qualified
/// paths (`§6` anchor rules).
pub struct EvalConfig {
    /// `NIX_PATH`-style search path, consulted for `Store`-anchored
    /// exports. `None` resolves no Store anchors.
    pub nix_path: Option<String>,

    /// Overrides the host user's home directory for `Home`-anchored
    /// exports. `None` resolves no Home anchors.
    pub home: Option<PathBuf>,

    /// The filesystem backend used by the import engine.
    pub io: Box<dyn EvalIO>,
}

impl EvalConfig {
    /// A configuration with no filesystem access at all: every
    /// [`io::EvalIO`] call fails with a catchable `NotImplemented`, and
    /// no search path or home directory is configured.
    pub fn pure() -> Self {
        EvalConfig {
            nix_path: None,
            home: None,
            io: Box::new(DummyIO),
        }
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::pure()
    }
}

/// Top-level entry point. Owns the import cache (for the lifetime of
/// this `Runtime`) and the combined builtins table, and drives
/// evaluation of a file on behalf of the host.
pub struct Runtime {
    importer: Rc<Importer>,
}

impl Runtime {
    /// Builds a runtime from an explicit configuration and the
    /// embedder-supplied translator.
    pub fn new(config: EvalConfig, translator: Box<dyn Translate>) -> Self {
        let search_path = config
            .nix_path
            .as_deref()
            .and_then(|s| NixSearchPath::from_str(s).ok())
            .unwrap_or_default();

        Runtime {
            importer: Rc::new(Importer::new(
                config.io,
                search_path,
                config.home,
                translator,
            )),
        }
    }

    /// Builds a runtime that reads `NIX_PATH` and `HOME` from the
    /// process environment once, with real filesystem access via
    /// [`io::StdIO`].
    #[cfg(feature = "impure")]
    pub fn from_env(translator: Box<dyn Translate>) -> Self {
        let config = EvalConfig {
            nix_path: std::env::var("NIX_PATH").ok(),
            home: dirs::home_dir(),
            io: Box::new(StdIO),
        };
        Self::new(config, translator)
    }

    /// Entry call from the host: loads, translates and evaluates the
    /// file at `path`, returning its top-level value (spec.md §2:
    /// "entry call from the host invokes C7 on an absolute file
    /// path").
    pub fn evaluate_file(&self, path: &Path) -> Result<Value, Error> {
        Rc::clone(&self.importer).import(path)
    }

    /// Number of distinct absolute paths currently in the import
    /// cache, regardless of state.
    pub fn import_cache_len(&self) -> usize {
        self.importer.cache_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailTranslate;
    impl Translate for FailTranslate {
        fn translate(&self, _source: &str, _origin: &Path) -> Result<Module, Error> {
            Err(NixEvalError::NotImplemented("no translator wired up").into())
        }
    }

    #[test]
    fn pure_runtime_reports_missing_file_as_import_error() {
        let runtime = Runtime::new(EvalConfig::pure(), Box::new(FailTranslate));
        let err = runtime
            .evaluate_file(Path::new("/does/not/exist.nix"))
            .unwrap_err();
        assert!(matches!(err, Error::Eval(NixEvalError::Import { .. })));
    }

    #[test]
    fn fresh_runtime_starts_with_an_empty_import_cache() {
        let runtime = Runtime::new(EvalConfig::pure(), Box::new(FailTranslate));
        assert_eq!(runtime.import_cache_len(), 0);
    }
}
