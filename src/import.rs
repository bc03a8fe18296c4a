//! Import engine (C7): path-anchor-qualified file loading, translation
//! invocation and a process-wide module cache with cycle breaking.
//!
//! A module is evaluated at most once: the cache is keyed by
//! canonicalised absolute path, and a placeholder is installed before
//! translation begins so a file that transitively imports itself
//! observes the placeholder rather than re-entering translation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::builtins::Builtins;
use crate::errors::{Error, NixEvalError};
use crate::facade::RuntimeFacade;
use crate::io::EvalIO;
use crate::nix_search_path::NixSearchPath;
use crate::value::{canon_path, Thunk, Value};

/// A module instantiated by the external translator: given the facade
/// scoped to its own directory and the combined operators+builtins
/// table, it evaluates to the module's top-level value.
///
/// The translator is out of scope for this crate; an embedder supplies
/// one `Module` per source file, typically by compiling the translated
/// Rust source ahead of time and keying a lookup table by origin path.
pub type Module = Rc<dyn Fn(&RuntimeFacade, &Builtins) -> Result<Value, Error>>;

/// Implemented by the embedder-supplied translator collaborator.
pub trait Translate {
    /// Translates Nix source read from `origin` into a runnable module.
    fn translate(&self, source: &str, origin: &Path) -> Result<Module, Error>;
}

#[derive(Clone)]
enum ModuleState {
    Loading,
    Ready(Value),
    Failed(Rc<Error>),
}

/// Owns the import cache and drives loading, translation and
/// evaluation of files reached via `import`/`export`.
pub struct Importer {
    io: Box<dyn EvalIO>,
    search_path: NixSearchPath,
    home: Option<PathBuf>,
    translator: Box<dyn Translate>,
    builtins: Builtins,
    cache: RefCell<HashMap<PathBuf, ModuleState>>,
}

impl Importer {
    pub fn new(
        io: Box<dyn EvalIO>,
        search_path: NixSearchPath,
        home: Option<PathBuf>,
        translator: Box<dyn Translate>,
    ) -> Self {
        Importer {
            io,
            search_path,
            home,
            translator,
            builtins: Builtins::new(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn io(&self) -> &dyn EvalIO {
        self.io.as_ref()
    }

    pub(crate) fn search_path(&self) -> &NixSearchPath {
        &self.search_path
    }

    pub(crate) fn home_dir(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Number of distinct absolute paths currently in the cache. Used
    /// by tests asserting import idempotence and cycle behaviour.
    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    fn canonicalise(&self, path: &Path) -> Result<PathBuf, Error> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let cwd = std::env::current_dir().map_err(|e| NixEvalError::IO {
                path: path.to_path_buf(),
                error: Rc::new(e),
            })?;
            cwd.join(path)
        };
        Ok(canon_path(absolute))
    }

    /// Imports the module at `path`, canonicalising it first and
    /// retrying against `path/default.nix` if `path` names a directory.
    pub fn import(self: Rc<Self>, path: &Path) -> Result<Value, Error> {
        let mut path = self.canonicalise(path)?;

        if self.io.read_dir(&path).is_ok() {
            path = path.join("default.nix");
        }

        if let Some(state) = self.cache.borrow().get(&path).cloned() {
            return match state {
                ModuleState::Ready(v) => {
                    trace!(path = %path.display(), "import cache hit");
                    Ok(v)
                }
                ModuleState::Loading => {
                    trace!(path = %path.display(), "import cycle detected, deferring via thunk");
                    Ok(Self::cycle_placeholder(Rc::clone(&self), path))
                }
                ModuleState::Failed(e) => Err((*e).clone()),
            };
        }

        debug!(path = %path.display(), "import cache miss, loading module");
        self.cache
            .borrow_mut()
            .insert(path.clone(), ModuleState::Loading);

        match load(&self, &path) {
            Ok(value) => {
                self.cache
                    .borrow_mut()
                    .insert(path.clone(), ModuleState::Ready(value.clone()));
                Ok(value)
            }
            Err(cause) => {
                let wrapped: Error = NixEvalError::Import {
                    path: path.clone(),
                    source: Box::new(cause),
                }
                .into();
                self.cache
                    .borrow_mut()
                    .insert(path.clone(), ModuleState::Failed(Rc::new(wrapped.clone())));
                Err(wrapped)
            }
        }
    }

    /// Returns a thunk that resolves to the real value once the outer,
    /// currently-loading import of `path` settles. Per the import
    /// engine's contract, code on the cyclic edge must itself be lazy;
    /// forcing this thunk before the outer import settles is therefore
    /// treated the same as forcing a blackholed thunk.
    fn cycle_placeholder(importer: Rc<Importer>, path: PathBuf) -> Value {
        Value::Thunk(Thunk::new(move || {
            match importer.cache.borrow().get(&path) {
                Some(ModuleState::Ready(v)) => Ok(v.clone()),
                _ => Err(NixEvalError::InfiniteRecursion.into()),
            }
        }))
    }

}

/// Reads, translates and evaluates `path`, scoping a fresh facade to
/// its directory. A free function rather than a method so it only
/// needs a borrowed `Rc<Importer>`, not a `Rc<Self>` receiver.
fn load(importer: &Rc<Importer>, path: &Path) -> Result<Value, Error> {
    let source = importer.io.read_to_string(path)?;
    let module = importer.translator.translate(&source, path)?;
    let origin_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));
    let facade = RuntimeFacade::new(Rc::clone(importer), origin_dir);
    module(&facade, &importer.builtins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct ConstTranslate {
        calls: Rc<Cell<u32>>,
    }

    impl Translate for ConstTranslate {
        fn translate(&self, source: &str, _origin: &Path) -> Result<Module, Error> {
            self.calls.set(self.calls.get() + 1);
            let n: i64 = source.trim().parse().unwrap_or(0);
            Ok(Rc::new(move |_facade: &RuntimeFacade, _builtins: &Builtins| {
                Ok(Value::Integer(n))
            }))
        }
    }

    struct MapIO(HashMap<PathBuf, String>);

    impl EvalIO for MapIO {
        fn path_exists(&self, path: &Path) -> Result<bool, Error> {
            Ok(self.0.contains_key(path))
        }

        fn read_to_string(&self, path: &Path) -> Result<String, Error> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| NixEvalError::IO {
                    path: path.to_path_buf(),
                    error: Rc::new(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")),
                }
                .into())
        }

        fn read_dir(&self, _path: &Path) -> Result<Vec<(smol_str::SmolStr, crate::io::FileType)>, Error> {
            Err(NixEvalError::NotImplemented("MapIO has no directories").into())
        }

        fn import_path(&self, path: &Path) -> Result<PathBuf, Error> {
            Ok(path.to_path_buf())
        }
    }

    fn importer_with(files: Vec<(&str, &str)>, calls: Rc<Cell<u32>>) -> Rc<Importer> {
        let map = files
            .into_iter()
            .map(|(p, c)| (PathBuf::from(p), c.to_string()))
            .collect();
        Rc::new(Importer::new(
            Box::new(MapIO(map)),
            NixSearchPath::default(),
            None,
            Box::new(ConstTranslate { calls }),
        ))
    }

    #[test]
    fn import_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let importer = importer_with(vec![("/a.nix", "42")], calls.clone());

        let v1 = Rc::clone(&importer).import(Path::new("/a.nix")).unwrap();
        let v2 = Rc::clone(&importer).import(Path::new("/a.nix")).unwrap();

        assert_eq!(v1.as_int().unwrap(), 42);
        assert_eq!(v2.as_int().unwrap(), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(importer.cache_len(), 1);
    }

    #[test]
    fn missing_file_is_wrapped_as_import_error() {
        let calls = Rc::new(Cell::new(0));
        let importer = importer_with(vec![], calls);
        let err = Rc::clone(&importer)
            .import(Path::new("/missing.nix"))
            .unwrap_err();
        assert!(matches!(err, Error::Eval(NixEvalError::Import { .. })));
    }

    #[test]
    fn failed_import_is_cached_and_reported_deterministically() {
        let calls = Rc::new(Cell::new(0));
        let importer = importer_with(vec![], calls);
        let first = Rc::clone(&importer)
            .import(Path::new("/missing.nix"))
            .unwrap_err();
        let second = Rc::clone(&importer)
            .import(Path::new("/missing.nix"))
            .unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(importer.cache_len(), 1);
    }

    #[test]
    fn relative_paths_are_canonicalised_against_cwd() {
        let calls = Rc::new(Cell::new(0));
        let cwd = std::env::current_dir().unwrap();
        let abs = cwd.join("rel.nix");
        let importer = importer_with(
            vec![(abs.to_str().unwrap(), "7")],
            calls,
        );
        let v = Rc::clone(&importer).import(Path::new("rel.nix")).unwrap();
        assert_eq!(v.as_int().unwrap(), 7);
    }
}
