//! Runtime facade (C8): the `export`/`import`/`pathExists` surface a
//! translated module receives, scoped to the directory of the file it
//! was loaded from.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::errors::{Error, NixEvalError};
use crate::import::Importer;
use crate::value::{canon_path, Value};

/// Classifies an unresolved path at the transpiler/runtime boundary.
///
/// Unlike the host-language-agnostic original, an "unknown anchor" is
/// not representable here: the enum is exhaustive, so every anchor this
/// runtime can be asked to resolve already has a defined rule below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAnchor {
    /// Resolve against the directory of the currently-evaluating module.
    Relative,
    /// Normalise as an absolute path.
    Absolute,
    /// Resolve against the host user's home directory.
    Home,
    /// Resolve via the `NIX_PATH`-style search path.
    Store,
}

/// Per-module facade handed to a translated module, carrying enough
/// context (the import cache, search path and this module's own
/// directory) to resolve anchors and recurse into further imports.
pub struct RuntimeFacade {
    importer: Rc<Importer>,
    origin_dir: PathBuf,
}

impl RuntimeFacade {
    pub fn new(importer: Rc<Importer>, origin_dir: PathBuf) -> Self {
        RuntimeFacade {
            importer,
            origin_dir,
        }
    }

    /// The directory of the module this facade was built for.
    pub fn origin_dir(&self) -> &Path {
        &self.origin_dir
    }

    /// Resolves an anchor-qualified path to an absolute path.
    pub fn export(&self, anchor: PathAnchor, payload: &str) -> Result<PathBuf, Error> {
        match anchor {
            PathAnchor::Relative => Ok(canon_path(self.origin_dir.join(payload))),
            PathAnchor::Absolute => Ok(canon_path(PathBuf::from(payload))),
            PathAnchor::Home => {
                let home = self.importer.home_dir().ok_or_else(|| {
                    NixEvalError::NixPathResolution("HOME is not set".into())
                })?;
                Ok(canon_path(home.join(payload)))
            }
            PathAnchor::Store => self
                .importer
                .search_path()
                .resolve(self.importer.io(), payload)
                .map_err(|_| NixEvalError::ExportUnresolved.into()),
        }
    }

    /// Imports the module at `path`, which is expected to already be an
    /// absolute, anchor-resolved path (typically the result of a prior
    /// call to [`RuntimeFacade::export`]).
    pub fn import(&self, path: &Path) -> Result<Value, Error> {
        Rc::clone(&self.importer).import(path)
    }

    /// Non-throwing existence check.
    pub fn path_exists(&self, path: &Path) -> bool {
        self.importer.io().path_exists(path).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{Importer, Translate};
    use crate::io::DummyIO;
    use crate::nix_search_path::NixSearchPath;

    struct NoopTranslate;
    impl Translate for NoopTranslate {
        fn translate(&self, _source: &str, _origin: &Path) -> Result<crate::import::Module, Error> {
            Err(NixEvalError::NotImplemented("not needed for this test").into())
        }
    }

    fn facade(origin_dir: &str) -> RuntimeFacade {
        let importer = Rc::new(Importer::new(
            Box::new(DummyIO),
            NixSearchPath::default(),
            Some(PathBuf::from("/home/user")),
            Box::new(NoopTranslate),
        ));
        RuntimeFacade::new(importer, PathBuf::from(origin_dir))
    }

    #[test]
    fn relative_resolves_against_origin_dir() {
        let f = facade("/project/lib");
        let p = f.export(PathAnchor::Relative, "./foo.nix").unwrap();
        assert_eq!(p, PathBuf::from("/project/lib/foo.nix"));
    }

    #[test]
    fn absolute_normalises_without_origin() {
        let f = facade("/project/lib");
        let p = f.export(PathAnchor::Absolute, "/etc/foo.nix").unwrap();
        assert_eq!(p, PathBuf::from("/etc/foo.nix"));
    }

    #[test]
    fn home_resolves_against_configured_home() {
        let f = facade("/project/lib");
        let p = f.export(PathAnchor::Home, ".config/foo.nix").unwrap();
        assert_eq!(p, PathBuf::from("/home/user/.config/foo.nix"));
    }

    #[test]
    fn store_with_empty_search_path_does_not_resolve() {
        let f = facade("/project/lib");
        let err = f.export(PathAnchor::Store, "nixpkgs").unwrap_err();
        assert!(matches!(
            err,
            Error::Eval(NixEvalError::ExportUnresolved)
        ));
    }

    #[test]
    fn path_exists_is_non_throwing_on_dummy_io() {
        let f = facade("/project/lib");
        assert!(!f.path_exists(Path::new("/nope")));
    }
}
