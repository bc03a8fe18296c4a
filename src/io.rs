//! Interface for injecting I/O-related functionality into the runtime.
//!
//! A handful of non-IO builtins (`readDir`) and language features (path
//! coercion, imports) interact with the filesystem. Rather than depend
//! on any particular filesystem interaction model, this module defines
//! a trait that embedders implement to supply the behaviour they want —
//! including, for embedders that want the language semantics without
//! real filesystem access, simply returning "not implemented".

use crate::errors::{Error, NixEvalError};
use smol_str::SmolStr;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Types of files as represented by `builtins.readDir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Directory,
    Regular,
    Symlink,
    Unknown,
}

/// Defines how filesystem interaction occurs inside the runtime.
pub trait EvalIO {
    fn path_exists(&self, path: &Path) -> Result<bool, Error>;

    fn read_to_string(&self, path: &Path) -> Result<String, Error>;

    /// Reads the directory at `path`, returning its entries' names
    /// paired with their [`FileType`].
    fn read_dir(&self, path: &Path) -> Result<Vec<(SmolStr, FileType)>, Error>;

    /// Imports the given path. What this means depends on the
    /// implementation: for a plain filesystem backend this is a no-op,
    /// for an embedder layering store semantics on top this might copy
    /// the path somewhere content-addressed. Used when coercing a local
    /// path to a string, and by `builtins.path`.
    fn import_path(&self, path: &Path) -> Result<PathBuf, Error>;

    /// Returns the root of the store directory, if the embedding
    /// context has one.
    fn store_dir(&self) -> Option<&str> {
        None
    }
}

fn io_err(path: &Path, error: std::io::Error) -> Error {
    NixEvalError::IO {
        path: path.to_path_buf(),
        error: Rc::new(error),
    }
    .into()
}

/// [`EvalIO`] implementation backed by `std::fs`.
#[cfg(feature = "impure")]
pub struct StdIO;

#[cfg(feature = "impure")]
impl EvalIO for StdIO {
    fn path_exists(&self, path: &Path) -> Result<bool, Error> {
        path.try_exists().map_err(|e| io_err(path, e))
    }

    fn read_to_string(&self, path: &Path) -> Result<String, Error> {
        std::fs::read_to_string(path).map_err(|e| io_err(path, e))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<(SmolStr, FileType)>, Error> {
        let mut result = vec![];

        for entry in path.read_dir().map_err(|e| io_err(path, e))? {
            let entry = entry.map_err(|e| io_err(path, e))?;
            let file_type = entry
                .metadata()
                .map_err(|e| io_err(&entry.path(), e))?
                .file_type();

            let val = if file_type.is_dir() {
                FileType::Directory
            } else if file_type.is_file() {
                FileType::Regular
            } else if file_type.is_symlink() {
                FileType::Symlink
            } else {
                FileType::Unknown
            };

            result.push((SmolStr::new(entry.file_name().to_string_lossy()), val));
        }

        Ok(result)
    }

    // `std::fs` paths are already directly addressable, so importing is
    // a no-op.
    fn import_path(&self, path: &Path) -> Result<PathBuf, Error> {
        Ok(path.to_path_buf())
    }
}

/// Dummy [`EvalIO`], used when the embedder wants the language
/// semantics without filesystem access. Every method fails with a
/// catchable `NotImplemented` error, so pure expressions still evaluate
/// and `tryEval` can observe the failure of impure ones.
pub struct DummyIO;

impl EvalIO for DummyIO {
    fn path_exists(&self, _: &Path) -> Result<bool, Error> {
        Err(NixEvalError::NotImplemented("I/O is not available in this evaluation context").into())
    }

    fn read_to_string(&self, _: &Path) -> Result<String, Error> {
        Err(NixEvalError::NotImplemented("I/O is not available in this evaluation context").into())
    }

    fn read_dir(&self, _: &Path) -> Result<Vec<(SmolStr, FileType)>, Error> {
        Err(NixEvalError::NotImplemented("I/O is not available in this evaluation context").into())
    }

    fn import_path(&self, _: &Path) -> Result<PathBuf, Error> {
        Err(NixEvalError::NotImplemented("I/O is not available in this evaluation context").into())
    }
}

#[cfg(all(test, feature = "impure"))]
mod std_io_tests {
    use super::*;

    #[test]
    fn reads_files_and_lists_directories_on_a_real_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.nix"), "1").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let io = StdIO;
        assert!(io.path_exists(&dir.path().join("default.nix")).unwrap());
        assert!(!io.path_exists(&dir.path().join("missing")).unwrap());
        assert_eq!(
            io.read_to_string(&dir.path().join("default.nix")).unwrap(),
            "1"
        );

        let mut entries = io.read_dir(dir.path()).unwrap();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            entries,
            vec![
                (SmolStr::new("default.nix"), FileType::Regular),
                (SmolStr::new("sub"), FileType::Directory),
            ]
        );
    }

    #[test]
    fn missing_file_is_a_catchable_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StdIO
            .read_to_string(&dir.path().join("nope.nix"))
            .unwrap_err();
        assert!(matches!(err, Error::Eval(NixEvalError::IO { .. })));
    }
}
