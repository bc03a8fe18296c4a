//! A simplified stand-in for Nix's string context tracking.
//!
//! The translated programs this runtime executes never produce or consume
//! derivations or store paths (those builtins are out of scope), so unlike
//! a full Nix implementation this only needs to carry opaque dependency
//! tokens through string operations without interpreting them. It exists so
//! that embedders layering derivation-like semantics on top of this crate
//! have somewhere to stash that information; the runtime itself never
//! inspects token contents.

use rustc_hash::FxHashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NixContext(FxHashSet<String>);

impl NixContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(mut self, token: String) -> Self {
        self.0.insert(token);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl From<String> for NixContext {
    fn from(value: String) -> Self {
        let mut set = FxHashSet::default();
        set.insert(value);
        Self(set)
    }
}

impl IntoIterator for NixContext {
    type Item = String;
    type IntoIter = std::collections::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
