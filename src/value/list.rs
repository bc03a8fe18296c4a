//! This module implements Nix lists.
use std::fmt::Display;

use crate::errors::Error;

use super::Value;

#[repr(transparent)]
#[derive(Clone, Debug, PartialEq)]
pub struct NixList(Vec<Value>);

impl Display for NixList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[ ")?;

        for v in &self.0 {
            v.fmt(f)?;
            f.write_str(" ")?;
        }

        f.write_str("]")
    }
}

impl From<Vec<Value>> for NixList {
    fn from(vs: Vec<Value>) -> Self {
        Self(vs)
    }
}

impl NixList {
    pub fn concat(&self, other: &Self) -> Self {
        let mut lhs = self.0.clone();
        lhs.extend(other.0.iter().cloned());
        Self(lhs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Value> {
        self.0.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// Compare `self` against `other` for equality using Nix equality
    /// semantics, forcing elements as needed.
    pub fn nix_eq(&self, other: &Self) -> Result<bool, Error> {
        if self.len() != other.len() {
            return Ok(false);
        }

        for (v1, v2) in self.iter().zip(other.iter()) {
            if !v1.nix_eq(v2)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl IntoIterator for NixList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_order() {
        let a = NixList::from(vec![Value::Integer(1), Value::Integer(2)]);
        let b = NixList::from(vec![Value::Integer(3)]);
        let c = a.concat(&b);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(2), Some(&Value::Integer(3)));
    }

    #[test]
    fn nix_eq_requires_same_length() {
        let a = NixList::from(vec![Value::Integer(1)]);
        let b = NixList::from(vec![Value::Integer(1), Value::Integer(2)]);
        assert!(!a.nix_eq(&b).unwrap());
    }
}
