//! Selection helper: "a single value or a list of candidates"
//!
//! Several options accept either one value or a list to pick from on each
//! triggering call. [`OneOrMany`] is that union; [`OneOrMany::select`]
//! resolves it.
//!
//! ```
//! use havoc_core_chaos::OneOrMany;
//!
//! let fixed = OneOrMany::One("timeout");
//! assert_eq!(fixed.select(), Some(&"timeout"));
//!
//! let pool = OneOrMany::from(vec![1, 2, 3]);
//! assert!(matches!(pool.select(), Some(1..=3)));
//! ```

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One value, or a list of candidates chosen uniformly at random per call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// Always selected as is
    One(T),
    /// One element picked per selection
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Pick a value using the thread-local RNG
    ///
    /// Returns `None` only for an empty list; callers substitute their
    /// documented fallback in that case.
    pub fn select(&self) -> Option<&T> {
        self.select_with(&mut rand::rng())
    }

    /// Pick a value using the given RNG
    pub fn select_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.choose(rng),
        }
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    /// True for an empty candidate list
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every candidate
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }

    /// Convert each candidate, keeping the single/list shape
    pub fn map<U, F>(self, mut f: F) -> OneOrMany<U>
    where
        F: FnMut(T) -> U,
    {
        match self {
            OneOrMany::One(value) => OneOrMany::One(f(value)),
            OneOrMany::Many(values) => OneOrMany::Many(values.into_iter().map(f).collect()),
        }
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Select from an optional choice, falling back when it is absent or empty
pub fn select_or<'a, T>(choice: Option<&'a OneOrMany<T>>, fallback: &'a T) -> &'a T {
    choice.and_then(OneOrMany::select).unwrap_or(fallback)
}
