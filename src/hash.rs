// src/hash.rs

//! SHA-256 hashing for recipe revisions and package ids
//!
//! Revisions and ids are content addresses: the same inputs always produce
//! the same lowercase hex digest.

use sha2::{Digest, Sha256};
use std::path::Path;

/// Length of a package id in hex characters
pub const PACKAGE_ID_LEN: usize = 40;

/// Incremental hasher that frames every field with its length
///
/// Framing keeps `("ab", "c")` and `("a", "bc")` from colliding.
#[derive(Default)]
pub struct Hasher {
    inner: Sha256,
}

impl Hasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one length-prefixed field
    pub fn field(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    pub fn str_field(&mut self, s: &str) -> &mut Self {
        self.field(s.as_bytes())
    }

    /// Feed a relative path using `/` separators on every platform
    pub fn path_field(&mut self, path: &Path) -> &mut Self {
        let normalized: Vec<String> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        self.str_field(&normalized.join("/"))
    }

    /// Finish and return lowercase hex
    pub fn finalize(self) -> String {
        hex::encode(self.inner.finalize())
    }
}
