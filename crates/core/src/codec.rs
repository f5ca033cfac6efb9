//! Sequence index keys.
//!
//! Every sequenced transaction lives under `<namespace>/<index>`, where the
//! index is rendered as 64 binary digits. Zero padding makes lexicographic
//! key order identical to numeric index order, so "greatest key under the
//! namespace" is "latest transaction".

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Width of an encoded index, in characters.
pub const INDEX_WIDTH: usize = 64;

/// Separator between the namespace and the encoded index.
pub const KEY_SEPARATOR: char = '/';

/// Errors from key encoding and decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed sequence index: {0:?}")]
    MalformedIndex(String),

    #[error("invalid namespace: {0:?}")]
    InvalidNamespace(String),
}

/// Encode a sequence index as a fixed-width binary literal.
pub fn encode(index: u64) -> String {
    format!("{:064b}", index)
}

/// Decode a fixed-width binary literal produced by [`encode`].
pub fn decode(text: &str) -> Result<u64, CodecError> {
    if text.len() != INDEX_WIDTH || !text.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(CodecError::MalformedIndex(text.to_string()));
    }
    u64::from_str_radix(text, 2).map_err(|_| CodecError::MalformedIndex(text.to_string()))
}

/// Name of one logical ledger inside the coordination store.
///
/// Non-empty and free of `/`, so that one namespace's key prefix can never
/// match another namespace's keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Result<Self, CodecError> {
        let name = name.into();
        if name.is_empty() || name.contains(KEY_SEPARATOR) {
            return Err(CodecError::InvalidNamespace(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix shared by every key in this namespace, e.g. `ledger/`.
    pub fn prefix(&self) -> String {
        format!("{}{}", self.0, KEY_SEPARATOR)
    }

    /// Store key for a sequence index.
    pub fn key(&self, index: u64) -> String {
        format!("{}{}{}", self.0, KEY_SEPARATOR, encode(index))
    }

    /// Recover the sequence index from a key in this namespace.
    pub fn index_of(&self, key: &str) -> Result<u64, CodecError> {
        let suffix = key
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix(KEY_SEPARATOR))
            .ok_or_else(|| CodecError::MalformedIndex(key.to_string()))?;
        decode(suffix)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Namespace {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Namespace::new(value)
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.0
    }
}

impl std::str::FromStr for Namespace {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::new(s)
    }
}
