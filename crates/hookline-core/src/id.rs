//! Run identifiers.

use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of a generated run identifier.
pub const RUN_ID_LEN: usize = 20;

/// Lowercase only, so prefixes stay valid inside Kubernetes object names.
const RUN_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Identifier of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `n` characters of the identifier, or all of it when shorter.
    pub fn prefix(&self, n: usize) -> &str {
        truncate(&self.0, n)
    }
}

impl From<String> for RunId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for RunId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of run identifiers.
///
/// The dispatcher asks for a fresh identifier on every dispatch. Production
/// code uses [`RandomIdSource`]; tests plug in deterministic sources.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> RunId;
}

/// Random lowercase alphanumeric identifiers of [`RUN_ID_LEN`] characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdSource;

impl IdSource for RandomIdSource {
    fn next_id(&self) -> RunId {
        let mut rng = rand::rng();
        let id = (0..RUN_ID_LEN)
            .map(|_| RUN_ID_CHARSET[rng.random_range(0..RUN_ID_CHARSET.len())] as char)
            .collect::<String>();
        RunId(id)
    }
}

/// Char-boundary safe prefix of `s`.
pub fn truncate(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_id_shape() {
        let id = RandomIdSource.next_id();
        assert_eq!(id.as_str().len(), RUN_ID_LEN);
        assert!(
            id.as_str()
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        );
    }

    #[test]
    fn test_random_ids_differ() {
        let a = RandomIdSource.next_id();
        let b = RandomIdSource.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefix() {
        let id = RunId::new("abcdefghij");
        assert_eq!(id.prefix(5), "abcde");
        assert_eq!(RunId::new("abc").prefix(5), "abc");
        assert_eq!(truncate("", 5), "");
    }
}
