//! Content-addressed storage for ticket descriptions and attachments.
//!
//! The registry stores only the references returned here and never looks
//! behind them. Payloads are uploaded first, then the returned hash is passed
//! to `create_ticket`.

use std::{fmt, future::Future, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Lowercase hex SHA-256 digest of a stored payload.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash(String);

impl ContentHash {
  /// Hash `bytes` the way every store addresses them.
  pub fn of(bytes: &[u8]) -> Self { Self(hex::encode(Sha256::digest(bytes))) }

  pub fn parse(s: &str) -> Result<Self> {
    let valid = s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit());
    if !valid {
      return Err(Error::InvalidContentHash(s.to_owned()));
    }
    Ok(Self(s.to_ascii_lowercase()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ContentHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl fmt::Debug for ContentHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ContentHash({})", self.0)
  }
}

impl FromStr for ContentHash {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl Serialize for ContentHash {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for ContentHash {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse(&s).map_err(serde::de::Error::custom)
  }
}

/// Abstraction over a content-addressed blob store.
pub trait ContentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `bytes` and return their address. Storing the same bytes twice
  /// returns the same hash.
  fn put(
    &self,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<ContentHash, Self::Error>> + Send + '_;

  /// Fetch a payload by hash. Returns `None` if nothing is stored under it.
  fn get<'a>(
    &'a self,
    hash: &'a ContentHash,
  ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send + 'a;
}
