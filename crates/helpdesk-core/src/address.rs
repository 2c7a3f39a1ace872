//! Caller identities.
//!
//! An address is the 20-byte account identifier handed to the registry by
//! the session layer. Its text form is `0x` followed by 40 hex digits; input
//! of either case is accepted and the canonical form is lowercase.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
  pub const fn from_bytes(bytes: [u8; 20]) -> Self { Self(bytes) }

  pub fn as_bytes(&self) -> &[u8; 20] { &self.0 }

  pub fn parse(s: &str) -> Result<Self> {
    let digits = s
      .strip_prefix("0x")
      .or_else(|| s.strip_prefix("0X"))
      .ok_or_else(|| Error::InvalidAddress(s.to_owned()))?;
    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes)
      .map_err(|_| Error::InvalidAddress(s.to_owned()))?;
    Ok(Self(bytes))
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{}", hex::encode(self.0))
  }
}

impl fmt::Debug for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Address({self})")
  }
}

impl FromStr for Address {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::parse(s) }
}

impl Serialize for Address {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Address {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Self::parse(&s).map_err(serde::de::Error::custom)
  }
}
