//! The two-tier authorization model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The role an address holds. Addresses never assigned a role are `User`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  #[default]
  User,
  /// Global administrator: assigns, resolves, closes, reopens, and manages
  /// roles.
  Manager,
}

impl Role {
  pub fn is_manager(self) -> bool { matches!(self, Self::Manager) }
}
