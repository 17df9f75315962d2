use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::{Allegiance, Role, RoleId};

/// Newtype wrapper for 0-based seat indices. Stable for a whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seat(pub usize);

impl Seat {
    /// The seat to the left, wrapping around a table of `player_count`.
    pub fn next(self, player_count: usize) -> Seat {
        Seat((self.0 + 1) % player_count)
    }

    /// Name used when no override is given: "Player 1" for seat 0.
    pub fn default_name(self) -> String {
        format!("Player {}", self.0 + 1)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0 + 1)
    }
}

/// A seated player with their dealt role.
///
/// Everything but the name is fixed when the deck is built; the description
/// is resolved against the rest of the deck at that moment and frozen here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub seat: Seat,
    pub name: String,
    pub role: RoleId,
    pub allegiance: Allegiance,
    pub description: String,
}

impl Player {
    /// Static catalog record for this player's role.
    pub fn role_card(&self) -> &'static Role {
        self.role.role()
    }

    pub fn is_good(&self) -> bool {
        self.allegiance == Allegiance::Good
    }

    pub fn is_evil(&self) -> bool {
        self.allegiance == Allegiance::Evil
    }
}
